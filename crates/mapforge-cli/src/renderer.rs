//! Renderer subprocess invocation
//!
//! The renderer inherits our stdio so its progress output reaches the
//! operator directly; a non-zero exit aborts the current definition.

use std::path::Path;

use anyhow::{Context, Result, bail};
use tokio::process::Command;

/// Run one renderer invocation to completion
pub async fn invoke(binary: &Path, arguments: &[String]) -> Result<()> {
    let status = Command::new(binary)
        .args(arguments)
        .status()
        .await
        .with_context(|| format!("failed to start renderer at {}", binary.display()))?;

    if !status.success() {
        bail!("renderer exited with {}", status);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_binary_is_an_error() {
        let result = invoke(Path::new("/definitely/not/a/renderer"), &[]).await;
        assert!(result.is_err());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_nonzero_exit_is_an_error() {
        let result = invoke(Path::new("/bin/false"), &[]).await;
        assert!(result.is_err());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_successful_exit() {
        let result = invoke(Path::new("/bin/true"), &[]).await;
        assert!(result.is_ok());
    }
}
