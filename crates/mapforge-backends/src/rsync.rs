//! rsync remote sink
//!
//! Transfers the rendered output to an rsync daemon module. Two paths:
//! a full upload of the map directory's contents, and a cheap variant
//! that ships only the marker file after a sheet-only regeneration.
//!
//! ```yaml
//! remote:
//!   type: rsync
//!   ip: maps.example.net
//!   path: volume/maps/survival
//! ```

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::process::Command;

use mapforge_core::definition::DefinitionDoc;
use mapforge_core::document::Document;
use mapforge_core::extensions::{OwnerRef, RemoteSink};
use mapforge_core::markers::MARKER_FILE_NAME;
use mapforge_core::{Error, Result};

fn extension_error(message: impl Into<String>) -> Error {
    Error::Extension {
        name: "rsync",
        message: message.into(),
    }
}

/// Typed fields of a `type: rsync` block
#[derive(Debug, Clone, Deserialize)]
pub struct RsyncRemoteConfig {
    /// Daemon host
    pub ip: String,

    /// Module path on the daemon; quoted into a remote `mkdir -p`, so a
    /// restricted character set is enforced at resolution time
    pub path: String,
}

/// Remote sink driving the rsync binary
pub struct RsyncRemote {
    config: RsyncRemoteConfig,
    owner: OwnerRef,
}

/// Construct an [`RsyncRemote`] from a tagged block
pub fn factory(block: &Document, owner: OwnerRef) -> Result<Arc<dyn RemoteSink>> {
    let config: RsyncRemoteConfig = block.typed()?;
    validate_path(&config.path)?;
    Ok(Arc::new(RsyncRemote { config, owner }))
}

fn validate_path(path: &str) -> Result<()> {
    for forbidden in [':', '"', '\''] {
        if path.contains(forbidden) {
            return Err(Error::Invalid {
                message: format!("remote path cannot contain {:?}", forbidden),
            });
        }
    }
    Ok(())
}

impl RsyncRemote {
    /// Arguments for one transfer. The destination directory is created
    /// first through `--rsync-path`; `-rltz --delete` mirrors the source.
    fn arguments(&self, source: String, dest_suffix: &str) -> Vec<String> {
        vec![
            "--rsync-path".to_string(),
            format!("mkdir -p '{}' && rsync", self.config.path),
            "-rltz".to_string(),
            "--delete".to_string(),
            source,
            format!("{}::{}/{}", self.config.ip, self.config.path, dest_suffix),
        ]
    }

    async fn run(&self, arguments: Vec<String>) -> Result<()> {
        tracing::debug!("rsync {}", arguments.join(" "));

        let output = Command::new("rsync")
            .args(&arguments)
            .output()
            .await
            .map_err(|e| extension_error(format!("failed to run rsync: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(extension_error(format!(
                "rsync exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }
        Ok(())
    }
}

fn absolute(path: &Path) -> Result<std::path::PathBuf> {
    Ok(std::path::absolute(path)?)
}

#[async_trait]
impl RemoteSink for RsyncRemote {
    fn owner(&self) -> &OwnerRef {
        &self.owner
    }

    async fn upload(&self, context: Option<&Arc<DefinitionDoc>>) -> Result<()> {
        let doc = self.owner.resolve(context)?;
        // trailing slash: copy the map folder's contents, not the folder
        let source = format!("{}/", absolute(&doc.dest.join("map"))?.display());
        self.run(self.arguments(source, "")).await
    }

    async fn upload_markers(&self, context: Option<&Arc<DefinitionDoc>>) -> Result<()> {
        let doc = self.owner.resolve(context)?;
        let source = absolute(&doc.dest.join("map").join(MARKER_FILE_NAME))?
            .display()
            .to_string();
        self.run(self.arguments(source, MARKER_FILE_NAME)).await
    }
}
