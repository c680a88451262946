//! Run settings resolved from the command line
//!
//! The skip flags interact: `--sheet-only` narrows the run down to marker
//! regeneration plus the marker-file upload, implying `--skip-map` and
//! `--skip-webhook` and refusing `--skip-sheet`.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use tracing::warn;

use crate::Cli;

/// What the run will actually do, after flag interactions are settled
#[derive(Debug, Clone)]
pub struct RunSettings {
    /// Print planned work, execute nothing external
    pub dry_run: bool,

    /// Renderer binary to invoke
    pub renderer: PathBuf,

    /// Upload only the marker file instead of the whole output
    pub sheet_only: bool,

    /// Skip map generation
    pub skip_map: bool,

    /// Skip player marker generation
    pub skip_sheet: bool,

    /// Skip remote upload
    pub skip_remote: bool,

    /// Skip webhook push
    pub skip_webhook: bool,
}

impl RunSettings {
    /// Settle flag interactions and fill in the renderer default
    pub fn resolve(cli: &Cli) -> Result<Self> {
        let renderer = match &cli.renderer {
            Some(path) => path.clone(),
            None => default_renderer_path()?,
        };
        tracing::debug!("Renderer path: {}", renderer.display());

        if cli.sheet_only {
            if cli.skip_map {
                warn!("--skip-map implied by --sheet-only");
            }
            if cli.skip_webhook {
                warn!("--skip-webhook implied by --sheet-only");
            }
            if cli.skip_sheet {
                bail!("--skip-sheet breaks --sheet-only");
            }
            if cli.skip_remote {
                warn!("--skip-remote is against --sheet-only");
            }
            Ok(Self {
                dry_run: cli.dry_run,
                renderer,
                sheet_only: true,
                skip_map: true,
                skip_sheet: false,
                skip_remote: cli.skip_remote,
                skip_webhook: true,
            })
        } else {
            Ok(Self {
                dry_run: cli.dry_run,
                renderer,
                sheet_only: false,
                skip_map: cli.skip_map,
                skip_sheet: cli.skip_sheet,
                skip_remote: cli.skip_remote,
                skip_webhook: cli.skip_webhook,
            })
        }
    }
}

fn default_renderer_path() -> Result<PathBuf> {
    let exe = std::env::current_exe().context("cannot locate the current executable")?;
    Ok(renderer_next_to(&exe))
}

/// Default renderer location: a `papyrusbin` directory next to the
/// mapforge executable
pub(crate) fn renderer_next_to(exe: &Path) -> PathBuf {
    let dir = exe.parent().unwrap_or_else(|| Path::new("."));
    let binary = if cfg!(windows) {
        "PapyrusCs.exe"
    } else {
        "PapyrusCs"
    };
    dir.join("papyrusbin").join(binary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn parse(args: &[&str]) -> Cli {
        let mut full = vec!["mapforge", "-f", "a.yaml", "-p", "/opt/renderer"];
        full.extend_from_slice(args);
        Cli::try_parse_from(full).unwrap()
    }

    #[test]
    fn test_plain_flags_pass_through() {
        let settings = RunSettings::resolve(&parse(&["--skip-map", "--dry-run"])).unwrap();
        assert!(settings.skip_map);
        assert!(settings.dry_run);
        assert!(!settings.skip_sheet);
        assert!(!settings.sheet_only);
        assert_eq!(settings.renderer, PathBuf::from("/opt/renderer"));
    }

    #[test]
    fn test_sheet_only_implies_skips() {
        let settings = RunSettings::resolve(&parse(&["--sheet-only"])).unwrap();
        assert!(settings.sheet_only);
        assert!(settings.skip_map);
        assert!(settings.skip_webhook);
        assert!(!settings.skip_sheet);
        assert!(!settings.skip_remote);
    }

    #[test]
    fn test_sheet_only_honors_skip_remote() {
        let settings = RunSettings::resolve(&parse(&["--sheet-only", "--skip-remote"])).unwrap();
        assert!(settings.skip_remote);
    }

    #[test]
    fn test_sheet_only_refuses_skip_sheet() {
        assert!(RunSettings::resolve(&parse(&["--sheet-only", "--skip-sheet"])).is_err());
    }

    #[test]
    fn test_default_renderer_sits_next_to_executable() {
        let path = renderer_next_to(Path::new("/opt/mapforge/bin/mapforge"));
        if cfg!(windows) {
            assert_eq!(
                path,
                PathBuf::from("/opt/mapforge/bin/papyrusbin/PapyrusCs.exe")
            );
        } else {
            assert_eq!(path, PathBuf::from("/opt/mapforge/bin/papyrusbin/PapyrusCs"));
        }
    }
}
