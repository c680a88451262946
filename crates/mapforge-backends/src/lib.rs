//! mapforge extension backends
//!
//! Concrete variants for the three extension capabilities:
//! - `gsheet` — marker data fetched from the Google Sheets API
//! - `rsync` — output distribution through the rsync binary
//! - `discord` — run notifications through a Discord webhook
//!
//! Variants are wired up through explicit registration calls; nothing is
//! discovered by scanning. Callers that want additional variants register
//! them on the same [`Registry`] before resolving definitions.
//!
//! # Example
//!
//! ```rust,ignore
//! let registry = mapforge_backends::default_registry();
//! definition.resolve(&registry)?;
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod discord;
pub mod gsheet;
pub mod rsync;

use mapforge_core::Registry;

/// Register every built-in variant on an existing registry
pub fn register_defaults(registry: &mut Registry) {
    registry.spreadsheets.register("gsheet", gsheet::factory);
    registry.remotes.register("rsync", rsync::factory);
    registry.notifiers.register("discord", discord::factory);
}

/// A registry carrying every built-in variant
pub fn default_registry() -> Registry {
    let mut registry = Registry::new();
    register_defaults(&mut registry);
    registry
}
