//! mapforge Core Library
//!
//! This crate provides the core functionality for mapforge:
//! - Definition parsing and extension resolution
//! - Option flattening into renderer argument vectors
//! - Marker synthesis from row-aligned spreadsheet data
//! - Deterministic marker identity and color derivation
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │ Definition  │────▶│  Registry   │────▶│ Extensions  │
//! │   (YAML)    │     │ (tag→variant)│    │ (bound back)│
//! └─────────────┘     └─────────────┘     └─────────────┘
//!        │                                       │
//!        ▼                                       ▼
//!  argument vectors                      marker synthesis
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use mapforge_core::{Definition, Registry};
//!
//! let defi = Definition::from_path("survival.yaml")?;
//! defi.resolve(&registry)?;
//! for command in defi.commands()? {
//!     println!("renderer {}", command.join(" "));
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod definition;
pub mod document;
pub mod error;
pub mod extensions;
pub mod grid;
pub mod markers;
pub mod options;

pub use definition::{Definition, DefinitionDoc};
pub use document::Document;
pub use error::{Error, Result};
pub use extensions::{Notifier, OwnerRef, Registry, RemoteSink, SpreadsheetSource};
pub use markers::PlayerMarker;
