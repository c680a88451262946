//! Extension capabilities and the tag registry
//!
//! A definition may carry up to three tagged blocks: a spreadsheet source,
//! a remote sink, and a notifier. Each capability keeps its own tag →
//! factory table; variants are registered explicitly at startup and an
//! unregistered tag fails when the definition is resolved, never at first
//! use.
//!
//! Resolved extensions hold a non-owning back-reference to the definition
//! that owns them. Operations use it as their default context; an explicit
//! context argument, when supplied, overrides it.

use std::collections::HashMap;
use std::sync::{Arc, Weak};

use async_trait::async_trait;

use crate::definition::DefinitionDoc;
use crate::document::Document;
use crate::error::{Error, Result};
use crate::markers::{PlayerMarker, render_marker_file};

/// Non-owning back-reference from an extension to its owning definition
#[derive(Debug, Clone, Default)]
pub struct OwnerRef {
    owner: Weak<DefinitionDoc>,
}

impl OwnerRef {
    /// A reference bound to the given definition
    pub fn bound(doc: &Arc<DefinitionDoc>) -> Self {
        Self {
            owner: Arc::downgrade(doc),
        }
    }

    /// A reference bound to nothing; every operation on the extension
    /// must then supply an explicit context
    pub fn detached() -> Self {
        Self::default()
    }

    /// The context for an operation: the explicit argument when supplied,
    /// else the owning definition
    pub fn resolve(&self, explicit: Option<&Arc<DefinitionDoc>>) -> Result<Arc<DefinitionDoc>> {
        match explicit {
            Some(doc) => Ok(Arc::clone(doc)),
            None => self.owner.upgrade().ok_or(Error::UnboundExtension),
        }
    }
}

/// A source of marker data (e.g. a spreadsheet service)
#[async_trait]
pub trait SpreadsheetSource: Send + Sync {
    /// The back-reference established at resolution time
    fn owner(&self) -> &OwnerRef;

    /// Fetch and synthesize the marker list
    async fn fetch_markers(
        &self,
        context: Option<&Arc<DefinitionDoc>>,
    ) -> Result<Vec<PlayerMarker>>;

    /// Fetch markers and write them to the definition's marker file
    async fn write_markers(&self, context: Option<&Arc<DefinitionDoc>>) -> Result<()> {
        let doc = self.owner().resolve(context)?;
        let markers = self.fetch_markers(Some(&doc)).await?;

        let path = doc.marker_file_path();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&path, render_marker_file(&markers)?)?;
        tracing::debug!("Wrote {} markers to {}", markers.len(), path.display());
        Ok(())
    }
}

/// A distribution sink for the rendered output
#[async_trait]
pub trait RemoteSink: Send + Sync {
    /// The back-reference established at resolution time
    fn owner(&self) -> &OwnerRef;

    /// Transfer the output directory's contents to the destination
    async fn upload(&self, context: Option<&Arc<DefinitionDoc>>) -> Result<()>;

    /// Transfer only the marker file; sinks without a cheaper path fall
    /// back to a full upload
    async fn upload_markers(&self, context: Option<&Arc<DefinitionDoc>>) -> Result<()> {
        self.upload(context).await
    }
}

/// A notification endpoint told about a completed run
#[async_trait]
pub trait Notifier: Send + Sync {
    /// The back-reference established at resolution time
    fn owner(&self) -> &OwnerRef;

    /// Deliver the notification
    async fn push(&self, context: Option<&Arc<DefinitionDoc>>) -> Result<()>;
}

/// Constructor for one registered variant
pub type Factory<T> = Box<dyn Fn(&Document, OwnerRef) -> Result<Arc<T>> + Send + Sync>;

/// Tag → factory table for one capability category
pub struct ExtensionTable<T: ?Sized> {
    capability: &'static str,
    factories: HashMap<String, Factory<T>>,
}

impl<T: ?Sized> ExtensionTable<T> {
    /// An empty table for the named capability
    pub fn new(capability: &'static str) -> Self {
        Self {
            capability,
            factories: HashMap::new(),
        }
    }

    /// Register a variant under a tag, replacing any previous registration
    pub fn register<F>(&mut self, tag: impl Into<String>, factory: F)
    where
        F: Fn(&Document, OwnerRef) -> Result<Arc<T>> + Send + Sync + 'static,
    {
        self.factories.insert(tag.into(), Box::new(factory));
    }

    /// Construct the variant a tagged block names.
    ///
    /// Fails with [`Error::UnknownExtensionType`] when the tag has no
    /// registration for this capability.
    pub fn build(&self, block: &Document, owner: OwnerRef) -> Result<Arc<T>> {
        let tag = block.tag()?;
        let factory = self
            .factories
            .get(tag)
            .ok_or_else(|| Error::UnknownExtensionType {
                capability: self.capability,
                tag: tag.to_string(),
            })?;
        factory(block, owner)
    }

    /// Registered tags, for diagnostics
    pub fn tags(&self) -> Vec<&str> {
        let mut tags: Vec<&str> = self.factories.keys().map(String::as_str).collect();
        tags.sort_unstable();
        tags
    }
}

impl<T: ?Sized> std::fmt::Debug for ExtensionTable<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExtensionTable")
            .field("capability", &self.capability)
            .field("tags", &self.tags())
            .finish()
    }
}

/// The three per-capability tables a definition resolves against
#[derive(Debug)]
pub struct Registry {
    /// Spreadsheet source variants
    pub spreadsheets: ExtensionTable<dyn SpreadsheetSource>,

    /// Remote sink variants
    pub remotes: ExtensionTable<dyn RemoteSink>,

    /// Notifier variants
    pub notifiers: ExtensionTable<dyn Notifier>,
}

impl Registry {
    /// A registry with no variants registered
    pub fn new() -> Self {
        Self {
            spreadsheets: ExtensionTable::new("spreadsheet"),
            remotes: ExtensionTable::new("remote"),
            notifiers: ExtensionTable::new("webhook"),
        }
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}
