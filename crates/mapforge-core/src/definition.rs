//! Definition documents and their resolution
//!
//! A definition is parsed once per configuration file, resolved once
//! against the extension registry, and read-only afterwards. Resolution
//! is memoized: looking an extension up twice never re-runs its factory
//! (and so never repeats construction side effects such as
//! authenticating to a spreadsheet service).

use std::path::{Path, PathBuf};
use std::sync::Arc;

use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};

use crate::document::Document;
use crate::error::Result;
use crate::extensions::{Notifier, OwnerRef, Registry, RemoteSink, SpreadsheetSource};
use crate::markers::MARKER_FILE_NAME;
use crate::options::{OptionSet, flatten};

/// The typed body of one definition file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefinitionDoc {
    /// Display label
    #[serde(default)]
    pub name: Option<String>,

    /// World directory handed to the renderer
    pub world: PathBuf,

    /// Output root the renderer writes into
    pub dest: PathBuf,

    /// Options merged into every task
    #[serde(default, rename = "defaultoptions", alias = "defaultOptions")]
    pub default_options: OptionSet,

    /// One renderer invocation per entry
    #[serde(default)]
    pub tasks: Vec<OptionSet>,

    /// Tagged marker-data source block
    #[serde(default)]
    pub spreadsheet: Option<Document>,

    /// Tagged distribution sink block
    #[serde(default)]
    pub remote: Option<Document>,

    /// Tagged notifier block
    #[serde(default)]
    pub webhook: Option<Document>,
}

impl DefinitionDoc {
    /// Whether any renderer invocation is configured
    pub fn has_tasks(&self) -> bool {
        !self.tasks.is_empty()
    }

    /// Where the generated marker file lives
    pub fn marker_file_path(&self) -> PathBuf {
        self.dest.join("map").join(MARKER_FILE_NAME)
    }

    /// The renderer argument vectors, one per task:
    /// `--world <world> --output <dest>` followed by the flattened default
    /// options, followed by the flattened task
    pub fn commands(&self) -> Result<Vec<Vec<String>>> {
        let mut start = vec![
            "--world".to_string(),
            self.world.to_string_lossy().into_owned(),
            "--output".to_string(),
            self.dest.to_string_lossy().into_owned(),
        ];
        start.extend(flatten(&self.default_options)?);

        self.tasks
            .iter()
            .map(|task| {
                let mut command = start.clone();
                command.extend(flatten(task)?);
                Ok(command)
            })
            .collect()
    }

    #[cfg(test)]
    pub(crate) fn for_tests(name: &str) -> Self {
        Self {
            name: Some(name.to_string()),
            world: PathBuf::from("/world"),
            dest: PathBuf::from("/dest"),
            default_options: OptionSet::default(),
            tasks: vec![],
            spreadsheet: None,
            remote: None,
            webhook: None,
        }
    }
}

/// A parsed definition plus its resolved extensions.
///
/// Lifecycle: *unresolved* after parsing, *resolved* once
/// [`Definition::resolve`] has run, then read-only until process exit.
/// There is no way back to *unresolved*.
pub struct Definition {
    doc: Arc<DefinitionDoc>,
    spreadsheet: OnceCell<Option<Arc<dyn SpreadsheetSource>>>,
    remote: OnceCell<Option<Arc<dyn RemoteSink>>>,
    webhook: OnceCell<Option<Arc<dyn Notifier>>>,
}

impl std::fmt::Debug for Definition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Definition")
            .field("doc", &self.doc)
            .field("resolved", &self.spreadsheet.get().is_some())
            .finish()
    }
}

impl Definition {
    /// Wrap a parsed document
    pub fn new(doc: DefinitionDoc) -> Self {
        Self {
            doc: Arc::new(doc),
            spreadsheet: OnceCell::new(),
            remote: OnceCell::new(),
            webhook: OnceCell::new(),
        }
    }

    /// Parse a definition from YAML text
    pub fn from_yaml(text: &str) -> Result<Self> {
        let doc: DefinitionDoc = serde_yaml::from_str(text)?;
        Ok(Self::new(doc))
    }

    /// Load a definition from a file
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(crate::error::Error::DefinitionNotFound {
                path: path.display().to_string(),
            });
        }
        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml(&contents)
    }

    /// The parsed document
    pub fn doc(&self) -> &Arc<DefinitionDoc> {
        &self.doc
    }

    /// Resolve every tagged block against the registry.
    ///
    /// Idempotent: a second call returns without re-running any factory.
    /// An unregistered `type` fails here, before any task runs.
    pub fn resolve(&self, registry: &Registry) -> Result<()> {
        self.spreadsheet.get_or_try_init(|| {
            self.doc
                .spreadsheet
                .as_ref()
                .map(|block| registry.spreadsheets.build(block, OwnerRef::bound(&self.doc)))
                .transpose()
        })?;
        self.remote.get_or_try_init(|| {
            self.doc
                .remote
                .as_ref()
                .map(|block| registry.remotes.build(block, OwnerRef::bound(&self.doc)))
                .transpose()
        })?;
        self.webhook.get_or_try_init(|| {
            self.doc
                .webhook
                .as_ref()
                .map(|block| registry.notifiers.build(block, OwnerRef::bound(&self.doc)))
                .transpose()
        })?;
        Ok(())
    }

    /// The resolved spreadsheet source, if the definition has one and
    /// [`Definition::resolve`] has run
    pub fn spreadsheet(&self) -> Option<&Arc<dyn SpreadsheetSource>> {
        self.spreadsheet.get().and_then(Option::as_ref)
    }

    /// The resolved remote sink, if the definition has one and
    /// [`Definition::resolve`] has run
    pub fn remote(&self) -> Option<&Arc<dyn RemoteSink>> {
        self.remote.get().and_then(Option::as_ref)
    }

    /// The resolved notifier, if the definition has one and
    /// [`Definition::resolve`] has run
    pub fn webhook(&self) -> Option<&Arc<dyn Notifier>> {
        self.webhook.get().and_then(Option::as_ref)
    }

    /// The renderer argument vectors, one per task
    pub fn commands(&self) -> Result<Vec<Vec<String>>> {
        self.doc.commands()
    }
}
