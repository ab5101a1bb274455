//! The closed set of document models, selectable by name.

use std::fmt;
use std::str::FromStr;

use serde_json::Value;
use yrs::{Doc, TransactionMut};

use crate::doc::{Change, YDocument};
use crate::error::{Result, YDocError};
use crate::file::YFile;
use crate::notebook::YNotebook;

/// Document type names, as used in collaboration room ids
/// (`{format}:{type}:{path}`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocumentKind {
    File,
    Notebook,
}

impl DocumentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentKind::File => "file",
            DocumentKind::Notebook => "notebook",
        }
    }
}

impl FromStr for DocumentKind {
    type Err = YDocError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "file" => Ok(DocumentKind::File),
            "notebook" => Ok(DocumentKind::Notebook),
            other => Err(YDocError::UnsupportedDocumentType(other.to_string())),
        }
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Any document model, with content exchanged as JSON.
///
/// A file's content is a JSON string; a notebook's is the notebook object.
#[derive(Debug)]
pub enum Document {
    File(YFile),
    Notebook(YNotebook),
}

impl Document {
    /// Wrap `doc` in the model for `kind`.
    pub fn new(kind: DocumentKind, doc: Doc) -> Self {
        match kind {
            DocumentKind::File => Document::File(YFile::new(doc)),
            DocumentKind::Notebook => Document::Notebook(YNotebook::new(doc)),
        }
    }

    /// Wrap `doc` in the model named `kind`.
    pub fn from_type_name(kind: &str, doc: Doc) -> Result<Self> {
        Ok(Self::new(kind.parse()?, doc))
    }

    pub fn kind(&self) -> DocumentKind {
        match self {
            Document::File(_) => DocumentKind::File,
            Document::Notebook(_) => DocumentKind::Notebook,
        }
    }

    pub fn doc(&self) -> &Doc {
        match self {
            Document::File(file) => file.doc(),
            Document::Notebook(nb) => nb.doc(),
        }
    }

    pub fn content(&self) -> Result<Value> {
        match self {
            Document::File(file) => Ok(Value::String(file.content()?)),
            Document::Notebook(nb) => nb.content(),
        }
    }

    pub fn set_content(&self, value: &Value) -> Result<()> {
        match self {
            Document::File(file) => {
                let text = value
                    .as_str()
                    .ok_or_else(|| YDocError::invalid("content", "a string"))?;
                file.set_content(text)
            }
            Document::Notebook(nb) => nb.set_content(value),
        }
    }

    pub fn dirty(&self) -> Result<bool> {
        match self {
            Document::File(file) => file.dirty(),
            Document::Notebook(nb) => nb.dirty(),
        }
    }

    pub fn set_dirty(&self, value: bool) -> Result<()> {
        match self {
            Document::File(file) => file.set_dirty(value),
            Document::Notebook(nb) => nb.set_dirty(value),
        }
    }

    pub fn observe<F>(&mut self, callback: F) -> Result<()>
    where
        F: Fn(&TransactionMut, Change<'_>) + Send + Sync + 'static,
    {
        match self {
            Document::File(file) => file.observe(callback),
            Document::Notebook(nb) => nb.observe(callback),
        }
    }

    pub fn unobserve(&mut self) {
        match self {
            Document::File(file) => file.unobserve(),
            Document::Notebook(nb) => nb.unobserve(),
        }
    }
}

impl From<YFile> for Document {
    fn from(file: YFile) -> Self {
        Document::File(file)
    }
}

impl From<YNotebook> for Document {
    fn from(nb: YNotebook) -> Self {
        Document::Notebook(nb)
    }
}
