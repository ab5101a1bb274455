//! Plain text documents.

use std::sync::Arc;

use yrs::{Doc, GetString, Observable, Text, TextRef, TransactionMut};

use crate::doc::{handle, keys, Change, ChangeCallback, YBase, YDocument};
use crate::error::Result;

/// A text file held in a single Y.Text named `source`.
#[derive(Debug)]
pub struct YFile {
    base: YBase,
    source: TextRef,
}

impl YFile {
    /// Wrap an existing Y.Doc. Existing content is left untouched.
    pub fn new(doc: Doc) -> Self {
        let source = doc.get_or_insert_text(keys::SOURCE);
        Self {
            base: YBase::new(doc),
            source,
        }
    }

    /// Get the source Y.Text reference.
    pub fn source(&self) -> &TextRef {
        &self.source
    }
}

impl Default for YFile {
    fn default() -> Self {
        Self::new(Doc::new())
    }
}

impl YDocument for YFile {
    type Content = str;

    fn base(&self) -> &YBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut YBase {
        &mut self.base
    }

    fn content(&self) -> Result<String> {
        let txn = self.base.read_txn()?;
        Ok(self.source.get_string(&txn))
    }

    fn set_content(&self, value: &str) -> Result<()> {
        let mut txn = self.base.write_txn()?;
        let len = self.source.len(&txn);
        if len > 0 {
            self.source.remove_range(&mut txn, 0, len);
        }
        if !value.is_empty() {
            self.source.push(&mut txn, value);
        }
        tracing::debug!(len = value.len(), "file content replaced");
        Ok(())
    }

    fn observe<F>(&mut self, callback: F) -> Result<()>
    where
        F: Fn(&TransactionMut, Change<'_>) + Send + Sync + 'static,
    {
        let callback: ChangeCallback = Arc::new(callback);
        let subscription = self
            .source
            .observe(move |txn, event| callback(txn, Change::Source(event)));
        self.base.subscribe(handle(&self.source), subscription);
        Ok(())
    }
}
