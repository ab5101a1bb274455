use std::collections::HashMap;
use std::fmt;

use yrs::branch::{Branch, BranchID};
use yrs::types::array::ArrayEvent;
use yrs::types::map::MapEvent;
use yrs::types::text::TextEvent;
use yrs::updates::decoder::Decode;
use yrs::{
    Any, Doc, Map, MapRef, Out, ReadTxn, StateVector, Subscription, Transact, Transaction,
    TransactionMut, Update,
};

use crate::error::{Result, YDocError};

/// Y.Doc schema keys shared by the document models.
pub mod keys {
    // Root containers
    pub const STATE: &str = "state";
    pub const SOURCE: &str = "source";
    pub const CELLS: &str = "cells";
    pub const META: &str = "meta";

    // State map entries
    pub const DIRTY: &str = "dirty";
    pub const NBFORMAT: &str = "nbformat";
    pub const NBFORMAT_MINOR: &str = "nbformatMinor";

    // Meta map entries
    pub const METADATA: &str = "metadata";

    // Cell fields
    pub const ID: &str = "id";
    pub const CELL_TYPE: &str = "cell_type";
    pub const CELL_METADATA: &str = "metadata";
    pub const OUTPUTS: &str = "outputs";
    pub const EXECUTION_COUNT: &str = "execution_count";
}

/// Cell type constants matching nbformat
pub mod cell_types {
    pub const CODE: &str = "code";
    pub const MARKDOWN: &str = "markdown";
    pub const RAW: &str = "raw";

    /// Whether `cell_type` is one of the nbformat cell types.
    pub fn is_valid(cell_type: &str) -> bool {
        matches!(cell_type, CODE | MARKDOWN | RAW)
    }
}

/// A change reported to an observer, tagged with the container it came from.
pub enum Change<'a> {
    /// A text container changed: a file's text or a cell's source.
    Source(&'a TextEvent),
    /// A code cell's outputs array changed.
    Outputs(&'a ArrayEvent),
    /// A field of a cell map changed.
    Cell(&'a MapEvent),
    /// Cells were inserted into or removed from the notebook.
    Cells(&'a ArrayEvent),
    /// The notebook metadata changed.
    Metadata(&'a MapEvent),
}

impl fmt::Debug for Change<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Change::Source(_) => "Source",
            Change::Outputs(_) => "Outputs",
            Change::Cell(_) => "Cell",
            Change::Cells(_) => "Cells",
            Change::Metadata(_) => "Metadata",
        };
        f.write_str(name)
    }
}

/// Shared observer callback. One callback is registered on many containers.
pub type ChangeCallback = std::sync::Arc<dyn Fn(&TransactionMut, Change<'_>) + Send + Sync>;

/// Stable handle of a shared container, used to key subscriptions.
pub fn handle<T: AsRef<Branch>>(container: &T) -> BranchID {
    container.as_ref().id()
}

/// State common to every document model: the wrapped Y.Doc, its `state`
/// map and the observer subscriptions the document holds.
pub struct YBase {
    doc: Doc,
    state: MapRef,
    subscriptions: HashMap<BranchID, Subscription>,
}

impl YBase {
    /// Wrap an existing Y.Doc. Existing content is left untouched.
    pub fn new(doc: Doc) -> Self {
        let state = doc.get_or_insert_map(keys::STATE);
        Self {
            doc,
            state,
            subscriptions: HashMap::new(),
        }
    }

    /// Get a reference to the underlying Y.Doc.
    pub fn doc(&self) -> &Doc {
        &self.doc
    }

    /// Get the shared state map.
    pub fn state(&self) -> &MapRef {
        &self.state
    }

    pub(crate) fn read_txn(&self) -> Result<Transaction<'_>> {
        self.doc
            .try_transact()
            .map_err(|e| YDocError::Transaction(e.to_string()))
    }

    pub(crate) fn write_txn(&self) -> Result<TransactionMut<'_>> {
        self.doc
            .try_transact_mut()
            .map_err(|e| YDocError::Transaction(e.to_string()))
    }

    /// Whether the document has unsaved changes. An unset flag reads as clean.
    pub fn dirty(&self) -> Result<bool> {
        let txn = self.read_txn()?;
        Ok(matches!(
            self.state.get(&txn, keys::DIRTY),
            Some(Out::Any(Any::Bool(true)))
        ))
    }

    /// Set the dirty flag. Writing the current value opens no transaction.
    pub fn set_dirty(&self, value: bool) -> Result<()> {
        if self.dirty()? == value {
            return Ok(());
        }
        let mut txn = self.write_txn()?;
        self.state.insert(&mut txn, keys::DIRTY, value);
        tracing::debug!(dirty = value, "document dirty flag changed");
        Ok(())
    }

    /// Register a subscription for `container`, replacing any previous one.
    pub fn subscribe(&mut self, container: BranchID, subscription: Subscription) {
        self.subscriptions.insert(container, subscription);
    }

    /// Number of containers currently observed.
    pub fn subscription_count(&self) -> usize {
        self.subscriptions.len()
    }

    /// Release every subscription held by this document.
    pub fn unobserve(&mut self) {
        if !self.subscriptions.is_empty() {
            tracing::trace!(count = self.subscriptions.len(), "releasing subscriptions");
        }
        // Dropping a Subscription unregisters its callback.
        self.subscriptions.clear();
    }

    /// Encode the document state as an update.
    pub fn encode_state_as_update(&self) -> Result<Vec<u8>> {
        let txn = self.read_txn()?;
        Ok(txn.encode_state_as_update_v1(&StateVector::default()))
    }

    /// Apply an update from another client.
    pub fn apply_update(&self, update: &[u8]) -> Result<()> {
        let update = Update::decode_v1(update).map_err(|e| YDocError::Update(e.to_string()))?;

        let mut txn = self.write_txn()?;
        txn.apply_update(update)
            .map_err(|e| YDocError::Update(e.to_string()))?;

        Ok(())
    }
}

impl fmt::Debug for YBase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("YBase")
            .field("client_id", &self.doc.client_id())
            .field("subscriptions", &self.subscriptions.len())
            .finish()
    }
}

/// A Jupyter document model backed by a Y.Doc.
///
/// Implemented by [`YFile`](crate::YFile) and [`YNotebook`](crate::YNotebook).
/// `Content` is the borrowed form callers write; reads return its owned form.
pub trait YDocument {
    type Content: ?Sized + ToOwned;

    fn base(&self) -> &YBase;

    fn base_mut(&mut self) -> &mut YBase;

    /// Read the whole document in its external shape.
    fn content(&self) -> Result<<Self::Content as ToOwned>::Owned>;

    /// Replace the whole document.
    fn set_content(&self, value: &Self::Content) -> Result<()>;

    /// Subscribe `callback` to changes in the document's containers.
    fn observe<F>(&mut self, callback: F) -> Result<()>
    where
        F: Fn(&TransactionMut, Change<'_>) + Send + Sync + 'static;

    fn unobserve(&mut self) {
        self.base_mut().unobserve();
    }

    fn doc(&self) -> &Doc {
        self.base().doc()
    }

    fn state(&self) -> &MapRef {
        self.base().state()
    }

    fn dirty(&self) -> Result<bool> {
        self.base().dirty()
    }

    fn set_dirty(&self, value: bool) -> Result<()> {
        self.base().set_dirty(value)
    }

    fn encode_state_as_update(&self) -> Result<Vec<u8>> {
        self.base().encode_state_as_update()
    }

    fn apply_update(&self, update: &[u8]) -> Result<()> {
        self.base().apply_update(update)
    }
}
