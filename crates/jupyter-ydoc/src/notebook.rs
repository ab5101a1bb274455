//! Jupyter notebooks as nested Y.Doc containers.
//!
//! ```text
//! Y.Doc {
//!   cells: Y.Array<Y.Map{
//!     id: string,
//!     cell_type: "code" | "markdown" | "raw",
//!     source: Y.Text,
//!     metadata: object,
//!     outputs: Y.Array (when present),
//!     execution_count: number | null (when present)
//!   }>,
//!   meta: Y.Map { metadata: object },
//!   state: Y.Map { dirty, nbformat, nbformatMinor }
//! }
//! ```
//!
//! Numbers are stored as floats and read back as integers when integral.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::{json, Value};
use uuid::Uuid;
use yrs::types::ToJson;
use yrs::{
    Any, Array, ArrayPrelim, ArrayRef, Doc, Map, MapPrelim, MapRef, Observable, Out, ReadTxn,
    TextPrelim, TransactionMut,
};

use crate::cast::{as_int, cast_all, NumberKind};
use crate::convert::{any_to_json, json_to_any, out_to_json};
use crate::doc::{cell_types, handle, keys, Change, ChangeCallback, YBase, YDocument};
use crate::error::{Result, YDocError};

/// A Jupyter notebook held in a Y.Doc.
#[derive(Debug)]
pub struct YNotebook {
    base: YBase,
    cells: ArrayRef,
    meta: MapRef,
}

/// A validated cell, ready to be inserted.
struct CellPrelim {
    fields: HashMap<String, Any>,
    source: String,
    outputs: Option<Vec<Any>>,
}

impl YNotebook {
    /// Wrap an existing Y.Doc. Existing content is left untouched.
    pub fn new(doc: Doc) -> Self {
        let cells = doc.get_or_insert_array(keys::CELLS);
        let meta = doc.get_or_insert_map(keys::META);
        Self {
            base: YBase::new(doc),
            cells,
            meta,
        }
    }

    /// Get the cells array reference.
    pub fn cells(&self) -> &ArrayRef {
        &self.cells
    }

    /// Get the meta map reference.
    pub fn meta(&self) -> &MapRef {
        &self.meta
    }

    /// Get the number of cells in the notebook.
    pub fn cell_count(&self) -> Result<u32> {
        let txn = self.base.read_txn()?;
        Ok(self.cells.len(&txn))
    }

    /// The stored `(nbformat, nbformat_minor)`.
    pub fn nbformat(&self) -> Result<(i64, i64)> {
        let txn = self.base.read_txn()?;
        self.read_nbformat(&txn)
    }

    /// Replace the notebook from its JSON text.
    pub fn set_content_from_str(&self, json: &str) -> Result<()> {
        let value: Value = serde_json::from_str(json)?;
        self.set_content(&value)
    }

    /// Get one cell in its external shape.
    pub fn get_cell(&self, index: u32) -> Result<Option<Value>> {
        let txn = self.base.read_txn()?;
        let Some(out) = self.cells.get(&txn, index) else {
            return Ok(None);
        };
        let mut cell = out_to_json(&out, &txn);
        cast_all(&mut cell, NumberKind::Float, NumberKind::Int);
        if let Ok((major, minor)) = self.read_nbformat(&txn) {
            if hides_cell_ids(major, minor) {
                strip_id(&mut cell);
            }
        }
        Ok(Some(cell))
    }

    /// Insert a cell at `index`. A cell without an `id` gets a fresh one.
    ///
    /// Cells inserted this way are not observed until `observe` is called again.
    pub fn insert_cell(&self, index: u32, cell: &Value) -> Result<()> {
        let mut cell = cell.clone();
        cast_all(&mut cell, NumberKind::Int, NumberKind::Float);
        let prelim = prepare_cell(&cell, "cell")?;

        let mut txn = self.base.write_txn()?;
        let len = self.cells.len(&txn);
        if index > len {
            return Err(YDocError::CellIndexOutOfBounds { index, len });
        }
        insert_cell_prelim(&self.cells, &mut txn, index, prelim);
        Ok(())
    }

    /// Append a cell. Returns its index.
    pub fn append_cell(&self, cell: &Value) -> Result<u32> {
        let index = self.cell_count()?;
        self.insert_cell(index, cell)?;
        Ok(index)
    }

    /// Remove a cell by index.
    pub fn remove_cell(&self, index: u32) -> Result<()> {
        let mut txn = self.base.write_txn()?;
        let len = self.cells.len(&txn);
        if index >= len {
            return Err(YDocError::CellIndexOutOfBounds { index, len });
        }
        self.cells.remove(&mut txn, index);
        Ok(())
    }

    fn read_nbformat<T: ReadTxn>(&self, txn: &T) -> Result<(i64, i64)> {
        let read = |key: &str| -> Result<i64> {
            let out = self
                .base
                .state()
                .get(txn, key)
                .ok_or_else(|| YDocError::MissingField(key.into()))?;
            as_int(&out_to_json(&out, txn)).ok_or_else(|| YDocError::invalid(key, "an integer"))
        };
        Ok((read(keys::NBFORMAT)?, read(keys::NBFORMAT_MINOR)?))
    }
}

impl Default for YNotebook {
    fn default() -> Self {
        Self::new(Doc::new())
    }
}

impl YDocument for YNotebook {
    type Content = Value;

    fn base(&self) -> &YBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut YBase {
        &mut self.base
    }

    fn content(&self) -> Result<Value> {
        let txn = self.base.read_txn()?;
        let mut cells = any_to_json(&self.cells.to_json(&txn));
        let mut metadata = self
            .meta
            .get(&txn, keys::METADATA)
            .map(|out| out_to_json(&out, &txn))
            .ok_or_else(|| YDocError::MissingField(keys::METADATA.into()))?;
        let (nbformat, nbformat_minor) = self.read_nbformat(&txn)?;

        cast_all(&mut cells, NumberKind::Float, NumberKind::Int);
        cast_all(&mut metadata, NumberKind::Float, NumberKind::Int);

        if hides_cell_ids(nbformat, nbformat_minor) {
            if let Value::Array(cells) = &mut cells {
                cells.iter_mut().for_each(strip_id);
            }
        }

        Ok(json!({
            "cells": cells,
            "metadata": metadata,
            "nbformat": nbformat,
            "nbformat_minor": nbformat_minor,
        }))
    }

    fn set_content(&self, value: &Value) -> Result<()> {
        let mut nb = value.clone();
        cast_all(&mut nb, NumberKind::Int, NumberKind::Float);

        let cells = nb
            .get("cells")
            .ok_or_else(|| YDocError::MissingField("cells".into()))?
            .as_array()
            .ok_or_else(|| YDocError::invalid("cells", "an array"))?;
        let metadata = nb
            .get("metadata")
            .ok_or_else(|| YDocError::MissingField("metadata".into()))?;
        let nbformat = format_field(&nb, "nbformat")?;
        let nbformat_minor = format_field(&nb, "nbformat_minor")?;

        let mut prelims = cells
            .iter()
            .enumerate()
            .map(|(i, cell)| prepare_cell(cell, &format!("cells[{i}]")))
            .collect::<Result<Vec<_>>>()?;
        if prelims.is_empty() {
            prelims.push(prepare_cell(&default_cell(), "cells[0]")?);
        }
        let cell_count = prelims.len();

        let mut txn = self.base.write_txn()?;

        // clear document
        let len = self.cells.len(&txn);
        if len > 0 {
            self.cells.remove_range(&mut txn, 0, len);
        }
        let meta_keys: Vec<String> = self.meta.keys(&txn).map(String::from).collect();
        for key in &meta_keys {
            self.meta.remove(&mut txn, key);
        }
        let state = self.base.state();
        let state_keys: Vec<String> = state
            .keys(&txn)
            .filter(|key| *key != keys::DIRTY)
            .map(String::from)
            .collect();
        for key in &state_keys {
            state.remove(&mut txn, key);
        }

        // initialize document
        for (index, prelim) in (0u32..).zip(prelims) {
            insert_cell_prelim(&self.cells, &mut txn, index, prelim);
        }
        self.meta.insert(&mut txn, keys::METADATA, json_to_any(metadata));
        state.insert(&mut txn, keys::NBFORMAT, Any::Number(nbformat as f64));
        state.insert(&mut txn, keys::NBFORMAT_MINOR, Any::Number(nbformat_minor as f64));

        tracing::debug!(
            cells = cell_count,
            nbformat,
            nbformat_minor,
            "notebook content replaced"
        );
        Ok(())
    }

    fn observe<F>(&mut self, callback: F) -> Result<()>
    where
        F: Fn(&TransactionMut, Change<'_>) + Send + Sync + 'static,
    {
        self.unobserve();
        let callback: ChangeCallback = Arc::new(callback);

        let cells: Vec<MapRef> = {
            let txn = self.base.read_txn()?;
            self.cells
                .iter(&txn)
                .filter_map(|value| match value {
                    Out::YMap(cell) => Some(cell),
                    _ => None,
                })
                .collect()
        };

        for cell in cells {
            let (source, outputs) = {
                let txn = self.base.read_txn()?;
                let source = match cell.get(&txn, keys::SOURCE) {
                    Some(Out::YText(text)) => Some(text),
                    _ => None,
                };
                let outputs = match cell.get(&txn, keys::OUTPUTS) {
                    Some(Out::YArray(outputs)) => Some(outputs),
                    _ => None,
                };
                (source, outputs)
            };

            if let Some(source) = source {
                let cb = Arc::clone(&callback);
                let sub = source.observe(move |txn, event| cb(txn, Change::Source(event)));
                self.base.subscribe(handle(&source), sub);
            }
            if let Some(outputs) = outputs {
                let cb = Arc::clone(&callback);
                let sub = outputs.observe(move |txn, event| cb(txn, Change::Outputs(event)));
                self.base.subscribe(handle(&outputs), sub);
            }
            let cb = Arc::clone(&callback);
            let sub = cell.observe(move |txn, event| cb(txn, Change::Cell(event)));
            self.base.subscribe(handle(&cell), sub);
        }

        let cb = Arc::clone(&callback);
        let sub = self
            .cells
            .observe(move |txn, event| cb(txn, Change::Cells(event)));
        self.base.subscribe(handle(&self.cells), sub);

        let cb = callback;
        let sub = self
            .meta
            .observe(move |txn, event| cb(txn, Change::Metadata(event)));
        self.base.subscribe(handle(&self.meta), sub);

        tracing::trace!(
            subscriptions = self.base.subscription_count(),
            "observing notebook"
        );
        Ok(())
    }
}

/// Notebook format 4.0 to 4.4 predates cell ids.
fn hides_cell_ids(nbformat: i64, nbformat_minor: i64) -> bool {
    nbformat == 4 && nbformat_minor <= 4
}

fn strip_id(cell: &mut Value) {
    if let Value::Object(cell) = cell {
        cell.remove(keys::ID);
    }
}

fn format_field(nb: &Value, field: &str) -> Result<i64> {
    let value = nb
        .get(field)
        .ok_or_else(|| YDocError::MissingField(field.into()))?;
    as_int(value).ok_or_else(|| YDocError::invalid(field, "an integer"))
}

/// The cell a notebook gets when it would otherwise have none.
fn default_cell() -> Value {
    json!({
        "cell_type": cell_types::CODE,
        "execution_count": null,
        "metadata": {},
        "outputs": [],
        "source": "",
        "id": Uuid::new_v4().to_string(),
    })
}

/// Validate one cell (numbers already stored as floats) and split off the
/// parts that become shared types.
fn prepare_cell(cell: &Value, path: &str) -> Result<CellPrelim> {
    let obj = cell
        .as_object()
        .ok_or_else(|| YDocError::invalid(path, "an object"))?;

    let cell_type = obj
        .get(keys::CELL_TYPE)
        .ok_or_else(|| YDocError::MissingField(format!("{path}.{}", keys::CELL_TYPE)))?
        .as_str()
        .ok_or_else(|| YDocError::invalid(format!("{path}.{}", keys::CELL_TYPE), "a string"))?;
    if !cell_types::is_valid(cell_type) {
        return Err(YDocError::InvalidCellType(cell_type.into()));
    }

    let source = match obj.get(keys::SOURCE) {
        Some(Value::String(s)) => s.clone(),
        // nbformat allows multiline strings stored as a list of lines
        Some(Value::Array(lines)) => lines
            .iter()
            .map(|line| line.as_str())
            .collect::<Option<Vec<_>>>()
            .ok_or_else(|| {
                YDocError::invalid(format!("{path}.{}", keys::SOURCE), "a string or list of strings")
            })?
            .concat(),
        Some(_) => {
            return Err(YDocError::invalid(
                format!("{path}.{}", keys::SOURCE),
                "a string or list of strings",
            ))
        }
        None => return Err(YDocError::MissingField(format!("{path}.{}", keys::SOURCE))),
    };

    let outputs = match obj.get(keys::OUTPUTS) {
        Some(Value::Array(outputs)) => Some(outputs.iter().map(json_to_any).collect()),
        Some(_) => {
            return Err(YDocError::invalid(
                format!("{path}.{}", keys::OUTPUTS),
                "an array",
            ))
        }
        None => None,
    };

    let mut fields: HashMap<String, Any> = obj
        .iter()
        .filter(|(key, _)| *key != keys::SOURCE && *key != keys::OUTPUTS)
        .map(|(key, value)| (key.clone(), json_to_any(value)))
        .collect();

    match fields.get(keys::ID) {
        Some(Any::String(_)) => {}
        Some(_) => return Err(YDocError::invalid(format!("{path}.{}", keys::ID), "a string")),
        None => {
            fields.insert(keys::ID.into(), Any::String(Uuid::new_v4().to_string().into()));
        }
    }

    Ok(CellPrelim {
        fields,
        source,
        outputs,
    })
}

fn insert_cell_prelim(cells: &ArrayRef, txn: &mut TransactionMut, index: u32, prelim: CellPrelim) {
    let cell = cells.insert(txn, index, MapPrelim::from_iter(prelim.fields));
    cell.insert(txn, keys::SOURCE, TextPrelim::new(prelim.source.as_str()));
    if let Some(outputs) = prelim.outputs {
        let array = cell.insert(txn, keys::OUTPUTS, ArrayPrelim::default());
        if !outputs.is_empty() {
            array.insert_range(txn, 0, outputs);
        }
    }
}
