//! # jupyter-ydoc
//!
//! Jupyter document models backed by [yrs](https://docs.rs/yrs) (Rust port of
//! Y.js), laid out the way `jupyter_ydoc` lays them out so Rust and Python or
//! JavaScript peers can edit the same Y.Doc.
//!
//! ## What it does
//!
//! - **YFile**: a plain text document in one Y.Text
//! - **YNotebook**: a notebook as a Y.Array of cell Y.Maps, with Y.Text
//!   sources and Y.Array outputs, plus notebook metadata and format version
//! - **Numbers**: integers are stored as floats (Y.js has one number type)
//!   and read back as integers
//! - **Observers**: per-container subscriptions with a single teardown
//!
//! ## Example
//!
//! ```rust
//! use jupyter_ydoc::{YDocument, YNotebook};
//! use serde_json::json;
//!
//! let nb = YNotebook::new(yrs::Doc::new());
//! nb.set_content(&json!({
//!     "cells": [],
//!     "metadata": {},
//!     "nbformat": 4,
//!     "nbformat_minor": 5
//! }))?;
//!
//! // An empty notebook always gets one code cell
//! assert_eq!(nb.cell_count()?, 1);
//! # Ok::<(), jupyter_ydoc::YDocError>(())
//! ```

pub mod cast;
pub mod convert;
pub mod doc;
pub mod error;
pub mod file;
pub mod kind;
pub mod notebook;

pub use cast::{cast_all, NumberKind};
pub use convert::{any_to_json, json_to_any, out_to_json};
pub use doc::{cell_types, keys, Change, ChangeCallback, YBase, YDocument};
pub use error::{Result, YDocError};
pub use file::YFile;
pub use kind::{Document, DocumentKind};
pub use notebook::YNotebook;
