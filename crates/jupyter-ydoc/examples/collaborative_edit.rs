//! Two replicas of one notebook exchanging updates.
//!
//! Usage:
//!   cargo run -p jupyter-ydoc --example collaborative_edit

use jupyter_ydoc::{keys, Change, YDocument, YNotebook};
use serde_json::json;
use yrs::{Array, Doc, Map, Out, ReadTxn, Text, Transact};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let alice = YNotebook::new(Doc::new());
    alice.set_content(&json!({
        "cells": [
            {"cell_type": "markdown", "id": "intro", "metadata": {}, "source": "# Shared notebook"},
            {"cell_type": "code", "id": "calc", "execution_count": null,
             "metadata": {}, "outputs": [], "source": "x = 1"}
        ],
        "metadata": {"kernelspec": {"name": "python3", "display_name": "Python 3"}},
        "nbformat": 4,
        "nbformat_minor": 5
    }))?;

    let mut bob = YNotebook::new(Doc::new());
    bob.apply_update(&alice.encode_state_as_update()?)?;
    bob.observe(|txn, change| match change {
        Change::Source(event) => println!("bob: source changed: {:?}", event.delta(txn)),
        other => println!("bob: {:?} changed", other),
    })?;

    // Alice edits the code cell
    let before = alice.doc().transact().state_vector();
    {
        let txn = alice.doc().transact();
        let Some(Out::YMap(cell)) = alice.cells().get(&txn, 1) else {
            return Err("missing code cell".into());
        };
        let Some(Out::YText(source)) = cell.get(&txn, keys::SOURCE) else {
            return Err("missing cell source".into());
        };
        drop(txn);
        let mut txn = alice.doc().transact_mut();
        source.push(&mut txn, "\ny = x + 1");
    }
    let diff = alice.doc().transact().encode_state_as_update_v1(&before);
    bob.apply_update(&diff)?;

    println!("{}", serde_json::to_string_pretty(&bob.content()?)?);

    bob.unobserve();
    Ok(())
}
