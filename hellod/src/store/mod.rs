/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

//! Process wide handle to the local key-value store.
//!
//! The store is opened once at startup and flushed at shutdown; it is never
//! reopened mid-process.

use std::path::Path;

use anyhow::anyhow;
use once_cell::sync::OnceCell;

static GLOBAL_DB: OnceCell<sled::Db> = OnceCell::new();

pub fn open(path: &Path) -> anyhow::Result<()> {
    let db = sled::open(path)
        .map_err(|e| anyhow!("failed to open db at {}: {e}", path.display()))?;
    GLOBAL_DB
        .set(db)
        .map_err(|_| anyhow!("db handle has already been set"))?;
    Ok(())
}

pub fn get() -> anyhow::Result<&'static sled::Db> {
    GLOBAL_DB.get().ok_or_else(|| anyhow!("db is not open"))
}

pub fn flush() -> anyhow::Result<()> {
    if let Some(db) = GLOBAL_DB.get() {
        db.flush().map_err(|e| anyhow!("failed to flush db: {e}"))?;
    }
    Ok(())
}
