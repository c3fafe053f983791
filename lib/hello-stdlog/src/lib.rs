/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

//! Stderr logger for the hello service binaries.
//!
//! Sets a plain stderr drain as the global slog logger and bridges the `log`
//! facade through it, so both `log::info!` style process logs and scoped slog
//! task loggers end up on stderr.

use std::fmt::Write as _;

use chrono::Local;
use slog::{Drain, KV, Logger, OwnedKVList, Record};
use slog_scope::GlobalLoggerGuard;

pub fn setup(verbose_level: u8) -> Result<GlobalLoggerGuard, log::SetLoggerError> {
    let logger = Logger::root(StderrDrain.fuse(), slog::o!());
    let scope_guard = slog_scope::set_global_logger(logger);

    let log_level = match verbose_level {
        0 => log::Level::Info,
        1 => log::Level::Debug,
        _ => log::Level::Trace,
    };
    slog_stdlog::init_with_level(log_level)?;
    Ok(scope_guard)
}

struct StderrDrain;

impl Drain for StderrDrain {
    type Ok = ();
    type Err = slog::Never;

    fn log(&self, record: &Record, values: &OwnedKVList) -> Result<(), slog::Never> {
        let mut kv = KvFormatter::default();
        let _ = record.kv().serialize(record, &mut kv);
        let _ = values.serialize(record, &mut kv);

        let datetime = Local::now().format("%Y-%m-%dT%H:%M:%S%.6f");
        let mut line = format!("{datetime} {}", record.level());
        for (k, v) in &kv.pairs {
            let _ = write!(line, " {k}={v},");
        }
        eprintln!("{line} {}", record.msg());
        Ok(())
    }
}

#[derive(Default)]
struct KvFormatter {
    pairs: Vec<(String, String)>,
}

impl slog::Serializer for KvFormatter {
    fn emit_arguments(&mut self, key: slog::Key, val: &std::fmt::Arguments) -> slog::Result {
        self.pairs.push((format!("{key}"), format!("{val}")));
        Ok(())
    }
}
