/*
 *  journal.rs
 *
 *  yrpaper - forecast to e-paper
 *	(c) 2020-26 Stuart Hunter
 *
 *	Append-only record of caught failures
 *
 *	This program is free software: you can redistribute it and/or modify
 *	it under the terms of the GNU General Public License as published by
 *	the Free Software Foundation, either version 3 of the License, or
 *	(at your option) any later version.
 *
 *	This program is distributed in the hope that it will be useful,
 *	but WITHOUT ANY WARRANTY; without even the implied warranty of
 *	MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 *	GNU General Public License for more details.
 *
 *	See <http://www.gnu.org/licenses/> to get a copy of the GNU General
 *	Public License.
 *
 */
use chrono::{DateTime, SecondsFormat, Utc};
use log::warn;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// One failure as written to the journal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JournalEntry {
    pub at: DateTime<Utc>,
    pub kind: &'static str,
    pub message: String,
}

impl JournalEntry {
    /// `<rfc3339> <kind> <message>` on one line.
    pub fn line(&self) -> String {
        let message = self.message.replace(['\n', '\r'], " ");
        format!("{} {} {}", self.at.to_rfc3339_opts(SecondsFormat::Secs, true), self.kind, message)
    }
}

#[derive(Debug, Clone)]
enum Target {
    Off,
    File(PathBuf),
    Memory(Arc<Mutex<Vec<JournalEntry>>>),
}

/// Where the cycle driver records every failure it catches.
///
/// Writing the journal never fails the caller, problems go to the log.
#[derive(Debug, Clone)]
pub struct ErrorJournal {
    target: Target,
}

impl ErrorJournal {
    pub fn disabled() -> Self {
        Self { target: Target::Off }
    }

    pub fn to_file(path: impl Into<PathBuf>) -> Self {
        Self { target: Target::File(path.into()) }
    }

    /// Journal kept in memory, `entries()` reads it back.
    pub fn in_memory() -> Self {
        Self { target: Target::Memory(Arc::new(Mutex::new(Vec::new()))) }
    }

    pub fn path(&self) -> Option<&Path> {
        match &self.target {
            Target::File(path) => Some(path),
            _ => None,
        }
    }

    pub fn record(&self, kind: &'static str, message: &str) {
        self.record_at(Utc::now(), kind, message);
    }

    pub fn record_at(&self, at: DateTime<Utc>, kind: &'static str, message: &str) {
        let entry = JournalEntry { at, kind, message: message.to_string() };
        match &self.target {
            Target::Off => {}
            Target::File(path) => {
                let written = OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(path)
                    .and_then(|mut f| writeln!(f, "{}", entry.line()));
                if let Err(e) = written {
                    warn!("Could not append to error log {}: {}", path.display(), e);
                }
            }
            Target::Memory(entries) => {
                if let Ok(mut entries) = entries.lock() {
                    entries.push(entry);
                }
            }
        }
    }

    /// Entries of an in-memory journal, empty for the other kinds.
    pub fn entries(&self) -> Vec<JournalEntry> {
        match &self.target {
            Target::Memory(entries) => entries.lock().map(|e| e.clone()).unwrap_or_default(),
            _ => Vec::new(),
        }
    }
}
