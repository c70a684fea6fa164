/*
 *  cycle.rs
 *
 *  yrpaper - forecast to e-paper
 *	(c) 2020-26 Stuart Hunter
 *
 *	Fetch, normalize, render and present, once per period
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
use log::{debug, error, info, warn};
use std::fmt;
use std::thread;
use std::time::Duration;
use thiserror::Error;

use crate::assets::AssetStore;
use crate::display::{DisplayError, DisplaySink};
use crate::fetch::{FetchError, Fetcher, Location, Transport};
use crate::journal::ErrorJournal;
use crate::legend::LegendTable;
use crate::normalize::{normalize, NormalizeError};
use crate::render::{RenderError, Renderer, PANEL_ROTATION};

pub const DEFAULT_CYCLE_DELAY: Duration = Duration::from_secs(600);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleState {
    Idle,
    Fetching,
    Normalizing,
    Rendering,
    Presenting,
}

/// Classification written to the error journal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    FetchFailed,
    MissingPeriod,
    MalformedField,
    UnknownSymbol,
    AssetNotFound,
    RenderFailed,
    DisplayFailed,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::FetchFailed => "FetchFailed",
            ErrorKind::MissingPeriod => "MissingPeriod",
            ErrorKind::MalformedField => "MalformedField",
            ErrorKind::UnknownSymbol => "UnknownSymbol",
            ErrorKind::AssetNotFound => "AssetNotFound",
            ErrorKind::RenderFailed => "RenderFailed",
            ErrorKind::DisplayFailed => "DisplayFailed",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failure of one cycle, tagged with the stage it came from.
#[derive(Debug, Error)]
pub enum CycleError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error(transparent)]
    Normalize(#[from] NormalizeError),
    #[error(transparent)]
    Render(#[from] RenderError),
    #[error(transparent)]
    Display(#[from] DisplayError),
}

impl CycleError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CycleError::Fetch(_) => ErrorKind::FetchFailed,
            CycleError::Normalize(NormalizeError::MissingPeriod { .. }) => ErrorKind::MissingPeriod,
            CycleError::Normalize(NormalizeError::MalformedField { .. }) => ErrorKind::MalformedField,
            CycleError::Normalize(NormalizeError::UnknownSymbol(_)) => ErrorKind::UnknownSymbol,
            CycleError::Render(RenderError::AssetNotFound(_)) => ErrorKind::AssetNotFound,
            CycleError::Render(_) => ErrorKind::RenderFailed,
            CycleError::Display(_) => ErrorKind::DisplayFailed,
        }
    }

    /// Only exhausted fetch retries end the process.
    pub fn is_fatal(&self) -> bool {
        matches!(self, CycleError::Fetch(_))
    }
}

/// Drives the pipeline. Nothing but the legend outlives a cycle.
pub struct CycleDriver<T: Transport, A: AssetStore, S: DisplaySink> {
    fetcher: Fetcher<T>,
    location: Location,
    legend: LegendTable,
    renderer: Renderer,
    assets: A,
    sink: S,
    journal: ErrorJournal,
    delay: Duration,
    state: CycleState,
    completed: u64,
    failed: u64,
}

impl<T: Transport, A: AssetStore, S: DisplaySink> CycleDriver<T, A, S> {
    pub fn new(
        fetcher: Fetcher<T>,
        location: Location,
        legend: LegendTable,
        renderer: Renderer,
        assets: A,
        sink: S,
    ) -> Self {
        Self {
            fetcher,
            location,
            legend,
            renderer,
            assets,
            sink,
            journal: ErrorJournal::disabled(),
            delay: DEFAULT_CYCLE_DELAY,
            state: CycleState::Idle,
            completed: 0,
            failed: 0,
        }
    }

    pub fn with_journal(mut self, journal: ErrorJournal) -> Self {
        self.journal = journal;
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn state(&self) -> CycleState {
        self.state
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn journal(&self) -> &ErrorJournal {
        &self.journal
    }

    /// (completed, failed) cycle counts
    pub fn counts(&self) -> (u64, u64) {
        (self.completed, self.failed)
    }

    fn enter(&mut self, state: CycleState) {
        debug!("cycle {:?} -> {:?}", self.state, state);
        self.state = state;
    }

    fn fail(&mut self, err: CycleError) -> CycleError {
        let kind = err.kind();
        if err.is_fatal() {
            error!("{} during {:?}: {}", kind, self.state, err);
        } else {
            warn!("{} during {:?}, panel not refreshed: {}", kind, self.state, err);
        }
        self.journal.record(kind.as_str(), &err.to_string());
        self.failed += 1;
        self.enter(CycleState::Idle);
        err
    }

    /// One pass through every stage. A stage failure ends the pass, the
    /// error says whether it is fatal.
    pub fn run_once(&mut self) -> Result<(), CycleError> {
        self.enter(CycleState::Fetching);
        let snapshot = match self.fetcher.fetch(&self.location) {
            Ok(snapshot) => snapshot,
            Err(e) => return Err(self.fail(e.into())),
        };

        self.enter(CycleState::Normalizing);
        let fields = match normalize(&snapshot, &self.legend) {
            Ok(fields) => fields,
            Err(e) => return Err(self.fail(e.into())),
        };

        self.enter(CycleState::Rendering);
        let raster = match self.renderer.render(&fields, &self.assets) {
            Ok(raster) => raster,
            Err(e) => return Err(self.fail(e.into())),
        };

        self.enter(CycleState::Presenting);
        if let Err(e) = self.sink.present(&raster, PANEL_ROTATION) {
            return Err(self.fail(e.into()));
        }

        self.completed += 1;
        self.enter(CycleState::Idle);
        info!(
            "Panel refreshed: {}°, {}, {}% chance of rain",
            fields.temperature, fields.description, fields.precipitation_chance
        );
        Ok(())
    }

    /// Loop until a fatal error, or until `limit` cycles have run.
    pub fn run_for(&mut self, limit: Option<u64>) -> Result<(), CycleError> {
        let mut cycles: u64 = 0;
        loop {
            match self.run_once() {
                Ok(()) => {}
                Err(e) if e.is_fatal() => return Err(e),
                Err(_) => {}
            }
            cycles += 1;
            if limit.is_some_and(|n| cycles >= n) {
                return Ok(());
            }
            debug!("Next cycle in {} seconds", self.delay.as_secs());
            thread::sleep(self.delay);
        }
    }

    /// Loop forever; returns only with a fatal error.
    pub fn run(&mut self) -> Result<(), CycleError> {
        self.run_for(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_classification() {
        let fetch: CycleError = FetchError::Failed {
            what: "forecast",
            attempts: 100,
            last: crate::fetch::AttemptError::Status(500),
        }
        .into();
        assert_eq!(fetch.kind(), ErrorKind::FetchFailed);
        assert!(fetch.is_fatal());

        let missing: CycleError = NormalizeError::MissingPeriod { required: 12, available: 3 }.into();
        assert_eq!(missing.kind(), ErrorKind::MissingPeriod);
        assert!(!missing.is_fatal());

        let unknown: CycleError = NormalizeError::UnknownSymbol("x".to_string()).into();
        assert_eq!(unknown.kind().to_string(), "UnknownSymbol");

        let asset: CycleError = RenderError::AssetNotFound("digit_7".to_string()).into();
        assert_eq!(asset.kind(), ErrorKind::AssetNotFound);
        assert!(!asset.is_fatal());

        let display: CycleError = DisplayError::Other("gone".to_string()).into();
        assert_eq!(display.kind(), ErrorKind::DisplayFailed);
        assert!(!display.is_fatal());
    }
}
