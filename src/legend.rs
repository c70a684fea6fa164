/*
 *  legend.rs
 *
 *  yrpaper - forecast to e-paper
 *	(c) 2020-26 Stuart Hunter
 *
 *	Symbol code legend, loaded once at start up
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
use log::info;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

use crate::fetch::{retry, AttemptError, FetchError, RetryPolicy, Transport};
use crate::normalize::{normalize_symbol, NormalizeError};

#[derive(Debug, Error)]
pub enum LegendError {
    #[error("legend document is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("legend has no {0} descriptions")]
    Empty(Language),
    #[error("legend file: {0}")]
    Io(#[from] std::io::Error),
}

/// Description language offered by the legend source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    En,
    Nb,
    Nn,
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Language::En => write!(f, "en"),
            Language::Nb => write!(f, "nb"),
            Language::Nn => write!(f, "nn"),
        }
    }
}

impl FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "en" | "english" => Ok(Language::En),
            "nb" | "bokmal" | "bokmål" => Ok(Language::Nb),
            "nn" | "nynorsk" => Ok(Language::Nn),
            other => Err(format!("unsupported legend language '{}'", other)),
        }
    }
}

#[derive(Debug, Deserialize)]
struct LegendEntry {
    desc_en: Option<String>,
    desc_nb: Option<String>,
    desc_nn: Option<String>,
}

impl LegendEntry {
    fn description(self, language: Language) -> Option<String> {
        match language {
            Language::En => self.desc_en,
            Language::Nb => self.desc_nb,
            Language::Nn => self.desc_nn,
        }
    }
}

/// Read-only map from base symbol code to its description.
#[derive(Debug, Clone, Default)]
pub struct LegendTable {
    entries: HashMap<String, String>,
}

impl LegendTable {
    pub fn from_entries<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            entries: entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Parse the weathericon legends document.
    pub fn from_json(body: &str, language: Language) -> Result<Self, LegendError> {
        let raw: HashMap<String, LegendEntry> = serde_json::from_str(body)?;
        let entries: HashMap<String, String> = raw
            .into_iter()
            .filter_map(|(code, entry)| {
                entry
                    .description(language)
                    .map(|desc| (normalize_symbol(&code).to_string(), desc))
            })
            .collect();

        if entries.is_empty() {
            return Err(LegendError::Empty(language));
        }
        Ok(Self { entries })
    }

    pub fn from_file(path: &Path, language: Language) -> Result<Self, LegendError> {
        let body = std::fs::read_to_string(path)?;
        let table = Self::from_json(&body, language)?;
        info!("Legend loaded from {} ({} symbols)", path.display(), table.len());
        Ok(table)
    }

    /// Fetch the legend from `url`, retrying under `policy` like the forecast.
    pub fn load<T: Transport>(
        transport: &T,
        url: &str,
        language: Language,
        policy: &RetryPolicy,
    ) -> Result<Self, FetchError> {
        let table = retry(policy, "legend", |_| {
            let response = transport.get(url)?;
            if response.status != 200 {
                return Err(AttemptError::Status(response.status));
            }
            Self::from_json(&response.body, language)
                .map_err(|e| AttemptError::Invalid(e.to_string()))
        })?;
        info!("Legend loaded from {} ({} symbols)", url, table.len());
        Ok(table)
    }

    /// Description for a symbol code, with or without its variant suffix.
    pub fn describe(&self, symbol_code: &str) -> Result<&str, NormalizeError> {
        let base = normalize_symbol(symbol_code);
        self.entries
            .get(base)
            .map(String::as_str)
            .ok_or_else(|| NormalizeError::UnknownSymbol(base.to_string()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
