//! Recover diagnostics from free-text toolchain output
//!
//! Grammar of a recognised line:
//!
//! ```text
//! <anything> ':' <level> <PREFIX><4 digits> [':'] <message>
//! ```
//!
//! `PREFIX` is one of the configured code namespaces. The level is the
//! trimmed text between the nearest colon before the code and the code
//! itself. Lines where the code has no colon before it, or where the level
//! comes out blank, are not diagnostics and are skipped. Only the first code
//! on a line is considered.

use crate::report::{Level, ResultEntry};
use regex::Regex;
use sandbuild_errors::{ConfigError, Error};
use std::collections::HashSet;

/// Extracts diagnostics whose codes start with one of a fixed set of prefixes
#[derive(Debug, Clone)]
pub struct OutputParser {
    pattern: Option<Regex>,
}

impl OutputParser {
    /// Build a parser for the given code prefixes, e.g. `["NU", "NETSDK"]`.
    /// An empty prefix list yields a parser that never matches.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if a prefix is blank or the
    /// resulting pattern fails to compile.
    pub fn new<S: AsRef<str>>(prefixes: &[S]) -> Result<Self, Error> {
        if prefixes.is_empty() {
            return Ok(Self { pattern: None });
        }

        let mut alternatives = Vec::with_capacity(prefixes.len());
        for prefix in prefixes {
            let prefix = prefix.as_ref().trim();
            if prefix.is_empty() {
                return Err(ConfigError::InvalidValue {
                    field: "toolchain.diagnostic_prefixes".to_string(),
                    value: String::new(),
                }
                .into());
            }
            alternatives.push(regex::escape(prefix));
        }

        let source = format!(r"\b(?:{})\d{{4}}\b", alternatives.join("|"));
        let pattern = Regex::new(&source).map_err(|e| ConfigError::InvalidValue {
            field: "toolchain.diagnostic_prefixes".to_string(),
            value: e.to_string(),
        })?;
        Ok(Self {
            pattern: Some(pattern),
        })
    }

    /// Parse a single line
    #[must_use]
    pub fn parse_line(&self, line: &str) -> Option<ResultEntry> {
        let found = self.pattern.as_ref()?.find(line)?;
        let head = &line[..found.start()];
        let colon = head.rfind(':')?;
        let level = head[colon + 1..].trim();
        if level.is_empty() {
            return None;
        }

        let message = line[found.end()..]
            .trim_start()
            .trim_start_matches(':')
            .trim();
        Some(ResultEntry::new(found.as_str(), Level::from(level), message))
    }

    /// Parse captured output chunks.
    ///
    /// Each chunk is split on `\r\n`, `\r` and `\n` first. Results are
    /// deduplicated by rule id and level, keeping the first message seen.
    #[must_use]
    pub fn parse<I, S>(&self, chunks: I) -> Vec<ResultEntry>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut seen: HashSet<(String, Level)> = HashSet::new();
        let mut out = Vec::new();
        for chunk in chunks {
            for line in chunk.as_ref().split(['\r', '\n']) {
                if line.is_empty() {
                    continue;
                }
                if let Some(entry) = self.parse_line(line) {
                    if seen.insert((entry.rule_id.clone(), entry.level.clone())) {
                        out.push(entry);
                    }
                }
            }
        }
        out
    }
}
