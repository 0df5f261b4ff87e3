//! Pattern registry loading and per-run regex compilation.
//!
//! Patterns come from a JSON file or from `name=regex` command line arguments.
//! The JSON format is:
//!
//! ```json
//! {
//!   "patterns": [
//!     { "name": "temp", "regex": "temp=(\\d+)" },
//!     { "name": "status", "regex": "status=(\\w+)" }
//!   ]
//! }
//! ```
//!
//! Names must be non-empty and unique; they become signal names. The regex
//! itself is not validated here. A bad regex only disables its own signal when
//! the run compiles it, see [`CompiledPattern`].

use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use regex::Regex;
use serde::Deserialize;

use crate::series::Pattern;

#[derive(Deserialize, Debug)]
#[serde(deny_unknown_fields)]
struct PatternFile {
    patterns: Vec<Pattern>,
}

/// Ordered, name-unique list of patterns.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PatternSet {
    patterns: Vec<Pattern>,
}

impl PatternSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a pattern, rejecting empty or duplicate names.
    pub fn push(&mut self, pattern: Pattern) -> Result<()> {
        if pattern.name.trim().is_empty() {
            bail!("Pattern name must not be empty (regex: {})", pattern.regex);
        }
        if self.patterns.iter().any(|p| p.name == pattern.name) {
            bail!("Pattern {} already exists", pattern.name);
        }
        self.patterns.push(pattern);
        Ok(())
    }

    /// Parse the JSON pattern file format.
    pub fn from_json(buf: &str) -> Result<Self> {
        let file: PatternFile = serde_json::from_str(buf)?;
        let mut set = Self::new();
        for pattern in file.patterns {
            set.push(pattern)?;
        }
        Ok(set)
    }

    /// Load a JSON pattern file from disk.
    pub fn load(path: &Path) -> Result<Self> {
        let buf = fs::read_to_string(path)
            .with_context(|| format!("Failed to read pattern file {}", path.display()))?;
        Self::from_json(&buf).with_context(|| format!("Invalid pattern file {}", path.display()))
    }

    /// Add a pattern given as `name=regex`. Only the first `=` splits, so the
    /// regex may contain `=` itself.
    pub fn add_from_str(&mut self, arg: &str) -> Result<()> {
        let Some((name, regex)) = arg.split_once('=') else {
            bail!("Invalid pattern format: {arg} (expected name=regex)");
        };
        self.push(Pattern::new(name, regex))
    }

    pub fn patterns(&self) -> &[Pattern] {
        &self.patterns
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}

/// Why a pattern can never produce a value in this run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatternError {
    /// The regex source failed to compile (syntax, unsupported feature, size).
    InvalidRegex { name: String, message: String },
    /// The regex compiled but has no capture group to extract from.
    NoCaptureGroup { name: String },
}

impl fmt::Display for PatternError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PatternError::InvalidRegex { name, message } => {
                write!(f, "{name}: invalid regex: {message}")
            }
            PatternError::NoCaptureGroup { name } => {
                write!(f, "{name}: regex has no capture group")
            }
        }
    }
}

impl std::error::Error for PatternError {}

/// A pattern compiled once for the duration of a run.
///
/// Compilation failures are kept, not raised: the pattern then reports a
/// failure for every line, which the extractor treats as "no match".
#[derive(Debug)]
pub struct CompiledPattern {
    name: String,
    regex: Result<Regex, PatternError>,
}

impl CompiledPattern {
    pub fn compile(pattern: &Pattern) -> Self {
        let regex = match Regex::new(&pattern.regex) {
            Ok(re) if re.captures_len() < 2 => Err(PatternError::NoCaptureGroup {
                name: pattern.name.clone(),
            }),
            Ok(re) => Ok(re),
            Err(err) => Err(PatternError::InvalidRegex {
                name: pattern.name.clone(),
                message: err.to_string(),
            }),
        };
        Self {
            name: pattern.name.clone(),
            regex,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The compile failure, if this pattern is unusable.
    pub fn error(&self) -> Option<&PatternError> {
        self.regex.as_ref().err()
    }

    /// Text of capture group 1 on `line`, `Ok(None)` if the line does not match
    /// or the group did not participate.
    pub fn capture<'l>(&self, line: &'l str) -> Result<Option<&'l str>, &PatternError> {
        let re = self.regex.as_ref()?;
        Ok(re
            .captures(line)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str()))
    }
}

/// Names must be unique across the set; verified again here for sets that were
/// built without [`PatternSet::push`].
pub fn compile_all(patterns: &[Pattern]) -> Result<Vec<CompiledPattern>> {
    let mut seen = HashSet::new();
    for pattern in patterns {
        if !seen.insert(pattern.name.as_str()) {
            bail!("Pattern {} already exists", pattern.name);
        }
    }
    Ok(patterns.iter().map(CompiledPattern::compile).collect())
}
