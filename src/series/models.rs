//! Time-series model structs shared between the pipeline and its collaborators.
//!
//! These structs are what the chart-facing side sees: the signal list published
//! at run start, the finalized data points, and the categorical code map.

use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::constants::{DEFAULT_GROUP_NAME, SIGNAL_PALETTE};

/// A named regular expression supplied by the user.
///
/// # Fields
/// - `name`: Signal identifier, unique within a pattern set
/// - `regex`: Regex source text; capture group 1 is the extracted value
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Pattern {
    pub name: String,
    pub regex: String,
}

impl Pattern {
    pub fn new(name: impl Into<String>, regex: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            regex: regex.into(),
        }
    }
}

/// A chart signal derived 1:1 from a [`Pattern`] at run start.
///
/// # Fields
/// - `id`: Opaque identifier, unique within a run
/// - `name`: Same as the pattern name; keys into [`DataPoint::values`]
/// - `pattern`: Regex source the signal was built from
/// - `color`: Display color from [`SIGNAL_PALETTE`]
/// - `visible`: Whether the chart currently shows the signal
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Signal {
    pub id: String,
    pub name: String,
    pub pattern: String,
    pub color: String,
    pub visible: bool,
}

impl Signal {
    /// Build the signal list for a run, one per pattern, in pattern order.
    ///
    /// Colors cycle through [`SIGNAL_PALETTE`]. Ids combine the pattern index
    /// with a random suffix so they stay unique within the run.
    pub fn from_patterns(patterns: &[Pattern], rng: &mut dyn rand::RngCore) -> Vec<Signal> {
        patterns
            .iter()
            .enumerate()
            .map(|(index, pattern)| Signal {
                id: format!("signal-{index}-{:08x}", rng.next_u32()),
                name: pattern.name.clone(),
                pattern: pattern.regex.clone(),
                color: SIGNAL_PALETTE[index % SIGNAL_PALETTE.len()].to_string(),
                visible: true,
            })
            .collect()
    }
}

/// A chart panel and the names of the signals drawn in it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SignalGroup {
    pub name: String,
    pub signals: Vec<String>,
}

impl SignalGroup {
    /// The single panel holding every signal, used at the start of each run.
    pub fn default_for(signals: &[Signal]) -> Self {
        Self {
            name: DEFAULT_GROUP_NAME.to_string(),
            signals: signals.iter().map(|s| s.name.clone()).collect(),
        }
    }
}

/// A captured signal value.
///
/// Note: Cannot derive `Eq` because `Number` holds an `f64`.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Number(f64),
    Text(String),
}

impl Value {
    /// Coerce captured text: a finite numeric literal becomes a number,
    /// anything else stays the raw string.
    pub fn coerce(text: &str) -> Value {
        match parse_numeric(text) {
            Some(n) => Value::Number(n),
            None => Value::Text(text.to_string()),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Number(n) => write!(f, "{n}"),
            Value::Text(s) => write!(f, "{s}"),
        }
    }
}

fn parse_numeric(text: &str) -> Option<f64> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }
    // f64::from_str also takes "inf" and "NaN", which are not numeric literals here.
    if !trimmed
        .bytes()
        .all(|b| b.is_ascii_digit() || matches!(b, b'+' | b'-' | b'.' | b'e' | b'E'))
    {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|n| n.is_finite())
}

/// One emitted record: the signal values in effect at a timestamp.
///
/// `values` is never empty and holds only signals matched at least once up to
/// and including the source line (forward-filled entries included).
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DataPoint {
    pub timestamp: NaiveDateTime,
    pub values: BTreeMap<String, Value>,
}

/// Categorical codes: signal name -> distinct string value -> code (1-based).
pub type StringValueMap = BTreeMap<String, BTreeMap<String, u32>>;

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::mock::StepRng;

    #[test]
    fn test_coerce_integer() {
        assert_eq!(Value::coerce("42"), Value::Number(42.0));
    }

    #[test]
    fn test_coerce_trailing_garbage_stays_text() {
        assert_eq!(Value::coerce("42a"), Value::Text("42a".to_string()));
    }

    #[test]
    fn test_coerce_numeric_forms() {
        assert_eq!(Value::coerce("-3.5"), Value::Number(-3.5));
        assert_eq!(Value::coerce("1e3"), Value::Number(1000.0));
        assert_eq!(Value::coerce(" 7 "), Value::Number(7.0));
    }

    #[test]
    fn test_coerce_non_finite_words_stay_text() {
        assert_eq!(Value::coerce("inf"), Value::Text("inf".to_string()));
        assert_eq!(Value::coerce("NaN"), Value::Text("NaN".to_string()));
        assert_eq!(Value::coerce(""), Value::Text(String::new()));
        assert_eq!(Value::coerce("-"), Value::Text("-".to_string()));
    }

    #[test]
    fn test_signals_from_patterns() {
        let patterns = vec![
            Pattern::new("temp", r"temp=(\d+)"),
            Pattern::new("status", r"status=(\w+)"),
        ];
        let mut rng = StepRng::new(0, 1);
        let signals = Signal::from_patterns(&patterns, &mut rng);

        assert_eq!(signals.len(), 2);
        assert_eq!(signals[0].name, "temp");
        assert_eq!(signals[1].pattern, r"status=(\w+)");
        assert_ne!(signals[0].id, signals[1].id);
        assert_eq!(signals[0].color, SIGNAL_PALETTE[0]);
        assert_eq!(signals[1].color, SIGNAL_PALETTE[1]);
        assert!(signals.iter().all(|s| s.visible));
    }

    #[test]
    fn test_palette_wraps() {
        let patterns: Vec<Pattern> = (0..SIGNAL_PALETTE.len() + 1)
            .map(|i| Pattern::new(format!("p{i}"), r"(\d+)"))
            .collect();
        let mut rng = StepRng::new(7, 3);
        let signals = Signal::from_patterns(&patterns, &mut rng);
        assert_eq!(signals[SIGNAL_PALETTE.len()].color, signals[0].color);
    }

    #[test]
    fn test_default_group_holds_all_signals() {
        let patterns = vec![Pattern::new("a", "(a)"), Pattern::new("b", "(b)")];
        let mut rng = StepRng::new(0, 1);
        let signals = Signal::from_patterns(&patterns, &mut rng);
        let group = SignalGroup::default_for(&signals);
        assert_eq!(group.name, DEFAULT_GROUP_NAME);
        assert_eq!(group.signals, vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn test_value_serializes_untagged() {
        assert_eq!(serde_json::to_string(&Value::Number(20.0)).unwrap(), "20.0");
        assert_eq!(serde_json::to_string(&Value::Text("ok".into())).unwrap(), "\"ok\"");
    }
}
