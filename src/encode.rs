//! Categorical codes for string-valued signals.

use std::collections::{BTreeMap, BTreeSet};

use crate::series::{StringValueMap, Value};

/// Assign codes `1..N` to each signal's distinct strings in ascending order.
///
/// Signals without any string values are left out. The result depends only on
/// the set of observed strings, never on the order they were seen in.
pub fn encode_categories(string_values: &BTreeMap<String, BTreeSet<String>>) -> StringValueMap {
    string_values
        .iter()
        .filter(|(_, values)| !values.is_empty())
        .map(|(signal, values)| {
            let codes = values
                .iter()
                .zip(1u32..)
                .map(|(value, code)| (value.clone(), code))
                .collect();
            (signal.clone(), codes)
        })
        .collect()
}

/// Numeric form of a value for charting: numbers as-is, strings through their
/// categorical code.
pub fn numeric_value(map: &StringValueMap, signal: &str, value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => Some(*n),
        Value::Text(text) => map
            .get(signal)
            .and_then(|codes| codes.get(text))
            .map(|code| f64::from(*code)),
    }
}
