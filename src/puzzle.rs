//! Puzzle payload model and shape validation
//!
//! The payload is kept as an opaque JSON value; only `sides`, `ourSolution`
//! and `dictionary` are checked before it is cached and served.

use clap::ValueEnum;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

/// Number of sides on the puzzle box
pub const SIDE_COUNT: usize = 4;

/// Errors raised when a parsed payload has the wrong shape
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// `sides` is missing, not an array, or not exactly four entries
    #[error("Invalid sides data")]
    InvalidSides,

    /// `ourSolution` is missing or not an array
    #[error("Invalid solution data")]
    InvalidSolution,

    /// `dictionary` is missing or not an array
    #[error("Invalid dictionary data")]
    InvalidDictionary,
}

/// Which fields must be present for a payload to be accepted
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum ValidationProfile {
    /// `sides`, `ourSolution` and `dictionary` are all required
    #[default]
    Strict,
    /// `dictionary` may be absent
    Minimal,
}

/// A validated daily puzzle payload.
///
/// Serializes exactly as the upstream JSON object; only constructed through
/// [`validate`], so the required fields are always present. There is no
/// `Deserialize` impl, so raw JSON cannot skip validation:
///
/// ```compile_fail
/// let payload: letterbox_relay::puzzle::GamePayload =
///     serde_json::from_str(r#"{"sides":"nope"}"#).unwrap();
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct GamePayload(Value);

impl GamePayload {
    /// The four sides of the box, one letter group per side
    pub fn sides(&self) -> &[Value] {
        self.array("sides").unwrap_or_default()
    }

    /// Words of the published solution
    pub fn our_solution(&self) -> &[Value] {
        self.array("ourSolution").unwrap_or_default()
    }

    /// Accepted words, if the payload carries a dictionary
    pub fn dictionary(&self) -> Option<&[Value]> {
        self.array("dictionary")
    }

    /// The full payload
    pub fn as_value(&self) -> &Value {
        &self.0
    }

    /// Consumes the payload, returning the underlying JSON value
    pub fn into_value(self) -> Value {
        self.0
    }

    fn array(&self, key: &str) -> Option<&[Value]> {
        self.0.get(key).and_then(Value::as_array).map(Vec::as_slice)
    }
}

/// Checks the required fields of a parsed payload, in order.
///
/// # Returns
/// * `Ok(GamePayload)` wrapping the unchanged value
/// * `Err(ValidationError)` for the first rule that fails
pub fn validate(
    value: Value,
    profile: ValidationProfile,
) -> Result<GamePayload, ValidationError> {
    match value.get("sides").and_then(Value::as_array) {
        Some(sides) if sides.len() == SIDE_COUNT => {}
        _ => return Err(ValidationError::InvalidSides),
    }

    if !value.get("ourSolution").is_some_and(Value::is_array) {
        return Err(ValidationError::InvalidSolution);
    }

    let dictionary_ok = value.get("dictionary").is_some_and(Value::is_array);
    if profile == ValidationProfile::Strict && !dictionary_ok {
        return Err(ValidationError::InvalidDictionary);
    }

    Ok(GamePayload(value))
}

#[cfg(test)]
pub(crate) fn sample_payload(label: &str) -> GamePayload {
    let value = serde_json::json!({
        "sides": ["OAY", "NTL", "CEH", "IRP"],
        "ourSolution": [label],
        "dictionary": [label, "PLAY"],
    });
    validate(value, ValidationProfile::Strict).expect("sample payload is valid")
}
