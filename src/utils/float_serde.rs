//! JSON encoding for `f64` values that may be infinite.
//!
//! `serde_json` writes non-finite floats as `null`, which would turn an
//! unbounded health factor into a missing one. These helpers write `"inf"`,
//! `"-inf"` or `"nan"` instead and read back either a number or one of those
//! strings. Use with `#[serde(with = "crate::utils::float_serde")]`.

use serde::{de, Deserialize, Deserializer, Serializer};

pub fn serialize<S>(value: &f64, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    if value.is_finite() {
        serializer.serialize_f64(*value)
    } else if value.is_nan() {
        serializer.serialize_str("nan")
    } else if value.is_sign_positive() {
        serializer.serialize_str("inf")
    } else {
        serializer.serialize_str("-inf")
    }
}

pub fn deserialize<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Number(f64),
        Text(String),
    }

    match Repr::deserialize(deserializer)? {
        Repr::Number(value) => Ok(value),
        Repr::Text(text) => text
            .trim()
            .parse::<f64>()
            .map_err(|_| de::Error::custom(format!("invalid float value: {}", text))),
    }
}
