//! Serde helpers for loosely typed upstream payloads.
//!
//! The same field arrives as a JSON number from one endpoint and as XML text from another,
//! so scalar fields are normalized to their string rendering.

// self
use crate::_prelude::*;

#[derive(Deserialize)]
#[serde(untagged)]
enum Scalar {
	Text(String),
	Integer(i64),
	Float(f64),
	Flag(bool),
}
impl From<Scalar> for String {
	fn from(value: Scalar) -> Self {
		match value {
			Scalar::Text(text) => text,
			Scalar::Integer(int) => int.to_string(),
			Scalar::Float(float) => float.to_string(),
			Scalar::Flag(flag) => flag.to_string(),
		}
	}
}

/// Deserializes an optional scalar (string, number, or bool) into its string rendering.
///
/// Empty and whitespace-only strings collapse to `None`.
pub fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
	D: serde::Deserializer<'de>,
{
	let value = Option::<Scalar>::deserialize(deserializer)?;

	Ok(value.map(String::from).filter(|text| !text.trim().is_empty()))
}
