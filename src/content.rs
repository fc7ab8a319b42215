//! Response bodies resolved into JSON, XML, or plain-text variants by content type.

// self
use crate::{_prelude::*, error::DecodeError, http::ApiResponse};

/// Decoded response payload.
#[derive(Clone, Debug, PartialEq)]
pub enum ResponseContent {
	/// JSON document.
	Json(serde_json::Value),
	/// XML document, kept as text for typed deserialization.
	Xml(String),
	/// Any other textual payload.
	Text(String),
	/// Empty body.
	Empty,
}
impl ResponseContent {
	/// Resolves the body of `response` using its `Content-Type` header.
	///
	/// Media types without a recognised family fall back to JSON sniffing before settling on
	/// plain text, and JSON-typed bodies that fail to parse degrade to text.
	pub fn from_response(response: &ApiResponse) -> Self {
		Self::resolve(response.content_type.as_deref(), &response.body)
	}

	/// Same as [`ResponseContent::from_response`] over raw parts.
	pub fn resolve(content_type: Option<&str>, body: &[u8]) -> Self {
		if body.iter().all(u8::is_ascii_whitespace) {
			return Self::Empty;
		}

		let text = String::from_utf8_lossy(body).into_owned();

		match ContentFamily::of(content_type) {
			ContentFamily::Json | ContentFamily::Other =>
				match serde_json::from_slice::<serde_json::Value>(body) {
					Ok(value) => Self::Json(value),
					Err(_) => Self::Text(text),
				},
			ContentFamily::Xml => Self::Xml(text),
			ContentFamily::Text => Self::Text(text),
		}
	}

	/// Short label naming the variant.
	pub const fn kind(&self) -> &'static str {
		match self {
			Self::Json(_) => "JSON",
			Self::Xml(_) => "XML",
			Self::Text(_) => "text",
			Self::Empty => "empty",
		}
	}

	/// Deserializes a JSON variant into `T`, reporting the failing path on mismatch.
	pub fn into_json<T>(self) -> Result<T, DecodeError>
	where
		T: serde::de::DeserializeOwned,
	{
		match self {
			Self::Json(value) => serde_path_to_error::deserialize(value)
				.map_err(|source| DecodeError::Json { source }),
			other => Err(DecodeError::UnexpectedContent { expected: "JSON", found: other.kind() }),
		}
	}

	/// Returns the raw XML document.
	pub fn into_xml(self) -> Result<String, DecodeError> {
		match self {
			Self::Xml(xml) => Ok(xml),
			other => Err(DecodeError::UnexpectedContent { expected: "XML", found: other.kind() }),
		}
	}
}

/// Parses `bytes` as JSON into `T` with path-aware errors.
pub(crate) fn decode_json<T>(bytes: &[u8]) -> Result<T, DecodeError>
where
	T: serde::de::DeserializeOwned,
{
	let mut de = serde_json::Deserializer::from_slice(bytes);

	serde_path_to_error::deserialize(&mut de).map_err(|source| DecodeError::Json { source })
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ContentFamily {
	Json,
	Xml,
	Text,
	Other,
}
impl ContentFamily {
	fn of(content_type: Option<&str>) -> Self {
		let Some(raw) = content_type else {
			return Self::Other;
		};
		let essence = raw.split(';').next().unwrap_or_default().trim().to_ascii_lowercase();

		if essence == "application/json" || essence.ends_with("+json") {
			Self::Json
		} else if essence == "application/xml" || essence == "text/xml" || essence.ends_with("+xml")
		{
			Self::Xml
		} else if essence.starts_with("text/") {
			Self::Text
		} else {
			Self::Other
		}
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn content_type_selects_variant() {
		assert_eq!(
			ResponseContent::resolve(Some("application/json; charset=utf-8"), b"{\"ok\":true}"),
			ResponseContent::Json(serde_json::json!({ "ok": true })),
		);
		assert_eq!(
			ResponseContent::resolve(Some("application/problem+json"), b"[1]"),
			ResponseContent::Json(serde_json::json!([1])),
		);
		assert_eq!(
			ResponseContent::resolve(Some("text/xml"), b"<books/>"),
			ResponseContent::Xml("<books/>".into()),
		);
		assert_eq!(
			ResponseContent::resolve(Some("application/atom+xml"), b"<feed/>"),
			ResponseContent::Xml("<feed/>".into()),
		);
		assert_eq!(
			ResponseContent::resolve(Some("text/plain"), b"{\"looks\":\"like json\"}"),
			ResponseContent::Text("{\"looks\":\"like json\"}".into()),
		);
	}

	#[test]
	fn unknown_types_sniff_json_then_fall_back_to_text() {
		assert_eq!(
			ResponseContent::resolve(None, b"{\"msg\":\"hi\"}"),
			ResponseContent::Json(serde_json::json!({ "msg": "hi" })),
		);
		assert_eq!(
			ResponseContent::resolve(Some("application/octet-stream"), b"created"),
			ResponseContent::Text("created".into()),
		);
		assert_eq!(
			ResponseContent::resolve(Some("application/json"), b"not json"),
			ResponseContent::Text("not json".into()),
		);
		assert_eq!(
			ResponseContent::resolve(Some("application/json"), b"  \n"),
			ResponseContent::Empty
		);
	}

	#[test]
	fn into_json_reports_mismatched_variants() {
		#[derive(Debug, Deserialize)]
		struct Payload {
			#[allow(dead_code)]
			count: u32,
		}

		let err = ResponseContent::Text("nope".into())
			.into_json::<Payload>()
			.expect_err("Text content should not decode as JSON.");

		assert!(matches!(err, DecodeError::UnexpectedContent { expected: "JSON", found: "text" }));

		let err = ResponseContent::Json(serde_json::json!({ "count": "many" }))
			.into_json::<Payload>()
			.expect_err("A string count should not decode into u32.");

		match err {
			DecodeError::Json { source } => assert_eq!(source.path().to_string(), "count"),
			other => panic!("Unexpected decode error: {other:?}."),
		}
	}
}
