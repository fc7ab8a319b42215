//! Unverified JWT payload inspection.
//!
//! The client never trusts these claims for authorization decisions; they only drive the
//! proactive refresh schedule and diagnostic events. Signature verification stays with the
//! server that minted the token.

// crates.io
use base64::{
	Engine,
	alphabet,
	engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig},
};
// self
use crate::{_prelude::*, de};

const JWT_PAYLOAD_ENGINE: GeneralPurpose = GeneralPurpose::new(
	&alphabet::URL_SAFE,
	GeneralPurposeConfig::new()
		.with_encode_padding(false)
		.with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Errors produced by [`TokenClaims::decode`].
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum ClaimsError {
	/// Token is not made of three dot-separated segments.
	#[error("Token is not a three-segment JWT.")]
	Malformed,
	/// Payload segment is not valid base64url.
	#[error("Token payload is not valid base64url.")]
	Encoding,
	/// Payload is not a JSON object with the expected claim types.
	#[error("Token payload is not a JSON claim set: {message}.")]
	Payload {
		/// Rendered parse failure.
		message: String,
	},
}

/// Registered and custom claims read from an access or refresh token.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct TokenClaims {
	/// Token identifier.
	#[serde(default)]
	pub jti: Option<String>,
	/// Subject (user id); numeric subjects are kept as their decimal rendering.
	#[serde(default, deserialize_with = "de::lenient_string")]
	pub sub: Option<String>,
	/// Issued-at, seconds since the Unix epoch.
	#[serde(default)]
	pub iat: Option<i64>,
	/// Expiry, seconds since the Unix epoch.
	#[serde(default)]
	pub exp: Option<i64>,
	/// Token kind (`access` or `refresh`).
	#[serde(default, rename = "type")]
	pub token_type: Option<String>,
}
impl TokenClaims {
	/// Decodes the payload segment of `token` without verifying its signature.
	pub fn decode(token: &str) -> Result<Self, ClaimsError> {
		let mut segments = token.split('.');
		let (Some(_), Some(payload), Some(_), None) =
			(segments.next(), segments.next(), segments.next(), segments.next())
		else {
			return Err(ClaimsError::Malformed);
		};
		let bytes = JWT_PAYLOAD_ENGINE.decode(payload).map_err(|_| ClaimsError::Encoding)?;

		serde_json::from_slice(&bytes).map_err(|e| ClaimsError::Payload { message: e.to_string() })
	}

	/// Issued-at instant, when present and representable.
	pub fn issued_at(&self) -> Option<OffsetDateTime> {
		self.iat.and_then(|secs| OffsetDateTime::from_unix_timestamp(secs).ok())
	}

	/// Expiry instant, when present and representable.
	pub fn expires_at(&self) -> Option<OffsetDateTime> {
		self.exp.and_then(|secs| OffsetDateTime::from_unix_timestamp(secs).ok())
	}

	/// Total validity window (`exp - iat`), when both claims exist and the window is positive.
	pub fn lifetime(&self) -> Option<Duration> {
		let lifetime = self.expires_at()? - self.issued_at()?;

		lifetime.is_positive().then_some(lifetime)
	}

	/// Time left before expiry at `now`, clamped to zero.
	pub fn remaining_at(&self, now: OffsetDateTime) -> Option<Duration> {
		let remaining = self.expires_at()? - now;

		Some(if remaining.is_negative() { Duration::ZERO } else { remaining })
	}
}
