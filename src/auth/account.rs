//! Account and service status payloads returned by the profile and health endpoints.

// crates.io
use time::{PrimitiveDateTime, format_description::well_known::Rfc3339, macros};
// self
use crate::_prelude::*;

/// Profile of the authenticated user.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct UserProfile {
	/// Identifier assigned by the server; numeric ids are kept as their decimal text.
	#[serde(default, deserialize_with = "crate::de::lenient_string")]
	pub id: Option<String>,
	/// Login name.
	pub username: String,
	/// Contact email.
	#[serde(default)]
	pub email: Option<String>,
	/// Account creation time exactly as the server rendered it.
	#[serde(default)]
	pub created_at: Option<String>,
}
impl UserProfile {
	/// Parses [`created_at`](Self::created_at).
	///
	/// Accepts RFC 3339 and the offset-less `YYYY-MM-DD[T ]HH:MM:SS[.fraction]` form, which is
	/// read as UTC.
	pub fn created_at_utc(&self) -> Option<OffsetDateTime> {
		let raw = self.created_at.as_deref()?.trim();

		if let Ok(parsed) = OffsetDateTime::parse(raw, &Rfc3339) {
			return Some(parsed);
		}

		let local = macros::format_description!(
			"[year]-[month]-[day]T[hour]:[minute]:[second][optional [.[subsecond]]]"
		);

		PrimitiveDateTime::parse(&raw.replacen(' ', "T", 1), local)
			.ok()
			.map(PrimitiveDateTime::assume_utc)
	}
}

/// Health endpoint reply.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct HealthStatus {
	/// Overall status; `ok` when the service is healthy.
	pub status: String,
	/// Database status, when reported.
	#[serde(default)]
	pub db: Option<String>,
	/// Server clock at the time of the check, when reported.
	#[serde(default)]
	pub time: Option<String>,
}
impl HealthStatus {
	/// Returns `true` when the service reports `ok`.
	pub fn is_ok(&self) -> bool {
		self.status.eq_ignore_ascii_case("ok")
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn profile(created_at: &str) -> UserProfile {
		serde_json::from_value(serde_json::json!({
			"id": 7,
			"username": "alice",
			"email": "alice@example.com",
			"created_at": created_at,
		}))
		.expect("Profile fixture should decode.")
	}

	#[test]
	fn numeric_profile_ids_become_text() {
		assert_eq!(profile("2025-01-01T10:00:00").id.as_deref(), Some("7"));
	}

	#[test]
	fn creation_time_accepts_server_renderings() {
		let expected = macros::datetime!(2025-01-01 10:00 UTC);

		assert_eq!(profile("2025-01-01T10:00:00").created_at_utc(), Some(expected));
		assert_eq!(profile("2025-01-01 10:00:00").created_at_utc(), Some(expected));
		assert_eq!(profile("2025-01-01T10:00:00Z").created_at_utc(), Some(expected));
		assert_eq!(
			profile("2025-01-01T10:00:00.250000").created_at_utc(),
			Some(expected + Duration::milliseconds(250))
		);
		assert_eq!(profile("yesterday").created_at_utc(), None);
	}

	#[test]
	fn health_status_is_case_insensitive() {
		let health: HealthStatus =
			serde_json::from_value(serde_json::json!({ "status": "OK", "db": "ok" }))
				.expect("Health fixture should decode.");

		assert!(health.is_ok());
		assert_eq!(health.time, None);
	}
}
