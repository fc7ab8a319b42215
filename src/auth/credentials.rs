//! Account payloads sent to the login and registration endpoints.

// self
use crate::{_prelude::*, error::ValidationError};

/// Username-or-email plus password submitted to the login endpoint.
#[derive(Clone)]
pub struct LoginCredentials {
	identifier: String,
	password: String,
}
impl LoginCredentials {
	/// Builds credentials; identifiers containing `@` are sent as an email address.
	pub fn new(identifier: impl Into<String>, password: impl Into<String>) -> Self {
		Self { identifier: identifier.into(), password: password.into() }
	}

	/// Identifier as entered, trimmed.
	pub fn identifier(&self) -> &str {
		self.identifier.trim()
	}

	/// Rejects blank identifiers and passwords.
	pub fn validate(&self) -> Result<(), ValidationError> {
		if self.identifier().is_empty() {
			return Err(ValidationError::EmptyField { field: "identifier" });
		}
		if self.password.is_empty() {
			return Err(ValidationError::EmptyField { field: "password" });
		}

		Ok(())
	}

	pub(crate) fn to_payload(&self) -> LoginPayload<'_> {
		let identifier = self.identifier();
		let (username, email) = if identifier.contains('@') {
			(None, Some(identifier))
		} else {
			(Some(identifier), None)
		};

		LoginPayload { username, email, password: &self.password }
	}
}
impl Debug for LoginCredentials {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("LoginCredentials")
			.field("identifier", &self.identifier)
			.field("password", &"<redacted>")
			.finish()
	}
}

#[derive(Serialize)]
pub(crate) struct LoginPayload<'a> {
	#[serde(skip_serializing_if = "Option::is_none")]
	username: Option<&'a str>,
	#[serde(skip_serializing_if = "Option::is_none")]
	email: Option<&'a str>,
	password: &'a str,
}

/// New account submitted to the registration endpoint.
#[derive(Clone, Serialize)]
pub struct Registration {
	/// Desired username.
	pub username: String,
	/// Contact email.
	pub email: String,
	/// Initial password.
	pub password: String,
}
impl Registration {
	/// Builds a registration request.
	pub fn new(
		username: impl Into<String>,
		email: impl Into<String>,
		password: impl Into<String>,
	) -> Self {
		Self { username: username.into(), email: email.into(), password: password.into() }
	}

	/// Rejects blank fields; all three are mandatory.
	pub fn validate(&self) -> Result<(), ValidationError> {
		if self.username.trim().is_empty() {
			return Err(ValidationError::EmptyField { field: "username" });
		}
		if self.email.trim().is_empty() {
			return Err(ValidationError::EmptyField { field: "email" });
		}
		if self.password.is_empty() {
			return Err(ValidationError::EmptyField { field: "password" });
		}

		Ok(())
	}
}
impl Debug for Registration {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Registration")
			.field("username", &self.username)
			.field("email", &self.email)
			.field("password", &"<redacted>")
			.finish()
	}
}

/// Registration endpoint response.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct RegisteredUser {
	/// Identifier assigned by the server.
	#[serde(default, deserialize_with = "crate::de::lenient_string")]
	pub user_id: Option<String>,
}
