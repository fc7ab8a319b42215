//! Credential pair held by a session and the grant payload that produces it.

// self
use crate::{_prelude::*, auth::token::secret::TokenSecret};

/// Access/refresh tokens owned by a single client session.
#[derive(Clone, PartialEq, Eq)]
pub struct CredentialPair {
	/// Short-lived bearer credential for protected requests.
	pub access_token: TokenSecret,
	/// Longer-lived credential used only to mint new access tokens.
	pub refresh_token: Option<TokenSecret>,
}
impl CredentialPair {
	/// Builds a pair from raw token strings.
	pub fn new(access_token: impl Into<String>, refresh_token: Option<impl Into<String>>) -> Self {
		Self {
			access_token: TokenSecret::new(access_token),
			refresh_token: refresh_token.map(TokenSecret::new),
		}
	}

	/// Applies a refresh grant; the refresh token is kept unless the grant rotates it.
	pub fn rotated(&self, grant: TokenGrant) -> Self {
		Self {
			access_token: grant.access_token,
			refresh_token: grant.refresh_token.or_else(|| self.refresh_token.clone()),
		}
	}

	/// Returns `true` when a refresh token is held.
	pub fn can_refresh(&self) -> bool {
		self.refresh_token.is_some()
	}
}
impl From<TokenGrant> for CredentialPair {
	fn from(grant: TokenGrant) -> Self {
		Self { access_token: grant.access_token, refresh_token: grant.refresh_token }
	}
}
impl Debug for CredentialPair {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("CredentialPair")
			.field("access_token", &"<redacted>")
			.field("refresh_token", &self.refresh_token.as_ref().map(|_| "<redacted>"))
			.finish()
	}
}

/// Success payload of the login and refresh endpoints.
#[derive(Clone, Debug, Deserialize)]
pub struct TokenGrant {
	/// Newly minted access token.
	pub access_token: TokenSecret,
	/// Rotated refresh token, when the server issues one.
	#[serde(default)]
	pub refresh_token: Option<TokenSecret>,
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn rotation_keeps_refresh_token_when_omitted() {
		let pair = CredentialPair::new("A1", Some("R1"));
		let grant: TokenGrant = serde_json::from_str("{\"access_token\":\"A2\"}")
			.expect("Refresh payload without a refresh token should decode.");
		let rotated = pair.rotated(grant);

		assert_eq!(rotated.access_token.expose(), "A2");
		assert_eq!(rotated.refresh_token.as_ref().map(TokenSecret::expose), Some("R1"));
	}

	#[test]
	fn rotation_adopts_new_refresh_token() {
		let pair = CredentialPair::new("A1", Some("R1"));
		let grant: TokenGrant =
			serde_json::from_str("{\"access_token\":\"A2\",\"refresh_token\":\"R2\"}")
				.expect("Refresh payload with a refresh token should decode.");

		assert_eq!(pair.rotated(grant).refresh_token.as_ref().map(TokenSecret::expose), Some("R2"));
	}

	#[test]
	fn debug_output_is_redacted() {
		let pair = CredentialPair::new("A1", None::<String>);
		let rendered = format!("{pair:?}");

		assert!(!rendered.contains("A1"));
		assert!(rendered.contains("<redacted>"));
	}
}
