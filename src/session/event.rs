// self
use crate::error::ExpiryReason;

/// Lifecycle notifications broadcast to [`Session::subscribe`](crate::session::Session::subscribe)
/// receivers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SessionEvent {
	/// Credentials were obtained from the login endpoint.
	LoggedIn,
	/// The access token was renewed, reactively or by the proactive task.
	Refreshed,
	/// Renewal failed and the session was cleared.
	Expired(ExpiryReason),
	/// The session was ended locally.
	LoggedOut,
	/// Every session of the account was revoked server-side.
	Revoked,
}
impl SessionEvent {
	/// Returns `true` for events that leave the session anonymous.
	pub fn ends_session(&self) -> bool {
		matches!(self, Self::Expired(_) | Self::LoggedOut | Self::Revoked)
	}
}
