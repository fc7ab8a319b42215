//! Client-level error types shared across the session, transport, store, and books layers.

// self
use crate::_prelude::*;

/// Client-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical client error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Storage-layer failure.
	#[error("{0}")]
	Storage(
		#[from]
		#[source]
		crate::store::StoreError,
	),
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Transport failure (DNS, TCP, TLS, timeouts).
	#[error(transparent)]
	Transport(#[from] TransportError),
	/// Upstream answered with a non-success status.
	#[error(transparent)]
	Server(#[from] ServerError),
	/// Response body could not be decoded into the expected shape.
	#[error(transparent)]
	Decode(#[from] DecodeError),
	/// Caller-supplied input was rejected before any request was sent.
	#[error(transparent)]
	Validation(#[from] ValidationError),

	/// No access token is held; the request was never sent.
	#[error("No access token is available; log in first.")]
	Unauthenticated,
	/// The access token was rejected and could not be renewed; credentials were cleared.
	#[error("Session expired: {0}.")]
	SessionExpired(ExpiryReason),
}
impl Error {
	/// Returns the HTTP status attached to server errors.
	pub fn status(&self) -> Option<u16> {
		match self {
			Self::Server(err) => Some(err.status),
			_ => None,
		}
	}

	/// Returns `true` when the caller must authenticate again.
	pub fn requires_login(&self) -> bool {
		matches!(self, Self::Unauthenticated | Self::SessionExpired(_))
	}
}

/// Why a session was torn down after a failed renewal.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ExpiryReason {
	/// No refresh token was held.
	MissingRefreshToken,
	/// Refresh endpoint answered with a non-success status.
	RefreshRejected {
		/// HTTP status returned by the refresh endpoint.
		status: u16,
	},
	/// Refresh endpoint could not be reached.
	RefreshUnreachable {
		/// Rendered transport failure.
		message: String,
	},
	/// Refresh endpoint answered with an unusable payload.
	RefreshMalformed {
		/// Rendered decode failure.
		message: String,
	},
	/// The session was logged out or revoked while the refresh was in flight.
	Superseded,
}
impl Display for ExpiryReason {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		match self {
			Self::MissingRefreshToken => f.write_str("no refresh token is available"),
			Self::RefreshRejected { status } =>
				write!(f, "refresh endpoint rejected the refresh token with HTTP {status}"),
			Self::RefreshUnreachable { message } =>
				write!(f, "refresh endpoint is unreachable ({message})"),
			Self::RefreshMalformed { message } =>
				write!(f, "refresh endpoint returned an unusable payload ({message})"),
			Self::Superseded => f.write_str("the session ended while the refresh was in flight"),
		}
	}
}

/// Non-success HTTP response surfaced to the caller.
#[derive(Clone, Debug, ThisError)]
#[error(
	"Server responded with HTTP {status}{}.",
	.message.as_deref().map(|m| format!(": {m}")).unwrap_or_default()
)]
pub struct ServerError {
	/// HTTP status code.
	pub status: u16,
	/// Human-readable message extracted from a JSON error body (`msg`, `message`, `error`).
	pub message: Option<String>,
	/// Raw response body, lossily decoded.
	pub body: String,
	/// Retry-After hint supplied by upstream.
	pub retry_after: Option<Duration>,
}

/// Configuration and validation failures raised while building clients.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// Base URL cannot be parsed.
	#[error("Base URL is invalid.")]
	InvalidBaseUrl {
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// Base URL uses a scheme other than http or https.
	#[error("Base URL scheme `{scheme}` is not supported; use http or https.")]
	UnsupportedScheme {
		/// Offending scheme.
		scheme: String,
	},
	/// Base URL cannot carry path segments (e.g., `mailto:`).
	#[error("Base URL `{url}` cannot be used as a base for endpoint paths.")]
	CannotBeABase {
		/// Offending URL.
		url: String,
	},
	/// An endpoint path is empty.
	#[error("The {endpoint} endpoint path is empty.")]
	EmptyEndpoint {
		/// Endpoint label.
		endpoint: &'static str,
	},
	/// A storage key name is empty.
	#[error("Storage key for the {slot} must not be empty.")]
	EmptyStorageKey {
		/// Slot label.
		slot: &'static str,
	},
	/// Access and refresh storage keys collide.
	#[error("Access and refresh tokens must be stored under distinct keys.")]
	StorageKeyCollision,
	/// Refresh lifetime fraction outside `(0, 1]`.
	#[error("Refresh lifetime fraction must be within (0, 1], got {fraction}.")]
	InvalidLifetimeFraction {
		/// Offending fraction.
		fraction: f64,
	},
	/// Refresh interval must be positive.
	#[error("Fallback refresh interval must be positive.")]
	NonPositiveRefreshInterval,
	/// Minimum refresh delay must not be negative.
	#[error("Minimum refresh delay must not be negative.")]
	NegativeMinimumDelay,
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Transport-level failures (network, IO).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling {url}.")]
	Network {
		/// Target URL, without query secrets.
		url: String,
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// Request did not complete within the configured timeout.
	#[error("Request to {url} timed out.")]
	Timeout {
		/// Target URL.
		url: String,
	},
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred during transport.")]
	Io(#[from] std::io::Error),
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(
		url: impl Into<String>,
		src: impl 'static + Send + Sync + std::error::Error,
	) -> Self {
		Self::Network { url: url.into(), source: Box::new(src) }
	}
}

/// Response decoding failures.
#[derive(Debug, ThisError)]
pub enum DecodeError {
	/// JSON body did not match the expected structure.
	#[error("Response body is not the expected JSON document.")]
	Json {
		/// Structured parsing failure with the offending path.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
	},
	/// XML body did not match the expected structure.
	#[error("Response body is not the expected XML document.")]
	Xml {
		/// Underlying XML failure.
		#[source]
		source: quick_xml::de::DeError,
	},
	/// Request payload could not be rendered as XML.
	#[error("Request payload could not be rendered as XML.")]
	XmlEncode {
		/// Underlying XML failure.
		#[source]
		source: quick_xml::de::DeError,
	},
	/// Request payload could not be rendered as JSON.
	#[error("Request payload could not be rendered as JSON.")]
	JsonEncode(#[source] serde_json::Error),
	/// Body was valid but of an unexpected content kind.
	#[error("Expected a {expected} response body, got {found}.")]
	UnexpectedContent {
		/// Expected content kind.
		expected: &'static str,
		/// Content kind actually received.
		found: &'static str,
	},
}

/// Input rejected before any network I/O.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum ValidationError {
	/// Required field is empty or whitespace.
	#[error("The {field} field is required.")]
	EmptyField {
		/// Field label.
		field: &'static str,
	},
	/// Too many images were attached.
	#[error("At most {max} images may be attached, got {found}.")]
	TooManyImages {
		/// Maximum allowed.
		max: usize,
		/// Number supplied.
		found: usize,
	},
	/// Image exceeds the size limit.
	#[error("Image `{filename}` is {size} bytes; the limit is {max} bytes.")]
	ImageTooLarge {
		/// Offending file name.
		filename: String,
		/// Image size in bytes.
		size: usize,
		/// Maximum allowed size in bytes.
		max: usize,
	},
	/// Image type is not accepted.
	#[error("Image `{filename}` has unsupported type `{mime}`; use image/png or image/jpeg.")]
	UnsupportedImageType {
		/// Offending file name.
		filename: String,
		/// Declared MIME type.
		mime: String,
	},
}
