//! Transport primitives shared by the session and resource clients.
//!
//! The module exposes [`HttpTransport`] alongside the owned [`HttpRequest`] and
//! [`ApiResponse`] values so downstream crates can plug in custom HTTP stacks (or fakes in
//! tests) without touching the authenticated request flow. Requests are plain data and can be
//! dispatched more than once, which the flow relies on when it retries after a token refresh.

// crates.io
#[cfg(feature = "reqwest")] use reqwest::header::{CONTENT_TYPE, HeaderMap, RETRY_AFTER};
#[cfg(feature = "reqwest")] use time::format_description::well_known::Rfc2822;
// self
use crate::{
	_prelude::*,
	content::ResponseContent,
	error::{ServerError, TransportError},
};

/// Boxed future returned by [`HttpTransport::execute`].
pub type TransportFuture<'a> =
	Pin<Box<dyn Future<Output = Result<ApiResponse, TransportError>> + 'a + Send>>;

/// Abstraction over HTTP stacks capable of executing client requests.
///
/// Implementations must be `Send + Sync + 'static` so one transport can back every clone of a
/// session and the background refresh task. Any HTTP status, including 4xx/5xx, is a
/// successful execution; only failures to obtain a response map to [`TransportError`].
pub trait HttpTransport
where
	Self: 'static + Send + Sync,
{
	/// Sends `request` and buffers the full response.
	fn execute(&self, request: HttpRequest) -> TransportFuture<'_>;
}

/// HTTP methods used by the client.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Method {
	/// `GET`.
	Get,
	/// `POST`.
	Post,
	/// `PUT`.
	Put,
	/// `PATCH`.
	Patch,
	/// `DELETE`.
	Delete,
}
impl Method {
	/// Returns the canonical method token.
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Get => "GET",
			Self::Post => "POST",
			Self::Put => "PUT",
			Self::Patch => "PATCH",
			Self::Delete => "DELETE",
		}
	}
}
impl Display for Method {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// One part of a `multipart/form-data` body.
#[derive(Clone, PartialEq, Eq)]
pub struct MultipartPart {
	/// Form field name.
	pub name: String,
	/// File name, for file parts.
	pub filename: Option<String>,
	/// Part content type.
	pub content_type: Option<String>,
	/// Raw part payload.
	pub data: Vec<u8>,
}
impl MultipartPart {
	/// Builds a text field part.
	pub fn text(name: impl Into<String>, value: impl Into<String>) -> Self {
		let data = value.into().into_bytes();

		Self { name: name.into(), filename: None, content_type: None, data }
	}

	/// Builds a file part.
	pub fn file(
		name: impl Into<String>,
		filename: impl Into<String>,
		content_type: impl Into<String>,
		data: Vec<u8>,
	) -> Self {
		Self {
			name: name.into(),
			filename: Some(filename.into()),
			content_type: Some(content_type.into()),
			data,
		}
	}
}
impl Debug for MultipartPart {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("MultipartPart")
			.field("name", &self.name)
			.field("filename", &self.filename)
			.field("content_type", &self.content_type)
			.field("len", &self.data.len())
			.finish()
	}
}

/// Request payload variants.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum RequestBody {
	/// No body.
	#[default]
	Empty,
	/// Serialized JSON document.
	Json(Vec<u8>),
	/// Serialized XML document.
	Xml(String),
	/// Multipart form, rebuilt by the transport on every dispatch.
	Multipart(Vec<MultipartPart>),
}
impl RequestBody {
	/// Serializes `value` as a JSON body.
	pub fn json<T>(value: &T) -> Result<Self, serde_json::Error>
	where
		T: ?Sized + Serialize,
	{
		serde_json::to_vec(value).map(Self::Json)
	}
}

/// Owned, replayable HTTP request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HttpRequest {
	/// HTTP method.
	pub method: Method,
	/// Absolute target URL.
	pub url: Url,
	/// Extra headers; the transport adds `Content-Type` for typed bodies.
	pub headers: Vec<(String, String)>,
	/// Request payload.
	pub body: RequestBody,
}
impl HttpRequest {
	/// Creates a body-less request.
	pub fn new(method: Method, url: Url) -> Self {
		Self { method, url, headers: Vec::new(), body: RequestBody::Empty }
	}

	/// Shorthand for a `GET` request.
	pub fn get(url: Url) -> Self {
		Self::new(Method::Get, url)
	}

	/// Shorthand for a `POST` request.
	pub fn post(url: Url) -> Self {
		Self::new(Method::Post, url)
	}

	/// Attaches a payload.
	pub fn with_body(mut self, body: RequestBody) -> Self {
		self.body = body;

		self
	}

	/// Appends a header.
	pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
		self.headers.push((name.into(), value.into()));

		self
	}

	/// Returns a copy carrying `Authorization: <value>`, replacing any previous value.
	pub fn authorized(&self, authorization: String) -> Self {
		let mut request = self.clone();

		request.headers.retain(|(name, _)| !name.eq_ignore_ascii_case("authorization"));
		request.headers.push(("Authorization".into(), authorization));

		request
	}

	/// Looks up a header value case-insensitively.
	pub fn header(&self, name: &str) -> Option<&str> {
		self.headers
			.iter()
			.find(|(key, _)| key.eq_ignore_ascii_case(name))
			.map(|(_, value)| value.as_str())
	}
}

/// Fully buffered HTTP response.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ApiResponse {
	/// HTTP status code.
	pub status: u16,
	/// `Content-Type` header, if any.
	pub content_type: Option<String>,
	/// Retry-After hint expressed as a relative duration.
	pub retry_after: Option<Duration>,
	/// Raw body bytes.
	pub body: Vec<u8>,
}
impl ApiResponse {
	/// Builds a response from its parts.
	pub fn new(status: u16, content_type: Option<String>, body: impl Into<Vec<u8>>) -> Self {
		Self { status, content_type, retry_after: None, body: body.into() }
	}

	/// Returns `true` for 2xx statuses.
	pub fn is_success(&self) -> bool {
		(200..300).contains(&self.status)
	}

	/// Returns `true` for HTTP 401.
	pub fn is_unauthorized(&self) -> bool {
		self.status == 401
	}

	/// Body decoded as UTF-8, replacing invalid sequences.
	pub fn text(&self) -> String {
		String::from_utf8_lossy(&self.body).into_owned()
	}

	/// Decodes the body into a content variant chosen by `Content-Type`.
	pub fn content(&self) -> ResponseContent {
		ResponseContent::from_response(self)
	}

	/// Converts non-2xx responses into [`ServerError`], passing successes through.
	pub fn error_for_status(self) -> Result<Self, ServerError> {
		if self.is_success() {
			return Ok(self);
		}

		let body = self.text();
		let message = extract_error_message(&body);

		Err(ServerError { status: self.status, message, body, retry_after: self.retry_after })
	}
}

/// Pulls a human-readable message out of a JSON error body.
fn extract_error_message(body: &str) -> Option<String> {
	let value = serde_json::from_str::<serde_json::Value>(body).ok()?;

	["msg", "message", "error", "detail"]
		.into_iter()
		.find_map(|key| value.get(key).and_then(serde_json::Value::as_str))
		.map(str::to_owned)
}

/// [`HttpTransport`] backed by a shared [`ReqwestClient`].
///
/// Redirects are not followed: auth endpoints answer directly, and following a redirect would
/// forward the bearer header to another origin.
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug)]
pub struct ReqwestTransport(ReqwestClient);
#[cfg(feature = "reqwest")]
impl ReqwestTransport {
	const DEFAULT_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(30);

	/// Builds a transport with the default 30 second request timeout.
	pub fn new() -> Result<Self, crate::error::ConfigError> {
		Self::with_timeout(Self::DEFAULT_TIMEOUT)
	}

	/// Builds a transport with a custom request timeout.
	pub fn with_timeout(timeout: std::time::Duration) -> Result<Self, crate::error::ConfigError> {
		let client = ReqwestClient::builder()
			.timeout(timeout)
			.redirect(reqwest::redirect::Policy::none())
			.build()?;

		Ok(Self(client))
	}

	/// Wraps an existing reqwest [`ReqwestClient`].
	pub fn with_client(client: ReqwestClient) -> Self {
		Self(client)
	}

	fn build(&self, request: HttpRequest) -> Result<reqwest::RequestBuilder, TransportError> {
		let method = reqwest::Method::from_bytes(request.method.as_str().as_bytes())
			.map_err(|e| TransportError::network(request.url.as_str(), e))?;
		let mut builder = self.0.request(method, request.url);

		for (name, value) in request.headers {
			builder = builder.header(name, value);
		}

		builder = match request.body {
			RequestBody::Empty => builder,
			RequestBody::Json(bytes) =>
				builder.header(CONTENT_TYPE, "application/json").body(bytes),
			RequestBody::Xml(text) => builder.header(CONTENT_TYPE, "application/xml").body(text),
			RequestBody::Multipart(parts) => builder.multipart(multipart_form(parts)?),
		};

		Ok(builder)
	}
}
#[cfg(feature = "reqwest")]
impl HttpTransport for ReqwestTransport {
	fn execute(&self, request: HttpRequest) -> TransportFuture<'_> {
		Box::pin(async move {
			let url = request.url.to_string();
			let response = self.build(request)?.send().await.map_err(|e| map_reqwest(&url, e))?;
			let status = response.status().as_u16();
			let headers = response.headers().to_owned();
			let body = response.bytes().await.map_err(|e| map_reqwest(&url, e))?;

			Ok(ApiResponse {
				status,
				content_type: headers
					.get(CONTENT_TYPE)
					.and_then(|value| value.to_str().ok())
					.map(str::to_owned),
				retry_after: parse_retry_after(&headers),
				body: body.to_vec(),
			})
		})
	}
}

#[cfg(feature = "reqwest")]
fn multipart_form(parts: Vec<MultipartPart>) -> Result<reqwest::multipart::Form, TransportError> {
	let mut form = reqwest::multipart::Form::new();

	for part in parts {
		let filename = part.filename;
		let content_type = part.content_type;
		let mut body = reqwest::multipart::Part::bytes(part.data);

		if let Some(filename) = filename {
			body = body.file_name(filename);
		}
		if let Some(mime) = content_type {
			body = body.mime_str(&mime).map_err(|e| TransportError::network("multipart", e))?;
		}

		form = form.part(part.name, body);
	}

	Ok(form)
}

#[cfg(feature = "reqwest")]
fn map_reqwest(url: &str, err: ReqwestError) -> TransportError {
	if err.is_timeout() {
		TransportError::Timeout { url: url.to_owned() }
	} else {
		TransportError::network(url, err)
	}
}

#[cfg(feature = "reqwest")]
fn parse_retry_after(headers: &HeaderMap) -> Option<Duration> {
	let value = headers.get(RETRY_AFTER)?;
	let raw = value.to_str().ok()?.trim();

	if let Ok(secs) = raw.parse::<u64>() {
		return i64::try_from(secs).ok().map(Duration::seconds);
	}
	if let Ok(moment) = OffsetDateTime::parse(raw, &Rfc2822) {
		let delta = moment - OffsetDateTime::now_utc();

		if delta.is_positive() {
			return Some(delta);
		}
	}

	None
}
