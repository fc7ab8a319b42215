//! Session-aware client for JWT-guarded book catalog APIs: bearer injection, one coalesced
//! refresh-and-retry on 401, cancellable proactive renewal, and typed book operations.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod auth;
pub mod books;
pub mod config;
pub mod content;
pub mod de;
pub mod error;
pub mod http;
pub mod obs;
pub mod session;
pub mod store;
#[cfg(any(test, feature = "test"))]
pub mod _preludet {
	//! Convenience re-exports and fixtures for tests; enabled via `cfg(test)` or the `test`
	//! crate feature.

	pub use crate::_prelude::*;

	// self
	use crate::{
		config::ClientConfig,
		error::TransportError,
		http::{ApiResponse, HttpRequest, HttpTransport, TransportFuture},
		store::{MemoryStore, SessionStore, StoreError, StoreFuture},
	};

	type Responder = dyn Fn(&HttpRequest) -> Result<ApiResponse, TransportError> + Send + Sync;

	/// In-process [`HttpTransport`] answering from a closure and recording every request.
	pub struct ScriptedTransport {
		responder: Box<Responder>,
		requests: Mutex<Vec<HttpRequest>>,
	}
	impl ScriptedTransport {
		/// Wraps `responder`, which sees each request before it is recorded.
		pub fn new<F>(responder: F) -> Arc<Self>
		where
			F: 'static + Fn(&HttpRequest) -> Result<ApiResponse, TransportError> + Send + Sync,
		{
			Arc::new(Self { responder: Box::new(responder), requests: Mutex::new(Vec::new()) })
		}

		/// Transport that fails every request with a connection error.
		pub fn unreachable() -> Arc<Self> {
			Self::new(|_| {
				Err(TransportError::Io(std::io::Error::new(
					std::io::ErrorKind::ConnectionRefused,
					"scripted transport is unreachable",
				)))
			})
		}

		/// Snapshot of every request executed so far.
		pub fn requests(&self) -> Vec<HttpRequest> {
			self.requests.lock().clone()
		}

		/// Number of requests whose URL path equals `path`.
		pub fn count_path(&self, path: &str) -> usize {
			self.requests.lock().iter().filter(|request| request.url.path() == path).count()
		}
	}
	impl HttpTransport for ScriptedTransport {
		fn execute(&self, request: HttpRequest) -> TransportFuture<'_> {
			let response = (self.responder)(&request);

			self.requests.lock().push(request);

			Box::pin(async move { response })
		}
	}
	impl Debug for ScriptedTransport {
		fn fmt(&self, f: &mut Formatter) -> FmtResult {
			f.debug_struct("ScriptedTransport")
				.field("requests", &self.requests.lock().len())
				.finish()
		}
	}

	/// Store that serves reads from `entries` and refuses every write.
	#[derive(Debug, Default)]
	pub struct ReadOnlyStore {
		/// Backing values for reads and removals.
		pub entries: MemoryStore,
	}
	impl SessionStore for ReadOnlyStore {
		fn get<'a>(&'a self, key: &'a str) -> StoreFuture<'a, Option<String>> {
			self.entries.get(key)
		}

		fn set<'a>(&'a self, _: &'a str, _: String) -> StoreFuture<'a, ()> {
			Box::pin(async { Err(StoreError::Backend { message: "read-only".into() }) })
		}

		fn remove<'a>(&'a self, key: &'a str) -> StoreFuture<'a, ()> {
			self.entries.remove(key)
		}
	}

	/// Builds a JSON response with `status`.
	pub fn json_response(status: u16, body: serde_json::Value) -> ApiResponse {
		ApiResponse::new(status, Some("application/json".into()), body.to_string())
	}

	/// Builds an XML response with `status`.
	pub fn xml_response(status: u16, body: &str) -> ApiResponse {
		ApiResponse::new(status, Some("application/xml".into()), body)
	}

	/// Default configuration rooted at `base_url`.
	pub fn test_config(base_url: &str) -> ClientConfig {
		ClientConfig::builder(base_url).build().expect("Test configuration should build.")
	}
}

mod _prelude {
	pub use std::{
		collections::{BTreeMap, HashMap},
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		sync::Arc,
	};

	pub use async_lock::Mutex as AsyncMutex;
	pub use parking_lot::{Mutex, RwLock};
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

#[cfg(feature = "reqwest")] pub use reqwest;
pub use url;
#[cfg(test)] use {color_eyre as _, httpmock as _, tracing_subscriber as _};
