//! Typed client for the books resource.
//!
//! Every call goes through [`Session::send`], so the bearer token, refresh-and-retry, and
//! session expiry apply uniformly. Non-success responses become [`Error::Server`]. Reads accept
//! JSON or XML bodies; writes use JSON (`add`), multipart with an XML `book` part
//! (`insert`/`update`), or an XML batch (`delete`).

pub mod model;

mod xml;

pub use model::*;

// self
use crate::{
	_prelude::*,
	content::ResponseContent,
	error::{DecodeError, ValidationError},
	http::{ApiResponse, HttpRequest, Method, MultipartPart, RequestBody},
	session::Session,
};
use xml::Catalog;

const ACCEPT: &str = "application/json, application/xml;q=0.9, text/plain;q=0.5";

/// Books API bound to one session.
#[derive(Clone, Debug)]
pub struct BooksClient {
	session: Session,
}
impl BooksClient {
	/// Wraps `session`; clones share its credentials.
	pub fn new(session: Session) -> Self {
		Self { session }
	}

	/// Underlying session.
	pub fn session(&self) -> &Session {
		&self.session
	}

	/// Lists every book.
	pub async fn list(&self) -> Result<Vec<Book>> {
		self.fetch_books(&["books"]).await
	}

	/// Looks up one book by ISBN. Missing books surface as the server's error status.
	pub async fn by_isbn(&self, isbn: &str) -> Result<Option<Book>> {
		let isbn = required(isbn, "isbn")?;

		Ok(self.fetch_books(&["books", isbn]).await?.into_iter().next())
	}

	/// Lists books by `author`.
	pub async fn by_author(&self, author: &str) -> Result<Vec<Book>> {
		let author = required(author, "author")?;

		self.fetch_books(&["books", "author", author]).await
	}

	/// Lists books in `format`.
	pub async fn by_format(&self, format: &str) -> Result<Vec<Book>> {
		let format = required(format, "format")?;

		self.fetch_books(&["books", "format", format]).await
	}

	/// Genre catalog.
	pub async fn genres(&self) -> Result<Vec<CatalogEntry>> {
		self.fetch_catalog(Catalog::Genres).await
	}

	/// Format catalog.
	pub async fn formats(&self) -> Result<Vec<CatalogEntry>> {
		self.fetch_catalog(Catalog::Formats).await
	}

	/// Creates a book through the JSON endpoint and returns the server's reply.
	pub async fn add(&self, book: &NewBook) -> Result<ResponseContent> {
		book.validate()?;

		let body = RequestBody::json(book).map_err(DecodeError::JsonEncode)?;
		let request = self.request(Method::Post, &["books"])?.with_body(body);

		Ok(self.execute(request).await?.content())
	}

	/// Inserts a full book record with optional cover images.
	pub async fn insert(
		&self,
		draft: &BookDraft,
		images: &[ImageUpload],
	) -> Result<ResponseContent> {
		self.upload(&["books", "insert"], draft, images).await
	}

	/// Replaces a book record, adding any supplied cover images.
	pub async fn update(
		&self,
		draft: &BookDraft,
		images: &[ImageUpload],
	) -> Result<ResponseContent> {
		self.upload(&["books", "update"], draft, images).await
	}

	/// Deletes every listed ISBN in one request. Blank entries are ignored.
	pub async fn delete<I, S>(&self, isbns: I) -> Result<ResponseContent>
	where
		I: IntoIterator<Item = S>,
		S: AsRef<str>,
	{
		let isbns = isbns
			.into_iter()
			.map(|isbn| isbn.as_ref().trim().to_owned())
			.filter(|isbn| !isbn.is_empty())
			.collect::<Vec<_>>();

		if isbns.is_empty() {
			return Err(ValidationError::EmptyField { field: "isbn" }.into());
		}

		let body = RequestBody::Xml(xml::encode_delete(&isbns)?);
		let request = self.request(Method::Delete, &["books", "delete"])?.with_body(body);

		Ok(self.execute(request).await?.content())
	}

	async fn upload(
		&self,
		path: &[&str],
		draft: &BookDraft,
		images: &[ImageUpload],
	) -> Result<ResponseContent> {
		draft.validate()?;
		ImageUpload::validate_batch(images)?;

		let mut parts = vec![MultipartPart::file(
			"book",
			"book.xml",
			"application/xml",
			xml::encode_draft(draft)?.into_bytes(),
		)];

		parts.extend(images.iter().map(|image| {
			MultipartPart::file(
				"images",
				image.filename.clone(),
				image.content_type.clone(),
				image.data.clone(),
			)
		}));

		let request = self.request(Method::Put, path)?.with_body(RequestBody::Multipart(parts));

		Ok(self.execute(request).await?.content())
	}

	async fn fetch_books(&self, path: &[&str]) -> Result<Vec<Book>> {
		let response = self.execute(self.request(Method::Get, path)?).await?;

		Ok(match response.content() {
			ResponseContent::Json(value) =>
				model::books_from_json(value).map_err(|source| DecodeError::Json { source })?,
			ResponseContent::Xml(document) => xml::decode_books(&document)?,
			ResponseContent::Empty => Vec::new(),
			other => Err(unexpected(&other))?,
		})
	}

	async fn fetch_catalog(&self, catalog: Catalog) -> Result<Vec<CatalogEntry>> {
		let response = self.execute(self.request(Method::Get, &[catalog.path()])?).await?;

		Ok(match response.content() {
			ResponseContent::Json(value) => ResponseContent::Json(value).into_json()?,
			ResponseContent::Xml(document) => xml::decode_catalog(&document, catalog)?,
			ResponseContent::Empty => Vec::new(),
			other => Err(unexpected(&other))?,
		})
	}

	fn request(&self, method: Method, path: &[&str]) -> Result<HttpRequest> {
		let url = self.session.config().endpoint_segments(path.iter().copied())?;

		Ok(HttpRequest::new(method, url).with_header("Accept", ACCEPT))
	}

	async fn execute(&self, request: HttpRequest) -> Result<ApiResponse> {
		Ok(self.session.send(request).await?.error_for_status()?)
	}
}

fn required<'a>(value: &'a str, field: &'static str) -> Result<&'a str, ValidationError> {
	let value = value.trim();

	if value.is_empty() { Err(ValidationError::EmptyField { field }) } else { Ok(value) }
}

fn unexpected(content: &ResponseContent) -> DecodeError {
	DecodeError::UnexpectedContent { expected: "JSON or XML", found: content.kind() }
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::{_preludet::*, store::MemoryStore};

	async fn client(transport: Arc<ScriptedTransport>) -> BooksClient {
		let store = Arc::new(MemoryStore::with_entries([
			("access_token", "A1"),
			("refresh_token", "R1"),
		]));
		let session = Session::restore(test_config("http://books.test/api/"), transport, store)
			.await
			.expect("Restore should succeed.");

		BooksClient::new(session)
	}

	#[tokio::test]
	async fn path_parameters_are_percent_encoded() {
		let transport = ScriptedTransport::new(|request| {
			assert_eq!(request.url.path(), "/api/books/author/Ursula%20K.%20Le%20Guin");
			assert_eq!(request.header("Authorization"), Some("Bearer A1"));

			Ok(json_response(200, serde_json::json!([{ "title": "The Dispossessed" }])))
		});
		let books = client(transport)
			.await
			.by_author("Ursula K. Le Guin")
			.await
			.expect("Author lookup should succeed.");

		assert_eq!(books[0].title, "The Dispossessed");
	}

	#[tokio::test]
	async fn blank_lookups_fail_before_io() {
		let transport = ScriptedTransport::unreachable();
		let books = client(transport.clone()).await;

		assert!(matches!(books.by_isbn(" ").await, Err(Error::Validation(_))));
		assert!(matches!(books.delete([" ", ""]).await, Err(Error::Validation(_))));
		assert!(transport.requests().is_empty());
	}

	#[tokio::test]
	async fn upload_builds_book_part_then_images() {
		let transport = ScriptedTransport::new(|request| {
			assert_eq!(request.method, Method::Put);
			assert_eq!(request.url.path(), "/api/books/update");

			let RequestBody::Multipart(parts) = &request.body else {
				panic!("Update should send a multipart body.");
			};

			assert_eq!(parts.len(), 3);
			assert_eq!(parts[0].name, "book");
			assert!(String::from_utf8_lossy(&parts[0].data).starts_with("<book isbn=\"42\">"));
			assert_eq!(parts[1].name, "images");
			assert_eq!(parts[2].filename.as_deref(), Some("back.jpg"));

			Ok(ApiResponse::new(200, Some("text/plain".into()), "updated"))
		});
		let images = [
			ImageUpload::from_filename("front.png", vec![1_u8; 8]),
			ImageUpload::from_filename("back.jpg", vec![2_u8; 8]),
		];
		let reply = client(transport)
			.await
			.update(&BookDraft::new("42", "Dune"), &images)
			.await
			.expect("Update should succeed.");

		assert_eq!(reply, ResponseContent::Text("updated".into()));
	}

	#[tokio::test]
	async fn invalid_images_fail_before_io() {
		let transport = ScriptedTransport::unreachable();
		let books = client(transport.clone()).await;
		let images = vec![ImageUpload::from_filename("cover.png", vec![0_u8; 4]); 6];
		let err = books
			.insert(&BookDraft::new("42", "Dune"), &images)
			.await
			.expect_err("Six images should be rejected.");

		assert!(matches!(err, Error::Validation(ValidationError::TooManyImages { .. })));
		assert!(transport.requests().is_empty());
	}

	#[tokio::test]
	async fn server_errors_surface_with_status() {
		let transport = ScriptedTransport::new(|_| {
			Ok(json_response(404, serde_json::json!({ "error": "Book not found" })))
		});
		let err = client(transport)
			.await
			.by_isbn("404")
			.await
			.expect_err("A 404 should surface as an error.");

		assert_eq!(err.status(), Some(404));
		assert!(err.to_string().contains("Book not found"));
	}

	#[tokio::test]
	async fn catalogs_decode_xml() {
		let transport = ScriptedTransport::new(|request| {
			assert_eq!(request.url.path(), "/api/formats");

			Ok(xml_response(
				200,
				"<formats><format><id>1</id><name>Hardcover</name></format></formats>",
			))
		});
		let formats =
			client(transport).await.formats().await.expect("Format catalog should decode.");

		assert_eq!(formats, vec![CatalogEntry { id: Some("1".into()), name: "Hardcover".into() }]);
	}
}
