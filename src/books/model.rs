//! Book resources and the payloads submitted to the books endpoints.

// self
use crate::{_prelude::*, de::lenient_string, error::ValidationError};

/// Book as returned by the listing and lookup endpoints.
///
/// Scalar fields keep their textual form because JSON and XML endpoints disagree on numeric
/// types (`"1954"` vs `1954`, `"12.50"` vs `12.5`).
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct Book {
	/// ISBN, used as the resource key.
	#[serde(default, deserialize_with = "lenient_string")]
	pub isbn: Option<String>,
	/// Title; empty when the server omitted it.
	#[serde(default, deserialize_with = "lenient_title")]
	pub title: String,
	/// Author name(s).
	#[serde(default, deserialize_with = "lenient_string")]
	pub author: Option<String>,
	/// Year of first publication.
	#[serde(default, deserialize_with = "lenient_string")]
	pub publication_year: Option<String>,
	/// Genre name.
	#[serde(default, deserialize_with = "lenient_string")]
	pub genre: Option<String>,
	/// Price as rendered by the server.
	#[serde(default, deserialize_with = "lenient_string")]
	pub price: Option<String>,
	/// Stock flag or count as rendered by the server.
	#[serde(default, deserialize_with = "lenient_string")]
	pub stock: Option<String>,
	/// Format name (e.g., `Paperback`).
	#[serde(default, deserialize_with = "lenient_string")]
	pub format: Option<String>,
	/// Uploaded cover images.
	#[serde(default)]
	pub images: Vec<BookImage>,
}

/// Image attached to a book.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct BookImage {
	/// Server-side identifier.
	#[serde(default, deserialize_with = "lenient_string")]
	pub id: Option<String>,
	/// Public URL of the stored image.
	#[serde(default, deserialize_with = "lenient_string")]
	pub url: Option<String>,
	/// Original file name.
	#[serde(default, deserialize_with = "lenient_string")]
	pub filename: Option<String>,
	/// Stored MIME type.
	#[serde(default, deserialize_with = "lenient_string")]
	pub mime_type: Option<String>,
	/// Size in bytes.
	#[serde(default, deserialize_with = "lenient_string")]
	pub size_bytes: Option<String>,
	/// Upload timestamp as rendered by the server.
	#[serde(default, deserialize_with = "lenient_string")]
	pub uploaded_at: Option<String>,
}

/// Genre or format lookup entry.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct CatalogEntry {
	/// Server-side identifier.
	#[serde(default, deserialize_with = "lenient_string")]
	pub id: Option<String>,
	/// Display name, also the value books reference.
	pub name: String,
}

/// Minimal book created through the JSON endpoint.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct NewBook {
	/// Title.
	pub title: String,
	/// Author name(s).
	pub author: String,
	/// Year of publication.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub published_year: Option<i32>,
}
impl NewBook {
	/// Builds a payload without a publication year.
	pub fn new(title: impl Into<String>, author: impl Into<String>) -> Self {
		Self { title: title.into(), author: author.into(), published_year: None }
	}

	/// Sets the publication year.
	pub fn published_in(mut self, year: i32) -> Self {
		self.published_year = Some(year);

		self
	}

	/// Rejects blank titles and authors.
	pub fn validate(&self) -> Result<(), ValidationError> {
		if self.title.trim().is_empty() {
			return Err(ValidationError::EmptyField { field: "title" });
		}
		if self.author.trim().is_empty() {
			return Err(ValidationError::EmptyField { field: "author" });
		}

		Ok(())
	}
}

/// Full book record submitted as XML by insert and update.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BookDraft {
	/// ISBN; required.
	pub isbn: String,
	/// Title; required.
	pub title: String,
	/// Author name(s).
	pub author: Option<String>,
	/// Year of publication.
	pub publication_year: Option<i32>,
	/// Genre name, as listed by the genre catalog.
	pub genre: Option<String>,
	/// Price.
	pub price: Option<f64>,
	/// Whether the book is in stock.
	pub in_stock: bool,
	/// Format name, as listed by the format catalog.
	pub format: Option<String>,
}
impl BookDraft {
	/// Starts a draft with the two required fields.
	pub fn new(isbn: impl Into<String>, title: impl Into<String>) -> Self {
		Self { isbn: isbn.into(), title: title.into(), ..Default::default() }
	}

	/// Rejects drafts without an ISBN or title.
	pub fn validate(&self) -> Result<(), ValidationError> {
		if self.isbn.trim().is_empty() {
			return Err(ValidationError::EmptyField { field: "isbn" });
		}
		if self.title.trim().is_empty() {
			return Err(ValidationError::EmptyField { field: "title" });
		}

		Ok(())
	}
}

/// Cover image uploaded with insert and update.
#[derive(Clone, PartialEq, Eq)]
pub struct ImageUpload {
	/// File name sent with the part.
	pub filename: String,
	/// MIME type; only `image/png` and `image/jpeg` are accepted.
	pub content_type: String,
	/// Raw image bytes.
	pub data: Vec<u8>,
}
impl ImageUpload {
	/// Most images accepted per request.
	pub const MAX_COUNT: usize = 5;
	/// Largest accepted image, in bytes.
	pub const MAX_BYTES: usize = 5 * 1024 * 1024;
	/// Accepted MIME types.
	pub const ACCEPTED_TYPES: [&'static str; 2] = ["image/png", "image/jpeg"];

	/// Wraps raw bytes.
	pub fn new(
		filename: impl Into<String>,
		content_type: impl Into<String>,
		data: impl Into<Vec<u8>>,
	) -> Self {
		Self { filename: filename.into(), content_type: content_type.into(), data: data.into() }
	}

	/// Wraps raw bytes, inferring the MIME type from the file extension.
	pub fn from_filename(filename: impl Into<String>, data: impl Into<Vec<u8>>) -> Self {
		let filename = filename.into();
		let extension = filename.rsplit_once('.').map(|(_, ext)| ext.to_ascii_lowercase());
		let content_type = match extension.as_deref() {
			Some("png") => "image/png",
			Some("jpg" | "jpeg") => "image/jpeg",
			_ => "application/octet-stream",
		};

		Self::new(filename, content_type, data)
	}

	/// Checks the type and size of one image.
	pub fn validate(&self) -> Result<(), ValidationError> {
		let mime = self.content_type.trim().to_ascii_lowercase();

		if !Self::ACCEPTED_TYPES.contains(&mime.as_str()) {
			return Err(ValidationError::UnsupportedImageType {
				filename: self.filename.clone(),
				mime: self.content_type.clone(),
			});
		}
		if self.data.len() > Self::MAX_BYTES {
			return Err(ValidationError::ImageTooLarge {
				filename: self.filename.clone(),
				size: self.data.len(),
				max: Self::MAX_BYTES,
			});
		}

		Ok(())
	}

	/// Checks the count and every image of a batch.
	pub fn validate_batch(images: &[Self]) -> Result<(), ValidationError> {
		if images.len() > Self::MAX_COUNT {
			return Err(ValidationError::TooManyImages {
				max: Self::MAX_COUNT,
				found: images.len(),
			});
		}

		images.iter().try_for_each(Self::validate)
	}
}
impl Debug for ImageUpload {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ImageUpload")
			.field("filename", &self.filename)
			.field("content_type", &self.content_type)
			.field("len", &self.data.len())
			.finish()
	}
}

fn lenient_title<'de, D>(deserializer: D) -> Result<String, D::Error>
where
	D: serde::Deserializer<'de>,
{
	lenient_string(deserializer).map(Option::unwrap_or_default)
}

/// Decodes a JSON listing: an array, a `{"books": [..]}` wrapper, or a single object.
pub(crate) fn books_from_json(
	value: serde_json::Value,
) -> Result<Vec<Book>, serde_path_to_error::Error<serde_json::Error>> {
	let listing = match value {
		serde_json::Value::Object(mut map)
			if map.get("books").is_some_and(serde_json::Value::is_array) =>
			map.remove("books").unwrap_or_default(),
		serde_json::Value::Object(map) =>
			serde_json::Value::Array(vec![serde_json::Value::Object(map)]),
		serde_json::Value::Null => serde_json::Value::Array(Vec::new()),
		other => other,
	};

	serde_path_to_error::deserialize(listing)
}
