//! XML documents exchanged with the books endpoints.
//!
//! Reads accept either a `<books>` wrapper with `<book isbn="..">` children or a bare `<book>`
//! document. Writes render the `<book>` part of insert/update forms and the `<delete>` batch.

// crates.io
use quick_xml::events::Event;
// self
use crate::{
	_prelude::*,
	books::model::{Book, BookDraft, BookImage, CatalogEntry},
	error::DecodeError,
};

/// Decodes a book listing or a single book document.
pub(crate) fn decode_books(xml: &str) -> Result<Vec<Book>, DecodeError> {
	let books = if root_name(xml)?.as_deref() == Some("book") {
		vec![from_str::<BookXml>(xml)?]
	} else {
		from_str::<BooksXml>(xml)?.book
	};

	Ok(books.into_iter().map(Book::from).collect())
}

/// Lookup tables served next to the books resource.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Catalog {
	Genres,
	Formats,
}
impl Catalog {
	pub(crate) const fn path(self) -> &'static str {
		match self {
			Self::Genres => "genres",
			Self::Formats => "formats",
		}
	}
}

/// Decodes a `<genres>` or `<formats>` catalog.
pub(crate) fn decode_catalog(
	xml: &str,
	catalog: Catalog,
) -> Result<Vec<CatalogEntry>, DecodeError> {
	let entries = match catalog {
		Catalog::Genres => from_str::<GenresXml>(xml)?.genre,
		Catalog::Formats => from_str::<FormatsXml>(xml)?.format,
	};

	Ok(entries
		.into_iter()
		.filter_map(|entry| {
			let name = non_blank(entry.name)?;

			Some(CatalogEntry { id: non_blank(entry.id), name })
		})
		.collect())
}

/// Renders the `book` part of an insert/update form.
pub(crate) fn encode_draft(draft: &BookDraft) -> Result<String, DecodeError> {
	let document = DraftXml {
		isbn: draft.isbn.trim(),
		title: draft.title.trim(),
		author: draft.author.as_deref().map(str::trim).unwrap_or_default(),
		publication_year: draft.publication_year.map(|year| year.to_string()).unwrap_or_default(),
		genre: draft.genre.as_deref().unwrap_or_default(),
		price: draft.price.map(|price| price.to_string()).unwrap_or_default(),
		stock: draft.in_stock,
		format: draft.format.as_deref().unwrap_or_default(),
	};

	quick_xml::se::to_string(&document).map_err(|source| DecodeError::XmlEncode { source })
}

/// Renders a `<delete>` batch.
pub(crate) fn encode_delete(isbns: &[String]) -> Result<String, DecodeError> {
	quick_xml::se::to_string(&DeleteXml { isbn: isbns })
		.map_err(|source| DecodeError::XmlEncode { source })
}

fn from_str<T>(xml: &str) -> Result<T, DecodeError>
where
	T: serde::de::DeserializeOwned,
{
	quick_xml::de::from_str(xml).map_err(|source| DecodeError::Xml { source })
}

fn root_name(xml: &str) -> Result<Option<String>, DecodeError> {
	let mut reader = quick_xml::Reader::from_str(xml);

	loop {
		match reader.read_event() {
			Ok(Event::Start(tag) | Event::Empty(tag)) =>
				return Ok(Some(String::from_utf8_lossy(tag.name().as_ref()).into_owned())),
			Ok(Event::Eof) => return Ok(None),
			Ok(_) => continue,
			Err(e) => return Err(DecodeError::Xml { source: e.into() }),
		}
	}
}

fn non_blank(value: Option<String>) -> Option<String> {
	value.map(|text| text.trim().to_owned()).filter(|text| !text.is_empty())
}

#[derive(Deserialize)]
struct BooksXml {
	#[serde(default)]
	book: Vec<BookXml>,
}

#[derive(Deserialize)]
struct BookXml {
	#[serde(rename = "@isbn", default)]
	isbn: Option<String>,
	#[serde(default)]
	title: Option<String>,
	#[serde(default)]
	author: Option<String>,
	#[serde(default)]
	publication_year: Option<String>,
	#[serde(default)]
	genre: Option<String>,
	#[serde(default)]
	price: Option<String>,
	#[serde(default)]
	stock: Option<String>,
	#[serde(default)]
	format: Option<String>,
	#[serde(default)]
	images: Option<ImagesXml>,
}
impl From<BookXml> for Book {
	fn from(xml: BookXml) -> Self {
		Self {
			isbn: non_blank(xml.isbn),
			title: non_blank(xml.title).unwrap_or_default(),
			author: non_blank(xml.author),
			publication_year: non_blank(xml.publication_year),
			genre: non_blank(xml.genre),
			price: non_blank(xml.price),
			stock: non_blank(xml.stock),
			format: non_blank(xml.format),
			images: xml
				.images
				.map(|images| images.image.into_iter().map(BookImage::from).collect())
				.unwrap_or_default(),
		}
	}
}

#[derive(Deserialize)]
struct ImagesXml {
	#[serde(default)]
	image: Vec<ImageXml>,
}

#[derive(Deserialize)]
struct ImageXml {
	#[serde(rename = "@id", default)]
	id: Option<String>,
	#[serde(default)]
	url: Option<String>,
	#[serde(default)]
	filename: Option<String>,
	#[serde(default)]
	mime_type: Option<String>,
	#[serde(default)]
	size_bytes: Option<String>,
	#[serde(default)]
	uploaded_at: Option<String>,
}
impl From<ImageXml> for BookImage {
	fn from(xml: ImageXml) -> Self {
		Self {
			id: non_blank(xml.id),
			url: non_blank(xml.url),
			filename: non_blank(xml.filename),
			mime_type: non_blank(xml.mime_type),
			size_bytes: non_blank(xml.size_bytes),
			uploaded_at: non_blank(xml.uploaded_at),
		}
	}
}

#[derive(Deserialize)]
struct CatalogXml {
	#[serde(default)]
	id: Option<String>,
	#[serde(default)]
	name: Option<String>,
}

#[derive(Deserialize)]
struct GenresXml {
	#[serde(default)]
	genre: Vec<CatalogXml>,
}

#[derive(Deserialize)]
struct FormatsXml {
	#[serde(default)]
	format: Vec<CatalogXml>,
}

#[derive(Serialize)]
#[serde(rename = "book")]
struct DraftXml<'a> {
	#[serde(rename = "@isbn")]
	isbn: &'a str,
	title: &'a str,
	author: &'a str,
	publication_year: String,
	genre: &'a str,
	price: String,
	stock: bool,
	format: &'a str,
}

#[derive(Serialize)]
#[serde(rename = "delete")]
struct DeleteXml<'a> {
	isbn: &'a [String],
}
