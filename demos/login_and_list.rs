//! Logs in against a mock books API, lists the catalog through an expired-token retry, and
//! logs out. Run with `RUST_LOG=bookshelf_client=debug` to watch the session flows.

// std
use std::sync::Arc;
// crates.io
use color_eyre::Result;
use httpmock::prelude::*;
use serde_json::json;
use tracing_subscriber::EnvFilter;
// self
use bookshelf_client::{
	auth::LoginCredentials,
	books::BooksClient,
	config::ClientConfig,
	http::ReqwestTransport,
	session::Session,
	store::FileStore,
};

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;
	tracing_subscriber::fmt()
		.with_env_filter(
			EnvFilter::try_from_default_env()
				.unwrap_or_else(|_| EnvFilter::new("bookshelf_client=debug")),
		)
		.init();

	let server = MockServer::start_async().await;
	let login = server
		.mock_async(|when, then| {
			when.method(POST).path("/auth/login");
			then.status(200).json_body(json!({ "access_token": "A1", "refresh_token": "R1" }));
		})
		.await;
	let expired = server
		.mock_async(|when, then| {
			when.method(GET).path("/books").header("authorization", "Bearer A1");
			then.status(401).json_body(json!({ "msg": "Token has expired" }));
		})
		.await;
	let refresh = server
		.mock_async(|when, then| {
			when.method(POST).path("/auth/refresh").header("authorization", "Bearer R1");
			then.status(200).json_body(json!({ "access_token": "A2" }));
		})
		.await;

	server
		.mock_async(|when, then| {
			when.method(GET).path("/books").header("authorization", "Bearer A2");
			then.status(200).header("content-type", "application/xml").body(
				"<books><book isbn=\"9780441013593\"><title>Dune</title>\
				 <author>Frank Herbert</author></book></books>",
			);
		})
		.await;
	server
		.mock_async(|when, then| {
			when.method(POST).path("/auth/logout");
			then.status(200).json_body(json!({ "msg": "Logged out" }));
		})
		.await;

	let state_path = std::env::temp_dir().join("bookshelf-client-demo.json");
	let store = Arc::new(FileStore::open(&state_path)?);
	let config = ClientConfig::builder(server.base_url()).build()?;
	let session = Session::restore(config, Arc::new(ReqwestTransport::new()?), store).await?;

	session.login(&LoginCredentials::new("alice", "pw")).await?;

	let books = BooksClient::new(session.clone());

	for book in books.list().await? {
		println!(
			"{} by {} ({}).",
			book.title,
			book.author.as_deref().unwrap_or("unknown author"),
			book.isbn.as_deref().unwrap_or("no ISBN"),
		);
	}

	let outcome = session.logout().await;

	println!("Logged out; server acknowledged: {}.", outcome.revoked_remotely);

	login.assert_async().await;
	expired.assert_async().await;
	refresh.assert_async().await;

	Ok(())
}
