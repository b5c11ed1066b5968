//! gdoc2doc - Export Google Docs found with natural-language queries.
//!
//! This library provides functionality to:
//! - List the Google Docs in a user's Drive
//! - Pick the documents matching a free-text query with a language model
//! - Export documents to PDF, DOCX, ODT, RTF, TXT, HTML, EPUB or Markdown
//!
//! # Example
//!
//! ```no_run
//! use gdoc2doc::{Authenticator, DriveClient, ExportFormat, MatcherConfig, QueryMatcher};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let auth = Authenticator::from_json(&std::env::var("GOOGLE-DOCS_JWT_KEY")?)?;
//!     let client = DriveClient::new(auth);
//!
//!     let documents = client.list_documents().await?;
//!     let matcher = QueryMatcher::new(MatcherConfig::new(std::env::var("TOGETHER_API_KEY")?));
//!     let format = ExportFormat::lookup("pdf")?;
//!
//!     for document in matcher.find_matches(&documents, "meeting notes").await? {
//!         client
//!             .export_document(&document.id, &format, format!("{}.pdf", document.name))
//!             .await?;
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod auth;
pub mod client;
pub mod error;
pub mod export;
pub mod formats;
pub mod matcher;
pub mod models;
pub mod selector;

// Re-exports for convenience
pub use auth::Authenticator;
pub use client::DriveClient;
pub use error::{GdocError, Result};
pub use export::{sanitize_filename, Exporter};
pub use formats::ExportFormat;
pub use matcher::{MatcherConfig, QueryMatcher};
pub use models::Document;
pub use selector::Selection;
