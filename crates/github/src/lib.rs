//! GitHub infrastructure adapter.
//!
//! Implements the [`pipeline::RepositoryContents`] and [`pipeline::SecretStore`]
//! ports on one [`GithubClient`], talking to the GitHub REST API with `reqwest`.
//!
//! ## Architectural Layer
//!
//! **Infrastructure.** This crate must not contain domain rules. Authentication
//! headers, status-code mapping, response decoding, and the Git data API
//! sequence details are handled here; the [`pipeline`] crate never sees them.
//!
//! A 404 on a content read is returned as `Ok(None)`. Every other non-2xx
//! response becomes a [`pipeline::RemoteApiError`]. Nothing is retried.

mod client;
mod contents;
mod models;
mod secrets;

pub use client::{GithubClient, GithubClientError, GithubConfig, DEFAULT_API_URL};
