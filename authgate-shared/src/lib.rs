//! # AuthGate Shared Library
//!
//! Domain logic of the AuthGate authentication service: storage, password
//! hashing, sessions, OAuth, route classification and form actions. The HTTP
//! surface lives in `authgate-api`.
//!
//! ## Module Organization
//!
//! - `models`: Database models and data structures
//! - `db`: Connection pool and migrations
//! - `adapter`: Storage backends (Postgres, in-memory)
//! - `data`: User lookup helpers
//! - `auth`: Passwords, credentials, sessions, OAuth
//! - `schemas`: Form validation
//! - `routes`: Route classification for the route guard
//! - `actions`: Register / login / logout

pub mod actions;
pub mod adapter;
pub mod auth;
pub mod data;
pub mod db;
pub mod models;
pub mod routes;
pub mod schemas;

/// Current version of the AuthGate shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
