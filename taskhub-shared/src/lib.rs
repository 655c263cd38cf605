//! # TaskHub Shared Library
//!
//! This crate contains shared types, utilities, and business logic used by
//! the TaskHub API server.
//!
//! ## Module Organization
//!
//! - `models`: Database models and data structures
//! - `auth`: Authentication utilities (password hashing, JWT)
//! - `db`: Connection pool and migrations

pub mod auth;
pub mod db;
pub mod models;

/// Current version of the TaskHub shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
