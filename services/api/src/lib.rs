//! services/api/src/lib.rs
//!
//! Library half of the contact tracker API: configuration, storage adapters,
//! credential hashing and the axum web layer. The `api` binary wires them up.

pub mod adapters;
pub mod config;
pub mod error;
pub mod security;
pub mod web;
