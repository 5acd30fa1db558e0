//! Blog platform backend library
//!
//! Exposes the backend modules so integration tests can build the router
//! on top of the in-memory store.

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod repositories;
pub mod routes;
pub mod services;
pub mod state;
