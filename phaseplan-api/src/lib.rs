//! # Phaseplan API Server Library
//!
//! HTTP surface for Phaseplan: consultants track projects, split each
//! project's billed hours across phases, and check tasks off until a phase
//! can be completed.
//!
//! ## Modules
//!
//! - `app`: Application state and router builder
//! - `config`: Environment configuration
//! - `error`: Error handling and HTTP response mapping
//! - `middleware`: Security headers
//! - `routes`: API route handlers

pub mod app;
pub mod config;
pub mod error;
pub mod middleware;
pub mod routes;
