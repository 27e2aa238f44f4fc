/// API route handlers
///
/// This module contains all route handlers organized by resource:
///
/// - `health`: Health check endpoint
/// - `auth`: Registration, sign-in, session and password reset
/// - `projects`: Project CRUD and project detail
/// - `phases`: Phase creation, budget and completion changes
/// - `tasks`: Task CRUD
///
/// Handlers that take an `:id` check ownership before decoding the body, so
/// they extract `Result<Json<T>, JsonRejection>` and apply `?` afterwards.

pub mod auth;
pub mod health;
pub mod input;
pub mod phases;
pub mod projects;
pub mod tasks;

use crate::error::ApiError;
use axum::extract::FromRequest;

/// `Json` extractor whose rejections render as [`ApiError`] (400)
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);
