//! Request handlers for the `/api/v1` routes.
//!
//! Handlers validate input through `palette_core`, call the providers where
//! needed, and map errors via [`crate::error::AppError`].

pub mod export;
pub mod generation;
pub mod prompts;
pub mod references;
pub mod tags;
pub mod transfer;
