//! HTTP clients for the upstream AI services.
//!
//! - [`openai`]: chat completions, used for reference extraction.
//! - [`replicate`]: image/video predictions with fixed-interval polling.

pub mod error;
pub mod openai;
pub mod replicate;

mod http;

pub use error::ProviderError;
