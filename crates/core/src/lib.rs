//! Director's Palette core library.
//!
//! Pure, synchronous building blocks for turning story and music-video
//! breakdowns into export-ready shot lists: variable substitution,
//! prefix/suffix composition, artist-tag normalization, export formats,
//! the single-slot shot transfer channel, dynamic prompt expansion,
//! reference-tag handling and request rate limiting.

pub mod artist_tag;
pub mod breakdown;
pub mod compose;
pub mod dynamic_prompt;
pub mod error;
pub mod export;
pub mod rate_limit;
pub mod references;
pub mod shot;
pub mod transfer;
pub mod types;
pub mod variables;
