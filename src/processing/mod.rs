//! # Image Processing and Steganography
//!
//! The bit-embedding primitive the protocol layer builds on. The protocol only sees
//! the [`Embedder`] trait, so the LSB algorithm can be swapped out independently.

pub mod steganography;

// Re-export main types for convenience
pub use steganography::{EmbedError, Embedder, LsbEmbedder};
