//! # LSB Steganography Implementation
//!
//! Implements text embedding and extraction using Least Significant Bit (LSB) steganography.
//!
//! ## Algorithm
//!
//! The LSB steganography technique hides text within an image by modifying the least
//! significant bit of each color channel (R, G, B) in the image pixels.
//!
//! ### Encoding Process
//! 1. Convert text to bytes and prepend 4-byte length prefix
//! 2. For each bit in the text data:
//!    - Get the next pixel's RGB channels
//!    - Clear the LSB of each channel
//!    - Set the LSB to match the data bit
//!    - Move to next channel (R → G → B → next pixel)
//! 3. Save the modified image as PNG
//!
//! ### Decoding Process
//! 1. Read the first 32 bits (4 bytes) to get the text length
//! 2. Extract the next N bits (where N = length * 8)
//! 3. Convert bits back to bytes and then to UTF-8 string
//!
//! A zero length, a length that does not fit in the image, or bytes that are not
//! UTF-8 all mean "nothing hidden here" rather than an error.
//!
//! ### Capacity
//! An image can store approximately `(width * height * 3) / 8` bytes of text,
//! where 3 represents the RGB channels. The alpha channel is never touched.

use image::{ImageFormat, RgbaImage};
use thiserror::Error;

/// Size of the big-endian length prefix written before the text.
const LENGTH_PREFIX_BYTES: usize = 4;

/// Number of channels per pixel carrying data (R, G, B).
const DATA_CHANNELS: usize = 3;

/// Failures of the bit-embedding primitive.
#[derive(Debug, Error)]
pub enum EmbedError {
    #[error("image too small for this text: need {required_bits} bits but only have {available_bits} bits available")]
    CapacityExceeded {
        required_bits: usize,
        available_bits: usize,
    },

    #[error("could not read image: {0}")]
    Decode(String),

    #[error("could not write image: {0}")]
    Encode(String),
}

/// A black-box capability that hides a string inside an image and recovers it.
///
/// Implementations must be lossless and deterministic: `extract(embed(img, s)) == Some(s)`.
pub trait Embedder: Send + Sync {
    /// Hide `text` in `image_bytes`, returning the encoded image bytes.
    fn embed(&self, image_bytes: &[u8], text: &str) -> Result<Vec<u8>, EmbedError>;

    /// Recover a previously embedded string, or `None` when the image carries nothing.
    fn extract(&self, image_bytes: &[u8]) -> Result<Option<String>, EmbedError>;
}

/// LSB embedder over the RGB channels, always producing PNG output.
#[derive(Debug, Default, Clone, Copy)]
pub struct LsbEmbedder;

impl LsbEmbedder {
    pub fn new() -> Self {
        Self
    }
}

impl Embedder for LsbEmbedder {
    fn embed(&self, image_bytes: &[u8], text: &str) -> Result<Vec<u8>, EmbedError> {
        embed_text_bytes(image_bytes, text)
    }

    fn extract(&self, image_bytes: &[u8]) -> Result<Option<String>, EmbedError> {
        extract_text_bytes(image_bytes)
    }
}

/// Number of payload bits an image of the given dimensions can carry.
pub fn capacity_bits(width: u32, height: u32) -> usize {
    width as usize * height as usize * DATA_CHANNELS
}

fn load_rgba(image_bytes: &[u8]) -> Result<RgbaImage, EmbedError> {
    let img = image::load_from_memory(image_bytes).map_err(|e| EmbedError::Decode(e.to_string()))?;
    Ok(img.to_rgba8())
}

/// Embed text into an image using LSB steganography.
///
/// The text is prefixed with its length (4 bytes, big-endian) and then embedded
/// into the least significant bits of the image's RGB channels.
///
/// # Returns
/// - `Ok(Vec<u8>)`: PNG image bytes with embedded text
/// - `Err(EmbedError::CapacityExceeded)`: image is too small to hold the text
/// - `Err(EmbedError::Decode)`: input is not a readable image
pub fn embed_text_bytes(image_bytes: &[u8], text: &str) -> Result<Vec<u8>, EmbedError> {
    let mut img = load_rgba(image_bytes)?;
    let (width, height) = img.dimensions();

    // Prepare data to embed: [4 bytes length][text bytes]
    let text_bytes = text.as_bytes();
    let length = u32::try_from(text_bytes.len()).map_err(|_| EmbedError::CapacityExceeded {
        required_bits: text_bytes.len().saturating_mul(8),
        available_bits: capacity_bits(width, height),
    })?;
    let mut data_to_embed = Vec::with_capacity(LENGTH_PREFIX_BYTES + text_bytes.len());
    data_to_embed.extend_from_slice(&length.to_be_bytes());
    data_to_embed.extend_from_slice(text_bytes);

    let available_bits = capacity_bits(width, height);
    let required_bits = data_to_embed.len() * 8;
    if required_bits > available_bits {
        return Err(EmbedError::CapacityExceeded {
            required_bits,
            available_bits,
        });
    }

    let mut data_index = 0;
    let mut bit_index = 0;

    'outer: for y in 0..height {
        for x in 0..width {
            if data_index >= data_to_embed.len() {
                break 'outer;
            }

            let pixel = img.get_pixel_mut(x, y);

            for channel in 0..DATA_CHANNELS {
                if data_index >= data_to_embed.len() {
                    break 'outer;
                }

                // MSB first
                let bit = (data_to_embed[data_index] >> (7 - bit_index)) & 1;
                pixel[channel] = (pixel[channel] & 0xFE) | bit;

                bit_index += 1;
                if bit_index == 8 {
                    bit_index = 0;
                    data_index += 1;
                }
            }
        }
    }

    let mut output_bytes = Vec::new();
    img.write_to(
        &mut std::io::Cursor::new(&mut output_bytes),
        ImageFormat::Png,
    )
    .map_err(|e| EmbedError::Encode(e.to_string()))?;

    Ok(output_bytes)
}

/// Extract text that was embedded in an image using LSB steganography.
///
/// Returns `Ok(None)` when the image does not carry a plausible payload.
pub fn extract_text_bytes(image_bytes: &[u8]) -> Result<Option<String>, EmbedError> {
    let img = load_rgba(image_bytes)?;
    let (width, height) = img.dimensions();
    let available_bits = capacity_bits(width, height);

    if available_bits < LENGTH_PREFIX_BYTES * 8 {
        return Ok(None);
    }

    // Every LSB in reading order; the stream is consumed lazily.
    let mut bits = img
        .pixels()
        .flat_map(|pixel| (0..DATA_CHANNELS).map(move |channel| pixel[channel] & 1));

    let mut length_bytes = [0u8; LENGTH_PREFIX_BYTES];
    read_bytes(&mut bits, &mut length_bytes);
    let length = u32::from_be_bytes(length_bytes) as usize;

    if length == 0 || length.saturating_add(LENGTH_PREFIX_BYTES).saturating_mul(8) > available_bits {
        return Ok(None);
    }

    let mut text_bytes = vec![0u8; length];
    read_bytes(&mut bits, &mut text_bytes);

    Ok(String::from_utf8(text_bytes).ok())
}

fn read_bytes(bits: &mut impl Iterator<Item = u8>, out: &mut [u8]) {
    for byte in out.iter_mut() {
        for bit_index in 0..8 {
            let bit = bits.next().unwrap_or(0);
            *byte |= bit << (7 - bit_index);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    fn cover(width: u32, height: u32) -> Vec<u8> {
        let img = RgbImage::from_fn(width, height, |x, y| {
            Rgb([(x * 7 % 256) as u8, (y * 13 % 256) as u8, ((x + y) % 256) as u8])
        });
        let mut bytes = Vec::new();
        img.write_to(&mut std::io::Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();
        bytes
    }

    #[test]
    fn embed_then_extract_recovers_text() {
        let embedder = LsbEmbedder::new();
        let encoded = embedder.embed(&cover(32, 32), "meet at dawn").unwrap();
        assert_eq!(
            embedder.extract(&encoded).unwrap().as_deref(),
            Some("meet at dawn")
        );
    }

    #[test]
    fn unicode_text_survives() {
        let encoded = embed_text_bytes(&cover(40, 40), "café ☕ 秘密").unwrap();
        assert_eq!(
            extract_text_bytes(&encoded).unwrap().as_deref(),
            Some("café ☕ 秘密")
        );
    }

    #[test]
    fn clean_image_has_no_hidden_data() {
        // All-black image: every LSB is zero, so the length prefix reads as 0.
        let img = RgbImage::new(16, 16);
        let mut bytes = Vec::new();
        img.write_to(&mut std::io::Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();
        assert_eq!(extract_text_bytes(&bytes).unwrap(), None);
    }

    #[test]
    fn oversized_length_prefix_reads_as_nothing() {
        // All-white image: every LSB is one, so the prefix claims ~4 GiB.
        let img = RgbImage::from_pixel(16, 16, Rgb([255, 255, 255]));
        let mut bytes = Vec::new();
        img.write_to(&mut std::io::Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();
        assert_eq!(extract_text_bytes(&bytes).unwrap(), None);
    }

    #[test]
    fn capacity_is_enforced() {
        // 4x4 pixels -> 48 bits, the prefix alone takes 32.
        let err = embed_text_bytes(&cover(4, 4), "too long").unwrap_err();
        match err {
            EmbedError::CapacityExceeded {
                required_bits,
                available_bits,
            } => {
                assert_eq!(required_bits, (4 + 8) * 8);
                assert_eq!(available_bits, 48);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn exact_fit_is_accepted() {
        // 8x4 pixels -> 96 bits = 12 bytes = 4 prefix + 8 text.
        assert_eq!(capacity_bits(8, 4), 96);
        let encoded = embed_text_bytes(&cover(8, 4), "12345678").unwrap();
        assert_eq!(
            extract_text_bytes(&encoded).unwrap().as_deref(),
            Some("12345678")
        );
    }

    #[test]
    fn garbage_bytes_are_a_decode_error() {
        assert!(matches!(
            extract_text_bytes(b"definitely not an image"),
            Err(EmbedError::Decode(_))
        ));
        assert!(matches!(
            embed_text_bytes(b"nope", "x"),
            Err(EmbedError::Decode(_))
        ));
    }
}
