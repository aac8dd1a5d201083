//! Image Decoder
//!
//! base64 payload (raw or `data:image/...;base64,` prefixed) -> RGB image ->
//! fixed-size NHWC tensor with values in [0, 1].

use base64::{prelude::BASE64_STANDARD, Engine};
use image::{imageops::FilterType, RgbImage};
use ndarray::Array4;
use thiserror::Error;

/// Model input edge length (pixels)
pub const IMG_SIZE: u32 = 224;

/// Model input: (1, size, size, 3), channels last
pub type ImageTensor = Array4<f32>;

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("No image data provided")]
    Empty,

    #[error("Invalid base64 image data: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("Unsupported or corrupt image: {0}")]
    Image(#[from] image::ImageError),
}

/// Drop a data-URL header if present
pub fn strip_data_url(payload: &str) -> &str {
    match payload.split_once(',') {
        Some((_, data)) => data,
        None => payload,
    }
}

/// Decode a raw or data-URL base64 payload into bytes
pub fn decode_base64(payload: &str) -> Result<Vec<u8>, DecodeError> {
    let data = strip_data_url(payload).trim();
    if data.is_empty() {
        return Err(DecodeError::Empty);
    }

    // Browsers may wrap long payloads
    let compact: String = data.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    Ok(BASE64_STANDARD.decode(compact)?)
}

#[derive(Debug, Clone, Copy)]
pub struct ImageDecoder {
    size: u32,
}

impl Default for ImageDecoder {
    fn default() -> Self {
        Self::new(IMG_SIZE)
    }
}

impl ImageDecoder {
    pub fn new(size: u32) -> Self {
        Self { size }
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    /// base64 payload -> tensor
    pub fn decode(&self, payload: &str) -> Result<ImageTensor, DecodeError> {
        let bytes = decode_base64(payload)?;
        self.to_tensor(&bytes)
    }

    /// Encoded image bytes (JPEG, PNG, ...) -> tensor
    pub fn to_tensor(&self, bytes: &[u8]) -> Result<ImageTensor, DecodeError> {
        if bytes.is_empty() {
            return Err(DecodeError::Empty);
        }

        let rgb = image::load_from_memory(bytes)?.to_rgb8();
        Ok(self.rgb_to_tensor(&rgb))
    }

    pub fn rgb_to_tensor(&self, rgb: &RgbImage) -> ImageTensor {
        let n = self.size as usize;
        let resized = image::imageops::resize(rgb, self.size, self.size, FilterType::Triangle);

        let mut tensor = Array4::<f32>::zeros((1, n, n, 3));
        for (x, y, pixel) in resized.enumerate_pixels() {
            for c in 0..3 {
                tensor[[0, y as usize, x as usize, c]] = pixel[c] as f32 / 255.0;
            }
        }
        tensor
    }
}
