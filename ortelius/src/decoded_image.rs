//! In-memory representation of icon and marker images.

use crate::error::OrteliusError;

/// An image that has been decoded into a raw RGBA buffer.
///
/// Decoding and fetching are external concerns: the engine only ever receives images that are
/// already decoded. The optional `image` feature adds a convenience constructor that decodes
/// common formats from encoded bytes.
#[derive(Debug, Clone)]
pub struct DecodedImage {
    bytes: Vec<u8>,
    dimensions: (u32, u32),
}

impl DecodedImage {
    /// Creates an image from a raw RGBA byte buffer.
    pub fn from_raw(
        bytes: impl Into<Vec<u8>>,
        width: u32,
        height: u32,
    ) -> Result<Self, OrteliusError> {
        let bytes = bytes.into();
        let expected = width as usize * height as usize * 4;
        if bytes.len() != expected {
            return Err(OrteliusError::Generic(format!(
                "invalid image buffer size: expected {expected} bytes, got {}",
                bytes.len()
            )));
        }

        Ok(Self {
            bytes,
            dimensions: (width, height),
        })
    }

    /// Decodes an image from a byte slice.
    ///
    /// Attempts to guess the format of the image from the data. Non-RGBA images will be converted
    /// to RGBA.
    #[cfg(feature = "image")]
    pub fn decode(bytes: &[u8]) -> Result<Self, OrteliusError> {
        use image::GenericImageView;
        let decoded = image::load_from_memory(bytes)?;
        let dimensions = decoded.dimensions();

        Ok(Self {
            bytes: decoded.to_rgba8().into_vec(),
            dimensions,
        })
    }

    /// Raw bytes of the image, in RGBA order.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Width of the image in pixels.
    pub fn width(&self) -> u32 {
        self.dimensions.0
    }

    /// Height of the image in pixels.
    pub fn height(&self) -> u32 {
        self.dimensions.1
    }
}
