use std::io::Cursor;
use std::sync::Arc;

use cam_viewer_common::frame::{Frame, TimestampedFrame};
use image::{DynamicImage, ImageFormat, ImageReader};

/// Turns a demuxed frame into pixels.
pub trait FrameDecoder: Send + Sync {
    fn decode(&self, frame: &Frame) -> Result<DynamicImage, DecodeError>;
}

/// Decodes baseline JPEG with the `image` crate.
#[derive(Debug, Default, Clone, Copy)]
pub struct JpegDecoder;

impl FrameDecoder for JpegDecoder {
    fn decode(&self, frame: &Frame) -> Result<DynamicImage, DecodeError> {
        let mut reader = ImageReader::new(Cursor::new(frame.as_bytes()));
        reader.set_format(ImageFormat::Jpeg);
        Ok(reader.decode()?)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("failed to decode frame: {0}")]
    Image(#[from] image::ImageError),
}

/// A frame ready for display: the original JPEG plus its decoded pixels.
#[derive(Debug, Clone)]
pub struct DecodedFrame {
    pub stamped: TimestampedFrame,
    pub image: Arc<DynamicImage>,
}

impl DecodedFrame {
    pub fn new(stamped: TimestampedFrame, image: DynamicImage) -> Self {
        Self {
            stamped,
            image: Arc::new(image),
        }
    }

    pub fn seq(&self) -> u64 {
        self.stamped.seq
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn jpeg(&self) -> &[u8] {
        self.stamped.frame.as_bytes()
    }
}

/// Encode a small solid-colour JPEG for tests.
#[cfg(test)]
pub(crate) fn test_jpeg(width: u32, height: u32) -> Vec<u8> {
    let img = image::RgbImage::from_pixel(width, height, image::Rgb([200, 40, 40]));
    let mut out = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(img)
        .write_to(&mut out, ImageFormat::Jpeg)
        .unwrap();
    out.into_inner()
}
