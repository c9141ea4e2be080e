use bytes::Bytes;

/// JPEG start-of-image marker.
pub const SOI: [u8; 2] = [0xFF, 0xD8];
/// JPEG end-of-image marker.
pub const EOI: [u8; 2] = [0xFF, 0xD9];

/// One complete JPEG image cut out of an MJPEG stream.
///
/// The buffer runs from the `FF D8` start marker through the `FF D9` end
/// marker inclusive. It is immutable once built; cloning shares the bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    data: Bytes,
}

impl Frame {
    pub fn new(data: impl Into<Bytes>) -> Self {
        Self { data: data.into() }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn into_bytes(self) -> Bytes {
        self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Returns true if the buffer is delimited by the JPEG start and end markers.
    pub fn has_jpeg_markers(&self) -> bool {
        self.data.len() >= 4 && self.data.starts_with(&SOI) && self.data.ends_with(&EOI)
    }
}

impl AsRef<[u8]> for Frame {
    fn as_ref(&self) -> &[u8] {
        &self.data
    }
}

/// A frame stamped with its arrival time and its position in the stream.
#[derive(Debug, Clone)]
pub struct TimestampedFrame {
    pub frame: Frame,
    pub captured_at_ms: i64,
    /// Zero-based index among frames published on one connection.
    pub seq: u64,
}

impl TimestampedFrame {
    /// Stamp a frame with the current wall-clock time.
    pub fn now(frame: Frame, seq: u64) -> Self {
        Self::new(frame, chrono::Utc::now().timestamp_millis(), seq)
    }

    pub fn new(frame: Frame, captured_at_ms: i64, seq: u64) -> Self {
        Self {
            frame,
            captured_at_ms,
            seq,
        }
    }

    /// File name for saving this frame to disk.
    pub fn file_name(&self) -> String {
        let dt = chrono::DateTime::from_timestamp_millis(self.captured_at_ms)
            .unwrap_or_else(chrono::Utc::now);
        let ts = dt.format("%Y%m%dT%H%M%S%3fZ");
        format!("{ts}_{seq:06}.jpg", seq = self.seq)
    }
}
