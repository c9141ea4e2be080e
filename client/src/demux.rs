use bytes::{BufMut, BytesMut};
use cam_viewer_common::frame::{Frame, EOI, SOI};
use futures_util::stream::{self, Stream, StreamExt};
use tracing::{debug, warn};

/// Cuts complete JPEG frames out of an unframed MJPEG byte stream.
///
/// The scan is byte-at-a-time and keeps no assumption about how chunks line
/// up with frames:
///
/// 1. When the buffer ends in `FF D8`, a frame starts. Everything buffered
///    before the marker is dropped, including an unfinished frame, and the
///    buffer restarts as exactly `FF D8`.
/// 2. Otherwise, inside a frame, when the buffer ends in `FF D9` the whole
///    buffer is emitted as a [`Frame`] and the buffer is cleared.
/// 3. Anything else is accumulated.
///
/// Bytes seen before the first start marker are never emitted. One demuxer
/// serves one connection; a new connection gets a fresh one.
pub struct FrameDemuxer {
    scratch: BytesMut,
    header_found: bool,
    max_frame_bytes: Option<usize>,
    overflows: u64,
}

impl FrameDemuxer {
    /// Demuxer without a bound on buffered bytes.
    pub fn new() -> Self {
        Self::with_limit(None)
    }

    /// Demuxer that discards its buffer once it grows past `max_frame_bytes`.
    ///
    /// Guards against streams that never present a marker. `Some(0)` is
    /// treated as no bound.
    pub fn with_limit(max_frame_bytes: Option<usize>) -> Self {
        Self {
            scratch: BytesMut::with_capacity(64 * 1024),
            header_found: false,
            max_frame_bytes: max_frame_bytes.filter(|&limit| limit > 0),
            overflows: 0,
        }
    }

    /// Feed one chunk and collect the frames it completes, in stream order.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<Frame> {
        let mut frames = Vec::new();

        for &byte in chunk {
            self.scratch.put_u8(byte);

            if self.scratch.ends_with(&SOI) {
                if self.header_found && self.scratch.len() > SOI.len() {
                    debug!(
                        dropped = self.scratch.len() - SOI.len(),
                        "start marker inside frame, dropping partial frame"
                    );
                }
                self.header_found = true;
                self.scratch.clear();
                self.scratch.extend_from_slice(&SOI);
            } else if self.header_found && self.scratch.ends_with(&EOI) {
                self.header_found = false;
                frames.push(Frame::new(self.scratch.split().freeze()));
            } else if self
                .max_frame_bytes
                .is_some_and(|limit| self.scratch.len() > limit)
            {
                self.overflow();
            }
        }

        frames
    }

    /// Whether a start marker has been seen and a frame is being collected.
    pub fn in_frame(&self) -> bool {
        self.header_found
    }

    /// Bytes currently buffered.
    pub fn buffered(&self) -> usize {
        self.scratch.len()
    }

    /// Number of times the buffer was discarded for exceeding the bound.
    pub fn overflows(&self) -> u64 {
        self.overflows
    }

    fn overflow(&mut self) {
        warn!(
            buffered = self.scratch.len(),
            in_frame = self.header_found,
            "frame buffer exceeded limit, discarding"
        );
        // A trailing 0xFF may be the first half of a marker split by the reset.
        let carry = self.scratch.last() == Some(&0xFF);
        self.scratch.clear();
        if carry {
            self.scratch.put_u8(0xFF);
        }
        self.header_found = false;
        self.overflows += 1;
    }
}

impl Default for FrameDemuxer {
    fn default() -> Self {
        Self::new()
    }
}

/// Turn a stream of byte chunks into a lazy stream of frames.
///
/// Chunk errors are passed through in order; frames completed by earlier
/// chunks are yielded before the error.
pub fn demux<S, B, E>(chunks: S, mut demuxer: FrameDemuxer) -> impl Stream<Item = Result<Frame, E>>
where
    S: Stream<Item = Result<B, E>>,
    B: AsRef<[u8]>,
{
    chunks.flat_map(move |chunk| {
        let items: Vec<Result<Frame, E>> = match chunk {
            Ok(chunk) => demuxer.feed(chunk.as_ref()).into_iter().map(Ok).collect(),
            Err(e) => vec![Err(e)],
        };
        stream::iter(items)
    })
}
