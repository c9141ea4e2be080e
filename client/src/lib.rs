//! Client core for a networked camera: MJPEG stream demuxing, connection
//! lifecycle and device control commands.

pub mod command;
pub mod decode;
pub mod demux;
pub mod error;
pub mod session;
pub mod status;
pub mod transport;

pub use command::Command;
pub use decode::{DecodedFrame, FrameDecoder, JpegDecoder};
pub use demux::{demux, FrameDemuxer};
pub use error::SessionError;
pub use session::DeviceSession;
pub use status::{ConnectionStatus, SessionSnapshot};
pub use transport::{DeviceTransport, HttpTransport, TransportError};
