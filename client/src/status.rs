use std::fmt;

use crate::decode::DecodedFrame;

/// Where the stream connection stands.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ConnectionStatus {
    #[default]
    Disconnected,
    Connecting,
    /// Stream headers received from the device at this address.
    Connected(String),
    /// Disconnected because of an error. Carries the error detail.
    Failed(String),
}

impl ConnectionStatus {
    pub fn is_connected(&self) -> bool {
        matches!(self, ConnectionStatus::Connected(_))
    }

    /// Connecting or connected: a stream task owns the connection.
    pub fn is_active(&self) -> bool {
        matches!(
            self,
            ConnectionStatus::Connecting | ConnectionStatus::Connected(_)
        )
    }

    pub fn is_disconnected(&self) -> bool {
        !self.is_active()
    }
}

impl fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionStatus::Disconnected => f.write_str("Disconnected"),
            ConnectionStatus::Connecting => f.write_str("Connecting..."),
            ConnectionStatus::Connected(address) => write!(f, "Connected to: {address}"),
            ConnectionStatus::Failed(reason) => write!(f, "Connection failed: {reason}"),
        }
    }
}

/// Everything a UI needs to draw the session, published as a whole.
#[derive(Debug, Clone, Default)]
pub struct SessionSnapshot {
    pub status: ConnectionStatus,
    /// Latest decoded frame, `None` whenever the stream is down.
    pub frame: Option<DecodedFrame>,
}
