use cam_viewer_common::settings::SettingsError;

use crate::command::Command;
use crate::transport::TransportError;

/// Failures reported by [`DeviceSession`](crate::session::DeviceSession).
///
/// None of these end the process; the session stays usable and the caller
/// may retry.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// Connect was asked for with a blank address. Nothing hits the network.
    #[error("device address is empty")]
    EmptyAddress,
    /// A command was issued before any device address was set.
    #[error("not connected to a device")]
    NotConnected,
    #[error("{command} failed: {source}")]
    Transport {
        command: Command,
        #[source]
        source: TransportError,
    },
    /// The device answered with something other than 200.
    #[error("{command} failed, status code: {status}")]
    Device { command: Command, status: u16 },
    #[error("settings error: {0}")]
    Settings(#[from] SettingsError),
}
