use std::fmt;

use cam_viewer_common::settings::DeviceKind;

/// Control requests the device firmware understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Light { on: bool },
    Restart,
}

impl Command {
    /// Request path for this command on a device of the given kind.
    pub fn path(&self, kind: DeviceKind) -> String {
        match self {
            Command::Light { on } => {
                format!("{}{}", kind.light_path(), if *on { "on" } else { "off" })
            }
            Command::Restart => "/restart".to_string(),
        }
    }

    /// Confirmation shown to the user after the device answered 200.
    pub fn success_message(&self, kind: DeviceKind) -> String {
        match self {
            Command::Light { on } => {
                format!("{} {}", kind.light_name(), if *on { "on" } else { "off" })
            }
            Command::Restart => "Device is restarting...".to_string(),
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::Light { .. } => f.write_str("light control"),
            Command::Restart => f.write_str("restart"),
        }
    }
}
