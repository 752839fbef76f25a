use std::fmt;

/// A refresh source could not schedule a callback.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum RegistrationError {
    /// The display service cannot deliver refresh signals right now.
    Unavailable(String),
    /// The source (or the scheduler a handle points to) has shut down.
    Shutdown,
}

impl fmt::Display for RegistrationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unavailable(reason) => write!(f, "refresh signal unavailable: {reason}"),
            Self::Shutdown => f.write_str("refresh signal source has shut down"),
        }
    }
}

impl std::error::Error for RegistrationError {}
