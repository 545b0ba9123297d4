use std::fmt;

use serde::{Deserialize, Serialize};

/// Result alias that carries the custom [`CakeError`] type.
pub type Result<T> = std::result::Result<T, CakeError>;

/// Common error type for the core crate.
#[derive(Debug, thiserror::Error)]
pub enum CakeError {
    /// The microphone could not be acquired.
    #[error(transparent)]
    Acquire(#[from] AcquireError),
    /// A configuration value was rejected at construction time.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("{0}")]
    InvalidInput(&'static str),
    /// The birthday song backend refused a command.
    #[error("playback failed: {0}")]
    Playback(String),
    #[error("{0}")]
    Message(String),
    /// Wrapper around standard IO errors.
    #[error("{0}")]
    Io(#[from] std::io::Error),
    #[error("{0}")]
    Json(#[from] serde_json::Error),
    #[error("{0}")]
    Fft(#[from] realfft::FftError),
}

impl CakeError {
    /// Creates a new error that simply wraps the provided message.
    pub fn msg<T: Into<String>>(msg: T) -> Self {
        Self::Message(msg.into())
    }

    pub(crate) fn config<T: Into<String>>(msg: T) -> Self {
        Self::InvalidConfig(msg.into())
    }
}

impl From<&str> for CakeError {
    fn from(value: &str) -> Self {
        Self::msg(value)
    }
}

impl From<String> for CakeError {
    fn from(value: String) -> Self {
        Self::Message(value)
    }
}

/// Why the platform refused to hand over a microphone stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AcquireErrorKind {
    PermissionDenied,
    InsecureContext,
    UnsupportedDevice,
    /// The stream was granted but turned out to be unusable.
    DeviceAcquisitionFailure,
}

impl AcquireErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PermissionDenied => "PermissionDenied",
            Self::InsecureContext => "InsecureContext",
            Self::UnsupportedDevice => "UnsupportedDevice",
            Self::DeviceAcquisitionFailure => "DeviceAcquisitionFailure",
        }
    }
}

impl fmt::Display for AcquireErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where the capture request originated from. Browsers only expose the
/// microphone to secure origins, so the transport scheme travels with every
/// acquisition failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecurityContext {
    pub secure: bool,
    pub scheme: String,
}

impl SecurityContext {
    pub fn new(secure: bool, scheme: impl Into<String>) -> Self {
        Self {
            secure,
            scheme: scheme.into(),
        }
    }

    /// A local, trusted origin.
    pub fn local() -> Self {
        Self::new(true, "file:")
    }
}

/// Acquisition failure with enough context to explain it to a user.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error(
    "name: {kind}\nmessage: {message}\nprotocol: {}\nsecureContext: {}",
    .context.scheme,
    .context.secure
)]
pub struct AcquireError {
    pub kind: AcquireErrorKind,
    pub message: String,
    pub context: SecurityContext,
}

impl AcquireError {
    pub fn new(kind: AcquireErrorKind, message: impl Into<String>, context: SecurityContext) -> Self {
        Self {
            kind,
            message: message.into(),
            context,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn acquire_error_lists_context_fields() {
        let err = AcquireError::new(
            AcquireErrorKind::InsecureContext,
            "microphone requires HTTPS or localhost",
            SecurityContext::new(false, "http:"),
        );

        let rendered = CakeError::from(err).to_string();
        assert!(rendered.contains("name: InsecureContext"));
        assert!(rendered.contains("protocol: http:"));
        assert!(rendered.contains("secureContext: false"));
    }
}
