//! Error types for the IEC 60870-5-104 controlling station.

use std::borrow::Cow;
use thiserror::Error;

/// Result type alias for station operations.
pub type Result<T> = std::result::Result<T, Iec104Error>;

/// IEC 60870-5-104 protocol error types.
///
/// Uses `Cow<'static, str>` to avoid allocations for static error messages.
#[derive(Debug, Error)]
pub enum Iec104Error {
    /// Connection error
    #[error("Connection error: {0}")]
    Connection(Cow<'static, str>),

    /// Not connected to the controlled station
    #[error("Not connected")]
    NotConnected,

    /// Connection timeout
    #[error("Connection timeout")]
    ConnectionTimeout,

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Protocol error
    #[error("Protocol error: {0}")]
    Protocol(Cow<'static, str>),

    /// Invalid frame format (bad start byte, impossible length octet)
    #[error("Invalid frame: {0}")]
    InvalidFrame(Cow<'static, str>),

    /// Invalid ASDU contents
    #[error("Invalid ASDU: {0}")]
    InvalidAsdu(Cow<'static, str>),

    /// Type identification outside the supported set
    #[error("Unknown type ID: {0}")]
    UnknownTypeId(u8),

    /// Cause of transmission outside the supported set
    #[error("Unknown cause of transmission: {0}")]
    UnknownCause(u8),

    /// Receive sequence number did not match the expected value
    #[error("Sequence error: expected VR {expected}, got {actual}")]
    SequenceError { expected: u16, actual: u16 },

    /// Idle timeout: t1 expired on STARTDT, TESTFR or unacknowledged I-frames
    #[error("Idle timeout: {0}")]
    IdleTimeout(Cow<'static, str>),

    /// Send window exhausted (k unacknowledged I-frames outstanding)
    #[error("Too many unconfirmed frames (k={0})")]
    TooManyUnconfirmed(u16),

    /// Encoded ASDU would not fit in a single APDU
    #[error("Encode overflow: ASDU of {0} octets exceeds the APDU limit")]
    EncodeOverflow(usize),

    /// TLS configuration or handshake failure
    #[error("TLS error: {0}")]
    Tls(Cow<'static, str>),

    /// Event channel closed
    #[error("Channel closed")]
    ChannelClosed,
}

impl Iec104Error {
    /// Create a protocol error with a static message (zero allocation).
    #[inline]
    pub const fn protocol_static(msg: &'static str) -> Self {
        Self::Protocol(Cow::Borrowed(msg))
    }

    /// Create a protocol error with a dynamic message.
    #[inline]
    pub fn protocol(msg: impl Into<String>) -> Self {
        Self::Protocol(Cow::Owned(msg.into()))
    }

    /// Create an invalid frame error with a static message (zero allocation).
    #[inline]
    pub const fn invalid_frame_static(msg: &'static str) -> Self {
        Self::InvalidFrame(Cow::Borrowed(msg))
    }

    /// Create an invalid frame error with a dynamic message.
    #[inline]
    pub fn invalid_frame(msg: impl Into<String>) -> Self {
        Self::InvalidFrame(Cow::Owned(msg.into()))
    }

    /// Create an invalid ASDU error with a static message (zero allocation).
    #[inline]
    pub const fn invalid_asdu_static(msg: &'static str) -> Self {
        Self::InvalidAsdu(Cow::Borrowed(msg))
    }

    /// Create an invalid ASDU error with a dynamic message.
    #[inline]
    pub fn invalid_asdu(msg: impl Into<String>) -> Self {
        Self::InvalidAsdu(Cow::Owned(msg.into()))
    }

    /// Create a TLS error with a dynamic message.
    #[inline]
    pub fn tls(msg: impl Into<String>) -> Self {
        Self::Tls(Cow::Owned(msg.into()))
    }

    /// Check if this error tears down the connection.
    #[inline]
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::Connection(_)
                | Self::ConnectionTimeout
                | Self::Io(_)
                | Self::SequenceError { .. }
                | Self::IdleTimeout(_)
                | Self::Tls(_)
        )
    }

    /// Check if the payload in question should merely be traced and dropped.
    #[inline]
    pub fn is_tolerable_asdu(&self) -> bool {
        matches!(
            self,
            Self::UnknownTypeId(_) | Self::UnknownCause(_) | Self::InvalidAsdu(_)
        )
    }
}
