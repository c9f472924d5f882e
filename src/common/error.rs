// src/common/error.rs

use embedded_hal::i2c::ErrorKind;

/// Failure of the bus transport underneath the sensor.
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    /// The bus device could not be opened (missing, no permission, wrong bus).
    #[error("cannot open {device}: {reason}")]
    Unreachable { device: String, reason: String },

    /// A transfer on an open bus failed (NACK, arbitration loss, ...).
    #[error("I2C {operation} failed: {kind:?}")]
    Bus {
        operation: &'static str,
        kind: ErrorKind,
    },
}

/// The device answered, but the answer could not be decoded.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ProtocolError {
    /// Received CRC does not match calculated CRC.
    #[error("CRC mismatch: expected {expected:#04x}, calculated {calculated:#04x}")]
    CrcMismatch { expected: u8, calculated: u8 },

    /// Fewer bytes than the command's response length.
    #[error("short response: expected {expected} bytes, got {got}")]
    ShortResponse { expected: usize, got: usize },

    /// A decoded field holds a value the device never reports (e.g. NaN).
    #[error("invalid value in field {field}")]
    InvalidValue { field: &'static str },
}

/// A handler rejected a value delivered to it.
#[derive(Debug, thiserror::Error)]
#[error("handler failed: {source}")]
pub struct HandlerError {
    #[source]
    source: Box<dyn std::error::Error + Send + Sync>,
}

impl HandlerError {
    pub fn new<E>(source: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        Self {
            source: source.into(),
        }
    }
}

/// Malformed input supplied by the caller, rejected before the device is touched.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ArgumentError {
    #[error("invalid number of arguments: expected {expected}, got {got}")]
    ArgumentCount { expected: &'static str, got: usize },

    #[error("invalid number for {name}: '{value}'")]
    InvalidNumber { name: &'static str, value: String },

    #[error("{name} {value} outside range [{min}, {max}]")]
    OutOfRange {
        name: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("invalid 7-bit I2C address: {0:#04x}")]
    InvalidAddress(u16),

    #[error("unknown log level '{0}'; valid options are: fatal, error, warn, info, debug")]
    UnknownLogLevel(String),

    #[error("unknown flag '{0}'")]
    UnknownFlag(String),

    #[error("missing value for flag '{0}'")]
    MissingFlagValue(String),

    #[error("unknown command '{0}'")]
    UnknownCommand(String),

    #[error("no command given")]
    MissingCommand,
}

/// Top-level error returned by sensor operations, consumers and process groups.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("port error: {0}")]
    Port(#[from] PortError),

    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error(transparent)]
    Handler(#[from] HandlerError),

    #[error("invalid argument: {0}")]
    Argument(#[from] ArgumentError),

    /// The operation's context was cancelled before it completed.
    #[error("operation cancelled")]
    Cancelled,

    /// `run` was called on a sensor that is running or already stopped.
    #[error("sensor run already started")]
    AlreadyStarted,
}

// --- Unit Tests ---
#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[derive(Debug)]
    struct MockSinkError;
    impl std::fmt::Display for MockSinkError {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result { write!(f, "sink full") }
    }
    impl std::error::Error for MockSinkError {}

    #[test]
    fn test_handler_error_keeps_source() {
        let err = Error::from(HandlerError::new(MockSinkError));
        assert_eq!(err.to_string(), "handler failed: sink full");
        let handler = match &err {
            Error::Handler(h) => h,
            other => panic!("unexpected variant {other:?}"),
        };
        assert_eq!(handler.source().unwrap().to_string(), "sink full");
    }

    #[test]
    fn test_handler_error_from_str() {
        let err = HandlerError::new("bad value");
        assert_eq!(err.to_string(), "handler failed: bad value");
    }

    #[test]
    fn test_display_messages() {
        let crc = Error::from(ProtocolError::CrcMismatch { expected: 0x92, calculated: 0x10 });
        assert_eq!(crc.to_string(), "protocol error: CRC mismatch: expected 0x92, calculated 0x10");

        let port = Error::from(PortError::Bus { operation: "read", kind: ErrorKind::Other });
        assert_eq!(port.to_string(), "port error: I2C read failed: Other");

        let arg = Error::from(ArgumentError::ArgumentCount { expected: "0 or 1", got: 2 });
        assert_eq!(arg.to_string(), "invalid argument: invalid number of arguments: expected 0 or 1, got 2");
    }
}
