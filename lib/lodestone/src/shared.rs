use std::io;
use std::net::{Shutdown, TcpStream};
use std::time::Duration;

pub type ProtocolResult<T> = Result<T, ProtocolError>;

/// Session-terminating error conditions. Every kind tears the session down;
/// `notice()` distinguishes the kinds reported to the peer from the kinds
/// that close the connection without a word.
#[derive(Debug, Eq, PartialEq)]
pub enum ProtocolError {
    LoginFailed,
    Syntax,
    Logic,
    KeyOutOfRange,
    BudgetExhausted,
    Timeout,
    Io(io::ErrorKind),
}

impl ProtocolError {
    /// Wire notice sent to the peer before closing, where one exists.
    #[inline]
    pub fn notice(&self) -> Option<&'static str> {
        match self {
            ProtocolError::LoginFailed => Some("300 LOGIN FAILED"),
            ProtocolError::Syntax => Some("301 SYNTAX ERROR"),
            ProtocolError::Logic => Some("302 LOGIC ERROR"),
            ProtocolError::KeyOutOfRange => Some("303 KEY OUT OF RANGE"),
            ProtocolError::BudgetExhausted | ProtocolError::Timeout | ProtocolError::Io(_) => None,
        }
    }
}

impl From<io::Error> for ProtocolError {
    #[inline]
    fn from(io_error: io::Error) -> Self {
        match io_error.kind() {
            // Read-deadline expiry surfaces as either kind, per platform
            io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut => ProtocolError::Timeout,
            kind => ProtocolError::Io(kind),
        }
    }
}

/// Byte stream with a settable read deadline.
pub trait Transport: io::Read + io::Write {
    /// Applies `deadline` to every subsequent read until changed again.
    fn set_read_deadline(&mut self, deadline: Option<Duration>) -> io::Result<()>;

    /// Closes both directions of the stream.
    fn shutdown(&mut self) -> io::Result<()>;
}

impl Transport for TcpStream {
    #[inline]
    fn set_read_deadline(&mut self, deadline: Option<Duration>) -> io::Result<()> {
        self.set_read_timeout(deadline)
    }

    #[inline]
    fn shutdown(&mut self) -> io::Result<()> {
        TcpStream::shutdown(self, Shutdown::Both)
    }
}
