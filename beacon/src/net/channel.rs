use crate::net::buffer::Buffer;
use crate::net::frame::{Command, FULL_POWER, FULL_POWER_LIMIT, RECHARGING};
use lodestone::logging;
use lodestone::shared::{ProtocolError, ProtocolResult, Transport};
use lodestone::DELIMITER;
use std::collections::VecDeque;
use std::io;
use std::io::Write;
use std::time::Duration;

const READ_BUF_SIZE: usize = 65536;
// Upper bound on a single read off the wire
const READ_CHUNK: usize = 512;

/// Represents a communication channel with a single robot client. All
/// traffic on the channel is delimited text; every read is guarded by the
/// deadline currently applied to the transport.
///
/// The channel owns the two lower protocol layers: framing (re-assembly of
/// delimited messages out of arbitrary TCP chunks, with early rejection of
/// over-long responses) and the recharge filter (absorbing
/// `RECHARGING`/`FULL POWER` pairs so callers never see them).
pub struct Channel<T: Transport> {
    stream: T,

    // Fully framed responses awaiting consumption
    pending: VecDeque<String>,
    // Bytes past the last delimiter, awaiting completion
    read_buffer: Buffer,
    // Most recent response consumed, gates the recharge sub-state
    last_response: String,

    // Log
    log: logging::Logger,
}

impl<T: Transport> Channel<T> {
    pub const NORMAL_TIMEOUT: Duration = Duration::from_secs(1);
    pub const RECHARGING_TIMEOUT: Duration = Duration::from_secs(5);

    #[inline]
    pub fn new<'a, L: Into<Option<&'a logging::Logger>>>(stream: T, log: L) -> Channel<T> {
        let channel_log = match log.into() {
            Some(log) => log.new(logging::o!()),
            _ => logging::Logger::root(logging::Discard, logging::o!()),
        };

        Channel {
            stream,
            pending: VecDeque::new(),
            read_buffer: Buffer::new(READ_BUF_SIZE),
            last_response: String::new(),
            log: channel_log,
        }
    }

    /// Applies the normal read deadline. Must be called before the first
    /// exchange on a fresh connection.
    #[inline]
    pub fn open(&mut self) -> ProtocolResult<()> {
        self.stream.set_read_deadline(Some(Self::NORMAL_TIMEOUT))?;

        logging::debug!(self.log, "channel opened"; "context" => "open");

        Ok(())
    }

    /// Closes the channel, sending the supplied notice first when one is
    /// given. Failures past this point are moot and ignored.
    pub fn close(mut self, notice: Option<&str>) {
        if let Some(notice) = notice {
            logging::debug!(self.log, "notifying client"; "context" => "close", "notice" => %notice);
            drop(self.transmit(notice));
        }

        if !self.read_buffer.is_empty() || !self.pending.is_empty() {
            logging::debug!(self.log, "discarding unread data";
                            "context" => "close",
                            "queued" => self.pending.len(),
                            "read_size" => self.read_buffer.len());
        }

        self.pending.clear();
        self.read_buffer.clear();

        drop(self.stream.shutdown());

        logging::debug!(self.log, "channel closed"; "context" => "close");
    }

    /// Issues a command to the client.
    pub fn send(&mut self, command: Command) -> ProtocolResult<()> {
        logging::trace!(self.log, "sending command"; "context" => "send", "command" => ?command);

        command.write(&mut self.stream)?;
        self.stream.flush().map_err(Into::into)
    }

    /// Writes a raw message followed by the delimiter.
    fn transmit(&mut self, message: &str) -> ProtocolResult<()> {
        self.stream.write_all(message.as_bytes())?;
        self.stream.write_all(&DELIMITER)?;
        self.stream.flush().map_err(Into::into)
    }

    /// Returns the next response, transparently absorbing any
    /// `RECHARGING`/`FULL POWER` interleave along the way. `cap` bounds the
    /// number of bytes a freshly accumulated response may occupy, delimiter
    /// included; `None` disables the bound.
    pub fn read_response(&mut self, cap: Option<usize>) -> ProtocolResult<String> {
        loop {
            let response = self.next_response(cap)?;

            // After RECHARGING the client may announce nothing but FULL POWER
            if self.last_response == RECHARGING && response != FULL_POWER {
                return Err(ProtocolError::Logic);
            }

            if response == RECHARGING {
                logging::trace!(self.log, "client recharging"; "context" => "read");

                self.remember(RECHARGING);
                self.stream.set_read_deadline(Some(Self::RECHARGING_TIMEOUT))?;

                let resumed = self.next_response(Some(FULL_POWER_LIMIT))?;
                if resumed != FULL_POWER {
                    return Err(ProtocolError::Logic);
                }

                self.remember(FULL_POWER);
                self.stream.set_read_deadline(Some(Self::NORMAL_TIMEOUT))?;

                logging::trace!(self.log, "client resumed"; "context" => "read");

                // Go back for the response the caller is actually awaiting
                continue;
            }

            self.remember(&response);

            return Ok(response);
        }
    }

    #[inline]
    fn remember(&mut self, response: &str) {
        self.last_response.clear();
        self.last_response.push_str(response);
    }

    /// Takes the next fully framed response, reading off the wire as needed.
    /// Queued responses are served as-is; the cap applies to freshly
    /// accumulated bytes only.
    fn next_response(&mut self, cap: Option<usize>) -> ProtocolResult<String> {
        if let Some(response) = self.pending.pop_front() {
            logging::trace!(self.log, "response served from queue";
                            "context" => "read",
                            "response" => %response);
            return Ok(response);
        }

        loop {
            let received = self.read_buffer.ingress(&mut self.stream, READ_CHUNK)?;

            if received == 0 {
                return Err(ProtocolError::Io(io::ErrorKind::UnexpectedEof));
            }

            self.collect_frames()?;

            if let Some(response) = self.pending.pop_front() {
                logging::trace!(self.log, "response received";
                                "context" => "read",
                                "response" => %response);
                return Ok(response);
            }

            if let Some(limit) = cap {
                if self.read_buffer.len() >= limit {
                    logging::debug!(self.log, "unterminated response exceeded cap";
                                    "context" => "read",
                                    "cap" => limit,
                                    "buffered" => self.read_buffer.len());
                    return Err(ProtocolError::Syntax);
                }
            }
        }
    }

    /// Splits out every complete message currently in the read buffer. The
    /// trailing bytes past the last delimiter stay buffered.
    fn collect_frames(&mut self) -> ProtocolResult<()> {
        loop {
            let boundary = self
                .read_buffer
                .read_slice()
                .windows(DELIMITER.len())
                .position(|window| window == &DELIMITER[..]);

            let boundary = match boundary {
                Some(boundary) => boundary,
                None => return Ok(()),
            };

            let message = self.read_buffer.read_slice()[..boundary].to_vec();
            let message = String::from_utf8(message).map_err(|_| ProtocolError::Syntax)?;

            self.read_buffer.move_head(boundary + DELIMITER.len());
            self.pending.push_back(message);
        }
    }
}
