//! Test doubles for driving the protocol stack without sockets. Both
//! transports are cheaply cloneable handles over shared state, so a test can
//! keep inspecting writes and deadline changes after the driver has consumed
//! its copy.

use crate::robot::auth;
use crate::robot::nav::Heading;
use hashbrown::HashSet;
use lodestone::shared::Transport;
use lodestone::DELIMITER;
use std::cell::RefCell;
use std::cmp::min;
use std::collections::VecDeque;
use std::io;
use std::rc::Rc;
use std::time::Duration;

/// Behavior of a scripted transport once its input runs dry.
#[derive(Copy, Clone, Eq, PartialEq)]
enum Exhausted {
    /// Surface a read-deadline expiry.
    TimedOut,
    /// Surface a peer close.
    Eof,
}

struct MockInner {
    chunks: VecDeque<Vec<u8>>,
    exhausted: Exhausted,
    written: Vec<u8>,
    deadlines: Vec<Option<Duration>>,
    shutdown_count: usize,
}

/// Scripted transport: each `read` call serves at most one pre-arranged
/// chunk; writes and deadline changes are recorded for assertions.
#[derive(Clone)]
pub struct MockStream(Rc<RefCell<MockInner>>);

impl MockStream {
    pub fn new<I, C>(chunks: I) -> MockStream
    where
        I: IntoIterator<Item = C>,
        C: Into<Vec<u8>>,
    {
        MockStream(Rc::new(RefCell::new(MockInner {
            chunks: chunks.into_iter().map(Into::into).collect(),
            exhausted: Exhausted::TimedOut,
            written: Vec::new(),
            deadlines: Vec::new(),
            shutdown_count: 0,
        })))
    }

    /// Report end-of-stream instead of a timeout once the script runs out.
    pub fn eof_when_exhausted(self) -> MockStream {
        self.0.borrow_mut().exhausted = Exhausted::Eof;
        self
    }

    pub fn written(&self) -> Vec<u8> {
        self.0.borrow().written.clone()
    }

    pub fn deadlines(&self) -> Vec<Option<Duration>> {
        self.0.borrow().deadlines.clone()
    }

    pub fn shutdown_count(&self) -> usize {
        self.0.borrow().shutdown_count
    }
}

impl io::Read for MockStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let mut inner = self.0.borrow_mut();

        let mut chunk = match inner.chunks.pop_front() {
            Some(chunk) => chunk,
            None => {
                return match inner.exhausted {
                    Exhausted::TimedOut => Err(io::ErrorKind::WouldBlock.into()),
                    Exhausted::Eof => Ok(0),
                };
            }
        };

        let count = min(buf.len(), chunk.len());
        buf[..count].copy_from_slice(&chunk[..count]);

        if count < chunk.len() {
            inner.chunks.push_front(chunk.split_off(count));
        }

        Ok(count)
    }
}

impl io::Write for MockStream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.borrow_mut().written.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Transport for MockStream {
    fn set_read_deadline(&mut self, deadline: Option<Duration>) -> io::Result<()> {
        self.0.borrow_mut().deadlines.push(deadline);
        Ok(())
    }

    fn shutdown(&mut self) -> io::Result<()> {
        self.0.borrow_mut().shutdown_count += 1;
        Ok(())
    }
}

struct SimulatorInner {
    username: &'static str,
    key: usize,
    secret: &'static str,
    bad_confirmation: bool,

    position: (i64, i64),
    facing: (i64, i64),
    obstacles: HashSet<(i64, i64)>,

    started: bool,
    inbox: Vec<u8>,
    outbox: VecDeque<u8>,

    recharge_before: Option<usize>,
    responses: usize,

    logged_out: bool,
    notices: Vec<String>,
    deadlines: Vec<Option<Duration>>,
}

/// Scripted robot client living on a small grid. Parses the commands the
/// driver sends, answers the way a compliant robot would, and can wedge a
/// recharge exchange in front of a chosen response or lie during the
/// handshake.
#[derive(Clone)]
pub struct Simulator(Rc<RefCell<SimulatorInner>>);

impl Simulator {
    pub fn new(username: &'static str, key: usize, secret: &'static str) -> Simulator {
        Simulator(Rc::new(RefCell::new(SimulatorInner {
            username,
            key,
            secret,
            bad_confirmation: false,
            position: (0, 0),
            facing: delta(Heading::North),
            obstacles: HashSet::new(),
            started: false,
            inbox: Vec::new(),
            outbox: VecDeque::new(),
            recharge_before: None,
            responses: 0,
            logged_out: false,
            notices: Vec::new(),
            deadlines: Vec::new(),
        })))
    }

    pub fn at(self, x: i64, y: i64) -> Simulator {
        self.0.borrow_mut().position = (x, y);
        self
    }

    pub fn facing(self, heading: Heading) -> Simulator {
        self.0.borrow_mut().facing = delta(heading);
        self
    }

    pub fn obstacles(self, cells: &[(i64, i64)]) -> Simulator {
        self.0.borrow_mut().obstacles = cells.iter().cloned().collect();
        self
    }

    /// Inject a `RECHARGING`/`FULL POWER` exchange in front of the response
    /// with the given ordinal (the username is response zero).
    pub fn recharge_before(self, ordinal: usize) -> Simulator {
        self.0.borrow_mut().recharge_before = Some(ordinal);
        self
    }

    /// Answer the hash challenge with an off-by-one confirmation.
    pub fn with_bad_confirmation(self) -> Simulator {
        self.0.borrow_mut().bad_confirmation = true;
        self
    }

    pub fn position(&self) -> (i64, i64) {
        self.0.borrow().position
    }

    pub fn logged_out(&self) -> bool {
        self.0.borrow().logged_out
    }

    /// Error notices the driver delivered instead of a command.
    pub fn notices(&self) -> Vec<String> {
        self.0.borrow().notices.clone()
    }

    pub fn deadlines(&self) -> Vec<Option<Duration>> {
        self.0.borrow().deadlines.clone()
    }
}

/// Unit displacement of a move along the given heading.
fn delta(heading: Heading) -> (i64, i64) {
    match heading {
        Heading::North => (0, 1),
        Heading::East => (1, 0),
        Heading::South => (0, -1),
        Heading::West => (-1, 0),
    }
}

impl SimulatorInner {
    fn respond(&mut self, body: &str) {
        if self.recharge_before == Some(self.responses) {
            self.enqueue("RECHARGING");
            self.enqueue("FULL POWER");
        }

        self.enqueue(body);
        self.responses += 1;
    }

    fn enqueue(&mut self, body: &str) {
        self.outbox.extend(body.as_bytes());
        self.outbox.extend(&DELIMITER);
    }

    fn confirm_position(&mut self) {
        let confirmation = format!("OK {} {}", self.position.0, self.position.1);
        self.respond(&confirmation);
    }

    /// Handles every complete command sitting in the inbox.
    fn pump(&mut self) {
        loop {
            let boundary = self
                .inbox
                .windows(DELIMITER.len())
                .position(|window| window == &DELIMITER[..]);

            let boundary = match boundary {
                Some(boundary) => boundary,
                None => return,
            };

            let line = String::from_utf8(self.inbox[..boundary].to_vec()).expect("non-utf8 command");
            self.inbox.drain(..boundary + DELIMITER.len());

            self.handle(&line);
        }
    }

    fn handle(&mut self, command: &str) {
        match command {
            "107 KEY REQUEST" => {
                let key = self.key.to_string();
                self.respond(&key);
            }
            "200 OK" => (),
            "102 MOVE" => {
                let target = (self.position.0 + self.facing.0, self.position.1 + self.facing.1);

                if !self.obstacles.contains(&target) {
                    self.position = target;
                }

                self.confirm_position();
            }
            "103 TURN LEFT" => {
                self.facing = (-self.facing.1, self.facing.0);
                self.confirm_position();
            }
            "104 TURN RIGHT" => {
                self.facing = (self.facing.1, -self.facing.0);
                self.confirm_position();
            }
            "105 GET MESSAGE" => {
                let secret = self.secret;
                self.respond(secret);
            }
            "106 LOGOUT" => self.logged_out = true,
            other => match other.parse::<u32>() {
                // The hash challenge is the only numeric message we receive
                Ok(hash) => {
                    let username_hash = auth::username_hash(self.username);
                    let pair = auth::KEY_PAIRS[self.key];

                    assert_eq!(hash, u32::from(auth::offset_hash(username_hash, pair.server)));

                    let mut confirmation = u32::from(auth::offset_hash(username_hash, pair.client));
                    if self.bad_confirmation {
                        confirmation += 1;
                    }

                    let confirmation = confirmation.to_string();
                    self.respond(&confirmation);
                }
                Err(_) => self.notices.push(other.to_string()),
            },
        }
    }
}

impl io::Read for Simulator {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let mut inner = self.0.borrow_mut();

        if !inner.started {
            inner.started = true;
            let username = inner.username;
            inner.respond(username);
        }

        if inner.outbox.is_empty() {
            return Err(io::ErrorKind::WouldBlock.into());
        }

        let mut count = 0;

        while count < buf.len() {
            match inner.outbox.pop_front() {
                Some(byte) => {
                    buf[count] = byte;
                    count += 1;
                }
                None => break,
            }
        }

        Ok(count)
    }
}

impl io::Write for Simulator {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut inner = self.0.borrow_mut();

        inner.inbox.extend_from_slice(buf);
        inner.pump();

        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Transport for Simulator {
    fn set_read_deadline(&mut self, deadline: Option<Duration>) -> io::Result<()> {
        self.0.borrow_mut().deadlines.push(deadline);
        Ok(())
    }

    fn shutdown(&mut self) -> io::Result<()> {
        Ok(())
    }
}
