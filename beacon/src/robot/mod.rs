//! The per-connection driver: authenticates a freshly connected robot, then
//! pilots it to the beacon coordinate and collects its secret.

pub mod auth;
pub mod nav;

use crate::net::channel::Channel;
use crate::net::frame::{self, Command};
use crate::robot::nav::{Axis, Heading, Position};
use lodestone::logging;
use lodestone::shared::{ProtocolError, ProtocolResult, Transport};

/// Upper bound on collisions tolerated within a single session.
const COLLISION_LIMIT: u32 = 20;

/// Drives a single robot client from wherever it woke up to the origin of
/// the grid. One instance per connection; instances share nothing.
pub struct Robot<T: Transport> {
    channel: Channel<T>,
    position: Position,
    heading: Heading,
    collisions: u32,
    log: logging::Logger,
}

impl<T: Transport> Robot<T> {
    #[inline]
    pub fn new<'a, L: Into<Option<&'a logging::Logger>>>(stream: T, log: L) -> Robot<T> {
        let log = match log.into() {
            Some(log) => log.new(logging::o!()),
            _ => logging::Logger::root(logging::Discard, logging::o!()),
        };

        Robot {
            channel: Channel::new(stream, &log),
            position: Position::ORIGIN,
            heading: Heading::North,
            collisions: 0,
            log,
        }
    }

    /// Runs the session to completion. Wire-reportable failures are sent to
    /// the client before closing; timeouts, transport failures and an
    /// exhausted collision budget close the connection without a word.
    pub fn run(mut self) {
        match self.pilot() {
            Ok(secret) => {
                println!("{}", secret);

                logging::info!(self.log, "secret retrieved"; "context" => "run", "secret" => %secret);

                self.channel.close(None);
            }
            Err(error) => {
                logging::warn!(self.log, "session failed"; "context" => "run", "error" => ?error);

                self.channel.close(error.notice());
            }
        }
    }

    fn pilot(&mut self) -> ProtocolResult<String> {
        self.channel.open()?;
        self.authenticate()?;
        self.locate()?;
        self.navigate()?;
        self.retrieve()
    }

    /// Username + keyed hash exchange.
    fn authenticate(&mut self) -> ProtocolResult<()> {
        let username = self.channel.read_response(Some(frame::USERNAME_LIMIT))?;

        if username.len() > auth::USERNAME_MAX {
            return Err(ProtocolError::Syntax);
        }

        self.channel.send(Command::KeyRequest)?;

        let key = self.channel.read_response(Some(frame::KEY_LIMIT))?;
        let pair = auth::key_pair(&key)?;

        let username_hash = auth::username_hash(&username);

        self.channel
            .send(Command::ServerHash(auth::offset_hash(username_hash, pair.server)))?;

        let confirmation = self.channel.read_response(Some(frame::CONFIRMATION_LIMIT))?;
        auth::verify_confirmation(&confirmation, username_hash, pair.client)?;

        self.channel.send(Command::AuthOk)?;

        logging::debug!(self.log, "robot authenticated";
                        "context" => "authenticate",
                        "username" => %username);

        Ok(())
    }

    /// Issues a movement command and records the confirmed position.
    fn step(&mut self, command: Command) -> ProtocolResult<()> {
        self.channel.send(command)?;

        let confirmation = self.channel.read_response(Some(frame::MOVEMENT_LIMIT))?;
        self.position = Position::parse(&confirmation)?;

        Ok(())
    }

    /// Books a collision against the session budget.
    fn bump(&mut self) -> ProtocolResult<()> {
        self.collisions += 1;

        logging::debug!(self.log, "collision"; "context" => "navigate", "collisions" => self.collisions);

        if self.collisions > COLLISION_LIMIT {
            return Err(ProtocolError::BudgetExhausted);
        }

        Ok(())
    }

    /// Fixes the heading from a turn followed by a probe move. The turn
    /// itself is not tracked; the displacement of the probe move determines
    /// the heading absolutely.
    fn locate(&mut self) -> ProtocolResult<()> {
        loop {
            self.step(Command::TurnLeft)?;
            let old = self.position;

            self.step(Command::Move)?;

            match Heading::from_displacement(old, self.position) {
                Some(heading) => {
                    self.heading = heading;

                    logging::debug!(self.log, "initial conditions fixed";
                                    "context" => "locate",
                                    "position" => ?self.position,
                                    "heading" => self.heading.degrees());

                    return Ok(());
                }
                // The probe move hit an obstacle, turn and try again
                None => self.bump()?,
            }
        }
    }

    /// Rotates in place until the robot faces `target`.
    fn rotate(&mut self, target: Heading) -> ProtocolResult<()> {
        while self.heading != target {
            self.step(Command::TurnRight)?;
            self.heading = self.heading.turn_right();
        }

        Ok(())
    }

    /// Walks the robot to the zero coordinate of `axis`, sidestepping any
    /// obstacle it runs into on the way.
    fn walk(&mut self, axis: Axis) -> ProtocolResult<()> {
        while self.position.along(axis) != 0 {
            let old = self.position.along(axis);

            self.step(Command::Move)?;

            if self.position.along(axis) == old {
                self.bump()?;
                self.sidestep(axis)?;
            }
        }

        Ok(())
    }

    /// Canned maneuver around the left side of an obstacle directly ahead.
    /// Net-zero rotation, so the tracked heading stays valid throughout.
    fn sidestep(&mut self, axis: Axis) -> ProtocolResult<()> {
        self.step(Command::TurnLeft)?;
        self.step(Command::Move)?;
        self.step(Command::TurnRight)?;
        self.step(Command::Move)?;

        // The target row or column can be reached mid-maneuver
        if self.position.along(axis) == 0 {
            return Ok(());
        }

        self.step(Command::Move)?;
        self.step(Command::TurnRight)?;
        self.step(Command::Move)?;
        self.step(Command::TurnLeft)?;

        Ok(())
    }

    /// Steers the robot to the origin, one axis at a time.
    fn navigate(&mut self) -> ProtocolResult<()> {
        if self.position.x > 0 {
            self.rotate(Heading::West)?;
        } else if self.position.x < 0 {
            self.rotate(Heading::East)?;
        }

        self.walk(Axis::X)?;

        if self.position.y > 0 {
            self.rotate(Heading::South)?;
        } else if self.position.y < 0 {
            self.rotate(Heading::North)?;
        }

        self.walk(Axis::Y)
    }

    /// Collects the secret and logs the robot out.
    fn retrieve(&mut self) -> ProtocolResult<String> {
        self.channel.send(Command::GetMessage)?;

        let secret = self.channel.read_response(Some(frame::SECRET_LIMIT))?;

        self.channel.send(Command::Logout)?;

        Ok(secret)
    }
}
