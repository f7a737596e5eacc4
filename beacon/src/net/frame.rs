use lodestone::DELIMITER;
use std::io;

/// Per-response length caps, inclusive of the trailing delimiter. A response
/// that accumulates this many bytes without terminating cannot be legal.
pub const FULL_POWER_LIMIT: usize = 12;
pub const USERNAME_LIMIT: usize = 20;
pub const KEY_LIMIT: usize = 5;
pub const CONFIRMATION_LIMIT: usize = 7;
pub const MOVEMENT_LIMIT: usize = 12;
pub const SECRET_LIMIT: usize = 100;

/// Client announcements bracketing the recharge pause.
pub const RECHARGING: &str = "RECHARGING";
pub const FULL_POWER: &str = "FULL POWER";

/// Server-to-client messages of the guidance protocol.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Command {
    Move,
    TurnLeft,
    TurnRight,
    GetMessage,
    Logout,
    KeyRequest,
    AuthOk,
    ServerHash(u16),
}

impl Command {
    /// Writes the command and its delimiter to the supplied stream.
    #[inline]
    pub fn write<W: io::Write>(&self, stream: &mut W) -> io::Result<()> {
        match self {
            Command::ServerHash(hash) => write!(stream, "{}", hash)?,
            command => stream.write_all(command.text().as_bytes())?,
        }

        stream.write_all(&DELIMITER)
    }

    /// Wire text of a fixed command, delimiter excluded.
    fn text(&self) -> &'static str {
        match self {
            Command::Move => "102 MOVE",
            Command::TurnLeft => "103 TURN LEFT",
            Command::TurnRight => "104 TURN RIGHT",
            Command::GetMessage => "105 GET MESSAGE",
            Command::Logout => "106 LOGOUT",
            Command::KeyRequest => "107 KEY REQUEST",
            Command::AuthOk => "200 OK",
            Command::ServerHash(_) => unreachable!("server hash has no fixed text"),
        }
    }
}
