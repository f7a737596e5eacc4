use lodestone::shared::{ProtocolError, ProtocolResult};

/// Compass heading of a robot, encoded as degrees clockwise from north.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Heading {
    North = 0,
    East = 90,
    South = 180,
    West = 270,
}

impl Heading {
    /// Heading after a 90° clockwise turn.
    #[inline]
    pub fn turn_right(self) -> Heading {
        match self {
            Heading::North => Heading::East,
            Heading::East => Heading::South,
            Heading::South => Heading::West,
            Heading::West => Heading::North,
        }
    }

    /// Compass degrees, in [0, 360) by construction.
    #[inline]
    pub fn degrees(self) -> u16 {
        self as u16
    }

    /// Deduces the heading from the displacement between two confirmed
    /// positions. `None` means the robot did not move.
    pub fn from_displacement(old: Position, new: Position) -> Option<Heading> {
        if new.y == old.y {
            if new.x > old.x {
                Some(Heading::East)
            } else if new.x < old.x {
                Some(Heading::West)
            } else {
                None
            }
        } else if new.y > old.y {
            Some(Heading::North)
        } else {
            Some(Heading::South)
        }
    }
}

/// Grid axes a walk can target.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Axis {
    X,
    Y,
}

/// Signed grid coordinates as reported by movement confirmations.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct Position {
    pub x: i64,
    pub y: i64,
}

impl Position {
    pub const ORIGIN: Position = Position { x: 0, y: 0 };

    /// Parses a movement confirmation of the form `OK <x> <y>`.
    pub fn parse(confirmation: &str) -> ProtocolResult<Position> {
        let mut tokens = confirmation.split(' ');

        let tag = tokens.next();
        let x = tokens.next();
        let y = tokens.next();

        if tag != Some("OK") || tokens.next().is_some() {
            return Err(ProtocolError::Syntax);
        }

        match (x, y) {
            (Some(x), Some(y)) => Ok(Position {
                x: x.parse().map_err(|_| ProtocolError::Syntax)?,
                y: y.parse().map_err(|_| ProtocolError::Syntax)?,
            }),
            _ => Err(ProtocolError::Syntax),
        }
    }

    /// Coordinate along the supplied axis.
    #[inline]
    pub fn along(self, axis: Axis) -> i64 {
        match axis {
            Axis::X => self.x,
            Axis::Y => self.y,
        }
    }
}
