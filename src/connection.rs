// Well connections as seen by the block-average pressure calculation

use std::str::FromStr;

/// Penetration direction of a connection.
///
/// The neighbourhood of a connecting cell lies in the plane orthogonal to
/// this direction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
    X,
    Y,
    Z,
}

impl FromStr for Direction {
    type Err = ();

    fn from_str(input: &str) -> Result<Direction, Self::Err> {
        match input.trim().to_ascii_uppercase().as_str() {
            "X" | "FX" => Ok(Direction::X),
            "Y" | "FY" => Ok(Direction::Y),
            "Z" | "FZ" => Ok(Direction::Z),
            _ => Err(()),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ConnectionState {
    Open,
    Shut,
    Auto,
}

impl FromStr for ConnectionState {
    type Err = ();

    fn from_str(input: &str) -> Result<ConnectionState, Self::Err> {
        match input.trim().to_ascii_uppercase().as_str() {
            "OPEN" => Ok(ConnectionState::Open),
            "SHUT" => Ok(ConnectionState::Shut),
            "AUTO" => Ok(ConnectionState::Auto),
            _ => Err(()),
        }
    }
}

/// One well to reservoir cell link.
#[derive(Clone, Debug, PartialEq)]
pub struct Connection {
    /// Linearised global ID of the connecting cell
    pub global_index: usize,
    pub state: ConnectionState,
    /// Connection transmissibility factor
    pub ctf: f64,
    /// Depth of connection's centre (m)
    pub depth: f64,
    pub dir: Direction,
}

impl Connection {
    pub fn new(
        global_index: usize,
        state: ConnectionState,
        ctf: f64,
        depth: f64,
        dir: Direction,
    ) -> Self {
        Self {
            global_index,
            state,
            ctf,
            depth,
            dir,
        }
    }

    pub fn is_open(&self) -> bool {
        self.state == ConnectionState::Open
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_direction() {
        assert_eq!("x".parse::<Direction>(), Ok(Direction::X));
        assert_eq!("FY".parse::<Direction>(), Ok(Direction::Y));
        assert_eq!(" z ".parse::<Direction>(), Ok(Direction::Z));
        assert!("W".parse::<Direction>().is_err());
    }

    #[test]
    fn only_open_state_is_open() {
        let mut conn = Connection::new(0, ConnectionState::Open, 1.0, 0.0, Direction::Z);
        assert!(conn.is_open());
        conn.state = ConnectionState::Auto;
        assert!(!conn.is_open());
        assert_eq!("shut".parse::<ConnectionState>(), Ok(ConnectionState::Shut));
    }
}
