use regex::Regex;

use crate::command::Command;
use crate::error::AirspaceError;
use crate::registry::{Position, Velocity};

/// A parsed operator console line: either a core command or one of the
/// console-local verbs (show/help/exit).
#[derive(Debug, Clone, PartialEq)]
pub enum ConsoleInput {
    Command(Command),
    Show,
    Help,
    Exit,
}

/// Text grammar for the operator console, one regex per command form:
/// `change_speed`, `change_altitude`, `add_aircraft`, `remove_aircraft`,
/// `change_window`, plus the console-local `show`/`help`/`exit`.
pub struct CommandParser {
    change_speed: Regex,
    change_altitude: Regex,
    add_aircraft: Regex,
    remove_aircraft: Regex,
    change_window: Regex,
}

const NUM: &str = r"(-?\d+(?:\.\d+)?)";

impl CommandParser {
    pub fn new() -> Self {
        let n = NUM;
        Self {
            change_speed: Regex::new(&format!(r"^change_speed\s+(\d+)\s+{n}\s+{n}\s+{n}$"))
                .unwrap(),
            change_altitude: Regex::new(&format!(r"^change_altitude\s+(\d+)\s+{n}$")).unwrap(),
            add_aircraft: Regex::new(&format!(
                r"^add_aircraft\s+(\d+)\s+{n}\s+{n}\s+{n}\s+{n}\s+{n}\s+{n}\s+(\d+)$"
            ))
            .unwrap(),
            remove_aircraft: Regex::new(r"^remove_aircraft\s+(\d+)$").unwrap(),
            change_window: Regex::new(r"^change_window\s+(\d+)$").unwrap(),
        }
    }

    pub fn help_text() -> &'static str {
        "Available commands:\n\
         \x20 change_speed <id> <vx> <vy> <vz>\n\
         \x20 change_altitude <id> <new_z>\n\
         \x20 add_aircraft <id> <x> <y> <z> <vx> <vy> <vz> <lifetime>\n\
         \x20 remove_aircraft <id>\n\
         \x20 change_window <seconds>\n\
         \x20 show\n\
         \x20 help\n\
         \x20 exit"
    }

    pub fn parse(&self, line: &str) -> Result<ConsoleInput, AirspaceError> {
        let line = line.trim();
        match line {
            "show" => return Ok(ConsoleInput::Show),
            "help" => return Ok(ConsoleInput::Help),
            "exit" | "quit" => return Ok(ConsoleInput::Exit),
            _ => {}
        }

        if let Some(caps) = self.change_speed.captures(line) {
            return Ok(ConsoleInput::Command(Command::SetVelocity {
                id: parse_u32(&caps[1])?,
                velocity: Velocity::new(parse_f64(&caps[2])?, parse_f64(&caps[3])?, parse_f64(&caps[4])?),
            }));
        }
        if let Some(caps) = self.change_altitude.captures(line) {
            return Ok(ConsoleInput::Command(Command::SetAltitude {
                id: parse_u32(&caps[1])?,
                z: parse_f64(&caps[2])?,
            }));
        }
        if let Some(caps) = self.add_aircraft.captures(line) {
            return Ok(ConsoleInput::Command(Command::AddAircraft {
                id: parse_u32(&caps[1])?,
                position: Position::new(
                    parse_f64(&caps[2])?,
                    parse_f64(&caps[3])?,
                    parse_f64(&caps[4])?,
                ),
                velocity: Velocity::new(
                    parse_f64(&caps[5])?,
                    parse_f64(&caps[6])?,
                    parse_f64(&caps[7])?,
                ),
                lifetime: parse_u64(&caps[8])?,
            }));
        }
        if let Some(caps) = self.remove_aircraft.captures(line) {
            return Ok(ConsoleInput::Command(Command::RemoveAircraft {
                id: parse_u32(&caps[1])?,
            }));
        }
        if let Some(caps) = self.change_window.captures(line) {
            return Ok(ConsoleInput::Command(Command::SetPredictionWindow {
                seconds: parse_u64(&caps[1])?,
            }));
        }

        Err(AirspaceError::InvalidParameter(format!(
            "unrecognized command: {}",
            line
        )))
    }
}

impl Default for CommandParser {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_u32(s: &str) -> Result<u32, AirspaceError> {
    s.parse()
        .map_err(|_| AirspaceError::InvalidParameter(format!("bad integer: {}", s)))
}

fn parse_u64(s: &str) -> Result<u64, AirspaceError> {
    s.parse()
        .map_err(|_| AirspaceError::InvalidParameter(format!("bad integer: {}", s)))
}

fn parse_f64(s: &str) -> Result<f64, AirspaceError> {
    s.parse()
        .map_err(|_| AirspaceError::InvalidParameter(format!("bad number: {}", s)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_change_speed() {
        let parser = CommandParser::new();
        let input = parser.parse("change_speed 1 100 -50 0.5").unwrap();
        assert_eq!(
            input,
            ConsoleInput::Command(Command::SetVelocity {
                id: 1,
                velocity: Velocity::new(100.0, -50.0, 0.5),
            })
        );
    }

    #[test]
    fn test_parse_add_aircraft() {
        let parser = CommandParser::new();
        let input = parser
            .parse("add_aircraft 7 0 0 15000 100 50 0 120")
            .unwrap();
        assert_eq!(
            input,
            ConsoleInput::Command(Command::AddAircraft {
                id: 7,
                position: Position::new(0.0, 0.0, 15000.0),
                velocity: Velocity::new(100.0, 50.0, 0.0),
                lifetime: 120,
            })
        );
    }

    #[test]
    fn test_parse_console_verbs() {
        let parser = CommandParser::new();
        assert_eq!(parser.parse("  show ").unwrap(), ConsoleInput::Show);
        assert_eq!(parser.parse("help").unwrap(), ConsoleInput::Help);
        assert_eq!(parser.parse("exit").unwrap(), ConsoleInput::Exit);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        let parser = CommandParser::new();
        assert!(parser.parse("change_speed one 1 2 3").is_err());
        assert!(parser.parse("add_aircraft 1 2 3").is_err());
        assert!(parser.parse("launch_missiles").is_err());
    }

    #[test]
    fn test_parse_remove_and_window() {
        let parser = CommandParser::new();
        assert_eq!(
            parser.parse("remove_aircraft 4").unwrap(),
            ConsoleInput::Command(Command::RemoveAircraft { id: 4 })
        );
        assert_eq!(
            parser.parse("change_window 15").unwrap(),
            ConsoleInput::Command(Command::SetPredictionWindow { seconds: 15 })
        );
    }
}
