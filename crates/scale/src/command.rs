//! MT-SICS command parsing and execution.
//!
//! Parsing is an ordered list of matchers. Order matters because some
//! patterns overlap: `TA <n>` must be tried before the bare `TA` query and
//! `D "<text>"` before the bare `D` query.
//!
//! | Line        | Command                     | Response                  |
//! |-------------|-----------------------------|---------------------------|
//! | `TA <n>`    | [`Command::SetTare`]        | `TA A`                    |
//! | `D "<t>"`   | [`Command::WriteDisplay`]   | `D A`                     |
//! | `SI`        | [`Command::WeighImmediate`] | `S D <net> g`             |
//! | `S`         | [`Command::Weigh`]          | `S S|D <net> g`           |
//! | `T`         | [`Command::Tare`]           | `T A`                     |
//! | `Z`         | [`Command::Zero`]           | `Z A`                     |
//! | `TA`        | [`Command::QueryTare`]      | `TA A <tare> g`           |
//! | `TAC`       | [`Command::ClearTare`]      | `TAC A`                   |
//! | `@`         | [`Command::Reset`]          | `@ A`                     |
//! | `PCS`       | [`Command::PieceCount`]     | `PCS S <n>`               |
//! | `DW`        | [`Command::DisplayWeight`]  | `DW A`                    |
//! | `?`         | [`Command::Identify`]       | `I4 MT-SICS Simulator V1.0` |
//! | `D`         | [`Command::QueryDisplay`]   | `D A <text>`              |

use std::fmt;
use std::str::FromStr;

use crate::error::{CommandError, CommandResult};
use crate::state::InstrumentState;

/// Identification string returned for `?`.
pub const IDENTIFICATION: &str = "I4 MT-SICS Simulator V1.0";

/// Unit suffix used on every weight-like value.
pub const UNIT: &str = "g";

/// A parsed MT-SICS command.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// `TA <value>`: preset the tare.
    SetTare(f64),
    /// `D "<text>"`: write text to the display.
    WriteDisplay(String),
    /// `SI`: send weight immediately, always reported as dynamic.
    WeighImmediate,
    /// `S`: send weight with the current stability status.
    Weigh,
    /// `T`: tare with the current gross weight.
    Tare,
    /// `Z`: zero the balance.
    Zero,
    /// `TA`: query the tare value.
    QueryTare,
    /// `TAC`: clear the tare.
    ClearTare,
    /// `@`: reset.
    Reset,
    /// `PCS`: query the piece count.
    PieceCount,
    /// `DW`: show weight on the display.
    DisplayWeight,
    /// `?`: identify the instrument.
    Identify,
    /// `D`: query the display text.
    QueryDisplay,
}

impl Command {
    /// Parse a raw command line.
    ///
    /// The line is trimmed and upper-cased before matching.
    pub fn parse(line: &str) -> CommandResult<Self> {
        let line = line.trim().to_uppercase();

        if let Some(argument) = argument_of(&line, "TA") {
            return parse_tare_argument(argument).map(Command::SetTare);
        }

        if let Some(text) = argument_of(&line, "D").and_then(quoted_text) {
            return Ok(Command::WriteDisplay(text.to_string()));
        }

        match line.as_str() {
            "SI" => Ok(Command::WeighImmediate),
            "S" => Ok(Command::Weigh),
            "T" => Ok(Command::Tare),
            "Z" => Ok(Command::Zero),
            "TA" => Ok(Command::QueryTare),
            "TAC" => Ok(Command::ClearTare),
            "@" => Ok(Command::Reset),
            "PCS" => Ok(Command::PieceCount),
            "DW" => Ok(Command::DisplayWeight),
            "?" => Ok(Command::Identify),
            "D" => Ok(Command::QueryDisplay),
            _ => Err(CommandError::Unrecognized(line)),
        }
    }

    /// Apply the command to `state` and build the response.
    pub fn execute(&self, state: &mut InstrumentState) -> Response {
        match self {
            Command::SetTare(value) => {
                state.set_tare(*value);
                Response::Ack("TA")
            }
            Command::WriteDisplay(text) => {
                state.set_display_text(text.as_str());
                Response::Ack("D")
            }
            Command::WeighImmediate => Response::Weight {
                stable: false,
                net: state.net_weight(),
            },
            Command::Weigh => Response::Weight {
                stable: state.is_stable(),
                net: state.net_weight(),
            },
            Command::Tare => {
                state.tare_current();
                Response::Ack("T")
            }
            Command::Zero => {
                state.zero();
                Response::Ack("Z")
            }
            Command::QueryTare => Response::Tare(state.tare()),
            Command::ClearTare => {
                state.set_tare(0.0);
                Response::Ack("TAC")
            }
            Command::Reset => Response::Ack("@"),
            Command::PieceCount => Response::Pieces(state.piece_count()),
            Command::DisplayWeight => Response::Ack("DW"),
            Command::Identify => Response::Identification,
            Command::QueryDisplay => Response::Display(state.display_text().to_string()),
        }
    }
}

impl FromStr for Command {
    type Err = CommandError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Return the argument following `keyword`, if the line is
/// `keyword <whitespace> <argument>`.
fn argument_of<'a>(line: &'a str, keyword: &str) -> Option<&'a str> {
    let rest = line.strip_prefix(keyword)?;
    if !rest.starts_with(char::is_whitespace) {
        return None;
    }
    let argument = rest.trim();
    (!argument.is_empty()).then_some(argument)
}

/// Numeric tare argument, optionally followed by the unit.
fn parse_tare_argument(argument: &str) -> CommandResult<f64> {
    let invalid = || CommandError::InvalidArgument {
        command: "TA".to_string(),
        argument: argument.to_string(),
    };

    let mut tokens = argument.split_whitespace();
    let value = tokens
        .next()
        .and_then(|token| token.parse::<f64>().ok())
        .filter(|value| value.is_finite())
        .ok_or_else(invalid)?;

    match (tokens.next(), tokens.next()) {
        (None, _) => Ok(value),
        (Some(unit), None) if unit.eq_ignore_ascii_case(UNIT) => Ok(value),
        _ => Err(invalid()),
    }
}

/// Text between the first and the last double quote. Empty text does not count.
fn quoted_text(argument: &str) -> Option<&str> {
    let inner = argument.strip_prefix('"')?;
    let end = inner.rfind('"')?;
    let text = &inner[..end];
    (!text.is_empty()).then_some(text)
}

/// A response line, rendered with its CRLF terminator by [`fmt::Display`].
#[derive(Debug, Clone, PartialEq)]
pub enum Response {
    /// Command executed: `<cmd> A`.
    Ack(&'static str),
    /// Weight value: `S <S|D> <net> g`.
    Weight { stable: bool, net: f64 },
    /// Tare value: `TA A <tare> g`.
    Tare(f64),
    /// Piece count: `PCS S <n>`.
    Pieces(u64),
    /// Identification line.
    Identification,
    /// Display text: `D A <text>`.
    Display(String),
    /// `ES` or `EL`.
    Error(CommandError),
}

impl Response {
    /// True for `ES`/`EL` responses.
    pub fn is_error(&self) -> bool {
        matches!(self, Response::Error(_))
    }
}

impl From<CommandError> for Response {
    fn from(err: CommandError) -> Self {
        Response::Error(err)
    }
}

impl fmt::Display for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Response::Ack(command) => write!(f, "{} A", command)?,
            Response::Weight { stable, net } => {
                let status = if *stable { "S" } else { "D" };
                write!(f, "S {} {:.2} {}", status, net, UNIT)?
            }
            Response::Tare(tare) => write!(f, "TA A {:.2} {}", tare, UNIT)?,
            Response::Pieces(count) => write!(f, "PCS S {}", count)?,
            Response::Identification => f.write_str(IDENTIFICATION)?,
            Response::Display(text) => write!(f, "D A {}", text)?,
            Response::Error(err) => f.write_str(err.wire_code())?,
        }
        f.write_str("\r\n")
    }
}

impl InstrumentState {
    /// Parse and execute one command line against this state.
    pub fn handle_line(&mut self, line: &str) -> Response {
        match Command::parse(line) {
            Ok(command) => command.execute(self),
            Err(err) => Response::Error(err),
        }
    }
}

/// Pure form of the interpreter: the state is not touched, the successor
/// state is returned alongside the response.
pub fn interpret(state: &InstrumentState, line: &str) -> (InstrumentState, Response) {
    let mut next = state.clone();
    let response = next.handle_line(line);
    (next, response)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(state: &mut InstrumentState, line: &str) -> String {
        state.handle_line(line).to_string()
    }

    #[test]
    fn test_parse_exact_commands() {
        let cases = [
            ("SI", Command::WeighImmediate),
            ("S", Command::Weigh),
            ("T", Command::Tare),
            ("Z", Command::Zero),
            ("TA", Command::QueryTare),
            ("TAC", Command::ClearTare),
            ("@", Command::Reset),
            ("PCS", Command::PieceCount),
            ("DW", Command::DisplayWeight),
            ("?", Command::Identify),
            ("D", Command::QueryDisplay),
        ];
        for (line, expected) in cases {
            assert_eq!(Command::parse(line), Ok(expected), "line {:?}", line);
        }
    }

    #[test]
    fn test_parse_is_case_insensitive_and_trims() {
        assert_eq!(Command::parse("  si \r\n"), Ok(Command::WeighImmediate));
        assert_eq!(Command::parse("tac"), Ok(Command::ClearTare));
        assert_eq!("ta 3.5".parse::<Command>(), Ok(Command::SetTare(3.5)));
    }

    #[test]
    fn test_parse_tare_argument() {
        assert_eq!(Command::parse("TA 12.5"), Ok(Command::SetTare(12.5)));
        assert_eq!(Command::parse("TA\t7"), Ok(Command::SetTare(7.0)));
        assert_eq!(Command::parse("TA 12.5 g"), Ok(Command::SetTare(12.5)));
        assert!(matches!(
            Command::parse("TA abc"),
            Err(CommandError::InvalidArgument { .. })
        ));
        assert!(matches!(
            Command::parse("TA 1 kg"),
            Err(CommandError::InvalidArgument { .. })
        ));
        assert!(matches!(
            Command::parse("TA inf"),
            Err(CommandError::InvalidArgument { .. })
        ));
        // No separator: not the TA family at all
        assert!(matches!(
            Command::parse("TA5"),
            Err(CommandError::Unrecognized(_))
        ));
    }

    #[test]
    fn test_parse_display_argument() {
        assert_eq!(
            Command::parse("D \"hello world\""),
            Ok(Command::WriteDisplay("HELLO WORLD".to_string()))
        );
        assert_eq!(
            Command::parse("D \"say \"hi\"\""),
            Ok(Command::WriteDisplay("SAY \"HI\"".to_string()))
        );
        // Empty or unquoted text does not match the write form
        assert!(matches!(
            Command::parse("D \"\""),
            Err(CommandError::Unrecognized(_))
        ));
        assert!(matches!(
            Command::parse("D hello"),
            Err(CommandError::Unrecognized(_))
        ));
    }

    #[test]
    fn test_unknown_command() {
        let mut state = InstrumentState::new(3.0, true);
        let before = state.clone();
        assert_eq!(run(&mut state, "FOO"), "ES\r\n");
        assert_eq!(run(&mut state, ""), "ES\r\n");
        assert_eq!(state, before);
    }

    #[test]
    fn test_weigh_reports_stability() {
        let mut state = InstrumentState::new(5.0, true);
        assert_eq!(run(&mut state, "S"), "S S 5.00 g\r\n");
        assert_eq!(run(&mut state, "SI"), "S D 5.00 g\r\n");

        state.set_stable(false);
        assert_eq!(run(&mut state, "S"), "S D 5.00 g\r\n");
        assert_eq!(run(&mut state, "SI"), "S D 5.00 g\r\n");
    }

    #[test]
    fn test_weigh_reports_net_weight() {
        let mut state = InstrumentState::new(10.0, true);
        state.set_tare(2.5);
        assert_eq!(run(&mut state, "S"), "S S 7.50 g\r\n");

        state.set_tare(12.0);
        assert_eq!(run(&mut state, "S"), "S S -2.00 g\r\n");
    }

    #[test]
    fn test_tare_commands() {
        let mut state = InstrumentState::new(8.25, true);

        assert_eq!(run(&mut state, "T"), "T A\r\n");
        assert_eq!(state.tare(), 8.25);
        assert_eq!(run(&mut state, "TA"), "TA A 8.25 g\r\n");

        assert_eq!(run(&mut state, "TAC"), "TAC A\r\n");
        assert_eq!(state.tare(), 0.0);

        assert_eq!(run(&mut state, "TA 1.234"), "TA A\r\n");
        assert_eq!(run(&mut state, "TA"), "TA A 1.23 g\r\n");
    }

    #[test]
    fn test_invalid_tare_leaves_state_unchanged() {
        let mut state = InstrumentState::new(8.0, true);
        state.set_tare(2.0);
        let before = state.clone();

        assert_eq!(run(&mut state, "TA abc"), "EL\r\n");
        assert_eq!(state, before);
    }

    #[test]
    fn test_zero_is_idempotent() {
        let mut state = InstrumentState::new(42.42, true);
        state.set_tare(2.0);

        assert_eq!(run(&mut state, "Z"), "Z A\r\n");
        let once = state.clone();
        assert_eq!(run(&mut state, "Z"), "Z A\r\n");

        assert_eq!(state, once);
        assert_eq!(state.weight(), 0.0);
        assert_eq!(state.tare(), 0.0);
    }

    #[test]
    fn test_display_commands() {
        let mut state = InstrumentState::default();
        assert_eq!(run(&mut state, "D"), "D A \r\n");
        assert_eq!(run(&mut state, "D \"ready\""), "D A\r\n");
        assert_eq!(run(&mut state, "D"), "D A READY\r\n");
    }

    #[test]
    fn test_misc_commands() {
        let mut state = InstrumentState::default();
        state.set_piece_count(12);

        assert_eq!(run(&mut state, "@"), "@ A\r\n");
        assert_eq!(run(&mut state, "PCS"), "PCS S 12\r\n");
        assert_eq!(run(&mut state, "DW"), "DW A\r\n");
        assert_eq!(run(&mut state, "?"), "I4 MT-SICS Simulator V1.0\r\n");
    }

    #[test]
    fn test_interpret_is_pure_and_deterministic() {
        let state = InstrumentState::new(4.0, true);

        let (first, response_a) = interpret(&state, "T");
        let (second, response_b) = interpret(&state, "T");

        assert_eq!(state.tare(), 0.0);
        assert_eq!(first, second);
        assert_eq!(response_a, response_b);
        assert_eq!(first.tare(), 4.0);
    }

    #[test]
    fn test_error_responses() {
        assert!(Response::from(CommandError::Unrecognized("X".into())).is_error());
        assert!(!Response::Ack("T").is_error());
    }
}
