//! Operator console
//!
//! Reads one command per line from stdin on a plain OS thread and forwards
//! it to the async side through the shared channels. Emergency stop goes
//! through its own signal so it overtakes anything queued.

use std::io::{self, BufRead};
use std::thread;

use log::{error, warn};
use thiserror::Error;

use leveler_core::controller::Command;

use crate::channels::{self, SimRequest, COMMANDS, EMERGENCY_STOP, SHUTDOWN, SIM_REQUESTS};
use crate::status::render_status;

/// One parsed console line
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ConsoleInput {
    Command(Command),
    Status,
    Sim(SimRequest),
    Help,
    Quit,
}

/// Why a console line was not understood
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    #[error("empty line")]
    Empty,
    #[error("unknown command '{0}' (try 'help')")]
    UnknownCommand(String),
    #[error("usage: {0}")]
    BadArgument(&'static str),
}

pub const HELP: &str = "\
commands:
  calibrate-imu          capture the current attitude as level
  calibrate-actuators    home every actuator
  enable | disable       allow or stop motion
  level-once             run one leveling cycle
  toggle-auto-level      start or stop automatic leveling
  emergency-stop | stop  halt everything now
  reset                  clear an emergency stop
  status                 print the latest status
simulation:
  ground <roll> <pitch>  set the ground slope in degrees
  stall <n> on|off       jam or free actuator n
  link up|down           drop or restore the actuator link
  help | quit";

/// Parse one console line
pub fn parse_line(line: &str) -> Result<ConsoleInput, ParseError> {
    let mut words = line.split_whitespace();
    let Some(head) = words.next() else {
        return Err(ParseError::Empty);
    };
    let args: Vec<&str> = words.collect();

    let input = match head.to_ascii_lowercase().as_str() {
        "status" | "s" => ConsoleInput::Status,
        "help" | "?" => ConsoleInput::Help,
        "quit" | "exit" | "q" => ConsoleInput::Quit,
        "stop" | "estop" => ConsoleInput::Command(Command::EmergencyStop),
        "auto" => ConsoleInput::Command(Command::ToggleAutoLevel),
        "level" => ConsoleInput::Command(Command::LevelOnce),
        "ground" => {
            const USAGE: &str = "ground <roll> <pitch>";
            let [roll, pitch] = args.as_slice() else {
                return Err(ParseError::BadArgument(USAGE));
            };
            let roll: f64 = roll.parse().map_err(|_| ParseError::BadArgument(USAGE))?;
            let pitch: f64 = pitch.parse().map_err(|_| ParseError::BadArgument(USAGE))?;
            if !roll.is_finite() || !pitch.is_finite() {
                return Err(ParseError::BadArgument(USAGE));
            }
            return Ok(ConsoleInput::Sim(SimRequest::Ground { roll, pitch }));
        }
        "stall" => {
            const USAGE: &str = "stall <n> on|off";
            let [index, state] = args.as_slice() else {
                return Err(ParseError::BadArgument(USAGE));
            };
            let actuator: usize = index.parse().map_err(|_| ParseError::BadArgument(USAGE))?;
            let stalled = on_off(state).ok_or(ParseError::BadArgument(USAGE))?;
            return Ok(ConsoleInput::Sim(SimRequest::Stall { actuator, stalled }));
        }
        "link" => {
            const USAGE: &str = "link up|down";
            let [state] = args.as_slice() else {
                return Err(ParseError::BadArgument(USAGE));
            };
            let up = match *state {
                "up" => true,
                "down" => false,
                _ => return Err(ParseError::BadArgument(USAGE)),
            };
            return Ok(ConsoleInput::Sim(SimRequest::Link { up }));
        }
        _ => match Command::from_name(head) {
            Some(command) => ConsoleInput::Command(command),
            None => return Err(ParseError::UnknownCommand(head.to_string())),
        },
    };

    if !args.is_empty() {
        return Err(ParseError::UnknownCommand(line.trim().to_string()));
    }
    Ok(input)
}

fn on_off(word: &str) -> Option<bool> {
    match word {
        "on" | "1" | "true" => Some(true),
        "off" | "0" | "false" => Some(false),
        _ => None,
    }
}

/// Route a parsed line to the async side
pub fn dispatch(input: ConsoleInput) {
    match input {
        ConsoleInput::Command(Command::EmergencyStop) => EMERGENCY_STOP.signal(()),
        ConsoleInput::Command(command) => {
            if COMMANDS.try_send(command).is_err() {
                warn!("Command queue full, dropped {}", command.name());
            }
        }
        ConsoleInput::Sim(request) => {
            if SIM_REQUESTS.try_send(request).is_err() {
                warn!("Simulation queue full, dropped {:?}", request);
            }
        }
        ConsoleInput::Status => match channels::latest_status() {
            Some(snapshot) => println!("{}", render_status(&snapshot)),
            None => println!("no status yet"),
        },
        ConsoleInput::Help => println!("{HELP}"),
        ConsoleInput::Quit => SHUTDOWN.signal(()),
    }
}

/// Start the stdin reader thread
///
/// End of input requests shutdown.
pub fn spawn() -> io::Result<thread::JoinHandle<()>> {
    thread::Builder::new().name("console".into()).spawn(|| {
        let stdin = io::stdin();
        for line in stdin.lock().lines() {
            let line = match line {
                Ok(line) => line,
                Err(e) => {
                    error!("Console read failed: {e}");
                    break;
                }
            };
            match parse_line(&line) {
                Ok(input) => dispatch(input),
                Err(ParseError::Empty) => {}
                Err(e) => println!("{e}"),
            }
        }
        SHUTDOWN.signal(());
    })
}
