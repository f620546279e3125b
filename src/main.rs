//! getty - set up a terminal line and hand it to login
//!
//! Initializes a serial or virtual terminal, shows the `/etc/issue` banner,
//! reads a username and execs `login(1)` with it.
//!
//! # Usage
//!
//! ```text
//! getty                  # terminal on stdin, default speed
//! getty 115200           # terminal on stdin at 115200 baud
//! getty 9600 ttyS0       # open /dev/ttyS0 at 9600 baud
//! ```
//!
//! # Exit status
//!
//! | Code | Meaning |
//! |------|---------|
//! | 0 | `-h`, or end of input at the prompt |
//! | 1 | invalid speed, unknown terminal, or login could not be started |

mod config;
mod core;

use std::env;
use std::fs::OpenOptions;
use std::sync::Mutex;

use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use crate::config::Config;
use crate::core::banner::Banner;
use crate::core::handoff;
use crate::core::prompt::{PromptReader, ReadOutcome};
use crate::core::session::{Session, SessionError, SignalPolicy};
use crate::core::speed::LineSpeed;

const USAGE: &str = "Usage: getty [-h] [SPEED] [TTY]";

/// Parsed command line
#[derive(Debug, Default, PartialEq, Eq)]
struct Args {
    /// Baud rate as typed
    speed: Option<String>,
    /// Device name relative to the device directory
    tty: Option<String>,
}

#[derive(Debug, PartialEq, Eq)]
enum Command {
    Help,
    Run(Args),
}

fn parse_args<I: IntoIterator<Item = String>>(args: I) -> Result<Command, String> {
    let mut parsed = Args::default();

    for (i, arg) in args.into_iter().enumerate() {
        match arg.as_str() {
            "-h" | "--help" if i == 0 => return Ok(Command::Help),
            opt if opt.starts_with('-') && opt.len() > 1 && parsed.speed.is_none() => {
                // A leading '-' is only meaningful as a (rejected) negative speed
                if opt[1..].bytes().all(|b| b.is_ascii_digit()) {
                    parsed.speed = Some(arg);
                } else {
                    return Err(format!("Unknown option: {}", opt));
                }
            }
            _ if parsed.speed.is_none() => parsed.speed = Some(arg),
            _ if parsed.tty.is_none() => parsed.tty = Some(arg),
            extra => return Err(format!("Unexpected argument: {}", extra)),
        }
    }

    Ok(Command::Run(parsed))
}

/// Log to a file; the terminal itself belongs to the login prompt.
fn init_logging(config: &Config) {
    if let Some(parent) = config.log_path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }

    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&config.log_path)
        .ok();

    if let Some(file) = log_file {
        let filter =
            EnvFilter::try_from_env("GETTY_LOG").unwrap_or_else(|_| EnvFilter::new("info"));
        let subscriber = FmtSubscriber::builder()
            .with_env_filter(filter)
            .with_writer(Mutex::new(file))
            .with_ansi(false)
            .finish();
        let _ = tracing::subscriber::set_global_default(subscriber);
    }
}

fn main() {
    let code = match run() {
        Ok(code) => code,
        Err(e) => {
            error!("{:#}", e);
            eprintln!("getty: {:#}", e);
            1
        }
    };
    std::process::exit(code);
}

fn run() -> anyhow::Result<i32> {
    let args = match parse_args(env::args().skip(1)) {
        Ok(Command::Help) => {
            println!("{}", USAGE);
            return Ok(0);
        }
        Ok(Command::Run(args)) => args,
        Err(e) => {
            eprintln!("getty: {}", e);
            eprintln!("{}", USAGE);
            return Ok(1);
        }
    };

    // Logging needs the config's log path, so a config error is held until
    // the subscriber is installed.
    let (config, config_error) = match Config::load() {
        Ok(config) => (config, None),
        Err(e) => (Config::default(), Some(e)),
    };
    init_logging(&config);
    info!("getty starting...");
    if let Some(e) = config_error {
        warn!("{:#}, using defaults", anyhow::Error::from(e));
    }

    let speed = match &args.speed {
        Some(text) => {
            let speed = LineSpeed::resolve(text);
            if !speed.is_usable() {
                warn!("Invalid TTY speed {:?}", text);
                eprintln!("getty: Invalid TTY speed");
                return Ok(1);
            }
            speed
        }
        None => config.default_line_speed(),
    };

    let session = match &args.tty {
        Some(name) => Session::open(&config.dev_dir, name, speed),
        None => Session::from_stdin(&config.dev_dir, speed),
    };

    let signals = SignalPolicy::from_names(&config.ignored_signals);
    info!("Ignoring signals: {:?}", signals.signals());
    signals.apply();

    let session = match session {
        Ok(session) => session,
        Err(e @ SessionError::UnknownTty(_)) => {
            error!("{:#}", anyhow::Error::from(e));
            eprintln!("getty: unknown TTY");
            // Never run on a terminal we cannot name; wait for init instead.
            nix::unistd::pause();
            return Ok(1);
        }
        Err(e) => return Err(e.into()),
    };

    let mut session = session
        .with_banner(Banner::new(&config.issue_path))
        .with_reader(PromptReader::new(config.name_capacity));
    info!("Terminal: {} at {} baud", session.tty(), session.speed());

    session.configure_line();

    let name = match session.read_username()? {
        ReadOutcome::Line(name) => name,
        ReadOutcome::EndOfInput => {
            info!("End of input on {}", session.tty());
            return Ok(0);
        }
    };

    Ok(handoff::login(
        &config.login_path,
        &config.shell_path,
        &name,
        session.tty(),
        session.is_char_device(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Command, String> {
        parse_args(args.iter().map(|s| s.to_string()))
    }

    #[test]
    fn test_no_args() {
        assert_eq!(parse(&[]), Ok(Command::Run(Args::default())));
    }

    #[test]
    fn test_speed_and_tty() {
        assert_eq!(
            parse(&["9600", "ttyS0"]),
            Ok(Command::Run(Args {
                speed: Some("9600".to_string()),
                tty: Some("ttyS0".to_string()),
            }))
        );
    }

    #[test]
    fn test_help_only_as_first_argument() {
        assert_eq!(parse(&["-h"]), Ok(Command::Help));
        assert_eq!(parse(&["--help", "9600"]), Ok(Command::Help));
        assert_eq!(
            parse(&["9600", "-h"]),
            Ok(Command::Run(Args {
                speed: Some("9600".to_string()),
                tty: Some("-h".to_string()),
            }))
        );
        assert!(parse(&["9600", "ttyS0", "-h"]).is_err());
    }

    #[test]
    fn test_negative_speed_is_passed_through() {
        // Rejected later by the speed table, not by the option parser
        assert_eq!(
            parse(&["-9600"]),
            Ok(Command::Run(Args {
                speed: Some("-9600".to_string()),
                tty: None,
            }))
        );
        assert_eq!(LineSpeed::resolve("-9600"), LineSpeed::Invalid);
    }

    #[test]
    fn test_bad_args() {
        assert!(parse(&["-x"]).is_err());
        assert!(parse(&["9600", "ttyS0", "extra"]).is_err());
    }
}
