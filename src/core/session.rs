//! Login session
//!
//! Owns the terminal for the lifetime of the process and runs the
//! banner / prompt cycle until a username is entered.

use std::fs::{File, OpenOptions};
use std::io::{self, Read, Write};
use std::os::fd::AsFd;
use std::os::unix::fs::FileTypeExt;
use std::path::{Path, PathBuf};

use nix::sys::signal::{self, SaFlags, SigAction, SigHandler, SigSet, Signal};
use thiserror::Error;
use tracing::{debug, info, warn};

use super::banner::{Banner, HostMetadata};
use super::line;
use super::prompt::{PromptReader, ReadOutcome};
use super::speed::LineSpeed;

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("{}: {source}", .path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("unknown TTY")]
    UnknownTty(#[source] nix::Error),

    #[error("{tty}: read error")]
    Read {
        tty: String,
        #[source]
        source: io::Error,
    },
}

pub type Result<T> = std::result::Result<T, SessionError>;

/// Signals ignored for the whole session, so that Ctrl-C at the prompt does
/// nothing and QUIT cannot dump core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignalPolicy {
    ignored: Vec<Signal>,
}

impl Default for SignalPolicy {
    fn default() -> Self {
        Self {
            ignored: vec![Signal::SIGHUP, Signal::SIGINT, Signal::SIGQUIT],
        }
    }
}

impl SignalPolicy {
    /// Build a policy from signal names such as `"SIGINT"`. Unknown names
    /// are logged and skipped.
    pub fn from_names<S: AsRef<str>>(names: &[S]) -> Self {
        let ignored = names
            .iter()
            .filter_map(|name| match name.as_ref().parse::<Signal>() {
                Ok(sig) => Some(sig),
                Err(_) => {
                    warn!("Ignoring unknown signal name {:?}", name.as_ref());
                    None
                }
            })
            .collect();
        Self { ignored }
    }

    pub fn signals(&self) -> &[Signal] {
        &self.ignored
    }

    /// Install `SIG_IGN` for every listed signal.
    pub fn apply(&self) {
        let action = SigAction::new(SigHandler::SigIgn, SaFlags::SA_RESTART, SigSet::empty());
        for &sig in &self.ignored {
            // Safety: SIG_IGN installs no handler code.
            if let Err(e) = unsafe { signal::sigaction(sig, &action) } {
                warn!("Failed to ignore {}: {}", sig, e);
            }
        }
    }
}

/// A terminal line waiting for someone to log in.
pub struct Session<T = File> {
    terminal: T,
    /// Terminal name without the device directory, e.g. `ttyS0`
    tty: String,
    speed: LineSpeed,
    banner: Banner,
    reader: PromptReader,
}

impl Session<File> {
    /// Open `name` below `dev_dir` for reading and writing.
    pub fn open(dev_dir: &Path, name: &str, speed: LineSpeed) -> Result<Self> {
        let path = dev_dir.join(name);

        let terminal = OpenOptions::new()
            .read(true)
            .write(true)
            .open(&path)
            .map_err(|source| SessionError::Open {
                path: path.clone(),
                source,
            })?;

        info!("Opened {}", path.display());
        Ok(Self::new(terminal, name, speed))
    }

    /// Use the terminal already on standard input.
    pub fn from_stdin(dev_dir: &Path, speed: LineSpeed) -> Result<Self> {
        let stdin = io::stdin();
        let path = nix::unistd::ttyname(stdin.as_fd()).map_err(SessionError::UnknownTty)?;
        let tty = path
            .strip_prefix(dev_dir)
            .unwrap_or(&path)
            .to_string_lossy()
            .into_owned();

        let terminal = stdin
            .as_fd()
            .try_clone_to_owned()
            .map(File::from)
            .map_err(|source| SessionError::Open {
                path: path.clone(),
                source,
            })?;

        info!("Using standard input {}", path.display());
        Ok(Self::new(terminal, tty, speed))
    }

    /// Program the line speed. Never fails; see [`line::apply`].
    pub fn configure_line(&self) {
        line::apply(&self.terminal, self.speed);
    }

    /// Whether the terminal is a real character device.
    pub fn is_char_device(&self) -> bool {
        self.terminal
            .metadata()
            .map(|meta| meta.file_type().is_char_device())
            .unwrap_or(false)
    }
}

impl<T: Read + Write> Session<T> {
    pub fn new(terminal: T, tty: impl Into<String>, speed: LineSpeed) -> Self {
        Self {
            terminal,
            tty: tty.into(),
            speed,
            banner: Banner::new(crate::config::DEFAULT_ISSUE_PATH),
            reader: PromptReader::default(),
        }
    }

    pub fn with_banner(mut self, banner: Banner) -> Self {
        self.banner = banner;
        self
    }

    pub fn with_reader(mut self, reader: PromptReader) -> Self {
        self.reader = reader;
        self
    }

    pub fn tty(&self) -> &str {
        &self.tty
    }

    pub fn speed(&self) -> LineSpeed {
        self.speed
    }

    /// Show the banner and prompt until a non-empty name is typed.
    ///
    /// Returns `ReadOutcome::EndOfInput` if the line closes first; the
    /// returned `Line` is never empty.
    pub fn read_username(&mut self) -> Result<ReadOutcome> {
        debug!(
            "Prompting on {} (issue {}, name capacity {})",
            self.tty,
            self.banner.issue_path().display(),
            self.reader.capacity()
        );

        loop {
            let host = HostMetadata::query();
            if let Err(e) = self.banner.show(&host, &self.tty, &mut self.terminal) {
                warn!("Failed to write banner to {}: {}", self.tty, e);
            }

            match self.reader.read_line(&mut self.terminal, &self.tty)? {
                ReadOutcome::Line(name) if name.is_empty() => {
                    debug!("Blank line on {}, prompting again", self.tty);
                }
                outcome => return Ok(outcome),
            }
        }
    }
}
