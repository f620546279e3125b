//! Handoff to login(1)
//!
//! A successful exec replaces this process, so the only value that can ever
//! come back is a failure. A fallback shell is started only on a real
//! character device.

use std::convert::Infallible;
use std::ffi::CString;
use std::os::unix::ffi::OsStrExt;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{error, info, warn};

#[derive(Error, Debug)]
pub enum HandoffError {
    #[error("argument contains a NUL byte: {0:?}")]
    NulByte(String),

    #[error("failed exec {}: {source}", .path.display())]
    Exec {
        path: PathBuf,
        #[source]
        source: nix::Error,
    },

    #[error("{0} is not a character device, no fallback shell")]
    NotCharDevice(String),
}

/// Outcome of an exec attempt.
#[derive(Debug)]
pub enum HandoffResult {
    /// The process image was replaced. Uninhabited: never observed.
    Replaced(Infallible),
    Failed(HandoffError),
}

fn to_cstring(bytes: &[u8]) -> Result<CString, HandoffError> {
    CString::new(bytes)
        .map_err(|_| HandoffError::NulByte(String::from_utf8_lossy(bytes).into_owned()))
}

/// Replace this process with `path`, passing `path` as argv[0] followed by `args`.
fn exec(path: &Path, args: &[&[u8]]) -> HandoffResult {
    let prog = match to_cstring(path.as_os_str().as_bytes()) {
        Ok(prog) => prog,
        Err(e) => return HandoffResult::Failed(e),
    };

    let mut argv = vec![prog.clone()];
    for arg in args {
        match to_cstring(arg) {
            Ok(arg) => argv.push(arg),
            Err(e) => return HandoffResult::Failed(e),
        }
    }

    match nix::unistd::execv(&prog, &argv) {
        Ok(never) => HandoffResult::Replaced(never),
        Err(source) => HandoffResult::Failed(HandoffError::Exec {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Exec the login program with `user` as its only argument. The name is
/// passed through byte for byte.
pub fn exec_login(login: &Path, user: &[u8]) -> HandoffResult {
    info!("Handing {} to {}", String::from_utf8_lossy(user), login.display());
    exec(login, &[user])
}

/// Exec an unauthenticated shell.
pub fn exec_shell(shell: &Path) -> HandoffResult {
    info!("Starting fallback shell {}", shell.display());
    exec(shell, &[])
}

/// Run login for `user`, falling back to `shell` if login cannot be
/// started and `tty` is a character device.
///
/// Only returns on failure, with the process exit status to use.
pub fn login(login: &Path, shell: &Path, user: &[u8], tty: &str, is_char_device: bool) -> i32 {
    let e = match exec_login(login, user) {
        HandoffResult::Replaced(never) => match never {},
        HandoffResult::Failed(e) => e,
    };
    error!("{}", e);
    eprintln!(
        "getty: Failed exec {}, attempting fallback to {} ...",
        login.display(),
        shell.display()
    );

    if !is_char_device {
        warn!("{}", HandoffError::NotCharDevice(tty.to_string()));
        return 1;
    }

    if let HandoffResult::Failed(e) = exec_shell(shell) {
        error!("{}", e);
        eprintln!("getty: {}", e);
    }
    1
}
