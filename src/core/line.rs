//! Terminal line setup
//!
//! Programs the line speed on an open terminal. Every step is best effort: if
//! the descriptor is not a terminal, or the driver rejects a request, the line
//! keeps whatever speed it already had.

use std::os::fd::AsFd;

use nix::sys::termios::{self, FlushArg, SetArg};
use tracing::{debug, warn};

use super::speed::LineSpeed;

/// Apply `speed` to the terminal behind `fd`.
///
/// Drains pending output, sets input and output speed, applies the attributes
/// with flush-on-set and finally discards unread input and unwritten output.
pub fn apply<Fd: AsFd>(fd: Fd, speed: LineSpeed) {
    let fd = fd.as_fd();

    let Some(baud) = speed.to_baud() else {
        warn!("Line speed {} not supported on this platform", speed);
        return;
    };

    let _ = termios::tcdrain(fd);

    let mut attrs = match termios::tcgetattr(fd) {
        Ok(attrs) => attrs,
        Err(e) => {
            debug!("tcgetattr failed, leaving line untouched: {}", e);
            return;
        }
    };

    let _ = termios::cfsetispeed(&mut attrs, baud);
    let _ = termios::cfsetospeed(&mut attrs, baud);
    if let Err(e) = termios::tcsetattr(fd, SetArg::TCSAFLUSH, &attrs) {
        debug!("tcsetattr failed: {}", e);
    }
    let _ = termios::tcflush(fd, FlushArg::TCIOFLUSH);

    debug!("Line speed set to {}", speed);
}
