//! Terminal login core.
//!
//! - **speed**: baud-rate argument to line speed table
//! - **line**: applies a line speed to an open terminal
//! - **banner**: `/etc/issue` template expansion
//! - **prompt**: username input with line-kill editing
//! - **session**: terminal ownership and the banner/prompt loop
//! - **handoff**: exec of login(1) and the fallback shell
//!
//! # Flow
//!
//! ```text
//! main
//! ├── SignalPolicy::apply        ignore HUP/INT/QUIT
//! ├── Session::configure_line    line::apply
//! ├── Session::read_username     Banner::show + PromptReader, until non-empty
//! └── handoff::login             exec login(1), else the fallback shell
//! ```

pub mod speed;
pub mod line;
pub mod banner;
pub mod prompt;
pub mod session;
pub mod handoff;

#[cfg(test)]
pub(crate) mod test_support;
