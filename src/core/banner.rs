//! Issue banner rendering
//!
//! Expands `/etc/issue` style templates. A backslash followed by one of the
//! directive letters below is replaced by host or terminal data:
//!
//! | Escape | Expands to |
//! |--------|------------|
//! | `\l`   | terminal name |
//! | `\m`   | machine architecture |
//! | `\n`   | node (host) name |
//! | `\o`   | domain name (Linux only) |
//! | `\r`   | kernel release |
//! | `\s`   | system name |
//! | `\v`   | kernel version |
//!
//! Templates are raw bytes; text in any encoding passes through untouched.
//! A backslash followed by any other byte is output as-is, both bytes
//! included. A backslash at the very end of a template stops
//! rendering of that template.

use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use tracing::debug;

/// Built-in banner, used when the issue file is missing or unreadable.
pub const DEFAULT_TEMPLATE: &[u8] = b"Welcome to \\s \\v \\n \\l\n\n";

/// Rendered after the banner to produce the prompt itself.
pub const PROMPT_TEMPLATE: &[u8] = b"\\n login: ";

/// Snapshot of the host identity, taken once per banner.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HostMetadata {
    pub sysname: String,
    pub nodename: String,
    pub release: String,
    pub version: String,
    pub machine: String,
    /// NIS domain; `None` where the platform does not report one.
    pub domainname: Option<String>,
}

impl HostMetadata {
    /// Query the running kernel. Fields are left empty if `uname` fails.
    pub fn query() -> Self {
        let uts = match nix::sys::utsname::uname() {
            Ok(uts) => uts,
            Err(e) => {
                debug!("uname failed: {}", e);
                return Self::default();
            }
        };

        #[cfg(any(target_os = "linux", target_os = "android"))]
        let domainname = Some(uts.domainname().to_string_lossy().into_owned());
        #[cfg(not(any(target_os = "linux", target_os = "android")))]
        let domainname = None;

        Self {
            sysname: uts.sysname().to_string_lossy().into_owned(),
            nodename: uts.nodename().to_string_lossy().into_owned(),
            release: uts.release().to_string_lossy().into_owned(),
            version: uts.version().to_string_lossy().into_owned(),
            machine: uts.machine().to_string_lossy().into_owned(),
            domainname,
        }
    }
}

/// Substitution directives understood inside a template.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Directive {
    Line,
    Machine,
    Node,
    Domain,
    Release,
    System,
    Version,
}

impl Directive {
    pub fn from_byte(b: u8) -> Option<Self> {
        match b {
            b'l' => Some(Directive::Line),
            b'm' => Some(Directive::Machine),
            b'n' => Some(Directive::Node),
            b'o' => Some(Directive::Domain),
            b'r' => Some(Directive::Release),
            b's' => Some(Directive::System),
            b'v' => Some(Directive::Version),
            _ => None,
        }
    }
}

/// One step of template scanning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token<'a> {
    /// Text to copy verbatim (may contain unknown escapes).
    Literal(&'a [u8]),
    Directive(Directive),
    /// Backslash with nothing after it; the template ends here.
    UnterminatedEscape,
    EndOfTemplate,
}

/// Scanner over a single template.
pub struct Template<'a> {
    text: &'a [u8],
    /// Start of the literal span not yet handed out
    start: usize,
    /// Token held back while the literal before it is returned
    pending: Option<Token<'a>>,
    finished: bool,
}

impl<'a> Template<'a> {
    pub fn new(text: &'a [u8]) -> Self {
        Self {
            text,
            start: 0,
            pending: None,
            finished: false,
        }
    }

    /// Next token. Once `UnterminatedEscape` or `EndOfTemplate` has been
    /// returned, every further call returns `EndOfTemplate`.
    pub fn next_token(&mut self) -> Token<'a> {
        if let Some(token) = self.pending.take() {
            return token;
        }
        if self.finished {
            return Token::EndOfTemplate;
        }

        let mut scan = self.start;
        while let Some(offset) = self.text[scan..].iter().position(|&b| b == b'\\') {
            let escape = scan + offset;
            let token = match self.text.get(escape + 1) {
                None => {
                    self.finished = true;
                    Token::UnterminatedEscape
                }
                Some(&b) => match Directive::from_byte(b) {
                    Some(directive) => Token::Directive(directive),
                    None => {
                        // Unknown escape: both bytes stay in the literal.
                        scan = escape + 2;
                        continue;
                    }
                },
            };

            let literal = &self.text[self.start..escape];
            self.start = (escape + 2).min(self.text.len());
            if literal.is_empty() {
                return token;
            }
            self.pending = Some(token);
            return Token::Literal(literal);
        }

        self.finished = true;
        let literal = &self.text[self.start..];
        self.start = self.text.len();
        if literal.is_empty() {
            Token::EndOfTemplate
        } else {
            Token::Literal(literal)
        }
    }
}

/// Expand `template` into `out`, streaming each piece as it is resolved.
pub fn render<W: Write>(
    template: &[u8],
    host: &HostMetadata,
    tty: &str,
    out: &mut W,
) -> io::Result<()> {
    let mut scanner = Template::new(template);
    loop {
        match scanner.next_token() {
            Token::Literal(text) => out.write_all(text)?,
            Token::Directive(directive) => {
                let value = match directive {
                    Directive::Line => tty,
                    Directive::Machine => host.machine.as_str(),
                    Directive::Node => host.nodename.as_str(),
                    Directive::Domain => match &host.domainname {
                        Some(domain) => domain.as_str(),
                        // No domain support: same as an unknown escape
                        None => "\\o",
                    },
                    Directive::Release => host.release.as_str(),
                    Directive::System => host.sysname.as_str(),
                    Directive::Version => host.version.as_str(),
                };
                out.write_all(value.as_bytes())?;
            }
            Token::UnterminatedEscape | Token::EndOfTemplate => break,
        }
    }
    Ok(())
}

/// Banner source: the issue file if it can be opened, else the default.
#[derive(Debug, Clone)]
pub struct Banner {
    issue_path: PathBuf,
}

impl Banner {
    pub fn new(issue_path: impl Into<PathBuf>) -> Self {
        Self {
            issue_path: issue_path.into(),
        }
    }

    pub fn issue_path(&self) -> &Path {
        &self.issue_path
    }

    /// Write a leading newline, the banner and the login prompt.
    ///
    /// Each issue-file line is rendered on its own as soon as it is read.
    pub fn show<W: Write>(&self, host: &HostMetadata, tty: &str, out: &mut W) -> io::Result<()> {
        out.write_all(b"\n")?;

        match File::open(&self.issue_path) {
            Ok(file) => {
                let mut reader = BufReader::new(file);
                let mut line = Vec::new();
                loop {
                    line.clear();
                    match reader.read_until(b'\n', &mut line) {
                        Ok(0) => break,
                        Ok(_) => render(&line, host, tty, out)?,
                        Err(e) => {
                            debug!("Reading {} failed: {}", self.issue_path.display(), e);
                            break;
                        }
                    }
                }
            }
            Err(e) => {
                debug!("No issue file {}: {}", self.issue_path.display(), e);
                render(DEFAULT_TEMPLATE, host, tty, out)?;
            }
        }

        render(PROMPT_TEMPLATE, host, tty, out)?;
        out.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn host() -> HostMetadata {
        HostMetadata {
            sysname: "Linux".to_string(),
            nodename: "box".to_string(),
            release: "6.1.0".to_string(),
            version: "#1 SMP".to_string(),
            machine: "x86_64".to_string(),
            domainname: Some("example".to_string()),
        }
    }

    fn expand(template: &str) -> String {
        let mut out = Vec::new();
        render(template.as_bytes(), &host(), "tty0", &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_plain_text_unchanged() {
        assert_eq!(expand("hello, world\n"), "hello, world\n");
        assert_eq!(expand(""), "");
    }

    #[test]
    fn test_directives() {
        assert_eq!(expand("\\l"), "tty0");
        assert_eq!(expand("\\s \\r \\v"), "Linux 6.1.0 #1 SMP");
        assert_eq!(expand("\\n.\\o (\\m)"), "box.example (x86_64)");
        assert_eq!(expand("on \\l!"), "on tty0!");
    }

    #[test]
    fn test_unknown_directive_is_literal() {
        assert_eq!(expand("\\x"), "\\x");
        assert_eq!(expand("a\\qb\\l"), "a\\qbtty0");
        // The second backslash is consumed as the unknown directive character
        assert_eq!(expand("\\\\l"), "\\\\l");
        assert_eq!(expand("\\\n"), "\\\n");
    }

    #[test]
    fn test_trailing_escape_truncates() {
        assert_eq!(expand("abc\\"), "abc");
        assert_eq!(expand("\\l\\"), "tty0");
        assert_eq!(expand("\\"), "");
    }

    #[test]
    fn test_missing_domain_is_literal() {
        let mut host = host();
        host.domainname = None;
        let mut out = Vec::new();
        render(b"[\\o]", &host, "tty0", &mut out).unwrap();
        assert_eq!(out, b"[\\o]");
    }

    #[test]
    fn test_token_stream() {
        let mut t = Template::new(b"a\\lb\\");
        assert_eq!(t.next_token(), Token::Literal(b"a"));
        assert_eq!(t.next_token(), Token::Directive(Directive::Line));
        assert_eq!(t.next_token(), Token::Literal(b"b"));
        assert_eq!(t.next_token(), Token::UnterminatedEscape);
        assert_eq!(t.next_token(), Token::EndOfTemplate);
    }

    #[test]
    fn test_directive_letters() {
        for &b in b"lmnorsv" {
            assert!(Directive::from_byte(b).is_some(), "{}", b as char);
        }
        assert_eq!(Directive::from_byte(b'x'), None);
        assert_eq!(Directive::from_byte(b'L'), None);
        assert_eq!(Directive::from_byte(0xe9), None);
    }

    #[test]
    fn test_banner_default_when_file_missing() {
        let dir = tempfile::tempdir().unwrap();
        let banner = Banner::new(dir.path().join("issue"));
        let mut out = Vec::new();
        banner.show(&host(), "ttyS0", &mut out).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "\nWelcome to Linux #1 SMP box ttyS0\n\nbox login: "
        );
    }

    #[test]
    fn test_banner_from_issue_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "\\s \\r\nline \\l\\\ntail\\").unwrap();
        let banner = Banner::new(file.path());
        let mut out = Vec::new();
        banner.show(&host(), "tty1", &mut out).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "\nLinux 6.1.0\nline tty1\\\ntailbox login: "
        );
    }

    #[test]
    fn test_non_utf8_bytes_pass_through() {
        let mut out = Vec::new();
        render(b"Caf\xe9 \\l \\\xff", &host(), "tty0", &mut out).unwrap();
        assert_eq!(out, b"Caf\xe9 tty0 \\\xff");
    }

    #[test]
    fn test_banner_from_latin1_issue_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"Caf\xe9 \\l\n").unwrap();
        let banner = Banner::new(file.path());
        let mut out = Vec::new();
        banner.show(&host(), "tty1", &mut out).unwrap();
        assert_eq!(out, b"\nCaf\xe9 tty1\nbox login: ");
    }
}
