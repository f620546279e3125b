//! Line speed table
//!
//! Maps a decimal baud-rate argument to a symbolic line speed. Lookup is exact:
//! a rate that is not in the table never rounds to a neighbouring one.

use nix::sys::termios::BaudRate;

/// Standard line speeds, plus the `Invalid` marker for unparsable or
/// unsupported input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LineSpeed {
    B0,
    B50,
    B75,
    B110,
    B134,
    B150,
    B200,
    B300,
    B600,
    B1200,
    B1800,
    B2400,
    B4800,
    B9600,
    B19200,
    B38400,
    B57600,
    B115200,
    B230400,
    B460800,
    B500000,
    B576000,
    B921600,
    B1000000,
    B1152000,
    B1500000,
    B2000000,
    B2500000,
    B3000000,
    B3500000,
    B4000000,
    Invalid,
}

/// Numeric rate for every valid speed, in ascending order.
const RATES: [(u64, LineSpeed); 31] = [
    (0, LineSpeed::B0),
    (50, LineSpeed::B50),
    (75, LineSpeed::B75),
    (110, LineSpeed::B110),
    (134, LineSpeed::B134),
    (150, LineSpeed::B150),
    (200, LineSpeed::B200),
    (300, LineSpeed::B300),
    (600, LineSpeed::B600),
    (1200, LineSpeed::B1200),
    (1800, LineSpeed::B1800),
    (2400, LineSpeed::B2400),
    (4800, LineSpeed::B4800),
    (9600, LineSpeed::B9600),
    (19200, LineSpeed::B19200),
    (38400, LineSpeed::B38400),
    (57600, LineSpeed::B57600),
    (115200, LineSpeed::B115200),
    (230400, LineSpeed::B230400),
    (460800, LineSpeed::B460800),
    (500000, LineSpeed::B500000),
    (576000, LineSpeed::B576000),
    (921600, LineSpeed::B921600),
    (1000000, LineSpeed::B1000000),
    (1152000, LineSpeed::B1152000),
    (1500000, LineSpeed::B1500000),
    (2000000, LineSpeed::B2000000),
    (2500000, LineSpeed::B2500000),
    (3000000, LineSpeed::B3000000),
    (3500000, LineSpeed::B3500000),
    (4000000, LineSpeed::B4000000),
];

impl Default for LineSpeed {
    fn default() -> Self {
        LineSpeed::B38400
    }
}

impl LineSpeed {
    /// Resolve a baud-rate argument.
    ///
    /// Parsing follows `strtoul` conventions: leading whitespace and an
    /// optional `+` are skipped, then the longest run of decimal digits is
    /// taken and anything after it is ignored. No digits, a minus sign,
    /// overflow, or a rate missing from the table all give `Invalid`.
    pub fn resolve(text: &str) -> Self {
        let rest = text.trim_start();
        let rest = rest.strip_prefix('+').unwrap_or(rest);
        let digits_end = rest
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(rest.len());

        let value = match rest[..digits_end].parse::<u64>() {
            Ok(v) => v,
            Err(_) => return LineSpeed::Invalid,
        };

        RATES
            .iter()
            .find(|(rate, _)| *rate == value)
            .map(|(_, speed)| *speed)
            .unwrap_or(LineSpeed::Invalid)
    }

    /// Numeric rate in bits per second, `None` for `Invalid`.
    pub fn rate(self) -> Option<u64> {
        RATES
            .iter()
            .find(|(_, speed)| *speed == self)
            .map(|(rate, _)| *rate)
    }

    /// Whether a getty may program the line with this speed.
    ///
    /// `B0` is a real table entry but means "hang up", so it is refused
    /// along with `Invalid`.
    pub fn is_usable(self) -> bool {
        !matches!(self, LineSpeed::B0 | LineSpeed::Invalid)
    }

    /// Platform baud-rate constant, if this target's termios knows it.
    pub fn to_baud(self) -> Option<BaudRate> {
        let baud = match self {
            LineSpeed::B0 => BaudRate::B0,
            LineSpeed::B50 => BaudRate::B50,
            LineSpeed::B75 => BaudRate::B75,
            LineSpeed::B110 => BaudRate::B110,
            LineSpeed::B134 => BaudRate::B134,
            LineSpeed::B150 => BaudRate::B150,
            LineSpeed::B200 => BaudRate::B200,
            LineSpeed::B300 => BaudRate::B300,
            LineSpeed::B600 => BaudRate::B600,
            LineSpeed::B1200 => BaudRate::B1200,
            LineSpeed::B1800 => BaudRate::B1800,
            LineSpeed::B2400 => BaudRate::B2400,
            LineSpeed::B4800 => BaudRate::B4800,
            LineSpeed::B9600 => BaudRate::B9600,
            LineSpeed::B19200 => BaudRate::B19200,
            LineSpeed::B38400 => BaudRate::B38400,
            LineSpeed::B57600 => BaudRate::B57600,
            LineSpeed::B115200 => BaudRate::B115200,
            LineSpeed::B230400 => BaudRate::B230400,
            #[cfg(any(target_os = "linux", target_os = "android"))]
            LineSpeed::B460800 => BaudRate::B460800,
            #[cfg(any(target_os = "linux", target_os = "android"))]
            LineSpeed::B500000 => BaudRate::B500000,
            #[cfg(any(target_os = "linux", target_os = "android"))]
            LineSpeed::B576000 => BaudRate::B576000,
            #[cfg(any(target_os = "linux", target_os = "android"))]
            LineSpeed::B921600 => BaudRate::B921600,
            #[cfg(any(target_os = "linux", target_os = "android"))]
            LineSpeed::B1000000 => BaudRate::B1000000,
            #[cfg(any(target_os = "linux", target_os = "android"))]
            LineSpeed::B1152000 => BaudRate::B1152000,
            #[cfg(any(target_os = "linux", target_os = "android"))]
            LineSpeed::B1500000 => BaudRate::B1500000,
            #[cfg(any(target_os = "linux", target_os = "android"))]
            LineSpeed::B2000000 => BaudRate::B2000000,
            #[cfg(all(
                any(target_os = "linux", target_os = "android"),
                not(target_arch = "sparc64")
            ))]
            LineSpeed::B2500000 => BaudRate::B2500000,
            #[cfg(all(
                any(target_os = "linux", target_os = "android"),
                not(target_arch = "sparc64")
            ))]
            LineSpeed::B3000000 => BaudRate::B3000000,
            #[cfg(all(
                any(target_os = "linux", target_os = "android"),
                not(target_arch = "sparc64")
            ))]
            LineSpeed::B3500000 => BaudRate::B3500000,
            #[cfg(all(
                any(target_os = "linux", target_os = "android"),
                not(target_arch = "sparc64")
            ))]
            LineSpeed::B4000000 => BaudRate::B4000000,
            _ => return None,
        };
        Some(baud)
    }
}

impl std::fmt::Display for LineSpeed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.rate() {
            Some(rate) => write!(f, "{}", rate),
            None => write!(f, "invalid"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_table_rate_resolves() {
        for (rate, speed) in RATES.iter() {
            assert_eq!(LineSpeed::resolve(&rate.to_string()), *speed);
            assert_eq!(speed.rate(), Some(*rate));
        }
    }

    #[test]
    fn test_unknown_rates_are_invalid() {
        for text in ["", "fast", "-9600", "9601", "38401", "4000001", "12", "+", " "] {
            assert_eq!(LineSpeed::resolve(text), LineSpeed::Invalid, "{:?}", text);
        }
    }

    #[test]
    fn test_overflow_is_invalid() {
        assert_eq!(
            LineSpeed::resolve("99999999999999999999999999"),
            LineSpeed::Invalid
        );
    }

    #[test]
    fn test_strtoul_style_prefix_parsing() {
        assert_eq!(LineSpeed::resolve("  9600"), LineSpeed::B9600);
        assert_eq!(LineSpeed::resolve("+115200"), LineSpeed::B115200);
        assert_eq!(LineSpeed::resolve("19200baud"), LineSpeed::B19200);
        assert_eq!(LineSpeed::resolve("0038400"), LineSpeed::B38400);
    }

    #[test]
    fn test_zero_resolves_but_is_not_usable() {
        assert_eq!(LineSpeed::resolve("0"), LineSpeed::B0);
        assert!(!LineSpeed::B0.is_usable());
        assert!(!LineSpeed::Invalid.is_usable());
        assert!(LineSpeed::B9600.is_usable());
        assert_eq!(LineSpeed::Invalid.rate(), None);
    }

    #[test]
    fn test_display() {
        assert_eq!(LineSpeed::B115200.to_string(), "115200");
        assert_eq!(LineSpeed::Invalid.to_string(), "invalid");
    }

    #[test]
    fn test_common_rates_map_to_baud() {
        assert_eq!(LineSpeed::B9600.to_baud(), Some(BaudRate::B9600));
        assert_eq!(LineSpeed::B38400.to_baud(), Some(BaudRate::B38400));
        assert_eq!(LineSpeed::Invalid.to_baud(), None);
    }
}
