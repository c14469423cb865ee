//! ANSI escape codes for terminal output.

pub const RESET: &str = "\x1b[0m";
pub const BOLD: &str = "\x1b[1m";
pub const DIM: &str = "\x1b[2m";

pub const GREY: &str = "\x1b[90m";
pub const RED: &str = "\x1b[31m";
pub const GREEN: &str = "\x1b[32m";
pub const YELLOW: &str = "\x1b[33m";
pub const BLUE: &str = "\x1b[34m";
pub const CYAN: &str = "\x1b[36m";

pub const BRIGHT_RED: &str = "\x1b[91m";
pub const BRIGHT_GREEN: &str = "\x1b[92m";
pub const BRIGHT_YELLOW: &str = "\x1b[93m";
pub const BRIGHT_WHITE: &str = "\x1b[97m";

/// Wrap `value` in `color`, leaving blanks untouched.
pub fn paint(value: &str, color: &str) -> String {
    if value.trim().is_empty() {
        value.to_string()
    } else {
        format!("{color}{value}{RESET}")
    }
}

/// Strip ANSI escape sequences (for width computations and tests).
pub fn strip_ansi(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c == '\x1b' {
            for c in chars.by_ref() {
                if c.is_ascii_alphabetic() {
                    break;
                }
            }
        } else {
            out.push(c);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paint_skips_blanks() {
        assert_eq!(paint("  ", RED), "  ");
        assert_eq!(strip_ansi(&paint("bay1", RED)), "bay1");
    }
}
