//! Line protocol definitions
//!
//! Plain text, one message per line. These helpers build every line the
//! server ever emits so the wording lives in one place.

use chrono::{Local, NaiveTime};

/// Prompt written on connect (no trailing newline)
pub const NAME_PROMPT: &str = "Input your name: ";

/// Header of the roster sent privately to a new client
pub const ROSTER_HEADER: &str = "All clients:";

/// Timestamp layout for chat lines (24-hour, zero-padded)
pub const TIME_FORMAT: &str = "%H:%M:%S";

/// Private greeting after the name has been read
pub fn welcome(name: &str) -> String {
    format!("You're {}", name)
}

/// Broadcast when a client enters
pub fn arrived(name: &str) -> String {
    format!("{} has arrived", name)
}

/// Broadcast when a client's session ends
pub fn left(name: &str) -> String {
    format!("{} has left", name)
}

/// Broadcast and sent directly to a client kicked for idling
pub fn kicked(name: &str) -> String {
    format!("{} idle too long. Kicked out", name)
}

/// Format a chat line as `name: text<TAB>HH:MM:SS`
pub fn chat_line(name: &str, text: &str, at: NaiveTime) -> String {
    format!("{}: {}\t{}", name, text, at.format(TIME_FORMAT))
}

/// Format a chat line stamped with the current local wall-clock time
pub fn chat_line_now(name: &str, text: &str) -> String {
    chat_line(name, text, Local::now().time())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_announcements() {
        assert_eq!(welcome("A"), "You're A");
        assert_eq!(arrived("B"), "B has arrived");
        assert_eq!(left("B"), "B has left");
        assert_eq!(kicked("A"), "A idle too long. Kicked out");
    }

    #[test]
    fn test_chat_line_format() {
        let at = NaiveTime::from_hms_opt(10, 0, 0).unwrap();
        assert_eq!(chat_line("A", "hello", at), "A: hello\t10:00:00");
    }

    #[test]
    fn test_chat_line_zero_pads_and_uses_24_hours() {
        let at = NaiveTime::from_hms_opt(7, 5, 9).unwrap();
        assert!(chat_line("A", "x", at).ends_with("\t07:05:09"));

        let at = NaiveTime::from_hms_opt(23, 59, 1).unwrap();
        assert!(chat_line("A", "x", at).ends_with("\t23:59:01"));
    }

    #[test]
    fn test_chat_line_now_timestamp_parses() {
        let line = chat_line_now("A", "hi");
        let (prefix, stamp) = line.rsplit_once('\t').unwrap();

        assert_eq!(prefix, "A: hi");
        assert_eq!(stamp.len(), 8);
        assert!(NaiveTime::parse_from_str(stamp, TIME_FORMAT).is_ok());
    }

    #[test]
    fn test_empty_name_still_formats() {
        assert_eq!(welcome(""), "You're ");
        assert_eq!(arrived(""), " has arrived");
    }
}
