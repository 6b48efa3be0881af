//! # Line Protocol
//!
//! Every server message is one newline-terminated frame. Newlines inside a frame travel as
//! `|`, so a client splits on `\n` and turns pipes back into line breaks. Client lines are
//! single tokens, see [`crate::parse_token`].

use serde::{Deserialize, Serialize};

/// Substitute for embedded newlines.
pub const LINE_SEPARATOR: char = '|';

/// Encodes text as a single frame.
///
/// # Examples
///
/// ```
/// use cryptcrawl::net::encode_frame;
///
/// assert_eq!(encode_frame("a\nb\r\nc"), "a|b|c\n");
/// assert_eq!(encode_frame("map\n"), "map|\n");
/// ```
pub fn encode_frame(text: &str) -> String {
    let mut frame = text.replace("\r\n", "\n").replace('\n', "|");
    frame.push('\n');
    frame
}

/// Turns a received frame back into multi-line text.
pub fn decode_frame(frame: &str) -> String {
    frame
        .trim_end_matches(['\r', '\n'])
        .replace(LINE_SEPARATOR, "\n")
}

/// Where a connected peer is in the join flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PeerPhase {
    /// Typing a nickname one character at a time
    NicknameEntry,
    /// Picking 1, 2 or 3
    ClassSelect,
    Playing,
}
