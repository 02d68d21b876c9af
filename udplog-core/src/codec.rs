//! Text framing for the two wire messages.
//!
//! ```text
//! log record   <ctime> <LEVEL> <program>:<function>:<line> <message>\n
//! control      Set Log Level=<n>
//! ```
//!
//! One frame is one datagram; there is no length prefix. The log-record line
//! is also the on-disk representation, so the daemon stores it verbatim.

use std::borrow::Cow;

use chrono::{DateTime, Local, Timelike};

use crate::level::LogLevel;

/// `ctime(3)` layout without its trailing newline, e.g. `Fri Aug 14 09:03:07 2020`.
pub const CTIME_FORMAT: &str = "%a %b %e %H:%M:%S %Y";

/// Prefix matched against the first 13 characters of a control frame.
pub const SET_LEVEL_PREFIX: &str = "Set Log Level";

/// Default upper bound for one encoded frame, in bytes.
pub const DEFAULT_MAX_FRAME: usize = 4096;

// ---------------------------------------------------------------------------
// Log records
// ---------------------------------------------------------------------------

/// One log line emitted by a producer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRecord {
    timestamp: DateTime<Local>,
    level: LogLevel,
    program: String,
    function: String,
    line: u32,
    message: String,
}

impl LogRecord {
    /// Build a record stamped with the current wall-clock second.
    pub fn new(
        level: LogLevel,
        program: impl Into<String>,
        function: impl Into<String>,
        line: u32,
        message: impl Into<String>,
    ) -> Self {
        Self::at(Local::now(), level, program, function, line, message)
    }

    /// Build a record with an explicit timestamp; sub-second precision is dropped.
    pub fn at(
        timestamp: DateTime<Local>,
        level: LogLevel,
        program: impl Into<String>,
        function: impl Into<String>,
        line: u32,
        message: impl Into<String>,
    ) -> Self {
        Self {
            timestamp: timestamp.with_nanosecond(0).unwrap_or(timestamp),
            level,
            program: program.into(),
            function: function.into(),
            line,
            message: message.into(),
        }
    }

    pub fn timestamp(&self) -> DateTime<Local> {
        self.timestamp
    }

    pub fn level(&self) -> LogLevel {
        self.level
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn function(&self) -> &str {
        &self.function
    }

    pub fn line(&self) -> u32 {
        self.line
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Encode as one newline-terminated line.
    ///
    /// CR and LF inside the free-text fields are written as `\r` / `\n`
    /// escapes so a record can never span two stored lines.
    pub fn encode(&self) -> String {
        let mut line = self.encode_line();
        line.push('\n');
        line
    }

    /// Like [`LogRecord::encode`], but the frame never exceeds `max_len`
    /// bytes. The message tail is cut on a character boundary and the
    /// terminating newline is always kept.
    pub fn encode_bounded(&self, max_len: usize) -> String {
        let mut line = self.encode_line();
        truncate_on_char_boundary(&mut line, max_len.max(1) - 1);
        line.push('\n');
        line
    }

    fn encode_line(&self) -> String {
        format!(
            "{} {} {}:{}:{} {}",
            self.timestamp.format(CTIME_FORMAT),
            self.level,
            escape_line_breaks(&self.program),
            escape_line_breaks(&self.function),
            self.line,
            escape_line_breaks(&self.message),
        )
    }
}

fn escape_line_breaks(text: &str) -> Cow<'_, str> {
    if !text.contains(|c: char| c == '\n' || c == '\r') {
        return Cow::Borrowed(text);
    }
    Cow::Owned(text.replace('\r', "\\r").replace('\n', "\\n"))
}

fn truncate_on_char_boundary(text: &mut String, max_len: usize) {
    if text.len() <= max_len {
        return;
    }
    let mut cut = max_len;
    while !text.is_char_boundary(cut) {
        cut -= 1;
    }
    text.truncate(cut);
}

/// Prepare a received datagram for the store.
///
/// The daemon does not parse records. It only drops C-style NUL
/// terminators and makes sure the frame ends in exactly the newline that
/// separates stored records. Returns `None` when nothing is left to store.
pub fn store_frame(datagram: &[u8]) -> Option<Cow<'_, [u8]>> {
    let frame = strip_nul_terminator(datagram);
    if frame.is_empty() {
        return None;
    }
    if frame.ends_with(b"\n") {
        return Some(Cow::Borrowed(frame));
    }
    let mut owned = Vec::with_capacity(frame.len() + 1);
    owned.extend_from_slice(frame);
    owned.push(b'\n');
    Some(Cow::Owned(owned))
}

/// Trailing NUL bytes sent by producers that transmit C strings.
pub fn strip_nul_terminator(frame: &[u8]) -> &[u8] {
    let end = frame
        .iter()
        .rposition(|byte| *byte != 0)
        .map(|idx| idx + 1)
        .unwrap_or(0);
    &frame[..end]
}

// ---------------------------------------------------------------------------
// Control commands
// ---------------------------------------------------------------------------

/// Commands the daemon sends back to producers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlCommand {
    SetLevel(LogLevel),
}

impl ControlCommand {
    pub fn encode(&self) -> String {
        match self {
            ControlCommand::SetLevel(level) => {
                format!("{SET_LEVEL_PREFIX}={}", level.wire_value())
            }
        }
    }

    /// Decode a control frame. Unrecognized or malformed frames yield `None`.
    pub fn decode(frame: &[u8]) -> Option<Self> {
        let frame = strip_nul_terminator(frame);
        let text = std::str::from_utf8(frame).ok()?.trim_end();
        if !text.starts_with(SET_LEVEL_PREFIX) {
            return None;
        }
        let (_, value) = text.split_once('=')?;
        let value: u32 = value.parse().ok()?;
        LogLevel::from_wire(value).map(ControlCommand::SetLevel)
    }
}
