//! Text frame: command, headers, body.
//!
//! A `Frame` is one protocol message. On the wire:
//!
//! `COMMAND\n` + (`name:value\n`)* + `\n` + body + `\0`
//!
//! Building is exact; parsing is deliberately lenient so a slightly malformed
//! broker frame degrades to empty fields instead of tearing down the session.

use bytes::{BufMut, Bytes, BytesMut};

use crate::{
    Command,
    headers::{Headers, names},
};

/// Frame terminator byte.
pub const TERMINATOR: u8 = 0;

/// Complete protocol frame.
///
/// # Invariants
///
/// - Header names and values never contain `\n`, and names never contain `:`.
///   This is a caller precondition (checked only in debug builds): violating
///   it corrupts framing.
///
/// - The body never contains [`TERMINATOR`]. Bodies produced by this crate
///   are plain text and satisfy this by construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Command token
    pub command: Command,

    /// Headers in emission order
    pub headers: Headers,

    /// Body text, possibly empty
    pub body: String,
}

impl Frame {
    /// Create a frame with no headers and an empty body.
    pub fn new(command: Command) -> Self {
        Self { command, headers: Headers::new(), body: String::new() }
    }

    /// Append (or overwrite) a header.
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl ToString) -> Self {
        let name = name.into();
        let value = value.to_string();

        debug_assert!(!name.contains(['\n', ':']), "header name must be single-line and colon-free");
        debug_assert!(!value.contains('\n'), "header value must be single-line");

        self.headers.insert(name, value);
        self
    }

    /// Replace the body.
    #[must_use]
    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        debug_assert!(!self.body.as_bytes().contains(&TERMINATOR));
        self
    }

    /// CONNECT: `accept-version`, `host`, `login`, `passcode`.
    pub fn connect(accept_version: &str, host: &str, login: &str, passcode: &str) -> Self {
        Self::new(Command::Connect)
            .header(names::ACCEPT_VERSION, accept_version)
            .header(names::HOST, host)
            .header(names::LOGIN, login)
            .header(names::PASSCODE, passcode)
    }

    /// SUBSCRIBE: `destination`, `id`, `receipt`.
    pub fn subscribe(channel: &str, subscription_id: u64, receipt_id: u64) -> Self {
        Self::new(Command::Subscribe)
            .header(names::DESTINATION, destination(channel))
            .header(names::ID, subscription_id)
            .header(names::RECEIPT, receipt_id)
    }

    /// UNSUBSCRIBE: `id`, `receipt`.
    pub fn unsubscribe(subscription_id: u64, receipt_id: u64) -> Self {
        Self::new(Command::Unsubscribe)
            .header(names::ID, subscription_id)
            .header(names::RECEIPT, receipt_id)
    }

    /// SEND: `destination`, with the report text as body.
    pub fn send(channel: &str, body: impl Into<String>) -> Self {
        Self::new(Command::Send).header(names::DESTINATION, destination(channel)).with_body(body)
    }

    /// DISCONNECT: `receipt`.
    pub fn disconnect(receipt_id: u64) -> Self {
        Self::new(Command::Disconnect).header(names::RECEIPT, receipt_id)
    }

    /// Shorthand for a header lookup.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.headers.get(name)
    }

    /// Number of bytes [`Frame::encode`] writes.
    pub fn encoded_len(&self) -> usize {
        let headers: usize =
            self.headers.iter().map(|(name, value)| name.len() + value.len() + 2).sum();

        self.command.as_str().len() + 1 + headers + 1 + self.body.len() + 1
    }

    /// Encode frame into buffer.
    ///
    /// Writes: `COMMAND\n` + `name:value\n`* + `\n` + body + `\0`
    pub fn encode(&self, dst: &mut impl BufMut) {
        dst.put_slice(self.command.as_str().as_bytes());
        dst.put_u8(b'\n');

        for (name, value) in self.headers.iter() {
            dst.put_slice(name.as_bytes());
            dst.put_u8(b':');
            dst.put_slice(value.as_bytes());
            dst.put_u8(b'\n');
        }

        dst.put_u8(b'\n');
        dst.put_slice(self.body.as_bytes());
        dst.put_u8(TERMINATOR);
    }

    /// Encode into a freshly allocated buffer.
    pub fn to_bytes(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(self.encoded_len());
        self.encode(&mut buf);
        buf.freeze()
    }

    /// Decode a frame from wire bytes.
    ///
    /// Never fails. The contract, in order:
    ///
    /// - Everything from the first [`TERMINATOR`] on is ignored; without a
    ///   terminator the whole buffer is used.
    /// - No `\n` at all: empty command, no headers, empty body.
    /// - Command: text before the first `\n`.
    /// - Headers: lines between the command line and the first empty line.
    ///   Each splits on its first `:`; one leading space of the value is
    ///   stripped. Lines without `:` are dropped. Repeated names: last wins.
    /// - Body: everything after the empty line.
    /// - No empty line after the command line: no headers, empty body.
    ///
    /// A trailing `\r` on the command line and on header lines is stripped,
    /// so a line holding only `\r` counts as the empty line.
    /// Invalid UTF-8 is replaced, not rejected.
    pub fn decode(bytes: &[u8]) -> Self {
        let end = bytes.iter().position(|&b| b == TERMINATOR).unwrap_or(bytes.len());
        let text = String::from_utf8_lossy(&bytes[..end]);

        let Some((command_line, rest)) = text.split_once('\n') else {
            return Self::new(Command::Other(String::new()));
        };

        let command = Command::from_token(strip_cr(command_line));

        let Some((header_section, body)) = split_at_blank_line(rest) else {
            return Self::new(command);
        };

        let headers = header_section
            .split('\n')
            .map(strip_cr)
            .filter_map(|line| line.split_once(':'))
            .map(|(name, value)| (name, value.strip_prefix(' ').unwrap_or(value)))
            .collect();

        Self { command, headers, body: body.to_string() }
    }
}

/// Broker destination for a channel: `/` + channel.
pub fn destination(channel: &str) -> String {
    format!("/{channel}")
}

/// Channel name for a destination, with one leading `/` removed.
pub fn channel_of(destination: &str) -> &str {
    destination.strip_prefix('/').unwrap_or(destination)
}

/// Split at the first empty line: (header lines, body after it).
fn split_at_blank_line(rest: &str) -> Option<(&str, &str)> {
    let mut start = 0;
    while let Some(len) = rest[start..].find('\n') {
        let line = &rest[start..start + len];
        if strip_cr(line).is_empty() {
            return Some((&rest[..start], &rest[start + len + 1..]));
        }
        start += len + 1;
    }
    None
}

fn strip_cr(line: &str) -> &str {
    line.strip_suffix('\r').unwrap_or(line)
}
