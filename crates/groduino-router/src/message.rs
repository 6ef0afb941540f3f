//! Outbound message assembly.
//!
//! Every message the controller sends has the same envelope:
//!
//! ```text
//! "GTYP":"<kind>",<fragment><fragment>..."GEND":0
//! ```
//!
//! The link adds the outer `{...},` when sending.

use std::fmt;

/// Envelope type written to the `GTYP` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    /// Periodic telemetry.
    Stream,
    /// Reply to one instruction line.
    Response,
}

impl MessageKind {
    /// Value of the `GTYP` field.
    pub const fn as_str(&self) -> &'static str {
        match self {
            MessageKind::Stream => "Stream",
            MessageKind::Response => "Response",
        }
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Builder owning the buffer for one outbound message.
#[derive(Debug, Clone)]
pub struct MessageBuilder {
    kind: MessageKind,
    buffer: String,
    fragments: usize,
}

impl MessageBuilder {
    /// Start a message of the given kind.
    pub fn new(kind: MessageKind) -> Self {
        let mut buffer = String::with_capacity(128);
        buffer.push_str("\"GTYP\":\"");
        buffer.push_str(kind.as_str());
        buffer.push_str("\",");
        Self {
            kind,
            buffer,
            fragments: 0,
        }
    }

    /// Start a telemetry message.
    pub fn stream() -> Self {
        Self::new(MessageKind::Stream)
    }

    /// Start an instruction response.
    pub fn response() -> Self {
        Self::new(MessageKind::Response)
    }

    /// Kind of message being built.
    pub fn kind(&self) -> MessageKind {
        self.kind
    }

    /// Append fragments verbatim. Empty text is skipped.
    pub fn push(&mut self, fragments: &str) -> &mut Self {
        if !fragments.is_empty() {
            self.buffer.push_str(fragments);
            self.fragments += 1;
        }
        self
    }

    /// Returns true if nothing has been pushed.
    pub fn is_empty(&self) -> bool {
        self.fragments == 0
    }

    /// Close the envelope and return the message body.
    pub fn finish(mut self) -> String {
        self.buffer.push_str("\"GEND\":0");
        self.buffer
    }
}
