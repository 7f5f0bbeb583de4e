//! Change notification events for the groceries application.
//!
//! This crate defines the unit of notification pushed to browsers over Server-Sent
//! Events and its wire encoding. It has no dependencies on the transport (`sse`) or
//! the web layer, so both the broadcaster and the HTTP handler can share it.
//!
//! # Architecture
//!
//! - **Event**: a channel name plus optional text data, immutable once created
//! - **Channel**: the domain channels collaborators publish on after a mutation
//! - **Event::write**: SSE framing with one `data:` line per line of text
//!
//! Events are JSON-serializable so they can also travel through an external broker
//! between server processes.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::Write;

pub mod error;

pub use error::{Error, EventErrorKind};

/// Name of the terminal event sent when the server shuts down.
pub const CLOSE_EVENT: &str = "close";

/// Name of the keepalive event.
pub const PING_EVENT: &str = "ping";

/// Domain channels a browser subscribes to. Each one names the part of the UI that
/// should refresh when something it displays changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    List,
    Cart,
    Category,
    Recipe,
}

impl Channel {
    /// Every domain channel, in the order a streaming connection subscribes to them.
    pub const ALL: [Channel; 4] = [
        Channel::List,
        Channel::Cart,
        Channel::Category,
        Channel::Recipe,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Channel::List => "list",
            Channel::Cart => "cart",
            Channel::Category => "category",
            Channel::Recipe => "recipe",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl AsRef<str> for Channel {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

/// A single change notification.
///
/// `event` is the channel the notification was published on and becomes the SSE
/// `event:` field. `data` is optional; browsers only dispatch events that carry a data
/// field, so the encoder always writes one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub event: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
}

impl Event {
    pub fn new(event: impl Into<String>, data: Option<String>) -> Self {
        Self {
            event: event.into(),
            data,
        }
    }

    /// Keepalive carrying the current time so proxies see traffic on idle streams.
    pub fn ping() -> Self {
        Self::new(PING_EVENT, Some(chrono::Utc::now().to_rfc3339()))
    }

    /// Tells the browser the server is going away. The markup replaces the element
    /// listening for it with an empty one.
    pub fn close() -> Self {
        Self::new(CLOSE_EVENT, Some("<div></div>".to_string()))
    }

    pub fn is_close(&self) -> bool {
        self.event == CLOSE_EVENT
    }

    /// Encode the event in SSE framing and flush `sink`.
    ///
    /// Each line of `data` gets its own `data: ` prefix so embedded newlines can't end
    /// the message early. Absent or empty data is written as a single empty `data: `
    /// line. A sink that can't be flushed yields `StreamingUnsupported`.
    pub fn write<W: Write + ?Sized>(&self, sink: &mut W) -> Result<(), Error> {
        sink.write_all(self.encode().as_bytes()).map_err(Error::io)?;
        sink.flush().map_err(Error::streaming_unsupported)
    }

    /// The SSE wire form of the event, including the blank line terminator.
    pub fn encode(&self) -> String {
        let mut out = String::new();

        if !self.event.is_empty() {
            out.push_str("event: ");
            out.push_str(&self.event);
            out.push('\n');
        }

        match self.data.as_deref() {
            Some(data) if !data.is_empty() => {
                for line in data.split('\n') {
                    out.push_str("data: ");
                    out.push_str(line);
                    out.push('\n');
                }
            }
            _ => out.push_str("data: \n"),
        }

        out.push('\n');
        out
    }

    /// Serialize for transport through an external broker.
    pub fn to_json(&self) -> Result<String, Error> {
        serde_json::to_string(self).map_err(Error::serialization)
    }

    pub fn from_json(payload: &str) -> Result<Self, Error> {
        serde_json::from_str(payload).map_err(Error::deserialization)
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.data.as_deref().unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    /// Sink that accepts bytes but can't deliver them incrementally.
    struct Unflushable(Vec<u8>);

    impl Write for Unflushable {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.write(buf)
        }

        fn flush(&mut self) -> io::Result<()> {
            Err(io::Error::new(
                io::ErrorKind::Unsupported,
                "sink does not support incremental delivery",
            ))
        }
    }

    fn event(name: &str, data: Option<&str>) -> Event {
        Event::new(name, data.map(str::to_string))
    }

    fn written(event: &Event) -> String {
        let mut sink = Vec::new();
        event.write(&mut sink).unwrap();
        String::from_utf8(sink).unwrap()
    }

    #[test]
    fn test_display_is_data_text() {
        assert_eq!(event("update", Some("test data")).to_string(), "test data");
        assert_eq!(event("ping", Some("")).to_string(), "");
        assert_eq!(event("ping", None).to_string(), "");
        assert_eq!(
            event("message", Some("line1\nline2\nline3")).to_string(),
            "line1\nline2\nline3"
        );
    }

    #[test]
    fn test_write_simple_data() {
        assert_eq!(
            written(&event("update", Some("test data"))),
            "event: update\ndata: test data\n\n"
        );
    }

    #[test]
    fn test_write_without_event_name() {
        assert_eq!(
            written(&event("", Some("data only"))),
            "data: data only\n\n"
        );
    }

    #[test]
    fn test_write_absent_data_still_has_data_line() {
        assert_eq!(written(&event("ping", None)), "event: ping\ndata: \n\n");
    }

    #[test]
    fn test_write_empty_data_still_has_data_line() {
        assert_eq!(written(&event("empty", Some(""))), "event: empty\ndata: \n\n");
    }

    #[test]
    fn test_write_multiline_data() {
        assert_eq!(
            written(&event("message", Some("line1\nline2\nline3"))),
            "event: message\ndata: line1\ndata: line2\ndata: line3\n\n"
        );
    }

    #[test]
    fn test_write_trailing_newline() {
        assert_eq!(
            written(&event("test", Some("data\n"))),
            "event: test\ndata: data\ndata: \n\n"
        );
    }

    #[test]
    fn test_data_line_count_matches_newlines() {
        for data in [
            "test: value\nwith: colons",
            "line1\n\n\nline2",
            "\n\n\n",
            "single",
        ] {
            let output = written(&event("complex", Some(data)));

            assert!(output.starts_with("event: complex\n"));
            assert!(output.ends_with("\n\n"));
            assert_eq!(
                output.matches("data: ").count(),
                data.matches('\n').count() + 1,
                "data lines for {data:?}"
            );
        }
    }

    #[test]
    fn test_write_reports_unflushable_sink() {
        let mut sink = Unflushable(Vec::new());

        let err = event("test", Some("data")).write(&mut sink).unwrap_err();

        assert_eq!(err.error_kind, EventErrorKind::StreamingUnsupported);
        // The frame was still handed to the sink before the flush failed
        assert_eq!(sink.0, b"event: test\ndata: data\n\n");
    }

    #[test]
    fn test_close_and_ping_events() {
        let close = Event::close();
        assert!(close.is_close());
        assert_eq!(written(&close), "event: close\ndata: <div></div>\n\n");

        let ping = Event::ping();
        assert_eq!(ping.event, PING_EVENT);
        let stamp = ping.data.as_deref().unwrap();
        assert!(chrono::DateTime::parse_from_rfc3339(stamp).is_ok());
    }

    #[test]
    fn test_json_transport_preserves_event() {
        let original = event("cart", Some("item done"));

        let decoded = Event::from_json(&original.to_json().unwrap()).unwrap();
        assert_eq!(decoded, original);

        let bare = Event::from_json(r#"{"event":"list"}"#).unwrap();
        assert_eq!(bare, event("list", None));
    }

    #[test]
    fn test_malformed_json_is_deserialization_error() {
        let err = Event::from_json("not json").unwrap_err();
        assert_eq!(err.error_kind, EventErrorKind::Deserialization);
    }

    #[test]
    fn test_channel_names() {
        let names: Vec<&str> = Channel::ALL.iter().map(Channel::as_str).collect();
        assert_eq!(names, ["list", "cart", "category", "recipe"]);
        assert_eq!(Channel::Cart.to_string(), "cart");
    }
}
