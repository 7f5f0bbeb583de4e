//! The `/sse` endpoint: one long-lived Server-Sent Events response per open page.
//!
//! The broadcasting itself lives in the `sse` crate; this module only subscribes on
//! behalf of the browser and relays what arrives, plus keepalive pings and the
//! shutdown `close` directive.

pub(crate) mod handler;
