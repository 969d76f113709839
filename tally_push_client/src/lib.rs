//! Clients for the tally HTTP ingestor.
//!
//! [`HttpPushClient`] reports every failure to the caller. [`BestEffortSender`]
//! is for applications where analytics is a secondary sink: sending never
//! blocks or fails the caller, and failures go to an optional hook.

mod best_effort;
mod http;

pub use best_effort::{BestEffortSender, ErrorHook};
pub use http::{HttpPushClient, HttpPushClientError, Result};
