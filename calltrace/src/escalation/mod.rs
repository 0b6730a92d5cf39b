//! Error escalation.
//!
//! When an observed call fails, an [`ErrorRecord`] is built on the calling
//! thread from the unmasked arguments, logged synchronously, and (when
//! enabled for the method) handed to a detached task that publishes it to an
//! [`ErrorSink`]. The caller never waits for, or learns about, the outcome.

mod pipeline;
mod record;
mod sink;

pub use pipeline::ErrorEscalation;
pub use record::ErrorRecord;
pub use sink::{ChannelErrorSink, DiscardErrorSink, ErrorMessage, ErrorSink};
