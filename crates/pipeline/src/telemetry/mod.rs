//! Usage telemetry wrapped around generation calls.
//!
//! The [`Sidecar`] records one [`UsageRecord`] per successful generation
//! and hands it to a [`UsageSink`] without ever affecting the outcome the
//! caller sees. [`ObservedGenerator`] applies it as a decorator over any
//! [`Generator`](crate::Generator).

pub mod identity;
pub mod sidecar;
pub mod sink;

pub use identity::Identity;
pub use sidecar::{ObservedGenerator, Sidecar};
pub use sink::{HttpUsageSink, NoopUsageSink, SinkError, TracingUsageSink, UsageRecord, UsageSink};
