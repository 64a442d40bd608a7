//! Generation façade for the mediagen worker.
//!
//! - [`Generator`]: the single `generate` operation callers depend on.
//! - [`ProviderRouter`]: routes each request kind to its provider adapter.
//! - [`DummyGenerator`]: provider-free test double with canned URLs.
//! - [`telemetry`]: usage-recording sidecar applied as a decorator.

pub mod dummy;
pub mod error;
pub mod generator;
pub mod router;
pub mod telemetry;

pub use dummy::DummyGenerator;
pub use error::GenerationError;
pub use generator::Generator;
pub use router::{ProviderRouter, ProviderSettings, VideoBackend};
pub use telemetry::{
    HttpUsageSink, Identity, NoopUsageSink, ObservedGenerator, Sidecar, SinkError,
    TracingUsageSink, UsageRecord, UsageSink,
};
