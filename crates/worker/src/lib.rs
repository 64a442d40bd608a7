//! The mediagen worker: configuration, per-step dispatch, and the event
//! loop that feeds it.
//!
//! Steps reach the worker through a [`StepStore`](mediagen_events::StepStore)
//! and `step.pending` events on an [`EventBus`](mediagen_events::EventBus).
//! An embedding coordinator owns both; the standalone binary can fill them
//! from stdin with [`feed_lines`].

pub mod config;
pub mod dispatcher;
pub mod feed;
pub mod runner;

pub use config::{ConfigError, CoordinationEnv, LogFormat, WorkerConfig};
pub use dispatcher::{DispatchError, HandleOutcome, StepHandler};
pub use feed::{feed_lines, FeedSummary};
pub use runner::run;
