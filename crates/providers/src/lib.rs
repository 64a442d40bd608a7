//! Provider adapters for long-running generation jobs.
//!
//! Each adapter normalizes one provider's HTTP API to the
//! [`JobAdapter`] contract (submit / poll / extract); [`lifecycle`] drives
//! an adapter from submission to artifact.
//!
//! | Adapter            | Provider           | Serves        |
//! |--------------------|--------------------|---------------|
//! | [`FalTextToImage`] | fal.ai FLUX        | `text2image`  |
//! | [`FalImageToImage`]| fal.ai FLUX        | `image2image` |
//! | [`KlingAdapter`]   | Kling via PiAPI    | `text2video`  |
//! | [`RunwayAdapter`]  | Runway Gen-3 Turbo | `text2video`  |

pub mod adapter;
pub mod error;
pub mod fal;
pub mod http;
pub mod job;
pub mod kling;
pub mod lifecycle;
pub mod runway;

pub use adapter::JobAdapter;
pub use error::ProviderError;
pub use fal::{FalImageToImage, FalTextToImage, TransformSettings};
pub use http::ProviderHttp;
pub use job::{Generation, Job, JobLinks, PollResponse, ProviderKind, Submission, TerminalJob, Usage};
pub use kling::KlingAdapter;
pub use lifecycle::{await_completion, run_job, PollPolicy};
pub use runway::RunwayAdapter;
