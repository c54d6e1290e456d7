//! Image-rendering collaborator: gptunnel media API client.
//!
//! Rendering is asynchronous on the service side: a create call returns a
//! job id which is then polled at a fixed interval up to a bounded wait.
//! All rendering failures are *soft* — the pipeline must be able to skip a
//! variant's image without aborting the campaign — so the client returns
//! `Ok(None)` for everything except transport-level errors.

pub mod client;
pub mod poll;

pub use client::{GptunnelClient, ImageGenError, ImageRenderer};
pub use poll::{poll_until_done, PollOutcome, PollStatus};
