//! Test utilities for Autograph: a [`RecordingAdapter`] that records every
//! storage call, and model [`fixtures`].

pub mod fixtures;
mod recording;

pub use fixtures::{post_model, record, user_builder, user_model};
pub use recording::RecordingAdapter;
