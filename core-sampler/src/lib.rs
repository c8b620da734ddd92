//! # Time-Window Sampler
//!
//! Picks a spaced-out subset of timestamped camera images from a remote
//! listing and turns each into a streamable event.
//!
//! ## Overview
//!
//! - [`parse_capture_time`] reads the capture time from a file name
//! - [`TimeWindowSelector`] applies size, spacing, horizon and count limits
//! - [`StreamSession`] pages through a [`bridge_traits::StorageProvider`],
//!   fetches accepted files and sends [`StreamEvent`]s one at a time

pub mod encode;
pub mod error;
pub mod event;
pub mod selector;
pub mod session;
pub mod timestamp;

pub use encode::encode_data_uri;
pub use error::{Result, SessionError};
pub use event::{StreamEvent, STREAM_ERROR_MESSAGE};
pub use selector::{
    Decision, Direction, SelectionConfig, SelectionCursor, SkipReason, SpacingUnit,
    TimeWindowSelector,
};
pub use session::{SessionOutcome, StreamSession};
pub use timestamp::parse_capture_time;
