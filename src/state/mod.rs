//! State module for tracking crawl progress
//!
//! - `TargetState`: the traversal state of one URL identity within a session

mod target_state;

pub use target_state::TargetState;
