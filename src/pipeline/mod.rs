//! Pipeline entry points for watcher operations.
//!
//! - `diff`: partition fetched links against the store and classify title changes
//! - `run_watcher`: one full fetch → notify → persist pass

pub mod diff;
pub mod reconcile;

pub use diff::{LinkDiff, TitleChange, classify_title};
pub use reconcile::{RunSummary, run_watcher};
