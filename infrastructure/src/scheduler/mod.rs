//! Store-side timers.
//!
//! Provides [`AutoAdvanceScheduler`], which leaves the scribe-feedback
//! review after a fixed delay without depending on any client's clock.

mod auto_advance;

pub use auto_advance::AutoAdvanceScheduler;
