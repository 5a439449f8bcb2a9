//! Role rotation domain
//!
//! Decides how many rounds a session runs and which role every active
//! participant holds in each round. Pure: no clock, no store.
//!
//! | Active | Rounds | Cycle |
//! |--------|--------|-------|
//! | 2 | 2 | speaker ↔ listener |
//! | 3 | 3 | speaker → listener → scribe |
//! | 4 | 4 | speaker → listener → scribe → observer-temporary |
//! | 5 | 5 | requires a partition; "together" adds a second observer seat |
//!
//! Permanent observers are excluded from the active count and keep their role.

pub mod policy;

pub use policy::RotationPolicy;
