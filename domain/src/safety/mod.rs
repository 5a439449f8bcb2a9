//! Safety interrupt domain
//!
//! Any non-passive participant can pause the whole session. The pause is
//! independent of the phase sequence: it blocks round progression and
//! freezes the round clock until the requester (or, by configuration, the
//! host) ends it. There is no automatic expiry.

pub mod clock;
pub mod overlay;

pub use clock::RoundClock;
pub use overlay::{SafetyEndOutcome, SafetyEndPolicy, SafetyRequestOutcome, SafetyTimeoutState};
