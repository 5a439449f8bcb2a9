//! Application-level configuration.
//!
//! - [`SessionPolicyConfig`]: defaults and timing applied when sessions are
//!   created and driven

pub mod session_policy;

pub use session_policy::SessionPolicyConfig;
