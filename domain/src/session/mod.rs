//! Practice session domain.
//!
//! - [`entities::Session`]: the canonical session record shared by all clients
//! - [`phase::SessionPhase`]: where the session is in its lifecycle
//! - [`mutation::Mutation`]: a requested change, applied by [`entities::Session::apply`]
//! - [`view::SessionView`]: what one participant sees of the record

pub mod entities;
mod machine;
pub mod mutation;
pub mod participant;
pub mod phase;
pub mod role;
pub mod view;
