//! Session store adapters.
//!
//! Provides [`InMemorySessionStore`], a single authoritative process that
//! implements the [`SessionStoreGateway`](dialogos_application::SessionStoreGateway) port.

mod in_memory;

pub use in_memory::InMemorySessionStore;
