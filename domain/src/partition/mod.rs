//! Group partition domain
//!
//! A five-person session cannot rotate as a single group until the host
//! decides, exactly once, whether to split it (2 + 3) or keep it together
//! with two rotating observer seats.

pub mod resolver;

pub use resolver::{
    GroupConfiguration, ObserverStrategy, PartitionResolver, PartitionStrategy, Subgroup,
};
