//! One-shot partition resolver for five-person sessions

use crate::core::error::DomainError;
use crate::core::ids::{SessionId, UserId};
use crate::session::participant::{Participant, active_count};
use serde::{Deserialize, Serialize};

/// Number of active participants that requires a partition decision.
pub const PARTITION_GROUP_SIZE: usize = 5;

/// Sizes of the subgroups produced by a split, in creation order.
pub const SPLIT_SIZES: [usize; 2] = [2, 3];

/// Host decision for a five-person session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PartitionStrategy {
    /// Two independent sub-sessions of 2 and 3 participants
    Split,
    /// One group of five with two observer seats per round
    Together,
}

impl std::fmt::Display for PartitionStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PartitionStrategy::Split => write!(f, "split"),
            PartitionStrategy::Together => write!(f, "together"),
        }
    }
}

impl std::str::FromStr for PartitionStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "split" => Ok(PartitionStrategy::Split),
            "together" => Ok(PartitionStrategy::Together),
            other => Err(format!("Unknown partition strategy: {}. Valid: split, together", other)),
        }
    }
}

/// How observers are staffed when five participants stay together
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObserverStrategy {
    /// Two participants sit out each round as temporary observers, moving
    /// back into the active roles on the following rounds
    #[default]
    Rotating,
}

/// One half of a split session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subgroup {
    /// 1-based position of the subgroup
    pub index: usize,
    pub session_id: SessionId,
    pub members: Vec<UserId>,
}

/// Committed partition of a five-person session. Immutable once written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "strategy", rename_all = "lowercase")]
pub enum GroupConfiguration {
    Split { subgroups: Vec<Subgroup> },
    Together { observer_strategy: ObserverStrategy },
}

impl GroupConfiguration {
    pub fn strategy(&self) -> PartitionStrategy {
        match self {
            GroupConfiguration::Split { .. } => PartitionStrategy::Split,
            GroupConfiguration::Together { .. } => PartitionStrategy::Together,
        }
    }

    pub fn is_split(&self) -> bool {
        matches!(self, GroupConfiguration::Split { .. })
    }

    pub fn subgroups(&self) -> &[Subgroup] {
        match self {
            GroupConfiguration::Split { subgroups } => subgroups,
            GroupConfiguration::Together { .. } => &[],
        }
    }

    /// Subgroup a participant was assigned to, if the session was split.
    pub fn subgroup_of(&self, user: &UserId) -> Option<&Subgroup> {
        self.subgroups().iter().find(|g| g.members.contains(user))
    }
}

/// Resolves the partition decision for a five-person session.
pub struct PartitionResolver;

impl PartitionResolver {
    /// Compute the group configuration for `strategy`.
    ///
    /// Active participants are split in join order: the first two form
    /// subgroup 1, the remaining three subgroup 2. Permanent observers
    /// follow the larger subgroup.
    pub fn resolve(
        session_id: &SessionId,
        participants: &[Participant],
        existing: Option<&GroupConfiguration>,
        strategy: PartitionStrategy,
    ) -> Result<GroupConfiguration, DomainError> {
        if existing.is_some() {
            return Err(DomainError::GroupPartitionAlreadyResolved);
        }

        let active = active_count(participants);
        if active != PARTITION_GROUP_SIZE {
            return Err(DomainError::InvalidInput(format!(
                "group partition applies to {} active participants, session has {}",
                PARTITION_GROUP_SIZE, active
            )));
        }

        match strategy {
            PartitionStrategy::Together => Ok(GroupConfiguration::Together {
                observer_strategy: ObserverStrategy::Rotating,
            }),
            PartitionStrategy::Split => {
                let mut actives = participants.iter().filter(|p| p.is_active());
                let mut subgroups = Vec::with_capacity(SPLIT_SIZES.len());
                for (i, size) in SPLIT_SIZES.iter().enumerate() {
                    let members: Vec<UserId> =
                        actives.by_ref().take(*size).map(|p| p.id.clone()).collect();
                    subgroups.push(Subgroup {
                        index: i + 1,
                        session_id: session_id.subgroup(i + 1),
                        members,
                    });
                }
                if let Some(larger) = subgroups.last_mut() {
                    larger.members.extend(
                        participants
                            .iter()
                            .filter(|p| p.is_passive())
                            .map(|p| p.id.clone()),
                    );
                }
                Ok(GroupConfiguration::Split { subgroups })
            }
        }
    }
}
