//! Resolve group partition use case
//!
//! A five-person session either stays together or splits into a pair and
//! a trio. Splitting is two steps against the store: commit the decision
//! on the parent record, then create one sub-session per subgroup. The
//! second step is idempotent, so a client that finds a committed split
//! without its sub-sessions can finish the job with [`ResolvePartitionUseCase::resume`].

use crate::ports::session_store::{SessionStoreGateway, StoreError};
use dialogos_domain::{
    GroupConfiguration, Mutation, PartitionStrategy, SessionId, SessionInit, SessionOp, UserId,
};
use std::sync::Arc;
use tracing::{debug, info};

/// Output of a partition resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartitionOutcome {
    pub configuration: GroupConfiguration,
    /// Ids of the sub-sessions, in subgroup order (empty when together)
    pub sub_sessions: Vec<SessionId>,
}

pub struct ResolvePartitionUseCase {
    store: Arc<dyn SessionStoreGateway>,
}

impl ResolvePartitionUseCase {
    pub fn new(store: Arc<dyn SessionStoreGateway>) -> Self {
        Self { store }
    }

    /// Commit `strategy` for `session_id` on behalf of `host`.
    ///
    /// A second resolution is refused with `GroupPartitionAlreadyResolved`.
    pub async fn execute(
        &self,
        session_id: &SessionId,
        host: &UserId,
        strategy: PartitionStrategy,
    ) -> Result<PartitionOutcome, StoreError> {
        let mutation = Mutation::new(host.clone(), SessionOp::ResolveGroupPartition { strategy });
        self.store.apply_mutation(session_id, mutation).await?;
        info!("Session {} resolved as {}", session_id, strategy);
        self.resume(session_id).await
    }

    /// Create any missing sub-sessions of a committed split.
    pub async fn resume(&self, session_id: &SessionId) -> Result<PartitionOutcome, StoreError> {
        let parent = self.store.load_session(session_id).await?;
        let Some(configuration) = parent.group_configuration.clone() else {
            return Err(dialogos_domain::DomainError::GroupPartitionRequired.into());
        };

        let mut sub_sessions = Vec::new();
        for subgroup in configuration.subgroups() {
            let init = SessionInit::subgroup_of(&parent, subgroup.index, &subgroup.members);
            match self.store.create_session(init).await {
                Ok(id) => {
                    info!(
                        "Created sub-session {} with {} members",
                        id,
                        subgroup.members.len()
                    );
                    sub_sessions.push(id);
                }
                Err(StoreError::AlreadyExists(id)) => {
                    debug!("Sub-session {} already exists", id);
                    sub_sessions.push(id);
                }
                Err(e) => return Err(e),
            }
        }

        Ok(PartitionOutcome {
            configuration,
            sub_sessions,
        })
    }
}
