//! Scripted session run against the in-memory store
//!
//! Every participant gets their own [`SessionClient`] and camera. The host
//! drives the phases while the store's scheduler ends each scribe-feedback
//! review on its own.

use anyhow::{Context, Result, bail};
use dialogos_application::{
    CreateSessionInput, CreateSessionUseCase, SessionClient, SessionClientError,
    SessionPolicyConfig, SessionStoreGateway, StoreError, VideoCallController,
};
use dialogos_domain::session::entities::MAX_PARTICIPANTS;
use dialogos_domain::{
    DomainError, MutationOutcome, NoOpReason, PartitionStrategy, Role, SessionId, SessionPhase,
    UserId,
};
use dialogos_infrastructure::{AutoAdvanceScheduler, LocalVideoCall};
use dialogos_presentation::{OutputFormatter, SimulateArgs};
use std::slice;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

const CAST: [&str; 5] = ["Ada", "Bao", "Caro", "Dev", "Eli"];
const OBSERVER: (&str, &str) = ("u-obs", "Pat");

const PRESET_TOPIC: &str = "Something that surprised me this week";
const PROPOSED_TOPIC: &str = "A decision I keep putting off";

/// Grace period on top of the auto-advance delay before giving up.
const AUTO_ADVANCE_SLACK: Duration = Duration::from_secs(5);

/// One participant's device
struct Member {
    name: String,
    client: SessionClient,
}

pub struct Simulation {
    store: Arc<dyn SessionStoreGateway>,
    scheduler: AutoAdvanceScheduler,
    policy: SessionPolicyConfig,
    formatter: Box<dyn OutputFormatter>,
}

impl Simulation {
    pub fn new(
        store: Arc<dyn SessionStoreGateway>,
        scheduler: AutoAdvanceScheduler,
        policy: SessionPolicyConfig,
        formatter: Box<dyn OutputFormatter>,
    ) -> Self {
        Self {
            store,
            scheduler,
            policy,
            formatter,
        }
    }

    pub async fn run(&self, args: &SimulateArgs) -> Result<()> {
        if !(2..=CAST.len()).contains(&args.participants) {
            bail!(
                "--participants must be between 2 and {}, got {}",
                CAST.len(),
                args.participants
            );
        }

        let seats = args.participants + usize::from(args.passive_observer);
        let policy = if seats > self.policy.max_participants {
            self.policy
                .clone()
                .with_participant_limits(self.policy.min_participants, seats.min(MAX_PARTICIPANTS))
        } else {
            self.policy.clone()
        };

        let host_id = UserId::new("u1");
        let mut input = CreateSessionInput::new("Listening practice", host_id, CAST[0])
            .with_topic_suggestions(vec![PRESET_TOPIC.to_string()]);
        if let Some(minutes) = args.round_minutes {
            input = input.with_round_minutes(minutes);
        }
        let session_id = CreateSessionUseCase::new(Arc::clone(&self.store), policy)
            .execute(input)
            .await?;
        info!("Created session {}", session_id);

        let mut members = Vec::with_capacity(seats);
        for (i, name) in CAST.iter().take(args.participants).enumerate() {
            let member = self.member(&session_id, UserId::new(format!("u{}", i + 1)), name);
            if i > 0 {
                member.client.join(name).await?;
            }
            members.push(member);
        }
        if args.passive_observer {
            let observer = self.member(&session_id, UserId::new(OBSERVER.0), OBSERVER.1);
            observer.client.join(OBSERVER.1).await?;
            observer.client.choose_role(Role::ObserverPermanent).await?;
            members.push(observer);
        }

        self.show("Lobby", &members[..1]).await?;

        if args.participants == 5 {
            let strategy = PartitionStrategy::from(args.partition);
            let outcome = members[0].client.resolve_partition(strategy).await?;
            self.show(&format!("Partition: {}", strategy), &members).await?;

            if !outcome.sub_sessions.is_empty() {
                for sub_id in &outcome.sub_sessions {
                    let sub = self.store.load_session(sub_id).await?;
                    let host = self.member(sub_id, sub.host_id.clone(), &sub.host_name);
                    let sub_members: Vec<Member> = sub
                        .participants
                        .iter()
                        .map(|p| self.member(sub_id, p.id.clone(), &p.display_name))
                        .collect();
                    self.run_session(sub_id, &host, &sub_members).await?;
                }
                return Ok(());
            }
        }

        self.run_session(&session_id, &members[0], &members).await
    }

    /// Walk one session from the lobby to reflection.
    async fn run_session(&self, session_id: &SessionId, host: &Member, members: &[Member]) -> Result<()> {
        let watcher = self.scheduler.watch(session_id.clone()).await?;

        host.client.start().await?;
        self.choose_topic(host, members).await?;
        host.client.complete_hello_check_in().await?;

        let total = host
            .client
            .load()
            .await?
            .total_rounds()
            .context("session started without a rotation")?;

        for round in 1..=total {
            self.show(&format!("Round {} of {}", round, total), members)
                .await?;

            if round == 1 {
                self.safety_pause(host, members).await?;
            }
            self.take_notes(host, members).await?;

            if round == 1 {
                self.complete_round_twice(session_id, host).await?;
            } else {
                host.client.complete_round().await?;
            }

            if round < total {
                self.await_auto_advance(host).await?;
            }
        }

        self.show("Rounds complete", slice::from_ref(host)).await?;
        host.client.start_free_dialogue().await?;
        host.client.end_session().await?;
        self.show("Reflection", slice::from_ref(host)).await?;

        watcher.await.context("auto-advance watcher stopped abnormally")?;
        Ok(())
    }

    /// A participant proposes a topic, everyone votes for it, the host adopts the leader.
    async fn choose_topic(&self, host: &Member, members: &[Member]) -> Result<()> {
        let proposer = members
            .iter()
            .find(|m| m.client.user() != host.client.user())
            .unwrap_or(host);
        proposer.client.suggest_topic(PROPOSED_TOPIC).await?;

        let session = host.client.load().await?;
        if let Some(proposed) = session.topics.iter().find(|t| t.text == PROPOSED_TOPIC) {
            for member in members {
                member.client.vote_topic(proposed.id.clone()).await?;
            }
        }

        self.show("Topic selection", slice::from_ref(host)).await?;
        host.client.select_topic(None).await?;
        Ok(())
    }

    /// First non-host active participant pauses; the host cannot advance until it ends.
    async fn safety_pause(&self, host: &Member, members: &[Member]) -> Result<()> {
        let session = host.client.load().await?;
        let Some(requester) = members.iter().find(|m| {
            m.client.user() != host.client.user()
                && session.role_of(m.client.user()).is_some_and(|r| r.is_active())
        }) else {
            return Ok(());
        };

        requester.client.request_safety_timeout().await?;
        self.show(
            &format!("{} asked for a safety pause", requester.name),
            slice::from_ref(requester),
        )
        .await?;

        match host.client.complete_round().await {
            Err(SessionClientError::Store(StoreError::Rejected(DomainError::SafetyPauseActive))) => {
                info!("Round progression held while {} is paused", requester.name);
            }
            Ok(outcome) => bail!("round advanced during a safety pause: {:?}", outcome),
            Err(e) => return Err(e.into()),
        }

        requester.client.end_safety_timeout().await?;
        // Camera back on
        requester.client.toggle_video().await?;
        Ok(())
    }

    async fn take_notes(&self, host: &Member, members: &[Member]) -> Result<()> {
        let session = host.client.load().await?;
        let Some(scribe) = session
            .holder_of(Role::Scribe)
            .and_then(|p| members.iter().find(|m| m.client.user() == &p.id))
        else {
            return Ok(());
        };
        let speaker = session
            .holder_of(Role::Speaker)
            .map(|p| p.display_name.as_str())
            .unwrap_or("The speaker");

        scribe
            .client
            .submit_scribe_notes(&format!(
                "{} described a moment of feeling unheard and what helped.",
                speaker
            ))
            .await?;
        Ok(())
    }

    /// The host's laptop and tablet both press "complete round"; the store commits once.
    async fn complete_round_twice(&self, session_id: &SessionId, host: &Member) -> Result<()> {
        let tablet = self.member(session_id, host.client.user().clone(), &host.name);
        host.client.load().await?;
        tablet.client.load().await?;

        let (laptop, other) = futures::join!(host.client.complete_round(), tablet.client.complete_round());
        let outcomes = [laptop?, other?];

        let committed = outcomes.iter().filter(|o| o.is_applied()).count();
        let stale = outcomes
            .iter()
            .filter(|o| matches!(o, MutationOutcome::Unchanged(NoOpReason::StaleGuard)))
            .count();
        info!(
            "Duplicate round completion: {} committed, {} ignored as stale",
            committed, stale
        );
        if committed != 1 {
            bail!("expected exactly one committed round completion, got {}", committed);
        }

        host.client.load().await?;
        Ok(())
    }

    async fn await_auto_advance(&self, host: &Member) -> Result<()> {
        let mut subscription = host.client.subscribe().await?;
        let mut session = subscription.current();
        if session.phase == SessionPhase::Transition {
            info!(
                "Scribe feedback for round {}, next round in {:?}",
                session.round,
                self.scheduler.delay()
            );
        }

        tokio::time::timeout(self.scheduler.delay() + AUTO_ADVANCE_SLACK, async {
            while session.phase == SessionPhase::Transition {
                session = subscription.changed().await?;
            }
            Ok::<_, StoreError>(())
        })
        .await
        .context("scribe feedback did not end on its own")??;

        host.client.observe(&session);
        Ok(())
    }

    async fn show(&self, title: &str, members: &[Member]) -> Result<()> {
        let heading = self.formatter.format_heading(title);
        if !heading.is_empty() {
            println!("{}", heading);
        }
        for member in members {
            let view = member.client.view().await?;
            println!("{}", self.formatter.format_view(&view));
        }
        Ok(())
    }

    fn member(&self, session_id: &SessionId, user: UserId, name: &str) -> Member {
        let video: Arc<dyn VideoCallController> = Arc::new(LocalVideoCall::connected(user.clone()));
        Member {
            name: name.to_string(),
            client: SessionClient::new(Arc::clone(&self.store), video, session_id.clone(), user),
        }
    }
}
