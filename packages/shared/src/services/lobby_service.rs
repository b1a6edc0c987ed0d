use std::sync::Arc;

use chrono::{Duration, Utc};
use tokio::sync::{Mutex, MutexGuard};
use tracing::{debug, error, info, warn};

use crate::models::cooldown::CooldownTracker;
use crate::models::events::{LobbyEvent, Outbound};
use crate::models::participant::Participant;
use crate::models::queue::WaitQueue;
use crate::models::snapshot::{LobbySnapshot, PersistedLobby, TableView};
use crate::models::table::TableRegistry;
use crate::repositories::lobby_repository::LobbyRepository;
use crate::repositories::participant_directory::ParticipantDirectory;
use crate::services::assignment;
use crate::services::errors::lobby_service_errors::LobbyServiceError;
use crate::services::handshake::{self, HandshakeLedger};
use crate::services::notifications::NotificationDispatcher;

/// Tunable windows for the engine.
#[derive(Debug, Clone)]
pub struct LobbyConfig {
    /// How long an invited candidate has to accept before the sweep
    /// returns them to the back of the queue.
    pub invite_timeout: Duration,
    /// Minimum time before two players who just finished may be re-paired.
    pub cooldown_window: Duration,
    /// How long a finalized result is remembered so duplicate or late
    /// confirmations stay no-ops.
    pub finalize_grace: Duration,
}

impl Default for LobbyConfig {
    fn default() -> Self {
        LobbyConfig {
            invite_timeout: Duration::seconds(30),
            cooldown_window: Duration::seconds(30),
            finalize_grace: Duration::seconds(10),
        }
    }
}

/// Everything the engine mutates: the queue, the tables, the cooldown
/// pairs and the in-flight win claims. Guarded as one unit because a
/// rebalance pass reads and writes all of it.
#[derive(Debug, Default)]
pub struct LobbyState {
    pub(crate) queue: WaitQueue,
    pub(crate) tables: TableRegistry,
    pub(crate) cooldowns: CooldownTracker,
    pub(crate) handshakes: HandshakeLedger,
}

impl LobbyState {
    pub fn new(tables: TableRegistry) -> Self {
        LobbyState {
            queue: WaitQueue::new(),
            tables,
            cooldowns: CooldownTracker::new(),
            handshakes: HandshakeLedger::new(),
        }
    }

    pub fn from_persisted(persisted: PersistedLobby) -> Self {
        LobbyState {
            queue: WaitQueue::from_entries(persisted.queue),
            tables: TableRegistry::from_tables(persisted.tables),
            cooldowns: CooldownTracker::from_entries(persisted.cooldowns),
            handshakes: HandshakeLedger::new(),
        }
    }

    fn to_persisted(&self) -> PersistedLobby {
        PersistedLobby {
            queue: self.queue.peek_ordered().cloned().collect(),
            tables: self.tables.iter().cloned().collect(),
            cooldowns: self.cooldowns.entries(),
        }
    }

    /// Panics when a participant is double-booked across the queue, a
    /// seat, or an invite. A violation is a defect, not an error path, and
    /// a loud failure beats silent corruption.
    pub fn assert_invariants(&self) {
        let mut seen: std::collections::HashSet<&str> = std::collections::HashSet::new();
        for entry in self.queue.peek_ordered() {
            assert!(
                seen.insert(&entry.participant.id),
                "participant {} booked more than once",
                entry.participant.id
            );
        }
        for table in self.tables.iter() {
            let _ = table.state();
            for player in table.seated() {
                assert!(
                    seen.insert(&player.id),
                    "participant {} booked more than once",
                    player.id
                );
            }
            if let Some(invite) = table.invite() {
                assert!(
                    seen.insert(&invite.participant.id),
                    "participant {} booked more than once",
                    invite.participant.id
                );
            }
        }
    }
}

/// The lobby's single authority over queue and table state. All mutating
/// entry points serialize on one lock, persist, then hand their
/// notifications off without waiting on delivery.
pub struct LobbyService {
    state: Mutex<LobbyState>,
    repository: Arc<dyn LobbyRepository>,
    dispatcher: Arc<dyn NotificationDispatcher>,
    directory: Arc<dyn ParticipantDirectory>,
    config: LobbyConfig,
}

impl LobbyService {
    pub fn new(
        state: LobbyState,
        repository: Arc<dyn LobbyRepository>,
        dispatcher: Arc<dyn NotificationDispatcher>,
        directory: Arc<dyn ParticipantDirectory>,
        config: LobbyConfig,
    ) -> Self {
        LobbyService {
            state: Mutex::new(state),
            repository,
            dispatcher,
            directory,
            config,
        }
    }

    /// Joins the queue. Fails when the player is already queued, or seated
    /// at or invited to any table.
    pub async fn check_in(&self, participant_id: &str) -> Result<(), LobbyServiceError> {
        let display_name = self
            .directory
            .display_name(participant_id)
            .await
            .map_err(|e| {
                error!("Directory lookup failed for {}: {}", participant_id, e);
                LobbyServiceError::Repository(e.to_string())
            })?
            .ok_or(LobbyServiceError::NotFound)?;

        let mut state = self.state.lock().await;
        if state.tables.find_involving(participant_id).is_some() {
            return Err(LobbyServiceError::AlreadyActive);
        }
        if state.queue.contains(participant_id) {
            return Err(LobbyServiceError::AlreadyQueued);
        }

        info!("Player {} checked in", participant_id);
        state
            .queue
            .enqueue(Participant::new(participant_id, &display_name));

        let mut events = Vec::new();
        assignment::rebalance(&mut state, self.config.cooldown_window, &mut events);
        push_refresh_broadcasts(&mut events);
        self.commit_and_dispatch(state, events).await
    }

    /// Removes the player from the queue and from any table they are
    /// seated at or invited to. Not an error when there is nothing to do.
    pub async fn leave(&self, participant_id: &str) -> Result<(), LobbyServiceError> {
        let mut state = self.state.lock().await;

        let mut events = Vec::new();
        let was_queued = state.queue.remove(participant_id).is_some();
        let mut touched_tables = false;
        {
            let LobbyState {
                queue,
                tables,
                handshakes,
                ..
            } = &mut *state;
            for table in tables.iter_mut() {
                if table.is_invited(participant_id) {
                    table.clear_invite();
                    touched_tables = true;
                    debug!(
                        "Cleared invite for departing player {} at table {}",
                        participant_id, table.number
                    );
                }
                if table.remove_player(participant_id).is_some() {
                    touched_tables = true;
                    // A pending claim whose players changed can never
                    // finalize; forget it so the table is claimable again.
                    if handshakes.drop_claim(&table.id).is_some() {
                        debug!("Dropped stale win claim for table {}", table.number);
                    }
                    // An invite cannot outlive the only seated player; the
                    // candidate rejoins the queue instead of being dropped.
                    if table.seated().is_empty() {
                        if let Some(orphaned) = table.clear_invite() {
                            events.push(Outbound::direct(
                                &orphaned.participant.id,
                                LobbyEvent::TableInviteTimeout {
                                    table_id: table.id.clone(),
                                },
                            ));
                            queue.enqueue(orphaned.participant);
                        }
                    }
                }
            }
        }

        if was_queued || touched_tables {
            info!("Player {} left the lobby", participant_id);
        } else {
            debug!("Player {} left but was neither queued nor seated", participant_id);
        }

        assignment::rebalance(&mut state, self.config.cooldown_window, &mut events);
        push_refresh_broadcasts(&mut events);
        self.commit_and_dispatch(state, events).await
    }

    /// Skip: moves the player to the back of the queue. A no-op when they
    /// are not queued.
    pub async fn skip_turn(&self, participant_id: &str) -> Result<(), LobbyServiceError> {
        let mut state = self.state.lock().await;

        if state.queue.move_to_back(participant_id) {
            info!("Player {} skipped to the back of the queue", participant_id);
        } else {
            debug!("Skip for {} ignored; not in the queue", participant_id);
        }

        let mut events = Vec::new();
        assignment::rebalance(&mut state, self.config.cooldown_window, &mut events);
        push_refresh_broadcasts(&mut events);
        self.commit_and_dispatch(state, events).await
    }

    /// Takes the offered seat. The candidate leaves the queue for good and
    /// the table becomes active.
    pub async fn accept_invite(
        &self,
        participant_id: &str,
        table_id: &str,
    ) -> Result<(), LobbyServiceError> {
        let mut state = self.state.lock().await;
        {
            let LobbyState { queue, tables, .. } = &mut *state;
            let table = tables.get_mut(table_id).ok_or(LobbyServiceError::NotFound)?;
            if !table.is_invited(participant_id) {
                return Err(LobbyServiceError::NotInvited);
            }
            if table.seated().len() >= 2 {
                // Unreachable while the invariants hold, but checked rather
                // than trusted.
                return Err(LobbyServiceError::TableFull);
            }
            table.promote_invite_to_seat();
            info!(
                "Player {} accepted the invite for table {}",
                participant_id, table.number
            );
            queue.remove(participant_id);
        }

        let mut events = Vec::new();
        assignment::rebalance(&mut state, self.config.cooldown_window, &mut events);
        push_refresh_broadcasts(&mut events);
        self.commit_and_dispatch(state, events).await
    }

    /// Turns the offer down. The candidate goes to the back of the queue
    /// and the seat is offered to the next eligible waiter.
    pub async fn decline_invite(
        &self,
        participant_id: &str,
        table_id: &str,
    ) -> Result<(), LobbyServiceError> {
        let mut state = self.state.lock().await;
        {
            let LobbyState { queue, tables, .. } = &mut *state;
            let table = tables.get_mut(table_id).ok_or(LobbyServiceError::NotFound)?;
            if !table.is_invited(participant_id) {
                return Err(LobbyServiceError::NotInvited);
            }
            let Some(invite) = table.clear_invite() else {
                return Err(LobbyServiceError::NotInvited);
            };
            info!(
                "Player {} declined the invite for table {}",
                participant_id, table.number
            );
            queue.enqueue(invite.participant);
        }

        let mut events = Vec::new();
        assignment::rebalance(&mut state, self.config.cooldown_window, &mut events);
        push_refresh_broadcasts(&mut events);
        self.commit_and_dispatch(state, events).await
    }

    /// Clears invites that outlived the acceptance window, treating each
    /// exactly like a decline. Returns how many invites expired. Tables
    /// are handled independently; one table's expiry never blocks the
    /// rest of the sweep.
    pub async fn sweep_expired_invites(&self) -> Result<usize, LobbyServiceError> {
        let now = Utc::now();
        let mut state = self.state.lock().await;

        let mut events = Vec::new();
        let mut expired = 0usize;
        {
            let LobbyState { queue, tables, .. } = &mut *state;
            for table in tables.iter_mut() {
                let timed_out = table.invite().is_some_and(|invite| {
                    now.signed_duration_since(invite.invited_at) > self.config.invite_timeout
                });
                if !timed_out {
                    continue;
                }
                let Some(invite) = table.clear_invite() else {
                    continue;
                };
                info!(
                    "Invite for player {} at table {} timed out",
                    invite.participant.id, table.number
                );
                events.push(Outbound::direct(
                    &invite.participant.id,
                    LobbyEvent::TableInviteTimeout {
                        table_id: table.id.clone(),
                    },
                ));
                queue.enqueue(invite.participant);
                expired += 1;
            }
        }

        if expired == 0 {
            return Ok(0);
        }

        state.handshakes.prune_finalized(self.config.finalize_grace);
        assignment::rebalance(&mut state, self.config.cooldown_window, &mut events);
        push_refresh_broadcasts(&mut events);
        self.commit_and_dispatch(state, events).await?;
        Ok(expired)
    }

    /// Declares the caller the winner at a table and asks the opponent to
    /// confirm. Nothing durable changes until the confirmation arrives.
    pub async fn claim_win(
        &self,
        table_id: &str,
        winner_id: &str,
    ) -> Result<(), LobbyServiceError> {
        let mut state = self.state.lock().await;
        let mut events = Vec::new();
        handshake::claim_win(&mut state, table_id, winner_id, &mut events)?;
        drop(state);
        self.dispatch(events);
        Ok(())
    }

    /// Resolves a pending win claim. A positive confirmation finalizes the
    /// result exactly once: the loser rejoins the queue tail, the pair
    /// goes on cooldown, and the freed seat is re-offered.
    pub async fn confirm_win(
        &self,
        table_id: &str,
        winner_id: &str,
        confirmed: bool,
    ) -> Result<(), LobbyServiceError> {
        let mut state = self.state.lock().await;
        let mut events = Vec::new();
        let finalized = handshake::confirm_win(
            &mut state,
            table_id,
            winner_id,
            confirmed,
            self.config.finalize_grace,
            &mut events,
        )?;

        if !finalized {
            drop(state);
            self.dispatch(events);
            return Ok(());
        }

        state.cooldowns.prune(self.config.cooldown_window);
        assignment::rebalance(&mut state, self.config.cooldown_window, &mut events);
        push_refresh_broadcasts(&mut events);
        self.commit_and_dispatch(state, events).await
    }

    /// Force a reassignment pass. Idempotent; does nothing when no table
    /// can be filled.
    pub async fn rebalance(&self) -> Result<(), LobbyServiceError> {
        let mut state = self.state.lock().await;
        let mut events = Vec::new();
        assignment::rebalance(&mut state, self.config.cooldown_window, &mut events);
        if events.is_empty() {
            return Ok(());
        }
        push_refresh_broadcasts(&mut events);
        self.commit_and_dispatch(state, events).await
    }

    /// Consistent read-only view taken between actions.
    pub async fn snapshot(&self) -> LobbySnapshot {
        let state = self.state.lock().await;
        LobbySnapshot {
            queue: state.queue.peek_ordered().cloned().collect(),
            tables: state.tables.iter().map(TableView::from_table).collect(),
        }
    }

    /// Persists the committed state, releases the lock, then hands the
    /// notifications off. Durability comes before delivery.
    async fn commit_and_dispatch(
        &self,
        state: MutexGuard<'_, LobbyState>,
        events: Vec<Outbound>,
    ) -> Result<(), LobbyServiceError> {
        state.assert_invariants();
        let persisted = state.to_persisted();
        self.repository.save(&persisted).await.map_err(|e| {
            error!("Failed to persist lobby state: {}", e);
            LobbyServiceError::Repository(e.to_string())
        })?;
        drop(state);
        self.dispatch(events);
        Ok(())
    }

    /// Fire-and-forget delivery: a slow or dead client must never stall
    /// the engine.
    fn dispatch(&self, events: Vec<Outbound>) {
        if events.is_empty() {
            return;
        }
        let dispatcher = self.dispatcher.clone();
        tokio::spawn(async move {
            for outbound in events {
                let result = match &outbound {
                    Outbound::Direct { to, event } => dispatcher.notify(to, event).await,
                    Outbound::Broadcast { event } => dispatcher.broadcast(event).await,
                };
                if let Err(e) = result {
                    warn!("Dropped notification {:?}: {}", outbound, e);
                }
            }
        });
    }
}

fn push_refresh_broadcasts(events: &mut Vec<Outbound>) {
    events.push(Outbound::broadcast(LobbyEvent::QueueUpdated));
    events.push(Outbound::broadcast(LobbyEvent::TablesUpdated));
}
