//! Claim -> confirm handshake that finalizes a game result exactly once.
//! A claim parks the table in an awaiting-confirmation state; only the
//! opponent's positive confirmation commits the result.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, info, warn};

use crate::models::events::{LobbyEvent, Outbound};
use crate::services::errors::lobby_service_errors::LobbyServiceError;
use crate::services::lobby_service::LobbyState;

/// A win claim waiting for the opponent's confirmation.
#[derive(Debug, Clone)]
pub struct WinClaim {
    pub winner_id: String,
    pub claimed_at: DateTime<Utc>,
}

/// In-flight claims plus recently finalized results, keyed by table. A
/// finalized marker outlives the claim for a short grace window to absorb
/// duplicate or late confirmations, then gets pruned.
#[derive(Debug, Default)]
pub struct HandshakeLedger {
    claims: HashMap<String, WinClaim>,
    finalized: HashMap<(String, String), DateTime<Utc>>,
}

impl HandshakeLedger {
    pub fn new() -> Self {
        HandshakeLedger::default()
    }

    pub fn claim(&self, table_id: &str) -> Option<&WinClaim> {
        self.claims.get(table_id)
    }

    /// Forgets the pending claim for a table, if any. Called when the
    /// table's players change under the claim.
    pub fn drop_claim(&mut self, table_id: &str) -> Option<WinClaim> {
        self.claims.remove(table_id)
    }

    fn record_claim(&mut self, table_id: &str, winner_id: &str) {
        self.claims.insert(
            table_id.to_string(),
            WinClaim {
                winner_id: winner_id.to_string(),
                claimed_at: Utc::now(),
            },
        );
    }

    fn is_finalized(&self, table_id: &str, winner_id: &str) -> bool {
        self.finalized
            .contains_key(&(table_id.to_string(), winner_id.to_string()))
    }

    fn mark_finalized(&mut self, table_id: &str, winner_id: &str, at: DateTime<Utc>) {
        self.finalized
            .insert((table_id.to_string(), winner_id.to_string()), at);
    }

    /// Drops finalized markers older than the grace window.
    pub fn prune_finalized(&mut self, grace: Duration) {
        let now = Utc::now();
        self.finalized
            .retain(|_, at| now.signed_duration_since(*at) < grace);
    }
}

/// Declares `winner_id` the winner at `table_id` and asks the opponent to
/// confirm. A repeat claim while one is already pending is a no-op so that
/// duplicate client events stay harmless.
pub(crate) fn claim_win(
    state: &mut LobbyState,
    table_id: &str,
    winner_id: &str,
    events: &mut Vec<Outbound>,
) -> Result<(), LobbyServiceError> {
    let LobbyState {
        tables, handshakes, ..
    } = state;

    let table = tables.get(table_id).ok_or(LobbyServiceError::NotFound)?;
    let winner = table
        .seated()
        .iter()
        .find(|p| p.id == winner_id)
        .cloned()
        .ok_or(LobbyServiceError::NotOnTable)?;
    let loser = table
        .opponent_of(winner_id)
        .cloned()
        .ok_or(LobbyServiceError::NoOpponent)?;

    if handshakes.claim(table_id).is_some() {
        debug!("Ignoring repeat win claim for table {}", table.number);
        return Ok(());
    }

    handshakes.record_claim(table_id, winner_id);
    info!(
        "Player {} claims a win over {} at table {}",
        winner_id, loser.id, table.number
    );

    events.push(Outbound::direct(
        &loser.id,
        LobbyEvent::ConfirmWinRequest {
            table_id: table.id.clone(),
            winner_id: winner.id.clone(),
            winner_name: winner.display_name.clone(),
        },
    ));
    events.push(Outbound::direct(
        &winner.id,
        LobbyEvent::WaitingForVerification {
            table_id: table.id.clone(),
        },
    ));
    Ok(())
}

/// Resolves a pending claim. Returns true when this call finalized the
/// result: the loser leaves the table and rejoins the queue tail, and the
/// pair goes on cooldown. Duplicate confirmations, confirmations without a
/// matching claim, and confirmations whose players have since changed are
/// all suppressed as no-ops.
pub(crate) fn confirm_win(
    state: &mut LobbyState,
    table_id: &str,
    winner_id: &str,
    confirmed: bool,
    finalize_grace: Duration,
    events: &mut Vec<Outbound>,
) -> Result<bool, LobbyServiceError> {
    let now = Utc::now();
    let LobbyState {
        queue,
        tables,
        cooldowns,
        handshakes,
    } = state;

    handshakes.prune_finalized(finalize_grace);

    if !confirmed {
        if handshakes.drop_claim(table_id).is_some() {
            info!("Win claim for table {} rejected by the opponent", table_id);
        }
        return Ok(false);
    }

    if handshakes.is_finalized(table_id, winner_id) {
        debug!("Duplicate confirmation for table {} suppressed", table_id);
        return Ok(false);
    }

    let Some(claim) = handshakes.claim(table_id) else {
        warn!(
            "Confirmation for table {} without a pending claim; ignoring",
            table_id
        );
        return Ok(false);
    };
    if claim.winner_id != winner_id {
        warn!(
            "Confirmation for table {} names {} but the pending claim is for {}; ignoring",
            table_id, winner_id, claim.winner_id
        );
        return Ok(false);
    }

    // Players can change between claim and confirm (someone may have left);
    // re-validate against current seating before committing anything.
    let Some(table) = tables.get_mut(table_id) else {
        warn!("Table {} vanished before confirmation; dropping claim", table_id);
        handshakes.drop_claim(table_id);
        return Ok(false);
    };
    if !table.has_seated(winner_id) {
        warn!(
            "Claimed winner {} is no longer seated at table {}; dropping claim",
            winner_id, table.number
        );
        handshakes.drop_claim(table_id);
        return Ok(false);
    }
    let Some(loser) = table.opponent_of(winner_id).cloned() else {
        warn!(
            "No opponent left at table {}; dropping stale claim",
            table.number
        );
        handshakes.drop_claim(table_id);
        return Ok(false);
    };

    handshakes.drop_claim(table_id);
    handshakes.mark_finalized(table_id, winner_id, now);

    table.remove_player(&loser.id);
    cooldowns.record(winner_id, &loser.id);
    queue.enqueue(loser.clone());

    info!(
        "Result confirmed at table {}: {} defeated {}",
        table.number, winner_id, loser.id
    );

    let confirmed_event = LobbyEvent::MatchConfirmed {
        table_id: table.id.clone(),
        winner_id: winner_id.to_string(),
    };
    events.push(Outbound::direct(winner_id, confirmed_event.clone()));
    events.push(Outbound::direct(&loser.id, confirmed_event));
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::participant::Participant;
    use crate::models::table::{TableRegistry, TableState};

    fn grace() -> Duration {
        Duration::seconds(10)
    }

    fn player(id: &str) -> Participant {
        Participant::new(id, &id.to_uppercase())
    }

    /// One table with `a` and `b` seated.
    fn full_table_state() -> (LobbyState, String) {
        let mut state = LobbyState::new(TableRegistry::new(1));
        let table_id = state.tables.iter().next().unwrap().id.clone();
        let table = state.tables.get_mut(&table_id).unwrap();
        table.seat_first(player("a"));
        table.set_invite(player("b"), Utc::now());
        table.promote_invite_to_seat();
        (state, table_id)
    }

    #[test]
    fn claim_requires_a_known_table() {
        let (mut state, _) = full_table_state();
        let mut events = Vec::new();

        let result = claim_win(&mut state, "ghost-table", "a", &mut events);
        assert_eq!(result, Err(LobbyServiceError::NotFound));
    }

    #[test]
    fn claim_requires_the_winner_to_be_seated() {
        let (mut state, table_id) = full_table_state();
        let mut events = Vec::new();

        let result = claim_win(&mut state, &table_id, "ghost", &mut events);
        assert_eq!(result, Err(LobbyServiceError::NotOnTable));
    }

    #[test]
    fn claim_requires_an_opponent() {
        let mut state = LobbyState::new(TableRegistry::new(1));
        let table_id = state.tables.iter().next().unwrap().id.clone();
        state
            .tables
            .get_mut(&table_id)
            .unwrap()
            .seat_first(player("a"));

        let mut events = Vec::new();
        let result = claim_win(&mut state, &table_id, "a", &mut events);
        assert_eq!(result, Err(LobbyServiceError::NoOpponent));
    }

    #[test]
    fn claim_notifies_loser_and_winner() {
        let (mut state, table_id) = full_table_state();
        let mut events = Vec::new();

        claim_win(&mut state, &table_id, "a", &mut events).unwrap();

        assert!(events.iter().any(|e| matches!(
            e,
            Outbound::Direct { to, event: LobbyEvent::ConfirmWinRequest { winner_id, .. } }
                if to == "b" && winner_id == "a"
        )));
        assert!(events.iter().any(|e| matches!(
            e,
            Outbound::Direct { to, event: LobbyEvent::WaitingForVerification { .. } } if to == "a"
        )));
    }

    #[test]
    fn repeat_claim_is_a_noop() {
        let (mut state, table_id) = full_table_state();
        let mut events = Vec::new();
        claim_win(&mut state, &table_id, "a", &mut events).unwrap();

        let mut repeat_events = Vec::new();
        claim_win(&mut state, &table_id, "a", &mut repeat_events).unwrap();

        assert!(repeat_events.is_empty());
        assert_eq!(state.handshakes.claim(&table_id).unwrap().winner_id, "a");
    }

    #[test]
    fn confirm_finalizes_exactly_once() {
        let (mut state, table_id) = full_table_state();
        let mut events = Vec::new();
        claim_win(&mut state, &table_id, "a", &mut events).unwrap();

        let mut first = Vec::new();
        let finalized = confirm_win(&mut state, &table_id, "a", true, grace(), &mut first).unwrap();
        assert!(finalized);

        let table = state.tables.get(&table_id).unwrap();
        assert_eq!(table.state(), TableState::OneSeated);
        assert_eq!(table.seated()[0].id, "a");
        assert_eq!(state.queue.len(), 1);
        assert!(state.queue.contains("b"));
        assert!(state
            .cooldowns
            .recently_played("a", "b", Duration::seconds(30)));

        // The duplicate changes nothing: the loser is not enqueued twice.
        let mut second = Vec::new();
        let finalized =
            confirm_win(&mut state, &table_id, "a", true, grace(), &mut second).unwrap();
        assert!(!finalized);
        assert!(second.is_empty());
        assert_eq!(state.queue.len(), 1);
    }

    #[test]
    fn negative_confirmation_cancels_the_claim() {
        let (mut state, table_id) = full_table_state();
        let mut events = Vec::new();
        claim_win(&mut state, &table_id, "a", &mut events).unwrap();

        let mut confirm_events = Vec::new();
        let finalized =
            confirm_win(&mut state, &table_id, "a", false, grace(), &mut confirm_events).unwrap();

        assert!(!finalized);
        assert!(confirm_events.is_empty());
        assert!(state.handshakes.claim(&table_id).is_none());
        assert_eq!(state.tables.get(&table_id).unwrap().state(), TableState::Full);

        // The table is claimable again.
        let mut reclaim_events = Vec::new();
        claim_win(&mut state, &table_id, "b", &mut reclaim_events).unwrap();
        assert_eq!(state.handshakes.claim(&table_id).unwrap().winner_id, "b");
    }

    #[test]
    fn confirm_without_a_claim_is_ignored() {
        let (mut state, table_id) = full_table_state();

        let mut events = Vec::new();
        let finalized =
            confirm_win(&mut state, &table_id, "a", true, grace(), &mut events).unwrap();

        assert!(!finalized);
        assert!(events.is_empty());
        assert_eq!(state.tables.get(&table_id).unwrap().state(), TableState::Full);
    }

    #[test]
    fn confirm_fails_silently_when_the_winner_left() {
        let (mut state, table_id) = full_table_state();
        let mut events = Vec::new();
        claim_win(&mut state, &table_id, "a", &mut events).unwrap();

        state.tables.get_mut(&table_id).unwrap().remove_player("a");

        let mut confirm_events = Vec::new();
        let finalized =
            confirm_win(&mut state, &table_id, "a", true, grace(), &mut confirm_events).unwrap();

        assert!(!finalized);
        assert!(confirm_events.is_empty());
        assert!(state.handshakes.claim(&table_id).is_none());
        assert!(state.queue.is_empty());
        assert!(state.cooldowns.is_empty());
    }

    #[test]
    fn confirm_for_the_wrong_winner_is_ignored() {
        let (mut state, table_id) = full_table_state();
        let mut events = Vec::new();
        claim_win(&mut state, &table_id, "a", &mut events).unwrap();

        let mut confirm_events = Vec::new();
        let finalized =
            confirm_win(&mut state, &table_id, "b", true, grace(), &mut confirm_events).unwrap();

        assert!(!finalized);
        // The original claim survives an answer that names the wrong winner.
        assert_eq!(state.handshakes.claim(&table_id).unwrap().winner_id, "a");
    }
}
