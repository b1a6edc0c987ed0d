//! Table assignment. `rebalance` is the single place new seatings and
//! invitations are created; every mutating entry point funnels through it
//! after updating queue or table state.

use chrono::{Duration, Utc};
use tracing::debug;

use crate::models::events::{LobbyEvent, Outbound};
use crate::models::participant::Participant;
use crate::models::table::{Table, TableState};
use crate::services::lobby_service::LobbyState;

/// One pass over the tables in ascending number order.
///
/// * `OneSeated` tables scan the queue head-to-tail for the first candidate
///   the seated player may face, dequeue them, and issue an invite.
/// * `Empty` tables look at the front pair only; a cooldown-blocked front
///   pair defers the table to the next pass instead of searching deeper, so
///   a pass stays O(tables) and no table starves the rest.
/// * `InvitePending` and `Full` tables are left alone; their transitions
///   are driven by accept/decline/timeout/claim/confirm.
///
/// Idempotent: a pass that finds nothing to do changes nothing and emits
/// nothing.
pub(crate) fn rebalance(
    state: &mut LobbyState,
    cooldown_window: Duration,
    events: &mut Vec<Outbound>,
) {
    let LobbyState {
        queue,
        tables,
        cooldowns,
        ..
    } = state;

    for table in tables.iter_mut() {
        match table.state() {
            TableState::OneSeated => {
                let seated = table.seated()[0].clone();
                let candidate = queue
                    .peek_ordered()
                    .find(|entry| {
                        !cooldowns.recently_played(
                            &seated.id,
                            &entry.participant.id,
                            cooldown_window,
                        )
                    })
                    .map(|entry| entry.participant.clone());

                let Some(candidate) = candidate else {
                    debug!(
                        "Table {}: no eligible candidate for {}",
                        table.number, seated.id
                    );
                    continue;
                };

                queue.remove(&candidate.id);
                table.set_invite(candidate.clone(), Utc::now());
                push_invite_events(table, &seated, &candidate, events);
            }
            TableState::Empty => {
                if queue.len() < 2 {
                    continue;
                }
                let front: Vec<Participant> = queue
                    .peek_ordered()
                    .take(2)
                    .map(|entry| entry.participant.clone())
                    .collect();
                let (first, second) = (front[0].clone(), front[1].clone());

                if cooldowns.recently_played(&first.id, &second.id, cooldown_window) {
                    debug!(
                        "Table {}: front pair {} / {} still on cooldown, deferring",
                        table.number, first.id, second.id
                    );
                    continue;
                }

                queue.dequeue_front(2);
                table.seat_first(first.clone());
                table.set_invite(second.clone(), Utc::now());
                push_invite_events(table, &first, &second, events);
            }
            TableState::InvitePending | TableState::Full => {}
        }
    }
}

fn push_invite_events(
    table: &Table,
    seated: &Participant,
    candidate: &Participant,
    events: &mut Vec<Outbound>,
) {
    debug!(
        "Table {}: inviting {} to face {}",
        table.number, candidate.id, seated.id
    );
    events.push(Outbound::direct(
        &candidate.id,
        LobbyEvent::TableInvite {
            table_id: table.id.clone(),
            table_number: table.number,
            opponent: seated.display_name.clone(),
            invited: candidate.display_name.clone(),
        },
    ));
    events.push(Outbound::direct(
        &seated.id,
        LobbyEvent::OpponentInvited {
            table_id: table.id.clone(),
            table_number: table.number,
            candidate: candidate.display_name.clone(),
        },
    ));
}
