use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use proptest::prelude::*;

use shared::models::snapshot::LobbySnapshot;
use shared::models::table::{TableRegistry, TableState};
use shared::repositories::lobby_repository::InMemoryLobbyRepository;
use shared::repositories::participant_directory::StaticParticipantDirectory;
use shared::services::lobby_service::{LobbyConfig, LobbyService, LobbyState};
use shared::services::notifications::NoopDispatcher;

const PLAYER_COUNT: u8 = 6;

fn player_id(index: u8) -> String {
    format!("p{}", index % PLAYER_COUNT)
}

fn lobby(tables: u32) -> LobbyService {
    let names: HashMap<String, String> = (0..PLAYER_COUNT)
        .map(|i| (player_id(i), format!("Player {}", i)))
        .collect();
    LobbyService::new(
        LobbyState::new(TableRegistry::new(tables)),
        Arc::new(InMemoryLobbyRepository::new()),
        Arc::new(NoopDispatcher),
        Arc::new(StaticParticipantDirectory::new(names)),
        LobbyConfig::default(),
    )
}

#[derive(Debug, Clone)]
enum Op {
    CheckIn(u8),
    Leave(u8),
    Skip(u8),
    Accept(u8),
    Decline(u8),
    Claim(u8),
    Confirm(u8, bool),
    Sweep,
    Rebalance,
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0..PLAYER_COUNT).prop_map(Op::CheckIn),
        (0..PLAYER_COUNT).prop_map(Op::Leave),
        (0..PLAYER_COUNT).prop_map(Op::Skip),
        (0..PLAYER_COUNT).prop_map(Op::Accept),
        (0..PLAYER_COUNT).prop_map(Op::Decline),
        (0..PLAYER_COUNT).prop_map(Op::Claim),
        ((0..PLAYER_COUNT), any::<bool>()).prop_map(|(p, c)| Op::Confirm(p, c)),
        Just(Op::Sweep),
        Just(Op::Rebalance),
    ]
}

/// Runs one operation against the service. Rejections are part of normal
/// traffic here; only the invariants matter.
async fn apply(service: &LobbyService, op: Op) {
    match op {
        Op::CheckIn(p) => {
            let _ = service.check_in(&player_id(p)).await;
        }
        Op::Leave(p) => {
            let _ = service.leave(&player_id(p)).await;
        }
        Op::Skip(p) => {
            let _ = service.skip_turn(&player_id(p)).await;
        }
        Op::Accept(p) => {
            let id = player_id(p);
            if let Some(table) = table_for(service, &id, true).await {
                let _ = service.accept_invite(&id, &table).await;
            }
        }
        Op::Decline(p) => {
            let id = player_id(p);
            if let Some(table) = table_for(service, &id, true).await {
                let _ = service.decline_invite(&id, &table).await;
            }
        }
        Op::Claim(p) => {
            let id = player_id(p);
            if let Some(table) = table_for(service, &id, false).await {
                let _ = service.claim_win(&table, &id).await;
            }
        }
        Op::Confirm(p, confirmed) => {
            let id = player_id(p);
            if let Some(table) = table_for(service, &id, false).await {
                let _ = service.confirm_win(&table, &id, confirmed).await;
            }
        }
        Op::Sweep => {
            let _ = service.sweep_expired_invites().await;
        }
        Op::Rebalance => {
            let _ = service.rebalance().await;
        }
    }
}

/// The table the player is invited to (`invited == true`) or seated at.
async fn table_for(service: &LobbyService, participant_id: &str, invited: bool) -> Option<String> {
    let snapshot = service.snapshot().await;
    snapshot
        .tables
        .iter()
        .find(|table| {
            if invited {
                table.invited.as_ref().is_some_and(|p| p.id == participant_id)
            } else {
                table.seated.iter().any(|p| p.id == participant_id)
            }
        })
        .map(|table| table.id.clone())
}

fn check_invariants(snapshot: &LobbySnapshot) {
    let mut seen: HashSet<&str> = HashSet::new();
    for entry in &snapshot.queue {
        assert!(
            seen.insert(&entry.participant.id),
            "{} queued twice",
            entry.participant.id
        );
    }
    for table in &snapshot.tables {
        assert!(table.seated.len() <= 2, "table {} overbooked", table.number);
        assert_eq!(
            table.active,
            table.seated.len() == 2,
            "table {} active flag out of sync",
            table.number
        );
        if table.invited.is_some() {
            assert_eq!(
                table.seated.len(),
                1,
                "table {} has an invite without exactly one seated player",
                table.number
            );
            assert_eq!(table.state, TableState::InvitePending);
        }
        for player in &table.seated {
            assert!(seen.insert(&player.id), "{} double-booked", player.id);
        }
        if let Some(invited) = &table.invited {
            assert!(seen.insert(&invited.id), "{} double-booked", invited.id);
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    /// Whatever order actions arrive in, nobody is ever in two places at
    /// once and every table stays coherent.
    #[test]
    fn random_action_sequences_preserve_invariants(
        ops in proptest::collection::vec(op_strategy(), 1..60),
    ) {
        let runtime = tokio::runtime::Runtime::new().unwrap();
        runtime.block_on(async move {
            let service = lobby(2);
            for op in ops {
                apply(&service, op).await;
                let snapshot = service.snapshot().await;
                check_invariants(&snapshot);
            }
        });
    }
}
