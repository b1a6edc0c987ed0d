use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::participant::Participant;

/// Derived table lifecycle state. Nothing here is stored separately; it
/// falls out of the seated players and the optional invite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TableState {
    Empty,
    OneSeated,
    InvitePending,
    Full,
}

/// An outstanding seat offer to a single candidate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Invite {
    pub participant: Participant,
    pub invited_at: DateTime<Utc>,
}

/// One physical table. At most two seated players; an invite may only
/// exist while exactly one player is seated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Table {
    pub id: String,
    pub number: u32,
    seated: Vec<Participant>,
    invite: Option<Invite>,
}

impl Table {
    pub fn new(number: u32) -> Self {
        Table {
            id: Uuid::new_v4().to_string(),
            number,
            seated: Vec::new(),
            invite: None,
        }
    }

    pub fn state(&self) -> TableState {
        match (self.seated.len(), self.invite.is_some()) {
            (0, false) => TableState::Empty,
            (1, false) => TableState::OneSeated,
            (1, true) => TableState::InvitePending,
            (2, false) => TableState::Full,
            (seated, invite) => unreachable!(
                "table {} violates seating invariants: {} seated, invite: {}",
                self.number, seated, invite
            ),
        }
    }

    /// A game is in progress exactly when both seats are taken.
    pub fn is_active(&self) -> bool {
        self.seated.len() == 2
    }

    pub fn seated(&self) -> &[Participant] {
        &self.seated
    }

    pub fn invite(&self) -> Option<&Invite> {
        self.invite.as_ref()
    }

    pub fn has_seated(&self, participant_id: &str) -> bool {
        self.seated.iter().any(|p| p.id == participant_id)
    }

    pub fn is_invited(&self, participant_id: &str) -> bool {
        self.invite
            .as_ref()
            .is_some_and(|invite| invite.participant.id == participant_id)
    }

    /// Seated or invited.
    pub fn involves(&self, participant_id: &str) -> bool {
        self.has_seated(participant_id) || self.is_invited(participant_id)
    }

    /// Seats the first player at an empty table. Returns false when the
    /// table is not empty.
    pub fn seat_first(&mut self, participant: Participant) -> bool {
        if !self.seated.is_empty() {
            return false;
        }
        self.seated.push(participant);
        true
    }

    /// Offers the second seat to a candidate. Only legal with exactly one
    /// player seated and no invite outstanding.
    pub fn set_invite(&mut self, participant: Participant, invited_at: DateTime<Utc>) -> bool {
        if self.seated.len() != 1 || self.invite.is_some() {
            return false;
        }
        self.invite = Some(Invite {
            participant,
            invited_at,
        });
        true
    }

    pub fn clear_invite(&mut self) -> Option<Invite> {
        self.invite.take()
    }

    /// Moves the invited candidate into the second seat. Returns the
    /// promoted participant, or `None` when there is no invite or no room.
    pub fn promote_invite_to_seat(&mut self) -> Option<Participant> {
        if self.seated.len() >= 2 {
            return None;
        }
        let invite = self.invite.take()?;
        self.seated.push(invite.participant.clone());
        Some(invite.participant)
    }

    pub fn remove_player(&mut self, participant_id: &str) -> Option<Participant> {
        let index = self.seated.iter().position(|p| p.id == participant_id)?;
        Some(self.seated.remove(index))
    }

    /// Clears all seats and any outstanding invite.
    pub fn reset(&mut self) {
        self.seated.clear();
        self.invite = None;
    }

    /// The other seated player, when the given player is seated and has one.
    pub fn opponent_of(&self, participant_id: &str) -> Option<&Participant> {
        if !self.has_seated(participant_id) {
            return None;
        }
        self.seated.iter().find(|p| p.id != participant_id)
    }
}

/// All tables in the hall, kept in ascending table-number order so that
/// assignment passes are deterministic.
#[derive(Debug, Clone, Default)]
pub struct TableRegistry {
    tables: Vec<Table>,
}

impl TableRegistry {
    /// Creates `table_count` empty tables numbered from 1.
    pub fn new(table_count: u32) -> Self {
        TableRegistry {
            tables: (1..=table_count).map(Table::new).collect(),
        }
    }

    pub fn from_tables(mut tables: Vec<Table>) -> Self {
        tables.sort_by_key(|table| table.number);
        TableRegistry { tables }
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    pub fn get(&self, table_id: &str) -> Option<&Table> {
        self.tables.iter().find(|table| table.id == table_id)
    }

    pub fn get_mut(&mut self, table_id: &str) -> Option<&mut Table> {
        self.tables.iter_mut().find(|table| table.id == table_id)
    }

    /// Tables in ascending number order.
    pub fn iter(&self) -> impl Iterator<Item = &Table> {
        self.tables.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Table> {
        self.tables.iter_mut()
    }

    /// The table a player is seated at or invited to, if any.
    pub fn find_involving(&self, participant_id: &str) -> Option<&Table> {
        self.tables
            .iter()
            .find(|table| table.involves(participant_id))
    }
}
