//! Round-by-round role table for one rotation policy

use dialogos_domain::{Role, RotationPolicy};
use serde::Serialize;

/// Roles held by one seat across every round
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SeatRow {
    /// 1-based seat label
    pub seat: usize,
    pub roles: Vec<Role>,
}

/// Who plays which role in every round of a rotation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RotationTable {
    pub policy: RotationPolicy,
    pub total_rounds: u32,
    pub seats: Vec<SeatRow>,
    /// A permanent observer sits outside the rotation
    pub passive_observer: bool,
}

impl RotationTable {
    pub fn build(policy: RotationPolicy, passive_observer: bool) -> Self {
        let total_rounds = policy.total_rounds();
        let seats = (0..policy.seat_count())
            .map(|seat| SeatRow {
                seat: seat + 1,
                roles: (1..=total_rounds)
                    .map(|round| policy.role_for_seat(seat, round))
                    .collect(),
            })
            .collect();

        Self {
            policy,
            total_rounds,
            seats,
            passive_observer,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trio_table_is_latin_square() {
        let table = RotationTable::build(RotationPolicy::Trio, false);
        assert_eq!(table.total_rounds, 3);
        assert_eq!(table.seats.len(), 3);
        assert_eq!(
            table.seats[0].roles,
            vec![Role::Speaker, Role::Listener, Role::Scribe]
        );
        for round in 0..3 {
            let mut column: Vec<Role> = table.seats.iter().map(|s| s.roles[round]).collect();
            column.sort_by_key(|r| r.as_str());
            column.dedup();
            assert_eq!(column.len(), 3);
        }
    }

    #[test]
    fn test_five_together_has_two_observers_per_round() {
        let table = RotationTable::build(RotationPolicy::FiveTogether, true);
        assert_eq!(table.total_rounds, 5);
        for round in 0..5 {
            let observers = table
                .seats
                .iter()
                .filter(|s| s.roles[round] == Role::ObserverTemporary)
                .count();
            assert_eq!(observers, 2);
        }
    }
}
