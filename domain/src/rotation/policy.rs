//! Rotation policy engine

use crate::core::error::DomainError;
use crate::session::participant::Participant;
use crate::session::role::Role;
use serde::{Deserialize, Serialize};

const PAIR_CYCLE: [Role; 2] = [Role::Speaker, Role::Listener];
const TRIO_CYCLE: [Role; 3] = [Role::Speaker, Role::Listener, Role::Scribe];
const QUARTET_CYCLE: [Role; 4] = [
    Role::Speaker,
    Role::Listener,
    Role::Scribe,
    Role::ObserverTemporary,
];
const FIVE_TOGETHER_CYCLE: [Role; 5] = [
    Role::Speaker,
    Role::Listener,
    Role::Scribe,
    Role::ObserverTemporary,
    Role::ObserverTemporary,
];

/// Rotation policy for one group of active participants.
///
/// Rotation is seat-based: every active participant holds a fixed seat
/// `s` in `0..n` and plays `cycle[(s + round - 1) % n]`. Over `n`
/// consecutive rounds each seat therefore visits every cycle position
/// exactly once (a Latin square over the seats).
///
/// # Example
///
/// ```
/// use dialogos_domain::rotation::RotationPolicy;
/// use dialogos_domain::Role;
///
/// let policy = RotationPolicy::for_active_count(2).unwrap();
/// assert_eq!(policy.total_rounds(), 2);
/// assert_eq!(policy.next_role(Some(Role::Speaker)), Role::Listener);
/// assert_eq!(policy.next_role(None), Role::Speaker);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RotationPolicy {
    Pair,
    Trio,
    Quartet,
    /// Five participants kept in one group, two of them observing each round
    FiveTogether,
}

impl RotationPolicy {
    /// Policy for a group with `active` rotating participants.
    ///
    /// Five participants need a partition decision first; anything outside
    /// 2..=5 is rejected instead of being clamped.
    pub fn for_active_count(active: usize) -> Result<Self, DomainError> {
        match active {
            2 => Ok(RotationPolicy::Pair),
            3 => Ok(RotationPolicy::Trio),
            4 => Ok(RotationPolicy::Quartet),
            5 => Err(DomainError::GroupPartitionRequired),
            _ => Err(DomainError::RoleRotationUndefined { active }),
        }
    }

    /// Policy for a participant list, ignoring permanent observers.
    pub fn for_participants(participants: &[Participant]) -> Result<Self, DomainError> {
        Self::for_active_count(crate::session::participant::active_count(participants))
    }

    pub fn cycle(&self) -> &'static [Role] {
        match self {
            RotationPolicy::Pair => &PAIR_CYCLE,
            RotationPolicy::Trio => &TRIO_CYCLE,
            RotationPolicy::Quartet => &QUARTET_CYCLE,
            RotationPolicy::FiveTogether => &FIVE_TOGETHER_CYCLE,
        }
    }

    pub fn seat_count(&self) -> usize {
        self.cycle().len()
    }

    pub fn total_rounds(&self) -> u32 {
        self.cycle().len() as u32
    }

    /// Active roles staffed in every round, without duplicates.
    pub fn active_roles(&self) -> Vec<Role> {
        let mut roles: Vec<Role> = Vec::with_capacity(self.seat_count());
        for role in self.cycle() {
            if !roles.contains(role) {
                roles.push(*role);
            }
        }
        roles
    }

    /// Successor of `current` in the cycle.
    ///
    /// An unset role, or one outside this cycle, starts at the first
    /// element (speaker). Permanent observers stay where they are. With
    /// the five-person cycle the first observer seat is assumed; use
    /// [`role_for_seat`](Self::role_for_seat) when the seat is known.
    pub fn next_role(&self, current: Option<Role>) -> Role {
        let cycle = self.cycle();
        match current {
            Some(Role::ObserverPermanent) => Role::ObserverPermanent,
            Some(role) => match cycle.iter().position(|r| *r == role) {
                Some(index) => cycle[(index + 1) % cycle.len()],
                None => cycle[0],
            },
            None => cycle[0],
        }
    }

    /// Role held by `seat` in the 1-based `round`.
    pub fn role_for_seat(&self, seat: usize, round: u32) -> Role {
        let cycle = self.cycle();
        let offset = round.saturating_sub(1) as usize;
        cycle[(seat + offset) % cycle.len()]
    }

    /// Assign a seat to every active participant (in list order).
    ///
    /// Participants that already picked a role in the lobby keep it for
    /// round 1 when the role is part of this cycle and still free;
    /// everyone else fills the remaining seats in order. Passive observers
    /// get `None`.
    pub fn assign_seats(&self, participants: &[Participant]) -> Result<Vec<Option<usize>>, DomainError> {
        let cycle = self.cycle();
        let active = crate::session::participant::active_count(participants);
        if active != cycle.len() {
            return Err(DomainError::RoleRotationUndefined { active });
        }

        let mut taken = vec![false; cycle.len()];
        let mut seats: Vec<Option<usize>> = vec![None; participants.len()];

        for (i, participant) in participants.iter().enumerate() {
            if participant.is_passive() {
                continue;
            }
            if let Some(role) = participant.role
                && let Some(seat) = (0..cycle.len()).find(|s| cycle[*s] == role && !taken[*s])
            {
                taken[seat] = true;
                seats[i] = Some(seat);
            }
        }

        for (i, participant) in participants.iter().enumerate() {
            if participant.is_passive() || seats[i].is_some() {
                continue;
            }
            // active == cycle.len(), so a free seat always exists here
            if let Some(seat) = taken.iter().position(|t| !t) {
                taken[seat] = true;
                seats[i] = Some(seat);
            }
        }

        Ok(seats)
    }

    pub fn description(&self) -> &'static str {
        match self {
            RotationPolicy::Pair => "pair (speaker ↔ listener)",
            RotationPolicy::Trio => "trio (speaker → listener → scribe)",
            RotationPolicy::Quartet => "quartet (speaker → listener → scribe → observer)",
            RotationPolicy::FiveTogether => "five together (two observers per round)",
        }
    }
}

impl std::fmt::Display for RotationPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.description())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn all_policies() -> [RotationPolicy; 4] {
        [
            RotationPolicy::Pair,
            RotationPolicy::Trio,
            RotationPolicy::Quartet,
            RotationPolicy::FiveTogether,
        ]
    }

    #[test]
    fn test_total_rounds_by_count() {
        assert_eq!(RotationPolicy::for_active_count(2).unwrap().total_rounds(), 2);
        assert_eq!(RotationPolicy::for_active_count(3).unwrap().total_rounds(), 3);
        assert_eq!(RotationPolicy::for_active_count(4).unwrap().total_rounds(), 4);
        assert_eq!(RotationPolicy::FiveTogether.total_rounds(), 5);
    }

    #[test]
    fn test_undefined_counts_are_rejected() {
        for n in [0, 1, 6, 9] {
            assert_eq!(
                RotationPolicy::for_active_count(n),
                Err(DomainError::RoleRotationUndefined { active: n })
            );
        }
        assert_eq!(
            RotationPolicy::for_active_count(5),
            Err(DomainError::GroupPartitionRequired)
        );
    }

    #[test]
    fn test_pair_rotation() {
        let policy = RotationPolicy::Pair;
        assert_eq!(policy.next_role(Some(Role::Speaker)), Role::Listener);
        assert_eq!(policy.next_role(Some(Role::Listener)), Role::Speaker);
        assert_eq!(policy.next_role(Some(Role::Scribe)), Role::Speaker);
        assert_eq!(policy.next_role(Some(Role::ObserverTemporary)), Role::Speaker);
        assert_eq!(policy.next_role(None), Role::Speaker);
    }

    #[test]
    fn test_trio_and_quartet_order() {
        assert_eq!(RotationPolicy::Trio.next_role(Some(Role::Scribe)), Role::Speaker);
        assert_eq!(
            RotationPolicy::Quartet.next_role(Some(Role::Scribe)),
            Role::ObserverTemporary
        );
        assert_eq!(
            RotationPolicy::Quartet.next_role(Some(Role::ObserverTemporary)),
            Role::Speaker
        );
    }

    #[test]
    fn test_cycle_closure() {
        for policy in [RotationPolicy::Pair, RotationPolicy::Trio, RotationPolicy::Quartet] {
            for start in policy.cycle() {
                let mut role = *start;
                for _ in 0..policy.total_rounds() {
                    role = policy.next_role(Some(role));
                }
                assert_eq!(role, *start, "{policy} did not close from {start}");
            }
        }
    }

    #[test]
    fn test_passive_observer_never_rotates() {
        for policy in all_policies() {
            assert_eq!(
                policy.next_role(Some(Role::ObserverPermanent)),
                Role::ObserverPermanent
            );
        }
    }

    #[test]
    fn test_seat_rotation_is_latin_square() {
        for policy in all_policies() {
            let n = policy.seat_count();
            for seat in 0..n {
                let mut positions: Vec<usize> = (1..=policy.total_rounds())
                    .map(|round| (seat + round as usize - 1) % n)
                    .collect();
                positions.sort_unstable();
                assert_eq!(positions, (0..n).collect::<Vec<_>>());
            }
            for round in 1..=policy.total_rounds() {
                let mut staffed: Vec<Role> =
                    (0..n).map(|seat| policy.role_for_seat(seat, round)).collect();
                let mut expected = policy.cycle().to_vec();
                staffed.sort_by_key(|r| r.as_str());
                expected.sort_by_key(|r| r.as_str());
                assert_eq!(staffed, expected);
            }
        }
    }

    #[test]
    fn test_seat_rotation_agrees_with_next_role() {
        for policy in [RotationPolicy::Pair, RotationPolicy::Trio, RotationPolicy::Quartet] {
            for seat in 0..policy.seat_count() {
                for round in 1..policy.total_rounds() {
                    let current = policy.role_for_seat(seat, round);
                    assert_eq!(
                        policy.next_role(Some(current)),
                        policy.role_for_seat(seat, round + 1)
                    );
                }
            }
        }
    }

    #[test]
    fn test_five_together_staffs_three_active_roles() {
        let policy = RotationPolicy::FiveTogether;
        assert_eq!(
            policy.active_roles(),
            vec![Role::Speaker, Role::Listener, Role::Scribe, Role::ObserverTemporary]
        );
        for round in 1..=5 {
            let observers = (0..5)
                .filter(|s| policy.role_for_seat(*s, round) == Role::ObserverTemporary)
                .count();
            assert_eq!(observers, 2);
        }
    }

    #[test]
    fn test_assign_seats_keeps_lobby_choices() {
        let participants = vec![
            Participant::new("a", "Ada"),
            Participant::new("b", "Ben").with_role(Role::Speaker),
            Participant::new("p", "Pat").with_role(Role::ObserverPermanent),
            Participant::new("c", "Cy").with_role(Role::Scribe),
        ];
        let seats = RotationPolicy::Trio.assign_seats(&participants).unwrap();
        assert_eq!(seats, vec![Some(1), Some(0), None, Some(2)]);
    }

    #[test]
    fn test_assign_seats_resolves_duplicate_choices() {
        let participants = vec![
            Participant::new("a", "Ada").with_role(Role::Speaker),
            Participant::new("b", "Ben").with_role(Role::Speaker),
        ];
        let seats = RotationPolicy::Pair.assign_seats(&participants).unwrap();
        assert_eq!(seats, vec![Some(0), Some(1)]);
    }

    #[test]
    fn test_assign_seats_rejects_wrong_group_size() {
        let participants = vec![Participant::new("a", "Ada"), Participant::new("b", "Ben")];
        assert_eq!(
            RotationPolicy::Trio.assign_seats(&participants),
            Err(DomainError::RoleRotationUndefined { active: 2 })
        );
    }
}
