//! Capacity allocation across role limits.
//!
//! Given an event's roles, limits and participants, [`allocate`] decides
//! how many participants of each role count against that role's limit
//! and which participants spill over. It is a pure function: persisting
//! the resulting fill counts is the caller's job.
//!
//! # Algorithm
//!
//! 1. **Grouping.** Participants are grouped by role, keeping registry
//!    order. Each role is paired with its limit for the event (the last
//!    matching row wins when duplicates exist).
//! 2. **Primary pass.** For every non-fallback role with a limit, the
//!    first `size` participants are counted and the rest overflow. A
//!    non-fallback role without a limit overflows entirely.
//! 3. **Fallback pass.** Every fallback role with a limit receives its own
//!    participants followed by the pending overflow, and the same
//!    arithmetic applies. What does not fit becomes the new overflow.
//!    A fallback role without a limit leaves the overflow untouched.
//!
//! Roles are visited in the order given; overflow therefore accumulates
//! role by role, not in global registration order.

use super::{LimitRecord, Participant, Role};

/// Fill count computed for one limit row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LimitFill {
    /// Limit row to update.
    pub limit_id: i64,
    /// Role the limit belongs to.
    pub role_id: i64,
    /// Participants counted against the limit.
    pub filled: u32,
}

/// Outcome of one allocation run.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Allocation {
    /// Fill counts in the order they were decided.
    pub fills: Vec<LimitFill>,
    /// Participants no limit could absorb.
    pub overflow: Vec<Participant>,
}

impl Allocation {
    /// Number of unabsorbed participants.
    #[must_use]
    pub fn overflow_count(&self) -> u32 {
        u32::try_from(self.overflow.len()).unwrap_or(u32::MAX)
    }

    /// Returns the fill decided for `limit_id`, if any.
    #[must_use]
    pub fn fill_for(&self, limit_id: i64) -> Option<u32> {
        self.fills
            .iter()
            .rev()
            .find(|fill| fill.limit_id == limit_id)
            .map(|fill| fill.filled)
    }
}

struct RoleGroup<'a> {
    role: &'a Role,
    members: Vec<&'a Participant>,
    limit: Option<&'a LimitRecord>,
}

/// Splits `members` at `size`: the head is counted, the tail overflows.
fn split_at_capacity<'a>(
    members: &[&'a Participant],
    size: u32,
) -> (u32, Vec<&'a Participant>) {
    let capacity = usize::try_from(size).unwrap_or(usize::MAX);
    if members.len() <= capacity {
        let filled = u32::try_from(members.len()).unwrap_or(u32::MAX);
        (filled, Vec::new())
    } else {
        let spilled = members.get(capacity..).unwrap_or_default().to_vec();
        (size, spilled)
    }
}

/// Partitions `participants` into per-limit fill counts and overflow.
///
/// `roles` and `participants` are visited in the order given; callers
/// pass roles by id and participants by participation id to make the
/// result reproducible. Participants whose role is not in `roles` are
/// ignored, as are limits without a role.
#[must_use]
pub fn allocate(roles: &[Role], limits: &[LimitRecord], participants: &[Participant]) -> Allocation {
    let groups: Vec<RoleGroup<'_>> = roles
        .iter()
        .map(|role| RoleGroup {
            role,
            members: participants
                .iter()
                .filter(|p| p.role_id == role.id)
                .collect(),
            limit: limits
                .iter()
                .rev()
                .find(|limit| limit.role_id == Some(role.id)),
        })
        .collect();

    let mut fills = Vec::new();
    let mut overflow: Vec<&Participant> = Vec::new();

    for group in groups.iter().filter(|g| !g.role.power.is_fallback()) {
        match group.limit {
            Some(limit) => {
                let (filled, spilled) = split_at_capacity(&group.members, limit.size);
                fills.push(LimitFill {
                    limit_id: limit.id,
                    role_id: group.role.id,
                    filled,
                });
                overflow.extend(spilled);
            }
            None => overflow.extend(group.members.iter().copied()),
        }
    }

    for group in groups.iter().filter(|g| g.role.power.is_fallback()) {
        let Some(limit) = group.limit else {
            continue;
        };
        let mut combined = group.members.clone();
        combined.append(&mut overflow);
        let (filled, spilled) = split_at_capacity(&combined, limit.size);
        fills.push(LimitFill {
            limit_id: limit.id,
            role_id: group.role.id,
            filled,
        });
        overflow = spilled;
    }

    Allocation {
        fills,
        overflow: overflow.into_iter().cloned().collect(),
    }
}
