//! Staggered tee-time scheduling.
//!
//! One group tees off per step. Group `g` (1-based) plays hole
//! `(step - round_start) - (g - 1) + 1` and sits out whenever that falls outside
//! `1..=18`.

use crate::model::{HOLES_PER_ROUND, PlayerId, TeeGroup};
use ahash::AHashSet;

/// Steps between consecutive groups' tee times.
pub const STAGGER_INTERVAL: u64 = 1;

/// Steps needed for every group of a round to play all 18 holes.
#[must_use]
pub fn block_length(group_count: usize) -> u64 {
    if group_count == 0 {
        return 0;
    }
    (group_count as u64 - 1) * STAGGER_INTERVAL + u64::from(HOLES_PER_ROUND)
}

/// Step at which group `group` plays its first hole.
#[must_use]
pub fn tee_step(round_start: u64, group: u32) -> u64 {
    round_start + u64::from(group.saturating_sub(1)) * STAGGER_INTERVAL
}

/// First step at which `group` has every hole of the round behind it.
#[must_use]
pub fn finish_step(round_start: u64, group: u32) -> u64 {
    tee_step(round_start, group) + u64::from(HOLES_PER_ROUND)
}

/// Hole `group` plays at global `step`, or `None` when it has not teed off yet or is done.
#[must_use]
pub fn hole_for_group(round_start: u64, step: u64, group: u32) -> Option<u8> {
    let offset = step.checked_sub(tee_step(round_start, group))?;
    let offset = u8::try_from(offset).ok()?;
    (offset < HOLES_PER_ROUND).then(|| offset + 1)
}

/// A group that owes a hole this step, with only the players still missing a score.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedHole {
    pub group: u32,
    pub hole: u8,
    pub players: Vec<PlayerId>,
}

/// Works out who plays what at `step`.
///
/// `eligible` filters out players who must not be scored (cut players). `already_scored`
/// reports whether a player has a score for a hole in this round; those players are
/// skipped so a replayed step writes nothing new. Groups left with nobody to score are
/// dropped.
pub fn plan_step<E, S>(
    groups: &[TeeGroup],
    round_start: u64,
    step: u64,
    eligible: E,
    already_scored: S,
) -> Vec<PlannedHole>
where
    E: Fn(PlayerId) -> bool,
    S: Fn(PlayerId, u8) -> bool,
{
    groups
        .iter()
        .filter_map(|group| {
            let hole = hole_for_group(round_start, step, group.number)?;
            let players: Vec<PlayerId> = group
                .players
                .iter()
                .copied()
                .filter(|p| eligible(*p) && !already_scored(*p, hole))
                .collect();
            (!players.is_empty()).then_some(PlannedHole {
                group: group.number,
                hole,
                players,
            })
        })
        .collect()
}

/// Convenience set for [`plan_step`]'s `already_scored` check.
#[must_use]
pub fn scored_set(scores: impl IntoIterator<Item = (PlayerId, u8)>) -> AHashSet<(PlayerId, u8)> {
    scores.into_iter().collect()
}
