use crate::model::{
    Course, HOLES_PER_ROUND, LiveScore, PlayerId, PlayerStatus, Round, RoundScore, Standing,
    TeeGroup, TournamentPlayer, to_par_display,
};
use crate::sim::schedule::tee_step;
use ahash::AHashMap;
use std::cmp::Ordering;

/// Par assumed for a hole missing from the course record.
const FALLBACK_PAR: u8 = 4;

pub struct LeaderboardInput<'a> {
    pub current_round: Round,
    pub round_start: u64,
    pub players: &'a [TournamentPlayer],
    /// Groups for the current round; used for the tee group and tee step columns.
    pub groups: &'a [TeeGroup],
    pub course: &'a Course,
    pub scores: &'a [LiveScore],
}

/// Sort criteria, applied in declaration order.
#[derive(Debug, Clone, Copy)]
enum Criterion {
    /// Players yet to tee off go after everyone who has.
    NotStartedLast,
    /// Players who missed the cut go after active players.
    CutLast,
    ScoreToPar,
    TotalStrokes,
    /// Among players yet to start: earliest tee time first.
    TeeStep,
    PlayerId,
}

const ORDER: [Criterion; 6] = [
    Criterion::NotStartedLast,
    Criterion::CutLast,
    Criterion::ScoreToPar,
    Criterion::TotalStrokes,
    Criterion::TeeStep,
    Criterion::PlayerId,
];

impl Criterion {
    fn compare(self, a: &Standing, b: &Standing) -> Ordering {
        match self {
            Self::NotStartedLast => b.has_started().cmp(&a.has_started()),
            Self::CutLast => a.is_cut().cmp(&b.is_cut()),
            Self::ScoreToPar => a.score_to_par.cmp(&b.score_to_par),
            Self::TotalStrokes => a.total_strokes.cmp(&b.total_strokes),
            Self::TeeStep => a.tee_step.cmp(&b.tee_step),
            Self::PlayerId => a.player_id.cmp(&b.player_id),
        }
    }
}

#[must_use]
pub fn compare_standings(a: &Standing, b: &Standing) -> Ordering {
    ORDER
        .iter()
        .fold(Ordering::Equal, |acc, c| acc.then_with(|| c.compare(a, b)))
}

fn round_score(scores: &[&LiveScore], par_of: impl Fn(u8) -> u8) -> RoundScore {
    if scores.is_empty() {
        return RoundScore::default();
    }
    let strokes: i32 = scores.iter().map(|s| s.strokes).sum();
    if scores.len() < usize::from(HOLES_PER_ROUND) {
        let par: i32 = scores.iter().map(|s| i32::from(par_of(s.hole))).sum();
        RoundScore {
            display: Some(to_par_display(strokes - par)),
            strokes: None,
        }
    } else {
        RoundScore {
            display: Some(strokes.to_string()),
            strokes: Some(strokes),
        }
    }
}

/// Builds ordered standings from raw hole scores.
///
/// Positions are given only to active players who have started; players level on
/// `score_to_par` share a position, and the next distinct score takes its 1-based index.
#[must_use]
pub fn build_leaderboard(input: &LeaderboardInput<'_>) -> Vec<Standing> {
    let par_of = |hole: u8| {
        input
            .course
            .hole(hole)
            .map_or(FALLBACK_PAR, |h| h.par)
    };

    let mut by_player: AHashMap<PlayerId, Vec<&LiveScore>> = AHashMap::new();
    for score in input.scores {
        by_player.entry(score.player_id).or_default().push(score);
    }

    let group_of: AHashMap<PlayerId, u32> = input
        .groups
        .iter()
        .flat_map(|g| g.players.iter().map(move |p| (*p, g.number)))
        .collect();

    let mut standings: Vec<Standing> = input
        .players
        .iter()
        .map(|entry| {
            let id = entry.player.id;
            let scores = by_player.get(&id).map(Vec::as_slice).unwrap_or_default();
            let total_strokes: i32 = scores.iter().map(|s| s.strokes).sum();
            let par_played: i32 = scores.iter().map(|s| i32::from(par_of(s.hole))).sum();

            let mut rounds: [RoundScore; 4] = Default::default();
            for round in Round::all() {
                let in_round: Vec<&LiveScore> =
                    scores.iter().copied().filter(|s| s.round == round).collect();
                rounds[round.index()] = round_score(&in_round, par_of);
            }
            if entry.status == PlayerStatus::Cut {
                for round in [Round::THIRD, Round::FINAL] {
                    rounds[round.index()] = RoundScore {
                        display: Some("CUT".to_string()),
                        strokes: None,
                    };
                }
            }

            let thru = scores
                .iter()
                .filter(|s| s.round == input.current_round)
                .count();
            let tee_group = group_of.get(&id).copied();

            Standing {
                player_id: id,
                player_name: entry.player.name.clone(),
                status: entry.status,
                tee_group,
                tee_step: tee_group.map(|g| tee_step(input.round_start, g)),
                total_strokes,
                score_to_par: total_strokes - par_played,
                holes_played: u32::try_from(scores.len()).unwrap_or(u32::MAX),
                thru: u8::try_from(thru).unwrap_or(u8::MAX),
                rounds,
                position: None,
            }
        })
        .collect();

    standings.sort_by(compare_standings);
    assign_positions(&mut standings);
    standings
}

fn assign_positions(standings: &mut [Standing]) {
    let mut previous: Option<(i32, u32)> = None;
    for (idx, standing) in standings.iter_mut().enumerate() {
        if standing.is_cut() || !standing.has_started() {
            standing.position = None;
            continue;
        }
        let position = match previous {
            Some((score, pos)) if score == standing.score_to_par => pos,
            _ => u32::try_from(idx + 1).unwrap_or(u32::MAX),
        };
        standing.position = Some(position);
        previous = Some((standing.score_to_par, position));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::RoundScore;

    fn standing(id: i64, to_par: i32, strokes: i32, holes: u32, status: PlayerStatus) -> Standing {
        Standing {
            player_id: PlayerId(id),
            player_name: format!("P{id}"),
            status,
            tee_group: Some(1),
            tee_step: Some(0),
            total_strokes: strokes,
            score_to_par: to_par,
            holes_played: holes,
            thru: 0,
            rounds: <[RoundScore; 4]>::default(),
            position: None,
        }
    }

    #[test]
    fn comparator_buckets_then_scores() {
        let mut rows = vec![
            standing(1, 0, 0, 0, PlayerStatus::Active),
            standing(2, 3, 150, 36, PlayerStatus::Cut),
            standing(3, 2, 74, 18, PlayerStatus::Active),
            standing(4, -1, 71, 18, PlayerStatus::Active),
        ];
        rows.sort_by(compare_standings);
        let ids: Vec<i64> = rows.iter().map(|s| s.player_id.0).collect();
        assert_eq!(ids, vec![4, 3, 2, 1]);
    }

    #[test]
    fn ties_share_position_and_next_skips() {
        let mut rows = vec![
            standing(1, -3, 69, 18, PlayerStatus::Active),
            standing(2, -3, 69, 18, PlayerStatus::Active),
            standing(3, -1, 71, 18, PlayerStatus::Active),
        ];
        assign_positions(&mut rows);
        let positions: Vec<Option<u32>> = rows.iter().map(|s| s.position).collect();
        assert_eq!(positions, vec![Some(1), Some(1), Some(3)]);
    }
}
