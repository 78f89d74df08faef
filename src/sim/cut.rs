use crate::model::{PlayerId, Standing, TeeGroup};

/// Outcome of measuring the field against the cut size. Nothing is written here.
#[derive(Debug, Clone, PartialEq)]
pub struct CutDecision {
    /// `score_to_par` of the player ranked at the cut size, or `None` when no line was
    /// drawn: the field is no larger than the cut size, or the cut size is zero.
    pub line: Option<i32>,
    /// Survivors in leaderboard order.
    pub survivors: Vec<Standing>,
    pub missed_cut: Vec<PlayerId>,
}

impl CutDecision {
    #[must_use]
    pub fn survivor_ids(&self) -> Vec<PlayerId> {
        self.survivors.iter().map(|s| s.player_id).collect()
    }
}

/// Decides who plays the weekend.
///
/// `standings` must be in leaderboard order. Only active players with at least one
/// recorded hole are ranked; everyone else misses the cut. Ties at the line all
/// survive, so the survivor count can exceed `cut_size`. A `cut_size` of zero cuts
/// the whole field.
#[must_use]
pub fn decide_cut(standings: &[Standing], cut_size: usize) -> CutDecision {
    if cut_size == 0 {
        return CutDecision {
            line: None,
            survivors: Vec::new(),
            missed_cut: standings.iter().map(|s| s.player_id).collect(),
        };
    }
    let (ranked, unranked): (Vec<&Standing>, Vec<&Standing>) = standings
        .iter()
        .partition(|s| s.has_started() && !s.is_cut());

    let line = if ranked.len() > cut_size {
        ranked
            .get(cut_size - 1)
            .map(|s| s.score_to_par)
    } else {
        None
    };

    let mut survivors = Vec::with_capacity(ranked.len());
    let mut missed_cut: Vec<PlayerId> = unranked.iter().map(|s| s.player_id).collect();
    for standing in ranked {
        match line {
            Some(line) if standing.score_to_par > line => missed_cut.push(standing.player_id),
            _ => survivors.push(standing.clone()),
        }
    }

    CutDecision {
        line,
        survivors,
        missed_cut,
    }
}

/// Pairs players for a weekend round, leaders last.
///
/// Players are sorted best first, chunked into groups of `group_size`, and the chunk
/// order is reversed so group 1 holds the worst scores. With an uneven count the short
/// chunk is the worst one and tees off first.
#[must_use]
pub fn pair_for_weekend<'a>(
    standings: impl IntoIterator<Item = &'a Standing>,
    group_size: usize,
) -> Vec<TeeGroup> {
    let mut field: Vec<&Standing> = standings.into_iter().collect();
    field.sort_by(|a, b| {
        a.score_to_par
            .cmp(&b.score_to_par)
            .then_with(|| a.total_strokes.cmp(&b.total_strokes))
            .then_with(|| a.player_id.cmp(&b.player_id))
    });

    field
        .chunks(group_size.max(1))
        .rev()
        .zip(1u32..)
        .map(|(chunk, number)| TeeGroup {
            number,
            players: chunk.iter().map(|s| s.player_id).collect(),
        })
        .collect()
}
