//! Tournament lifecycle controller.
//!
//! [`Engine`] owns no tournament state of its own: every call reloads the tournament
//! from [`Storage`], so an external timer may poll it unconditionally and a tick that
//! died halfway can simply be run again.

use crate::error::EngineError;
use crate::model::{
    Course, FinalResult, HOLES_PER_ROUND, LiveScore, PlayerId, PlayerStatus, Round, ScoreDisplay,
    Standing, TeeGroup, Tournament, TournamentId, TournamentPlayer, TournamentStatus,
};
use crate::sim::cut::{decide_cut, pair_for_weekend};
use crate::sim::leaderboard::{LeaderboardInput, build_leaderboard};
use crate::sim::schedule::{block_length, hole_for_group, plan_step, scored_set};
use crate::sim::scoring::{UniformSource, hole_score};
use crate::storage::{CutCommit, Storage};
use ahash::{AHashMap, AHashSet};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, PoisonError};
use tokio::sync::Mutex as AsyncMutex;
use tracing::{debug, info, warn};

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(default)]
pub struct EngineConfig {
    /// Number of ranked players kept after round 2, plus ties.
    pub cut_size: usize,
    pub initial_group_size: usize,
    pub weekend_group_size: usize,
    /// Move to the next round from the tick as soon as the current one is complete.
    pub auto_advance: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            cut_size: 65,
            initial_group_size: 3,
            weekend_group_size: 2,
            auto_advance: false,
        }
    }
}

/// What one call to [`Engine::advance_one_step`] did.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub enum StepOutcome {
    /// Missing, pending or finished tournament.
    Idle,
    Played { step: u64, holes_scored: usize },
    /// Every active player has finished the round; waiting for the next round to begin.
    RoundComplete { round: Round },
    /// All tee times have elapsed but some active player is still missing holes.
    WaitingForCompletion { round: Round },
    CutApplied { survivors: usize, missed: usize },
    RoundAdvanced { round: Round },
    Completed,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub enum CutOutcome {
    /// Round 2 is not finished, or the tournament is not active.
    NotDue,
    AlreadyApplied,
    Applied {
        line: Option<i32>,
        survivors: usize,
        missed: usize,
    },
}

fn is_active(status: TournamentStatus) -> bool {
    status == TournamentStatus::Active
}

pub struct Engine {
    storage: Arc<dyn Storage>,
    config: EngineConfig,
    source: std::sync::Mutex<Box<dyn UniformSource>>,
    tick_locks: AsyncMutex<AHashMap<TournamentId, Arc<AsyncMutex<()>>>>,
}

impl Engine {
    pub fn new<S: UniformSource + 'static>(
        storage: Arc<dyn Storage>,
        config: EngineConfig,
        source: S,
    ) -> Self {
        Self {
            storage,
            config,
            source: std::sync::Mutex::new(Box::new(source)),
            tick_locks: AsyncMutex::new(AHashMap::new()),
        }
    }

    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    async fn tournament_lock(&self, id: TournamentId) -> Arc<AsyncMutex<()>> {
        let mut guard = self.tick_locks.lock().await;
        guard
            .entry(id)
            .or_insert_with(|| Arc::new(AsyncMutex::new(())))
            .clone()
    }

    /// The tournament's lock, handed out only while its status satisfies `wanted`.
    /// Polling a missing or finished tournament leaves no entry behind.
    async fn lock_when(
        &self,
        id: TournamentId,
        wanted: impl Fn(TournamentStatus) -> bool,
    ) -> Result<Option<Arc<AsyncMutex<()>>>, EngineError> {
        let status = self.storage.get_tournament(id).await?.map(|t| t.status);
        if !status.is_some_and(wanted) {
            return Ok(None);
        }
        Ok(Some(self.tournament_lock(id).await))
    }

    async fn release_lock(&self, id: TournamentId) {
        self.tick_locks.lock().await.remove(&id);
    }

    async fn active_tournament(&self, id: TournamentId) -> Result<Option<Tournament>, EngineError> {
        Ok(self
            .storage
            .get_tournament(id)
            .await?
            .filter(|t| t.status == TournamentStatus::Active))
    }

    async fn course_for(&self, tournament: &Tournament) -> Result<Course, EngineError> {
        self.storage
            .get_course(tournament.course_id)
            .await?
            .ok_or_else(|| {
                EngineError::InvalidCourse(format!("course {} not found", tournament.course_id))
            })
    }

    /// Starts a pending tournament: opening groups ranked by overall skill, step 0, round 1.
    ///
    /// # Errors
    ///
    /// Will return `Err` if the tournament is missing or not pending, another tournament is
    /// active, an earlier pending tournament exists, there are no players, or the course is
    /// missing or malformed. Nothing is written in any of those cases.
    pub async fn start_tournament(&self, id: TournamentId) -> Result<Vec<TeeGroup>, EngineError> {
        let result = match self.lock_when(id, |s| s == TournamentStatus::Pending).await {
            Ok(Some(lock)) => {
                let _guard = lock.lock().await;
                self.try_start(id).await
            }
            // Not pending: only the refusal is left to report.
            Ok(None) => self.try_start(id).await,
            Err(e) => Err(e),
        };
        if let Err(e) = &result {
            warn!(tournament = %id, error = %e, "refused to start tournament");
        }
        result
    }

    async fn try_start(&self, id: TournamentId) -> Result<Vec<TeeGroup>, EngineError> {
        let tournament = self
            .storage
            .get_tournament(id)
            .await?
            .ok_or(EngineError::NotFound(id))?;
        if tournament.status != TournamentStatus::Pending {
            return Err(EngineError::NotPending {
                id,
                status: tournament.status,
            });
        }
        if let Some(active) = self.storage.get_active_tournament().await? {
            return Err(EngineError::AlreadyActive(active.id));
        }
        match self.storage.next_pending_tournament().await? {
            Some(next) if next.id != id => {
                return Err(EngineError::NotNextPending {
                    requested: id,
                    next: next.id,
                });
            }
            _ => {}
        }
        self.course_for(&tournament)
            .await?
            .validate()
            .map_err(EngineError::InvalidCourse)?;

        let players = self.storage.get_players_ranked().await?;
        if players.is_empty() {
            return Err(EngineError::NoPlayers);
        }
        let groups: Vec<TeeGroup> = players
            .chunks(self.config.initial_group_size.max(1))
            .zip(1u32..)
            .map(|(chunk, number)| TeeGroup {
                number,
                players: chunk.iter().map(|p| p.id).collect(),
            })
            .collect();

        self.storage.activate_tournament(id, &groups).await?;
        info!(
            tournament = %id,
            name = %tournament.name,
            players = players.len(),
            groups = groups.len(),
            "tournament started"
        );
        Ok(groups)
    }

    /// Ticks whichever tournament is active. This is what the timer calls.
    ///
    /// Returns `None` when no tournament is active.
    ///
    /// # Errors
    ///
    /// Will return `Err` on storage failure.
    pub async fn advance_active(&self) -> Result<Option<(TournamentId, StepOutcome)>, EngineError> {
        match self.storage.get_active_tournament().await? {
            Some(t) => Ok(Some((t.id, self.advance_one_step(t.id).await?))),
            None => Ok(None),
        }
    }

    /// Runs one simulation step for the tournament.
    ///
    /// While tee times remain in the current round every group on the course scores its
    /// hole and the step counter moves on by one. Once the round's block has elapsed the
    /// counter stays put; round 2 then applies the cut, round 4 completes the tournament.
    /// Missing and non-active tournaments are a no-op.
    ///
    /// # Errors
    ///
    /// Will return `Err` on storage failure or if the course record has gone missing.
    pub async fn advance_one_step(&self, id: TournamentId) -> Result<StepOutcome, EngineError> {
        let Some(lock) = self.lock_when(id, is_active).await? else {
            return Ok(StepOutcome::Idle);
        };
        let _guard = lock.lock().await;

        let Some(tournament) = self.active_tournament(id).await? else {
            return Ok(StepOutcome::Idle);
        };
        let round = tournament.current_round;
        let round_start = tournament.current_round_start();
        let groups = self.storage.get_round_groups(id, round).await?;
        let entrants = self.storage.get_tournament_players(id).await?;

        let elapsed = tournament.simulation_step.saturating_sub(round_start);
        if elapsed >= block_length(groups.len()) {
            return self.close_round(&tournament, &entrants).await;
        }

        let course = self.course_for(&tournament).await?;
        let step = tournament.simulation_step;

        let mut scored = Vec::new();
        let holes_in_play: AHashSet<u8> = groups
            .iter()
            .filter_map(|g| hole_for_group(round_start, step, g.number))
            .collect();
        for hole in holes_in_play {
            for score in self
                .storage
                .get_live_scores_for_hole(id, round, hole)
                .await?
            {
                scored.push((score.player_id, score.hole));
            }
        }
        let scored = scored_set(scored);

        let active: AHashMap<PlayerId, &TournamentPlayer> = entrants
            .iter()
            .filter(|e| e.status == PlayerStatus::Active)
            .map(|e| (e.player.id, e))
            .collect();
        let plan = plan_step(
            &groups,
            round_start,
            step,
            |p| active.contains_key(&p),
            |p, hole| scored.contains(&(p, hole)),
        );

        let scores: Vec<LiveScore> = {
            let mut source = self.source.lock().unwrap_or_else(PoisonError::into_inner);
            let mut scores = Vec::new();
            for planned in &plan {
                let Some(hole) = course.hole(planned.hole) else {
                    continue;
                };
                for player in &planned.players {
                    if let Some(entry) = active.get(player) {
                        scores.push(LiveScore {
                            tournament_id: id,
                            player_id: *player,
                            round,
                            hole: hole.number,
                            strokes: hole_score(&entry.player.skills, hole, &mut **source),
                        });
                    }
                }
            }
            scores
        };

        for score in &scores {
            self.storage.upsert_live_score(score).await?;
            debug!(
                tournament = %id,
                player = %score.player_id,
                %round,
                hole = score.hole,
                strokes = score.strokes,
                result = ?course
                    .hole(score.hole)
                    .map(|h| ScoreDisplay::for_hole(score.strokes, h.par)),
                "hole scored"
            );
        }
        self.storage.set_simulation_step(id, step + 1).await?;

        Ok(StepOutcome::Played {
            step,
            holes_scored: scores.len(),
        })
    }

    async fn round_finished(
        &self,
        tournament: &Tournament,
        entrants: &[TournamentPlayer],
    ) -> Result<bool, EngineError> {
        let active = entrants
            .iter()
            .filter(|e| e.status == PlayerStatus::Active)
            .count();
        let finished = self
            .storage
            .count_players_finished_round(
                tournament.id,
                tournament.current_round,
                HOLES_PER_ROUND,
            )
            .await?;
        Ok(finished >= active)
    }

    async fn close_round(
        &self,
        tournament: &Tournament,
        entrants: &[TournamentPlayer],
    ) -> Result<StepOutcome, EngineError> {
        let round = tournament.current_round;
        if !self.round_finished(tournament, entrants).await? {
            return Ok(StepOutcome::WaitingForCompletion { round });
        }

        if round == Round::CUT && !tournament.cut_applied {
            return Ok(match self.apply_cut(tournament).await? {
                CutOutcome::Applied {
                    survivors, missed, ..
                } => StepOutcome::CutApplied { survivors, missed },
                CutOutcome::AlreadyApplied | CutOutcome::NotDue => {
                    StepOutcome::RoundComplete { round }
                }
            });
        }
        if round == Round::FINAL {
            self.complete(tournament).await?;
            return Ok(StepOutcome::Completed);
        }
        if self.config.auto_advance {
            let next = self.start_next_round(tournament).await?;
            return Ok(StepOutcome::RoundAdvanced { round: next });
        }
        Ok(StepOutcome::RoundComplete { round })
    }

    /// Ordered standings. Empty for a missing tournament.
    ///
    /// # Errors
    ///
    /// Will return `Err` on storage failure or if the course record is missing.
    pub async fn leaderboard(&self, id: TournamentId) -> Result<Vec<Standing>, EngineError> {
        match self.storage.get_tournament(id).await? {
            Some(tournament) => self.standings(&tournament).await,
            None => Ok(Vec::new()),
        }
    }

    async fn standings(&self, tournament: &Tournament) -> Result<Vec<Standing>, EngineError> {
        let entrants = self.storage.get_tournament_players(tournament.id).await?;
        if entrants.is_empty() {
            return Ok(Vec::new());
        }
        let course = self.course_for(tournament).await?;
        let groups = self
            .storage
            .get_round_groups(tournament.id, tournament.current_round)
            .await?;
        let scores = self.storage.get_live_scores(tournament.id).await?;

        Ok(build_leaderboard(&LeaderboardInput {
            current_round: tournament.current_round,
            round_start: tournament.current_round_start(),
            players: &entrants,
            groups: &groups,
            course: &course,
            scores: &scores,
        }))
    }

    /// Applies the cut once round 2 is complete. Safe to call repeatedly.
    ///
    /// # Errors
    ///
    /// Will return `Err` on storage failure.
    pub async fn apply_cut_if_due(&self, id: TournamentId) -> Result<CutOutcome, EngineError> {
        let Some(lock) = self.lock_when(id, is_active).await? else {
            return Ok(CutOutcome::NotDue);
        };
        let _guard = lock.lock().await;

        let Some(tournament) = self.active_tournament(id).await? else {
            return Ok(CutOutcome::NotDue);
        };
        if tournament.cut_applied {
            return Ok(CutOutcome::AlreadyApplied);
        }
        if tournament.current_round != Round::CUT {
            return Ok(CutOutcome::NotDue);
        }
        let entrants = self.storage.get_tournament_players(id).await?;
        if !self.round_finished(&tournament, &entrants).await? {
            return Ok(CutOutcome::NotDue);
        }
        self.apply_cut(&tournament).await
    }

    async fn apply_cut(&self, tournament: &Tournament) -> Result<CutOutcome, EngineError> {
        let standings = self.standings(tournament).await?;
        let decision = decide_cut(&standings, self.config.cut_size);
        let groups = pair_for_weekend(&decision.survivors, self.config.weekend_group_size);

        let commit = CutCommit {
            tournament_id: tournament.id,
            survivors: decision.survivor_ids(),
            missed_cut: decision.missed_cut.clone(),
            third_round_groups: groups,
        };
        // Standings are read outside the commit; `commit_cut` rechecks `cut_applied` in
        // its own transaction, so a second writer on the same store gets nothing.
        if !self.storage.commit_cut(&commit).await? {
            return Ok(CutOutcome::AlreadyApplied);
        }
        info!(
            tournament = %tournament.id,
            line = ?decision.line,
            survivors = commit.survivors.len(),
            missed = commit.missed_cut.len(),
            "cut applied"
        );
        Ok(CutOutcome::Applied {
            line: decision.line,
            survivors: commit.survivors.len(),
            missed: commit.missed_cut.len(),
        })
    }

    /// Moves an active tournament into its next round, starting at the current step.
    ///
    /// Returns the new round, or `None` for a missing, non-active or final-round
    /// tournament; the final round ends through the tick.
    ///
    /// # Errors
    ///
    /// Will return `Err` if the current round is unfinished, if round 2 is done but the
    /// cut has not been applied, or on storage failure.
    pub async fn advance_round(&self, id: TournamentId) -> Result<Option<Round>, EngineError> {
        let Some(lock) = self.lock_when(id, is_active).await? else {
            return Ok(None);
        };
        let _guard = lock.lock().await;

        let Some(tournament) = self.active_tournament(id).await? else {
            return Ok(None);
        };
        if tournament.current_round == Round::FINAL {
            return Ok(None);
        }
        let entrants = self.storage.get_tournament_players(id).await?;
        if !self.round_finished(&tournament, &entrants).await? {
            return Err(EngineError::RoundInProgress {
                id,
                round: tournament.current_round,
            });
        }
        if tournament.current_round == Round::CUT && !tournament.cut_applied {
            return Err(EngineError::CutPending(id));
        }
        self.start_next_round(&tournament).await.map(Some)
    }

    async fn start_next_round(&self, tournament: &Tournament) -> Result<Round, EngineError> {
        let next = tournament
            .current_round
            .next()
            .ok_or(EngineError::InvalidRound(tournament.current_round))?;
        self.storage
            .set_round_start_step(tournament.id, next, tournament.simulation_step)
            .await?;
        self.storage.set_current_round(tournament.id, next).await?;
        info!(
            tournament = %tournament.id,
            round = %next,
            start_step = tournament.simulation_step,
            "round started"
        );
        Ok(next)
    }

    /// Re-pairs the survivors for round 4 on the standings after round 3.
    ///
    /// Returns `false` for a missing or non-active tournament.
    ///
    /// # Errors
    ///
    /// Will return `Err` outside round 3, while round 3 is still being played, or on
    /// storage failure.
    pub async fn regroup_final_round(&self, id: TournamentId) -> Result<bool, EngineError> {
        let Some(lock) = self.lock_when(id, is_active).await? else {
            return Ok(false);
        };
        let _guard = lock.lock().await;

        let Some(tournament) = self.active_tournament(id).await? else {
            return Ok(false);
        };
        if tournament.current_round != Round::THIRD {
            return Err(EngineError::InvalidRound(tournament.current_round));
        }
        let entrants = self.storage.get_tournament_players(id).await?;
        if !self.round_finished(&tournament, &entrants).await? {
            return Err(EngineError::RoundInProgress {
                id,
                round: Round::THIRD,
            });
        }

        let standings = self.standings(&tournament).await?;
        let groups = pair_for_weekend(
            standings.iter().filter(|s| !s.is_cut() && s.has_started()),
            self.config.weekend_group_size,
        );
        self.storage.save_final_round_groups(id, &groups).await?;
        info!(tournament = %id, groups = groups.len(), "final round regrouped");
        Ok(true)
    }

    async fn complete(&self, tournament: &Tournament) -> Result<(), EngineError> {
        let standings = self.standings(tournament).await?;
        let results: Vec<FinalResult> = standings
            .iter()
            .map(|s| FinalResult {
                tournament_id: tournament.id,
                player_id: s.player_id,
                total_strokes: s.total_strokes,
                score_to_par: s.score_to_par,
                position: s.position,
                round_strokes: std::array::from_fn(|i| s.rounds[i].strokes),
            })
            .collect();
        self.storage
            .complete_tournament(tournament.id, &results)
            .await?;
        self.release_lock(tournament.id).await;
        info!(
            tournament = %tournament.id,
            winner = ?standings.first().map(|s| &s.player_name),
            "tournament completed"
        );
        Ok(())
    }

    /// Cancels a pending or active tournament. Returns `false` if there was nothing to cancel.
    ///
    /// # Errors
    ///
    /// Will return `Err` on storage failure.
    pub async fn cancel_tournament(&self, id: TournamentId) -> Result<bool, EngineError> {
        let Some(lock) = self.lock_when(id, |s| !s.is_terminal()).await? else {
            return Ok(false);
        };
        let _guard = lock.lock().await;

        match self.storage.get_tournament(id).await? {
            Some(t) if !t.status.is_terminal() => {
                self.storage
                    .set_tournament_status(id, TournamentStatus::Cancelled)
                    .await?;
                self.release_lock(id).await;
                info!(tournament = %id, "tournament cancelled");
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    /// # Errors
    ///
    /// Will return `Err` on storage failure.
    pub async fn final_results(&self, id: TournamentId) -> Result<Vec<FinalResult>, EngineError> {
        Ok(self.storage.get_final_results(id).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CourseId, Hole, Player, SkillVector};
    use crate::sim::scoring::FixedUniform;
    use crate::storage::MemoryStorage;
    use chrono::NaiveDate;

    const ID: TournamentId = TournamentId(1);

    async fn store(players: i64) -> Result<Arc<MemoryStorage>, Box<dyn std::error::Error>> {
        let storage = MemoryStorage::new();
        storage
            .add_course(Course {
                id: CourseId(1),
                name: "Test".to_string(),
                holes: (1..=18)
                    .map(|number| Hole {
                        number,
                        par: 4,
                        difficulty: 1.0,
                    })
                    .collect(),
            })
            .await?;
        for id in 1..=players {
            storage
                .add_player(Player {
                    id: PlayerId(id),
                    name: format!("P{id}"),
                    country: None,
                    skills: SkillVector::uniform(90.0),
                })
                .await;
        }
        let date = NaiveDate::from_ymd_opt(2026, 4, 9).ok_or("bad date")?;
        storage
            .add_tournament(Tournament::pending(ID, "Open", CourseId(1), date))
            .await;
        Ok(Arc::new(storage))
    }

    async fn lock_count(engine: &Engine) -> usize {
        engine.tick_locks.lock().await.len()
    }

    #[tokio::test]
    async fn polling_unknown_ids_leaves_no_locks() -> Result<(), Box<dyn std::error::Error>> {
        let engine = Engine::new(store(3).await?, EngineConfig::default(), FixedUniform(0.0));
        for id in 2..2_000 {
            let id = TournamentId(id);
            assert_eq!(engine.advance_one_step(id).await?, StepOutcome::Idle);
            assert_eq!(engine.apply_cut_if_due(id).await?, CutOutcome::NotDue);
            assert_eq!(engine.advance_round(id).await?, None);
            assert!(!engine.regroup_final_round(id).await?);
            assert!(!engine.cancel_tournament(id).await?);
            assert!(engine.start_tournament(id).await.is_err());
        }
        // Pending but never ticked.
        assert_eq!(engine.advance_one_step(ID).await?, StepOutcome::Idle);
        assert_eq!(lock_count(&engine).await, 0);

        engine.start_tournament(ID).await?;
        assert_eq!(lock_count(&engine).await, 1);
        assert!(engine.cancel_tournament(ID).await?);
        assert_eq!(lock_count(&engine).await, 0);
        assert_eq!(engine.advance_one_step(ID).await?, StepOutcome::Idle);
        assert_eq!(lock_count(&engine).await, 0);
        Ok(())
    }

    #[tokio::test]
    async fn completion_drops_the_lock() -> Result<(), Box<dyn std::error::Error>> {
        let config = EngineConfig {
            auto_advance: true,
            ..EngineConfig::default()
        };
        let engine = Engine::new(store(3).await?, config, FixedUniform(0.0));
        engine.start_tournament(ID).await?;

        let mut last = StepOutcome::Idle;
        for _ in 0..200 {
            last = engine.advance_one_step(ID).await?;
            if last == StepOutcome::Completed {
                break;
            }
        }
        assert_eq!(last, StepOutcome::Completed);
        assert_eq!(lock_count(&engine).await, 0);
        assert_eq!(engine.advance_one_step(ID).await?, StepOutcome::Idle);
        assert_eq!(lock_count(&engine).await, 0);
        Ok(())
    }
}
