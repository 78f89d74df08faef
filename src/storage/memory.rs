use super::{CutCommit, Storage, StorageError};
use crate::model::{
    Catalog, Course, CourseId, FinalResult, LiveScore, Player, PlayerId, PlayerStatus,
    PrefillCounts, Round, TeeGroup, Tournament, TournamentId, TournamentPlayer, TournamentStatus,
};
use ahash::{AHashMap, AHashSet};
use async_trait::async_trait;
use std::collections::BTreeMap;
use tokio::sync::RwLock;

type ScoreKey = (TournamentId, PlayerId, Round, u8);

#[derive(Default)]
struct State {
    players: BTreeMap<PlayerId, Player>,
    courses: AHashMap<CourseId, Course>,
    tournaments: BTreeMap<TournamentId, Tournament>,
    // Insertion order is kept so reads come back in opening-group order.
    entrants: AHashMap<TournamentId, Vec<(PlayerId, u32, PlayerStatus)>>,
    round_groups: AHashMap<(TournamentId, Round), Vec<TeeGroup>>,
    scores: BTreeMap<ScoreKey, i32>,
    results: AHashMap<TournamentId, Vec<FinalResult>>,
}

impl State {
    fn tournament_mut(&mut self, id: TournamentId) -> Result<&mut Tournament, StorageError> {
        self.tournaments
            .get_mut(&id)
            .ok_or_else(|| StorageError::new(format!("tournament {id} not found")))
    }

    fn opening_groups(&self, id: TournamentId) -> Vec<TeeGroup> {
        let mut by_group: BTreeMap<u32, Vec<PlayerId>> = BTreeMap::new();
        for (player, group, _) in self.entrants.get(&id).into_iter().flatten() {
            by_group.entry(*group).or_default().push(*player);
        }
        by_group
            .into_iter()
            .map(|(number, players)| TeeGroup { number, players })
            .collect()
    }

    fn set_statuses(&mut self, id: TournamentId, players: &[PlayerId], status: PlayerStatus) {
        let wanted: AHashSet<PlayerId> = players.iter().copied().collect();
        if let Some(entrants) = self.entrants.get_mut(&id) {
            for (player, _, current) in entrants.iter_mut() {
                if wanted.contains(&*player) {
                    *current = status;
                }
            }
        }
    }
}

/// Map-backed store. Every call takes the lock once, so multi-part writes such as
/// [`Storage::commit_cut`] are atomic to readers.
#[derive(Default)]
pub struct MemoryStorage {
    state: RwLock<State>,
}

impl MemoryStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add_player(&self, player: Player) {
        self.state.write().await.players.insert(player.id, player);
    }

    /// # Errors
    ///
    /// Will return `Err` if the course does not have 18 well-formed holes.
    pub async fn add_course(&self, course: Course) -> Result<(), StorageError> {
        course.validate()?;
        self.state.write().await.courses.insert(course.id, course);
        Ok(())
    }

    pub async fn add_tournament(&self, tournament: Tournament) {
        self.state
            .write()
            .await
            .tournaments
            .insert(tournament.id, tournament);
    }

    /// Loads a catalog, skipping ids that are already present.
    ///
    /// # Errors
    ///
    /// Will return `Err` if the catalog does not validate; nothing is loaded.
    pub async fn prefill(&self, catalog: Catalog) -> Result<PrefillCounts, StorageError> {
        catalog.validate()?;
        let mut state = self.state.write().await;
        let mut counts = PrefillCounts::default();
        for player in catalog.players {
            if !state.players.contains_key(&player.id) {
                state.players.insert(player.id, player);
                counts.players += 1;
            }
        }
        for course in catalog.courses {
            if !state.courses.contains_key(&course.id) {
                state.courses.insert(course.id, course);
                counts.courses += 1;
            }
        }
        for entry in &catalog.tournaments {
            if !state.tournaments.contains_key(&entry.id) {
                state.tournaments.insert(entry.id, Tournament::from(entry));
                counts.tournaments += 1;
            }
        }
        Ok(counts)
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn get_tournament(&self, id: TournamentId) -> Result<Option<Tournament>, StorageError> {
        Ok(self.state.read().await.tournaments.get(&id).cloned())
    }

    async fn get_active_tournament(&self) -> Result<Option<Tournament>, StorageError> {
        Ok(self
            .state
            .read()
            .await
            .tournaments
            .values()
            .find(|t| t.status == TournamentStatus::Active)
            .cloned())
    }

    async fn next_pending_tournament(&self) -> Result<Option<Tournament>, StorageError> {
        Ok(self
            .state
            .read()
            .await
            .tournaments
            .values()
            .filter(|t| t.status == TournamentStatus::Pending)
            .min_by_key(|t| (t.start_date, t.id))
            .cloned())
    }

    async fn get_course(&self, id: CourseId) -> Result<Option<Course>, StorageError> {
        Ok(self.state.read().await.courses.get(&id).cloned())
    }

    async fn get_players_ranked(&self) -> Result<Vec<Player>, StorageError> {
        let mut players: Vec<Player> = self.state.read().await.players.values().cloned().collect();
        players.sort_by(|a, b| {
            b.skills
                .overall
                .total_cmp(&a.skills.overall)
                .then_with(|| a.id.cmp(&b.id))
        });
        Ok(players)
    }

    async fn get_tournament_players(
        &self,
        id: TournamentId,
    ) -> Result<Vec<TournamentPlayer>, StorageError> {
        let state = self.state.read().await;
        state
            .entrants
            .get(&id)
            .into_iter()
            .flatten()
            .map(|(player_id, group, status)| {
                let player = state
                    .players
                    .get(player_id)
                    .cloned()
                    .ok_or_else(|| StorageError::new(format!("player {player_id} not found")))?;
                Ok(TournamentPlayer {
                    player,
                    initial_group: *group,
                    status: *status,
                })
            })
            .collect()
    }

    async fn activate_tournament(
        &self,
        id: TournamentId,
        groups: &[TeeGroup],
    ) -> Result<(), StorageError> {
        let mut state = self.state.write().await;
        if let Some(active) = state
            .tournaments
            .values()
            .find(|t| t.status == TournamentStatus::Active && t.id != id)
        {
            return Err(StorageError::new(format!(
                "tournament {} is already active",
                active.id
            )));
        }
        let tournament = state.tournament_mut(id)?;
        tournament.status = TournamentStatus::Active;
        tournament.simulation_step = 0;
        tournament.current_round = Round::FIRST;

        let entrants = groups
            .iter()
            .flat_map(|g| g.players.iter().map(move |p| (*p, g.number, PlayerStatus::Active)))
            .collect();
        state.entrants.insert(id, entrants);
        state.round_groups.retain(|(t, _), _| *t != id);
        Ok(())
    }

    async fn set_simulation_step(&self, id: TournamentId, step: u64) -> Result<(), StorageError> {
        self.state.write().await.tournament_mut(id)?.simulation_step = step;
        Ok(())
    }

    async fn set_current_round(&self, id: TournamentId, round: Round) -> Result<(), StorageError> {
        self.state.write().await.tournament_mut(id)?.current_round = round;
        Ok(())
    }

    async fn set_round_start_step(
        &self,
        id: TournamentId,
        round: Round,
        step: u64,
    ) -> Result<(), StorageError> {
        let mut state = self.state.write().await;
        state.tournament_mut(id)?.round_starts.set(round, step)?;
        Ok(())
    }

    async fn get_round_groups(
        &self,
        id: TournamentId,
        round: Round,
    ) -> Result<Vec<TeeGroup>, StorageError> {
        let state = self.state.read().await;
        if round <= Round::CUT {
            return Ok(state.opening_groups(id));
        }
        let saved = state
            .round_groups
            .get(&(id, round))
            .or_else(|| {
                (round == Round::FINAL)
                    .then(|| state.round_groups.get(&(id, Round::THIRD)))
                    .flatten()
            })
            .cloned()
            .unwrap_or_default();
        Ok(saved)
    }

    async fn save_round_groups(
        &self,
        id: TournamentId,
        round: Round,
        groups: &[TeeGroup],
    ) -> Result<(), StorageError> {
        if round <= Round::CUT {
            return Err(StorageError::new(
                "opening groups are fixed when the tournament starts",
            ));
        }
        self.state
            .write()
            .await
            .round_groups
            .insert((id, round), groups.to_vec());
        Ok(())
    }

    async fn save_final_round_groups(
        &self,
        id: TournamentId,
        groups: &[TeeGroup],
    ) -> Result<(), StorageError> {
        let mut state = self.state.write().await;
        state.tournament_mut(id)?.regrouped_final_round = true;
        state
            .round_groups
            .insert((id, Round::FINAL), groups.to_vec());
        Ok(())
    }

    async fn set_player_statuses(
        &self,
        id: TournamentId,
        players: &[PlayerId],
        status: PlayerStatus,
    ) -> Result<(), StorageError> {
        self.state.write().await.set_statuses(id, players, status);
        Ok(())
    }

    async fn upsert_live_score(&self, score: &LiveScore) -> Result<(), StorageError> {
        self.state.write().await.scores.insert(
            (score.tournament_id, score.player_id, score.round, score.hole),
            score.strokes,
        );
        Ok(())
    }

    async fn get_live_scores(&self, id: TournamentId) -> Result<Vec<LiveScore>, StorageError> {
        let state = self.state.read().await;
        Ok(state
            .scores
            .iter()
            .filter(|((t, ..), _)| *t == id)
            .map(|(&(tournament_id, player_id, round, hole), &strokes)| LiveScore {
                tournament_id,
                player_id,
                round,
                hole,
                strokes,
            })
            .collect())
    }

    async fn get_live_scores_for_hole(
        &self,
        id: TournamentId,
        round: Round,
        hole: u8,
    ) -> Result<Vec<LiveScore>, StorageError> {
        Ok(self
            .get_live_scores(id)
            .await?
            .into_iter()
            .filter(|s| s.round == round && s.hole == hole)
            .collect())
    }

    async fn count_players_finished_round(
        &self,
        id: TournamentId,
        round: Round,
        holes: u8,
    ) -> Result<usize, StorageError> {
        let state = self.state.read().await;
        let mut per_player: AHashMap<PlayerId, u32> = AHashMap::new();
        for (t, player, r, _) in state.scores.keys() {
            if *t == id && *r == round {
                *per_player.entry(*player).or_insert(0) += 1;
            }
        }
        Ok(per_player
            .values()
            .filter(|n| **n >= u32::from(holes))
            .count())
    }

    async fn commit_cut(&self, cut: &CutCommit) -> Result<bool, StorageError> {
        let mut state = self.state.write().await;
        if state.tournament_mut(cut.tournament_id)?.cut_applied {
            return Ok(false);
        }
        state.set_statuses(cut.tournament_id, &cut.missed_cut, PlayerStatus::Cut);
        state.set_statuses(cut.tournament_id, &cut.survivors, PlayerStatus::Active);
        for round in [Round::THIRD, Round::FINAL] {
            state
                .round_groups
                .insert((cut.tournament_id, round), cut.third_round_groups.clone());
        }
        state.tournament_mut(cut.tournament_id)?.cut_applied = true;
        Ok(true)
    }

    async fn complete_tournament(
        &self,
        id: TournamentId,
        results: &[FinalResult],
    ) -> Result<(), StorageError> {
        let mut state = self.state.write().await;
        state.tournament_mut(id)?.status = TournamentStatus::Completed;
        state.results.insert(id, results.to_vec());
        Ok(())
    }

    async fn set_tournament_status(
        &self,
        id: TournamentId,
        status: TournamentStatus,
    ) -> Result<(), StorageError> {
        self.state.write().await.tournament_mut(id)?.status = status;
        Ok(())
    }

    async fn get_final_results(&self, id: TournamentId) -> Result<Vec<FinalResult>, StorageError> {
        Ok(self
            .state
            .read()
            .await
            .results
            .get(&id)
            .cloned()
            .unwrap_or_default())
    }
}
