use crate::model::{
    Course, CourseId, FinalResult, LiveScore, Player, PlayerId, PlayerStatus, Round, TeeGroup,
    Tournament, TournamentId, TournamentPlayer, TournamentStatus,
};
use async_trait::async_trait;
use std::error::Error;
use std::fmt;

pub mod memory;
pub mod sqlite;

pub use memory::MemoryStorage;
pub use sqlite::SqliteStorage;

#[derive(Debug, Clone)]
pub struct StorageError {
    message: String,
}

impl StorageError {
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl Error for StorageError {}

impl From<String> for StorageError {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl From<&str> for StorageError {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<rusqlite::Error> for StorageError {
    fn from(value: rusqlite::Error) -> Self {
        Self::new(format!("sqlite: {value}"))
    }
}

impl From<tokio::task::JoinError> for StorageError {
    fn from(value: tokio::task::JoinError) -> Self {
        Self::new(format!("blocking task failed: {value}"))
    }
}

/// Everything the cut-and-regroup transition writes. Applied in one transaction by
/// [`Storage::commit_cut`].
#[derive(Debug, Clone, PartialEq)]
pub struct CutCommit {
    pub tournament_id: TournamentId,
    pub survivors: Vec<PlayerId>,
    pub missed_cut: Vec<PlayerId>,
    pub third_round_groups: Vec<TeeGroup>,
}

/// Persistence collaborator for the simulation engine.
#[async_trait]
pub trait Storage: Send + Sync {
    async fn get_tournament(&self, id: TournamentId) -> Result<Option<Tournament>, StorageError>;

    async fn get_active_tournament(&self) -> Result<Option<Tournament>, StorageError>;

    /// Earliest pending tournament by start date, then id.
    async fn next_pending_tournament(&self) -> Result<Option<Tournament>, StorageError>;

    async fn get_course(&self, id: CourseId) -> Result<Option<Course>, StorageError>;

    /// Every player, best overall skill first.
    async fn get_players_ranked(&self) -> Result<Vec<Player>, StorageError>;

    async fn get_tournament_players(
        &self,
        id: TournamentId,
    ) -> Result<Vec<TournamentPlayer>, StorageError>;

    /// Marks the tournament active at step 0 of round 1 and records the opening groups.
    /// Fails without writing when another tournament is already active.
    async fn activate_tournament(
        &self,
        id: TournamentId,
        groups: &[TeeGroup],
    ) -> Result<(), StorageError>;

    async fn set_simulation_step(&self, id: TournamentId, step: u64) -> Result<(), StorageError>;

    async fn set_current_round(&self, id: TournamentId, round: Round) -> Result<(), StorageError>;

    async fn set_round_start_step(
        &self,
        id: TournamentId,
        round: Round,
        step: u64,
    ) -> Result<(), StorageError>;

    /// Groups for a round. Rounds 1 and 2 come from the opening groups; an unsaved
    /// round 4 falls back to round 3.
    async fn get_round_groups(
        &self,
        id: TournamentId,
        round: Round,
    ) -> Result<Vec<TeeGroup>, StorageError>;

    async fn save_round_groups(
        &self,
        id: TournamentId,
        round: Round,
        groups: &[TeeGroup],
    ) -> Result<(), StorageError>;

    /// Replaces round-4 groups and flags the tournament as regrouped.
    async fn save_final_round_groups(
        &self,
        id: TournamentId,
        groups: &[TeeGroup],
    ) -> Result<(), StorageError>;

    async fn set_player_statuses(
        &self,
        id: TournamentId,
        players: &[PlayerId],
        status: PlayerStatus,
    ) -> Result<(), StorageError>;

    /// Insert or replace the score for `(tournament, player, round, hole)`.
    async fn upsert_live_score(&self, score: &LiveScore) -> Result<(), StorageError>;

    async fn get_live_scores(&self, id: TournamentId) -> Result<Vec<LiveScore>, StorageError>;

    async fn get_live_scores_for_hole(
        &self,
        id: TournamentId,
        round: Round,
        hole: u8,
    ) -> Result<Vec<LiveScore>, StorageError>;

    /// Players with at least `holes` scores recorded in `round`.
    async fn count_players_finished_round(
        &self,
        id: TournamentId,
        round: Round,
        holes: u8,
    ) -> Result<usize, StorageError>;

    /// Applies statuses, round 3 and 4 groups and the cut flag atomically.
    /// Returns `false` and writes nothing when the cut was already applied.
    async fn commit_cut(&self, cut: &CutCommit) -> Result<bool, StorageError>;

    /// Marks the tournament completed and stores the final snapshot atomically.
    async fn complete_tournament(
        &self,
        id: TournamentId,
        results: &[FinalResult],
    ) -> Result<(), StorageError>;

    async fn set_tournament_status(
        &self,
        id: TournamentId,
        status: TournamentStatus,
    ) -> Result<(), StorageError>;

    async fn get_final_results(&self, id: TournamentId) -> Result<Vec<FinalResult>, StorageError>;
}
