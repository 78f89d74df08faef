use crate::model::{Round, TournamentId, TournamentStatus};
use crate::storage::StorageError;
use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum EngineError {
    #[error("db error: {0}")]
    Storage(#[from] StorageError),
    #[error("tournament {0} not found")]
    NotFound(TournamentId),
    #[error("tournament {id} is {status}, not pending")]
    NotPending {
        id: TournamentId,
        status: TournamentStatus,
    },
    #[error("tournament {0} is already active")]
    AlreadyActive(TournamentId),
    #[error("tournament {requested} is not next in sequence; {next} starts first")]
    NotNextPending {
        requested: TournamentId,
        next: TournamentId,
    },
    #[error("no players available to enter")]
    NoPlayers,
    #[error("invalid course: {0}")]
    InvalidCourse(String),
    #[error("{round} of tournament {id} is still in progress")]
    RoundInProgress { id: TournamentId, round: Round },
    #[error("cut for tournament {0} has not been applied")]
    CutPending(TournamentId),
    #[error("not allowed during {0}")]
    InvalidRound(Round),
}
