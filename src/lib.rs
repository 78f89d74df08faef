pub mod args;
pub mod error;
pub mod model;
pub mod sim;
pub mod storage;

pub use error::EngineError;
pub use sim::{CutOutcome, Engine, EngineConfig, StepOutcome};
pub use storage::{MemoryStorage, SqliteStorage, Storage, StorageError};
