use crate::sim::EngineConfig;
use clap::Parser;
use std::fs;
use tracing::warn;

pub mod types;
pub mod validate;
pub mod validation;

pub use types::{Args, CleanArgs};

/// # Errors
///
/// Will return `Err` if the arguments are invalid
pub fn args_checks() -> Result<CleanArgs, String> {
    let args = Args::parse();
    args.validate()?;
    Ok(CleanArgs::new(args))
}

impl CleanArgs {
    #[must_use]
    pub fn new(args: Args) -> Self {
        let mut combined_sql_script = String::new();
        if let Some(db_startup_script) = &args.db_startup_script {
            for file in db_startup_script.split(';') {
                let file = file.trim();
                if file.is_empty() {
                    continue;
                }

                match fs::read_to_string(file) {
                    Ok(script) => {
                        combined_sql_script.push_str(&script);
                        combined_sql_script.push('\n');
                    }
                    Err(e) => {
                        warn!("Failed to read SQL startup script '{file}': {e}");
                    }
                }
            }
        }
        CleanArgs {
            db_name: args.db_name,
            db_reset: args.db_reset,
            db_startup_script: args.db_startup_script,
            db_populate_json: args.db_populate_json,
            combined_sql_script,
            tick_ms: args.tick_ms,
            seed: args.seed,
            start: args.start,
            auto_advance: args.auto_advance,
            cut_size: args.cut_size,
            initial_group_size: args.initial_group_size,
            weekend_group_size: args.weekend_group_size,
            exit_when_idle: args.exit_when_idle,
        }
    }

    #[must_use]
    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            cut_size: self.cut_size,
            initial_group_size: self.initial_group_size,
            weekend_group_size: self.weekend_group_size,
            auto_advance: self.auto_advance,
        }
    }
}
