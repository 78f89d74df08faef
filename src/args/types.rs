use crate::model::Catalog;
use clap::Parser;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Sqlite database file. Created and migrated if it does not exist.
    #[arg(short = 'n', long, value_name = "DATABASE_NAME")]
    pub db_name: String,
    /// Drop every table and recreate the schema before anything else runs.
    #[arg(long)]
    pub db_reset: bool,
    /// If specified, this sql is run on program startup. Separate several files with ';'.
    #[arg(long, value_name = "DATABASE_STARTUP_SCRIPT", value_parser = crate::args::validation::check_readable_file)]
    pub db_startup_script: Option<String>,
    /// Players, courses and tournaments to load on startup. Existing ids are skipped.
    #[arg(
        long,
        value_name = "CATALOG_JSON",
        value_parser = crate::args::validation::check_readable_file_and_json
    )]
    pub db_populate_json: Option<Catalog>,
    /// Milliseconds between simulation steps.
    #[arg(short = 't', long, value_name = "MILLISECONDS", default_value_t = 1000)]
    pub tick_ms: u64,
    /// Seed for the scoring RNG. Entropy is used when omitted.
    #[arg(long, value_name = "SEED")]
    pub seed: Option<u64>,
    /// Start this pending tournament before ticking.
    #[arg(short = 's', long, value_name = "TOURNAMENT_ID")]
    pub start: Option<i64>,
    /// Move to the next round as soon as every player has finished the current one.
    #[arg(short = 'a', long)]
    pub auto_advance: bool,
    #[arg(long, value_name = "PLAYERS", default_value_t = 65)]
    pub cut_size: usize,
    #[arg(long, value_name = "PLAYERS", default_value_t = 3)]
    pub initial_group_size: usize,
    #[arg(long, value_name = "PLAYERS", default_value_t = 2)]
    pub weekend_group_size: usize,
    /// Stop once no tournament is active instead of waiting for one to start.
    #[arg(long)]
    pub exit_when_idle: bool,
}

#[derive(Debug, Clone)]
pub struct CleanArgs {
    pub db_name: String,
    pub db_reset: bool,
    pub db_startup_script: Option<String>,
    pub db_populate_json: Option<Catalog>,
    pub combined_sql_script: String,
    pub tick_ms: u64,
    pub seed: Option<u64>,
    pub start: Option<i64>,
    pub auto_advance: bool,
    pub cut_size: usize,
    pub initial_group_size: usize,
    pub weekend_group_size: usize,
    pub exit_when_idle: bool,
}
