use clap::Parser;
use fairway_sim::args::validation::{check_readable_file, check_readable_file_and_json};
use fairway_sim::args::{Args, CleanArgs};
use fairway_sim::model::{Catalog, TournamentId};
use fairway_sim::{EngineConfig, MemoryStorage, Storage};

const CATALOG: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/test7_catalog.json");
const PLAYER_DDL: &str = concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/src/sql/schema/sqlite/01_player.sql"
);
const COURSE_DDL: &str = concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/src/sql/schema/sqlite/02_course.sql"
);

#[test]
fn test_defaults_match_engine_defaults() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::try_parse_from(["fairway-sim", "--db-name", "golf.db"])?;
    args.validate()?;
    assert_eq!(args.tick_ms, 1000);
    assert!(!args.auto_advance);
    let clean = CleanArgs::new(args);
    assert_eq!(clean.engine_config(), EngineConfig::default());
    assert!(clean.combined_sql_script.is_empty());
    Ok(())
}

#[test]
fn test_reset_flag_carries_through() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::try_parse_from(["fairway-sim", "--db-name", "golf.db"])?;
    assert!(!CleanArgs::new(args).db_reset);
    let args = Args::try_parse_from(["fairway-sim", "--db-name", "golf.db", "--db-reset"])?;
    assert!(CleanArgs::new(args).db_reset);
    Ok(())
}

#[test]
fn test_zero_values_are_rejected() -> Result<(), Box<dyn std::error::Error>> {
    for flag in ["--tick-ms", "--cut-size", "--initial-group-size", "--weekend-group-size"] {
        let args = Args::try_parse_from(["fairway-sim", "--db-name", "golf.db", flag, "0"])?;
        assert!(args.validate().is_err(), "{flag} 0 should be rejected");
    }
    Ok(())
}

#[test]
fn test_startup_scripts_are_combined() -> Result<(), Box<dyn std::error::Error>> {
    let scripts = format!("{PLAYER_DDL};{COURSE_DDL}");
    let args = Args::try_parse_from([
        "fairway-sim",
        "--db-name",
        "golf.db",
        "--db-startup-script",
        scripts.as_str(),
        "--auto-advance",
        "--cut-size",
        "50",
    ])?;
    let clean = CleanArgs::new(args);
    assert!(clean.combined_sql_script.contains("CREATE TABLE IF NOT EXISTS player"));
    assert!(clean.combined_sql_script.contains("CREATE TABLE IF NOT EXISTS hole"));
    let config = clean.engine_config();
    assert_eq!(config.cut_size, 50);
    assert!(config.auto_advance);
    Ok(())
}

#[test]
fn test_unreadable_script_is_refused() {
    assert!(check_readable_file(PLAYER_DDL).is_ok());
    let missing = format!("{PLAYER_DDL};/definitely/not/here.sql");
    assert!(check_readable_file(&missing).is_err());
    assert!(
        Args::try_parse_from([
            "fairway-sim",
            "--db-name",
            "golf.db",
            "--db-startup-script",
            "/definitely/not/here.sql",
        ])
        .is_err()
    );
}

#[test]
fn test_catalog_file_parses_and_validates() -> Result<(), Box<dyn std::error::Error>> {
    let catalog = check_readable_file_and_json(CATALOG)?;
    assert_eq!(catalog.players.len(), 4);
    assert_eq!(catalog.courses[0].par(), 72);
    assert_eq!(catalog.tournaments.len(), 2);

    let args = Args::try_parse_from(["fairway-sim", "-n", "golf.db", "--db-populate-json", CATALOG])?;
    assert_eq!(args.db_populate_json, Some(catalog));

    assert!(check_readable_file_and_json(PLAYER_DDL).is_err());
    Ok(())
}

#[test]
fn test_catalog_rejects_duplicates() -> Result<(), Box<dyn std::error::Error>> {
    let mut catalog: Catalog = serde_json::from_str(&std::fs::read_to_string(CATALOG)?)?;
    catalog.players.push(catalog.players[0].clone());
    assert!(catalog.validate().is_err());
    Ok(())
}

#[tokio::test]
async fn test_memory_prefill_loads_catalog() -> Result<(), Box<dyn std::error::Error>> {
    let catalog = check_readable_file_and_json(CATALOG)?;
    let storage = MemoryStorage::new();
    let counts = storage.prefill(catalog.clone()).await?;
    assert_eq!((counts.players, counts.courses, counts.tournaments), (4, 1, 2));
    assert_eq!(storage.prefill(catalog).await?.players, 0);

    let ranked: Vec<i64> = storage
        .get_players_ranked()
        .await?
        .iter()
        .map(|p| p.id.0)
        .collect();
    assert_eq!(ranked, vec![1, 2, 3, 4]);
    let next = storage.next_pending_tournament().await?.ok_or("none pending")?;
    assert_eq!(next.id, TournamentId(1));
    Ok(())
}
