use super::{CutCommit, Storage, StorageError};
use crate::model::{
    Catalog, Course, CourseId, FinalResult, Hole, LiveScore, Player, PlayerId, PlayerStatus,
    PrefillCounts, Round, RoundStartSteps, SkillVector, TeeGroup, Tournament, TournamentId,
    TournamentPlayer, TournamentStatus,
};
use async_trait::async_trait;
use chrono::NaiveDate;
use rusqlite::{Connection, OptionalExtension, Row, Transaction, params};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{Arc, Mutex};

pub const SCHEMA: &[(&str, &str)] = &[
    ("player", include_str!("../sql/schema/sqlite/01_player.sql")),
    ("course", include_str!("../sql/schema/sqlite/02_course.sql")),
    ("tournament", include_str!("../sql/schema/sqlite/03_tournament.sql")),
    (
        "tournament_player",
        include_str!("../sql/schema/sqlite/04_tournament_player.sql"),
    ),
    ("live_score", include_str!("../sql/schema/sqlite/05_live_score.sql")),
    (
        "tournament_result",
        include_str!("../sql/schema/sqlite/06_tournament_result.sql"),
    ),
];

const DROP_ALL: &str = include_str!("../sql/schema/sqlite/00_table_drop.sql");

const TOURNAMENT_COLUMNS: &str = "tournament_id, name, course_id, start_date, status, \
     current_round, simulation_step, r2_start_step, r3_start_step, r4_start_step, \
     cut_applied, regrouped_final_round";

/// SQLite-backed store. One connection guarded by a mutex; every call runs on the
/// blocking pool and multi-statement writes run in a single transaction.
#[derive(Clone)]
pub struct SqliteStorage {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStorage {
    /// Opens (or creates) the database file and applies the schema.
    ///
    /// # Errors
    ///
    /// Will return `Err` if the file cannot be opened or the schema fails to apply.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let path = path.as_ref().to_path_buf();
        let conn = tokio::task::spawn_blocking(move || Connection::open(path)).await??;
        let storage = Self::from_connection(conn);
        storage.migrate().await?;
        Ok(storage)
    }

    /// # Errors
    ///
    /// Will return `Err` if the schema fails to apply.
    pub async fn open_in_memory() -> Result<Self, StorageError> {
        let conn = Connection::open_in_memory()?;
        let storage = Self::from_connection(conn);
        storage.migrate().await?;
        Ok(storage)
    }

    fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Arc::new(Mutex::new(conn)),
        }
    }

    async fn interact<F, T>(&self, f: F) -> Result<T, StorageError>
    where
        F: FnOnce(&mut Connection) -> Result<T, StorageError> + Send + 'static,
        T: Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let mut guard = conn
                .lock()
                .map_err(|_| StorageError::new("sqlite connection mutex poisoned"))?;
            f(&mut guard)
        })
        .await?
    }

    /// # Errors
    ///
    /// Will return `Err` if any DDL statement fails.
    pub async fn migrate(&self) -> Result<(), StorageError> {
        self.interact(|conn| {
            conn.execute_batch("PRAGMA foreign_keys = ON;")?;
            let tx = conn.transaction()?;
            for (_, ddl) in SCHEMA {
                tx.execute_batch(ddl)?;
            }
            tx.commit()?;
            Ok(())
        })
        .await
    }

    /// Drops every table and recreates the schema.
    ///
    /// # Errors
    ///
    /// Will return `Err` if any statement fails.
    pub async fn reset(&self) -> Result<(), StorageError> {
        self.execute_batch(DROP_ALL).await?;
        self.migrate().await
    }

    /// Runs arbitrary SQL, e.g. a startup script, inside one transaction.
    ///
    /// # Errors
    ///
    /// Will return `Err` if the script fails; nothing from it is kept.
    pub async fn execute_batch(&self, sql: &str) -> Result<(), StorageError> {
        let sql = sql.to_owned();
        self.interact(move |conn| {
            let tx = conn.transaction()?;
            tx.execute_batch(&sql)?;
            tx.commit()?;
            Ok(())
        })
        .await
    }

    /// # Errors
    ///
    /// Will return `Err` if the insert fails.
    pub async fn add_player(&self, player: Player) -> Result<(), StorageError> {
        self.interact(move |conn| {
            conn.execute(
                "INSERT INTO player (player_id, name, country, overall_skill, driving_skill, \
                 approach_skill, short_game_skill, putting_skill) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    player.id.0,
                    player.name,
                    player.country,
                    player.skills.overall,
                    player.skills.driving,
                    player.skills.approach,
                    player.skills.short_game,
                    player.skills.putting,
                ],
            )?;
            Ok(())
        })
        .await
    }

    /// # Errors
    ///
    /// Will return `Err` if the course is malformed or the insert fails.
    pub async fn add_course(&self, course: Course) -> Result<(), StorageError> {
        course.validate()?;
        self.interact(move |conn| {
            let tx = conn.transaction()?;
            tx.execute(
                "INSERT INTO course (course_id, name) VALUES (?1, ?2)",
                params![course.id.0, course.name],
            )?;
            for hole in &course.holes {
                tx.execute(
                    "INSERT INTO hole (course_id, hole_number, par, difficulty_modifier) \
                     VALUES (?1, ?2, ?3, ?4)",
                    params![course.id.0, hole.number, hole.par, hole.difficulty],
                )?;
            }
            tx.commit()?;
            Ok(())
        })
        .await
    }

    /// # Errors
    ///
    /// Will return `Err` if the insert fails.
    pub async fn add_tournament(&self, tournament: Tournament) -> Result<(), StorageError> {
        self.interact(move |conn| {
            conn.execute(
                "INSERT INTO tournament (tournament_id, name, course_id, start_date, status, \
                 current_round, simulation_step, cut_applied, regrouped_final_round) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                params![
                    tournament.id.0,
                    tournament.name,
                    tournament.course_id.0,
                    tournament.start_date.format("%Y-%m-%d").to_string(),
                    tournament.status.as_str(),
                    tournament.current_round.get(),
                    to_sql_step(tournament.simulation_step)?,
                    tournament.cut_applied,
                    tournament.regrouped_final_round,
                ],
            )?;
            Ok(())
        })
        .await
    }

    /// Loads a catalog of players, courses and pending tournaments in one transaction.
    /// Rows whose id already exists are left alone, so the same file can be fed in on
    /// every startup.
    ///
    /// # Errors
    ///
    /// Will return `Err` if the catalog is malformed or any insert fails; nothing is kept.
    pub async fn prefill(&self, catalog: Catalog) -> Result<PrefillCounts, StorageError> {
        catalog.validate()?;
        self.interact(move |conn| {
            let tx = conn.transaction()?;
            let mut counts = PrefillCounts::default();
            for player in &catalog.players {
                counts.players += tx.execute(
                    "INSERT OR IGNORE INTO player (player_id, name, country, overall_skill, \
                     driving_skill, approach_skill, short_game_skill, putting_skill) \
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                    params![
                        player.id.0,
                        player.name,
                        player.country,
                        player.skills.overall,
                        player.skills.driving,
                        player.skills.approach,
                        player.skills.short_game,
                        player.skills.putting,
                    ],
                )?;
            }
            for course in &catalog.courses {
                let inserted = tx.execute(
                    "INSERT OR IGNORE INTO course (course_id, name) VALUES (?1, ?2)",
                    params![course.id.0, course.name],
                )?;
                if inserted == 0 {
                    continue;
                }
                counts.courses += 1;
                for hole in &course.holes {
                    tx.execute(
                        "INSERT INTO hole (course_id, hole_number, par, difficulty_modifier) \
                         VALUES (?1, ?2, ?3, ?4)",
                        params![course.id.0, hole.number, hole.par, hole.difficulty],
                    )?;
                }
            }
            for entry in &catalog.tournaments {
                counts.tournaments += tx.execute(
                    "INSERT OR IGNORE INTO tournament (tournament_id, name, course_id, \
                     start_date, status, current_round, simulation_step, cut_applied, \
                     regrouped_final_round) \
                     VALUES (?1, ?2, ?3, ?4, 'pending', 1, 0, 0, 0)",
                    params![
                        entry.id.0,
                        entry.name,
                        entry.course_id.0,
                        entry.start_date.format("%Y-%m-%d").to_string(),
                    ],
                )?;
            }
            tx.commit()?;
            Ok(counts)
        })
        .await
    }
}

fn to_sql_step(step: u64) -> Result<i64, StorageError> {
    i64::try_from(step).map_err(|_| StorageError::new(format!("step {step} overflows i64")))
}

fn from_sql_step(step: i64) -> Result<u64, StorageError> {
    u64::try_from(step).map_err(|_| StorageError::new(format!("negative step {step} in storage")))
}

fn round_from_sql(n: i64) -> Result<Round, StorageError> {
    u8::try_from(n)
        .ok()
        .and_then(Round::new)
        .ok_or_else(|| StorageError::new(format!("round {n} in storage is out of range")))
}

struct TournamentRow {
    id: i64,
    name: String,
    course_id: i64,
    start_date: String,
    status: String,
    current_round: i64,
    simulation_step: i64,
    round_starts: [i64; 3],
    cut_applied: bool,
    regrouped_final_round: bool,
}

impl TournamentRow {
    fn read(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("tournament_id")?,
            name: row.get("name")?,
            course_id: row.get("course_id")?,
            start_date: row.get("start_date")?,
            status: row.get("status")?,
            current_round: row.get("current_round")?,
            simulation_step: row.get("simulation_step")?,
            round_starts: [
                row.get("r2_start_step")?,
                row.get("r3_start_step")?,
                row.get("r4_start_step")?,
            ],
            cut_applied: row.get("cut_applied")?,
            regrouped_final_round: row.get("regrouped_final_round")?,
        })
    }
}

impl TryFrom<TournamentRow> for Tournament {
    type Error = StorageError;

    fn try_from(row: TournamentRow) -> Result<Self, Self::Error> {
        let start_date = NaiveDate::parse_from_str(&row.start_date, "%Y-%m-%d").map_err(|e| {
            StorageError::new(format!("bad start_date '{}': {e}", row.start_date))
        })?;
        let status = TournamentStatus::parse(&row.status)
            .ok_or_else(|| StorageError::new(format!("unknown status '{}'", row.status)))?;
        let [r2, r3, r4] = row.round_starts;
        Ok(Self {
            id: TournamentId(row.id),
            name: row.name,
            course_id: CourseId(row.course_id),
            start_date,
            status,
            current_round: round_from_sql(row.current_round)?,
            simulation_step: from_sql_step(row.simulation_step)?,
            round_starts: RoundStartSteps::new(
                from_sql_step(r2)?,
                from_sql_step(r3)?,
                from_sql_step(r4)?,
            ),
            cut_applied: row.cut_applied,
            regrouped_final_round: row.regrouped_final_round,
        })
    }
}

fn query_tournament(
    conn: &Connection,
    filter: &str,
    params: impl rusqlite::Params,
) -> Result<Option<Tournament>, StorageError> {
    let sql = format!("SELECT {TOURNAMENT_COLUMNS} FROM tournament {filter} LIMIT 1");
    conn.query_row(&sql, params, TournamentRow::read)
        .optional()?
        .map(Tournament::try_from)
        .transpose()
}

fn read_player(row: &Row<'_>) -> rusqlite::Result<Player> {
    Ok(Player {
        id: PlayerId(row.get("player_id")?),
        name: row.get("name")?,
        country: row.get("country")?,
        skills: SkillVector {
            overall: row.get("overall_skill")?,
            driving: row.get("driving_skill")?,
            approach: row.get("approach_skill")?,
            short_game: row.get("short_game_skill")?,
            putting: row.get("putting_skill")?,
        },
    })
}

fn collect_groups(rows: Vec<(u32, i64)>) -> Vec<TeeGroup> {
    let mut by_group: BTreeMap<u32, Vec<PlayerId>> = BTreeMap::new();
    for (group, player) in rows {
        by_group.entry(group).or_default().push(PlayerId(player));
    }
    by_group
        .into_iter()
        .map(|(number, players)| TeeGroup { number, players })
        .collect()
}

fn write_round_groups(
    tx: &Transaction<'_>,
    id: TournamentId,
    round: Round,
    groups: &[TeeGroup],
) -> Result<(), StorageError> {
    tx.execute(
        "DELETE FROM round_group WHERE tournament_id = ?1 AND round_num = ?2",
        params![id.0, round.get()],
    )?;
    let mut stmt = tx.prepare(
        "INSERT INTO round_group (tournament_id, round_num, group_num, player_id) \
         VALUES (?1, ?2, ?3, ?4)",
    )?;
    for group in groups {
        for player in &group.players {
            stmt.execute(params![id.0, round.get(), group.number, player.0])?;
        }
    }
    Ok(())
}

fn write_statuses(
    tx: &Transaction<'_>,
    id: TournamentId,
    players: &[PlayerId],
    status: PlayerStatus,
) -> Result<(), StorageError> {
    let mut stmt = tx.prepare(
        "UPDATE tournament_player SET status = ?1 WHERE tournament_id = ?2 AND player_id = ?3",
    )?;
    for player in players {
        stmt.execute(params![status.as_str(), id.0, player.0])?;
    }
    Ok(())
}

fn read_live_score(row: &Row<'_>) -> rusqlite::Result<(i64, i64, i64, u8, i32)> {
    Ok((
        row.get("tournament_id")?,
        row.get("player_id")?,
        row.get("round_num")?,
        row.get("hole_number")?,
        row.get("strokes")?,
    ))
}

fn to_live_scores(rows: Vec<(i64, i64, i64, u8, i32)>) -> Result<Vec<LiveScore>, StorageError> {
    rows.into_iter()
        .map(|(t, p, r, hole, strokes)| {
            Ok(LiveScore {
                tournament_id: TournamentId(t),
                player_id: PlayerId(p),
                round: round_from_sql(r)?,
                hole,
                strokes,
            })
        })
        .collect()
}

#[async_trait]
impl Storage for SqliteStorage {
    async fn get_tournament(&self, id: TournamentId) -> Result<Option<Tournament>, StorageError> {
        self.interact(move |conn| query_tournament(conn, "WHERE tournament_id = ?1", [id.0]))
            .await
    }

    async fn get_active_tournament(&self) -> Result<Option<Tournament>, StorageError> {
        self.interact(|conn| query_tournament(conn, "WHERE status = 'active'", []))
            .await
    }

    async fn next_pending_tournament(&self) -> Result<Option<Tournament>, StorageError> {
        self.interact(|conn| {
            query_tournament(
                conn,
                "WHERE status = 'pending' ORDER BY start_date, tournament_id",
                [],
            )
        })
        .await
    }

    async fn get_course(&self, id: CourseId) -> Result<Option<Course>, StorageError> {
        self.interact(move |conn| {
            let name: Option<String> = conn
                .query_row(
                    "SELECT name FROM course WHERE course_id = ?1",
                    [id.0],
                    |row| row.get(0),
                )
                .optional()?;
            let Some(name) = name else {
                return Ok(None);
            };
            let mut stmt = conn.prepare(
                "SELECT hole_number, par, difficulty_modifier FROM hole \
                 WHERE course_id = ?1 ORDER BY hole_number",
            )?;
            let holes = stmt
                .query_map([id.0], |row| {
                    Ok(Hole {
                        number: row.get(0)?,
                        par: row.get(1)?,
                        difficulty: row.get(2)?,
                    })
                })?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Some(Course { id, name, holes }))
        })
        .await
    }

    async fn get_players_ranked(&self) -> Result<Vec<Player>, StorageError> {
        self.interact(|conn| {
            let mut stmt =
                conn.prepare("SELECT * FROM player ORDER BY overall_skill DESC, player_id")?;
            let players = stmt
                .query_map([], read_player)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(players)
        })
        .await
    }

    async fn get_tournament_players(
        &self,
        id: TournamentId,
    ) -> Result<Vec<TournamentPlayer>, StorageError> {
        self.interact(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT p.*, tp.tee_group, tp.status AS entry_status \
                 FROM tournament_player tp JOIN player p ON p.player_id = tp.player_id \
                 WHERE tp.tournament_id = ?1 ORDER BY tp.tee_group, tp.rowid",
            )?;
            let rows = stmt
                .query_map([id.0], |row| {
                    Ok((
                        read_player(row)?,
                        row.get::<_, u32>("tee_group")?,
                        row.get::<_, String>("entry_status")?,
                    ))
                })?
                .collect::<Result<Vec<_>, _>>()?;
            rows.into_iter()
                .map(|(player, initial_group, status)| {
                    let status = PlayerStatus::parse(&status).ok_or_else(|| {
                        StorageError::new(format!("unknown player status '{status}'"))
                    })?;
                    Ok(TournamentPlayer {
                        player,
                        initial_group,
                        status,
                    })
                })
                .collect()
        })
        .await
    }

    async fn activate_tournament(
        &self,
        id: TournamentId,
        groups: &[TeeGroup],
    ) -> Result<(), StorageError> {
        let groups = groups.to_vec();
        self.interact(move |conn| {
            let tx = conn.transaction()?;
            let active: Option<i64> = tx
                .query_row(
                    "SELECT tournament_id FROM tournament \
                     WHERE status = 'active' AND tournament_id <> ?1",
                    [id.0],
                    |row| row.get(0),
                )
                .optional()?;
            if let Some(active) = active {
                return Err(StorageError::new(format!(
                    "tournament {active} is already active"
                )));
            }
            let updated = tx.execute(
                "UPDATE tournament SET status = 'active', simulation_step = 0, current_round = 1 \
                 WHERE tournament_id = ?1",
                [id.0],
            )?;
            if updated == 0 {
                return Err(StorageError::new(format!("tournament {id} not found")));
            }
            tx.execute(
                "DELETE FROM tournament_player WHERE tournament_id = ?1",
                [id.0],
            )?;
            tx.execute("DELETE FROM round_group WHERE tournament_id = ?1", [id.0])?;
            {
                let mut stmt = tx.prepare(
                    "INSERT INTO tournament_player (tournament_id, player_id, tee_group, status) \
                     VALUES (?1, ?2, ?3, 'active')",
                )?;
                for group in &groups {
                    for player in &group.players {
                        stmt.execute(params![id.0, player.0, group.number])?;
                    }
                }
            }
            tx.commit()?;
            Ok(())
        })
        .await
    }

    async fn set_simulation_step(&self, id: TournamentId, step: u64) -> Result<(), StorageError> {
        let step = to_sql_step(step)?;
        self.interact(move |conn| {
            conn.execute(
                "UPDATE tournament SET simulation_step = ?1 WHERE tournament_id = ?2",
                params![step, id.0],
            )?;
            Ok(())
        })
        .await
    }

    async fn set_current_round(&self, id: TournamentId, round: Round) -> Result<(), StorageError> {
        self.interact(move |conn| {
            conn.execute(
                "UPDATE tournament SET current_round = ?1 WHERE tournament_id = ?2",
                params![round.get(), id.0],
            )?;
            Ok(())
        })
        .await
    }

    async fn set_round_start_step(
        &self,
        id: TournamentId,
        round: Round,
        step: u64,
    ) -> Result<(), StorageError> {
        // Closed set of columns; round 1 has none.
        let column = match round.get() {
            2 => "r2_start_step",
            3 => "r3_start_step",
            4 => "r4_start_step",
            _ => return Err(StorageError::new("round 1 always starts at step 0")),
        };
        let step = to_sql_step(step)?;
        self.interact(move |conn| {
            conn.execute(
                &format!("UPDATE tournament SET {column} = ?1 WHERE tournament_id = ?2"),
                params![step, id.0],
            )?;
            Ok(())
        })
        .await
    }

    async fn get_round_groups(
        &self,
        id: TournamentId,
        round: Round,
    ) -> Result<Vec<TeeGroup>, StorageError> {
        self.interact(move |conn| {
            if round <= Round::CUT {
                let mut stmt = conn.prepare(
                    "SELECT tee_group, player_id FROM tournament_player \
                     WHERE tournament_id = ?1 ORDER BY tee_group, rowid",
                )?;
                let rows = stmt
                    .query_map([id.0], |row| Ok((row.get(0)?, row.get(1)?)))?
                    .collect::<Result<Vec<_>, _>>()?;
                return Ok(collect_groups(rows));
            }
            let mut stmt = conn.prepare(
                "SELECT group_num, player_id FROM round_group \
                 WHERE tournament_id = ?1 AND round_num = ?2 ORDER BY group_num, rowid",
            )?;
            let mut rows = stmt
                .query_map(params![id.0, round.get()], |row| Ok((row.get(0)?, row.get(1)?)))?
                .collect::<Result<Vec<_>, _>>()?;
            if rows.is_empty() && round == Round::FINAL {
                rows = stmt
                    .query_map(params![id.0, Round::THIRD.get()], |row| {
                        Ok((row.get(0)?, row.get(1)?))
                    })?
                    .collect::<Result<Vec<_>, _>>()?;
            }
            Ok(collect_groups(rows))
        })
        .await
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
        let groups = groups.to_vec();
        self.interact(move |conn| {
            let tx = conn.transaction()?;
            write_round_groups(&tx, id, round, &groups)?;
            tx.commit()?;
            Ok(())
        })
        .await
    }

    async fn save_final_round_groups(
        &self,
        id: TournamentId,
        groups: &[TeeGroup],
    ) -> Result<(), StorageError> {
        let groups = groups.to_vec();
        self.interact(move |conn| {
            let tx = conn.transaction()?;
            write_round_groups(&tx, id, Round::FINAL, &groups)?;
            tx.execute(
                "UPDATE tournament SET regrouped_final_round = 1 WHERE tournament_id = ?1",
                [id.0],
            )?;
            tx.commit()?;
            Ok(())
        })
        .await
    }

    async fn set_player_statuses(
        &self,
        id: TournamentId,
        players: &[PlayerId],
        status: PlayerStatus,
    ) -> Result<(), StorageError> {
        let players = players.to_vec();
        self.interact(move |conn| {
            let tx = conn.transaction()?;
            write_statuses(&tx, id, &players, status)?;
            tx.commit()?;
            Ok(())
        })
        .await
    }

    async fn upsert_live_score(&self, score: &LiveScore) -> Result<(), StorageError> {
        let score = *score;
        self.interact(move |conn| {
            conn.execute(
                "INSERT INTO live_score (tournament_id, player_id, round_num, hole_number, strokes) \
                 VALUES (?1, ?2, ?3, ?4, ?5) \
                 ON CONFLICT (tournament_id, player_id, round_num, hole_number) \
                 DO UPDATE SET strokes = excluded.strokes",
                params![
                    score.tournament_id.0,
                    score.player_id.0,
                    score.round.get(),
                    score.hole,
                    score.strokes,
                ],
            )?;
            Ok(())
        })
        .await
    }

    async fn get_live_scores(&self, id: TournamentId) -> Result<Vec<LiveScore>, StorageError> {
        self.interact(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT tournament_id, player_id, round_num, hole_number, strokes FROM live_score \
                 WHERE tournament_id = ?1 ORDER BY player_id, round_num, hole_number",
            )?;
            let rows = stmt
                .query_map([id.0], read_live_score)?
                .collect::<Result<Vec<_>, _>>()?;
            to_live_scores(rows)
        })
        .await
    }

    async fn get_live_scores_for_hole(
        &self,
        id: TournamentId,
        round: Round,
        hole: u8,
    ) -> Result<Vec<LiveScore>, StorageError> {
        self.interact(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT tournament_id, player_id, round_num, hole_number, strokes FROM live_score \
                 WHERE tournament_id = ?1 AND round_num = ?2 AND hole_number = ?3 \
                 ORDER BY player_id",
            )?;
            let rows = stmt
                .query_map(params![id.0, round.get(), hole], read_live_score)?
                .collect::<Result<Vec<_>, _>>()?;
            to_live_scores(rows)
        })
        .await
    }

    async fn count_players_finished_round(
        &self,
        id: TournamentId,
        round: Round,
        holes: u8,
    ) -> Result<usize, StorageError> {
        self.interact(move |conn| {
            let count: i64 = conn.query_row(
                "SELECT COUNT(*) FROM ( \
                     SELECT player_id FROM live_score \
                     WHERE tournament_id = ?1 AND round_num = ?2 \
                     GROUP BY player_id HAVING COUNT(hole_number) >= ?3)",
                params![id.0, round.get(), holes],
                |row| row.get(0),
            )?;
            usize::try_from(count).map_err(|_| StorageError::new("negative count"))
        })
        .await
    }

    async fn commit_cut(&self, cut: &CutCommit) -> Result<bool, StorageError> {
        let cut = cut.clone();
        self.interact(move |conn| {
            let tx = conn.transaction()?;
            let applied: Option<bool> = tx
                .query_row(
                    "SELECT cut_applied FROM tournament WHERE tournament_id = ?1",
                    [cut.tournament_id.0],
                    |row| row.get(0),
                )
                .optional()?;
            match applied {
                None => {
                    return Err(StorageError::new(format!(
                        "tournament {} not found",
                        cut.tournament_id
                    )));
                }
                Some(true) => return Ok(false),
                Some(false) => {}
            }
            write_statuses(&tx, cut.tournament_id, &cut.missed_cut, PlayerStatus::Cut)?;
            write_statuses(&tx, cut.tournament_id, &cut.survivors, PlayerStatus::Active)?;
            for round in [Round::THIRD, Round::FINAL] {
                write_round_groups(&tx, cut.tournament_id, round, &cut.third_round_groups)?;
            }
            tx.execute(
                "UPDATE tournament SET cut_applied = 1 WHERE tournament_id = ?1",
                [cut.tournament_id.0],
            )?;
            tx.commit()?;
            Ok(true)
        })
        .await
    }

    async fn complete_tournament(
        &self,
        id: TournamentId,
        results: &[FinalResult],
    ) -> Result<(), StorageError> {
        let results = results.to_vec();
        self.interact(move |conn| {
            let tx = conn.transaction()?;
            tx.execute(
                "UPDATE tournament SET status = 'completed' WHERE tournament_id = ?1",
                [id.0],
            )?;
            tx.execute(
                "DELETE FROM tournament_result WHERE tournament_id = ?1",
                [id.0],
            )?;
            {
                let mut stmt = tx.prepare(
                    "INSERT INTO tournament_result (tournament_id, player_id, total_strokes, \
                     score_to_par, position, r1_strokes, r2_strokes, r3_strokes, r4_strokes) \
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                )?;
                for r in &results {
                    let [r1, r2, r3, r4] = r.round_strokes;
                    stmt.execute(params![
                        id.0,
                        r.player_id.0,
                        r.total_strokes,
                        r.score_to_par,
                        r.position,
                        r1,
                        r2,
                        r3,
                        r4,
                    ])?;
                }
            }
            tx.commit()?;
            Ok(())
        })
        .await
    }

    async fn set_tournament_status(
        &self,
        id: TournamentId,
        status: TournamentStatus,
    ) -> Result<(), StorageError> {
        self.interact(move |conn| {
            conn.execute(
                "UPDATE tournament SET status = ?1 WHERE tournament_id = ?2",
                params![status.as_str(), id.0],
            )?;
            Ok(())
        })
        .await
    }

    async fn get_final_results(&self, id: TournamentId) -> Result<Vec<FinalResult>, StorageError> {
        self.interact(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT player_id, total_strokes, score_to_par, position, \
                 r1_strokes, r2_strokes, r3_strokes, r4_strokes FROM tournament_result \
                 WHERE tournament_id = ?1 \
                 ORDER BY position IS NULL, position, score_to_par, player_id",
            )?;
            let results = stmt
                .query_map([id.0], |row| {
                    Ok(FinalResult {
                        tournament_id: id,
                        player_id: PlayerId(row.get(0)?),
                        total_strokes: row.get(1)?,
                        score_to_par: row.get(2)?,
                        position: row.get(3)?,
                        round_strokes: [row.get(4)?, row.get(5)?, row.get(6)?, row.get(7)?],
                    })
                })?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(results)
        })
        .await
    }
}
