#![allow(dead_code)]

use chrono::NaiveDate;
use fairway_sim::model::{
    Course, CourseId, Hole, LiveScore, Player, PlayerId, PlayerStatus, Round, RoundScore,
    SkillVector, Standing, Tournament, TournamentId,
};
use fairway_sim::sim::scoring::FixedUniform;
use fairway_sim::{Engine, EngineConfig, MemoryStorage, Storage};
use std::sync::Arc;

/// Par 72: two nines of 4,4,3,5,4,4,3,4,5.
pub const PARS: [u8; 18] = [4, 4, 3, 5, 4, 4, 3, 4, 5, 4, 4, 3, 5, 4, 4, 3, 4, 5];

pub const COURSE: CourseId = CourseId(1);
pub const TOURNAMENT: TournamentId = TournamentId(1);

pub fn course() -> Course {
    Course {
        id: COURSE,
        name: "Harbour Links".to_string(),
        holes: PARS
            .iter()
            .zip(1u8..)
            .map(|(par, number)| Hole {
                number,
                par: *par,
                difficulty: 1.0,
            })
            .collect(),
    }
}

pub fn player(id: i64, rating: f64) -> Player {
    Player {
        id: PlayerId(id),
        name: format!("Player {id}"),
        country: None,
        skills: SkillVector::uniform(rating),
    }
}

/// `n` players rated from 95.0 downwards, so id order is also skill order.
pub fn field(n: usize) -> Vec<Player> {
    (1..=n)
        .map(|i| player(i as i64, 95.0 - i as f64 * 0.1))
        .collect()
}

pub fn date(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 4, day).expect("valid date")
}

/// A memory store holding the test course, `players` players and one pending tournament.
pub async fn memory_store(players: usize) -> Arc<MemoryStorage> {
    let storage = MemoryStorage::new();
    storage.add_course(course()).await.expect("course is valid");
    for p in field(players) {
        storage.add_player(p).await;
    }
    storage
        .add_tournament(Tournament::pending(TOURNAMENT, "Spring Open", COURSE, date(9)))
        .await;
    Arc::new(storage)
}

/// Every draw lands at the middle of the range, so every hole comes in at par for the
/// ratings `field` hands out.
pub fn engine(storage: Arc<MemoryStorage>, config: EngineConfig) -> Engine {
    let storage: Arc<dyn Storage> = storage;
    Engine::new(storage, config, FixedUniform(0.0))
}

pub async fn record_round(
    storage: &dyn Storage,
    player: PlayerId,
    round: Round,
    strokes: impl Fn(u8) -> i32,
) {
    for hole in 1..=18u8 {
        storage
            .upsert_live_score(&LiveScore {
                tournament_id: TOURNAMENT,
                player_id: player,
                round,
                hole,
                strokes: strokes(hole),
            })
            .await
            .expect("score stored");
    }
}

pub fn par_of(hole: u8) -> i32 {
    i32::from(PARS[usize::from(hole - 1)])
}

pub fn standing(id: i64, score_to_par: i32, holes_played: u32, status: PlayerStatus) -> Standing {
    Standing {
        player_id: PlayerId(id),
        player_name: format!("Player {id}"),
        status,
        tee_group: None,
        tee_step: None,
        total_strokes: 72 * (holes_played as i32 / 18) + score_to_par,
        score_to_par,
        holes_played,
        thru: 0,
        rounds: <[RoundScore; 4]>::default(),
        position: None,
    }
}

/// Ticks until the outcome is no longer a played step. Panics if that takes absurdly long.
pub async fn run_until_settled(engine: &Engine) -> fairway_sim::StepOutcome {
    for _ in 0..10_000 {
        let outcome = engine
            .advance_one_step(TOURNAMENT)
            .await
            .expect("tick succeeds");
        if !matches!(outcome, fairway_sim::StepOutcome::Played { .. }) {
            return outcome;
        }
    }
    panic!("simulation never settled");
}
