mod common;

use common::{TOURNAMENT, engine, memory_store, record_round, run_until_settled, standing};
use fairway_sim::model::{PlayerId, PlayerStatus, Round, Standing};
use fairway_sim::sim::cut::{decide_cut, pair_for_weekend};
use fairway_sim::{CutOutcome, EngineConfig, StepOutcome, Storage};

fn field_with_scores(scores: impl IntoIterator<Item = i32>) -> Vec<Standing> {
    scores
        .into_iter()
        .zip(1i64..)
        .map(|(to_par, id)| standing(id, to_par, 36, PlayerStatus::Active))
        .collect()
}

#[test]
fn test_exactly_cut_size_survive_without_ties() {
    let standings = field_with_scores(0..150);
    let decision = decide_cut(&standings, 65);
    assert_eq!(decision.line, Some(64));
    assert_eq!(decision.survivors.len(), 65);
    assert_eq!(decision.missed_cut.len(), 85);
    assert!(decision.survivors.iter().all(|s| s.score_to_par <= 64));
}

#[test]
fn test_ties_at_the_line_all_survive() {
    // Ranks 61 through 70 share a score of 60.
    let scores = (0..60).chain(std::iter::repeat_n(60, 10)).chain(61..141);
    let standings = field_with_scores(scores);
    assert_eq!(standings.len(), 150);
    let decision = decide_cut(&standings, 65);
    assert_eq!(decision.line, Some(60));
    assert_eq!(decision.survivors.len(), 70);
    assert_eq!(decision.missed_cut.len(), 80);
}

#[test]
fn test_field_equal_to_cut_size_keeps_everyone() {
    let standings = field_with_scores(0..65);
    let decision = decide_cut(&standings, 65);
    assert_eq!(decision.line, None);
    assert_eq!(decision.survivors.len(), 65);
    assert!(decision.missed_cut.is_empty());
}

#[test]
fn test_player_without_scores_misses_the_cut() {
    let mut standings = field_with_scores(0..3);
    standings.push(standing(99, 0, 0, PlayerStatus::Active));
    let decision = decide_cut(&standings, 65);
    assert_eq!(decision.survivor_ids(), vec![PlayerId(1), PlayerId(2), PlayerId(3)]);
    assert_eq!(decision.missed_cut, vec![PlayerId(99)]);
}

#[test]
fn test_zero_cut_size_cuts_everyone() {
    let standings = field_with_scores(0..10);
    let decision = decide_cut(&standings, 0);
    assert_eq!(decision.line, None);
    assert!(decision.survivors.is_empty());
    assert_eq!(decision.missed_cut.len(), 10);
}

#[test]
fn test_leaders_tee_off_last() {
    // Shuffle the input so the pairing does its own sort.
    let mut standings = field_with_scores(0..64);
    standings.reverse();
    let groups = pair_for_weekend(&standings, 2);
    assert_eq!(groups.len(), 32);
    assert_eq!(groups[0].number, 1);
    assert_eq!(groups[0].players, vec![PlayerId(63), PlayerId(64)]);
    assert_eq!(groups[31].number, 32);
    assert_eq!(groups[31].players, vec![PlayerId(1), PlayerId(2)]);
}

#[test]
fn test_odd_survivor_tees_off_alone_first() {
    let standings = field_with_scores(0..5);
    let groups = pair_for_weekend(&standings, 2);
    let players: Vec<Vec<PlayerId>> = groups.into_iter().map(|g| g.players).collect();
    assert_eq!(
        players,
        vec![
            vec![PlayerId(5)],
            vec![PlayerId(3), PlayerId(4)],
            vec![PlayerId(1), PlayerId(2)],
        ]
    );
}

#[tokio::test]
async fn test_cut_commits_statuses_and_weekend_groups() -> Result<(), Box<dyn std::error::Error>> {
    let storage = memory_store(150).await;
    let engine = engine(storage.clone(), EngineConfig::default());
    engine.start_tournament(TOURNAMENT).await?;

    // Player n finishes round 1 at n-1 over par and round 2 level.
    for id in 1..=150i64 {
        let over = (id - 1) as i32;
        record_round(storage.as_ref(), PlayerId(id), Round::FIRST, |hole| {
            common::par_of(hole) + if hole == 1 { over } else { 0 }
        })
        .await;
    }
    assert_eq!(engine.apply_cut_if_due(TOURNAMENT).await?, CutOutcome::NotDue);
    assert_eq!(engine.advance_round(TOURNAMENT).await?, Some(Round::CUT));
    for id in 1..=150i64 {
        record_round(storage.as_ref(), PlayerId(id), Round::CUT, common::par_of).await;
    }

    let outcome = engine.apply_cut_if_due(TOURNAMENT).await?;
    assert_eq!(
        outcome,
        CutOutcome::Applied {
            line: Some(64),
            survivors: 65,
            missed: 85,
        }
    );
    assert_eq!(
        engine.apply_cut_if_due(TOURNAMENT).await?,
        CutOutcome::AlreadyApplied
    );

    let entrants = storage.get_tournament_players(TOURNAMENT).await?;
    for entrant in &entrants {
        let expected = if entrant.player.id.0 <= 65 {
            PlayerStatus::Active
        } else {
            PlayerStatus::Cut
        };
        assert_eq!(entrant.status, expected, "player {}", entrant.player.id);
    }

    let third = storage.get_round_groups(TOURNAMENT, Round::THIRD).await?;
    let fourth = storage.get_round_groups(TOURNAMENT, Round::FINAL).await?;
    assert_eq!(third, fourth);
    assert_eq!(third.len(), 33);
    assert_eq!(third[0].players, vec![PlayerId(65)]);
    assert_eq!(third[32].players, vec![PlayerId(1), PlayerId(2)]);

    let tournament = storage
        .get_tournament(TOURNAMENT)
        .await?
        .ok_or("tournament missing")?;
    assert!(tournament.cut_applied);
    Ok(())
}

#[tokio::test]
async fn test_field_of_exactly_cut_size_loses_nobody() -> Result<(), Box<dyn std::error::Error>> {
    let storage = memory_store(65).await;
    let engine = engine(storage.clone(), EngineConfig::default());
    engine.start_tournament(TOURNAMENT).await?;

    assert_eq!(
        run_until_settled(&engine).await,
        StepOutcome::RoundComplete { round: Round::FIRST }
    );
    engine.advance_round(TOURNAMENT).await?;
    assert_eq!(
        run_until_settled(&engine).await,
        StepOutcome::CutApplied {
            survivors: 65,
            missed: 0,
        }
    );

    let entrants = storage.get_tournament_players(TOURNAMENT).await?;
    assert!(entrants.iter().all(|e| e.status == PlayerStatus::Active));
    Ok(())
}

#[tokio::test]
async fn test_two_engines_on_one_store_cut_once() -> Result<(), Box<dyn std::error::Error>> {
    let storage = memory_store(10).await;
    let config = EngineConfig {
        cut_size: 4,
        ..EngineConfig::default()
    };
    let first = engine(storage.clone(), config.clone());
    let second = engine(storage.clone(), config);
    first.start_tournament(TOURNAMENT).await?;

    for id in 1..=10i64 {
        let over = (id - 1) as i32;
        record_round(storage.as_ref(), PlayerId(id), Round::FIRST, |hole| {
            common::par_of(hole) + if hole == 1 { over } else { 0 }
        })
        .await;
    }
    first.advance_round(TOURNAMENT).await?;
    for id in 1..=10i64 {
        record_round(storage.as_ref(), PlayerId(id), Round::CUT, common::par_of).await;
    }

    // Separate engines hold separate locks; only the store can keep the cut single.
    let (a, b) = tokio::join!(
        first.apply_cut_if_due(TOURNAMENT),
        second.apply_cut_if_due(TOURNAMENT)
    );
    let mut outcomes = vec![a?, b?];
    outcomes.sort_by_key(|o| matches!(o, CutOutcome::AlreadyApplied));
    assert_eq!(
        outcomes,
        vec![
            CutOutcome::Applied {
                line: Some(3),
                survivors: 4,
                missed: 6,
            },
            CutOutcome::AlreadyApplied,
        ]
    );

    let entrants = storage.get_tournament_players(TOURNAMENT).await?;
    let cut = entrants
        .iter()
        .filter(|e| e.status == PlayerStatus::Cut)
        .count();
    assert_eq!(cut, 6);
    assert_eq!(storage.get_round_groups(TOURNAMENT, Round::THIRD).await?.len(), 2);
    Ok(())
}
