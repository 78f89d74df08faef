use ahash::AHashSet;
use fairway_sim::model::{PlayerId, TeeGroup};
use fairway_sim::sim::schedule::{
    PlannedHole, block_length, finish_step, hole_for_group, plan_step, scored_set, tee_step,
};

fn three_groups() -> Vec<TeeGroup> {
    (1..=3u32)
        .map(|number| TeeGroup {
            number,
            players: (0..3)
                .map(|i| PlayerId(i64::from(number) * 10 + i))
                .collect(),
        })
        .collect()
}

fn holes_at(groups: &[TeeGroup], round_start: u64, step: u64) -> Vec<(u32, u8)> {
    plan_step(groups, round_start, step, |_| true, |_, _| false)
        .into_iter()
        .map(|p| (p.group, p.hole))
        .collect()
}

#[test]
fn test_three_group_stagger() {
    let groups = three_groups();
    assert_eq!(holes_at(&groups, 0, 0), vec![(1, 1)]);
    assert_eq!(holes_at(&groups, 0, 1), vec![(1, 2), (2, 1)]);
    assert_eq!(holes_at(&groups, 0, 2), vec![(1, 3), (2, 2), (3, 1)]);
    assert_eq!(holes_at(&groups, 0, 17), vec![(1, 18), (2, 17), (3, 16)]);
    assert_eq!(holes_at(&groups, 0, 19), vec![(3, 18)]);
    assert!(holes_at(&groups, 0, 20).is_empty());
    assert_eq!(block_length(groups.len()), 20);
}

#[test]
fn test_groups_finish_after_eighteen_steps() {
    for group in 1..=3u32 {
        let finish = finish_step(0, group);
        assert_eq!(finish, u64::from(group - 1) + 18);
        assert_eq!(hole_for_group(0, finish - 1, group), Some(18));
        assert_eq!(hole_for_group(0, finish, group), None);
    }
}

#[test]
fn test_later_round_is_relative_to_its_start() {
    let groups = three_groups();
    assert!(holes_at(&groups, 100, 99).is_empty());
    assert_eq!(holes_at(&groups, 100, 100), vec![(1, 1)]);
    assert_eq!(tee_step(100, 3), 102);
    assert_eq!(holes_at(&groups, 100, 104), vec![(1, 5), (2, 4), (3, 3)]);
}

#[test]
fn test_no_groups_is_a_no_op() {
    assert!(holes_at(&[], 0, 0).is_empty());
    assert_eq!(block_length(0), 0);
}

#[test]
fn test_replayed_step_only_plans_missing_scores() {
    let groups = three_groups();
    // Group 1 already has hole 3 for two of its players, group 2 has hole 2 for everyone.
    let scored = scored_set([
        (PlayerId(10), 3),
        (PlayerId(11), 3),
        (PlayerId(20), 2),
        (PlayerId(21), 2),
        (PlayerId(22), 2),
    ]);
    let plan = plan_step(&groups, 0, 2, |_| true, |p, h| scored.contains(&(p, h)));
    assert_eq!(
        plan,
        vec![
            PlannedHole {
                group: 1,
                hole: 3,
                players: vec![PlayerId(12)],
            },
            PlannedHole {
                group: 3,
                hole: 1,
                players: vec![PlayerId(30), PlayerId(31), PlayerId(32)],
            },
        ]
    );
}

#[test]
fn test_cut_players_are_skipped() {
    let groups = three_groups();
    let cut: AHashSet<PlayerId> = [PlayerId(30), PlayerId(31), PlayerId(32), PlayerId(10)]
        .into_iter()
        .collect();
    let plan = plan_step(&groups, 0, 2, |p| !cut.contains(&p), |_, _| false);
    let groups_planned: Vec<u32> = plan.iter().map(|p| p.group).collect();
    assert_eq!(groups_planned, vec![1, 2]);
    assert_eq!(plan[0].players, vec![PlayerId(11), PlayerId(12)]);
}
