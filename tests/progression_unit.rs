use resale_market::progression::{
    LEVEL_THRESHOLDS, MAX_LEVEL, level_for_points, level_progress, points_to_next_level,
};

#[test]
fn level_starts_at_one() {
    assert_eq!(level_for_points(0), 1);
    assert_eq!(level_for_points(99), 1);
}

#[test]
fn crossing_a_threshold_moves_up_one_level() {
    assert_eq!(level_for_points(100), 2);
    assert_eq!(level_for_points(105), 2);
    assert_eq!(level_for_points(249), 2);
    assert_eq!(level_for_points(250), 3);
    assert_eq!(level_for_points(10_000), 10);
}

#[test]
fn level_caps_after_last_threshold() {
    assert_eq!(MAX_LEVEL, 11);
    assert_eq!(level_for_points(15_000), MAX_LEVEL);
    assert_eq!(level_for_points(i32::MAX), MAX_LEVEL);
}

#[test]
fn ninety_five_then_ten_reaches_level_two() {
    let mut points = 0;
    points += 95;
    assert_eq!(level_for_points(points), 1);
    points += 10;
    assert_eq!(level_for_points(points), 2);
}

#[test]
fn level_never_drops_while_points_grow() {
    let mut last = level_for_points(0);
    for points in (0..20_000).step_by(37) {
        let level = level_for_points(points);
        assert!(level >= last, "level dropped at {points}");
        last = level;
    }
}

#[test]
fn every_threshold_is_the_first_point_of_the_next_level() {
    for (level, threshold) in LEVEL_THRESHOLDS {
        assert_eq!(level_for_points(threshold - 1), level);
        assert_eq!(level_for_points(threshold), level + 1);
    }
}

#[test]
fn points_to_next_level_counts_down_to_threshold() {
    assert_eq!(points_to_next_level(0, 1), 100);
    assert_eq!(points_to_next_level(105, 2), 145);
    assert_eq!(points_to_next_level(20_000, MAX_LEVEL), 0);
}

#[test]
fn level_progress_is_a_clamped_percentage() {
    assert_eq!(level_progress(0, 1), 0.0);
    assert_eq!(level_progress(50, 1), 50.0);
    assert_eq!(level_progress(175, 2), 50.0);
    assert_eq!(level_progress(20_000, MAX_LEVEL), 100.0);
    // stale level stored against a larger total
    assert_eq!(level_progress(400, 1), 100.0);
}
