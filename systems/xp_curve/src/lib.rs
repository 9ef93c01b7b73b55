#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Deterministic XP curve calculator.
//!
//! Levels are a pure function of accumulated XP: a persisted `level` field
//! is a cache of [`level_from_xp`] and must never diverge from it. The
//! curve is exponential with a configurable base cost and growth factor.

use holdout_core::XpConfig;

/// XP required to advance from `level - 1` to `level`.
///
/// Zero for level one and below; otherwise
/// `xp_per_level * xp_scaling_per_level^(level - 2)`, floored.
#[must_use]
pub fn xp_required_for_level(config: &XpConfig, level: u32) -> u64 {
    if level <= 1 {
        return 0;
    }
    let cost = config.xp_per_level as f64
        * config.xp_scaling_per_level.powi(level as i32 - 2);
    cost as u64
}

/// Total accumulated XP required to hold the provided level.
///
/// Monotonically non-decreasing in `level`; zero for level one and below.
#[must_use]
pub fn total_xp_for_level(config: &XpConfig, level: u32) -> u64 {
    let mut total = 0u64;
    for step in 2..=level.max(1) {
        total = total.saturating_add(xp_required_for_level(config, step));
    }
    total
}

/// The largest level whose total XP requirement fits within `xp`.
///
/// Exact inverse of [`total_xp_for_level`]: holding exactly the total for
/// a level yields that level, one XP less yields the level below.
#[must_use]
pub fn level_from_xp(config: &XpConfig, xp: u64) -> u32 {
    let mut level = 1u32;
    let mut total = 0u64;
    loop {
        let cost = xp_required_for_level(config, level + 1);
        if cost == 0 {
            // Degenerate curve configuration; refuse to loop forever.
            return level;
        }
        let next_total = total.saturating_add(cost);
        if next_total > xp {
            return level;
        }
        total = next_total;
        level += 1;
        if total == u64::MAX {
            return level;
        }
    }
}

/// Progress report derived from a player's accumulated XP.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct XpProgress {
    /// Level derived from the accumulated XP.
    pub level: u32,
    /// Accumulated XP.
    pub xp: u64,
    /// XP earned past the floor of the current level.
    pub into_level: u64,
    /// XP required to advance from the current level to the next.
    pub next_level_cost: u64,
    /// Percentage of the way to the next level, clamped to `0.0..=100.0`.
    pub percent: f64,
}

/// Computes a progress report for the provided accumulated XP.
#[must_use]
pub fn progress(config: &XpConfig, xp: u64) -> XpProgress {
    let level = level_from_xp(config, xp);
    let floor = total_xp_for_level(config, level);
    let into_level = xp.saturating_sub(floor);
    let next_level_cost = xp_required_for_level(config, level + 1);
    let percent = if next_level_cost == 0 {
        0.0
    } else {
        (into_level as f64 / next_level_cost as f64 * 100.0).clamp(0.0, 100.0)
    };
    XpProgress {
        level,
        xp,
        into_level,
        next_level_cost,
        percent,
    }
}

#[cfg(test)]
mod tests {
    use super::{level_from_xp, progress, total_xp_for_level, xp_required_for_level};
    use holdout_core::XpConfig;

    fn config() -> XpConfig {
        XpConfig::default()
    }

    #[test]
    fn requirement_matches_reference_values() {
        let config = config();
        assert_eq!(xp_required_for_level(&config, 1), 0);
        assert_eq!(xp_required_for_level(&config, 2), 100);
        assert_eq!(xp_required_for_level(&config, 3), 150);
        assert_eq!(xp_required_for_level(&config, 4), 225);
    }

    #[test]
    fn totals_accumulate_the_requirements() {
        let config = config();
        assert_eq!(total_xp_for_level(&config, 1), 0);
        assert_eq!(total_xp_for_level(&config, 2), 100);
        assert_eq!(total_xp_for_level(&config, 3), 250);
        assert_eq!(total_xp_for_level(&config, 4), 475);
    }

    #[test]
    fn level_is_exact_inverse_of_totals() {
        let config = config();
        for level in 1..=40 {
            let floor = total_xp_for_level(&config, level);
            assert_eq!(level_from_xp(&config, floor), level, "at floor of {level}");
        }
    }

    #[test]
    fn one_xp_below_a_floor_yields_the_previous_level() {
        let config = config();
        for level in 2..=40 {
            let floor = total_xp_for_level(&config, level);
            assert_eq!(
                level_from_xp(&config, floor - 1),
                level - 1,
                "just below floor of {level}",
            );
        }
    }

    #[test]
    fn reference_player_levels() {
        let config = config();
        assert_eq!(level_from_xp(&config, 0), 1);
        assert_eq!(level_from_xp(&config, 99), 1);
        assert_eq!(level_from_xp(&config, 249), 2);
        assert_eq!(level_from_xp(&config, 250), 3);
    }

    #[test]
    fn degenerate_zero_cost_curve_stays_at_level_one() {
        let config = XpConfig {
            xp_per_level: 0,
            ..XpConfig::default()
        };
        assert_eq!(level_from_xp(&config, 1_000_000), 1);
    }

    #[test]
    fn progress_reports_position_within_the_level() {
        let config = config();
        let report = progress(&config, 175);
        assert_eq!(report.level, 2);
        assert_eq!(report.into_level, 75);
        assert_eq!(report.next_level_cost, 150);
        assert!((report.percent - 50.0).abs() < 1e-9);
    }
}
