use numhex_engine::{Badge, PlayerStats};
use serde::Serialize;

use crate::util;

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct BadgesArg {
    /// Best total score
    #[clap(long, default_value_t = 0)]
    score: u64,
    /// Highest level reached
    #[clap(long, default_value_t = 1)]
    level: u32,
    /// Best estimated IQ
    #[clap(long, default_value_t = 100.0)]
    iq: f64,
    /// Print the badge list as JSON
    #[clap(long, default_value_t = false)]
    json: bool,
}

#[derive(Debug, Serialize)]
struct BadgeStatus {
    id: &'static str,
    name: String,
    description: &'static str,
    unlocked: bool,
}

fn badge_statuses(stats: &PlayerStats) -> Vec<BadgeStatus> {
    Badge::ALL
        .into_iter()
        .map(|badge| BadgeStatus {
            id: badge.id(),
            name: badge.to_string(),
            description: badge.description(),
            unlocked: badge.is_unlocked(stats),
        })
        .collect()
}

pub(crate) fn run(arg: &BadgesArg) -> anyhow::Result<()> {
    let BadgesArg {
        score,
        level,
        iq,
        json,
    } = arg;

    let stats = PlayerStats {
        total_score: *score,
        max_level: *level,
        estimated_iq: *iq,
    };
    let statuses = badge_statuses(&stats);
    if *json {
        return util::save_json(&statuses, None);
    }

    for status in &statuses {
        let mark = if status.unlocked { "x" } else { " " };
        println!(
            "[{mark}] {:<10} {:<12} {}",
            status.name, status.id, status.description
        );
    }
    let unlocked = statuses.iter().filter(|status| status.unlocked).count();
    println!();
    println!("{unlocked}/{} unlocked", statuses.len());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_statuses_follow_thresholds() {
        let stats = PlayerStats {
            total_score: 5000,
            max_level: 4,
            estimated_iq: 129.9,
        };
        let unlocked: Vec<_> = badge_statuses(&stats)
            .into_iter()
            .filter(|status| status.unlocked)
            .map(|status| status.id)
            .collect();
        assert_eq!(unlocked, ["rookie", "score_1000", "iq_110", "score_5000"]);
    }
}
