//! Plain-text charts for reports and the terminal.

use std::fmt::Write;

use crate::analysis::MatchAnalysis;
use crate::fixture::{Lineup, LineupPlayer};
use crate::score::ScoreBreakdown;
use crate::stats::{StatKey, StatRecord};

pub const BAR_WIDTH: usize = 24;
const FULL: char = '█';
const NEGATIVE: char = '▒';

/// Stat, label and the value treated as a full bar. Fouls are inverted so a
/// longer bar is always better.
pub const RADAR_METRICS: [(StatKey, &str, f64); 6] = [
    (StatKey::ShotsOnGoal, "Shots on Goal", 10.0),
    (StatKey::ShotsInsideBox, "Shots Inside Box", 15.0),
    (StatKey::Possession, "Possession %", 100.0),
    (StatKey::PassAccuracy, "Pass Accuracy %", 100.0),
    (StatKey::CornerKicks, "Corner Kicks", 10.0),
    (StatKey::Fouls, "Fouls (inv.)", 30.0),
];

pub fn normalized_metric(record: &StatRecord, key: StatKey, scale: f64) -> f64 {
    let raw = record.get(key);
    let value = if key == StatKey::Fouls {
        (scale - raw).max(0.0)
    } else {
        raw
    };
    (value / scale).clamp(0.0, 1.0)
}

pub fn cps_breakdown_chart(
    home_name: &str,
    home: &ScoreBreakdown,
    away_name: &str,
    away: &ScoreBreakdown,
) -> String {
    let rows = [
        ("Threat", home.threat, away.threat),
        ("Control", home.control, away.control),
        ("Friction", home.friction, away.friction),
        ("TOTAL", home.total, away.total),
    ];
    let max = rows
        .iter()
        .flat_map(|(_, h, a)| [h.abs(), a.abs()])
        .fold(0.0_f64, f64::max);
    let name_width = home_name.chars().count().max(away_name.chars().count());

    let mut out = String::from("CPS breakdown\n");
    for (label, h, a) in rows {
        let _ = writeln!(
            out,
            "{label:<9}{} |{}| {h:+8.2}",
            pad(home_name, name_width),
            signed_bar(h, max)
        );
        let _ = writeln!(
            out,
            "{:<9}{} |{}| {a:+8.2}",
            "",
            pad(away_name, name_width),
            signed_bar(a, max)
        );
    }
    out
}

pub fn stat_comparison_chart(
    home_name: &str,
    home: &StatRecord,
    away_name: &str,
    away: &StatRecord,
) -> String {
    let name_width = home_name.chars().count().max(away_name.chars().count());
    let mut out = String::from("Performance profile (share of reference scale)\n");
    for (key, label, scale) in RADAR_METRICS {
        let h = normalized_metric(home, key, scale);
        let a = normalized_metric(away, key, scale);
        let _ = writeln!(out, "{label}");
        let _ = writeln!(
            out,
            "  {} |{}| {:>5.1}%",
            pad(home_name, name_width),
            bar(h, 1.0),
            h * 100.0
        );
        let _ = writeln!(
            out,
            "  {} |{}| {:>5.1}%",
            pad(away_name, name_width),
            bar(a, 1.0),
            a * 100.0
        );
    }
    out
}

/// Both charts for an analysis, separated by a blank line.
pub fn analysis_charts(analysis: &MatchAnalysis) -> String {
    let info = &analysis.match_info;
    format!(
        "{}\n{}",
        cps_breakdown_chart(
            &info.home_team,
            &analysis.raw_scores.home,
            &info.away_team,
            &analysis.raw_scores.away
        ),
        stat_comparison_chart(
            &info.home_team,
            &analysis.stats.home,
            &info.away_team,
            &analysis.stats.away
        )
    )
}

/// Starting XI laid out by grid row, goalkeeper first. Players without a
/// grid position are listed on a trailing `?` row.
pub fn formation_chart(lineup: &Lineup) -> String {
    let mut out = format!(
        "{} ({})",
        lineup.team_name(),
        lineup.formation.as_deref().unwrap_or("?")
    );
    if let Some(coach) = lineup.coach_name() {
        let _ = write!(out, "  coach: {coach}");
    }
    out.push('\n');

    let mut placed: Vec<((u32, u32), &LineupPlayer)> = Vec::new();
    let mut unplaced: Vec<&LineupPlayer> = Vec::new();
    for slot in &lineup.start_xi {
        match slot.player.grid_position() {
            Some(pos) => placed.push((pos, &slot.player)),
            None => unplaced.push(&slot.player),
        }
    }
    placed.sort_by_key(|(pos, _)| *pos);

    let mut rows: Vec<(u32, Vec<&LineupPlayer>)> = Vec::new();
    for ((row, _), player) in placed {
        match rows.last_mut() {
            Some((r, players)) if *r == row => players.push(player),
            _ => rows.push((row, vec![player])),
        }
    }
    for (row, players) in &rows {
        let label = if *row == 1 {
            "GK".to_string()
        } else {
            row.to_string()
        };
        let _ = writeln!(out, "  {label:<3}{}", player_list(players));
    }
    if !unplaced.is_empty() {
        let _ = writeln!(out, "  {:<3}{}", "?", player_list(&unplaced));
    }
    out
}

/// Formations for every line-up, blank-line separated. Empty when the
/// provider sent none.
pub fn lineups_chart(lineups: &[Lineup]) -> String {
    lineups
        .iter()
        .map(formation_chart)
        .collect::<Vec<_>>()
        .join("\n")
}

fn player_list(players: &[&LineupPlayer]) -> String {
    players
        .iter()
        .map(|p| match p.number {
            Some(n) => format!("#{n} {}", p.short_name()),
            None => p.short_name().to_string(),
        })
        .collect::<Vec<_>>()
        .join("  ")
}

fn bar(value: f64, max: f64) -> String {
    let filled = bar_len(value, max);
    let mut s = String::with_capacity(BAR_WIDTH * 3);
    s.extend(std::iter::repeat_n(FULL, filled));
    s.extend(std::iter::repeat_n(' ', BAR_WIDTH - filled));
    s
}

fn signed_bar(value: f64, max: f64) -> String {
    if value >= 0.0 {
        return bar(value, max);
    }
    let filled = bar_len(value.abs(), max);
    let mut s = String::with_capacity(BAR_WIDTH * 3);
    s.extend(std::iter::repeat_n(NEGATIVE, filled));
    s.extend(std::iter::repeat_n(' ', BAR_WIDTH - filled));
    s
}

fn bar_len(value: f64, max: f64) -> usize {
    if max <= 0.0 || !value.is_finite() {
        return 0;
    }
    let len = (value / max * BAR_WIDTH as f64).round();
    (len.max(0.0) as usize).min(BAR_WIDTH)
}

fn pad(name: &str, width: usize) -> String {
    let len = name.chars().count();
    format!("{name}{}", " ".repeat(width.saturating_sub(len)))
}
