//! Match performance analyst CLI
//!
//! Scores both teams of a finished match from its statistics and judges
//! whether the result matched the performance.

use std::path::PathBuf;

use anyhow::{Result, anyhow};
use clap::{Parser, Subcommand};
use log::{info, warn};

use cps_analyst::analysis::{Analyst, MatchAnalysis, comparison_table};
use cps_analyst::config::Settings;
use cps_analyst::fixture::MatchBundle;
use cps_analyst::narrative::{Narrator, write_report};
use cps_analyst::score::ScoreEngine;
use cps_analyst::scout::Scout;
use cps_analyst::{chart, dashboard, export};

#[derive(Parser)]
#[command(name = "cps_analyst")]
#[command(about = "Performance-based verdicts for finished football matches", long_about = None)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Data directory (overrides CPS_DATA_DIR)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze one match and write its report
    Analyze {
        /// Fixture id
        #[arg(long, conflicts_with = "team")]
        fixture: Option<u64>,
        /// Analyze the latest finished match of this team
        #[arg(long)]
        team: Option<u64>,
        /// Ignore cached data and refetch
        #[arg(long)]
        no_cache: bool,
        /// JSON file of weight overrides
        #[arg(long)]
        weights: Option<PathBuf>,
        /// Leave charts out of the report
        #[arg(long)]
        no_charts: bool,
        /// Ask the configured LLM provider for the chronicle
        #[arg(long)]
        narrate: bool,
        /// Open the terminal dashboard afterwards
        #[arg(long)]
        dashboard: bool,
    },
    /// Export one match analysis to an xlsx workbook
    Export {
        #[arg(long)]
        fixture: u64,
        #[arg(long)]
        out: PathBuf,
        #[arg(long)]
        weights: Option<PathBuf>,
    },
    /// List a team's finished matches, most recent first
    Matches {
        #[arg(long)]
        team: u64,
        #[arg(long, default_value = "5")]
        limit: usize,
    },
    /// Head-to-head history between two teams
    H2h {
        #[arg(long)]
        team_a: u64,
        #[arg(long)]
        team_b: u64,
    },
    /// Teams of a league season
    Teams {
        #[arg(long)]
        league: Option<u32>,
        #[arg(long)]
        season: Option<u16>,
    },
}

fn main() {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level))
        .format_timestamp(None)
        .init();

    let mut settings = match Settings::from_env() {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error loading settings: {e:#}");
            std::process::exit(1);
        }
    };
    if let Some(dir) = cli.data_dir {
        settings.data_dir = dir;
    }

    let result = match cli.command {
        Commands::Analyze {
            fixture,
            team,
            no_cache,
            weights,
            no_charts,
            narrate,
            dashboard,
        } => run_analyze(
            settings,
            AnalyzeOptions {
                fixture,
                team,
                use_cache: !no_cache,
                weights,
                charts: !no_charts,
                narrate,
                dashboard,
            },
        ),
        Commands::Export {
            fixture,
            out,
            weights,
        } => run_export(settings, fixture, out, weights),
        Commands::Matches { team, limit } => run_matches(&settings, team, limit),
        Commands::H2h { team_a, team_b } => run_h2h(&settings, team_a, team_b),
        Commands::Teams { league, season } => run_teams(&settings, league, season),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

struct AnalyzeOptions {
    fixture: Option<u64>,
    team: Option<u64>,
    use_cache: bool,
    weights: Option<PathBuf>,
    charts: bool,
    narrate: bool,
    dashboard: bool,
}

fn build_analyst(settings: &mut Settings, weights: Option<PathBuf>) -> Result<Analyst> {
    if let Some(path) = weights {
        settings.load_weights_file(&path)?;
    }
    Ok(Analyst::new(ScoreEngine::with_overrides(
        &settings.weight_overrides,
    )))
}

fn load_bundle(
    scout: &Scout,
    fixture: Option<u64>,
    team: Option<u64>,
    use_cache: bool,
) -> Result<MatchBundle> {
    match (fixture, team) {
        (Some(id), _) => scout.match_bundle(id, use_cache),
        (None, Some(team)) => scout.latest_match_bundle(team, use_cache),
        (None, None) => {
            let id = scout.store().first_cached_fixture().ok_or_else(|| {
                anyhow!(
                    "no --fixture or --team given and nothing cached under {}",
                    scout.store().root().display()
                )
            })?;
            info!("no fixture given, using cached fixture {id}");
            scout.match_bundle(id, true)
        }
    }
}

fn run_analyze(mut settings: Settings, opts: AnalyzeOptions) -> Result<()> {
    let analyst = build_analyst(&mut settings, opts.weights)?;
    let scout = Scout::from_settings(&settings);

    let bundle = load_bundle(&scout, opts.fixture, opts.team, opts.use_cache)?;
    let analysis = analyst.analyze(&bundle);
    let path = scout.store().save_analysis(&analysis)?;
    info!("analysis saved to {}", path.display());

    let charts = opts.charts.then(|| chart::analysis_charts(&analysis));
    let narrator = if opts.narrate {
        let narrator = Narrator::from_settings(&settings);
        if narrator.is_none() {
            warn!(
                "{} is not set; writing the basic report",
                settings.llm_provider.key_var()
            );
        }
        narrator
    } else {
        None
    };
    let report = write_report(
        &analysis,
        &bundle.events(),
        charts.as_deref(),
        narrator.as_ref(),
    );
    let path = scout
        .store()
        .save_report(analysis.match_info.fixture_id, &report)?;
    info!("report saved to {}", path.display());

    print_summary(&analysis);
    if !analysis.lineups.is_empty() {
        println!("\n{}", chart::lineups_chart(&analysis.lineups));
    }
    if let Some(charts) = &charts {
        println!("\n{charts}");
    }

    if opts.dashboard {
        dashboard::run(&analysis)?;
    }
    Ok(())
}

fn print_summary(analysis: &MatchAnalysis) {
    let info = &analysis.match_info;
    println!("\n{}  ({})", info.scoreline(), info.date);
    println!("{:<20}{:>14}{:>14}", "Metric", info.home_team, info.away_team);
    for row in comparison_table(analysis) {
        match (row.home, row.away) {
            (Some(h), Some(a)) => println!("{:<20}{h:>14.2}{a:>14.2}", row.metric),
            _ => println!("{}", row.metric),
        }
    }
    println!("\n{}", analysis.verdict);
}

fn run_export(
    mut settings: Settings,
    fixture: u64,
    out: PathBuf,
    weights: Option<PathBuf>,
) -> Result<()> {
    let analyst = build_analyst(&mut settings, weights)?;
    let scout = Scout::from_settings(&settings);
    let bundle = scout.match_bundle(fixture, true)?;
    let analysis = analyst.analyze(&bundle);
    let report = export::export_analysis(&out, &analysis)?;
    println!(
        "Exported fixture {fixture} to {} ({} comparison rows, {} stats)",
        out.display(),
        report.comparison_rows,
        report.stat_rows
    );
    Ok(())
}

fn run_matches(settings: &Settings, team: u64, limit: usize) -> Result<()> {
    let scout = Scout::from_settings(settings);
    let matches = scout.last_matches(team, limit, true)?;
    if matches.is_empty() {
        println!("No finished matches found for team {team}");
    }
    for m in &matches {
        println!("{:>9}  {}", m.fixture.id.unwrap_or_default(), m.summary_line());
    }
    Ok(())
}

fn run_h2h(settings: &Settings, team_a: u64, team_b: u64) -> Result<()> {
    let scout = Scout::from_settings(settings);
    let matches = scout.head_to_head(team_a, team_b, true)?;
    println!("{} meetings", matches.len());
    for m in &matches {
        println!("{:>9}  {}", m.fixture.id.unwrap_or_default(), m.summary_line());
    }
    Ok(())
}

fn run_teams(settings: &Settings, league: Option<u32>, season: Option<u16>) -> Result<()> {
    let scout = Scout::from_settings(settings);
    for team in scout.league_teams(league, season)? {
        println!(
            "{:>6}  {:<30} {}",
            team.id,
            team.name,
            team.code.as_deref().unwrap_or("")
        );
    }
    Ok(())
}
