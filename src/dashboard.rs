use std::io;
use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::prelude::*;
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Bar, BarChart, BarGroup, Block, Borders, Clear, Paragraph, Wrap};

use crate::analysis::{MatchAnalysis, comparison_table};
use crate::chart::{RADAR_METRICS, lineups_chart, normalized_metric};

const HOME_COLOR: Color = Color::Cyan;
const AWAY_COLOR: Color = Color::Red;

pub struct Dashboard<'a> {
    analysis: &'a MatchAnalysis,
    help_overlay: bool,
    should_quit: bool,
}

impl<'a> Dashboard<'a> {
    pub fn new(analysis: &'a MatchAnalysis) -> Self {
        Self {
            analysis,
            help_overlay: false,
            should_quit: false,
        }
    }

    fn on_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => self.should_quit = true,
            KeyCode::Char('?') => self.help_overlay = !self.help_overlay,
            _ => {}
        }
    }
}

/// Takes over the terminal until the user quits.
pub fn run(analysis: &MatchAnalysis) -> io::Result<()> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = ratatui::backend::CrosstermBackend::new(stdout);
    let mut terminal = ratatui::Terminal::new(backend)?;

    let mut app = Dashboard::new(analysis);
    let res = run_app(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    res
}

fn run_app<B: Backend>(terminal: &mut Terminal<B>, app: &mut Dashboard) -> io::Result<()> {
    let tick_rate = Duration::from_millis(250);
    loop {
        terminal.draw(|f| ui(f, app))?;
        if event::poll(tick_rate)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    app.on_key(key);
                }
            }
        }
        if app.should_quit {
            return Ok(());
        }
    }
}

fn ui(frame: &mut Frame, app: &Dashboard) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(12),
            Constraint::Length(5),
            Constraint::Length(1),
        ])
        .split(frame.size());

    let header = Paragraph::new(header_text(app.analysis))
        .style(Style::default().add_modifier(Modifier::BOLD))
        .block(Block::default().borders(Borders::BOTTOM));
    frame.render_widget(header, chunks[0]);

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(chunks[1]);
    render_left_column(frame, body[0], app.analysis);
    render_stats(frame, body[1], app.analysis);

    let verdict = Paragraph::new(app.analysis.verdict.clone())
        .wrap(Wrap { trim: true })
        .block(Block::default().title("Verdict").borders(Borders::ALL));
    frame.render_widget(verdict, chunks[2]);

    let footer = Paragraph::new("q quit | ? help").style(Style::default().fg(Color::DarkGray));
    frame.render_widget(footer, chunks[3]);

    if app.help_overlay {
        render_help_overlay(frame, frame.size());
    }
}

fn header_text(analysis: &MatchAnalysis) -> String {
    let info = &analysis.match_info;
    let cmp = &analysis.comparison;
    let venue = if info.venue.is_empty() {
        String::new()
    } else {
        format!(" | {}", info.venue)
    };
    format!(
        "{}\n{}{venue} | fixture {} | better: {} (+{:.2})",
        info.scoreline(),
        info.date,
        info.fixture_id,
        cmp.better_team,
        cmp.difference
    )
}

/// Bar heights per component. Friction is drawn by magnitude since bars
/// cannot go below zero; the label carries the sign.
fn cps_bar_values(analysis: &MatchAnalysis) -> [(&'static str, u64, u64); 4] {
    let h = &analysis.scores.home;
    let a = &analysis.scores.away;
    let v = |x: f64| x.abs().round() as u64;
    [
        ("Threat", v(h.threat), v(a.threat)),
        ("Control", v(h.control), v(a.control)),
        ("Friction(-)", v(h.friction), v(a.friction)),
        ("Total", v(h.total.max(0.0)), v(a.total.max(0.0))),
    ]
}

fn cps_chart(analysis: &MatchAnalysis) -> BarChart<'static> {
    let info = &analysis.match_info;
    let mut chart = BarChart::default()
        .block(
            Block::default()
                .title(format!(
                    "CPS  {} vs {}",
                    info.home_team, info.away_team
                ))
                .borders(Borders::ALL),
        )
        .bar_width(5)
        .bar_gap(1)
        .group_gap(3);
    for (label, home, away) in cps_bar_values(analysis) {
        let bars = [
            Bar::default()
                .value(home)
                .style(Style::default().fg(HOME_COLOR)),
            Bar::default()
                .value(away)
                .style(Style::default().fg(AWAY_COLOR)),
        ];
        chart = chart.data(BarGroup::default().label(Line::from(label)).bars(&bars));
    }
    chart
}

/// CPS bars, with the starting line-ups underneath when the provider sent them.
fn render_left_column(frame: &mut Frame, area: Rect, analysis: &MatchAnalysis) {
    if analysis.lineups.is_empty() {
        frame.render_widget(cps_chart(analysis), area);
        return;
    }
    let text = lineups_chart(&analysis.lineups);
    let height = u16::try_from(text.lines().count())
        .unwrap_or(u16::MAX)
        .saturating_add(2);
    let column = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(8), Constraint::Length(height)])
        .split(area);
    frame.render_widget(cps_chart(analysis), column[0]);

    let lineups = Paragraph::new(text)
        .wrap(Wrap { trim: false })
        .block(Block::default().title("Lineups").borders(Borders::ALL));
    frame.render_widget(lineups, column[1]);
}

fn render_stats(frame: &mut Frame, area: Rect, analysis: &MatchAnalysis) {
    let info = &analysis.match_info;
    let bold = Style::default().add_modifier(Modifier::BOLD);
    let home = truncate(&info.home_team, 10);
    let away = truncate(&info.away_team, 10);
    let mut lines = vec![Line::from(vec![
        Span::styled(format!("{:<18}", "Metric"), bold),
        Span::styled(format!("{home:>10}"), Style::default().fg(HOME_COLOR)),
        Span::styled(format!("{away:>10}"), Style::default().fg(AWAY_COLOR)),
    ])];
    for row in comparison_table(analysis) {
        let line = match (row.home, row.away) {
            (Some(h), Some(a)) => format!("{:<18}{h:>10.2}{a:>10.2}", row.metric),
            _ => row.metric.to_string(),
        };
        lines.push(Line::from(line));
    }
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "Profile (share of scale)",
        Style::default().add_modifier(Modifier::BOLD),
    )));
    for (key, label, scale) in RADAR_METRICS {
        let h = normalized_metric(&analysis.stats.home, key, scale) * 100.0;
        let a = normalized_metric(&analysis.stats.away, key, scale) * 100.0;
        lines.push(Line::from(format!("{label:<18}{h:>9.0}%{a:>9.0}%")));
    }

    let stats = Paragraph::new(lines).block(Block::default().title("Stats").borders(Borders::ALL));
    frame.render_widget(stats, area);
}

fn truncate(name: &str, max: usize) -> String {
    name.chars().take(max).collect()
}

fn render_help_overlay(frame: &mut Frame, area: Rect) {
    let popup_area = centered_rect(50, 40, area);
    frame.render_widget(Clear, popup_area);

    let text = [
        "CPS dashboard - Help",
        "",
        "  ?          Toggle help",
        "  q / Esc    Quit",
        "",
        "Friction is shown by magnitude; it always",
        "lowers the total.",
    ]
    .join("\n");

    let help = Paragraph::new(text)
        .block(Block::default().title("Help").borders(Borders::ALL))
        .style(Style::default());
    frame.render_widget(help, popup_area);
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1]);

    horizontal[1]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::Analyst;
    use crate::fixture::MatchBundle;
    use crossterm::event::KeyModifiers;
    use ratatui::backend::TestBackend;
    use serde_json::json;

    fn analysis() -> MatchAnalysis {
        let mut bundle = MatchBundle::new(3);
        bundle.fixture = Some(json!({
            "teams": {"home": {"name": "Huracan"}, "away": {"name": "Lanus"}},
            "goals": {"home": 0, "away": 0}
        }));
        bundle.statistics = Some(json!([
            {"team": {"name": "Huracan"}, "statistics": [
                {"type": "Shots on Goal", "value": 4},
                {"type": "Fouls", "value": 10}
            ]},
            {"team": {"name": "Lanus"}, "statistics": [
                {"type": "Shots on Goal", "value": 1}
            ]}
        ]));
        Analyst::default().analyze(&bundle)
    }

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn keys_toggle_help_and_quit() {
        let a = analysis();
        let mut app = Dashboard::new(&a);
        app.on_key(press(KeyCode::Char('?')));
        assert!(app.help_overlay);
        app.on_key(press(KeyCode::Char('?')));
        assert!(!app.help_overlay);
        app.on_key(press(KeyCode::Esc));
        assert!(app.should_quit);
    }

    #[test]
    fn friction_bars_use_magnitude() {
        let values = cps_bar_values(&analysis());
        // 4 * 3 shots, 10 fouls * -0.5
        assert_eq!(values[0], ("Threat", 12, 3));
        assert_eq!(values[2], ("Friction(-)", 5, 0));
        assert_eq!(values[3], ("Total", 7, 3));
    }

    #[test]
    fn renders_into_test_backend() {
        let a = analysis();
        let app = Dashboard::new(&a);
        let mut terminal = Terminal::new(TestBackend::new(100, 40)).unwrap();
        terminal.draw(|f| ui(f, &app)).unwrap();
        let buffer = terminal.backend().buffer().clone();
        let text: String = buffer.content().iter().map(|c| c.symbol()).collect();
        assert!(text.contains("Huracan 0-0 Lanus"));
        assert!(text.contains("Verdict"));
        assert!(!text.contains("Lineups"));
    }

    #[test]
    fn lineups_panel_shows_formations() {
        let mut a = analysis();
        a.lineups = serde_json::from_value(json!([
            {"team": {"name": "Huracan"}, "formation": "4-4-2", "startXI": [
                {"player": {"name": "H. Galíndez", "number": 1, "grid": "1:1"}}
            ]},
            {"team": {"name": "Lanus"}, "formation": "4-2-3-1", "startXI": []}
        ]))
        .unwrap();
        let app = Dashboard::new(&a);
        let mut terminal = Terminal::new(TestBackend::new(100, 40)).unwrap();
        terminal.draw(|f| ui(f, &app)).unwrap();
        let buffer = terminal.backend().buffer().clone();
        let text: String = buffer.content().iter().map(|c| c.symbol()).collect();
        assert!(text.contains("Lineups"));
        assert!(text.contains("Huracan (4-4-2)"));
        assert!(text.contains("Lanus (4-2-3-1)"));
    }
}
