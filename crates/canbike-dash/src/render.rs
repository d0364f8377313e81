//! Terminal instrument cluster.

use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Gauge, Paragraph};

use crate::view::{DashboardView, FUEL_BAR_SEGMENTS};

const HELP: &str =
    "Up (hold) accelerate  Down (hold) decelerate  \u{2190}/\u{2192} indicators  Space headlight  R reset  D raw  Q quit";

const AMBER: Color = Color::Rgb(255, 200, 0);
const DIM: Color = Color::Rgb(70, 70, 70);

/// Draw one frame of the dashboard.
pub fn draw(frame: &mut Frame, view: &DashboardView) {
    let [title, dials, status, footer] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(6),
        Constraint::Length(3),
        Constraint::Length(2),
    ])
    .areas(frame.size());

    draw_title(frame, title, view);

    let [rpm_area, speed_area] =
        Layout::horizontal([Constraint::Percentage(50), Constraint::Percentage(50)]).areas(dials);
    draw_rpm(frame, rpm_area, view);
    draw_speed(frame, speed_area, view);

    draw_status(frame, status, view);
    draw_footer(frame, footer, view);
}

fn draw_title(frame: &mut Frame, area: Rect, view: &DashboardView) {
    let lamp = |lit: bool, glyph: &'static str| {
        let color = if lit { AMBER } else { DIM };
        Span::styled(glyph, Style::default().fg(color).add_modifier(Modifier::BOLD))
    };
    let line = Line::from(vec![
        lamp(view.left_lit, "\u{25c0}\u{25c0}"),
        Span::raw("  "),
        Span::styled(
            format!("CAN BIKE [{}]", view.source),
            Style::default().add_modifier(Modifier::BOLD),
        ),
        Span::raw("  "),
        lamp(view.right_lit, "\u{25b6}\u{25b6}"),
    ]);
    frame.render_widget(Paragraph::new(line).alignment(Alignment::Center), area);
}

fn draw_rpm(frame: &mut Frame, area: Rect, view: &DashboardView) {
    let gauge = Gauge::default()
        .block(Block::default().borders(Borders::ALL).title("RPM x1000"))
        .gauge_style(Style::default().fg(Color::Rgb(220, 60, 60)))
        .ratio(view.rpm_ratio())
        .label(format!("{}", view.rpm));
    frame.render_widget(gauge, area);
}

fn draw_speed(frame: &mut Frame, area: Rect, view: &DashboardView) {
    let gauge = Gauge::default()
        .block(Block::default().borders(Borders::ALL).title("SPEED km/h"))
        .gauge_style(Style::default().fg(Color::Rgb(30, 190, 220)))
        .ratio(view.speed_ratio())
        .label(format!("{:.1}", view.speed));
    frame.render_widget(gauge, area);
}

fn draw_status(frame: &mut Frame, area: Rect, view: &DashboardView) {
    let mut bars = String::new();
    for segment in 0..FUEL_BAR_SEGMENTS {
        bars.push(if segment < view.fuel_bars { '\u{2588}' } else { '\u{2591}' });
    }

    let brake_style = if view.brake {
        Style::default().fg(Color::White).bg(Color::Rgb(200, 40, 40))
    } else {
        Style::default().fg(DIM)
    };
    let headlight_style = if view.headlight {
        Style::default().fg(Color::Rgb(255, 255, 170)).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(DIM)
    };

    let line = Line::from(vec![
        Span::raw(format!("ODO: {:.3} km   ", view.odometer)),
        Span::raw(format!("THR: {}%   ", view.throttle_percent)),
        Span::raw(format!("FUEL {:.2} L ", view.fuel)),
        Span::styled(bars, Style::default().fg(Color::Rgb(40, 200, 80))),
        Span::raw("   "),
        Span::styled(" BRAKE ", brake_style),
        Span::raw("  "),
        Span::styled("HL", headlight_style),
    ]);
    frame.render_widget(
        Paragraph::new(line).block(Block::default().borders(Borders::ALL)),
        area,
    );
}

fn draw_footer(frame: &mut Frame, area: Rect, view: &DashboardView) {
    let first = match &view.diagnostic {
        Some(raw) => Line::from(format!("RAW: {raw}")),
        None => Line::from(Span::styled(
            format!(
                "lines {}  applied {}  faults {}  cmds {}/{} dropped",
                view.link.lines_received,
                view.link.lines_applied,
                view.link.read_faults,
                view.link.commands_sent,
                view.link.commands_dropped
            ),
            Style::default().fg(Color::DarkGray),
        )),
    };
    let help = Line::from(Span::styled(HELP, Style::default().fg(Color::Gray)));
    frame.render_widget(Paragraph::new(vec![first, help]), area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use canbike_scheduler::BlinkPhase;
    use canbike_telemetry::TelemetrySnapshot;
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;

    type TestResult = Result<(), Box<dyn std::error::Error>>;

    fn rendered(view: &DashboardView) -> Result<String, Box<dyn std::error::Error>> {
        let mut terminal = Terminal::new(TestBackend::new(140, 16))?;
        terminal.draw(|frame| draw(frame, view))?;
        let buffer = terminal.backend().buffer();
        Ok(buffer.content().iter().map(|cell| cell.symbol()).collect())
    }

    #[test]
    fn test_readouts_present() -> TestResult {
        let snap = TelemetrySnapshot {
            speed: 42.25,
            rpm: 3400,
            throttle: 128,
            odometer: 123.456,
            fuel: 3.2,
            fuel_bars: 2,
            ..TelemetrySnapshot::default()
        };
        let text = rendered(&DashboardView::build(&snap, BlinkPhase::On))?;
        assert!(text.contains("3400"));
        assert!(text.contains("42.2") || text.contains("42.3"));
        assert!(text.contains("ODO: 123.456 km"));
        assert!(text.contains("THR: 50%"));
        assert!(text.contains("FUEL 3.20 L"));
        assert!(text.contains("\u{2588}\u{2588}\u{2591}\u{2591}"));
        Ok(())
    }

    #[test]
    fn test_diagnostic_row_replaces_counters() -> TestResult {
        let view = DashboardView::build(&TelemetrySnapshot::default(), BlinkPhase::On);
        assert!(rendered(&view)?.contains("lines 0"));

        let view = view.with_diagnostic(Some("SPD:12,RPM:3400"));
        let text = rendered(&view)?;
        assert!(text.contains("RAW: SPD:12,RPM:3400"));
        assert!(!text.contains("lines 0"));
        Ok(())
    }

    #[test]
    fn test_out_of_range_values_do_not_panic() -> TestResult {
        let snap = TelemetrySnapshot {
            speed: 1.0e9,
            rpm: u32::MAX,
            fuel_bars: u8::MAX,
            ..TelemetrySnapshot::default()
        };
        rendered(&DashboardView::build(&snap, BlinkPhase::Off))?;
        Ok(())
    }

    #[test]
    fn test_tiny_terminal_does_not_panic() -> TestResult {
        let mut terminal = Terminal::new(TestBackend::new(10, 3))?;
        let view = DashboardView::build(&TelemetrySnapshot::default(), BlinkPhase::On);
        terminal.draw(|frame| draw(frame, &view))?;
        Ok(())
    }
}
