use std::iter;

use numhex_engine::{GameState, LevelTargets};
use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::Widget,
};

/// One line listing the targets of the level, completed ones struck in green.
#[derive(Debug)]
pub struct TargetsDisplay<'a> {
    targets: &'a LevelTargets,
}

impl<'a> TargetsDisplay<'a> {
    pub fn new(targets: &'a LevelTargets) -> Self {
        Self { targets }
    }
}

impl Widget for TargetsDisplay<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let spans = self.targets.as_slice().iter().flat_map(|target| {
            let span = if target.is_completed() {
                Span::styled(
                    format!("✓{}", target.value()),
                    Style::default()
                        .fg(Color::Green)
                        .add_modifier(Modifier::CROSSED_OUT),
                )
            } else {
                Span::styled(
                    format!(" {}", target.value()),
                    Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
                )
            };
            [span, Span::raw("  ")]
        });
        Line::from_iter(iter::once(Span::raw("TARGETS: ")).chain(spans))
            .centered()
            .render(area, buf);
    }
}

#[derive(Clone, Copy)]
enum Row {
    Empty,
    LabelValue(&'static str, &'static dyn Fn(&GameState) -> String),
}

const ROWS: &[Row] = &[
    Row::LabelValue("LEVEL:", &|state| state.level().to_string()),
    Row::LabelValue("SCORE:", &|state| state.total_score().to_string()),
    Row::LabelValue("STREAK:", &|state| format!("x{}", state.streak())),
    Row::Empty,
    Row::LabelValue("TIME:", &|state| {
        let secs = state.time_left();
        format!("{}:{:0>2}", secs / 60, secs % 60)
    }),
    Row::LabelValue("IQ:", &|state| format!("{:.0}", state.estimated_iq())),
];

/// Side panel with level, score, streak, countdown and IQ estimate.
#[derive(Debug)]
pub struct StatsDisplay<'a> {
    state: &'a GameState,
}

impl<'a> StatsDisplay<'a> {
    pub fn new(state: &'a GameState) -> Self {
        Self { state }
    }

    pub fn width() -> u16 {
        18
    }

    pub fn height() -> u16 {
        u16::try_from(ROWS.len()).unwrap_or(u16::MAX)
    }
}

impl Widget for StatsDisplay<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let rows_areas =
            Layout::vertical((0..ROWS.len()).map(|_| Constraint::Length(1))).split(area);
        let low_time = self.state.time_left() <= 10;

        for (row, area) in iter::zip(ROWS.iter().copied(), rows_areas.iter().copied()) {
            let Row::LabelValue(label, value) = row else {
                continue;
            };
            let style = if low_time && label == "TIME:" {
                Style::default().fg(Color::Red).add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };
            let [label_area, value_area] =
                area.layout(&Layout::horizontal([Constraint::Fill(1), Constraint::Fill(1)]));
            Line::styled(label, style).left_aligned().render(label_area, buf);
            Line::styled(value(self.state), style)
                .right_aligned()
                .render(value_area, buf);
        }
    }
}
