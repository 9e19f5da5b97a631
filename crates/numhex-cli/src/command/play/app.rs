use std::cell::Cell;

use crossterm::event::{
    Event, KeyCode, KeyEvent, KeyEventKind, MouseButton, MouseEvent, MouseEventKind,
};
use numhex_engine::{
    Badge, CellId, ExtendRejection, MIN_PATH_LEN, PathOutcome, PlayerStats, SessionController,
    SessionEvent, SessionStatus, TutorialFlag, TutorialStep,
};
use ratatui::{
    Frame,
    layout::{Constraint, Flex, Layout, Margin, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Text},
    widgets::{Block, Clear, Padding, Paragraph, Wrap},
};

use crate::{
    insight::InsightWorker,
    tui::{App, Runtime},
    view::{GridDisplay, GridLayout, StatsDisplay, TargetsDisplay},
};

const POPUP_WIDTH: u16 = 56;

#[derive(Debug, Clone)]
struct Message {
    text: String,
    style: Style,
}

impl Message {
    fn info(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            style: Style::default().fg(Color::Cyan),
        }
    }

    fn good(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            style: Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
        }
    }

    fn bad(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            style: Style::default().fg(Color::Red),
        }
    }
}

/// Interactive single-player screen.
#[derive(Debug)]
pub struct PlayApp<F> {
    session: SessionController,
    flag: F,
    insight: InsightWorker,
    cursor: CellId,
    dragging: bool,
    message: Option<Message>,
    /// Where the grid was last drawn, for mouse hit-testing.
    grid_area: Cell<Option<Rect>>,
    is_exiting: bool,
}

impl<F> PlayApp<F>
where
    F: TutorialFlag,
{
    pub fn new(session: SessionController, flag: F, insight: InsightWorker) -> Self {
        Self {
            session,
            flag,
            insight,
            cursor: CellId::new(0, 0),
            dragging: false,
            message: None,
            grid_area: Cell::new(None),
            is_exiting: false,
        }
    }

    pub fn session(&self) -> &SessionController {
        &self.session
    }

    fn handle_key(&mut self, key: KeyEvent) {
        if self.session.tutorial().is_some() {
            match key.code {
                KeyCode::Enter | KeyCode::Char(' ') | KeyCode::Right => {
                    self.session.advance_tutorial(&mut self.flag);
                }
                KeyCode::Char('q') => self.is_exiting = true,
                _ => {}
            }
            return;
        }

        match self.session.state().status() {
            SessionStatus::Idle => match key.code {
                KeyCode::Char('s') | KeyCode::Enter => self.request_start(),
                KeyCode::Char('t') => self.session.open_tutorial(),
                KeyCode::Char('q') | KeyCode::Esc => self.is_exiting = true,
                _ => {}
            },
            SessionStatus::Playing => match key.code {
                KeyCode::Up => self.move_cursor(-1, 0),
                KeyCode::Down => self.move_cursor(1, 0),
                KeyCode::Left => self.move_cursor(0, -1),
                KeyCode::Right => self.move_cursor(0, 1),
                KeyCode::Char(' ') => self.select_cursor(),
                KeyCode::Enter => self.finish_path(),
                KeyCode::Esc => self.session.cancel_path(),
                KeyCode::Char('r') => self.restart(),
                KeyCode::Char('q') => self.session.quit(),
                _ => {}
            },
            SessionStatus::LevelComplete => match key.code {
                KeyCode::Char('n') | KeyCode::Enter => {
                    if let Err(e) = self.session.next_level() {
                        log::warn!("{e}");
                    }
                }
                KeyCode::Char('r') => self.restart(),
                KeyCode::Char('q') => self.session.quit(),
                _ => {}
            },
            SessionStatus::GameOver => match key.code {
                KeyCode::Char('r') | KeyCode::Enter => self.restart(),
                KeyCode::Char('q') => self.session.quit(),
                _ => {}
            },
        }
    }

    fn handle_mouse(&mut self, mouse: MouseEvent) {
        let cell = self.cell_at(mouse.column, mouse.row);
        match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) => {
                let Some(id) = cell else {
                    return;
                };
                self.cursor = id;
                self.session.cancel_path();
                match self.session.start_path(id) {
                    Ok(()) => self.dragging = true,
                    Err(rejection) => self.reject(rejection),
                }
            }
            MouseEventKind::Drag(MouseButton::Left) if self.dragging => {
                let Some(id) = cell else {
                    return;
                };
                let path = self.session.path();
                if path.last() == Some(id) || path.contains(id) {
                    return;
                }
                self.cursor = id;
                // sweeping across cells that do not fit is part of dragging
                if let Err(rejection) = self.session.extend_path(id) {
                    log::debug!("drag over {id} ignored: {rejection}");
                }
            }
            MouseEventKind::Up(MouseButton::Left) if self.dragging => {
                self.dragging = false;
                self.finish_path();
            }
            _ => {}
        }
    }

    fn cell_at(&self, x: u16, y: u16) -> Option<CellId> {
        let area = self.grid_area.get()?;
        let grid = self.session.grid()?;
        GridLayout::new(area, grid, self.session.config().grid.topology).cell_at(x, y)
    }

    fn move_cursor(&mut self, d_row: i8, d_col: i8) {
        let Some(next) = self.cursor.offset(d_row, d_col) else {
            return;
        };
        if self.session.grid().is_some_and(|grid| grid.contains(next)) {
            self.cursor = next;
        }
    }

    fn select_cursor(&mut self) {
        let result = if self.session.path().is_empty() {
            self.session.start_path(self.cursor)
        } else {
            self.session.extend_path(self.cursor)
        };
        if let Err(rejection) = result {
            self.reject(rejection);
        }
    }

    fn reject(&mut self, rejection: ExtendRejection) {
        if rejection != ExtendRejection::InputLocked {
            self.message = Some(Message::bad(rejection.to_string()));
        }
    }

    fn finish_path(&mut self) {
        if self.session.finish_path() == PathOutcome::Discarded {
            self.message = Some(Message::info(format!(
                "a path needs at least {MIN_PATH_LEN} cells"
            )));
        }
    }

    fn request_start(&mut self) {
        match self.session.request_start(&self.flag) {
            Ok(decision) => log::debug!("start requested: {decision:?}"),
            Err(e) => log::warn!("{e}"),
        }
    }

    fn restart(&mut self) {
        if let Err(e) = self.session.restart() {
            log::warn!("{e}");
        }
    }

    fn on_event(&mut self, event: SessionEvent) {
        let message = match event {
            SessionEvent::Started => {
                self.cursor = CellId::new(0, 0);
                self.dragging = false;
                Message::info("find every target before the clock runs out")
            }
            SessionEvent::TargetMatched {
                value,
                points,
                streak,
            } => Message::good(format!("{value}! +{points} (streak x{streak})")),
            SessionEvent::Missed { value: Some(value) } => {
                Message::bad(format!("{value} is not a target"))
            }
            SessionEvent::Missed { value: None } => Message::bad("that path has no whole value"),
            SessionEvent::VictoryLocked => Message::good("all targets found!"),
            SessionEvent::LevelStarted { level } => Message::info(format!("level {level}")),
            SessionEvent::GameOver => Message::bad("time is up"),
            SessionEvent::Quit => {
                self.dragging = false;
                return;
            }
            _ => return,
        };
        self.message = Some(message);
    }

    fn help_text(&self) -> &'static str {
        if self.session.tutorial().is_some() {
            return "Enter/Space/→ (Next) | Q (Exit)";
        }
        match self.session.state().status() {
            SessionStatus::Idle => "S/Enter (Start) | T (Tutorial) | Q (Exit)",
            SessionStatus::Playing => {
                "Mouse drag or ←↑↓→ + Space (Select) | Enter (Submit) | Esc (Clear) | R (Restart) | Q (Quit)"
            }
            SessionStatus::LevelComplete => "N/Enter (Next Level) | R (Restart) | Q (Quit)",
            SessionStatus::GameOver => "R/Enter (Play Again) | Q (Quit)",
        }
    }

    fn draw_board(&self, frame: &mut Frame, targets_area: Rect, main_area: Rect) {
        let Some(grid) = self.session.grid() else {
            self.grid_area.set(None);
            return;
        };
        let state = self.session.state();
        frame.render_widget(TargetsDisplay::new(state.level_targets()), targets_area);

        let [grid_area, stats_area] = Layout::horizontal([
            Constraint::Fill(1),
            Constraint::Length(StatsDisplay::width()),
        ])
        .spacing(2)
        .areas(main_area.inner(Margin::new(1, 1)));
        self.grid_area.set(Some(grid_area));

        let mut display = GridDisplay::new(grid, self.session.config().grid.topology)
            .path(self.session.path().ids())
            .dimmed(self.session.is_input_locked());
        if state.status().is_playing() {
            display = display.cursor(self.cursor);
        }
        frame.render_widget(&display, grid_area);

        let [stats_area] = Layout::vertical([Constraint::Length(StatsDisplay::height())])
            .areas(stats_area);
        frame.render_widget(StatsDisplay::new(state), stats_area);
    }

    fn overlay(&self) -> Option<(String, Vec<Line<'static>>)> {
        if let Some(tutorial) = self.session.tutorial() {
            let step = tutorial.step();
            let title = format!(
                " {step} ({}/{}) ",
                step.index() + 1,
                TutorialStep::ALL.len()
            );
            return Some((title, vec![Line::raw(step.description())]));
        }

        let state = self.session.state();
        let insight = || {
            let text = self.session.insight().unwrap_or("thinking...");
            Line::styled(
                text.to_owned(),
                Style::default().add_modifier(Modifier::ITALIC),
            )
        };
        match state.status() {
            SessionStatus::Idle => Some((
                " NUMHEX ".to_owned(),
                vec![
                    Line::raw("Chain numbers and operators to hit every target."),
                    Line::raw(""),
                    Line::raw("Press S to start or T for the tutorial."),
                ],
            )),
            SessionStatus::Playing => None,
            SessionStatus::LevelComplete => Some((
                " Level cleared ".to_owned(),
                vec![
                    Line::raw(format!(
                        "Score {} | IQ {:.0} | {}s carried over",
                        state.total_score(),
                        state.estimated_iq(),
                        state.time_left()
                    )),
                    Line::raw(""),
                    insight(),
                    Line::raw(""),
                    Line::raw(format!("Press N for level {}.", state.level())),
                ],
            )),
            SessionStatus::GameOver => {
                let mut lines = vec![
                    Line::raw(format!(
                        "Final score {} | Level {} | IQ {:.0}",
                        state.total_score(),
                        state.level(),
                        state.estimated_iq()
                    )),
                    Line::raw(""),
                    insight(),
                    Line::raw(""),
                ];
                let badges = Badge::unlocked(&PlayerStats::from(state));
                if badges.is_empty() {
                    lines.push(Line::raw("No badges yet."));
                }
                lines.extend(badges.into_iter().map(|badge| {
                    Line::styled(
                        format!("★ {badge}: {}", badge.description()),
                        Style::default().fg(Color::Yellow),
                    )
                }));
                Some((" Game over ".to_owned(), lines))
            }
        }
    }
}

fn popup_area(area: Rect, height: u16) -> Rect {
    let [area] = Layout::horizontal([Constraint::Length(POPUP_WIDTH)])
        .flex(Flex::Center)
        .areas(area);
    let [area] = Layout::vertical([Constraint::Length(height)])
        .flex(Flex::Center)
        .areas(area);
    area
}

impl<F> App for PlayApp<F>
where
    F: TutorialFlag,
{
    fn init(&mut self, runtime: &mut Runtime) {
        runtime.set_tick_rate(self.session.config().session.tick_rate);
    }

    fn should_exit(&self) -> bool {
        self.is_exiting
    }

    fn handle_event(&mut self, _runtime: &mut Runtime, event: &Event) {
        match event {
            Event::Key(key) if key.kind == KeyEventKind::Press => self.handle_key(*key),
            Event::Mouse(mouse) => self.handle_mouse(*mouse),
            _ => {}
        }
    }

    fn update(&mut self, _runtime: &mut Runtime) {
        self.session.tick();
        for request in self.session.take_insight_requests() {
            self.insight.submit(request);
        }
        for (ticket, text) in self.insight.answers() {
            self.session.deliver_insight(ticket, text);
        }
        for event in self.session.drain_events() {
            self.on_event(event);
        }
    }

    fn draw(&self, frame: &mut Frame) {
        let [title_area, targets_area, main_area, message_area, help_area] =
            Layout::vertical([
                Constraint::Length(1),
                Constraint::Length(1),
                Constraint::Fill(1),
                Constraint::Length(1),
                Constraint::Length(1),
            ])
            .areas(frame.area());

        frame.render_widget(
            Line::styled(
                "NUMHEX",
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            )
            .centered(),
            title_area,
        );
        self.draw_board(frame, targets_area, main_area);
        if let Some(message) = &self.message {
            frame.render_widget(
                Line::styled(message.text.as_str(), message.style).centered(),
                message_area,
            );
        }
        frame.render_widget(
            Text::from(self.help_text())
                .style(Style::default().fg(Color::DarkGray))
                .centered(),
            help_area,
        );

        if let Some((title, lines)) = self.overlay() {
            let height = u16::try_from(lines.len())
                .unwrap_or(u16::MAX)
                .saturating_add(4);
            let area = popup_area(frame.area(), height);
            let paragraph = Paragraph::new(lines)
                .wrap(Wrap { trim: true })
                .block(Block::bordered().title(title).padding(Padding::horizontal(1)));
            frame.render_widget(Clear, area);
            frame.render_widget(paragraph, area);
        }
    }
}
