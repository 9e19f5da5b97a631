use numhex_engine::{CellId, CellValue, Grid, Topology};
use ratatui::{
    buffer::Buffer,
    layout::{Position, Rect},
    style::{Color, Modifier, Style},
    text::Span,
    widgets::Widget,
};

const CELL_WIDTH: u16 = 5;
const CELL_HEIGHT: u16 = 2;

/// Screen geometry of a grid: where each cell is drawn and which cell is
/// under a terminal position.
///
/// On a hex-offset board odd rows are drawn half a cell to the right.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridLayout {
    origin: Position,
    rows: u8,
    cols: u8,
    shifted: bool,
}

impl GridLayout {
    pub fn new(area: Rect, grid: &Grid, topology: Topology) -> Self {
        let shifted = topology == Topology::HexOffset;
        let width = Self::width_of(grid.cols(), shifted);
        let x = area.x + area.width.saturating_sub(width) / 2;
        Self {
            origin: Position::new(x, area.y),
            rows: grid.rows(),
            cols: grid.cols(),
            shifted,
        }
    }

    fn width_of(cols: u8, shifted: bool) -> u16 {
        u16::from(cols) * CELL_WIDTH + if shifted { CELL_WIDTH / 2 } else { 0 }
    }

    pub fn height_of(grid: &Grid) -> u16 {
        u16::from(grid.rows()) * CELL_HEIGHT
    }

    fn row_shift(&self, row: u8) -> u16 {
        if self.shifted && row % 2 == 1 {
            CELL_WIDTH / 2
        } else {
            0
        }
    }

    pub fn cell_rect(&self, id: CellId) -> Rect {
        Rect::new(
            self.origin.x + self.row_shift(id.row()) + u16::from(id.col()) * CELL_WIDTH,
            self.origin.y + u16::from(id.row()) * CELL_HEIGHT,
            CELL_WIDTH,
            1,
        )
    }

    /// Cell drawn at terminal position `(x, y)`, if any.
    pub fn cell_at(&self, x: u16, y: u16) -> Option<CellId> {
        let dy = y.checked_sub(self.origin.y)?;
        if dy % CELL_HEIGHT != 0 {
            return None;
        }
        let row = u8::try_from(dy / CELL_HEIGHT).ok()?;
        if row >= self.rows {
            return None;
        }
        let dx = x.checked_sub(self.origin.x + self.row_shift(row))?;
        let col = u8::try_from(dx / CELL_WIDTH).ok()?;
        (col < self.cols).then(|| CellId::new(row, col))
    }
}

#[derive(Debug)]
pub struct GridDisplay<'a> {
    grid: &'a Grid,
    topology: Topology,
    path: &'a [CellId],
    cursor: Option<CellId>,
    dimmed: bool,
}

impl<'a> GridDisplay<'a> {
    pub fn new(grid: &'a Grid, topology: Topology) -> Self {
        Self {
            grid,
            topology,
            path: &[],
            cursor: None,
            dimmed: false,
        }
    }

    pub fn path(self, path: &'a [CellId]) -> Self {
        Self { path, ..self }
    }

    pub fn cursor(self, cursor: CellId) -> Self {
        Self {
            cursor: Some(cursor),
            ..self
        }
    }

    pub fn dimmed(self, dimmed: bool) -> Self {
        Self { dimmed, ..self }
    }

    fn cell_style(&self, id: CellId, value: CellValue) -> Style {
        let mut style = match value {
            CellValue::Number(_) => Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
            CellValue::Operator(_) => Style::default().fg(Color::Yellow),
        };
        if self.path.last() == Some(&id) {
            style = style.bg(Color::Cyan).fg(Color::Black);
        } else if self.path.contains(&id) {
            style = style.bg(Color::Blue);
        }
        if self.cursor == Some(id) {
            style = style.add_modifier(Modifier::REVERSED);
        }
        if self.dimmed {
            style = style.add_modifier(Modifier::DIM);
        }
        style
    }
}

impl Widget for GridDisplay<'_> {
    fn render(self, area: Rect, buf: &mut Buffer)
    where
        Self: Sized,
    {
        Widget::render(&self, area, buf);
    }
}

impl Widget for &GridDisplay<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let layout = GridLayout::new(area, self.grid, self.topology);
        for cell in self.grid.cells() {
            let rect = layout.cell_rect(cell.id()).intersection(area);
            if rect.is_empty() {
                continue;
            }
            let width = usize::from(CELL_WIDTH);
            let text = format!("{:^width$}", cell.value().to_string());
            Span::styled(text, self.cell_style(cell.id(), cell.value())).render(rect, buf);
        }
    }
}
