use std::{io::{Stdout, Write, stdout}, time::Duration};

use anyhow::{bail, Context, Result};
use crossterm::{cursor, execute, queue, style, terminal};
use crossterm::event::{Event, KeyEvent, read, poll};
use crossterm::style::{Attribute, Color};
use crossterm::terminal::{ClearType, EnterAlternateScreen, LeaveAlternateScreen};
use tracing::debug;

use crate::config::GameConfig;
use crate::game::{GameStatus, Snapshot};
use crate::snake::Cell;

// Each text row carries two board rows: the upper one in the foreground of
// this glyph, the lower one in the background.
const HALF_BLOCK: char = '▀';

const BACKGROUND: Color = Color::Rgb { r: 250, g: 235, b: 215 };
const FOOD_COLOR: Color = Color::Rgb { r: 139, g: 69, b: 19 };
const SNAKE_COLOR: Color = Color::Black;
const MESSAGE_COLOR: Color = Color::Red;

const GAME_OVER: &str = "Game Over! Press R to Restart or Q to Quit";

/// What a single board tile currently shows.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Paint {
    Empty,
    Food,
    Snake,
}

impl Paint {
    fn color(self) -> Color {
        match self {
            Paint::Empty => BACKGROUND,
            Paint::Food => FOOD_COLOR,
            Paint::Snake => SNAKE_COLOR,
        }
    }
}

/// Where the board sits on the terminal, in text coordinates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    /// Top-left text cell of the board interior, inside the border.
    origin: (u16, u16),
    columns: u16,
    rows: u16,
    tile: i32,
}

impl Layout {
    pub fn fit(config: &GameConfig, term_size: (u16, u16)) -> Result<Self> {
        let columns = config.columns() as u16;
        let rows = config.rows() as u16;
        let text_rows = (rows + 1) / 2;
        let (need_w, need_h) = (columns + 2, text_rows + 2);
        let (width, height) = term_size;

        if width < need_w || height < need_h {
            bail!(
                "terminal is {}x{}, the board needs at least {}x{}",
                width, height, need_w, need_h
            );
        }

        let origin = ((width - need_w) / 2 + 1, (height - need_h) / 2 + 1);
        Ok(Layout { origin, columns, rows, tile: config.tile_size })
    }

    pub fn text_rows(&self) -> u16 {
        (self.rows + 1) / 2
    }

    pub fn cell_count(&self) -> usize {
        self.columns as usize * self.rows as usize
    }

    /// Buffer index of a board cell, `None` when it lies off the board.
    pub fn index_of(&self, cell: Cell) -> Option<usize> {
        if cell.x < 0 || cell.y < 0 {
            return None;
        }

        let (col, row) = (cell.x / self.tile, cell.y / self.tile);
        if col >= self.columns as i32 || row >= self.rows as i32 {
            return None;
        }

        Some(row as usize * self.columns as usize + col as usize)
    }

    /// Top-left of a `width`x`height` box centered on the board interior.
    pub fn centered(&self, width: u16, height: u16) -> (u16, u16) {
        (
            self.origin.0 + self.columns.saturating_sub(width) / 2,
            self.origin.1 + self.text_rows().saturating_sub(height) / 2,
        )
    }

    /// Tiles to paint for a snapshot. Nothing but background once the round is over.
    pub fn compose(&self, snap: &Snapshot) -> Vec<Paint> {
        let mut frame = vec![Paint::Empty; self.cell_count()];

        if snap.status == GameStatus::Running {
            if let Some(i) = self.index_of(snap.food) {
                frame[i] = Paint::Food;
            }
            for i in snap.snake.iter().filter_map(|pos| self.index_of(*pos)) {
                frame[i] = Paint::Snake;
            }
        }

        frame
    }
}

pub struct TermManager {
    stdout: Stdout,
    layout: Layout,
    screen: Vec<Paint>,
    current_msg: Option<Message>,
}

struct Message {
    top_left: (u16, u16),
    width: u16,
    height: u16,
}

impl TermManager {
    pub fn new(config: &GameConfig) -> Result<Self> {
        let size = terminal::size().context("Failed to read terminal size")?;
        let layout = Layout::fit(config, size)?;
        debug!(?size, ?layout, "board placed");

        let screen = vec![Paint::Empty; layout.cell_count()];
        Ok(TermManager { stdout: stdout(), layout, screen, current_msg: None })
    }

    pub fn setup(&mut self) -> Result<()> {
        execute!(self.stdout, EnterAlternateScreen).context("Failed to enter alternate screen")?;
        terminal::enable_raw_mode().context("Failed to enable raw mode")?;
        execute!(self.stdout, cursor::Hide, cursor::DisableBlinking)
            .context("Failed to hide cursor")?;

        self.clear()
    }

    pub fn restore(&mut self) -> Result<()> {
        terminal::disable_raw_mode().context("Failed to disable raw mode")?;
        execute!(
            self.stdout,
            style::ResetColor,
            cursor::Show,
            cursor::EnableBlinking,
            LeaveAlternateScreen
        )
        .context("Failed to leave alternate screen")?;
        Ok(())
    }

    /// Waits up to `timeout` for input, then drains whatever else is queued.
    pub fn poll_key_events(&self, timeout: Duration) -> Result<Vec<KeyEvent>> {
        let mut events = vec![];

        if !poll(timeout).context("Failed to poll terminal events")? {
            return Ok(events);
        }

        loop {
            match read().context("Failed to read terminal event")? {
                Event::Key(ev) => events.push(ev),
                other => debug!(event = ?other, "ignored terminal event"),
            }

            if !poll(Duration::from_millis(0)).context("Failed to poll terminal events")? {
                return Ok(events);
            }
        }
    }

    /// Wipes the terminal, frames the board and paints every tile as background.
    pub fn clear(&mut self) -> Result<()> {
        execute!(self.stdout, style::ResetColor, terminal::Clear(ClearType::All))
            .context("Failed to clear terminal")?;
        self.current_msg = None;
        self.screen = vec![Paint::Empty; self.layout.cell_count()];

        self.draw_borders()?;
        for row in 0..self.layout.text_rows() {
            for col in 0..self.layout.columns {
                self.paint_pair(col, row)?;
            }
        }

        self.flush()
    }

    pub fn render(&mut self, snap: &Snapshot) -> Result<()> {
        if snap.status == GameStatus::Running && self.has_message() {
            self.hide_message()?;
        }

        let frame = self.layout.compose(snap);
        self.paint_changes(frame)?;

        if snap.status == GameStatus::Over && !self.has_message() {
            let score = format!("Score: {}", snap.score);
            self.show_message(&[GAME_OVER, score.as_str()])?;
        }

        self.flush()
    }

    pub fn show_message(&mut self, lines: &[&str]) -> Result<()> {
        if self.has_message() {
            self.hide_message()?;
        }

        let msg_height = (lines.len() + 2) as u16;
        let msg_width = (lines.iter().map(|x| x.chars().count()).max().unwrap_or(0) + 4) as u16;
        let top_left = self.layout.centered(msg_width, msg_height);

        queue!(
            self.stdout,
            style::SetBackgroundColor(BACKGROUND),
            style::SetForegroundColor(MESSAGE_COLOR),
            style::SetAttribute(Attribute::Bold)
        )?;

        let blank = " ".repeat(msg_width as usize);
        for y in [top_left.1, top_left.1 + msg_height - 1].iter() {
            queue!(self.stdout, cursor::MoveTo(top_left.0, *y), style::Print(&blank))?;
        }

        for (i, line) in lines.iter().enumerate() {
            let padded_line = format!("{line: ^width$}", line = line, width = msg_width as usize);
            let y = top_left.1 + i as u16 + 1;
            queue!(self.stdout, cursor::MoveTo(top_left.0, y), style::Print(padded_line))?;
        }

        queue!(self.stdout, style::SetAttribute(Attribute::Reset), style::ResetColor)?;

        self.current_msg = Some(Message { top_left, width: msg_width, height: msg_height });
        self.flush()
    }

    /// Puts back the tiles the message box was covering.
    pub fn hide_message(&mut self) -> Result<()> {
        let msg = match self.current_msg.take() {
            Some(msg) => msg,
            None => return Ok(()),
        };

        let (origin_x, origin_y) = self.layout.origin;
        for y in msg.top_left.1..msg.top_left.1 + msg.height {
            for x in msg.top_left.0..msg.top_left.0 + msg.width {
                let (col, row) = (x.wrapping_sub(origin_x), y.wrapping_sub(origin_y));
                if col < self.layout.columns && row < self.layout.text_rows() {
                    self.paint_pair(col, row)?;
                }
            }
        }

        self.flush()
    }

    pub fn has_message(&self) -> bool {
        self.current_msg.is_some()
    }

    pub fn flush(&mut self) -> Result<()> {
        self.stdout.flush().context("Failed to flush terminal")
    }

    ///////////////////////////////////////////////////////////////////////////

    fn draw_borders(&mut self) -> Result<()> {
        let (left, top) = (self.layout.origin.0 - 1, self.layout.origin.1 - 1);
        let right = left + self.layout.columns + 1;
        let bottom = top + self.layout.text_rows() + 1;

        for x in left..=right {
            let ch = if x == left || x == right {'+'} else {'-'};
            queue!(self.stdout, cursor::MoveTo(x, top), style::Print(ch))?;
            queue!(self.stdout, cursor::MoveTo(x, bottom), style::Print(ch))?;
        }

        for y in top + 1..bottom {
            queue!(self.stdout, cursor::MoveTo(left, y), style::Print('|'))?;
            queue!(self.stdout, cursor::MoveTo(right, y), style::Print('|'))?;
        }

        Ok(())
    }

    /// Repaints only the text cells whose upper or lower tile changed.
    fn paint_changes(&mut self, frame: Vec<Paint>) -> Result<()> {
        let old = std::mem::replace(&mut self.screen, frame);
        let columns = self.layout.columns as usize;

        for row in 0..self.layout.text_rows() {
            for col in 0..self.layout.columns {
                let upper = 2 * row as usize * columns + col as usize;
                let lower = upper + columns;
                let changed = old[upper] != self.screen[upper]
                    || (lower < old.len() && old[lower] != self.screen[lower]);

                if changed {
                    self.paint_pair(col, row)?;
                }
            }
        }

        Ok(())
    }

    fn paint_pair(&mut self, col: u16, row: u16) -> Result<()> {
        let columns = self.layout.columns as usize;
        let upper = 2 * row as usize * columns + col as usize;
        let fg = self.screen[upper].color();
        let bg = self.screen.get(upper + columns).copied().unwrap_or(Paint::Empty).color();
        let (x, y) = (self.layout.origin.0 + col, self.layout.origin.1 + row);

        queue!(
            self.stdout,
            cursor::MoveTo(x, y),
            style::SetForegroundColor(fg),
            style::SetBackgroundColor(bg),
            style::Print(HALF_BLOCK)
        )?;
        Ok(())
    }
}
