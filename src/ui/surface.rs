//! Cell-addressed drawing surfaces.
//!
//! A [`Panel`] is an off-screen window: writes land in its own ratatui buffer and
//! only reach the terminal when a [`Screen`] commits the whole set of panels.

use std::io;

use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::Span;
use ratatui::widgets::{Block, Borders, Widget};

/// Cell-addressed text output with per-write attributes.
pub trait Surface {
    /// Write `text` starting at (`col`, `row`), clipped to the surface.
    fn write_cell(&mut self, col: u16, row: u16, text: &str, style: Style);

    /// Blank the whole surface, keeping its decoration.
    fn clear_region(&mut self);
}

/// Double-buffered output: panels are drawn off-screen, then flushed together.
pub trait Screen {
    fn commit(&mut self, panels: &[&Panel]) -> io::Result<()>;
}

#[derive(Debug, Clone)]
pub struct Panel {
    area: Rect,
    title: String,
    boxed: bool,
    buffer: Buffer,
}

impl Panel {
    pub fn new(area: Rect, boxed: bool, title: impl Into<String>) -> Self {
        let mut panel = Self { area, title: title.into(), boxed, buffer: Buffer::empty(area) };
        panel.draw_frame();
        panel
    }

    pub fn area(&self) -> Rect {
        self.area
    }

    pub fn width(&self) -> u16 {
        self.area.width
    }

    pub fn height(&self) -> u16 {
        self.area.height
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    fn draw_frame(&mut self) {
        if self.boxed {
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().add_modifier(Modifier::DIM))
                .render(self.area, &mut self.buffer);
        }
        if !self.title.is_empty() {
            let title = Span::styled(self.title.clone(), Style::default().add_modifier(Modifier::BOLD));
            self.buffer.set_span(self.area.x, self.area.y, &title, self.area.width);
        }
    }

    /// Blank one row between the side borders.
    pub fn blank_line(&mut self, row: u16) {
        let (first, last) = if self.boxed { (1, self.width().saturating_sub(1)) } else { (0, self.width()) };
        if last > first {
            let blank = " ".repeat((last - first) as usize);
            self.write_cell(first, row, &blank, Style::default());
        }
    }

    /// Text of one row, mostly for assertions and debugging.
    pub fn line(&self, row: u16) -> String {
        if row >= self.height() {
            return String::new();
        }
        (0..self.width())
            .map(|col| self.buffer.get(self.area.x + col, self.area.y + row).symbol())
            .collect()
    }

    pub fn style_at(&self, col: u16, row: u16) -> Style {
        if col >= self.width() || row >= self.height() {
            return Style::default();
        }
        self.buffer.get(self.area.x + col, self.area.y + row).style()
    }
}

impl Surface for Panel {
    fn write_cell(&mut self, col: u16, row: u16, text: &str, style: Style) {
        // Interior rows of a boxed panel stop short of the right border
        let limit = if self.boxed && row > 0 && row + 1 < self.height() { self.width().saturating_sub(1) } else { self.width() };
        if col >= limit || row >= self.height() {
            return;
        }
        let room = (limit - col) as usize;
        // Replace, not merge with, whatever attributes the cells had before
        let style = Style::reset().patch(style);
        self.buffer.set_stringn(self.area.x + col, self.area.y + row, text, room, style);
    }

    fn clear_region(&mut self) {
        self.buffer.reset();
        self.draw_frame();
    }
}

impl Widget for &Panel {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let visible = area.intersection(self.area).intersection(buf.area);
        for y in visible.top()..visible.bottom() {
            for x in visible.left()..visible.right() {
                *buf.get_mut(x, y) = self.buffer.get(x, y).clone();
            }
        }
    }
}
