// Fixed-width cell rendering for table columns
use std::fmt;

use ratatui::style::Style;

#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Text(String),
    Number(f64),
    Integer(i64),
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Text(s) => write!(f, "{}", s),
            CellValue::Number(n) => write!(f, "{}", n),
            CellValue::Integer(n) => write!(f, "{}", n),
        }
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::Text(s.to_string())
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        CellValue::Text(s)
    }
}

impl From<f64> for CellValue {
    fn from(n: f64) -> Self {
        CellValue::Number(n)
    }
}

impl From<i64> for CellValue {
    fn from(n: i64) -> Self {
        CellValue::Integer(n)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatKind {
    /// Natural text of the value; the column is pinned to its header width.
    Auto,
    Str,
    /// Fixed-point with the given number of decimals.
    Fixed(usize),
}

/// Render `value` into at least `|width|` characters; negative widths left-justify.
pub fn format_cell(value: &CellValue, width: i32, kind: FormatKind) -> String {
    let text = match (kind, value) {
        (FormatKind::Fixed(precision), CellValue::Number(n)) => format!("{:.*}", precision, n),
        (FormatKind::Fixed(precision), CellValue::Integer(n)) => format!("{:.*}", precision, *n as f64),
        _ => value.to_string(),
    };
    let pad = width.unsigned_abs() as usize;
    if width < 0 {
        format!("{:<pad$}", text, pad = pad)
    } else {
        format!("{:>pad$}", text, pad = pad)
    }
}

#[derive(Debug, Clone)]
pub struct Column {
    pub header: String,
    /// Declared width; negative means left-justified.
    pub width: i32,
    pub format: FormatKind,
    pub style: Style,
}

impl Column {
    pub fn new(header: impl Into<String>, width: i32, format: FormatKind, style: Style) -> Self {
        Self { header: header.into(), width, format, style }
    }

    /// Fixed-point column with two decimals.
    pub fn fixed2(header: impl Into<String>, width: i32, style: Style) -> Self {
        Self::new(header, width, FormatKind::Fixed(2), style)
    }

    fn header_len(&self) -> usize {
        self.header.chars().count()
    }

    /// Screen width of the column: the declared width, widened to fit the header.
    pub fn effective_width(&self) -> usize {
        match self.format {
            FormatKind::Auto => self.header_len(),
            _ => (self.width.unsigned_abs() as usize).max(self.header_len()),
        }
    }

    fn signed_width(&self) -> i32 {
        let width = self.effective_width() as i32;
        if self.width < 0 && self.format != FormatKind::Auto { -width } else { width }
    }

    pub fn padded_header(&self) -> String {
        format!("{:<width$}", self.header, width = self.effective_width())
    }

    pub fn render(&self, value: &CellValue) -> String {
        format_cell(value, self.signed_width(), self.format)
    }
}
