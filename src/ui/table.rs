use std::fmt::Debug;
use std::hash::Hash;

use ahash::AHashMap as HashMap;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use thiserror::Error;
use tracing::trace;

use crate::ui::format::{CellValue, Column};
use crate::ui::surface::{Panel, Surface};

/// First screen column of the first table column.
const LEFT_MARGIN: u16 = 2;
/// Blank columns between adjacent table columns.
const COLUMN_GAP: u16 = 2;
const HEADER_ROW: u16 = 1;
const FIRST_DATA_ROW: u16 = 2;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TableError {
    #[error("no row registered for key {key}")]
    UnknownRow { key: String },
    #[error("column {column} out of range, table has {columns} columns")]
    ColumnOutOfRange { column: usize, columns: usize },
    #[error("row {key} has {got} values, table has {expected} columns")]
    ValueCount { key: String, got: usize, expected: usize },
}

#[derive(Debug, Clone, PartialEq)]
pub struct TableRow {
    /// Screen slot of the row; dense over `0..row_count`.
    pub display_index: usize,
    pub values: Vec<CellValue>,
    pub styles: Vec<Style>,
}

/// Keyed rows rendered into a boxed panel with a fixed column layout.
#[derive(Debug)]
pub struct Table<K> {
    panel: Panel,
    columns: Vec<Column>,
    offsets: Vec<u16>,
    max_rows: usize,
    rows: HashMap<K, TableRow>,
}

impl<K> Table<K>
where
    K: Eq + Hash + Clone + Debug,
{
    pub fn new(area: Rect, title: &str, columns: Vec<Column>) -> Self {
        let mut panel = Panel::new(area, true, format!("  {}", title));
        let header_style = Style::default().add_modifier(Modifier::UNDERLINED | Modifier::BOLD);

        let mut offsets = Vec::with_capacity(columns.len());
        let mut col = LEFT_MARGIN;
        for column in &columns {
            offsets.push(col);
            panel.write_cell(col, HEADER_ROW, &format!("{}  ", column.padded_header()), header_style);
            col += column.effective_width() as u16 + COLUMN_GAP;
        }

        let max_rows = area.height.saturating_sub(3) as usize;
        Self { panel, columns, offsets, max_rows, rows: HashMap::new() }
    }

    pub fn panel(&self) -> &Panel {
        &self.panel
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn contains(&self, key: &K) -> bool {
        self.rows.contains_key(key)
    }

    /// Number of rows that fit on screen; rows beyond it keep their index but are not drawn.
    pub fn max_rows(&self) -> usize {
        self.max_rows
    }

    pub fn display_index(&self, key: &K) -> Option<usize> {
        self.rows.get(key).map(|row| row.display_index)
    }

    pub fn row(&self, key: &K) -> Option<&TableRow> {
        self.rows.get(key)
    }

    /// Insert or overwrite the values of `key`'s row and redraw it. Returns the row's display index.
    pub fn upsert_row(&mut self, key: K, values: Vec<CellValue>) -> Result<usize, TableError> {
        if values.len() != self.columns.len() {
            return Err(TableError::ValueCount {
                key: format!("{:?}", key),
                got: values.len(),
                expected: self.columns.len(),
            });
        }

        let next_index = self.rows.len();
        let columns = &self.columns;
        let row = self.rows.entry(key).or_insert_with(|| {
            trace!(display_index = next_index, "Allocating table row");
            TableRow {
                display_index: next_index,
                values: Vec::new(),
                styles: columns.iter().map(|c| c.style).collect(),
            }
        });
        row.values = values;

        let display_index = row.display_index;
        render_row(&mut self.panel, &self.columns, &self.offsets, self.max_rows, row);
        Ok(display_index)
    }

    /// Override the style of one cell and redraw it. The row must already exist.
    pub fn set_cell_style(&mut self, key: &K, column: usize, style: Style) -> Result<(), TableError> {
        if column >= self.columns.len() {
            return Err(TableError::ColumnOutOfRange { column, columns: self.columns.len() });
        }
        let row = self
            .rows
            .get_mut(key)
            .ok_or_else(|| TableError::UnknownRow { key: format!("{:?}", key) })?;
        row.styles[column] = style;

        let row: &TableRow = row;
        if let Some(value) = row.values.get(column) {
            if row.display_index < self.max_rows {
                let text = self.columns[column].render(value);
                self.panel.write_cell(self.offsets[column], FIRST_DATA_ROW + row.display_index as u16, &text, style);
            }
        }
        Ok(())
    }

    /// Remove `key`'s row and close the gap by moving every later row up one slot.
    pub fn delete_row(&mut self, key: &K) -> Result<(), TableError> {
        let removed = self
            .rows
            .remove(key)
            .ok_or_else(|| TableError::UnknownRow { key: format!("{:?}", key) })?;

        for row in self.rows.values_mut() {
            if row.display_index > removed.display_index {
                row.display_index -= 1;
                render_row(&mut self.panel, &self.columns, &self.offsets, self.max_rows, row);
            }
        }

        let vacated = self.rows.len();
        if vacated < self.max_rows {
            self.panel.blank_line(FIRST_DATA_ROW + vacated as u16);
        }
        trace!(removed = removed.display_index, remaining = self.rows.len(), "Deleted table row");
        Ok(())
    }
}

fn render_row(panel: &mut Panel, columns: &[Column], offsets: &[u16], max_rows: usize, row: &TableRow) {
    if row.display_index >= max_rows {
        return;
    }
    let screen_row = FIRST_DATA_ROW + row.display_index as u16;
    panel.blank_line(screen_row);
    for ((column, offset), (value, style)) in columns.iter().zip(offsets).zip(row.values.iter().zip(&row.styles)) {
        panel.write_cell(*offset, screen_row, &column.render(value), *style);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::format::FormatKind;
    use ratatui::style::Color;

    fn table(height: u16) -> Table<&'static str> {
        Table::new(
            Rect::new(0, 0, 40, height),
            "Orders",
            vec![
                Column::new("Type", -8, FormatKind::Str, Style::default()),
                Column::fixed2("Amount", -6, Style::default().add_modifier(Modifier::BOLD)),
            ],
        )
    }

    fn row(kind: &str, amount: f64) -> Vec<CellValue> {
        vec![CellValue::from(kind), CellValue::from(amount)]
    }

    #[test]
    fn test_header_layout() {
        let t = table(6);
        let header = t.panel().line(1);
        assert!(header.starts_with("│ Type      Amount"));
        assert!(t.panel().style_at(2, 1).add_modifier.contains(Modifier::UNDERLINED));
        assert!(t.panel().line(0).starts_with("  Orders"));
        assert_eq!(t.max_rows(), 3);
    }

    #[test]
    fn test_rows_get_allocation_order() {
        let mut t = table(8);
        assert_eq!(t.upsert_row("A", row("LIMIT", 1.0)), Ok(0));
        assert_eq!(t.upsert_row("B", row("MARKET", 2.0)), Ok(1));
        assert_eq!(t.upsert_row("A", row("STOP", 3.0)), Ok(0));
        assert_eq!(t.len(), 2);

        assert!(t.panel().line(2).starts_with("│ STOP      3.00"));
        assert!(t.panel().line(3).starts_with("│ MARKET    2.00"));
    }

    #[test]
    fn test_delete_compacts_rows() {
        let mut t = table(8);
        t.upsert_row("A", row("LIMIT", 1.0)).unwrap();
        t.upsert_row("B", row("LIMIT", 2.0)).unwrap();
        t.upsert_row("C", row("LIMIT", 3.0)).unwrap();

        t.delete_row(&"B").unwrap();
        assert_eq!(t.display_index(&"A"), Some(0));
        assert_eq!(t.display_index(&"C"), Some(1));
        assert!(t.panel().line(3).contains("3.00"));
        assert!(!t.panel().line(4).contains("3.00"));

        assert_eq!(t.upsert_row("D", row("LIMIT", 4.0)), Ok(2));
        assert!(t.panel().line(4).contains("4.00"));
    }

    #[test]
    fn test_unknown_row_is_an_error() {
        let mut t = table(6);
        assert_eq!(t.delete_row(&"missing"), Err(TableError::UnknownRow { key: "\"missing\"".into() }));
        assert!(matches!(
            t.set_cell_style(&"missing", 0, Style::default()),
            Err(TableError::UnknownRow { .. })
        ));
    }

    #[test]
    fn test_contract_violations() {
        let mut t = table(6);
        t.upsert_row("A", row("LIMIT", 1.0)).unwrap();
        assert_eq!(
            t.set_cell_style(&"A", 5, Style::default()),
            Err(TableError::ColumnOutOfRange { column: 5, columns: 2 })
        );
        assert!(matches!(
            t.upsert_row("B", vec![CellValue::from(1.0)]),
            Err(TableError::ValueCount { got: 1, expected: 2, .. })
        ));
        assert!(!t.contains(&"B"));
    }

    #[test]
    fn test_cell_style_override_survives_updates() {
        let mut t = table(6);
        t.upsert_row("A", row("LIMIT", 1.0)).unwrap();
        let red = Style::default().fg(Color::Red);
        t.set_cell_style(&"A", 1, red).unwrap();
        assert_eq!(t.panel().style_at(12, 2).fg, Some(Color::Red));

        t.upsert_row("A", row("LIMIT", -1.0)).unwrap();
        assert_eq!(t.panel().style_at(12, 2).fg, Some(Color::Red));
        assert_eq!(t.row(&"A").unwrap().styles[0], Style::default());
    }

    #[test]
    fn test_rows_beyond_cap_are_not_drawn() {
        let mut t = table(5);
        assert_eq!(t.max_rows(), 2);
        t.upsert_row("A", row("LIMIT", 1.0)).unwrap();
        t.upsert_row("B", row("LIMIT", 2.0)).unwrap();
        t.upsert_row("C", row("LIMIT", 3.0)).unwrap();
        assert_eq!(t.display_index(&"C"), Some(2));
        assert!(!t.panel().line(4).contains("3.00"));

        // C moves into the visible area once A goes away
        t.delete_row(&"A").unwrap();
        assert!(t.panel().line(3).contains("3.00"));
    }
}
