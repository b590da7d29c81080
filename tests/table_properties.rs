//! Property-based tests for keyed table rows.
//!
//! Run with: cargo test --test table_properties

use std::collections::BTreeSet;

use proptest::prelude::*;
use ratatui::layout::Rect;
use ratatui::style::Style;

use lobx_dash::ui::format::{CellValue, Column, FormatKind};
use lobx_dash::ui::table::{Table, TableError};

#[derive(Debug, Clone)]
enum Op {
    Upsert(u8, f64),
    Delete(u8),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => (0u8..12, -1000.0..1000.0f64).prop_map(|(key, value)| Op::Upsert(key, value)),
        2 => (0u8..12).prop_map(Op::Delete),
    ]
}

fn table(height: u16) -> Table<u8> {
    Table::new(
        Rect::new(0, 0, 60, height),
        "Orders",
        vec![
            Column::new("Key", -4, FormatKind::Auto, Style::default()),
            Column::fixed2("Value", 10, Style::default()),
        ],
    )
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    /// Display indexes stay a dense 0..n permutation through any upsert/delete sequence
    #[test]
    fn display_indexes_stay_dense(ops in prop::collection::vec(op_strategy(), 0..200)) {
        let mut t = table(10);
        let mut live = BTreeSet::new();

        for op in ops {
            match op {
                Op::Upsert(key, value) => {
                    let values = vec![CellValue::from(key as i64), CellValue::from(value)];
                    let index = t.upsert_row(key, values).unwrap();
                    prop_assert!(index < t.len());
                    live.insert(key);
                }
                Op::Delete(key) => {
                    let result = t.delete_row(&key);
                    if live.remove(&key) {
                        prop_assert!(result.is_ok());
                    } else {
                        prop_assert!(matches!(result, Err(TableError::UnknownRow { .. })), "{:?}", result);
                    }
                }
            }

            prop_assert_eq!(t.len(), live.len());
            let indexes: BTreeSet<usize> = live.iter().filter_map(|k| t.display_index(k)).collect();
            let expected: BTreeSet<usize> = (0..live.len()).collect();
            prop_assert_eq!(indexes, expected);
        }
    }

    /// Deleting a row keeps the relative order of the rows after it
    #[test]
    fn deletion_preserves_relative_order(count in 2usize..12, victim in 0usize..12) {
        let mut t = table(20);
        for key in 0..count as u8 {
            t.upsert_row(key, vec![CellValue::from(key as i64), CellValue::from(1.0)]).unwrap();
        }
        let victim = (victim % count) as u8;
        t.delete_row(&victim).unwrap();

        let order: Vec<u8> = {
            let mut keys: Vec<u8> = (0..count as u8).filter(|k| *k != victim).collect();
            keys.sort_by_key(|k| t.display_index(k));
            keys
        };
        let expected: Vec<u8> = (0..count as u8).filter(|k| *k != victim).collect();
        prop_assert_eq!(order, expected);
    }

    /// Every visible row shows its value on the screen line matching its display index
    #[test]
    fn visible_rows_match_their_slot(values in prop::collection::vec(-1000.0..1000.0f64, 1..12)) {
        let mut t = table(8);
        for (key, value) in values.iter().enumerate() {
            t.upsert_row(key as u8, vec![CellValue::from(key as i64), CellValue::from(*value)]).unwrap();
        }
        for (key, value) in values.iter().enumerate() {
            let index = t.display_index(&(key as u8)).unwrap();
            if index < t.max_rows() {
                let line = t.panel().line(2 + index as u16);
                let expected = format!("{:.2}", value);
                prop_assert!(line.contains(&expected), "{:?} missing from {:?}", expected, line);
            }
        }
    }
}
