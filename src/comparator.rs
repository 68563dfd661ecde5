//! Multi-column row ordering

use crate::table::{Row, SortPriority};
use crate::value::Comparison;
use itertools::Itertools;
use std::cell::Cell;

/// Below this length runs are sorted by insertion instead of being split further
const INSERTION_THRESHOLD: usize = 16;

/// Orders rows by a list of priority columns.
///
/// Columns are compared in priority order and the first `Less` or `Greater` decides. An
/// `Incomparable` column stops the comparison and the pair counts as "not less"; such
/// outcomes are counted so callers can report them.
pub struct RowComparator<'a> {
    priority: &'a [usize],
    incomparable: Cell<usize>,
}

impl<'a> RowComparator<'a> {
    pub fn new(priority: &'a SortPriority) -> Self {
        Self {
            priority: priority.columns(),
            incomparable: Cell::new(0),
        }
    }

    pub fn compare(&self, a: &Row, b: &Row) -> Comparison {
        for &column in self.priority {
            let outcome = match (a.get(column), b.get(column)) {
                (Some(x), Some(y)) => x.compare(y),
                _ => Comparison::Incomparable,
            };
            match outcome {
                Comparison::Equal => continue,
                Comparison::Incomparable => {
                    self.incomparable.set(self.incomparable.get() + 1);
                    return Comparison::Incomparable;
                }
                decided => return decided,
            }
        }
        Comparison::Equal
    }

    /// Strict-weak-order predicate used by the sort
    pub fn is_less(&self, a: &Row, b: &Row) -> bool {
        self.compare(a, b) == Comparison::Less
    }

    /// How many comparisons so far ended on an incomparable column
    pub fn incomparable_count(&self) -> usize {
        self.incomparable.get()
    }

    pub fn is_empty(&self) -> bool {
        self.priority.is_empty()
    }
}

/// Sort rows with the comparator's `is_less` predicate.
///
/// A stable merge sort that only ever asks "is b less than a", so pairs the comparator
/// cannot order keep their relative position. An empty priority leaves the rows untouched.
pub fn sort_rows(rows: &mut Vec<Row>, comparator: &RowComparator<'_>) {
    if comparator.is_empty() || rows.len() < 2 {
        return;
    }
    let unsorted = std::mem::take(rows);
    *rows = merge_sort(unsorted, &|a: &Row, b: &Row| comparator.is_less(a, b));
}

fn merge_sort<T, F>(mut items: Vec<T>, is_less: &F) -> Vec<T>
where
    F: Fn(&T, &T) -> bool,
{
    if items.len() <= INSERTION_THRESHOLD {
        insertion_sort(&mut items, is_less);
        return items;
    }

    let right = items.split_off(items.len() / 2);
    let left = merge_sort(items, is_less);
    let right = merge_sort(right, is_less);

    // Take from the left run unless the right element is strictly smaller.
    left.into_iter()
        .merge_by(right, |l, r| !is_less(r, l))
        .collect()
}

fn insertion_sort<T, F>(items: &mut [T], is_less: &F)
where
    F: Fn(&T, &T) -> bool,
{
    for i in 1..items.len() {
        let mut j = i;
        while j > 0 && is_less(&items[j], &items[j - 1]) {
            items.swap(j, j - 1);
            j -= 1;
        }
    }
}
