//! Result ordering.
//!
//! | Sort field | Comparison |
//! |------------|------------|
//! | `date`, `updated_at` | `updated_at` timestamps |
//! | `created_at` | `created_at` timestamps |
//! | `title` | case-insensitive text |
//! | anything else | numeric if every value is a finite number, else dates if every value is a date, else case-insensitive text |
//!
//! The comparison kind of an arbitrary field is chosen once for the whole
//! column, so mixed columns still sort by a total order. Missing and empty
//! values sort before every present one.
//!
//! Sorting is stable: items with equal keys keep their listing order.

use super::filter::Order;
use crate::storage::Record;
use crate::utils::{
    date,
    value::{lookup_path, scalar_to_string},
};
use std::{borrow::Cow, cmp::Ordering};

/// Sort field used when a query names none.
pub const DEFAULT_SORT: &str = "updated_at";

/// Comparable key of one item.
#[derive(Debug, Clone, PartialEq)]
enum SortKey {
    Missing,
    Number(f64),
    Time(i64),
    Text(String),
}

impl SortKey {
    const fn rank(&self) -> u8 {
        match self {
            Self::Missing => 0,
            Self::Number(_) => 1,
            Self::Time(_) => 2,
            Self::Text(_) => 3,
        }
    }

    fn compare(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Number(a), Self::Number(b)) => a.total_cmp(b),
            (Self::Time(a), Self::Time(b)) => a.cmp(b),
            (Self::Text(a), Self::Text(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

/// How the values of an arbitrary field are compared.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Column {
    Numeric,
    Dates,
    Text,
}

impl Column {
    /// Pick the strictest kind every present value satisfies.
    fn classify<'v>(values: impl Iterator<Item = &'v str> + Clone) -> Self {
        let mut present = values.filter(|v| !v.is_empty());
        if present.clone().all(|v| finite_number(v).is_some()) {
            Self::Numeric
        } else if present.all(|v| date::timestamp(v).is_some()) {
            Self::Dates
        } else {
            Self::Text
        }
    }

    fn key(self, value: &str) -> SortKey {
        if value.is_empty() {
            return SortKey::Missing;
        }
        let key = match self {
            Self::Numeric => finite_number(value).map(SortKey::Number),
            Self::Dates => date::timestamp(value).map(SortKey::Time),
            Self::Text => None,
        };
        key.unwrap_or_else(|| SortKey::Text(value.to_lowercase()))
    }
}

/// Sort annotated records in place.
pub fn sort_items(items: &mut [Record], field: &str, order: Order) {
    let field = field.trim();
    let field = if field.is_empty() { DEFAULT_SORT } else { field };
    let keys = sort_keys(items, field);

    let mut indices: Vec<usize> = (0..items.len()).collect();
    indices.sort_by(|&a, &b| {
        let ordering = keys[a].compare(&keys[b]);
        match order {
            Order::Asc => ordering,
            Order::Desc => ordering.reverse(),
        }
    });

    let sorted: Vec<Record> = indices.iter().map(|&i| std::mem::take(&mut items[i])).collect();
    for (slot, record) in items.iter_mut().zip(sorted) {
        *slot = record;
    }
}

fn sort_keys(items: &[Record], field: &str) -> Vec<SortKey> {
    match field {
        "date" | "updated_at" => items.iter().map(|r| timestamp_key(r, "updated_at")).collect(),
        "created_at" => items.iter().map(|r| timestamp_key(r, "created_at")).collect(),
        "title" => items.iter().map(|r| Column::Text.key(text(r, "title").trim())).collect(),
        _ => {
            let values: Vec<Cow<'_, str>> = items.iter().map(|r| text(r, field)).collect();
            let column = Column::classify(values.iter().map(|v| v.trim()));
            values.iter().map(|v| column.key(v.trim())).collect()
        }
    }
}

fn finite_number(value: &str) -> Option<f64> {
    value.parse::<f64>().ok().filter(|n| n.is_finite())
}

fn text<'r>(record: &'r Record, field: &str) -> Cow<'r, str> {
    lookup_path(record, field).map_or(Cow::Borrowed(""), scalar_to_string)
}

/// Missing or unparsable timestamps sort before every real one.
fn timestamp_key(record: &Record, field: &str) -> SortKey {
    record
        .get(field)
        .and_then(|v| v.as_str())
        .and_then(date::timestamp)
        .map_or(SortKey::Missing, SortKey::Time)
}
