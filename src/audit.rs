//! Questions audit listing: filter by question or collection name, sort by a
//! column, page through the result.

use crate::collections::CollectionTree;
use crate::search::{QuestionIndex, QuestionRecord};
use clap::ValueEnum;
use std::cmp::Ordering;

pub const PAGE_SIZE: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SortColumn {
    Name,
    Collection,
    Views,
    Created,
    Updated,
}

impl SortColumn {
    fn header(self) -> &'static str {
        match self {
            SortColumn::Name => "Question",
            SortColumn::Collection => "Collection",
            SortColumn::Views => "Views",
            SortColumn::Created => "Created",
            SortColumn::Updated => "Updated",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sorting {
    pub column: SortColumn,
    pub descending: bool,
}

impl Default for Sorting {
    fn default() -> Self {
        Sorting {
            column: SortColumn::Collection,
            descending: false,
        }
    }
}

impl Sorting {
    /// Header click: the active column flips its order, another column starts ascending.
    pub fn toggle(self, column: SortColumn) -> Self {
        if self.column == column {
            Sorting {
                column,
                descending: !self.descending,
            }
        } else {
            Sorting {
                column,
                descending: false,
            }
        }
    }

    /// Replay a sequence of header clicks from the default sorting.
    pub fn from_clicks(clicks: &[SortColumn]) -> Self {
        clicks
            .iter()
            .fold(Sorting::default(), |sorting, &column| sorting.toggle(column))
    }

    pub fn order(&self) -> &'static str {
        if self.descending { "desc" } else { "asc" }
    }
}

#[derive(Debug, Clone, Default)]
pub struct AuditFilters {
    pub question: Option<String>,
    pub collection: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditRow {
    pub name: String,
    pub collection: String,
    pub views: u64,
    pub created: String,
    pub updated: String,
}

fn collection_name(record: &QuestionRecord, tree: Option<&CollectionTree>) -> String {
    if let Some(name) = &record.collection_name {
        return name.clone();
    }
    let id = record.collection();
    match tree.and_then(|tree| tree.get(&id)) {
        Some(node) => node.name.clone(),
        None => id.to_string(),
    }
}

fn matches(haystack: &str, needle: Option<&str>) -> bool {
    match needle {
        Some(needle) if !needle.is_empty() => {
            haystack.to_lowercase().contains(&needle.to_lowercase())
        }
        _ => true,
    }
}

fn compare(a: &AuditRow, b: &AuditRow, column: SortColumn) -> Ordering {
    match column {
        SortColumn::Name => a.name.to_lowercase().cmp(&b.name.to_lowercase()),
        SortColumn::Collection => a.collection.to_lowercase().cmp(&b.collection.to_lowercase()),
        SortColumn::Views => a.views.cmp(&b.views),
        SortColumn::Created => a.created.cmp(&b.created),
        SortColumn::Updated => a.updated.cmp(&b.updated),
    }
}

/// Filtered and sorted rows. Ties fall back to the question name.
pub fn audit_rows(
    index: &QuestionIndex,
    tree: Option<&CollectionTree>,
    filters: &AuditFilters,
    sorting: Sorting,
) -> Vec<AuditRow> {
    let mut rows: Vec<AuditRow> = index
        .questions()
        .iter()
        .map(|record| AuditRow {
            name: record.name.clone(),
            collection: collection_name(record, tree),
            views: record.views,
            created: record.created_at.clone().unwrap_or_default(),
            updated: record.updated_at.clone().unwrap_or_default(),
        })
        .filter(|row| matches(&row.name, filters.question.as_deref()))
        .filter(|row| matches(&row.collection, filters.collection.as_deref()))
        .collect();

    rows.sort_by(|a, b| {
        let primary = compare(a, b, sorting.column);
        let primary = if sorting.descending { primary.reverse() } else { primary };
        primary.then_with(|| compare(a, b, SortColumn::Name))
    });
    rows
}

/// Zero-based page of `PAGE_SIZE` rows; past the end is empty.
pub fn page(rows: &[AuditRow], page: usize) -> &[AuditRow] {
    let start = page.saturating_mul(PAGE_SIZE).min(rows.len());
    let end = (start + PAGE_SIZE).min(rows.len());
    &rows[start..end]
}

pub fn render_table(rows: &[AuditRow], sorting: Sorting) -> String {
    const COLUMNS: [SortColumn; 5] = [
        SortColumn::Name,
        SortColumn::Collection,
        SortColumn::Views,
        SortColumn::Created,
        SortColumn::Updated,
    ];
    let cells: Vec<[String; 5]> = rows
        .iter()
        .map(|row| {
            [
                row.name.clone(),
                row.collection.clone(),
                row.views.to_string(),
                row.created.clone(),
                row.updated.clone(),
            ]
        })
        .collect();

    let headers: Vec<String> = COLUMNS
        .iter()
        .map(|&column| {
            if column == sorting.column {
                let arrow = if sorting.descending { "v" } else { "^" };
                format!("{} {}", column.header(), arrow)
            } else {
                column.header().to_string()
            }
        })
        .collect();

    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in &cells {
        for (width, cell) in widths.iter_mut().zip(row.iter()) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let format_line = |values: &[String]| -> String {
        values
            .iter()
            .zip(&widths)
            .map(|(value, &width)| format!("{value:<width$}"))
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string()
    };

    let mut lines = vec![format_line(headers.as_slice())];
    lines.push(
        widths
            .iter()
            .map(|&width| "-".repeat(width))
            .collect::<Vec<_>>()
            .join("  "),
    );
    for row in &cells {
        lines.push(format_line(&row[..]));
    }
    lines.join("\n") + "\n"
}
