// src/core/page.rs

//! Pagination, filtering and ordering applied to candidate sets read from an
//! entity table.
//!
//! Everything here is a pure function over already-collected records. The
//! repositories gather candidates under their own lock and hand them to this
//! module to produce the final `Page`.

use crate::core::model::{Channel, Entity, Thing};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::ops::Range;

/// The direction in which a sorted page is returned.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

/// The record fields a page can be ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    Name,
    Id,
}

impl SortKey {
    /// Parses the `order` field of a page query. Unknown fields yield `None`,
    /// which leaves candidates in table enumeration order.
    pub fn parse(field: &str) -> Option<Self> {
        match field.to_ascii_lowercase().as_str() {
            "name" => Some(SortKey::Name),
            "id" => Some(SortKey::Id),
            _ => None,
        }
    }
}

/// Describes how a page was (or should be) produced.
///
/// A `limit` of zero always means "no items", never "unbounded". `total` is
/// filled in by the owning table from its running counter and is not the
/// number of items in the page.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct PageMetadata {
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub offset: u64,
    #[serde(default)]
    pub limit: u64,
    /// Exact-match name filter.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// The field to order by (`name` or `id`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<String>,
    #[serde(default)]
    pub dir: SortDirection,
}

impl PageMetadata {
    pub fn new(offset: u64, limit: u64) -> Self {
        Self {
            offset,
            limit,
            ..Default::default()
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn ordered_by(mut self, order: impl Into<String>, dir: SortDirection) -> Self {
        self.order = Some(order.into());
        self.dir = dir;
        self
    }

    /// The half-open range of identifier ordinals selected by this query:
    /// `[offset + 1, offset + 1 + limit)`. `None` when `limit` is zero.
    pub fn ordinal_window(&self) -> Option<Range<u64>> {
        if self.limit == 0 {
            return None;
        }
        let first = self.offset.saturating_add(1);
        let last = first.saturating_add(self.limit);
        Some(first..last)
    }

    /// Echoes the query parameters with the owning table's total filled in.
    fn resolved(&self, total: u64) -> Self {
        Self {
            total,
            ..self.clone()
        }
    }
}

/// A windowed, filtered, ordered result set plus the metadata that produced it.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    #[serde(flatten)]
    pub metadata: PageMetadata,
}

pub type ThingsPage = Page<Thing>;
pub type ChannelsPage = Page<Channel>;

impl<T> Page<T> {
    pub fn new(items: Vec<T>, query: &PageMetadata, total: u64) -> Self {
        Self {
            items,
            metadata: query.resolved(total),
        }
    }

    /// A page with no items that still reports the query and the table total.
    pub fn empty(query: &PageMetadata, total: u64) -> Self {
        Self::new(Vec::new(), query, total)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Extracts the numeric ordinal embedded at the end of an identifier,
/// e.g. `"007"` yields 7. Identifiers without trailing digits yield 0.
pub fn parse_ordinal(id: &str) -> u64 {
    let digits_start = id
        .char_indices()
        .rev()
        .take_while(|(_, c)| c.is_ascii_digit())
        .last()
        .map(|(i, _)| i)
        .unwrap_or(id.len());
    id[digits_start..].parse().unwrap_or(0)
}

/// Selects the records whose identifier ordinal falls in the query's window.
pub fn window_by_ordinal<'a, T, I>(candidates: I, query: &PageMetadata) -> Vec<T>
where
    T: Entity,
    I: IntoIterator<Item = &'a T>,
{
    let Some(window) = query.ordinal_window() else {
        return Vec::new();
    };
    candidates
        .into_iter()
        .filter(|e| window.contains(&parse_ordinal(e.id())))
        .cloned()
        .collect()
}

/// Selects records by enumeration position: skips `offset`, keeps `limit`.
pub fn window_by_position<'a, T, I>(candidates: I, query: &PageMetadata) -> Vec<T>
where
    T: Entity,
    I: IntoIterator<Item = &'a T>,
{
    let offset = usize::try_from(query.offset).unwrap_or(usize::MAX);
    let limit = usize::try_from(query.limit).unwrap_or(usize::MAX);
    candidates
        .into_iter()
        .skip(offset)
        .take(limit)
        .cloned()
        .collect()
}

/// Keeps only the records whose name equals the query's name filter.
/// Without a filter the input is returned unchanged.
pub fn filter_by_name<T: Entity>(items: Vec<T>, query: &PageMetadata) -> Vec<T> {
    match query.name.as_deref() {
        Some(name) if !name.is_empty() => items.into_iter().filter(|e| e.name() == name).collect(),
        _ => items,
    }
}

/// Orders records by the query's `order` and `dir` fields.
///
/// Name ordering ties are broken by identifier so repeated calls with the same
/// input produce the same order. An absent or unsupported field leaves the
/// input order untouched.
pub fn sort_entities<T: Entity>(mut items: Vec<T>, query: &PageMetadata) -> Vec<T> {
    let Some(key) = query.order.as_deref().and_then(SortKey::parse) else {
        return items;
    };

    items.sort_by(|a, b| {
        let ord = compare(a, b, key);
        match query.dir {
            SortDirection::Asc => ord,
            SortDirection::Desc => ord.reverse(),
        }
    });
    items
}

fn compare<T: Entity>(a: &T, b: &T, key: SortKey) -> Ordering {
    match key {
        SortKey::Name => a.name().cmp(b.name()).then_with(|| a.id().cmp(b.id())),
        SortKey::Id => parse_ordinal(a.id())
            .cmp(&parse_ordinal(b.id()))
            .then_with(|| a.id().cmp(b.id())),
    }
}

/// Applies the name filter and the sort contract, then wraps the result.
pub fn finish_page<T: Entity>(items: Vec<T>, query: &PageMetadata, total: u64) -> Page<T> {
    let items = filter_by_name(items, query);
    let items = sort_entities(items, query);
    Page::new(items, query, total)
}
