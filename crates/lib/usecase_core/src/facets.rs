//! Facets and aggregations over use-case records.
//!
//! These back the catalog's filter panel and its summary charts. All
//! functions are pure and work on already-fetched [`ListItem`]s.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

use crate::models::ListItem;

/// Maturity levels in display order; anything else is appended sorted.
pub const DEFAULT_MATURITY_ORDER: &[&str] = &[
    "Conceptual/Research",
    "Pilot/Testing",
    "Production/Scale",
    "Unknown",
];

/// Bucket that absorbs sectors beyond the top N.
pub const OTHER_BUCKET: &str = "Other";

/// Columns searched by the free-text box.
const SEARCH_FIELDS: &[&str] = &["Title", "Country", "Sectors", "KeyTerms", "Remarks"];

/// Splits `"A, B, C"` into `["A", "B", "C"]`, dropping blanks.
pub fn split_values(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .collect()
}

/// One entry of `filter_config.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterDefinition {
    pub id: String,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub field: String,
    #[serde(default)]
    pub multi_value: bool,
    #[serde(default)]
    pub uses_subregion: bool,
}

impl FilterDefinition {
    /// Values this filter sees on `item`. Empty when the column is blank.
    pub fn values_of(&self, item: &ListItem) -> Vec<String> {
        if self.uses_subregion {
            return region_label(item).into_iter().collect();
        }
        match item.text(&self.field) {
            Some(raw) if self.multi_value => split_values(&raw),
            Some(raw) => vec![raw],
            None => Vec::new(),
        }
    }
}

/// Selected values per filter id.
pub type Selections = HashMap<String, Vec<String>>;

/// `"Region — Subregion"`, or whichever of the two is set.
pub fn region_label(item: &ListItem) -> Option<String> {
    match (item.text("Region"), item.text("Subregion")) {
        (Some(region), Some(subregion)) => Some(format!("{region} — {subregion}")),
        (Some(one), None) | (None, Some(one)) => Some(one),
        (None, None) => None,
    }
}

fn label_order(a: &str, b: &str) -> Ordering {
    a.to_lowercase().cmp(&b.to_lowercase()).then_with(|| a.cmp(b))
}

/// Distinct values per filter id, sorted for display.
pub fn facet_options(items: &[ListItem], defs: &[FilterDefinition]) -> BTreeMap<String, Vec<String>> {
    let mut options = BTreeMap::new();
    for def in defs.iter().filter(|d| !d.id.is_empty()) {
        let distinct: BTreeSet<String> = items.iter().flat_map(|item| def.values_of(item)).collect();
        let mut values: Vec<String> = distinct.into_iter().collect();
        values.sort_by(|a, b| label_order(a, b));
        options.insert(def.id.clone(), values);
    }
    options
}

fn matches_search(item: &ListItem, needle: &str) -> bool {
    let haystack = SEARCH_FIELDS
        .iter()
        .filter_map(|field| item.text(field))
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase();
    haystack.contains(needle)
}

/// Items passing the free-text search and every non-empty selection.
///
/// A blank search matches everything. Otherwise the search text is matched
/// as typed (lower-cased, not trimmed), so a trailing space is significant.
///
/// Within one filter the selected values are OR-ed; across filters AND-ed.
/// Items lacking the filtered column never match that filter.
pub fn filter_items<'a>(
    items: &'a [ListItem],
    defs: &[FilterDefinition],
    selections: &Selections,
    search: &str,
) -> Vec<&'a ListItem> {
    let active = !search.trim().is_empty();
    let needle = search.to_lowercase();

    items
        .iter()
        .filter(|item| !active || matches_search(item, &needle))
        .filter(|item| {
            defs.iter().filter(|d| !d.id.is_empty()).all(|def| {
                let Some(selected) = selections.get(&def.id).filter(|s| !s.is_empty()) else {
                    return true;
                };
                let values = def.values_of(item);
                selected.iter().any(|v| values.contains(v))
            })
        })
        .collect()
}

/// A named count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Slice {
    pub name: String,
    pub value: usize,
}

/// Occurrences per sector, largest first; ties keep first-seen order.
///
/// With `top_n` set and more sectors than that, the remainder is summed into
/// a trailing [`OTHER_BUCKET`] slice.
pub fn sector_distribution(items: &[ListItem], top_n: Option<usize>) -> Vec<Slice> {
    let mut rows: Vec<Slice> = Vec::new();
    for sector in items.iter().flat_map(ListItem::sectors) {
        match rows.iter_mut().find(|r| r.name == sector) {
            Some(row) => row.value += 1,
            None => rows.push(Slice {
                name: sector,
                value: 1,
            }),
        }
    }
    rows.sort_by(|a, b| b.value.cmp(&a.value));

    match top_n {
        Some(n) if n > 0 && rows.len() > n => {
            let other: usize = rows[n..].iter().map(|r| r.value).sum();
            rows.truncate(n);
            rows.push(Slice {
                name: OTHER_BUCKET.into(),
                value: other,
            });
            rows
        }
        _ => rows,
    }
}

/// Count matrix: `values[row][column]`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CrossTab {
    pub rows: Vec<String>,
    pub columns: Vec<String>,
    pub values: Vec<Vec<usize>>,
    pub max_value: usize,
}

impl CrossTab {
    fn build(rows: Vec<String>, columns: Vec<String>, counts: &HashMap<(String, String), usize>) -> Self {
        let mut max_value = 0;
        let values = rows
            .iter()
            .map(|r| {
                columns
                    .iter()
                    .map(|c| {
                        let v = counts.get(&(r.clone(), c.clone())).copied().unwrap_or(0);
                        max_value = max_value.max(v);
                        v
                    })
                    .collect()
            })
            .collect();
        Self {
            rows,
            columns,
            values,
            max_value,
        }
    }

    /// Cell by labels; zero when either label is absent.
    pub fn get(&self, row: &str, column: &str) -> usize {
        let r = self.rows.iter().position(|x| x == row);
        let c = self.columns.iter().position(|x| x == column);
        match (r, c) {
            (Some(r), Some(c)) => self.values[r][c],
            _ => 0,
        }
    }
}

/// Sectors (sorted) against the `top_n` countries with the most
/// sector/country pairs.
///
/// Items missing either column are skipped. Countries tied on count keep
/// first-seen order.
pub fn sector_country_matrix(items: &[ListItem], top_n: usize) -> CrossTab {
    let mut sectors = BTreeSet::new();
    let mut country_totals: Vec<(String, usize)> = Vec::new();
    let mut pairs: HashMap<(String, String), usize> = HashMap::new();

    for item in items {
        let item_sectors = item.sectors();
        let item_countries = item.countries();
        if item_sectors.is_empty() || item_countries.is_empty() {
            continue;
        }
        for sector in &item_sectors {
            sectors.insert(sector.clone());
            for country in &item_countries {
                match country_totals.iter_mut().find(|(c, _)| c == country) {
                    Some((_, n)) => *n += 1,
                    None => country_totals.push((country.clone(), 1)),
                }
                *pairs.entry((sector.clone(), country.clone())).or_default() += 1;
            }
        }
    }

    country_totals.sort_by(|a, b| b.1.cmp(&a.1));
    let columns = country_totals.into_iter().take(top_n).map(|(c, _)| c).collect();
    CrossTab::build(sectors.into_iter().collect(), columns, &pairs)
}

/// Sectors (sorted) against maturity levels.
///
/// Columns follow `order` for the levels present, then any other levels
/// sorted. Items without a `MaturityLevel` are skipped; a whitespace-only
/// level counts as `Unknown`.
pub fn sector_maturity_matrix(items: &[ListItem], order: &[&str]) -> CrossTab {
    let mut sectors = BTreeSet::new();
    let mut present = BTreeSet::new();
    let mut counts: HashMap<(String, String), usize> = HashMap::new();

    for item in items {
        let Some(raw) = item.maturity_level() else {
            continue;
        };
        let item_sectors = item.sectors();
        if item_sectors.is_empty() {
            continue;
        }
        let maturity = match raw.trim() {
            "" => "Unknown".to_string(),
            level => level.to_string(),
        };
        present.insert(maturity.clone());
        for sector in item_sectors {
            *counts.entry((sector.clone(), maturity.clone())).or_default() += 1;
            sectors.insert(sector);
        }
    }

    let mut columns: Vec<String> = order
        .iter()
        .filter(|m| present.contains(**m))
        .map(|m| m.to_string())
        .collect();
    columns.extend(present.iter().filter(|m| !order.contains(&m.as_str())).cloned());

    let mut rows: Vec<String> = sectors.into_iter().collect();
    rows.sort_by(|a, b| label_order(a, b));
    CrossTab::build(rows, columns, &counts)
}
