//! Catalog query gateway: build the inventory filter, run it against the
//! store, and relax the budget once when it alone empties the result.

use std::collections::HashMap;

use anyhow::Result;
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use tracing::debug;

use storefront_core::{CatalogItem, InventoryItem};

use crate::traits::CatalogStore;

/// Maximum items fetched per query and listed in a prompt.
pub const INVENTORY_LIMIT: usize = 25;

/// Filter over active, in-stock items. Built fresh per request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryFilter {
    /// Lowercase search terms. Empty means "any item".
    pub terms: Vec<String>,
    pub max_price: Option<f64>,
}

impl InventoryFilter {
    pub fn new(terms: &[String], max_price: Option<f64>) -> Self {
        Self {
            terms: terms.iter().map(|t| t.to_lowercase()).collect(),
            max_price,
        }
    }

    /// Same structural filter with the price ceiling removed.
    pub fn without_budget(&self) -> Self {
        Self {
            terms: self.terms.clone(),
            max_price: None,
        }
    }

    /// Alternation of all terms with regex metacharacters escaped, e.g.
    /// `laptop|gaming`. `None` when there are no terms.
    pub fn pattern(&self) -> Option<String> {
        if self.terms.is_empty() {
            return None;
        }
        Some(
            self.terms
                .iter()
                .map(|t| regex::escape(t))
                .collect::<Vec<_>>()
                .join("|"),
        )
    }

    fn compiled(&self) -> Option<Regex> {
        self.pattern()
            .and_then(|p| RegexBuilder::new(&p).case_insensitive(true).build().ok())
    }

    /// In-memory evaluation with the same semantics as the SQL query.
    pub fn matches(&self, item: &CatalogItem) -> bool {
        if !item.is_available() {
            return false;
        }
        if let Some(max) = self.max_price {
            if item.price > max {
                return false;
            }
        }
        let Some(re) = self.compiled() else {
            return self.terms.is_empty();
        };

        re.is_match(&item.name)
            || item.brand.as_deref().is_some_and(|b| re.is_match(b))
            || item.category.as_deref().is_some_and(|c| re.is_match(c))
            || item.tags.iter().any(|t| re.is_match(t))
    }

    /// Whether a snapshot row's name, brand or category contains one of the
    /// terms. Rows carry no tags, so those are not consulted.
    pub fn mentions(&self, item: &InventoryItem) -> bool {
        let Some(re) = self.compiled() else {
            return false;
        };
        re.is_match(&item.name)
            || item.brand.as_deref().is_some_and(|b| re.is_match(b))
            || item.category.as_deref().is_some_and(|c| re.is_match(c))
    }
}

/// Inventory returned for one request.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct InventorySnapshot {
    pub items: Vec<InventoryItem>,
    /// The budget emptied the result and the query was re-run without it.
    pub budget_relaxed: bool,
    /// Ceiling applied to the returned items, if any.
    pub applied_budget: Option<f64>,
}

impl InventorySnapshot {
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Item count per brand, highest first, ties by name. Unbranded items
    /// are counted under "Sin marca".
    pub fn brand_counts(&self) -> Vec<(String, usize)> {
        let mut counts: HashMap<String, usize> = HashMap::new();
        for item in &self.items {
            let brand = item
                .brand
                .as_deref()
                .filter(|b| !b.trim().is_empty())
                .unwrap_or("Sin marca");
            *counts.entry(brand.to_string()).or_default() += 1;
        }
        let mut counts: Vec<_> = counts.into_iter().collect();
        counts.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        counts
    }

    /// Distinct non-empty brands in first-seen order.
    pub fn brands(&self) -> Vec<String> {
        distinct(self.items.iter().filter_map(|i| i.brand.as_deref()))
    }

    /// Distinct non-empty categories in first-seen order.
    pub fn categories(&self) -> Vec<String> {
        distinct(self.items.iter().filter_map(|i| i.category.as_deref()))
    }

    /// Lowest and highest price, if any items.
    pub fn price_range(&self) -> Option<(f64, f64)> {
        self.items.iter().map(|i| i.price).fold(None, |acc, p| match acc {
            None => Some((p, p)),
            Some((lo, hi)) => Some((lo.min(p), hi.max(p))),
        })
    }
}

fn distinct<'a>(values: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for v in values.map(str::trim).filter(|v| !v.is_empty()) {
        if !out.iter().any(|o| o.eq_ignore_ascii_case(v)) {
            out.push(v.to_string());
        }
    }
    out
}

/// Whole-number price with `.` thousands separators: `2500000.0` -> `$2.500.000`.
pub fn format_price(price: f64) -> String {
    let whole = price.round().max(0.0) as u64;
    let digits = whole.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push('.');
        }
        out.push(c);
    }
    format!("${out}")
}

/// Fetch up to [`INVENTORY_LIMIT`] items for `terms` under `budget`.
///
/// Zero results are a normal outcome. When a budget was applied to a
/// non-empty term set and nothing came back, the query runs once more
/// without the budget.
pub async fn query_inventory(
    store: &dyn CatalogStore,
    terms: &[String],
    budget: Option<f64>,
) -> Result<InventorySnapshot> {
    let filter = InventoryFilter::new(terms, budget);
    let items = store.find_inventory(&filter, INVENTORY_LIMIT).await?;
    debug!(
        pattern = ?filter.pattern(),
        max_price = ?filter.max_price,
        count = items.len(),
        "Inventory query"
    );

    if items.is_empty() && filter.max_price.is_some() && !filter.terms.is_empty() {
        let relaxed = filter.without_budget();
        let items = store.find_inventory(&relaxed, INVENTORY_LIMIT).await?;
        debug!(
            pattern = ?relaxed.pattern(),
            count = items.len(),
            "Inventory query without budget"
        );
        return Ok(InventorySnapshot {
            budget_relaxed: !items.is_empty(),
            items: truncate(items),
            applied_budget: None,
        });
    }

    Ok(InventorySnapshot {
        items: truncate(items),
        budget_relaxed: false,
        applied_budget: filter.max_price,
    })
}

fn truncate(mut items: Vec<InventoryItem>) -> Vec<InventoryItem> {
    items.truncate(INVENTORY_LIMIT);
    items
}
