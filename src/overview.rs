/*!
 * Summary counts over a snapshot of businesses.
 */

use crate::business::{BusinessRecord, ZoneType};
use rustc_hash::FxHashMap;
use std::{cmp::Reverse, hash::Hash};

/// The number of streets reported in the overview.
const TOP_STREETS: usize = 10;

/// Counts describing the mix of businesses in a study area.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarketOverview {
    pub total_businesses: usize,
    /// Number of distinct category strings.
    pub total_categories: usize,
    /// Businesses per category, most common first.
    pub category_counts: Vec<(String, usize)>,
    /// Businesses per zone type, only the zone types that occur. Commercial, then residential,
    /// then any other zones by name.
    pub zone_counts: Vec<(ZoneType, usize)>,
    /// The streets with the most businesses, most common first.
    pub top_streets: Vec<(String, usize)>,
}

impl MarketOverview {
    pub fn from_businesses(businesses: &[BusinessRecord]) -> Self {
        let category_counts = ranked_counts(businesses.iter().map(|b| b.category.as_str()));
        let mut top_streets = ranked_counts(businesses.iter().map(|b| b.street.as_str()));
        top_streets.truncate(TOP_STREETS);

        let mut zone_counts: Vec<(ZoneType, usize)> = count(businesses.iter().map(|b| &b.zone))
            .into_iter()
            .map(|(z, n)| (z.clone(), n))
            .collect();
        zone_counts.sort();

        MarketOverview {
            total_businesses: businesses.len(),
            total_categories: category_counts.len(),
            category_counts,
            zone_counts,
            top_streets,
        }
    }

    /// The most common category and its count.
    pub fn top_category(&self) -> Option<(&str, usize)> {
        self.category_counts
            .first()
            .map(|(cat, n)| (cat.as_str(), *n))
    }
}

fn count<K: Eq + Hash, I: Iterator<Item = K>>(items: I) -> FxHashMap<K, usize> {
    let mut counts: FxHashMap<K, usize> = FxHashMap::default();
    for item in items {
        *counts.entry(item).or_insert(0) += 1;
    }
    counts
}

/// Count the strings, most common first, ties in alphabetical order.
fn ranked_counts<'a, I: Iterator<Item = &'a str>>(items: I) -> Vec<(String, usize)> {
    let mut ranked: Vec<(String, usize)> = count(items)
        .into_iter()
        .map(|(k, n)| (k.to_owned(), n))
        .collect();

    ranked.sort_by(|a, b| (Reverse(a.1), &a.0).cmp(&(Reverse(b.1), &b.0)));

    ranked
}
