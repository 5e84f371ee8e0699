use crate::dataset::{Dataset, RestaurantRecord};
use log::debug;
use std::cmp::Ordering;
use std::collections::BTreeSet;

/// Narrows `dataset` to one city/locality pair, optionally restricted to
/// cuisines, ordered by rating (highest first, ties keep dataset order).
///
/// A requested cuisine matches when it occurs anywhere inside the record's
/// raw cuisine text, so "Chin" matches "Chinese". Unknown city or locality
/// values simply produce an empty result.
pub fn filter<'a>(
    dataset: &'a Dataset,
    city: &str,
    locality: &str,
    cuisines: &BTreeSet<String>,
) -> Vec<&'a RestaurantRecord> {
    let mut rows: Vec<&RestaurantRecord> = dataset
        .records()
        .iter()
        .filter(|r| r.city == city && r.locality == locality)
        .filter(|r| cuisines.is_empty() || matches_any_cuisine(r, cuisines))
        .collect();

    // sort_by is stable
    rows.sort_by(|a, b| by_rating_desc(a.aggregate_rating, b.aggregate_rating));

    debug!(
        "Filter city={} locality={} cuisines={:?} matched {} rows",
        city,
        locality,
        cuisines,
        rows.len()
    );
    rows
}

fn matches_any_cuisine(record: &RestaurantRecord, cuisines: &BTreeSet<String>) -> bool {
    cuisines
        .iter()
        .any(|cuisine| record.cuisines_text.contains(cuisine.as_str()))
}

fn by_rating_desc(a: f64, b: f64) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => b.partial_cmp(&a).unwrap_or(Ordering::Equal),
    }
}
