use crate::dataset::RestaurantRecord;
use serde::Serialize;

pub const NO_RESULTS_NOTICE: &str = "No restaurants found based on your criteria.";
pub const MAP_ZOOM: u8 = 12;
pub const POPUP_MAX_WIDTH: u32 = 300;
pub const CURRENCY_SYMBOL: &str = "₹";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RowSummary {
    pub name: String,
    pub cuisines: String,
    pub rating: String,
    pub cost_for_two: String,
    pub menu_url: String,
    pub photos_url: String,
    pub thumbnail_url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Popup {
    pub name: String,
    pub cuisines: String,
    pub rating: String,
    pub max_width: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Marker {
    pub latitude: f64,
    pub longitude: f64,
    pub popup: Popup,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapView {
    pub center: [f64; 2],
    pub zoom: u8,
    pub markers: Vec<Marker>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum HomeView {
    Results {
        heading: String,
        list: Vec<RowSummary>,
        map: MapView,
    },
    NoResults {
        heading: String,
        notice: String,
    },
}

/// Builds the Home results area for rows already filtered and sorted.
///
/// The map is centered on the first row, so an empty input never reaches
/// map construction and yields the notice instead.
pub fn render(rows: &[&RestaurantRecord], city: &str, locality: &str) -> HomeView {
    let heading = format!("🍽️ Restaurants in {}, {}", locality, city);

    let first = match rows.first() {
        Some(first) => first,
        None => {
            return HomeView::NoResults {
                heading,
                notice: NO_RESULTS_NOTICE.to_string(),
            }
        }
    };

    let map = MapView {
        center: [first.latitude, first.longitude],
        zoom: MAP_ZOOM,
        markers: rows.iter().map(|r| marker(r)).collect(),
    };

    HomeView::Results {
        heading,
        list: rows.iter().map(|r| summarize(r)).collect(),
        map,
    }
}

fn summarize(record: &RestaurantRecord) -> RowSummary {
    RowSummary {
        name: record.name.to_uppercase(),
        cuisines: record.cuisines_text.clone(),
        rating: rating_label(record.aggregate_rating),
        cost_for_two: format!("{}{}", CURRENCY_SYMBOL, record.average_cost_for_two),
        menu_url: record.menu_url.clone(),
        photos_url: record.photos_url.clone(),
        thumbnail_url: record.thumbnail_url.clone(),
    }
}

fn marker(record: &RestaurantRecord) -> Marker {
    Marker {
        latitude: record.latitude,
        longitude: record.longitude,
        popup: Popup {
            name: record.name.clone(),
            cuisines: record.cuisines_text.clone(),
            rating: rating_label(record.aggregate_rating),
            max_width: POPUP_MAX_WIDTH,
        },
    }
}

/// "4.5 stars"; whole ratings keep one decimal ("4.0 stars").
fn rating_label(rating: f64) -> String {
    if rating.is_finite() && rating.fract() == 0.0 {
        format!("{:.1} stars", rating)
    } else {
        format!("{} stars", rating)
    }
}
