use csv::StringRecord;
use log::{debug, info};
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

pub const CUISINE_DELIMITER: char = ',';

const NAME: &str = "restaurant.name";
const CITY: &str = "restaurant.location.city";
const LOCALITY: &str = "restaurant.location.locality";
const CUISINES: &str = "restaurant.cuisines";
const RATING: &str = "restaurant.user_rating.aggregate_rating";
const COST_FOR_TWO: &str = "restaurant.average_cost_for_two";
const LATITUDE: &str = "restaurant.location.latitude";
const LONGITUDE: &str = "restaurant.location.longitude";
const MENU_URL: &str = "restaurant.menu_url";
const PHOTOS_URL: &str = "restaurant.photos_url";
const THUMB: &str = "restaurant.thumb";

pub const REQUIRED_COLUMNS: [&str; 11] = [
    NAME,
    CITY,
    LOCALITY,
    CUISINES,
    RATING,
    COST_FOR_TWO,
    LATITUDE,
    LONGITUDE,
    MENU_URL,
    PHOTOS_URL,
    THUMB,
];

static DATASET: OnceCell<Arc<Dataset>> = OnceCell::new();

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read dataset: {0}")]
    Io(#[from] std::io::Error),

    #[error("dataset is missing required columns: {}", .0.join(", "))]
    MissingColumns(Vec<String>),

    #[error("malformed dataset row {row}: {reason}")]
    Malformed { row: usize, reason: String },
}

/// Wire shape of one CSV row. Blank cuisines become empty text and blank
/// numbers become NaN; numeric text that does not parse is still an error.
#[derive(Debug, Deserialize)]
struct RawRecord {
    #[serde(rename = "restaurant.name")]
    name: String,
    #[serde(rename = "restaurant.location.city")]
    city: String,
    #[serde(rename = "restaurant.location.locality")]
    locality: String,
    #[serde(rename = "restaurant.cuisines", default)]
    cuisines: Option<String>,
    #[serde(rename = "restaurant.user_rating.aggregate_rating")]
    aggregate_rating: Option<f64>,
    #[serde(rename = "restaurant.average_cost_for_two")]
    average_cost_for_two: Option<f64>,
    #[serde(rename = "restaurant.location.latitude")]
    latitude: Option<f64>,
    #[serde(rename = "restaurant.location.longitude")]
    longitude: Option<f64>,
    #[serde(rename = "restaurant.menu_url")]
    menu_url: String,
    #[serde(rename = "restaurant.photos_url")]
    photos_url: String,
    #[serde(rename = "restaurant.thumb")]
    thumbnail_url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RestaurantRecord {
    pub name: String,
    pub city: String,
    pub locality: String,
    /// Cuisine text exactly as stored in the file, empty when absent.
    pub cuisines_text: String,
    pub cuisines: Vec<String>,
    pub aggregate_rating: f64,
    pub average_cost_for_two: f64,
    pub latitude: f64,
    pub longitude: f64,
    pub menu_url: String,
    pub photos_url: String,
    pub thumbnail_url: String,
}

impl From<RawRecord> for RestaurantRecord {
    fn from(raw: RawRecord) -> Self {
        let cuisines_text = raw.cuisines.unwrap_or_default();
        let cuisines = split_cuisines(&cuisines_text);
        Self {
            name: raw.name,
            city: raw.city,
            locality: raw.locality,
            cuisines_text,
            cuisines,
            aggregate_rating: raw.aggregate_rating.unwrap_or(f64::NAN),
            average_cost_for_two: raw.average_cost_for_two.unwrap_or(f64::NAN),
            latitude: raw.latitude.unwrap_or(f64::NAN),
            longitude: raw.longitude.unwrap_or(f64::NAN),
            menu_url: raw.menu_url,
            photos_url: raw.photos_url,
            thumbnail_url: raw.thumbnail_url,
        }
    }
}

pub fn split_cuisines(text: &str) -> Vec<String> {
    text.split(CUISINE_DELIMITER)
        .map(str::trim)
        .filter(|cuisine| !cuisine.is_empty())
        .map(String::from)
        .collect()
}

/// The restaurant table. Immutable once built.
#[derive(Debug, Default)]
pub struct Dataset {
    records: Vec<RestaurantRecord>,
}

impl Dataset {
    #[cfg(test)]
    pub fn new(records: Vec<RestaurantRecord>) -> Self {
        Self { records }
    }

    pub fn from_path(path: &Path) -> Result<Self, LoadError> {
        debug!("Opening dataset file: {}", path.display());
        let file = File::open(path)?;
        Self::from_reader(file)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, LoadError> {
        let mut rdr = csv::ReaderBuilder::new()
            .trim(csv::Trim::Headers)
            .from_reader(reader);
        let headers = rdr.headers().map_err(|e| csv_error(0, e))?.clone();
        check_columns(&headers)?;

        let mut records = Vec::new();
        for (index, result) in rdr.deserialize::<RawRecord>().enumerate() {
            let raw = result.map_err(|e| csv_error(index + 1, e))?;
            records.push(RestaurantRecord::from(raw));
        }
        Ok(Self { records })
    }

    pub fn records(&self) -> &[RestaurantRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Distinct cities in the order they first appear.
    pub fn cities(&self) -> Vec<&str> {
        distinct(self.records.iter().map(|r| r.city.as_str()))
    }

    /// Distinct localities of `city`, in the order they first appear.
    pub fn localities(&self, city: &str) -> Vec<&str> {
        distinct(
            self.records
                .iter()
                .filter(|r| r.city == city)
                .map(|r| r.locality.as_str()),
        )
    }

    pub fn cuisines(&self) -> BTreeSet<&str> {
        self.records
            .iter()
            .flat_map(|r| r.cuisines.iter().map(String::as_str))
            .collect()
    }
}

fn distinct<'a>(values: impl Iterator<Item = &'a str>) -> Vec<&'a str> {
    let mut seen = BTreeSet::new();
    values.filter(|value| seen.insert(*value)).collect()
}

fn check_columns(headers: &StringRecord) -> Result<(), LoadError> {
    let missing: Vec<String> = REQUIRED_COLUMNS
        .iter()
        .filter(|column| !headers.iter().any(|h| h == **column))
        .map(|column| column.to_string())
        .collect();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(LoadError::MissingColumns(missing))
    }
}

fn csv_error(row: usize, err: csv::Error) -> LoadError {
    if err.is_io_error() {
        if let csv::ErrorKind::Io(io) = err.into_kind() {
            return LoadError::Io(io);
        }
        return LoadError::Malformed { row, reason: "unreadable input".to_string() };
    }
    LoadError::Malformed { row, reason: err.to_string() }
}

/// Returns the process-wide dataset, reading `path` on the first successful
/// call only. Later calls hand back the same table whatever path they pass.
pub fn load(path: &Path) -> Result<Arc<Dataset>, LoadError> {
    DATASET
        .get_or_try_init(|| {
            let dataset = Dataset::from_path(path)?;
            info!("Loaded {} restaurants from {}", dataset.len(), path.display());
            Ok(Arc::new(dataset))
        })
        .map(Arc::clone)
}
