//! CSV loader for the property dataset.
//!
//! Loads every row into memory, normalizes the key columns and provides
//! lookup, search and filter operations over the records.

use crate::models::{
    CellValue, PropertyRecord, ADDRESS, CITY, COUNTY, COUNTY_NAME, LAND_AREA, PRICE, STATE,
    STOCK_NUMBER, ZIP,
};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

/// Columns that receive `Unknown` when empty.
const CRITICAL_COLUMNS: [&str; 4] = [ADDRESS, CITY, STATE, ZIP];

/// Columns scanned by free-text search.
const SEARCH_COLUMNS: [&str; 6] = [ADDRESS, CITY, STATE, ZIP, COUNTY, COUNTY_NAME];

#[derive(Debug, Error)]
pub enum DataError {
    #[error("Data file not found: {0}")]
    NotFound(PathBuf),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("Missing required column: {0}")]
    MissingColumn(String),
}

pub type Result<T> = std::result::Result<T, DataError>;

/// Criteria for narrowing the property list.
///
/// Numeric bounds exclude rows whose value is missing or non-numeric.
/// Criteria on columns the dataset does not have are ignored.
#[derive(Debug, Clone, Default)]
pub struct PropertyFilter {
    pub min_acres: Option<f64>,
    pub max_acres: Option<f64>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub state: Option<String>,
    pub cities: Vec<String>,
    pub counties: Vec<String>,
}

impl PropertyFilter {
    pub fn is_empty(&self) -> bool {
        self.min_acres.is_none()
            && self.max_acres.is_none()
            && self.min_price.is_none()
            && self.max_price.is_none()
            && self.state.is_none()
            && self.cities.is_empty()
            && self.counties.is_empty()
    }
}

/// In-memory property dataset.
#[derive(Debug, Clone)]
pub struct PropertyDataset {
    path: PathBuf,
    headers: Vec<String>,
    records: Vec<PropertyRecord>,
}

impl PropertyDataset {
    /// Load and clean the dataset at `path`.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(DataError::NotFound(path.to_path_buf()));
        }

        let reader = csv::ReaderBuilder::new()
            .flexible(true)
            .from_path(path)?;
        let dataset = Self::from_reader(reader, path.to_path_buf())?;

        info!(
            "Loaded {} properties from {}",
            dataset.records.len(),
            path.display()
        );
        Ok(dataset)
    }

    /// Parse a dataset from CSV text already in memory.
    #[cfg(test)]
    pub fn from_csv_str(data: &str) -> Result<Self> {
        let reader = csv::ReaderBuilder::new()
            .flexible(true)
            .from_reader(data.as_bytes());
        Self::from_reader(reader, PathBuf::from("<memory>"))
    }

    fn from_reader<R: std::io::Read>(mut reader: csv::Reader<R>, path: PathBuf) -> Result<Self> {
        let headers: Vec<String> = reader
            .headers()?
            .iter()
            .map(|h| h.trim().to_string())
            .collect();

        if !headers.iter().any(|h| h == STOCK_NUMBER) {
            return Err(DataError::MissingColumn(STOCK_NUMBER.to_string()));
        }

        let mut records = Vec::new();
        for row in reader.records() {
            let row = row?;
            let fields = headers
                .iter()
                .enumerate()
                .map(|(i, header)| {
                    let raw = row.get(i).unwrap_or("");
                    let value = if header == STOCK_NUMBER {
                        // Identifiers keep leading zeros and are never numeric.
                        CellValue::Text(raw.trim().to_string())
                    } else {
                        CellValue::parse(raw)
                    };
                    (header.clone(), value)
                })
                .collect();

            let mut record = PropertyRecord::new(fields);
            clean_record(&mut record);
            records.push(record);
        }

        debug!("Parsed {} rows with {} columns", records.len(), headers.len());

        Ok(Self {
            path,
            headers,
            records,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// All properties in file order.
    pub fn properties(&self) -> &[PropertyRecord] {
        &self.records
    }

    /// Find a property by stock number. The first match wins.
    pub fn get(&self, stock_number: &str) -> Option<&PropertyRecord> {
        let wanted = stock_number.trim();
        self.records.iter().find(|r| {
            matches!(r.get(STOCK_NUMBER), Some(CellValue::Text(s)) if s == wanted)
        })
    }

    /// Case-insensitive substring search over the location columns.
    pub fn search(&self, query: &str) -> Vec<&PropertyRecord> {
        let columns: Vec<&str> = SEARCH_COLUMNS
            .iter()
            .copied()
            .filter(|c| self.headers.iter().any(|h| h == c))
            .collect();

        if columns.is_empty() {
            return Vec::new();
        }

        let needle = query.to_lowercase();
        self.records
            .iter()
            .filter(|record| {
                columns.iter().any(|column| match record.get(column) {
                    Some(CellValue::Empty) | None => false,
                    Some(value) => value.to_string().to_lowercase().contains(&needle),
                })
            })
            .collect()
    }

    /// Apply the given filter criteria.
    pub fn filter(&self, filter: &PropertyFilter) -> Vec<&PropertyRecord> {
        let has = |column: &str| self.headers.iter().any(|h| h == column);
        let county_column = if has(COUNTY) {
            Some(COUNTY)
        } else if has(COUNTY_NAME) {
            Some(COUNTY_NAME)
        } else {
            None
        };

        self.records
            .iter()
            .filter(|record| {
                if has(LAND_AREA)
                    && !within(record.number(LAND_AREA), filter.min_acres, filter.max_acres)
                {
                    return false;
                }
                if has(PRICE) && !within(record.number(PRICE), filter.min_price, filter.max_price)
                {
                    return false;
                }
                if let Some(ref state) = filter.state {
                    if has(STATE) && record.text(STATE) != *state {
                        return false;
                    }
                }
                if !filter.cities.is_empty()
                    && has(CITY)
                    && !filter.cities.contains(&record.text(CITY))
                {
                    return false;
                }
                if let Some(column) = county_column {
                    if !filter.counties.is_empty() && !filter.counties.contains(&record.text(column))
                    {
                        return false;
                    }
                }
                true
            })
            .collect()
    }
}

/// Normalize a freshly parsed record in place.
fn clean_record(record: &mut PropertyRecord) {
    for column in CRITICAL_COLUMNS {
        if let Some(cell) = record.get_mut(column) {
            if cell.is_empty() {
                *cell = CellValue::Text("Unknown".to_string());
            }
        }
    }
}

/// Check an optional value against optional inclusive bounds.
fn within(value: Option<f64>, min: Option<f64>, max: Option<f64>) -> bool {
    if min.is_none() && max.is_none() {
        return true;
    }
    let Some(v) = value else {
        return false;
    };
    min.map_or(true, |m| v >= m) && max.map_or(true, |m| v <= m)
}
