//! Load catalog: the loads the desk can book and their board rates

use crate::error::{RateDeskError, Result};
use crate::types::LoadId;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Most loads returned by a single search
pub const SEARCH_LIMIT: usize = 10;

/// A load as listed on the board
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LoadRecord {
    pub load_id: LoadId,
    pub origin: String,
    pub destination: String,
    pub pickup_datetime: String,
    pub delivery_datetime: String,
    pub equipment_type: String,
    pub loadboard_rate: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commodity_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub num_of_pieces: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub miles: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dimensions: Option<String>,
}

/// Search criteria from the agent; every field is optional
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct LoadFilter {
    pub origin: Option<String>,
    pub destination: Option<String>,
    pub max_miles: Option<f64>,
}

impl LoadFilter {
    /// Case-insensitive substring match on lanes; loads without a mileage
    /// always pass the miles cap, and a zero cap means no cap.
    pub fn matches(&self, load: &LoadRecord) -> bool {
        if let Some(origin) = non_blank(&self.origin) {
            if !contains_ignore_case(&load.origin, origin) {
                return false;
            }
        }
        if let Some(destination) = non_blank(&self.destination) {
            if !contains_ignore_case(&load.destination, destination) {
                return false;
            }
        }
        if let (Some(max), Some(miles)) = (self.max_miles, load.miles) {
            if max > 0.0 && miles > 0.0 && miles > max {
                return false;
            }
        }
        true
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

/// Read-only source of loads
pub trait LoadCatalog: Send + Sync {
    fn get(&self, load_id: &LoadId) -> Option<LoadRecord>;

    fn loads(&self) -> Vec<LoadRecord>;

    /// Board rate for a load; a miss is an error, never a default
    fn board_rate(&self, load_id: &LoadId) -> Result<Decimal> {
        self.get(load_id)
            .map(|load| load.loadboard_rate)
            .ok_or_else(|| RateDeskError::LoadNotFound(load_id.0.clone()))
    }

    /// First [`SEARCH_LIMIT`] loads matching `filter`, in catalog order
    fn search(&self, filter: &LoadFilter) -> Vec<LoadRecord> {
        self.loads()
            .into_iter()
            .filter(|load| filter.matches(load))
            .take(SEARCH_LIMIT)
            .collect()
    }
}

/// Catalog held entirely in memory
#[derive(Clone, Debug, Default)]
pub struct InMemoryCatalog {
    loads: Vec<LoadRecord>,
}

impl InMemoryCatalog {
    pub fn new(loads: Vec<LoadRecord>) -> Self {
        Self { loads }
    }

    /// Load a JSON array of load records. A missing file is an empty catalog.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            tracing::warn!("Loads file {} not found, starting with an empty catalog", path.display());
            return Ok(Self::default());
        }

        let raw = std::fs::read_to_string(path)?;
        let loads: Vec<LoadRecord> = serde_json::from_str(&raw)
            .map_err(|e| RateDeskError::Catalog(format!("{}: {}", path.display(), e)))?;

        tracing::info!("Loaded {} loads from {}", loads.len(), path.display());
        Ok(Self::new(loads))
    }

    pub fn len(&self) -> usize {
        self.loads.len()
    }

    pub fn is_empty(&self) -> bool {
        self.loads.is_empty()
    }
}

impl LoadCatalog for InMemoryCatalog {
    fn get(&self, load_id: &LoadId) -> Option<LoadRecord> {
        self.loads
            .iter()
            .find(|load| load.load_id.0.trim() == load_id.0.trim())
            .cloned()
    }

    fn loads(&self) -> Vec<LoadRecord> {
        self.loads.clone()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::io::Write;

    pub(crate) fn load(id: &str, origin: &str, destination: &str, rate: Decimal) -> LoadRecord {
        LoadRecord {
            load_id: LoadId::new(id),
            origin: origin.to_string(),
            destination: destination.to_string(),
            pickup_datetime: "2025-09-01T08:00:00Z".to_string(),
            delivery_datetime: "2025-09-02T17:00:00Z".to_string(),
            equipment_type: "Dry Van".to_string(),
            loadboard_rate: rate,
            notes: None,
            weight: Some(42000.0),
            commodity_type: None,
            num_of_pieces: None,
            miles: None,
            dimensions: None,
        }
    }

    pub(crate) fn sample_catalog() -> InMemoryCatalog {
        let mut chicago = load("L1001", "Chicago, IL", "Dallas, TX", dec!(1000));
        chicago.miles = Some(925.0);
        let mut atlanta = load("L1002", "Atlanta, GA", "Miami, FL", dec!(1800));
        atlanta.miles = Some(660.0);
        let denver = load("L1003", "Denver, CO", "Chicago, IL", dec!(2400));
        InMemoryCatalog::new(vec![chicago, atlanta, denver])
    }

    #[test]
    fn test_board_rate_lookup() {
        let catalog = sample_catalog();
        assert_eq!(catalog.board_rate(&LoadId::new("L1002")).unwrap(), dec!(1800));
        assert!(matches!(
            catalog.board_rate(&LoadId::new("L9999")),
            Err(RateDeskError::LoadNotFound(id)) if id == "L9999"
        ));
    }

    #[test]
    fn test_search_filters() {
        let catalog = sample_catalog();

        let by_origin = catalog.search(&LoadFilter {
            origin: Some("chicago".to_string()),
            ..Default::default()
        });
        assert_eq!(by_origin.len(), 1);
        assert_eq!(by_origin[0].load_id, LoadId::new("L1001"));

        let by_destination = catalog.search(&LoadFilter {
            destination: Some("CHICAGO".to_string()),
            ..Default::default()
        });
        assert_eq!(by_destination[0].load_id, LoadId::new("L1003"));

        // L1003 has no mileage and passes the cap
        let short_haul = catalog.search(&LoadFilter {
            max_miles: Some(700.0),
            ..Default::default()
        });
        let ids: Vec<_> = short_haul.iter().map(|l| l.load_id.0.as_str()).collect();
        assert_eq!(ids, vec!["L1002", "L1003"]);

        assert_eq!(catalog.search(&LoadFilter::default()).len(), 3);
    }

    #[test]
    fn test_search_is_capped() {
        let loads = (0..25)
            .map(|i| load(&format!("L2{:03}", i), "Reno, NV", "Boise, ID", dec!(900)))
            .collect();
        let catalog = InMemoryCatalog::new(loads);
        assert_eq!(catalog.search(&LoadFilter::default()).len(), SEARCH_LIMIT);
    }

    #[test]
    fn test_from_json_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[{{"load_id":"L1001","origin":"Chicago, IL","destination":"Dallas, TX",
                "pickup_datetime":"2025-09-01T08:00:00Z","delivery_datetime":"2025-09-02T17:00:00Z",
                "equipment_type":"Reefer","loadboard_rate":1450.5,"miles":925}}]"#
        )
        .unwrap();

        let catalog = InMemoryCatalog::from_json_file(file.path()).unwrap();
        assert_eq!(catalog.len(), 1);
        let record = catalog.get(&LoadId::new("L1001")).unwrap();
        assert_eq!(record.loadboard_rate, dec!(1450.5));
        assert_eq!(record.miles, Some(925.0));
        assert_eq!(record.notes, None);
    }

    #[test]
    fn test_missing_file_is_empty_catalog() {
        let catalog = InMemoryCatalog::from_json_file("/nonexistent/loads.json").unwrap();
        assert!(catalog.is_empty());
    }

    #[test]
    fn test_malformed_file_is_catalog_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{not json").unwrap();
        assert!(matches!(
            InMemoryCatalog::from_json_file(file.path()),
            Err(RateDeskError::Catalog(_))
        ));
    }
}
