//! In-memory car catalog and the load state shared with request handlers.
//!
//! The catalog is fetched once at startup, either from a file next to the
//! binary or from an HTTP(S) URL. Until the fetch resolves, handlers see
//! [`CatalogStatus::Loading`] and must not filter or paginate. A failed fetch
//! is terminal for the process and is reported on every page instead.

use reqwest::Client;
use serde::Serialize;
use std::{collections::BTreeSet, path::PathBuf, sync::Arc};
use tokio::{sync::RwLock, task::JoinHandle};

use crate::models::CarRecord;

// Shown on the homepage when no car is marked popular
const FALLBACK_CAROUSEL_CARS: usize = 4;

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("failed to read car data from {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to fetch car data: {0}")]
    Http(#[from] reqwest::Error),
    #[error("car data request returned status {0}")]
    Status(u16),
    #[error("car data is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Where the car list lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataSource {
    File(PathBuf),
    Url(String),
}

impl DataSource {
    pub fn parse(value: &str) -> Self {
        if value.starts_with("http://") || value.starts_with("https://") {
            DataSource::Url(value.to_string())
        } else {
            DataSource::File(PathBuf::from(value))
        }
    }
}

impl std::fmt::Display for DataSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DataSource::File(path) => write!(f, "{}", path.display()),
            DataSource::Url(url) => f.write_str(url),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PriceBounds {
    pub min: u32,
    pub max: u32,
}

#[derive(Debug, Clone, Default)]
pub struct CarCatalog {
    cars: Vec<CarRecord>,
}

impl CarCatalog {
    pub fn new(cars: Vec<CarRecord>) -> Self {
        Self { cars }
    }

    pub async fn load(source: &DataSource, client: &Client) -> Result<Self, CatalogError> {
        let cars: Vec<CarRecord> = match source {
            DataSource::File(path) => {
                let raw = tokio::fs::read(path).await.map_err(|source| CatalogError::Io {
                    path: path.clone(),
                    source,
                })?;
                serde_json::from_slice(&raw)?
            }
            DataSource::Url(url) => {
                let response = client.get(url).send().await?;
                let status = response.status();
                if !status.is_success() {
                    return Err(CatalogError::Status(status.as_u16()));
                }
                let raw = response.bytes().await?;
                serde_json::from_slice(&raw)?
            }
        };
        tracing::info!(cars = cars.len(), %source, "Car catalog loaded");
        Ok(Self::new(cars))
    }

    pub fn cars(&self) -> &[CarRecord] {
        &self.cars
    }

    pub fn len(&self) -> usize {
        self.cars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cars.is_empty()
    }

    pub fn find_by_id(&self, id: u32) -> Option<&CarRecord> {
        self.cars.iter().find(|car| car.id == id)
    }

    pub fn brands(&self) -> Vec<String> {
        unique_sorted(self.cars.iter().map(|car| car.brand.clone()))
    }

    /// Models of one brand, or of every brand when none is selected.
    pub fn models_for(&self, brand: Option<&str>) -> Vec<String> {
        unique_sorted(
            self.cars
                .iter()
                .filter(|car| brand.is_none_or(|b| car.brand == b))
                .map(|car| car.model.clone()),
        )
    }

    /// Newest first.
    pub fn years(&self) -> Vec<u32> {
        let mut years = unique_sorted(self.cars.iter().map(|car| car.year));
        years.reverse();
        years
    }

    pub fn fuel_types(&self) -> Vec<String> {
        unique_sorted(self.cars.iter().map(|car| car.fuel_type.clone()))
    }

    pub fn seat_counts(&self) -> Vec<u32> {
        unique_sorted(self.cars.iter().map(|car| car.seats))
    }

    /// Lowest and highest base price, `None` for an empty catalog.
    pub fn price_bounds(&self) -> Option<PriceBounds> {
        let prices = self.cars.iter().map(CarRecord::base_price);
        let min = prices.clone().min()?;
        let max = prices.max()?;
        Some(PriceBounds { min, max })
    }

    /// Cars for the homepage carousel. Falls back to the head of the
    /// catalog when nothing is marked popular.
    pub fn popular(&self, limit: usize) -> Vec<&CarRecord> {
        let popular: Vec<&CarRecord> = self.cars.iter().filter(|car| car.is_popular).take(limit).collect();
        if popular.is_empty() {
            self.cars.iter().take(FALLBACK_CAROUSEL_CARS.min(limit)).collect()
        } else {
            popular
        }
    }
}

fn unique_sorted<T: Ord>(values: impl Iterator<Item = T>) -> Vec<T> {
    values.collect::<BTreeSet<_>>().into_iter().collect()
}

#[derive(Debug, Clone)]
pub enum CatalogStatus {
    Loading,
    Ready(Arc<CarCatalog>),
    Failed(String),
}

/// Shared, cheaply clonable view of the catalog load.
#[derive(Debug, Clone)]
pub struct CatalogHandle {
    status: Arc<RwLock<CatalogStatus>>,
}

impl CatalogHandle {
    pub fn loading() -> Self {
        Self {
            status: Arc::new(RwLock::new(CatalogStatus::Loading)),
        }
    }

    pub fn ready(catalog: CarCatalog) -> Self {
        Self {
            status: Arc::new(RwLock::new(CatalogStatus::Ready(Arc::new(catalog)))),
        }
    }

    pub async fn status(&self) -> CatalogStatus {
        self.status.read().await.clone()
    }

    pub async fn set_loaded(&self, result: Result<CarCatalog, CatalogError>) {
        let next = match result {
            Ok(catalog) => CatalogStatus::Ready(Arc::new(catalog)),
            Err(e) => {
                tracing::error!("Failed to load car catalog: {}", e);
                CatalogStatus::Failed(e.to_string())
            }
        };
        *self.status.write().await = next;
    }

    /// Fetch the catalog in the background. No retry on failure.
    pub fn spawn_load(&self, source: DataSource, client: Arc<Client>) -> JoinHandle<()> {
        let handle = self.clone();
        tokio::spawn(async move {
            tracing::info!(%source, "Loading car catalog...");
            let result = CarCatalog::load(&source, &client).await;
            handle.set_loaded(result).await;
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::fixtures::car;
    use std::io::Write;

    fn sample() -> CarCatalog {
        let mut a = car(1, "Toyota", "Alphard", 12000, 50000);
        a.year = 2021;
        let mut b = car(2, "Kia", "Carnival", 7000, 20000);
        b.seats = 8;
        let mut c = car(3, "Toyota", "Hiace", 9000, 30000);
        c.year = 2019;
        c.fuel_type = "Дизель".to_string();
        CarCatalog::new(vec![a, b, c])
    }

    #[test]
    fn derived_views_are_unique_and_sorted() {
        let catalog = sample();
        assert_eq!(catalog.brands(), vec!["Kia", "Toyota"]);
        assert_eq!(catalog.models_for(Some("Toyota")), vec!["Alphard", "Hiace"]);
        assert_eq!(catalog.models_for(None), vec!["Alphard", "Carnival", "Hiace"]);
        assert_eq!(catalog.years(), vec![2021, 2020, 2019]);
        assert_eq!(catalog.fuel_types(), vec!["Бензин", "Дизель"]);
        assert_eq!(catalog.seat_counts(), vec![7, 8]);
        assert_eq!(catalog.price_bounds(), Some(PriceBounds { min: 7000, max: 12000 }));
    }

    #[test]
    fn empty_catalog_has_no_price_bounds() {
        assert_eq!(CarCatalog::default().price_bounds(), None);
    }

    #[test]
    fn popular_falls_back_to_first_cars() {
        let mut catalog = sample();
        assert_eq!(catalog.popular(5).len(), 3);

        catalog.cars[1].is_popular = true;
        let popular = catalog.popular(5);
        assert_eq!(popular.len(), 1);
        assert_eq!(popular[0].id, 2);
    }

    #[test]
    fn data_source_detects_urls() {
        assert_eq!(
            DataSource::parse("https://example.com/cars.json"),
            DataSource::Url("https://example.com/cars.json".to_string())
        );
        assert_eq!(DataSource::parse("data/cars.json"), DataSource::File(PathBuf::from("data/cars.json")));
    }

    #[tokio::test]
    async fn loads_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        let cars = vec![car(7, "Kia", "Carnival", 7000, 20000)];
        file.write_all(serde_json::to_string(&cars).unwrap().as_bytes()).unwrap();

        let source = DataSource::File(file.path().to_path_buf());
        let catalog = CarCatalog::load(&source, &Client::new()).await.unwrap();
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.find_by_id(7).map(|c| c.model.as_str()), Some("Carnival"));
    }

    #[tokio::test]
    async fn failed_load_is_reported_in_status() {
        let handle = CatalogHandle::loading();
        assert!(matches!(handle.status().await, CatalogStatus::Loading));

        let source = DataSource::File(PathBuf::from("/definitely/missing/cars.json"));
        handle
            .spawn_load(source, Arc::new(Client::new()))
            .await
            .unwrap();

        match handle.status().await {
            CatalogStatus::Failed(message) => assert!(message.contains("failed to read car data")),
            other => panic!("unexpected status: {:?}", other),
        }
    }
}
