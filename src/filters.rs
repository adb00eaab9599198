//! Catalog filtering and filter-state <-> query-string synchronization.
//!
//! [`FilterCriteria`] is rebuilt from the request query on every application
//! and never mutated in place; edits go through the consuming `with_*`
//! builders so the price cross-clamping policy is applied in one spot.

use serde::{Deserialize, Serialize};

use crate::catalog::{CarCatalog, PriceBounds};
use crate::models::{CarRecord, Transmission};

/// A fixed deposit bucket. `max` is exclusive, `None` means unbounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DepositBracket {
    pub key: &'static str,
    pub label: &'static str,
    pub min: u32,
    pub max: Option<u32>,
}

impl DepositBracket {
    pub fn contains(&self, deposit: u32) -> bool {
        deposit >= self.min && self.max.is_none_or(|max| deposit < max)
    }
}

pub const DEPOSIT_BRACKETS: [DepositBracket; 5] = [
    DepositBracket { key: "0-10000", label: "до 10 000 ₽", min: 0, max: Some(10_000) },
    DepositBracket { key: "10000-25000", label: "10 000 - 25 000 ₽", min: 10_000, max: Some(25_000) },
    DepositBracket { key: "25000-50000", label: "25 000 - 50 000 ₽", min: 25_000, max: Some(50_000) },
    DepositBracket { key: "50000-100000", label: "50 000 - 100 000 ₽", min: 50_000, max: Some(100_000) },
    DepositBracket { key: "100000+", label: "свыше 100 000 ₽", min: 100_000, max: None },
];

pub fn deposit_bracket(key: &str) -> Option<&'static DepositBracket> {
    DEPOSIT_BRACKETS.iter().find(|bracket| bracket.key == key)
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterCriteria {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transmission: Option<Transmission>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fuel_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seats: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deposit: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_price: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_price: Option<u32>,
}

impl FilterCriteria {
    /// Build criteria from a raw query string. Blank, malformed and unknown
    /// parameters are ignored; everything else is taken as given, so inverted
    /// price bounds survive a round trip.
    pub fn from_query(raw: &str) -> Self {
        let pairs: Vec<(String, String)> = match serde_urlencoded::from_str(raw) {
            Ok(pairs) => pairs,
            Err(e) => {
                tracing::debug!("Ignoring undecodable filter query '{}': {}", raw, e);
                return Self::default();
            }
        };

        pairs.into_iter().fold(Self::default(), |criteria, (key, value)| {
            let trimmed = value.trim();
            if trimmed.is_empty() {
                return criteria;
            }
            match key.as_str() {
                "brand" => Self { brand: Some(value), ..criteria },
                "model" => Self { model: Some(value), ..criteria },
                "year" => Self { year: parse_number(&key, trimmed).or(criteria.year), ..criteria },
                "transmission" => Self {
                    transmission: Transmission::parse(trimmed).or(criteria.transmission),
                    ..criteria
                },
                "fuelType" => Self { fuel_type: Some(value), ..criteria },
                "seats" => Self { seats: parse_number(&key, trimmed).or(criteria.seats), ..criteria },
                "deposit" => Self { deposit: Some(value), ..criteria },
                "minPrice" => Self { min_price: parse_number(&key, trimmed).or(criteria.min_price), ..criteria },
                "maxPrice" => Self { max_price: parse_number(&key, trimmed).or(criteria.max_price), ..criteria },
                _ => criteria,
            }
        })
    }

    /// Active, non-default criteria as a query string (`""` when nothing is set).
    pub fn to_query_string(&self) -> String {
        serde_urlencoded::to_string(self.normalized()).unwrap_or_else(|e| {
            tracing::warn!("Failed to encode filter criteria: {}", e);
            String::new()
        })
    }

    /// Drop values that mean "no constraint" so they are not published.
    pub fn normalized(&self) -> Self {
        Self {
            min_price: self.min_price.filter(|min| *min > 0),
            ..self.clone()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.normalized() == Self::default()
    }

    /// Set the lower price bound. A lower bound above the current upper
    /// bound drags the upper bound along.
    pub fn with_min_price(self, min_price: Option<u32>) -> Self {
        let max_price = match (min_price, self.max_price) {
            (Some(min), Some(max)) if min > max => Some(min),
            (_, max) => max,
        };
        Self { min_price, max_price, ..self }
    }

    /// Set the upper price bound. An upper bound below the current lower
    /// bound drags the lower bound along.
    pub fn with_max_price(self, max_price: Option<u32>) -> Self {
        let min_price = match (max_price, self.min_price) {
            (Some(max), Some(min)) if max < min => Some(max),
            (_, min) => min,
        };
        Self { min_price, max_price, ..self }
    }

    /// Re-apply the cross-clamp as though `field` was the bound just edited.
    pub fn after_price_edit(self, field: PriceField) -> Self {
        match field {
            PriceField::Min => {
                let min_price = self.min_price;
                self.with_min_price(min_price)
            }
            PriceField::Max => {
                let max_price = self.max_price;
                self.with_max_price(max_price)
            }
        }
    }

    pub fn matches(&self, car: &CarRecord) -> bool {
        if self.brand.as_ref().is_some_and(|brand| car.brand != *brand) {
            return false;
        }
        if self.model.as_ref().is_some_and(|model| car.model != *model) {
            return false;
        }
        if self.year.is_some_and(|year| car.year != year) {
            return false;
        }
        if self.transmission.is_some_and(|t| car.transmission != t) {
            return false;
        }
        if self.fuel_type.as_ref().is_some_and(|fuel| car.fuel_type != *fuel) {
            return false;
        }
        if self.seats.is_some_and(|seats| car.seats != seats) {
            return false;
        }

        let price = car.base_price();
        if price < self.min_price.unwrap_or(0) || self.max_price.is_some_and(|max| price > max) {
            return false;
        }

        // Unknown bracket keys do not constrain anything
        if let Some(bracket) = self.deposit.as_deref().and_then(deposit_bracket) {
            if !bracket.contains(car.deposit) {
                return false;
            }
        }

        true
    }
}

/// Which price input the user changed last.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriceField {
    Min,
    Max,
}

impl PriceField {
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "minPrice" => Some(PriceField::Min),
            "maxPrice" => Some(PriceField::Max),
            _ => None,
        }
    }
}

fn parse_number(key: &str, value: &str) -> Option<u32> {
    match value.parse() {
        Ok(number) => Some(number),
        Err(_) => {
            tracing::debug!("Ignoring non-numeric filter value {}={}", key, value);
            None
        }
    }
}

/// Pure filter: keeps catalog order, never touches the input.
pub fn apply<'a>(cars: &'a [CarRecord], criteria: &FilterCriteria) -> Vec<&'a CarRecord> {
    cars.iter().filter(|car| criteria.matches(car)).collect()
}

/// Wording of the "N cars found" line. Swap the implementation to localize.
pub trait CountPhrasing: Send + Sync {
    fn count_text(&self, count: usize) -> String;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RussianCountText;

impl CountPhrasing for RussianCountText {
    fn count_text(&self, count: usize) -> String {
        match count {
            0 => "Ничего не найдено".to_string(),
            1 => "Найден 1 автомобиль".to_string(),
            2..=4 => format!("Найдено {} автомобиля", count),
            _ => format!("Найдено {} автомобилей", count),
        }
    }
}

/// Result of one filter application.
#[derive(Debug, Clone)]
pub struct FilterOutcome<'a> {
    pub cars: Vec<&'a CarRecord>,
    pub count_text: String,
    /// Canonical query string for the applied criteria, for shareable links.
    pub query: String,
}

#[derive(Debug, Clone, Default)]
pub struct FilterEngine<P = RussianCountText> {
    phrasing: P,
}

impl<P: CountPhrasing> FilterEngine<P> {
    pub fn new(phrasing: P) -> Self {
        Self { phrasing }
    }

    pub fn run<'a>(&self, catalog: &'a CarCatalog, criteria: &FilterCriteria) -> FilterOutcome<'a> {
        let cars = apply(catalog.cars(), criteria);
        tracing::debug!(matched = cars.len(), total = catalog.len(), "Filters applied");
        FilterOutcome {
            count_text: self.phrasing.count_text(cars.len()),
            query: criteria.to_query_string(),
            cars,
        }
    }
}

/// Choices offered by the filter form, derived from the catalog.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterOptions {
    pub brands: Vec<String>,
    pub models: Vec<String>,
    pub years: Vec<u32>,
    pub fuel_types: Vec<String>,
    pub seats: Vec<u32>,
    pub deposits: Vec<DepositBracket>,
    pub price_bounds: Option<PriceBounds>,
}

impl FilterOptions {
    pub fn from_catalog(catalog: &CarCatalog, criteria: &FilterCriteria) -> Self {
        Self {
            brands: catalog.brands(),
            models: catalog.models_for(criteria.brand.as_deref()),
            years: catalog.years(),
            fuel_types: catalog.fuel_types(),
            seats: catalog.seat_counts(),
            deposits: DEPOSIT_BRACKETS.to_vec(),
            price_bounds: catalog.price_bounds(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::fixtures::car;
    use rand::{rngs::StdRng, Rng, SeedableRng};

    fn ids(cars: &[&CarRecord]) -> Vec<u32> {
        cars.iter().map(|car| car.id).collect()
    }

    #[test]
    fn empty_criteria_keep_everything_in_order() {
        let cars = vec![
            car(3, "Kia", "Carnival", 7000, 20000),
            car(1, "Toyota", "Alphard", 12000, 50000),
            car(2, "Kia", "Sorento", 6000, 15000),
        ];
        let result = apply(&cars, &FilterCriteria::default());
        assert_eq!(ids(&result), vec![3, 1, 2]);
    }

    #[test]
    fn brand_filter_is_exact() {
        let cars = vec![car(1, "Kia", "Carnival", 7000, 20000), car(2, "Kia Motors", "Ceed", 5000, 10000)];
        let criteria = FilterCriteria { brand: Some("Kia".into()), ..Default::default() };
        assert_eq!(ids(&apply(&cars, &criteria)), vec![1]);
    }

    #[test]
    fn deposit_bracket_is_half_open() {
        let cars = vec![
            car(1, "Kia", "A", 5000, 25_000),
            car(2, "Kia", "B", 5000, 50_000),
            car(3, "Kia", "C", 5000, 49_999),
        ];
        let criteria = FilterCriteria { deposit: Some("25000-50000".into()), ..Default::default() };
        assert_eq!(ids(&apply(&cars, &criteria)), vec![1, 3]);
    }

    #[test]
    fn open_ended_and_unknown_brackets() {
        let cars = vec![car(1, "Kia", "A", 5000, 100_000), car(2, "Kia", "B", 5000, 99_999)];
        let over = FilterCriteria { deposit: Some("100000+".into()), ..Default::default() };
        assert_eq!(ids(&apply(&cars, &over)), vec![1]);

        let unknown = FilterCriteria { deposit: Some("cheap".into()), ..Default::default() };
        assert_eq!(ids(&apply(&cars, &unknown)), vec![1, 2]);
    }

    #[test]
    fn price_range_uses_base_price_inclusively() {
        let cars = vec![
            car(1, "Kia", "A", 5000, 0),
            car(2, "Kia", "B", 7000, 0),
            car(3, "Kia", "C", 9000, 0),
        ];
        let criteria = FilterCriteria { min_price: Some(5000), max_price: Some(7000), ..Default::default() };
        assert_eq!(ids(&apply(&cars, &criteria)), vec![1, 2]);
    }

    #[test]
    fn raising_min_above_max_moves_max() {
        let criteria = FilterCriteria::default()
            .with_max_price(Some(5000))
            .with_min_price(Some(8000));
        assert_eq!(criteria.min_price, Some(8000));
        assert_eq!(criteria.max_price, Some(8000));
    }

    #[test]
    fn lowering_max_below_min_moves_min() {
        let criteria = FilterCriteria::default()
            .with_min_price(Some(8000))
            .with_max_price(Some(3000));
        assert_eq!(criteria.min_price, Some(3000));
        assert_eq!(criteria.max_price, Some(3000));
    }

    #[test]
    fn query_string_only_carries_active_fields() {
        let criteria = FilterCriteria {
            brand: Some("Toyota".into()),
            transmission: Some(Transmission::Manual),
            min_price: Some(0),
            max_price: Some(9000),
            ..Default::default()
        };
        assert_eq!(criteria.to_query_string(), "brand=Toyota&transmission=manual&maxPrice=9000");
        assert_eq!(FilterCriteria::default().to_query_string(), "");
    }

    #[test]
    fn from_query_ignores_blank_and_malformed_values() {
        let criteria = FilterCriteria::from_query("brand=&year=abc&seats=7&fuelType=%D0%94%D0%B8%D0%B7%D0%B5%D0%BB%D1%8C&page=3&transmission=hybrid");
        assert_eq!(
            criteria,
            FilterCriteria { seats: Some(7), fuel_type: Some("Дизель".into()), ..Default::default() }
        );
    }

    #[test]
    fn from_query_keeps_inverted_bounds() {
        let criteria = FilterCriteria::from_query("minPrice=9000&maxPrice=4000");
        assert_eq!((criteria.min_price, criteria.max_price), (Some(9000), Some(4000)));
    }

    #[test]
    fn price_edit_drags_the_other_bound() {
        let criteria = FilterCriteria::from_query("minPrice=9000&maxPrice=4000");
        let raised = criteria.clone().after_price_edit(PriceField::Min);
        assert_eq!((raised.min_price, raised.max_price), (Some(9000), Some(9000)));
        let lowered = criteria.after_price_edit(PriceField::Max);
        assert_eq!((lowered.min_price, lowered.max_price), (Some(4000), Some(4000)));
        assert_eq!(PriceField::parse("brand"), None);
    }

    #[test]
    fn from_query_keeps_surrounding_spaces_in_text_values() {
        let criteria = FilterCriteria::from_query("brand=%20Kia&seats=%207%20");
        assert_eq!(criteria.brand.as_deref(), Some(" Kia"));
        assert_eq!(criteria.seats, Some(7));
        assert_eq!(FilterCriteria::from_query(&criteria.to_query_string()), criteria);
    }

    #[test]
    fn count_text_follows_russian_plural_forms() {
        let phrasing = RussianCountText;
        assert_eq!(phrasing.count_text(0), "Ничего не найдено");
        assert_eq!(phrasing.count_text(1), "Найден 1 автомобиль");
        assert_eq!(phrasing.count_text(3), "Найдено 3 автомобиля");
        assert_eq!(phrasing.count_text(12), "Найдено 12 автомобилей");
    }

    const BRANDS: [&str; 3] = ["Kia", "Toyota", "Hyundai"];
    const MODELS: [&str; 3] = ["Carnival", "Alphard", "Staria"];
    const FUELS: [&str; 2] = ["Бензин", "Дизель"];

    fn random_car(rng: &mut StdRng, id: u32) -> CarRecord {
        let mut c = car(
            id,
            BRANDS[rng.gen_range(0..BRANDS.len())],
            MODELS[rng.gen_range(0..MODELS.len())],
            rng.gen_range(3..15) * 1000,
            rng.gen_range(0..13) * 10_000,
        );
        c.year = rng.gen_range(2018..2024);
        c.seats = rng.gen_range(5..10);
        c.fuel_type = FUELS[rng.gen_range(0..FUELS.len())].to_string();
        c.transmission = if rng.gen_bool(0.5) { Transmission::Automatic } else { Transmission::Manual };
        c
    }

    fn random_criteria(rng: &mut StdRng) -> FilterCriteria {
        let pick = |rng: &mut StdRng| rng.gen_bool(0.3);
        let mut criteria = FilterCriteria {
            brand: pick(rng).then(|| BRANDS[rng.gen_range(0..BRANDS.len())].to_string()),
            model: pick(rng).then(|| MODELS[rng.gen_range(0..MODELS.len())].to_string()),
            year: pick(rng).then(|| rng.gen_range(2018..2024)),
            transmission: pick(rng).then_some(Transmission::Automatic),
            fuel_type: pick(rng).then(|| FUELS[rng.gen_range(0..FUELS.len())].to_string()),
            seats: pick(rng).then(|| rng.gen_range(5..10)),
            deposit: pick(rng).then(|| DEPOSIT_BRACKETS[rng.gen_range(0..DEPOSIT_BRACKETS.len())].key.to_string()),
            ..Default::default()
        };
        // Bounds are drawn independently, so some come out inverted
        if pick(rng) {
            criteria.min_price = Some(rng.gen_range(1..15) * 1000);
        }
        if pick(rng) {
            criteria.max_price = Some(rng.gen_range(1..15) * 1000);
        }
        criteria
    }

    // Independent restatement of the matching rules
    fn expected(car: &CarRecord, c: &FilterCriteria) -> bool {
        let price = car.prices[&1];
        let deposit_ok = match c.deposit.as_deref() {
            Some("0-10000") => car.deposit < 10_000,
            Some("10000-25000") => (10_000..25_000).contains(&car.deposit),
            Some("25000-50000") => (25_000..50_000).contains(&car.deposit),
            Some("50000-100000") => (50_000..100_000).contains(&car.deposit),
            Some("100000+") => car.deposit >= 100_000,
            _ => true,
        };
        c.brand.as_ref().map_or(true, |b| &car.brand == b)
            && c.model.as_ref().map_or(true, |m| &car.model == m)
            && c.year.map_or(true, |y| car.year == y)
            && c.transmission.map_or(true, |t| car.transmission == t)
            && c.fuel_type.as_ref().map_or(true, |f| &car.fuel_type == f)
            && c.seats.map_or(true, |s| car.seats == s)
            && c.min_price.map_or(true, |min| price >= min)
            && c.max_price.map_or(true, |max| price <= max)
            && deposit_ok
    }

    #[test]
    fn random_catalogs_match_exactly_the_satisfying_cars() {
        let mut rng = StdRng::seed_from_u64(0x5eed);
        for _ in 0..200 {
            let size = rng.gen_range(0..40);
            let cars: Vec<CarRecord> = (0..size).map(|id| random_car(&mut rng, id)).collect();
            let criteria = random_criteria(&mut rng);

            let got = ids(&apply(&cars, &criteria));
            let want: Vec<u32> = cars.iter().filter(|c| expected(c, &criteria)).map(|c| c.id).collect();
            assert_eq!(got, want, "criteria: {:?}", criteria);

            if let Some(brand) = &criteria.brand {
                assert!(apply(&cars, &criteria).iter().all(|c| &c.brand == brand));
            }
        }
    }

    #[test]
    fn query_round_trip_preserves_results() {
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..100 {
            let cars: Vec<CarRecord> = (0..30).map(|id| random_car(&mut rng, id)).collect();
            let criteria = random_criteria(&mut rng);

            let reparsed = FilterCriteria::from_query(&criteria.to_query_string());
            assert_eq!(ids(&apply(&cars, &reparsed)), ids(&apply(&cars, &criteria)));
            assert_eq!(reparsed, criteria.normalized());
        }
    }

    #[test]
    fn query_round_trip_preserves_inverted_bounds_and_padded_values() {
        let cars = vec![car(1, "Kia", "Carnival", 3000, 0), car(2, " Kia", "Carnival", 6000, 0)];
        let cases = [
            FilterCriteria { min_price: Some(5000), max_price: Some(3000), ..Default::default() },
            FilterCriteria { brand: Some(" Kia".into()), ..Default::default() },
        ];
        for criteria in cases {
            let reparsed = FilterCriteria::from_query(&criteria.to_query_string());
            assert_eq!(ids(&apply(&cars, &reparsed)), ids(&apply(&cars, &criteria)));
            assert_eq!(reparsed, criteria);
        }
    }

    #[test]
    fn engine_reports_count_and_query() {
        let catalog = CarCatalog::new(vec![car(1, "Kia", "Carnival", 7000, 20000), car(2, "Toyota", "Alphard", 12000, 50000)]);
        let criteria = FilterCriteria { brand: Some("Kia".into()), ..Default::default() };
        let outcome = FilterEngine::<RussianCountText>::default().run(&catalog, &criteria);
        assert_eq!(ids(&outcome.cars), vec![1]);
        assert_eq!(outcome.count_text, "Найден 1 автомобиль");
        assert_eq!(outcome.query, "brand=Kia");
    }

    #[test]
    fn options_narrow_models_to_selected_brand() {
        let catalog = CarCatalog::new(vec![car(1, "Kia", "Carnival", 7000, 20000), car(2, "Toyota", "Alphard", 12000, 50000)]);
        let criteria = FilterCriteria { brand: Some("Toyota".into()), ..Default::default() };
        let options = FilterOptions::from_catalog(&catalog, &criteria);
        assert_eq!(options.models, vec!["Alphard"]);
        assert_eq!(options.brands, vec!["Kia", "Toyota"]);
        assert_eq!(options.deposits.len(), 5);
    }
}
