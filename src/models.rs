// Data structures shared by the catalog, the filter engine and the templates

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

use crate::format::{format_price, format_years};

/// Minimum rental lengths (in days) that a car can carry a price for.
pub const PRICE_TIERS: [u32; 5] = [1, 4, 7, 14, 21];

// Defaults shown when a car has no explicit rental rules
const DEFAULT_MIN_EXPERIENCE: &str = "3 года";
const DEFAULT_MIN_AGE: &str = "23 года";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Transmission {
    Automatic,
    Manual,
}

impl Transmission {
    /// Value used in query strings and the data file.
    pub fn as_str(&self) -> &'static str {
        match self {
            Transmission::Automatic => "automatic",
            Transmission::Manual => "manual",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "automatic" => Some(Transmission::Automatic),
            "manual" => Some(Transmission::Manual),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Transmission::Automatic => "Автоматическая",
            Transmission::Manual => "Механическая",
        }
    }

    pub fn short_label(&self) -> &'static str {
        match self {
            Transmission::Automatic => "АКПП",
            Transmission::Manual => "МКПП",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct RentalRules {
    pub min_experience: Option<u32>,
    pub min_age: Option<u32>,
}

// Written by the availability refresher (see src/availability.rs)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Availability {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub is_available: bool,
}

/// A single car as delivered by `data/cars.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CarRecord {
    pub id: u32,
    pub brand: String,
    pub model: String,
    pub year: u32,
    pub transmission: Transmission,
    pub fuel_type: String,
    pub seats: u32,
    #[serde(default, deserialize_with = "string_or_number")]
    pub engine: String,
    #[serde(default)]
    pub doors: u32,
    #[serde(default)]
    pub air_conditioning: bool,
    #[serde(default)]
    pub is_popular: bool,
    #[serde(default)]
    pub images: Vec<String>,
    // Keyed by tier ("1", "4", ...) in the JSON file
    #[serde(default)]
    pub prices: BTreeMap<u32, u32>,
    #[serde(default)]
    pub deposit: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rental_rules: Option<RentalRules>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub availability: Option<Availability>,
}

/// One row of the price table on the detail page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TierPrice {
    pub days: u32,
    pub price: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RuleLine {
    pub label: &'static str,
    pub value: String,
}

impl CarRecord {
    pub fn title(&self) -> String {
        format!("{} {}", self.brand, self.model)
    }

    pub fn primary_image(&self) -> Option<&str> {
        self.images.first().map(String::as_str)
    }

    /// Price of the 1-day tier, the value every filter and card works with.
    pub fn base_price(&self) -> u32 {
        match self.prices.get(&1) {
            Some(price) => *price,
            None => {
                tracing::warn!(car_id = self.id, "Car has no 1-day price, treating it as 0");
                0
            }
        }
    }

    /// Price per day for a rental of `days` days: the longest tier the car
    /// carries that does not exceed the rental length.
    pub fn price_for_days(&self, days: u32) -> u32 {
        PRICE_TIERS
            .iter()
            .rev()
            .filter(|tier| **tier > 1 && days >= **tier)
            .find_map(|tier| self.prices.get(tier).copied().filter(|p| *p > 0))
            .unwrap_or_else(|| self.base_price())
    }

    pub fn all_prices(&self) -> Vec<TierPrice> {
        PRICE_TIERS
            .iter()
            .map(|days| TierPrice {
                days: *days,
                price: self.prices.get(days).copied(),
            })
            .collect()
    }

    pub fn rental_rules(&self) -> Vec<RuleLine> {
        let rules = self.rental_rules.clone().unwrap_or_default();

        let experience = match rules.min_experience.filter(|v| *v > 0) {
            Some(years) => format_years(years),
            None => DEFAULT_MIN_EXPERIENCE.to_string(),
        };
        let age = match rules.min_age.filter(|v| *v > 0) {
            Some(years) => format_years(years),
            None => DEFAULT_MIN_AGE.to_string(),
        };

        vec![
            RuleLine {
                label: "Депозит",
                value: format!("{} ₽", format_price(self.deposit)),
            },
            RuleLine {
                label: "Минимальный стаж вождения",
                value: experience,
            },
            RuleLine {
                label: "Минимальный возраст",
                value: age,
            },
        ]
    }
}

// The data file stores `engine` either as "2.0" or as 2.0
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Number(serde_json::Number),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Text(text) => text,
        Raw::Number(number) => number.to_string(),
    })
}


#[cfg(test)]
mod tests {
    use super::fixtures::car;
    use super::*;

    #[test]
    fn parses_record_from_data_file_shape() {
        let raw = r#"{
            "id": 3,
            "brand": "Toyota",
            "model": "Alphard",
            "year": 2021,
            "transmission": "automatic",
            "fuelType": "Бензин",
            "seats": 7,
            "engine": 3.5,
            "doors": 5,
            "airConditioning": true,
            "isPopular": true,
            "images": ["images/alphard-1.jpg", "images/alphard-2.jpg"],
            "prices": {"1": 12000, "4": 11000, "7": 10000, "14": 9000, "21": 8000},
            "deposit": 50000,
            "rentalRules": {"minExperience": 5, "minAge": 25},
            "description": "ignored"
        }"#;

        let car: CarRecord = serde_json::from_str(raw).unwrap();
        assert_eq!(car.engine, "3.5");
        assert_eq!(car.transmission, Transmission::Automatic);
        assert_eq!(car.primary_image(), Some("images/alphard-1.jpg"));
        assert_eq!(car.base_price(), 12000);
        assert_eq!(car.prices.get(&21), Some(&8000));
        assert_eq!(car.rental_rules.as_ref().and_then(|r| r.min_age), Some(25));
    }

    #[test]
    fn price_for_days_picks_longest_applicable_tier() {
        let mut car = car(1, "Kia", "Carnival", 6000, 20000);
        car.prices = BTreeMap::from([(1, 6000), (4, 5500), (14, 4500)]);

        assert_eq!(car.price_for_days(1), 6000);
        assert_eq!(car.price_for_days(3), 6000);
        assert_eq!(car.price_for_days(5), 5500);
        // No 7-day tier on this car, so the 4-day tier still applies
        assert_eq!(car.price_for_days(10), 5500);
        assert_eq!(car.price_for_days(30), 4500);
    }

    #[test]
    fn rental_rules_fall_back_to_defaults() {
        let car = car(1, "Kia", "Carnival", 6000, 20000);
        let rules = car.rental_rules();
        assert_eq!(rules[0].value, "20\u{a0}000 ₽");
        assert_eq!(rules[1].value, "3 года");
        assert_eq!(rules[2].value, "23 года");
    }

    #[test]
    fn rental_rules_use_declension() {
        let mut car = car(1, "Kia", "Carnival", 6000, 20000);
        car.rental_rules = Some(RentalRules {
            min_experience: Some(1),
            min_age: Some(25),
        });
        let rules = car.rental_rules();
        assert_eq!(rules[1].value, "1 год");
        assert_eq!(rules[2].value, "25 лет");
    }

    #[test]
    fn all_prices_lists_every_tier() {
        let car = car(1, "Kia", "Carnival", 6000, 20000);
        let days: Vec<u32> = car.all_prices().iter().map(|t| t.days).collect();
        assert_eq!(days, PRICE_TIERS.to_vec());
        assert_eq!(car.all_prices()[1].price, None);
    }
}
