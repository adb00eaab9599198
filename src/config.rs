// Settings layered from defaults, an optional config.toml and APP_* variables

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::Deserialize;
use std::time::Duration;

use crate::carousel::{Breakpoints, CarouselOptions};
use crate::catalog::DataSource;

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub server_address: String,
    /// Path to the cars JSON file or an http(s) URL serving it.
    pub data_source: String,
    pub static_dir: String,
    pub cars_per_page: usize,
    pub popular_limit: usize,
    /// "standard" or "legacy"
    pub carousel_breakpoints: String,
    pub carousel_infinite: bool,
    pub autoplay_ms: u64,
    pub transition_ms: u64,
    pub swipe_threshold_px: f64,
    /// Viewport width assumed when the client did not report one.
    pub default_viewport_width: u32,
    pub form_endpoint: Option<String>,
    pub ui_cache_entries: usize,
    pub ui_cache_max_value_bytes: usize,
}

impl Settings {
    pub fn new() -> Result<Self> {
        dotenv::dotenv().ok();

        let builder = Self::defaults(Config::builder())?
            .add_source(File::with_name("config").required(false))
            // e.g. APP_DATA_SOURCE, APP_FORM_ENDPOINT
            .add_source(Environment::with_prefix("APP").prefix_separator("_").separator("__"));

        let settings = builder
            .build()
            .context("Failed to assemble configuration")?
            .try_deserialize()
            .context("Failed to parse configuration")?;
        Ok(settings)
    }

    fn defaults(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
    ) -> Result<config::ConfigBuilder<config::builder::DefaultState>> {
        Ok(builder
            .set_default("server_address", "127.0.0.1:3000")?
            .set_default("data_source", "data/cars.json")?
            .set_default("static_dir", "static")?
            .set_default("cars_per_page", 9)?
            .set_default("popular_limit", 5)?
            .set_default("carousel_breakpoints", "standard")?
            .set_default("carousel_infinite", true)?
            .set_default("autoplay_ms", 5000)?
            .set_default("transition_ms", 500)?
            .set_default("swipe_threshold_px", 50.0)?
            .set_default("default_viewport_width", 1280)?
            .set_default("ui_cache_entries", 256)?
            .set_default("ui_cache_max_value_bytes", 16 * 1024)?)
    }

    pub fn data_source(&self) -> DataSource {
        DataSource::parse(&self.data_source)
    }

    pub fn autoplay_interval(&self) -> Duration {
        Duration::from_millis(self.autoplay_ms)
    }

    pub fn transition_duration(&self) -> Duration {
        Duration::from_millis(self.transition_ms)
    }

    pub fn carousel_options(&self) -> CarouselOptions {
        let breakpoints = Breakpoints::named(&self.carousel_breakpoints).unwrap_or_else(|| {
            tracing::warn!(
                "Unknown carousel breakpoint table '{}', using the standard one",
                self.carousel_breakpoints
            );
            Breakpoints::standard()
        });
        CarouselOptions {
            infinite: self.carousel_infinite,
            breakpoints,
            swipe_threshold: self.swipe_threshold_px,
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server_address: "127.0.0.1:3000".to_string(),
            data_source: "data/cars.json".to_string(),
            static_dir: "static".to_string(),
            cars_per_page: 9,
            popular_limit: 5,
            carousel_breakpoints: "standard".to_string(),
            carousel_infinite: true,
            autoplay_ms: 5000,
            transition_ms: 500,
            swipe_threshold_px: 50.0,
            default_viewport_width: 1280,
            form_endpoint: None,
            ui_cache_entries: 256,
            ui_cache_max_value_bytes: 16 * 1024,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_deserialize_without_any_source() {
        let settings: Settings = Settings::defaults(Config::builder())
            .unwrap()
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();
        assert_eq!(settings.cars_per_page, 9);
        assert_eq!(settings.transition_duration(), Duration::from_millis(500));
        assert_eq!(settings.autoplay_interval(), crate::autoplay::DEFAULT_AUTOPLAY_INTERVAL);
        assert!(settings.form_endpoint.is_none());
        assert!(matches!(settings.data_source(), DataSource::File(_)));
    }

    #[test]
    fn unknown_breakpoint_table_falls_back() {
        let settings = Settings {
            carousel_breakpoints: "tablet-first".into(),
            ..Settings::default()
        };
        assert_eq!(settings.carousel_options().breakpoints.items_for(800), 2);
        let legacy = Settings {
            carousel_breakpoints: "legacy".into(),
            ..Settings::default()
        };
        assert_eq!(legacy.carousel_options().breakpoints.items_for(768), 2);
    }
}
