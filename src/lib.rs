//! MinivanRent: minivan rental site with a filterable catalog, a popular-cars
//! carousel and contact forms.

use axum::{extract::FromRef, Router};
use reqwest::Client;
use std::sync::Arc;
use tower_http::{services::ServeDir, trace::TraceLayer};

pub mod autoplay;
pub mod availability;
pub mod booking;
pub mod cache;
pub mod carousel;
pub mod catalog;
pub mod config;
pub mod error;
pub mod filters;
pub mod format;
pub mod forms;
pub mod models;
pub mod pagination;
pub mod routes;
pub mod views;

use crate::cache::UiCache;
use crate::catalog::CatalogHandle;
use crate::config::Settings;
use crate::filters::FilterEngine;
use crate::forms::FormSubmitter;
use crate::pagination::Paginator;

#[derive(Clone, FromRef)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub http_client: Arc<Client>,
    pub catalog: CatalogHandle,
    pub ui_cache: Arc<UiCache>,
    pub forms: Arc<FormSubmitter>,
    pub filters: FilterEngine,
    pub paginator: Paginator,
}

impl AppState {
    pub fn new(settings: Settings, http_client: Client, catalog: CatalogHandle) -> Self {
        let forms = FormSubmitter::new(http_client.clone(), settings.form_endpoint.clone());
        Self {
            ui_cache: Arc::new(UiCache::new(settings.ui_cache_entries, settings.ui_cache_max_value_bytes)),
            forms: Arc::new(forms),
            filters: FilterEngine::default(),
            paginator: Paginator::new(settings.cars_per_page),
            http_client: Arc::new(http_client),
            settings: Arc::new(settings),
            catalog,
        }
    }
}

/// Routes plus static files and request tracing.
pub fn build_app(app_state: AppState) -> Router {
    let static_dir = app_state.settings.static_dir.clone();
    routes::create_router(app_state)
        .nest_service("/static", ServeDir::new(static_dir))
        .layer(TraceLayer::new_for_http())
}
