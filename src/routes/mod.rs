// Route definitions and helpers shared by the handlers

use askama::Template;
use axum::{
    response::Html,
    routing::{get, post},
    Router,
};
use chrono::{Local, NaiveDate};
use std::sync::Arc;

use crate::{
    catalog::{CarCatalog, CatalogStatus},
    error::{AppError, AppResult},
    filters::{FilterCriteria, PriceField},
    models::CarRecord,
    pagination::PageControls,
    AppState,
};

mod api;
mod contact;
mod fragments;
mod pages;


pub fn create_router(app_state: AppState) -> Router {
    let api_router = Router::new()
        .route("/cars", get(api::list_cars))
        .route("/cars/:id", get(api::get_car))
        .route("/brands", get(api::get_brands))
        .route("/models/:brand", get(api::get_models))
        .route("/price-bounds", get(api::get_price_bounds))
        .route("/prefs/:key", get(api::get_pref).put(api::put_pref).delete(api::delete_pref))
        .with_state(app_state.clone());

    Router::new()
        .route("/", get(pages::home_page))
        .route("/catalog", get(pages::catalog_page))
        .route("/cars/:id", get(pages::car_detail_page))
        .route("/contact/chat", post(contact::submit_chat))
        .route("/contact/callback", post(contact::submit_callback))
        .route("/fragments/:target", get(fragments::render_fragment))
        .nest("/api", api_router)
        .with_state(app_state)
}

pub(crate) fn today() -> NaiveDate {
    Local::now().date_naive()
}

pub(crate) fn render<T: Template>(template: &T) -> AppResult<Html<String>> {
    match template.render() {
        Ok(html) => Ok(Html(html)),
        Err(e) => {
            tracing::error!("Failed to render template: {}", e);
            Err(AppError::InternalServerError(anyhow::Error::new(e)))
        }
    }
}

/// Message shown in place of data that is not there.
#[derive(Debug, Clone)]
pub(crate) struct Notice {
    pub message: &'static str,
    pub link_href: Option<&'static str>,
    pub link_label: &'static str,
}

impl Notice {
    pub fn loading() -> Self {
        Self {
            message: "Загружаем автомобили...",
            link_href: None,
            link_label: "",
        }
    }

    pub fn failed(message: &'static str, link_label: &'static str) -> Self {
        Self {
            message,
            link_href: Some("/catalog"),
            link_label,
        }
    }
}

/// The loaded catalog, or the notice to show instead.
pub(crate) async fn catalog_or_notice(
    state: &AppState,
    failure: &'static str,
    link_label: &'static str,
) -> Result<Arc<CarCatalog>, Notice> {
    match state.catalog.status().await {
        CatalogStatus::Ready(catalog) => Ok(catalog),
        CatalogStatus::Loading => Err(Notice::loading()),
        CatalogStatus::Failed(_) => Err(Notice::failed(failure, link_label)),
    }
}

/// The loaded catalog, or a 503 for API and fragment callers.
pub(crate) async fn ready_catalog(state: &AppState) -> AppResult<Arc<CarCatalog>> {
    match state.catalog.status().await {
        CatalogStatus::Ready(catalog) => Ok(catalog),
        CatalogStatus::Loading => Err(AppError::CatalogUnavailable("Каталог загружается".to_string())),
        CatalogStatus::Failed(reason) => Err(AppError::CatalogUnavailable(format!(
            "Не удалось загрузить каталог: {reason}"
        ))),
    }
}

/// Filters and page number of a catalog request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct CatalogQuery {
    pub criteria: FilterCriteria,
    pub page: usize,
}

impl CatalogQuery {
    /// `edited` names the price input the filter form saw changed last; its
    /// bound wins the cross-clamp. It is never published back into links.
    pub fn parse(raw: Option<&str>) -> Self {
        let raw = raw.unwrap_or_default();
        let pairs = serde_urlencoded::from_str::<Vec<(String, String)>>(raw).unwrap_or_default();
        let page = last_value(&pairs, "page")
            .and_then(|value| value.parse::<usize>().ok())
            .filter(|page| *page > 0)
            .unwrap_or(1);
        let criteria = FilterCriteria::from_query(raw);
        let criteria = match last_value(&pairs, "edited").and_then(PriceField::parse) {
            Some(field) => criteria.after_price_edit(field),
            None => criteria,
        };
        Self { criteria, page }
    }
}

fn last_value<'a>(pairs: &'a [(String, String)], name: &str) -> Option<&'a str> {
    pairs
        .iter()
        .rev()
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.trim())
}

/// One page of filtered cars.
pub(crate) struct Listing<'a> {
    pub cars: Vec<&'a CarRecord>,
    pub total: usize,
    pub count_text: String,
    pub query: String,
    pub controls: PageControls,
}

pub(crate) fn listing<'a>(state: &AppState, catalog: &'a CarCatalog, query: &CatalogQuery) -> Listing<'a> {
    let outcome = state.filters.run(catalog, &query.criteria);
    let total = outcome.cars.len();
    Listing {
        cars: state.paginator.page(&outcome.cars, query.page).to_vec(),
        controls: state.paginator.controls(query.page, total),
        total,
        count_text: outcome.count_text,
        query: outcome.query,
    }
}
