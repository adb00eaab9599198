// JSON endpoints over the catalog and the UI preference store

use axum::{
    extract::{Path, RawQuery, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde::Serialize;
use serde_json::Value;

use super::{listing, ready_catalog, CatalogQuery};
use crate::{
    error::{AppError, AppResult},
    models::CarRecord,
    pagination::PageMarker,
    AppState,
};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CarsResponse<'a> {
    count: usize,
    count_text: String,
    query: String,
    page: usize,
    total_pages: usize,
    pages: Vec<PageMarker>,
    cars: Vec<&'a CarRecord>,
}

pub async fn list_cars(State(app_state): State<AppState>, RawQuery(raw): RawQuery) -> AppResult<impl IntoResponse> {
    let catalog = ready_catalog(&app_state).await?;
    let query = CatalogQuery::parse(raw.as_deref());
    let listing = listing(&app_state, &catalog, &query);
    tracing::debug!(count = listing.total, page = query.page, "[API] /api/cars");

    let body = CarsResponse {
        count: listing.total,
        count_text: listing.count_text,
        query: listing.query,
        page: query.page,
        total_pages: listing.controls.total_pages,
        pages: listing.controls.markers,
        cars: listing.cars,
    };
    Ok(Json(serde_json::to_value(body).map_err(anyhow::Error::new)?))
}

pub async fn get_car(State(app_state): State<AppState>, Path(id): Path<u32>) -> AppResult<impl IntoResponse> {
    let catalog = ready_catalog(&app_state).await?;
    match catalog.find_by_id(id) {
        Some(car) => Ok(Json(car.clone())),
        None => Err(AppError::NotFound(format!("Car {id} not found"))),
    }
}

pub async fn get_brands(State(app_state): State<AppState>) -> AppResult<impl IntoResponse> {
    let catalog = ready_catalog(&app_state).await?;
    Ok(Json(catalog.brands()))
}

pub async fn get_models(State(app_state): State<AppState>, Path(brand): Path<String>) -> AppResult<impl IntoResponse> {
    let catalog = ready_catalog(&app_state).await?;
    Ok(Json(catalog.models_for(Some(&brand))))
}

/// `null` for an empty catalog.
pub async fn get_price_bounds(State(app_state): State<AppState>) -> AppResult<impl IntoResponse> {
    let catalog = ready_catalog(&app_state).await?;
    Ok(Json(catalog.price_bounds()))
}

pub async fn get_pref(State(app_state): State<AppState>, Path(key): Path<String>) -> AppResult<impl IntoResponse> {
    match app_state.ui_cache.load::<Value>(&key) {
        Some(value) => Ok(Json(value)),
        None => Err(AppError::NotFound(format!("No value stored for '{key}'"))),
    }
}

pub async fn put_pref(
    State(app_state): State<AppState>,
    Path(key): Path<String>,
    Json(value): Json<Value>,
) -> impl IntoResponse {
    if app_state.ui_cache.save(&key, &value) {
        StatusCode::NO_CONTENT
    } else {
        StatusCode::PAYLOAD_TOO_LARGE
    }
}

pub async fn delete_pref(State(app_state): State<AppState>, Path(key): Path<String>) -> impl IntoResponse {
    app_state.ui_cache.remove(&key);
    StatusCode::NO_CONTENT
}
