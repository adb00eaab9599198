use askama::Template;
use axum::{
    extract::{Path, Query, RawQuery, State},
    response::IntoResponse,
};

use super::{
    catalog_or_notice,
    fragments::{carousel_html, count_html, grid_html, pagination_html, CarouselQuery},
    listing, ready_catalog, render, today, CatalogQuery, Notice,
};
use crate::{
    error::{AppError, AppResult},
    filters::FilterOptions,
    views::{callback_slots, cards, CarDetail, FilterForm, PaginationView, SelectOption},
    AppState,
};

#[derive(Template)]
#[template(path = "home.html")]
struct HomeTemplate {
    carousel_html: String,
    notice: Option<Notice>,
    callback_slots: Vec<SelectOption>,
}

#[derive(Template)]
#[template(path = "catalog.html")]
struct CatalogTemplate {
    filter_form: Option<FilterForm>,
    count_html: String,
    grid_html: String,
    pagination_html: String,
    notice: Option<Notice>,
    callback_slots: Vec<SelectOption>,
}

#[derive(Template)]
#[template(path = "car_detail.html")]
struct CarDetailTemplate {
    car: CarDetail,
    callback_slots: Vec<SelectOption>,
}

pub async fn home_page(
    State(state): State<AppState>,
    Query(carousel_query): Query<CarouselQuery>,
) -> AppResult<impl IntoResponse> {
    let template = match catalog_or_notice(&state, "Не удалось загрузить популярные модели", "Перейти в каталог").await
    {
        Ok(catalog) => HomeTemplate {
            carousel_html: carousel_html(&state, &catalog, &carousel_query)?,
            notice: None,
            callback_slots: callback_slots(None),
        },
        Err(notice) => HomeTemplate {
            carousel_html: String::new(),
            notice: Some(notice),
            callback_slots: callback_slots(None),
        },
    };
    render(&template)
}

pub async fn catalog_page(State(state): State<AppState>, RawQuery(raw): RawQuery) -> AppResult<impl IntoResponse> {
    let catalog = match catalog_or_notice(&state, "Не удалось загрузить каталог автомобилей", "Попробовать снова").await {
        Ok(catalog) => catalog,
        Err(notice) => {
            return render(&CatalogTemplate {
                filter_form: None,
                count_html: String::new(),
                grid_html: String::new(),
                pagination_html: String::new(),
                notice: Some(notice),
                callback_slots: callback_slots(None),
            });
        }
    };

    let query = CatalogQuery::parse(raw.as_deref());
    let listing = listing(&state, &catalog, &query);
    tracing::debug!(page = query.page, total = listing.total, "Rendering catalog page");

    let options = FilterOptions::from_catalog(&catalog, &query.criteria);
    let template = CatalogTemplate {
        filter_form: Some(FilterForm::new(&options, &query.criteria)),
        count_html: count_html(&listing.count_text)?,
        grid_html: grid_html(&cards(&listing.cars, today()))?,
        pagination_html: pagination_html(&PaginationView::new(&listing.controls, &listing.query))?,
        notice: None,
        callback_slots: callback_slots(None),
    };
    render(&template)
}

pub async fn car_detail_page(State(state): State<AppState>, Path(id): Path<u32>) -> AppResult<impl IntoResponse> {
    let catalog = ready_catalog(&state).await?;
    let car = catalog
        .find_by_id(id)
        .ok_or_else(|| AppError::NotFound("Автомобиль не найден".to_string()))?;
    render(&CarDetailTemplate {
        car: CarDetail::new(car, today()),
        callback_slots: callback_slots(None),
    })
}
