// Partial templates: rendered into full pages and served on their own under
// /fragments/:target so a page can refresh one region at a time.

use askama::Template;
use axum::{
    extract::{Path, Query, RawQuery, State},
    response::{Html, IntoResponse, Response},
};
use serde::Deserialize;

use super::{listing, ready_catalog, today, CatalogQuery};
use crate::{
    carousel::{CarouselController, Navigation},
    catalog::CarCatalog,
    error::{AppResult, RenderError},
    views::{cards, CarCard, CarouselView, PaginationView},
    AppState,
};

#[derive(Template)]
#[template(path = "partials/grid.html")]
struct GridTemplate<'a> {
    cards: &'a [CarCard],
}

#[derive(Template)]
#[template(path = "partials/pagination.html")]
struct PaginationTemplate<'a> {
    pagination: &'a PaginationView,
}

#[derive(Template)]
#[template(path = "partials/count.html")]
struct CountTemplate<'a> {
    count_text: &'a str,
}

#[derive(Template)]
#[template(path = "partials/carousel.html")]
struct CarouselTemplate<'a> {
    carousel: &'a CarouselView,
    autoplay_ms: u64,
    transition_ms: u64,
    viewport_width: u32,
}

pub(crate) fn grid_html(cards: &[CarCard]) -> AppResult<String> {
    Ok(GridTemplate { cards }.render()?)
}

pub(crate) fn pagination_html(pagination: &PaginationView) -> AppResult<String> {
    Ok(PaginationTemplate { pagination }.render()?)
}

pub(crate) fn count_html(count_text: &str) -> AppResult<String> {
    Ok(CountTemplate { count_text }.render()?)
}

/// Carousel position requested by the previous render.
#[derive(Debug, Default, Deserialize)]
pub struct CarouselQuery {
    pub index: Option<String>,
    pub nav: Option<String>,
    pub vw: Option<String>,
    /// Touch start and end x coordinates of a swipe, in pixels.
    pub swipe_from: Option<String>,
    pub swipe_to: Option<String>,
}

fn parse_param<T: std::str::FromStr>(value: &Option<String>) -> Option<T> {
    value.as_deref().and_then(|v| v.trim().parse().ok())
}

/// Render the popular-cars carousel after applying the requested navigation.
/// The server has no animation frames, so every navigation is rendered in its
/// settled state.
pub(crate) fn carousel_html(state: &AppState, catalog: &CarCatalog, query: &CarouselQuery) -> AppResult<String> {
    let settings = &state.settings;
    let popular = catalog.popular(settings.popular_limit);
    let viewport_width = parse_param(&query.vw).unwrap_or(settings.default_viewport_width);

    let mut controller = CarouselController::new(popular.len(), viewport_width, settings.carousel_options());
    if let Some(index) = parse_param(&query.index) {
        controller = controller.with_index(index);
    }
    let moved = match query.nav.as_deref().and_then(Navigation::parse) {
        Some(navigation) => controller.navigate(navigation),
        None => match (parse_param::<f64>(&query.swipe_from), parse_param::<f64>(&query.swipe_to)) {
            (Some(from), Some(to)) => {
                controller.touch_start(from);
                controller.touch_end(to).is_some()
            }
            _ => false,
        },
    };
    if moved {
        if let Some(index) = controller.finish_transition() {
            tracing::debug!(index, "Carousel wrapped around");
        }
    }

    let carousel = CarouselView::new(&controller, &popular, viewport_width, today());
    Ok(CarouselTemplate {
        carousel: &carousel,
        autoplay_ms: settings.autoplay_interval().as_millis() as u64,
        transition_ms: settings.transition_ms,
        viewport_width,
    }
    .render()?)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FragmentTarget {
    CarsGrid,
    Pagination,
    CarsCount,
    Carousel,
}

impl FragmentTarget {
    fn parse(name: &str) -> Option<Self> {
        match name {
            "cars-grid" => Some(FragmentTarget::CarsGrid),
            "pagination" => Some(FragmentTarget::Pagination),
            "cars-count" => Some(FragmentTarget::CarsCount),
            "carousel" => Some(FragmentTarget::Carousel),
            _ => None,
        }
    }
}

pub async fn render_fragment(
    State(state): State<AppState>,
    Path(target): Path<String>,
    RawQuery(raw): RawQuery,
    Query(carousel_query): Query<CarouselQuery>,
) -> AppResult<Response> {
    let target = FragmentTarget::parse(&target).ok_or(RenderError::MissingRenderTarget(target))?;
    let catalog = ready_catalog(&state).await?;

    let html = match target {
        FragmentTarget::Carousel => carousel_html(&state, &catalog, &carousel_query)?,
        _ => {
            let query = CatalogQuery::parse(raw.as_deref());
            let listing = listing(&state, &catalog, &query);
            match target {
                FragmentTarget::CarsGrid => grid_html(&cards(&listing.cars, today()))?,
                FragmentTarget::Pagination => {
                    pagination_html(&PaginationView::new(&listing.controls, &listing.query))?
                }
                _ => count_html(&listing.count_text)?,
            }
        }
    };
    Ok(Html(html).into_response())
}
