// View models handed to the askama templates. Everything the markup needs
// is precomputed here so the templates stay free of logic.

use chrono::NaiveDate;

use crate::booking::booking_link;
use crate::carousel::CarouselController;
use crate::catalog::PriceBounds;
use crate::filters::{FilterCriteria, FilterOptions};
use crate::format::{format_date, format_price};
use crate::forms::CALLBACK_SLOTS;
use crate::models::{CarRecord, RuleLine, Transmission};
use crate::pagination::{PageControls, PageMarker};

/// Rental length whose price the carousel advertises as "from".
const CAROUSEL_PRICE_DAYS: u32 = 21;

#[derive(Debug, Clone)]
pub struct CarCard {
    pub id: u32,
    pub title: String,
    pub image: Option<String>,
    pub popular: bool,
    pub summary: String,
    pub details: String,
    /// Carousel line, e.g. "АКПП • Бензин".
    pub compact: String,
    pub doors: String,
    pub climate: &'static str,
    pub price: String,
    pub from_price: String,
    pub deposit: String,
    pub detail_href: String,
    pub booking_href: String,
}

impl CarCard {
    pub fn new(car: &CarRecord, today: NaiveDate) -> Self {
        Self {
            id: car.id,
            title: car.title(),
            image: car.primary_image().map(str::to_string),
            popular: car.is_popular,
            summary: format!("{} год • {} • {}", car.year, car.engine, car.transmission.label()),
            details: format!("{} мест • {}", car.seats, car.fuel_type),
            compact: format!("{} • {}", car.transmission.short_label(), car.fuel_type),
            doors: format!("{} двери", car.doors),
            climate: if car.air_conditioning {
                "Кондиционер"
            } else {
                "Без кондиционера"
            },
            price: format_price(car.base_price()),
            from_price: format_price(car.price_for_days(CAROUSEL_PRICE_DAYS)),
            deposit: format_price(car.deposit),
            detail_href: format!("/cars/{}", car.id),
            booking_href: format!("/static/{}", booking_link(car.id, None, None, today)),
        }
    }
}

pub fn cards(cars: &[&CarRecord], today: NaiveDate) -> Vec<CarCard> {
    cars.iter().map(|car| CarCard::new(car, today)).collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectOption {
    pub value: String,
    pub label: String,
    pub selected: bool,
}

impl SelectOption {
    pub(crate) fn new(value: impl ToString, label: impl ToString, current: Option<&str>) -> Self {
        let value = value.to_string();
        Self {
            selected: current == Some(value.as_str()),
            label: label.to_string(),
            value,
        }
    }
}

fn options<T: ToString>(values: &[T], current: Option<String>) -> Vec<SelectOption> {
    values
        .iter()
        .map(|value| SelectOption::new(value.to_string(), value.to_string(), current.as_deref()))
        .collect()
}

/// Time slots of the callback form with `current` preselected.
pub fn callback_slots(current: Option<&str>) -> Vec<SelectOption> {
    CALLBACK_SLOTS
        .iter()
        .map(|(value, label)| SelectOption::new(value, label, current))
        .collect()
}

/// Filter form: choices, current values and the price placeholders.
#[derive(Debug, Clone)]
pub struct FilterForm {
    pub brands: Vec<SelectOption>,
    pub models: Vec<SelectOption>,
    pub years: Vec<SelectOption>,
    pub transmissions: Vec<SelectOption>,
    pub fuel_types: Vec<SelectOption>,
    pub seats: Vec<SelectOption>,
    pub deposits: Vec<SelectOption>,
    pub min_price: String,
    pub max_price: String,
    pub min_placeholder: String,
    pub max_placeholder: String,
    pub active: bool,
}

impl FilterForm {
    pub fn new(options: &FilterOptions, criteria: &FilterCriteria) -> Self {
        let transmission = criteria.transmission.map(|t| t.as_str().to_string());
        let (min_placeholder, max_placeholder) = price_placeholders(options.price_bounds);
        Self {
            brands: self::options(&options.brands, criteria.brand.clone()),
            models: self::options(&options.models, criteria.model.clone()),
            years: self::options(&options.years, criteria.year.map(|y| y.to_string())),
            transmissions: [Transmission::Automatic, Transmission::Manual]
                .iter()
                .map(|t| SelectOption::new(t.as_str(), t.label(), transmission.as_deref()))
                .collect(),
            fuel_types: self::options(&options.fuel_types, criteria.fuel_type.clone()),
            seats: self::options(&options.seats, criteria.seats.map(|s| s.to_string())),
            deposits: options
                .deposits
                .iter()
                .map(|bracket| SelectOption::new(bracket.key, bracket.label, criteria.deposit.as_deref()))
                .collect(),
            min_price: criteria.min_price.map(|p| p.to_string()).unwrap_or_default(),
            max_price: criteria.max_price.map(|p| p.to_string()).unwrap_or_default(),
            min_placeholder,
            max_placeholder,
            active: !criteria.is_empty(),
        }
    }
}

pub fn price_placeholders(bounds: Option<PriceBounds>) -> (String, String) {
    match bounds {
        Some(bounds) => (
            format!("От {}", format_price(bounds.min)),
            format!("До {}", format_price(bounds.max)),
        ),
        None => ("От".to_string(), "До".to_string()),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageLink {
    pub label: String,
    pub page: usize,
    pub href: String,
    pub active: bool,
    pub gap: bool,
}

#[derive(Debug, Clone)]
pub struct PaginationView {
    pub enabled: bool,
    pub prev_href: Option<String>,
    pub next_href: Option<String>,
    pub links: Vec<PageLink>,
}

/// `/catalog?<filters>&page=N`
pub fn catalog_href(query: &str, page: usize) -> String {
    if query.is_empty() {
        format!("/catalog?page={page}")
    } else {
        format!("/catalog?{query}&page={page}")
    }
}

impl PaginationView {
    pub fn new(controls: &PageControls, query: &str) -> Self {
        let links = controls
            .markers
            .iter()
            .map(|marker| match marker {
                PageMarker::Page(page) => PageLink {
                    label: page.to_string(),
                    page: *page,
                    href: catalog_href(query, *page),
                    active: *page == controls.current,
                    gap: false,
                },
                PageMarker::Gap => PageLink {
                    label: "...".to_string(),
                    page: 0,
                    href: String::new(),
                    active: false,
                    gap: true,
                },
            })
            .collect();
        Self {
            enabled: controls.enabled,
            prev_href: controls.has_prev.then(|| catalog_href(query, controls.current - 1)),
            next_href: controls.has_next.then(|| catalog_href(query, controls.current + 1)),
            links,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CarouselSlide {
    pub card: CarCard,
    /// Duplicate of a real card used for the seamless wrap-around.
    pub is_clone: bool,
}

#[derive(Debug, Clone)]
pub struct CarouselDot {
    pub href: String,
    pub active: bool,
}

#[derive(Debug, Clone)]
pub struct CarouselView {
    pub slides: Vec<CarouselSlide>,
    pub index: usize,
    pub item_width: String,
    pub offset: String,
    pub transition: bool,
    pub prev_href: String,
    pub next_href: String,
    pub dots: Vec<CarouselDot>,
    pub viewport_width: u32,
}

fn carousel_href(index: usize, nav: &str, viewport_width: u32) -> String {
    format!("/?index={index}&nav={nav}&vw={viewport_width}")
}

impl CarouselView {
    pub fn new(controller: &CarouselController, cars: &[&CarRecord], viewport_width: u32, today: NaiveDate) -> Self {
        let index = controller.current_index();
        let real_count = controller.item_count();
        let clones = (controller.track_len() - real_count) / 2;
        let slides = controller
            .track()
            .into_iter()
            .enumerate()
            .filter_map(|(slot, item)| {
                cars.get(item).map(|car| CarouselSlide {
                    card: CarCard::new(car, today),
                    is_clone: slot < clones || slot >= clones + real_count,
                })
            })
            .collect();
        let dots = (0..controller.page_count())
            .map(|page| CarouselDot {
                href: carousel_href(index, &format!("page-{page}"), viewport_width),
                active: page == controller.current_page(),
            })
            .collect();
        Self {
            slides,
            index,
            item_width: format!("{:.4}", 100.0 / controller.items_to_show() as f64),
            offset: format!("{:.4}", controller.offset_percent()),
            transition: controller.transition_enabled(),
            prev_href: carousel_href(index, "prev", viewport_width),
            next_href: carousel_href(index, "next", viewport_width),
            dots,
            viewport_width,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PriceRow {
    pub label: String,
    pub price: String,
}

/// Everything the car detail page shows.
#[derive(Debug, Clone)]
pub struct CarDetail {
    pub card: CarCard,
    pub images: Vec<String>,
    pub transmission: &'static str,
    pub engine: String,
    pub prices: Vec<PriceRow>,
    pub rules: Vec<RuleLine>,
    pub availability: Option<String>,
}

impl CarDetail {
    pub fn new(car: &CarRecord, today: NaiveDate) -> Self {
        let prices = car
            .all_prices()
            .into_iter()
            .map(|tier| PriceRow {
                label: tier_label(tier.days),
                price: match tier.price {
                    Some(price) => format!("{} ₽", format_price(price)),
                    None => "—".to_string(),
                },
            })
            .collect();
        let availability = car.availability.as_ref().map(|window| {
            if window.is_available {
                format!(
                    "Доступен с {} по {}",
                    format_date(window.start_date),
                    format_date(window.end_date)
                )
            } else {
                "Временно недоступен".to_string()
            }
        });
        Self {
            card: CarCard::new(car, today),
            images: car.images.clone(),
            transmission: car.transmission.label(),
            engine: car.engine.clone(),
            prices,
            rules: car.rental_rules(),
            availability,
        }
    }
}

fn tier_label(days: u32) -> String {
    match days {
        1 => "1-3 дня".to_string(),
        4 => "4-6 дней".to_string(),
        7 => "7-13 дней".to_string(),
        14 => "14-20 дней".to_string(),
        _ => format!("от {days} дней"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::carousel::CarouselOptions;
    use crate::models::fixtures::car;
    use crate::pagination::Paginator;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 5, 4).unwrap()
    }

    #[test]
    fn card_texts() {
        let mut record = car(7, "Kia", "Carnival", 12500, 30000);
        record.prices.insert(21, 9000);
        let card = CarCard::new(&record, today());
        assert_eq!(card.title, "Kia Carnival");
        assert_eq!(card.price, "12\u{a0}500");
        assert_eq!(card.from_price, "9\u{a0}000");
        assert_eq!(card.detail_href, "/cars/7");
        assert_eq!(card.compact, "АКПП • Бензин");
        assert_eq!(
            card.booking_href,
            "/static/booking.html?carId=7&startDate=2026-05-04&endDate=2026-05-05"
        );
    }

    #[test]
    fn pagination_links_keep_the_filter_query() {
        let controls = Paginator::new(9).controls(2, 100);
        let view = PaginationView::new(&controls, "brand=Kia");
        assert_eq!(view.prev_href.as_deref(), Some("/catalog?brand=Kia&page=1"));
        assert_eq!(view.next_href.as_deref(), Some("/catalog?brand=Kia&page=3"));
        assert!(view.links.iter().any(|link| link.active && link.page == 2));
        assert!(view.links.iter().any(|link| link.gap));
    }

    #[test]
    fn carousel_marks_clone_slides() {
        let records: Vec<CarRecord> = (1..=5).map(|id| car(id, "Kia", "Carnival", 5000, 10000)).collect();
        let refs: Vec<&CarRecord> = records.iter().collect();
        let controller = CarouselController::new(5, 800, CarouselOptions::default());
        let view = CarouselView::new(&controller, &refs, 800, today());
        assert_eq!(view.slides.len(), 9);
        assert_eq!(view.slides.iter().filter(|s| s.is_clone).count(), 4);
        assert_eq!(view.item_width, "50.0000");
        assert_eq!(view.offset, "100.0000");
        assert_eq!(view.dots.len(), 3);
    }

    #[test]
    fn placeholders_use_price_bounds() {
        let (min, max) = price_placeholders(Some(PriceBounds { min: 5000, max: 15000 }));
        assert_eq!(min, "От 5\u{a0}000");
        assert_eq!(max, "До 15\u{a0}000");
    }
}
