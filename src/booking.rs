// Links into the booking page and reference ids for requests

use chrono::{Duration, NaiveDate};
use rand::Rng;
use serde::Serialize;

const BOOKING_ID_PREFIX: &str = "MV-";
const BOOKING_ID_LEN: usize = 9;
const BASE36: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// `MV-` followed by nine random base-36 characters, upper case.
pub fn generate_booking_id() -> String {
    generate_booking_id_with(&mut rand::thread_rng())
}

pub fn generate_booking_id_with<R: Rng + ?Sized>(rng: &mut R) -> String {
    let suffix: String = (0..BOOKING_ID_LEN)
        .map(|_| BASE36[rng.gen_range(0..BASE36.len())] as char)
        .collect();
    format!("{BOOKING_ID_PREFIX}{suffix}")
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct BookingQuery {
    car_id: u32,
    start_date: NaiveDate,
    end_date: NaiveDate,
}

/// Link to the booking page for `car_id`. Missing dates default to
/// today and the day after.
pub fn booking_link(car_id: u32, start: Option<NaiveDate>, end: Option<NaiveDate>, today: NaiveDate) -> String {
    let start_date = start.unwrap_or(today);
    let end_date = end.unwrap_or(start_date + Duration::days(1));
    let query = BookingQuery {
        car_id,
        start_date,
        end_date,
    };
    match serde_urlencoded::to_string(&query) {
        Ok(query) => format!("booking.html?{query}"),
        Err(e) => {
            tracing::warn!(car_id, "Could not encode booking query: {}", e);
            format!("booking.html?carId={car_id}")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn booking_ids_have_the_expected_shape() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..50 {
            let id = generate_booking_id_with(&mut rng);
            assert!(id.starts_with("MV-"));
            assert_eq!(id.len(), 12);
            assert!(id[3..].chars().all(|c| c.is_ascii_digit() || c.is_ascii_uppercase()));
        }
        assert_ne!(generate_booking_id(), generate_booking_id());
    }

    #[test]
    fn booking_link_defaults_to_today_and_tomorrow() {
        let today = NaiveDate::from_ymd_opt(2025, 12, 31).unwrap();
        assert_eq!(
            booking_link(4, None, None, today),
            "booking.html?carId=4&startDate=2025-12-31&endDate=2026-01-01"
        );
        let start = NaiveDate::from_ymd_opt(2026, 2, 10).unwrap();
        let end = NaiveDate::from_ymd_opt(2026, 2, 14).unwrap();
        assert_eq!(
            booking_link(4, Some(start), Some(end), today),
            "booking.html?carId=4&startDate=2026-02-10&endDate=2026-02-14"
        );
    }
}
