// Display helpers for prices, dates and Russian year words

use chrono::NaiveDate;

// ru-RU groups thousands with a no-break space
const GROUP_SEPARATOR: char = '\u{a0}';

pub fn format_price(price: u32) -> String {
    let digits = price.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 * 2);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(GROUP_SEPARATOR);
        }
        grouped.push(ch);
    }
    grouped
}

pub fn format_date(date: NaiveDate) -> String {
    date.format("%d.%m.%Y").to_string()
}

/// "год", "года" or "лет" for the given number of years.
pub fn years_word(years: u32) -> &'static str {
    if years % 10 == 1 && years % 100 != 11 {
        "год"
    } else if (2..=4).contains(&(years % 10)) && !(12..=14).contains(&(years % 100)) {
        "года"
    } else {
        "лет"
    }
}

pub fn format_years(years: u32) -> String {
    format!("{} {}", years, years_word(years))
}
