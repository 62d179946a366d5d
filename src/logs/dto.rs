use serde::{Deserialize, Serialize};
use time::format_description::FormatItem;
use time::macros::format_description;
use time::Date;

const DATE_FMT: &[FormatItem<'static>] = format_description!("[year]-[month]-[day]");

pub fn parse_date(s: &str) -> Result<Date, time::error::Parse> {
    Date::parse(s, DATE_FMT)
}

#[derive(Debug, Deserialize)]
pub struct DateQuery {
    pub date: String,
}

#[derive(Debug, Deserialize)]
pub struct RangeQuery {
    pub start_date: String,
    pub end_date: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateLogRequest {
    pub date: String,
    pub food_name: String,
    pub calories: f64,
    #[serde(default)]
    pub food_id: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct CaloriesTotal {
    pub total: f64,
}

#[cfg(test)]
mod date_tests {
    use time::macros::date;

    use super::*;

    #[test]
    fn parses_iso_dates() {
        assert_eq!(parse_date("2024-01-15").unwrap(), date!(2024 - 01 - 15));
        assert_eq!(parse_date("1999-12-31").unwrap(), date!(1999 - 12 - 31));
    }

    #[test]
    fn rejects_other_shapes() {
        assert!(parse_date("15/01/2024").is_err());
        assert!(parse_date("2024-1-5").is_err());
        assert!(parse_date("yesterday").is_err());
        assert!(parse_date("").is_err());
    }
}
