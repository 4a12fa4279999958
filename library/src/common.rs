use crate::error::{ServiceError, INVALID_DATE_FORMAT, INVALID_QUERY_PARAMETER};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Deserializer};
use std::str::FromStr;

/// Longest accepted `country_name` / `city_name`
pub const MAX_NAME_LEN: usize = 64;

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Parse an ISO-8601 date or datetime. Offsets are converted to UTC,
/// a bare date means midnight.
pub fn parse_datetime(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.naive_utc());
    }
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
}

pub fn name_fits(name: &Option<String>) -> bool {
    name.as_ref()
        .map_or(true, |name| name.chars().count() <= MAX_NAME_LEN)
}

fn optional_datetime<'de, D>(deserializer: D) -> Result<Option<NaiveDateTime>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<String>::deserialize(deserializer)? {
        Some(raw) => parse_datetime(&raw)
            .map(Some)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid datetime {:?}", raw))),
        None => Ok(None),
    }
}

/// Body of `POST /sensors`
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ReadingPayload {
    pub id: i32,
    pub temperature: f64,
    pub humidity: f64,
    pub windspeed: f64,
    pub country_name: Option<String>,
    pub city_name: Option<String>,
    // server time is used when absent
    #[serde(default, deserialize_with = "optional_datetime")]
    pub created_at: Option<NaiveDateTime>,
}

impl ReadingPayload {
    pub fn validate(&self) -> Result<(), ServiceError> {
        if name_fits(&self.country_name) && name_fits(&self.city_name) {
            Ok(())
        } else {
            Err(ServiceError::invalid_payload())
        }
    }
}

/// Typed criteria for `GET /sensors`, one slot per filterable column.
/// Present slots are ANDed together.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReadingFilter {
    /// Inclusive `created_at` range, only set when both ends were given
    pub created_between: Option<(NaiveDateTime, NaiveDateTime)>,
    pub sensor_ids: Option<Vec<i32>>,
    pub humidity: Option<f64>,
    pub temperature: Option<f64>,
    pub windspeed: Option<f64>,
}

impl ReadingFilter {
    /// Build criteria from decoded query pairs. Unknown keys are ignored
    /// and a repeated key keeps its first value, except `sensor_id` which
    /// collects every value.
    pub fn from_query(pairs: &[(String, String)]) -> Result<ReadingFilter, ServiceError> {
        let first = |key: &str| {
            pairs
                .iter()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.as_str())
        };

        let created_between = match (first("from"), first("to")) {
            (Some(from), Some(to)) => match (parse_datetime(from), parse_datetime(to)) {
                (Some(from), Some(to)) => Some((from, to)),
                _ => return Err(ServiceError::Validation(INVALID_DATE_FORMAT.to_owned())),
            },
            _ => None,
        };

        let sensor_ids = pairs
            .iter()
            .filter(|(k, _)| k == "sensor_id")
            .map(|(_, v)| parse_number::<i32>(v))
            .collect::<Result<Vec<i32>, ServiceError>>()?;

        Ok(ReadingFilter {
            created_between,
            sensor_ids: if sensor_ids.is_empty() {
                None
            } else {
                Some(sensor_ids)
            },
            humidity: first("humidity").map(parse_number).transpose()?,
            temperature: first("temperature").map(parse_number).transpose()?,
            windspeed: first("windspeed").map(parse_number).transpose()?,
        })
    }

    pub fn is_empty(&self) -> bool {
        *self == ReadingFilter::default()
    }
}

fn parse_number<T: FromStr>(raw: &str) -> Result<T, ServiceError> {
    raw.trim()
        .parse::<T>()
        .map_err(|_| ServiceError::Validation(INVALID_QUERY_PARAMETER.to_owned()))
}
