use crate::common::{name_fits, ReadingPayload};
use crate::error::ServiceError;
use crate::schema::sensors;
use chrono::{NaiveDateTime, SubsecRound, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Deserializer, Serialize};

#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = sensors)]
pub struct NewReading {
    pub id: i32,
    pub temperature: Option<f64>,
    pub humidity: Option<f64>,
    pub windspeed: Option<f64>,
    pub country_name: Option<String>,
    pub city_name: Option<String>,
    pub created_at: NaiveDateTime,
}

impl From<ReadingPayload> for NewReading {
    fn from(payload: ReadingPayload) -> NewReading {
        NewReading {
            id: payload.id,
            temperature: Some(payload.temperature),
            humidity: Some(payload.humidity),
            windspeed: Some(payload.windspeed),
            country_name: payload.country_name,
            city_name: payload.city_name,
            created_at: payload
                .created_at
                .unwrap_or_else(|| Utc::now().naive_utc().trunc_subsecs(6)),
        }
    }
}

/// Stored reading, serialized as-is for responses
#[derive(Queryable, Serialize, Debug, Clone, PartialEq)]
#[diesel(table_name = sensors)]
pub struct DbReading {
    pub id: i32,
    pub temperature: Option<f64>,
    pub humidity: Option<f64>,
    pub windspeed: Option<f64>,
    pub country_name: Option<String>,
    pub city_name: Option<String>,
    pub created_at: NaiveDateTime,
}

// Wraps whatever was sent, null included, so a missing key stays `None`
fn present<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    T::deserialize(deserializer).map(Some)
}

/// Body of `PUT /sensors/{id}`.
///
/// The outer `Option` tells whether the key was sent, the inner one
/// whether it was `null`. Absent keys are left out of the UPDATE.
#[derive(AsChangeset, Deserialize, Debug, Default, Clone, PartialEq)]
#[diesel(table_name = sensors)]
pub struct ReadingChanges {
    #[serde(default, deserialize_with = "present")]
    pub humidity: Option<Option<f64>>,
    #[serde(default, deserialize_with = "present")]
    pub temperature: Option<Option<f64>>,
    #[serde(default, deserialize_with = "present")]
    pub windspeed: Option<Option<f64>>,
    #[serde(default, deserialize_with = "present")]
    pub country_name: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub city_name: Option<Option<String>>,
}

impl ReadingChanges {
    pub fn validate(&self) -> Result<(), ServiceError> {
        let fits = |name: &Option<Option<String>>| name.as_ref().map_or(true, name_fits);
        if fits(&self.country_name) && fits(&self.city_name) {
            Ok(())
        } else {
            Err(ServiceError::invalid_payload())
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == ReadingChanges::default()
    }
}
