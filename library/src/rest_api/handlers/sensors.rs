use crate::{
    common::{ReadingFilter, ReadingPayload},
    db::{
        model::ReadingChanges, Actions, CreateReading, GetReading, ListReadings, UpdateReading,
    },
    error::ServiceError,
};
use actix::Addr;
use actix_web::{web, HttpResponse};
use log::{error, warn};
use serde::de::DeserializeOwned;
use serde_json::Value;

fn logged(err: ServiceError) -> ServiceError {
    match &err {
        ServiceError::Persistence(msg) => error!("storage failure: {}", msg),
        other => warn!("request rejected: {}", other),
    }
    err
}

// bodies must be JSON objects, not positional arrays
fn from_object<T: DeserializeOwned>(value: Value) -> Result<T, ServiceError> {
    if !value.is_object() {
        return Err(ServiceError::invalid_payload());
    }
    serde_json::from_value(value).map_err(|_| ServiceError::invalid_payload())
}

fn parse_payload(value: Value) -> Result<ReadingPayload, ServiceError> {
    let payload: ReadingPayload = from_object(value)?;
    payload.validate()?;
    Ok(payload)
}

fn parse_changes(body: &[u8]) -> Result<ReadingChanges, ServiceError> {
    let value: Value =
        serde_json::from_slice(body).map_err(|_| ServiceError::invalid_payload())?;
    let changes: ReadingChanges = from_object(value)?;
    changes.validate()?;
    Ok(changes)
}

pub async fn create_reading(
    web::Json(body): web::Json<Value>,
    actions: web::Data<Addr<Actions>>,
) -> Result<HttpResponse, ServiceError> {
    let payload = parse_payload(body).map_err(logged)?;
    let reading = actions
        .send(CreateReading(payload.into()))
        .await?
        .map_err(logged)?;
    Ok(HttpResponse::Created().json(reading))
}

pub async fn list_readings(
    web::Query(query): web::Query<Vec<(String, String)>>,
    actions: web::Data<Addr<Actions>>,
) -> Result<HttpResponse, ServiceError> {
    let filter = ReadingFilter::from_query(&query).map_err(logged)?;
    let readings = actions
        .send(ListReadings(filter))
        .await?
        .map_err(logged)?;
    Ok(HttpResponse::Ok().json(readings))
}

pub async fn get_reading(
    id: web::Path<i32>,
    actions: web::Data<Addr<Actions>>,
) -> Result<HttpResponse, ServiceError> {
    let reading = actions
        .send(GetReading(id.into_inner()))
        .await?
        .map_err(logged)?;
    Ok(HttpResponse::Ok().json(reading))
}

/// The id is looked up before the body is read, so an unknown id is a 404
/// whatever the payload.
pub async fn update_reading(
    id: web::Path<i32>,
    body: web::Bytes,
    actions: web::Data<Addr<Actions>>,
) -> Result<HttpResponse, ServiceError> {
    let id = id.into_inner();
    actions.send(GetReading(id)).await?.map_err(logged)?;

    let changes = parse_changes(&body).map_err(logged)?;
    let reading = actions
        .send(UpdateReading { id, changes })
        .await?
        .map_err(logged)?;
    Ok(HttpResponse::Ok().json(reading))
}
