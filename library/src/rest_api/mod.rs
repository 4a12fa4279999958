use actix_web::{error, web, HttpRequest};
use log::warn;

use crate::error::{ServiceError, INVALID_QUERY_PARAMETER};

pub mod handlers;
use handlers::{sensors, status};

fn json_error(err: error::JsonPayloadError, _: &HttpRequest) -> actix_web::Error {
    warn!("rejected payload: {}", err);
    ServiceError::invalid_payload().into()
}

// a non-integer id can never name a stored reading
fn path_error(err: error::PathError, _: &HttpRequest) -> actix_web::Error {
    warn!("rejected path: {}", err);
    ServiceError::not_found().into()
}

fn query_error(err: error::QueryPayloadError, _: &HttpRequest) -> actix_web::Error {
    warn!("rejected query: {}", err);
    ServiceError::Validation(INVALID_QUERY_PARAMETER.to_owned()).into()
}

pub fn rest_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/sensors")
            .app_data(web::JsonConfig::default().error_handler(json_error))
            .app_data(web::QueryConfig::default().error_handler(query_error))
            .app_data(web::PathConfig::default().error_handler(path_error))
            .service(
                web::resource("")
                    .route(web::get().to(sensors::list_readings))
                    .route(web::post().to(sensors::create_reading)),
            )
            .service(
                web::resource("/{id}")
                    .route(web::get().to(sensors::get_reading))
                    .route(web::put().to(sensors::update_reading)),
            ),
    )
    .service(web::resource("/").route(web::get().to(status::index)));
}
