pub mod common;
pub mod config;
pub mod db;
pub mod error;
pub mod rest_api;
pub mod schema;

pub use config::Config;
pub use db::Actions;
pub use error::ServiceError;
pub use rest_api::rest_config;
