pub mod sensors;
pub mod status;
