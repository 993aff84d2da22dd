pub mod auth;
pub mod dashboard;
pub mod registration;
pub mod status;
