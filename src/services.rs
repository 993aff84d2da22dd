pub mod auth;
pub mod dashboard_service;
pub mod integration;
pub mod pipeline;
pub mod registration_service;
pub mod registration_store;
pub mod session;
pub mod user_service;

pub use auth::AuthService;
pub use dashboard_service::DashboardService;
pub use registration_service::RegistrationService;
pub use user_service::UserService;
