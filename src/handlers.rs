pub mod auth;
pub mod dashboard;
pub mod pipeline;
pub mod registrations;
pub mod users;
