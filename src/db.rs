pub mod user_repo;
pub use user_repo::{PgUserRepository, UserRepository};
pub mod registration_repo;
pub use registration_repo::{PgRegistrationRepository, RegistrationRepository};

#[cfg(test)]
pub mod memory;
