// src/db/memory.rs

// Repositórios em memória para os testes. `fail_with_errors(true)` faz
// toda chamada devolver erro, simulando o banco fora do ar.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Mutex,
};

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{RegistrationRepository, UserRepository},
    models::{
        auth::{NewUser, UpdateUserPayload, User},
        registration::{NewRegistration, Registration},
        status::B2bStatus,
    },
};

fn offline() -> AppError {
    AppError::InternalServerError(anyhow::anyhow!("banco indisponível"))
}

#[derive(Default)]
pub struct MemoryRegistrationRepository {
    records: Mutex<Vec<Registration>>,
    failing: AtomicBool,
}

impl MemoryRegistrationRepository {
    pub fn with_records(records: Vec<Registration>) -> Self {
        Self {
            records: Mutex::new(records),
            failing: AtomicBool::new(false),
        }
    }

    pub fn fail_with_errors(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn stored(&self) -> Vec<Registration> {
        self.records.lock().unwrap().clone()
    }

    fn check(&self) -> Result<(), AppError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(offline());
        }
        Ok(())
    }
}

#[async_trait]
impl RegistrationRepository for MemoryRegistrationRepository {
    async fn list_registrations(&self) -> Result<Vec<Registration>, AppError> {
        self.check()?;
        Ok(self.stored())
    }

    async fn create_registration(&self, new: &NewRegistration) -> Result<Registration, AppError> {
        self.check()?;
        let mut registration = Registration::sample(&new.razao_social, new.status, Utc::now());
        registration.registration_type = new.registration_type;
        registration.brand_of_interest = new.brand_of_interest.clone();
        registration.cnpj = new.cnpj.clone();
        registration.nome_fantasia = new.nome_fantasia.clone();
        registration.contact_name = new.contact_name.clone();
        registration.email = new.email.clone();
        registration.whatsapp_phone = new.whatsapp_phone.clone();
        registration.store_phone = new.store_phone.clone();
        registration.cidade = new.cidade.clone();
        registration.uf = new.uf.clone();
        registration.billing_range = new.billing_range.clone();
        registration.lgpd_accepted = new.lgpd_accepted;
        registration.business_partners = new.business_partners.clone();
        registration.bank_references = new.bank_references.clone();
        registration.commercial_references = new.commercial_references.clone();

        self.records.lock().unwrap().insert(0, registration.clone());
        Ok(registration)
    }

    async fn set_status(&self, id: Uuid, status: B2bStatus) -> Result<(), AppError> {
        self.check()?;
        let mut records = self.records.lock().unwrap();
        let record = records.iter_mut().find(|r| r.id == id).ok_or(AppError::NotFound)?;
        record.status = status.into();
        record.updated_at = Some(Utc::now());
        Ok(())
    }

    async fn delete_registration(&self, id: Uuid) -> Result<(), AppError> {
        self.check()?;
        let mut records = self.records.lock().unwrap();
        let before = records.len();
        records.retain(|r| r.id != id);
        if records.len() == before {
            return Err(AppError::NotFound);
        }
        Ok(())
    }

    async fn count_by_status(&self, statuses: &[B2bStatus]) -> Result<i64, AppError> {
        self.check()?;
        let records = self.records.lock().unwrap();
        let count = records
            .iter()
            .filter(|r| r.status.known().is_some_and(|s| statuses.contains(&s)))
            .count();
        Ok(count as i64)
    }

    async fn count_all(&self) -> Result<i64, AppError> {
        self.check()?;
        Ok(self.records.lock().unwrap().len() as i64)
    }
}

#[derive(Default)]
pub struct MemoryUserRepository {
    users: Mutex<Vec<User>>,
    failing: AtomicBool,
}

impl MemoryUserRepository {
    pub fn with_users(users: Vec<User>) -> Self {
        Self {
            users: Mutex::new(users),
            failing: AtomicBool::new(false),
        }
    }

    pub fn fail_with_errors(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    fn check(&self) -> Result<(), AppError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(offline());
        }
        Ok(())
    }
}

#[async_trait]
impl UserRepository for MemoryUserRepository {
    async fn list_users(&self) -> Result<Vec<User>, AppError> {
        self.check()?;
        Ok(self.users.lock().unwrap().clone())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        self.check()?;
        let email = email.trim().to_lowercase();
        Ok(self.users.lock().unwrap().iter().find(|u| u.email == email).cloned())
    }

    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>, AppError> {
        self.check()?;
        Ok(self.users.lock().unwrap().iter().find(|u| u.id == id).cloned())
    }

    async fn create_user(&self, new: &NewUser) -> Result<User, AppError> {
        self.check()?;
        let email = new.email.trim().to_lowercase();
        let mut users = self.users.lock().unwrap();
        if users.iter().any(|u| u.email == email) {
            return Err(AppError::EmailAlreadyExists);
        }
        let user = User {
            id: Uuid::new_v4(),
            full_name: new.full_name.clone(),
            cpf: new.cpf.clone(),
            email,
            whatsapp: new.whatsapp.clone(),
            role: new.role,
            password_hash: new.password_hash.clone(),
            created_at: Utc::now(),
            updated_at: None,
        };
        users.push(user.clone());
        Ok(user)
    }

    async fn update_user(&self, id: Uuid, changes: &UpdateUserPayload) -> Result<User, AppError> {
        self.check()?;
        let mut users = self.users.lock().unwrap();
        let new_email = changes.email.as_ref().map(|e| e.trim().to_lowercase());
        if let Some(email) = &new_email {
            if users.iter().any(|u| u.id != id && &u.email == email) {
                return Err(AppError::EmailAlreadyExists);
            }
        }

        let user = users.iter_mut().find(|u| u.id == id).ok_or(AppError::NotFound)?;
        if let Some(full_name) = &changes.full_name {
            user.full_name = full_name.clone();
        }
        if let Some(cpf) = &changes.cpf {
            user.cpf = cpf.clone();
        }
        if let Some(email) = new_email {
            user.email = email;
        }
        if let Some(whatsapp) = &changes.whatsapp {
            user.whatsapp = Some(whatsapp.clone());
        }
        if let Some(role) = changes.role {
            user.role = role;
        }
        user.updated_at = Some(Utc::now());
        Ok(user.clone())
    }

    async fn delete_user(&self, id: Uuid) -> Result<(), AppError> {
        self.check()?;
        let mut users = self.users.lock().unwrap();
        let before = users.len();
        users.retain(|u| u.id != id);
        if users.len() == before {
            return Err(AppError::NotFound);
        }
        Ok(())
    }

    async fn count_users(&self) -> Result<i64, AppError> {
        self.check()?;
        Ok(self.users.lock().unwrap().len() as i64)
    }
}
