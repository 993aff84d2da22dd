// src/db/registration_repo.rs

use std::collections::HashMap;

use async_trait::async_trait;
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::{
        registration::{
            BankReference, BusinessPartner, CommercialReference, NewRegistration, Registration,
        },
        status::B2bStatus,
    },
};

// Tudo que o funil precisa do armazenamento. Atrás de um trait para que o
// store possa ser testado sem banco.
#[async_trait]
pub trait RegistrationRepository: Send + Sync {
    async fn list_registrations(&self) -> Result<Vec<Registration>, AppError>;

    /// Grava o cadastro e seus filhos numa única transação.
    async fn create_registration(&self, new: &NewRegistration) -> Result<Registration, AppError>;

    /// `NotFound` se o id não existe.
    async fn set_status(&self, id: Uuid, status: B2bStatus) -> Result<(), AppError>;

    async fn delete_registration(&self, id: Uuid) -> Result<(), AppError>;

    async fn count_by_status(&self, statuses: &[B2bStatus]) -> Result<i64, AppError>;

    async fn count_all(&self) -> Result<i64, AppError>;
}

const REGISTRATION_COLUMNS: &str = r#"
    id, registration_type, status, brand_of_interest, cnpj, razao_social,
    nome_fantasia, inscricao_estadual, contact_name, email, whatsapp_phone,
    store_phone, cidade, uf, billing_range, instagram, website, notes,
    lgpd_accepted, clifor_code, linx_synced_at, flodesk_synced_at,
    integration_status, created_at, updated_at
"#;

// Linhas das tabelas filhas, com a chave para agrupar por cadastro
#[derive(FromRow)]
struct PartnerRow {
    registration_id: Uuid,
    #[sqlx(flatten)]
    partner: BusinessPartner,
}

#[derive(FromRow)]
struct BankReferenceRow {
    registration_id: Uuid,
    #[sqlx(flatten)]
    reference: BankReference,
}

#[derive(FromRow)]
struct CommercialReferenceRow {
    registration_id: Uuid,
    #[sqlx(flatten)]
    reference: CommercialReference,
}

#[derive(Clone)]
pub struct PgRegistrationRepository {
    pool: PgPool,
}

impl PgRegistrationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // Busca os filhos de todos os cadastros de uma vez (3 queries no total,
    // em vez de 3 por cadastro)
    async fn attach_children(&self, registrations: &mut [Registration]) -> Result<(), AppError> {
        let ids: Vec<Uuid> = registrations.iter().map(|r| r.id).collect();

        let partners = sqlx::query_as::<_, PartnerRow>(
            r#"
            SELECT registration_id, name, cpf, rg, phone, email
            FROM business_partners
            WHERE registration_id = ANY($1)
            ORDER BY position
            "#,
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;

        let banks = sqlx::query_as::<_, BankReferenceRow>(
            r#"
            SELECT registration_id, bank_name, agency, account, account_type, opening_date
            FROM bank_references
            WHERE registration_id = ANY($1)
            ORDER BY position
            "#,
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;

        let commercial = sqlx::query_as::<_, CommercialReferenceRow>(
            r#"
            SELECT registration_id, company_name, cnpj, contact_name, phone, email
            FROM commercial_references
            WHERE registration_id = ANY($1)
            ORDER BY position
            "#,
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;

        let mut partners_by_id: HashMap<Uuid, Vec<BusinessPartner>> = HashMap::new();
        for row in partners {
            partners_by_id.entry(row.registration_id).or_default().push(row.partner);
        }
        let mut banks_by_id: HashMap<Uuid, Vec<BankReference>> = HashMap::new();
        for row in banks {
            banks_by_id.entry(row.registration_id).or_default().push(row.reference);
        }
        let mut commercial_by_id: HashMap<Uuid, Vec<CommercialReference>> = HashMap::new();
        for row in commercial {
            commercial_by_id.entry(row.registration_id).or_default().push(row.reference);
        }

        for registration in registrations.iter_mut() {
            registration.business_partners =
                partners_by_id.remove(&registration.id).unwrap_or_default();
            registration.bank_references = banks_by_id.remove(&registration.id).unwrap_or_default();
            registration.commercial_references =
                commercial_by_id.remove(&registration.id).unwrap_or_default();
        }

        Ok(())
    }

    async fn insert_children(
        tx: &mut Transaction<'_, Postgres>,
        registration_id: Uuid,
        new: &NewRegistration,
    ) -> Result<(), AppError> {
        for (position, partner) in new.business_partners.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO business_partners (registration_id, position, name, cpf, rg, phone, email)
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                "#,
            )
            .bind(registration_id)
            .bind(position as i32)
            .bind(&partner.name)
            .bind(&partner.cpf)
            .bind(&partner.rg)
            .bind(&partner.phone)
            .bind(&partner.email)
            .execute(&mut **tx)
            .await?;
        }

        for (position, bank) in new.bank_references.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO bank_references
                    (registration_id, position, bank_name, agency, account, account_type, opening_date)
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                "#,
            )
            .bind(registration_id)
            .bind(position as i32)
            .bind(&bank.bank_name)
            .bind(&bank.agency)
            .bind(&bank.account)
            .bind(bank.account_type)
            .bind(bank.opening_date)
            .execute(&mut **tx)
            .await?;
        }

        for (position, reference) in new.commercial_references.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO commercial_references
                    (registration_id, position, company_name, cnpj, contact_name, phone, email)
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                "#,
            )
            .bind(registration_id)
            .bind(position as i32)
            .bind(&reference.company_name)
            .bind(&reference.cnpj)
            .bind(&reference.contact_name)
            .bind(&reference.phone)
            .bind(&reference.email)
            .execute(&mut **tx)
            .await?;
        }

        Ok(())
    }
}

#[async_trait]
impl RegistrationRepository for PgRegistrationRepository {
    async fn list_registrations(&self) -> Result<Vec<Registration>, AppError> {
        let sql = format!(
            "SELECT {REGISTRATION_COLUMNS} FROM b2b_registrations ORDER BY created_at DESC"
        );
        let mut registrations = sqlx::query_as::<_, Registration>(&sql)
            .fetch_all(&self.pool)
            .await?;

        self.attach_children(&mut registrations).await?;
        Ok(registrations)
    }

    async fn create_registration(&self, new: &NewRegistration) -> Result<Registration, AppError> {
        let mut tx = self.pool.begin().await?;

        let sql = format!(
            r#"
            INSERT INTO b2b_registrations (
                registration_type, status, brand_of_interest, cnpj, razao_social,
                nome_fantasia, inscricao_estadual, contact_name, email, whatsapp_phone,
                store_phone, cidade, uf, billing_range, instagram, website, notes,
                lgpd_accepted
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18)
            RETURNING {REGISTRATION_COLUMNS}
            "#
        );
        let mut registration = sqlx::query_as::<_, Registration>(&sql)
            .bind(new.registration_type)
            .bind(new.status.as_str())
            .bind(&new.brand_of_interest)
            .bind(&new.cnpj)
            .bind(&new.razao_social)
            .bind(&new.nome_fantasia)
            .bind(&new.inscricao_estadual)
            .bind(&new.contact_name)
            .bind(&new.email)
            .bind(&new.whatsapp_phone)
            .bind(&new.store_phone)
            .bind(&new.cidade)
            .bind(&new.uf)
            .bind(&new.billing_range)
            .bind(&new.instagram)
            .bind(&new.website)
            .bind(&new.notes)
            .bind(new.lgpd_accepted)
            .fetch_one(&mut *tx)
            .await?;

        // Se qualquer filho falhar, o drop do tx desfaz o cadastro
        Self::insert_children(&mut tx, registration.id, new).await?;

        tx.commit().await?;

        registration.business_partners = new.business_partners.clone();
        registration.bank_references = new.bank_references.clone();
        registration.commercial_references = new.commercial_references.clone();

        tracing::info!("📝 Cadastro B2B {} gravado ({})", registration.id, registration.status);
        Ok(registration)
    }

    async fn set_status(&self, id: Uuid, status: B2bStatus) -> Result<(), AppError> {
        let result = sqlx::query(
            "UPDATE b2b_registrations SET status = $2, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .bind(status.as_str())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound);
        }
        Ok(())
    }

    async fn delete_registration(&self, id: Uuid) -> Result<(), AppError> {
        // Filhos saem junto (ON DELETE CASCADE)
        let result = sqlx::query("DELETE FROM b2b_registrations WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound);
        }
        Ok(())
    }

    async fn count_by_status(&self, statuses: &[B2bStatus]) -> Result<i64, AppError> {
        let values: Vec<String> = statuses.iter().map(|s| s.as_str().to_string()).collect();

        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM b2b_registrations WHERE status = ANY($1)",
        )
        .bind(&values)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    async fn count_all(&self) -> Result<i64, AppError> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM b2b_registrations")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}
