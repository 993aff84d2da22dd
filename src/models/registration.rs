// src/models/registration.rs

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::status::{B2bStatus, RegistrationStatus};

// --- ENUMS ---

// Mapeia o CREATE TYPE registration_type do banco
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "registration_type", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum RegistrationType {
    /// Compra à vista: cadastro simplificado
    Vista,
    /// Compra a prazo: exige sócios e referências bancárias
    Prazo,
}

impl RegistrationType {
    /// Etapa em que o cadastro entra no funil ao ser enviado.
    pub fn initial_status(self) -> B2bStatus {
        match self {
            RegistrationType::Vista => B2bStatus::LeadSiteVista,
            RegistrationType::Prazo => B2bStatus::LeadSitePrazo,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "bank_account_type", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum AccountType {
    Corrente,
    Poupanca,
}

// Escrito pela integração externa (Linx Commerce / Flodesk), só leitura aqui
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "integration_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum IntegrationStatus {
    Pending,
    Partial,
    Completed,
    Failed,
}

// --- FILHOS DO CADASTRO ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BusinessPartner {
    #[schema(example = "João da Silva")]
    pub name: String,
    #[schema(example = "111.444.777-35")]
    pub cpf: String,
    pub rg: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BankReference {
    #[schema(example = "Banco do Brasil")]
    pub bank_name: String,
    #[schema(example = "1234-5")]
    pub agency: String,
    #[schema(example = "98765-0")]
    pub account: String,
    pub account_type: AccountType,
    #[schema(value_type = Option<String>, format = Date, example = "2015-03-10")]
    pub opening_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CommercialReference {
    #[schema(example = "Distribuidora Exemplo LTDA")]
    pub company_name: String,
    pub cnpj: Option<String>,
    pub contact_name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
}

// --- CADASTRO B2B ---

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Registration {
    pub id: Uuid,
    pub registration_type: RegistrationType,

    // Lido como TEXT; valores fora das 9 etapas viram `Unknown`
    #[sqlx(try_from = "String")]
    #[schema(value_type = String, example = "Aguardando Análise")]
    pub status: RegistrationStatus,

    #[schema(example = "Mar Quente")]
    pub brand_of_interest: String,
    #[schema(example = "11.222.333/0001-81")]
    pub cnpj: String,
    #[schema(example = "Loja Exemplo LTDA")]
    pub razao_social: String,
    pub nome_fantasia: Option<String>,
    pub inscricao_estadual: Option<String>,

    pub contact_name: String,
    pub email: String,
    #[schema(example = "(11) 98765-4321")]
    pub whatsapp_phone: String,
    pub store_phone: Option<String>,

    pub cidade: Option<String>,
    #[schema(example = "SP")]
    pub uf: Option<String>,
    pub billing_range: Option<String>,
    pub instagram: Option<String>,
    pub website: Option<String>,
    pub notes: Option<String>,
    pub lgpd_accepted: bool,

    pub clifor_code: Option<String>,
    pub linx_synced_at: Option<DateTime<Utc>>,
    pub flodesk_synced_at: Option<DateTime<Utc>>,
    pub integration_status: Option<IntegrationStatus>,

    pub created_at: DateTime<Utc>,
    /// Vazio logo após a criação; preenchido a cada mutação posterior.
    pub updated_at: Option<DateTime<Utc>>,

    #[sqlx(skip)]
    pub business_partners: Vec<BusinessPartner>,
    #[sqlx(skip)]
    pub bank_references: Vec<BankReference>,
    #[sqlx(skip)]
    pub commercial_references: Vec<CommercialReference>,
}

impl Registration {
    /// Momento usado para ordenar o feed de atividades.
    pub fn last_activity_at(&self) -> DateTime<Utc> {
        self.updated_at.unwrap_or(self.created_at)
    }
}

// --- ENTRADA ---

// Dados enviados pelo formulário público
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SubmitRegistrationPayload {
    #[schema(example = "vista")]
    pub registration_type: RegistrationType,

    #[schema(example = "Mar Quente")]
    pub brand_of_interest: String,
    #[schema(example = "11222333000181")]
    pub cnpj: String,
    #[schema(example = "Loja Exemplo LTDA")]
    pub razao_social: String,
    pub nome_fantasia: Option<String>,
    pub inscricao_estadual: Option<String>,

    #[schema(example = "Maria Souza")]
    pub contact_name: String,
    #[schema(example = "maria@lojaexemplo.com.br")]
    pub email: String,
    #[schema(example = "11987654321")]
    pub whatsapp_phone: String,
    pub store_phone: Option<String>,

    pub cidade: Option<String>,
    pub uf: Option<String>,
    #[schema(example = "R$ 50.000 - R$ 100.000")]
    pub billing_range: Option<String>,
    pub instagram: Option<String>,
    pub website: Option<String>,
    pub notes: Option<String>,

    #[serde(default)]
    pub lgpd_accepted: bool,

    #[serde(default)]
    pub business_partners: Vec<BusinessPartner>,
    #[serde(default)]
    pub bank_references: Vec<BankReference>,
    #[serde(default)]
    pub commercial_references: Vec<CommercialReference>,
}

/// Cadastro já validado e normalizado, pronto para ser gravado.
#[derive(Debug, Clone)]
pub struct NewRegistration {
    pub registration_type: RegistrationType,
    pub status: B2bStatus,
    pub brand_of_interest: String,
    pub cnpj: String,
    pub razao_social: String,
    pub nome_fantasia: Option<String>,
    pub inscricao_estadual: Option<String>,
    pub contact_name: String,
    pub email: String,
    pub whatsapp_phone: String,
    pub store_phone: Option<String>,
    pub cidade: Option<String>,
    pub uf: Option<String>,
    pub billing_range: Option<String>,
    pub instagram: Option<String>,
    pub website: Option<String>,
    pub notes: Option<String>,
    pub lgpd_accepted: bool,
    pub business_partners: Vec<BusinessPartner>,
    pub bank_references: Vec<BankReference>,
    pub commercial_references: Vec<CommercialReference>,
}

// Mudança de etapa (arrastar no kanban ou selecionar na tabela).
// O status chega cru para que valores desconhecidos virem `InvalidStatus`.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TransitionStatusPayload {
    #[schema(example = "Cadastro Recebido")]
    pub status: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationQuery {
    /// Busca por razão social, contato ou e-mail
    pub q: Option<String>,
    /// Valor exato da etapa; ausente ou `all` = todas
    pub status: Option<String>,
}

#[cfg(test)]
impl Registration {
    /// Cadastro mínimo para os testes, criado em `created_at`.
    pub fn sample(razao_social: &str, status: B2bStatus, created_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            registration_type: RegistrationType::Vista,
            status: status.into(),
            brand_of_interest: "Mar Quente".into(),
            cnpj: "11.222.333/0001-81".into(),
            razao_social: razao_social.into(),
            nome_fantasia: None,
            inscricao_estadual: None,
            contact_name: "Maria Souza".into(),
            email: "maria@lojaexemplo.com.br".into(),
            whatsapp_phone: "(11) 98765-4321".into(),
            store_phone: None,
            cidade: Some("São Paulo".into()),
            uf: Some("SP".into()),
            billing_range: None,
            instagram: None,
            website: None,
            notes: None,
            lgpd_accepted: true,
            clifor_code: None,
            linx_synced_at: None,
            flodesk_synced_at: None,
            integration_status: None,
            created_at,
            updated_at: None,
            business_partners: Vec::new(),
            bank_references: Vec::new(),
            commercial_references: Vec::new(),
        }
    }
}
