// src/models/auth.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::common::validators::{cpf_rule, phone_rule};

// Mapeia o CREATE TYPE user_role do banco
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Admin,
    Cadastro,
    Representante,
    User,
}

impl UserRole {
    pub fn is_admin(self) -> bool {
        self == UserRole::Admin
    }

    /// Quem pode ver e mover cadastros no funil.
    pub fn can_access_pipeline(self) -> bool {
        matches!(self, UserRole::Admin | UserRole::Cadastro)
    }
}

// Representa um usuário vindo do banco de dados
#[derive(Debug, Clone, Serialize, sqlx::FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    #[schema(example = "Ana Lima")]
    pub full_name: String,
    #[schema(example = "111.444.777-35")]
    pub cpf: String,
    #[schema(example = "ana@empresa.com.br")]
    pub email: String,
    pub whatsapp: Option<String>,
    pub role: UserRole,

    #[serde(skip_serializing)] // IMPORTANTE para segurança
    #[schema(ignore)]
    pub password_hash: String,

    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

// Dados para login
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct LoginUserPayload {
    #[validate(email(message = "invalid_email"))]
    #[schema(example = "ana@empresa.com.br")]
    pub email: String,
    #[validate(length(min = 6, message = "password_too_short"))]
    pub password: String,
}

// Resposta de autenticação com o token
#[derive(Debug, Serialize, ToSchema)]
pub struct AuthResponse {
    pub token: String,
    pub user: User,
}

// Usuário logado + o que ele pode ver (usado pelo front para montar o menu)
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MeResponse {
    #[serde(flatten)]
    pub user: User,
    pub is_admin: bool,
    pub can_access_crm: bool,
}

impl From<User> for MeResponse {
    fn from(user: User) -> Self {
        Self {
            is_admin: user.role.is_admin(),
            can_access_crm: user.role.can_access_pipeline(),
            user,
        }
    }
}

// Estrutura de dados ("claims") dentro do JWT
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,  // Subject (ID do usuário)
    pub sid: Uuid,  // Sessão que carrega o store de cadastros
    pub exp: usize, // Expiration time (quando o token expira)
    pub iat: usize, // Issued At (quando o token foi criado)
}

// --- GESTÃO DE USUÁRIOS (somente admin) ---

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserPayload {
    #[validate(length(min = 1, message = "required"))]
    pub full_name: String,
    #[validate(custom(function = "cpf_rule"))]
    pub cpf: String,
    #[validate(email(message = "invalid_email"))]
    pub email: String,
    #[validate(custom(function = "phone_rule"))]
    pub whatsapp: Option<String>,
    #[validate(length(min = 6, message = "password_too_short"))]
    pub password: String,
    #[schema(example = "cadastro")]
    pub role: UserRole,
}

// Campos ausentes não são alterados; senha e created_at nunca passam por aqui
#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserPayload {
    #[validate(length(min = 1, message = "required"))]
    pub full_name: Option<String>,
    #[validate(custom(function = "cpf_rule"))]
    pub cpf: Option<String>,
    #[validate(email(message = "invalid_email"))]
    pub email: Option<String>,
    #[validate(custom(function = "phone_rule"))]
    pub whatsapp: Option<String>,
    pub role: Option<UserRole>,
}

/// Usuário pronto para ser gravado (senha já com hash).
#[derive(Debug, Clone)]
pub struct NewUser {
    pub full_name: String,
    pub cpf: String,
    pub email: String,
    pub whatsapp: Option<String>,
    pub role: UserRole,
    pub password_hash: String,
}
