// src/common/error.rs

use std::collections::HashMap;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use thiserror::Error;

use crate::common::i18n::I18nStore;
use crate::middleware::i18n::Locale;

// Nosso tipo de erro, agora com `thiserror` para melhor ergonomia.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Erro de validação")]
    ValidationError(#[from] validator::ValidationErrors),

    // Erros por campo do formulário: chave do campo -> código do erro
    #[error("Campos inválidos: {0:?}")]
    FieldValidation(HashMap<String, String>),

    // Etapa fora das 9 conhecidas; rejeitada antes de qualquer mutação
    #[error("Status inválido: {0}")]
    InvalidStatus(String),

    // Persistência, auth ou integração reportaram falha
    #[error("Falha no serviço externo: {0}")]
    CollaboratorFailure(String),

    #[error("Registro não encontrado")]
    NotFound,

    #[error("E-mail já existe")]
    EmailAlreadyExists,

    #[error("Credenciais inválidas")]
    InvalidCredentials,

    #[error("Token inválido")]
    InvalidToken,

    #[error("Acesso negado")]
    Forbidden,

    // Variante para erros de banco de dados (exemplo com sqlx)
    #[error("Erro de banco de dados: {0}")]
    DatabaseError(#[from] sqlx::Error),

    // Variante genérica para qualquer outro erro inesperado
    #[error("Erro interno do servidor: {0}")]
    InternalServerError(#[from] anyhow::Error),

    #[error("Erro de Bcrypt: {0}")]
    BcryptError(#[from] bcrypt::BcryptError),

    #[error("Erro de JWT: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),
}

impl AppError {
    /// Código estável usado para traduzir a mensagem.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::ValidationError(_) | AppError::FieldValidation(_) => "validation_failed",
            AppError::InvalidStatus(_) => "invalid_status",
            AppError::CollaboratorFailure(_) => "collaborator_failure",
            AppError::NotFound => "not_found",
            AppError::EmailAlreadyExists => "email_already_exists",
            AppError::InvalidCredentials => "invalid_credentials",
            AppError::InvalidToken => "invalid_token",
            AppError::Forbidden => "forbidden",
            _ => "internal_error",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_)
            | AppError::FieldValidation(_)
            | AppError::InvalidStatus(_) => StatusCode::BAD_REQUEST,
            AppError::CollaboratorFailure(_) => StatusCode::BAD_GATEWAY,
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::EmailAlreadyExists => StatusCode::CONFLICT,
            AppError::InvalidCredentials | AppError::InvalidToken => StatusCode::UNAUTHORIZED,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    // Detalhes por campo; só existem nos erros de validação
    fn details(&self) -> Option<Value> {
        match self {
            AppError::ValidationError(errors) => {
                let mut details = HashMap::new();
                for (field, field_errors) in errors.field_errors() {
                    let codes: Vec<String> = field_errors
                        .iter()
                        .map(|e| match &e.message {
                            Some(message) => message.to_string(),
                            None => e.code.to_string(),
                        })
                        .collect();
                    details.insert(field.to_string(), codes);
                }
                Some(json!(details))
            }
            AppError::FieldValidation(errors) => Some(json!(errors)),
            AppError::InvalidStatus(raw) => Some(json!({ "status": raw })),
            _ => None,
        }
    }

    /// Converte para a resposta HTTP, com a mensagem no idioma do usuário.
    pub fn to_api_error(self, locale: &Locale, i18n: &I18nStore) -> ApiError {
        let status = self.status_code();
        match &self {
            AppError::CollaboratorFailure(operation) => {
                tracing::error!("Falha de colaborador externo: {}", operation);
            }
            _ if status == StatusCode::INTERNAL_SERVER_ERROR => {
                tracing::error!("Erro Interno do Servidor: {}", self);
            }
            _ => {}
        }

        ApiError {
            status,
            error: i18n.translate(locale, self.code()),
            details: self.details(),
        }
    }
}

// Resposta de erro já traduzida, devolvida pelos handlers
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub error: String,
    pub details: Option<Value>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = match self.details {
            Some(details) => json!({ "error": self.error, "details": details }),
            None => json!({ "error": self.error }),
        };
        (self.status, Json(body)).into_response()
    }
}

// Usado onde não há idioma à mão (ex.: middleware de autenticação)
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        self.to_api_error(&Locale::default(), &I18nStore::default())
            .into_response()
    }
}
