// src/services/auth.rs

use std::sync::Arc;

use bcrypt::{hash, verify};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use uuid::Uuid;

use crate::{
    common::{error::AppError, validators::format_cpf},
    db::UserRepository,
    models::auth::{Claims, NewUser, User, UserRole},
    services::session::SessionRegistry,
};

/// Admin criado na primeira subida, quando a tabela de usuários está vazia.
#[derive(Debug, Clone)]
pub struct AdminBootstrap {
    pub email: String,
    pub password: String,
    pub full_name: String,
    pub cpf: String,
}

// Hash fora do runtime async: bcrypt é CPU-bound
pub async fn hash_password(password: &str) -> Result<String, AppError> {
    let password_clone = password.to_owned();
    let hashed = tokio::task::spawn_blocking(move || hash(&password_clone, bcrypt::DEFAULT_COST))
        .await
        .map_err(|e| anyhow::anyhow!("Falha na task de hashing: {}", e))??;
    Ok(hashed)
}

#[derive(Clone)]
pub struct AuthService {
    user_repo: Arc<dyn UserRepository>,
    sessions: SessionRegistry,
    jwt_secret: String,
    token_ttl: Duration,
}

impl AuthService {
    pub fn new(
        user_repo: Arc<dyn UserRepository>,
        sessions: SessionRegistry,
        jwt_secret: String,
        token_ttl: Duration,
    ) -> Self {
        Self { user_repo, sessions, jwt_secret, token_ttl }
    }

    /// Confere as credenciais, abre uma sessão (com seu store de cadastros)
    /// e devolve o token dela.
    pub async fn login(&self, email: &str, password: &str) -> Result<(String, User), AppError> {
        let user = self
            .user_repo
            .find_user_by_email(email)
            .await
            .map_err(|e| {
                tracing::error!("🔥 Falha ao buscar usuário para login: {}", e);
                AppError::CollaboratorFailure("find_user_by_email".into())
            })?
            .ok_or(AppError::InvalidCredentials)?;

        let password_clone = password.to_owned();
        let password_hash_clone = user.password_hash.clone();

        // Executa a verificação em um thread separado
        let is_password_valid = tokio::task::spawn_blocking(move || {
            verify(&password_clone, &password_hash_clone)
        })
        .await
        .map_err(|e| anyhow::anyhow!("Falha na task de verificação de senha: {}", e))??;

        if !is_password_valid {
            return Err(AppError::InvalidCredentials);
        }

        let sid = Uuid::new_v4();
        let expires_at = Utc::now() + self.token_ttl;
        let token = self.create_token(user.id, sid, expires_at)?;
        // A sessão só existe depois que o token foi emitido
        self.sessions.open(sid, expires_at).await;

        tracing::info!("🔑 Login de {} (sessão {})", user.email, sid);
        Ok((token, user))
    }

    /// Encerra a sessão e descarta o store dela.
    pub async fn logout(&self, sid: Uuid) -> bool {
        let closed = self.sessions.close(sid).await;
        if closed {
            tracing::info!("👋 Sessão {} encerrada", sid);
        }
        closed
    }

    pub async fn validate_token(&self, token: &str) -> Result<(User, Claims), AppError> {
        let validation = Validation::default();
        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.jwt_secret.as_ref()),
            &validation,
        )
        .map_err(|_| AppError::InvalidToken)?;

        // Token íntegro de uma sessão já encerrada
        if !self.sessions.is_open(token_data.claims.sid).await {
            return Err(AppError::InvalidToken);
        }

        let user = self
            .user_repo
            .find_user_by_id(token_data.claims.sub)
            .await
            .map_err(|e| {
                tracing::error!("🔥 Falha ao buscar usuário do token: {}", e);
                AppError::CollaboratorFailure("find_user_by_id".into())
            })?
            // Usuário removido depois do login
            .ok_or(AppError::InvalidToken)?;

        Ok((user, token_data.claims))
    }

    /// Garante que exista ao menos um admin. Devolve `true` se criou.
    pub async fn ensure_admin(&self, bootstrap: &AdminBootstrap) -> Result<bool, AppError> {
        if self.user_repo.count_users().await? > 0 {
            return Ok(false);
        }

        let password_hash = hash_password(&bootstrap.password).await?;
        let admin = self
            .user_repo
            .create_user(&NewUser {
                full_name: bootstrap.full_name.clone(),
                cpf: format_cpf(&bootstrap.cpf),
                email: bootstrap.email.clone(),
                whatsapp: None,
                role: UserRole::Admin,
                password_hash,
            })
            .await?;

        tracing::info!("👤 Usuário admin inicial criado: {}", admin.email);
        Ok(true)
    }

    fn create_token(
        &self,
        user_id: Uuid,
        sid: Uuid,
        expires_at: DateTime<Utc>,
    ) -> Result<String, AppError> {
        let now = Utc::now();

        let claims = Claims {
            sub: user_id,
            sid,
            exp: expires_at.timestamp() as usize,
            iat: now.timestamp() as usize,
        };

        // Usa '?' para um tratamento de erro mais limpo
        Ok(encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_ref()),
        )?)
    }
}
