// src/config.rs

use std::{env, str::FromStr, sync::Arc, time::Duration};

use anyhow::Context;
use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::{
    common::i18n::I18nStore,
    db::{PgRegistrationRepository, PgUserRepository, RegistrationRepository, UserRepository},
    services::{
        auth::AdminBootstrap,
        integration::{DisabledIntegration, HttpIntegration, IntegrationClient},
        session::SessionRegistry,
        AuthService, DashboardService, RegistrationService, UserService,
    },
};

/// Configuração lida do ambiente (e do `.env`, se existir).
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub bind_addr: String,
    pub database_max_connections: u32,
    pub token_ttl_hours: i64,
    pub integration_url: Option<String>,
    pub integration_token: Option<String>,
    pub admin: Option<AdminBootstrap>,
}

fn optional_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn var_or<T>(key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match optional_var(key) {
        Some(raw) => raw
            .parse()
            .with_context(|| format!("{key} inválida: '{raw}'")),
        None => Ok(default),
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let database_url = env::var("DATABASE_URL").context("DATABASE_URL deve ser definida")?;
        let jwt_secret = env::var("JWT_SECRET").context("JWT_SECRET deve ser definido")?;

        // Admin inicial só quando e-mail e senha vierem juntos
        let admin = match (optional_var("ADMIN_EMAIL"), optional_var("ADMIN_PASSWORD")) {
            (Some(email), Some(password)) => Some(AdminBootstrap {
                email,
                password,
                full_name: optional_var("ADMIN_NAME").unwrap_or_else(|| "Administrador".into()),
                cpf: optional_var("ADMIN_CPF").unwrap_or_default(),
            }),
            _ => None,
        };

        Ok(Self {
            database_url,
            jwt_secret,
            bind_addr: optional_var("BIND_ADDR").unwrap_or_else(|| "0.0.0.0:3000".into()),
            database_max_connections: var_or("DATABASE_MAX_CONNECTIONS", 5)?,
            token_ttl_hours: var_or("TOKEN_TTL_HOURS", 168)?,
            integration_url: optional_var("INTEGRATION_URL"),
            integration_token: optional_var("INTEGRATION_TOKEN"),
            admin,
        })
    }

    pub async fn connect(&self) -> anyhow::Result<PgPool> {
        let db_pool = PgPoolOptions::new()
            .max_connections(self.database_max_connections)
            .acquire_timeout(Duration::from_secs(3))
            .connect(&self.database_url)
            .await
            .context("Falha ao conectar ao banco de dados")?;

        tracing::info!("✅ Conexão com o banco de dados estabelecida com sucesso!");
        Ok(db_pool)
    }

    pub fn integration_client(&self) -> Arc<dyn IntegrationClient> {
        match &self.integration_url {
            Some(url) => Arc::new(HttpIntegration::new(url.clone(), self.integration_token.clone())),
            None => {
                tracing::warn!("⚠️ INTEGRATION_URL não definida; integração desativada");
                Arc::new(DisabledIntegration)
            }
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub i18n_store: I18nStore,
    pub sessions: SessionRegistry,
    pub auth_service: AuthService,
    pub registration_service: RegistrationService,
    pub user_service: UserService,
    pub dashboard_service: DashboardService,
}

impl AppState {
    pub fn new(
        user_repo: Arc<dyn UserRepository>,
        registration_repo: Arc<dyn RegistrationRepository>,
        integration: Arc<dyn IntegrationClient>,
        jwt_secret: String,
        token_ttl: chrono::Duration,
    ) -> Self {
        // --- Monta o gráfico de dependências ---
        let sessions = SessionRegistry::new(registration_repo.clone());
        let auth_service =
            AuthService::new(user_repo.clone(), sessions.clone(), jwt_secret, token_ttl);
        let registration_service =
            RegistrationService::new(registration_repo.clone(), integration, sessions.clone());
        let user_service = UserService::new(user_repo);
        let dashboard_service = DashboardService::new(registration_repo, sessions.clone());

        Self {
            i18n_store: I18nStore::default(),
            sessions,
            auth_service,
            registration_service,
            user_service,
            dashboard_service,
        }
    }

    pub fn from_pool(config: &Config, db_pool: PgPool) -> Self {
        Self::new(
            Arc::new(PgUserRepository::new(db_pool.clone())),
            Arc::new(PgRegistrationRepository::new(db_pool)),
            config.integration_client(),
            config.jwt_secret.clone(),
            chrono::Duration::hours(config.token_ttl_hours),
        )
    }
}
