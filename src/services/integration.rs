// src/services/integration.rs

//! Sincronização com o ERP (Linx Commerce) e a ferramenta de e-mail
//! (Flodesk), disparada uma vez por cadastro criado.
//!
//! O resultado só vai para o log: a criação do cadastro nunca espera
//! nem falha por causa da integração.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::common::error::AppError;

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct IntegrationOutcome {
    /// Código do cliente criado no ERP
    #[serde(rename = "clifor")]
    pub external_ref: Option<String>,
    #[serde(rename = "flodeskSynced")]
    pub secondary_synced: Option<bool>,
}

#[async_trait]
pub trait IntegrationClient: Send + Sync {
    async fn trigger(&self, registration_id: Uuid) -> Result<IntegrationOutcome, AppError>;
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TriggerRequest {
    registration_id: Uuid,
}

/// Chama o endpoint de integração via HTTP.
#[derive(Clone)]
pub struct HttpIntegration {
    client: Client,
    url: String,
    token: Option<String>,
}

impl HttpIntegration {
    pub fn new(url: String, token: Option<String>) -> Self {
        Self {
            client: Client::new(),
            url,
            token,
        }
    }
}

#[async_trait]
impl IntegrationClient for HttpIntegration {
    async fn trigger(&self, registration_id: Uuid) -> Result<IntegrationOutcome, AppError> {
        let mut request = self
            .client
            .post(&self.url)
            .json(&TriggerRequest { registration_id });
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| AppError::CollaboratorFailure(format!("integração: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::CollaboratorFailure(format!(
                "integração respondeu {} - {}",
                status, body
            )));
        }

        response
            .json::<IntegrationOutcome>()
            .await
            .map_err(|e| AppError::CollaboratorFailure(format!("resposta da integração: {}", e)))
    }
}

/// Usado quando `INTEGRATION_URL` não está configurada.
#[derive(Clone, Default)]
pub struct DisabledIntegration;

#[async_trait]
impl IntegrationClient for DisabledIntegration {
    async fn trigger(&self, registration_id: Uuid) -> Result<IntegrationOutcome, AppError> {
        tracing::debug!("Integração desativada; cadastro {} não sincronizado", registration_id);
        Ok(IntegrationOutcome::default())
    }
}

/// Dispara a integração em segundo plano. Falhas viram `warn!` e `None`,
/// sem nova tentativa.
pub fn dispatch(
    client: Arc<dyn IntegrationClient>,
    registration_id: Uuid,
) -> JoinHandle<Option<IntegrationOutcome>> {
    tokio::spawn(async move {
        match client.trigger(registration_id).await {
            Ok(outcome) => {
                tracing::info!(
                    "🔗 Integração do cadastro {} concluída (clifor: {:?}, flodesk: {:?})",
                    registration_id,
                    outcome.external_ref,
                    outcome.secondary_synced
                );
                Some(outcome)
            }
            Err(e) => {
                tracing::warn!("⚠️ Integração do cadastro {} falhou: {}", registration_id, e);
                None
            }
        }
    })
}

#[cfg(test)]
pub mod testing {
    use super::*;
    use std::sync::Mutex;

    /// Registra os ids recebidos; `failing` faz toda chamada falhar.
    #[derive(Default)]
    pub struct RecordingIntegration {
        pub calls: Mutex<Vec<Uuid>>,
        pub failing: bool,
    }

    #[async_trait]
    impl IntegrationClient for RecordingIntegration {
        async fn trigger(&self, registration_id: Uuid) -> Result<IntegrationOutcome, AppError> {
            self.calls.lock().unwrap().push(registration_id);
            if self.failing {
                return Err(AppError::CollaboratorFailure("integração fora do ar".into()));
            }
            Ok(IntegrationOutcome {
                external_ref: Some("C-1001".into()),
                secondary_synced: Some(true),
            })
        }
    }
}
