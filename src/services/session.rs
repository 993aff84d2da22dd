// src/services/session.rs

use std::{collections::HashMap, sync::Arc};

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{
    common::error::AppError, db::RegistrationRepository, models::registration::Registration,
    services::registration_store::RegistrationStore,
};

struct Session {
    store: Arc<RegistrationStore>,
    // Mesmo `exp` do token da sessão
    expires_at: DateTime<Utc>,
}

impl Session {
    fn is_live(&self, now: DateTime<Utc>) -> bool {
        self.expires_at > now
    }
}

/// Um `RegistrationStore` por sessão logada, indexado pelo `sid` do token.
/// O store nasce no login e morre no logout ou quando o token expira.
#[derive(Clone)]
pub struct SessionRegistry {
    repo: Arc<dyn RegistrationRepository>,
    sessions: Arc<RwLock<HashMap<Uuid, Session>>>,
}

impl SessionRegistry {
    pub fn new(repo: Arc<dyn RegistrationRepository>) -> Self {
        Self {
            repo,
            sessions: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Cria o store da sessão e faz a primeira carga. Sessões expiradas
    /// são descartadas aqui.
    pub async fn open(&self, sid: Uuid, expires_at: DateTime<Utc>) -> Arc<RegistrationStore> {
        let store = Arc::new(RegistrationStore::new(self.repo.clone()));
        if !store.refresh().await {
            tracing::warn!("⚠️ Sessão {} aberta sem cadastros carregados", sid);
        }

        let mut sessions = self.sessions.write().await;
        Self::prune(&mut sessions, Utc::now());
        sessions.insert(sid, Session { store: store.clone(), expires_at });
        store
    }

    /// Store de uma sessão aberta. Sessão encerrada ou expirada é `InvalidToken`.
    pub async fn store_for(&self, sid: Uuid) -> Result<Arc<RegistrationStore>, AppError> {
        let now = Utc::now();
        {
            let sessions = self.sessions.read().await;
            match sessions.get(&sid) {
                Some(session) if session.is_live(now) => return Ok(session.store.clone()),
                None => return Err(AppError::InvalidToken),
                Some(_) => {}
            }
        }

        Self::prune(&mut *self.sessions.write().await, now);
        Err(AppError::InvalidToken)
    }

    pub async fn close(&self, sid: Uuid) -> bool {
        self.sessions.write().await.remove(&sid).is_some()
    }

    pub async fn is_open(&self, sid: Uuid) -> bool {
        let now = Utc::now();
        self.sessions
            .read()
            .await
            .get(&sid)
            .is_some_and(|session| session.is_live(now))
    }

    /// Entrega um cadastro recém-criado a todas as sessões abertas.
    pub async fn publish(&self, registration: &Registration) {
        let now = Utc::now();
        let stores: Vec<Arc<RegistrationStore>> = self
            .sessions
            .read()
            .await
            .values()
            .filter(|session| session.is_live(now))
            .map(|session| session.store.clone())
            .collect();
        for store in stores {
            store.insert(registration.clone()).await;
        }
    }

    fn prune(sessions: &mut HashMap<Uuid, Session>, now: DateTime<Utc>) {
        let before = sessions.len();
        sessions.retain(|_, session| session.is_live(now));
        let expired = before - sessions.len();
        if expired > 0 {
            tracing::info!("⌛ {} sessão(ões) expirada(s) descartada(s)", expired);
        }
    }
}
