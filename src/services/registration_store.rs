// src/services/registration_store.rs

use std::sync::Arc;

use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::RegistrationRepository,
    models::{
        dashboard::{ActivityEntry, DashboardStats, PipelineBoard},
        registration::Registration,
        status::B2bStatus,
    },
    services::pipeline,
};

#[derive(Default)]
struct StoreState {
    records: Vec<Registration>,
    // Já houve ao menos uma carga bem-sucedida?
    loaded: bool,
}

/// Cópia em memória dos cadastros vista por uma sessão de operador.
///
/// Só muda pelas operações do funil e sempre grava no repositório antes
/// de alterar a cópia local. O lock nunca fica preso durante uma chamada
/// ao repositório.
pub struct RegistrationStore {
    repo: Arc<dyn RegistrationRepository>,
    state: RwLock<StoreState>,
}

impl std::fmt::Debug for RegistrationStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegistrationStore").finish_non_exhaustive()
    }
}

impl RegistrationStore {
    pub fn new(repo: Arc<dyn RegistrationRepository>) -> Self {
        Self {
            repo,
            state: RwLock::new(StoreState::default()),
        }
    }

    /// Recarrega tudo do repositório. Em caso de falha mantém o conteúdo
    /// anterior e devolve `false`.
    pub async fn refresh(&self) -> bool {
        match self.repo.list_registrations().await {
            Ok(mut records) => {
                // ids repetidos vindos do banco: fica a primeira ocorrência
                let mut seen = std::collections::HashSet::new();
                records.retain(|r| seen.insert(r.id));

                let mut state = self.state.write().await;
                state.records = records;
                state.loaded = true;
                true
            }
            Err(e) => {
                tracing::error!("🔥 Falha ao carregar cadastros: {}", e);
                false
            }
        }
    }

    pub async fn is_loaded(&self) -> bool {
        self.state.read().await.loaded
    }

    /// Muda a etapa de um cadastro: valida, grava no repositório e só
    /// então aplica na cópia local.
    pub async fn transition(&self, id: Uuid, raw_status: &str) -> Result<Registration, AppError> {
        let status = B2bStatus::from_wire(raw_status)
            .ok_or_else(|| AppError::InvalidStatus(raw_status.to_string()))?;

        // Sem carga inicial, a ausência local não diz nada sobre o banco
        if !self.is_loaded().await && !self.refresh().await {
            return Err(AppError::CollaboratorFailure("list_registrations".into()));
        }
        if self.get(id).await.is_none() {
            return Err(AppError::NotFound);
        }

        match self.repo.set_status(id, status).await {
            Ok(()) => {}
            Err(AppError::NotFound) => {
                // Apagado por outro operador
                self.remove_local(id).await;
                return Err(AppError::NotFound);
            }
            Err(e) => {
                tracing::error!("🔥 Falha ao gravar status do cadastro {}: {}", id, e);
                return Err(AppError::CollaboratorFailure("set_status".into()));
            }
        }

        let mut state = self.state.write().await;
        let record = state
            .records
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or(AppError::NotFound)?;
        pipeline::apply_status_transition(record, status.as_str())?;

        tracing::info!("🔀 Cadastro {} movido para '{}'", id, status);
        Ok(record.clone())
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        match self.repo.delete_registration(id).await {
            Ok(()) => {
                self.remove_local(id).await;
                tracing::info!("🗑️ Cadastro {} removido", id);
                Ok(())
            }
            Err(AppError::NotFound) => {
                self.remove_local(id).await;
                Err(AppError::NotFound)
            }
            Err(e) => {
                tracing::error!("🔥 Falha ao remover cadastro {}: {}", id, e);
                Err(AppError::CollaboratorFailure("delete_registration".into()))
            }
        }
    }

    /// Acrescenta um cadastro recém-criado no topo. Ids repetidos são recusados.
    pub async fn insert(&self, record: Registration) -> bool {
        let mut state = self.state.write().await;
        if state.records.iter().any(|r| r.id == record.id) {
            return false;
        }
        state.records.insert(0, record);
        true
    }

    async fn remove_local(&self, id: Uuid) {
        self.state.write().await.records.retain(|r| r.id != id);
    }

    // --- LEITURAS ---

    #[cfg(test)]
    pub async fn snapshot(&self) -> Vec<Registration> {
        self.state.read().await.records.clone()
    }

    pub async fn get(&self, id: Uuid) -> Option<Registration> {
        self.state.read().await.records.iter().find(|r| r.id == id).cloned()
    }

    pub async fn aggregates(&self) -> DashboardStats {
        pipeline::compute_aggregates(&self.state.read().await.records)
    }

    pub async fn recent_activity(&self, limit: usize) -> Vec<ActivityEntry> {
        pipeline::recent_activity(&self.state.read().await.records, limit)
    }

    pub async fn search(&self, query: Option<&str>, status: Option<B2bStatus>) -> Vec<Registration> {
        let state = self.state.read().await;
        pipeline::search(&state.records, query, status)
            .into_iter()
            .cloned()
            .collect()
    }

    pub async fn board(&self) -> PipelineBoard {
        pipeline::build_board(&self.state.read().await.records)
    }
}
