// src/services/dashboard_service.rs

use std::sync::Arc;

use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::RegistrationRepository,
    models::{
        dashboard::{ActivityEntry, DashboardStats},
        status::B2bStatus,
    },
    services::session::SessionRegistry,
};

// Feed padrão do dashboard
pub const DEFAULT_ACTIVITY_LIMIT: usize = 5;

#[derive(Clone)]
pub struct DashboardService {
    repo: Arc<dyn RegistrationRepository>,
    sessions: SessionRegistry,
}

impl DashboardService {
    pub fn new(repo: Arc<dyn RegistrationRepository>, sessions: SessionRegistry) -> Self {
        Self { repo, sessions }
    }

    /// Contadores direto do banco, sem depender do store da sessão.
    pub async fn get_stats(&self) -> Result<DashboardStats, AppError> {
        let counts = async {
            let total = self.repo.count_all().await?;
            let pending = self.repo.count_by_status(&B2bStatus::pending()).await?;
            let completed = self.repo.count_by_status(&B2bStatus::COMPLETED).await?;
            Ok::<_, AppError>((total, pending, completed))
        };

        let (total, pending, completed) = counts.await.map_err(|e| {
            tracing::error!("🔥 Falha ao contar cadastros: {}", e);
            AppError::CollaboratorFailure("count_by_status".into())
        })?;

        Ok(DashboardStats {
            total: total as usize,
            pending: pending as usize,
            completed: completed as usize,
        })
    }

    /// Últimas movimentações, a partir do store recarregado da sessão.
    pub async fn get_activity(&self, sid: Uuid, limit: usize) -> Result<Vec<ActivityEntry>, AppError> {
        let store = self.sessions.store_for(sid).await?;
        if !store.refresh().await && !store.is_loaded().await {
            return Err(AppError::CollaboratorFailure("list_registrations".into()));
        }
        Ok(store.recent_activity(limit).await)
    }
}
