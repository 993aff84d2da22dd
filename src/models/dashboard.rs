// src/models/dashboard.rs

use std::fmt;

use serde::{Serialize, Serializer};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::{registration::Registration, status::B2bStatus};

// 1. Contadores dos cards do topo
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total: usize,
    /// Cadastros em qualquer etapa exceto as concluídas
    pub pending: usize,
    /// "Cadastro Realizado" + "Onboarding Realizado"
    pub completed: usize,
}

// Tempo decorrido, truncado para baixo
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelativeTime {
    Now,
    Minutes(i64),
    Hours(i64),
    Days(i64),
}

impl fmt::Display for RelativeTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RelativeTime::Now => f.write_str("Agora"),
            RelativeTime::Minutes(m) => write!(f, "Há {m} min"),
            RelativeTime::Hours(h) => write!(f, "Há {h}h"),
            RelativeTime::Days(d) => write!(f, "Há {d}d"),
        }
    }
}

impl Serialize for RelativeTime {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

// 2. Feed de atividades recentes
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ActivityEntry {
    pub id: Uuid,
    #[schema(example = "Cadastro aprovado")]
    pub action: String,
    #[schema(example = "Loja Exemplo LTDA")]
    pub company: String,
    #[schema(value_type = String, example = "Há 5 min")]
    pub time: RelativeTime,
}

// 3. Kanban
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PipelineColumn {
    #[schema(value_type = String, example = "Cadastro Recebido")]
    pub status: B2bStatus,
    #[schema(example = "Recebido")]
    pub label: String,
    pub count: usize,
    pub registrations: Vec<Registration>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PipelineBoard {
    pub columns: Vec<PipelineColumn>,
    pub stats: DashboardStats,
}
