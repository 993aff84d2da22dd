// src/models/status.rs

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Etapas do funil de cadastros B2B, na ordem em que aparecem no kanban.
///
/// O valor de fio (`as_str`) é gravado e trafegado literalmente, com
/// acentos; a comparação é sensível a maiúsculas e acentos.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum B2bStatus {
    LeadSite,
    LeadSiteVista,
    LeadSitePrazo,
    AguardandoAnalise,
    CadastroRecebido,
    AvaliacaoCadastro,
    CadastroPendente,
    CadastroRealizado,
    OnboardingRealizado,
}

impl B2bStatus {
    pub const ALL: [B2bStatus; 9] = [
        B2bStatus::LeadSite,
        B2bStatus::LeadSiteVista,
        B2bStatus::LeadSitePrazo,
        B2bStatus::AguardandoAnalise,
        B2bStatus::CadastroRecebido,
        B2bStatus::AvaliacaoCadastro,
        B2bStatus::CadastroPendente,
        B2bStatus::CadastroRealizado,
        B2bStatus::OnboardingRealizado,
    ];

    /// Únicas etapas consideradas concluídas. "Pendente" é sempre derivado
    /// como o complemento desta lista.
    pub const COMPLETED: [B2bStatus; 2] = [
        B2bStatus::CadastroRealizado,
        B2bStatus::OnboardingRealizado,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            B2bStatus::LeadSite => "Lead Site",
            B2bStatus::LeadSiteVista => "Lead Site - À Vista",
            B2bStatus::LeadSitePrazo => "Lead Site - A Prazo",
            B2bStatus::AguardandoAnalise => "Aguardando Análise",
            B2bStatus::CadastroRecebido => "Cadastro Recebido",
            B2bStatus::AvaliacaoCadastro => "Avaliação Cadastro",
            B2bStatus::CadastroPendente => "Cadastro Pendente",
            B2bStatus::CadastroRealizado => "Cadastro Realizado",
            B2bStatus::OnboardingRealizado => "Onboarding Realizado",
        }
    }

    pub fn from_wire(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.as_str() == value)
    }

    /// Rótulo curto usado nas colunas do kanban e nos badges.
    pub fn label(self) -> &'static str {
        match self {
            B2bStatus::LeadSite => "Lead Site",
            B2bStatus::LeadSiteVista => "À Vista",
            B2bStatus::LeadSitePrazo => "A Prazo",
            B2bStatus::AguardandoAnalise => "Aguardando",
            B2bStatus::CadastroRecebido => "Recebido",
            B2bStatus::AvaliacaoCadastro => "Avaliação",
            B2bStatus::CadastroPendente => "Pendente",
            B2bStatus::CadastroRealizado => "Realizado",
            B2bStatus::OnboardingRealizado => "Onboarding",
        }
    }

    /// Texto exibido no feed de atividades recentes.
    pub fn action(self) -> &'static str {
        match self {
            B2bStatus::LeadSite | B2bStatus::LeadSiteVista | B2bStatus::LeadSitePrazo => {
                "Novo cadastro B2B"
            }
            B2bStatus::AguardandoAnalise => "Aguardando análise",
            B2bStatus::CadastroRecebido => "Cadastro recebido",
            B2bStatus::AvaliacaoCadastro => "Em avaliação",
            B2bStatus::CadastroPendente => "Pendente",
            B2bStatus::CadastroRealizado => "Cadastro aprovado",
            B2bStatus::OnboardingRealizado => "Onboarding concluído",
        }
    }

    pub fn is_completed(self) -> bool {
        Self::COMPLETED.contains(&self)
    }

    pub fn is_pending(self) -> bool {
        !self.is_completed()
    }

    pub fn pending() -> Vec<B2bStatus> {
        Self::ALL.into_iter().filter(|s| s.is_pending()).collect()
    }
}

impl fmt::Display for B2bStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for B2bStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for B2bStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        B2bStatus::from_wire(&raw)
            .ok_or_else(|| serde::de::Error::custom(format!("status desconhecido: {raw}")))
    }
}

/// Status como lido do armazenamento: valores legados ou desconhecidos
/// ficam em `Unknown` em vez de sumirem numa comparação de strings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistrationStatus {
    Known(B2bStatus),
    Unknown(String),
}

impl RegistrationStatus {
    pub fn as_str(&self) -> &str {
        match self {
            RegistrationStatus::Known(status) => status.as_str(),
            RegistrationStatus::Unknown(raw) => raw,
        }
    }

    pub fn known(&self) -> Option<B2bStatus> {
        match self {
            RegistrationStatus::Known(status) => Some(*status),
            RegistrationStatus::Unknown(_) => None,
        }
    }

    pub fn is(&self, status: B2bStatus) -> bool {
        self.known() == Some(status)
    }

    pub fn action(&self) -> &str {
        match self {
            RegistrationStatus::Known(status) => status.action(),
            RegistrationStatus::Unknown(raw) => raw,
        }
    }
}

impl From<B2bStatus> for RegistrationStatus {
    fn from(status: B2bStatus) -> Self {
        RegistrationStatus::Known(status)
    }
}

// Usado pelo `#[sqlx(try_from = "String")]` na leitura da coluna `status`
impl From<String> for RegistrationStatus {
    fn from(raw: String) -> Self {
        match B2bStatus::from_wire(&raw) {
            Some(status) => RegistrationStatus::Known(status),
            None => RegistrationStatus::Unknown(raw),
        }
    }
}

impl fmt::Display for RegistrationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for RegistrationStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for RegistrationStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(RegistrationStatus::from(String::deserialize(deserializer)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_values_round_trip_in_order() {
        let wire: Vec<&str> = B2bStatus::ALL.iter().map(|s| s.as_str()).collect();
        assert_eq!(
            wire,
            [
                "Lead Site",
                "Lead Site - À Vista",
                "Lead Site - A Prazo",
                "Aguardando Análise",
                "Cadastro Recebido",
                "Avaliação Cadastro",
                "Cadastro Pendente",
                "Cadastro Realizado",
                "Onboarding Realizado",
            ]
        );
        for status in B2bStatus::ALL {
            assert_eq!(B2bStatus::from_wire(status.as_str()), Some(status));
        }
    }

    #[test]
    fn matching_is_accent_and_case_sensitive() {
        assert_eq!(B2bStatus::from_wire("Aguardando Analise"), None);
        assert_eq!(B2bStatus::from_wire("cadastro realizado"), None);
        assert_eq!(B2bStatus::from_wire("Lead Site - A Vista"), None);
    }

    #[test]
    fn pending_is_complement_of_completed() {
        let pending = B2bStatus::pending();
        assert_eq!(pending.len(), 7);
        assert!(B2bStatus::COMPLETED.iter().all(|s| s.is_completed()));
        assert_eq!(pending, B2bStatus::ALL[..7].to_vec());
        for status in B2bStatus::ALL {
            assert_ne!(pending.contains(&status), B2bStatus::COMPLETED.contains(&status));
        }
    }

    #[test]
    fn unknown_status_keeps_raw_value() {
        let status = RegistrationStatus::from("novo".to_string());
        assert_eq!(status, RegistrationStatus::Unknown("novo".into()));
        assert_eq!(status.as_str(), "novo");
        assert_eq!(status.action(), "novo");
        assert_eq!(status.known(), None);
    }

    #[test]
    fn serde_uses_wire_value() {
        let json = serde_json::to_string(&B2bStatus::AvaliacaoCadastro).unwrap();
        assert_eq!(json, "\"Avaliação Cadastro\"");
        let parsed: B2bStatus = serde_json::from_str("\"Cadastro Pendente\"").unwrap();
        assert_eq!(parsed, B2bStatus::CadastroPendente);
        assert!(serde_json::from_str::<B2bStatus>("\"Qualquer\"").is_err());

        let legacy: RegistrationStatus = serde_json::from_str("\"em_analise\"").unwrap();
        assert_eq!(legacy, RegistrationStatus::Unknown("em_analise".into()));
    }
}
