// src/services/pipeline.rs

//! Regras do funil de cadastros: mudança de etapa e os agregados
//! derivados (contadores, feed de atividades, colunas do kanban).
//!
//! Tudo aqui é puro; quem persiste é o `RegistrationStore`.

use chrono::{DateTime, Utc};

use crate::{
    common::error::AppError,
    models::{
        dashboard::{ActivityEntry, DashboardStats, PipelineBoard, PipelineColumn, RelativeTime},
        registration::Registration,
        status::B2bStatus,
    },
};

/// Move o cadastro para `new_status`.
///
/// Qualquer etapa pode ir para qualquer outra (inclusive voltar). Um valor
/// fora das 9 etapas é rejeitado antes de tocar no registro.
pub fn apply_status_transition(
    record: &mut Registration,
    new_status: &str,
) -> Result<B2bStatus, AppError> {
    apply_status_transition_at(record, new_status, Utc::now())
}

pub fn apply_status_transition_at(
    record: &mut Registration,
    new_status: &str,
    now: DateTime<Utc>,
) -> Result<B2bStatus, AppError> {
    let status = B2bStatus::from_wire(new_status)
        .ok_or_else(|| AppError::InvalidStatus(new_status.to_string()))?;

    // updated_at nunca anda para trás, mesmo com relógio atrasado
    let stamp = match record.updated_at {
        Some(previous) if previous > now => previous,
        _ => now,
    };

    record.status = status.into();
    record.updated_at = Some(stamp);
    Ok(status)
}

/// Subsequência (na ordem original) dos cadastros que estão em `status`.
pub fn filter_by_status(records: &[Registration], status: B2bStatus) -> Vec<&Registration> {
    records.iter().filter(|r| r.status.is(status)).collect()
}

/// Status desconhecidos entram só no total.
pub fn compute_aggregates(records: &[Registration]) -> DashboardStats {
    records
        .iter()
        .fold(DashboardStats::default(), |mut stats, record| {
            stats.total += 1;
            match record.status.known() {
                Some(status) if status.is_completed() => stats.completed += 1,
                Some(_) => stats.pending += 1,
                None => {}
            }
            stats
        })
}

pub fn relative_time(since: DateTime<Utc>, now: DateTime<Utc>) -> RelativeTime {
    let elapsed = now.signed_duration_since(since);
    let minutes = elapsed.num_minutes();

    if minutes < 1 {
        RelativeTime::Now
    } else if minutes < 60 {
        RelativeTime::Minutes(minutes)
    } else if elapsed.num_hours() < 24 {
        RelativeTime::Hours(elapsed.num_hours())
    } else {
        RelativeTime::Days(elapsed.num_days())
    }
}

/// As `limit` movimentações mais recentes, da mais nova para a mais antiga.
pub fn recent_activity(records: &[Registration], limit: usize) -> Vec<ActivityEntry> {
    recent_activity_at(records, limit, Utc::now())
}

pub fn recent_activity_at(
    records: &[Registration],
    limit: usize,
    now: DateTime<Utc>,
) -> Vec<ActivityEntry> {
    let mut ordered: Vec<&Registration> = records.iter().collect();
    // sort_by é estável: empates mantêm a ordem de chegada
    ordered.sort_by(|a, b| b.last_activity_at().cmp(&a.last_activity_at()));

    ordered
        .into_iter()
        .take(limit)
        .map(|record| ActivityEntry {
            id: record.id,
            action: record.status.action().to_string(),
            company: record.razao_social.clone(),
            time: relative_time(record.last_activity_at(), now),
        })
        .collect()
}

/// Filtro da visão em tabela: texto livre (razão social, contato ou
/// e-mail, sem diferenciar maiúsculas) e etapa exata opcional.
pub fn search<'a>(
    records: &'a [Registration],
    query: Option<&str>,
    status: Option<B2bStatus>,
) -> Vec<&'a Registration> {
    let needle = query
        .map(str::trim)
        .filter(|q| !q.is_empty())
        .map(str::to_lowercase);

    records
        .iter()
        .filter(|r| status.is_none_or(|s| r.status.is(s)))
        .filter(|r| match &needle {
            Some(needle) => [&r.razao_social, &r.contact_name, &r.email]
                .iter()
                .any(|field| field.to_lowercase().contains(needle.as_str())),
            None => true,
        })
        .collect()
}

/// Uma coluna por etapa, na ordem do funil.
pub fn build_board(records: &[Registration]) -> PipelineBoard {
    let columns = B2bStatus::ALL
        .into_iter()
        .map(|status| {
            let registrations: Vec<Registration> = filter_by_status(records, status)
                .into_iter()
                .cloned()
                .collect();
            PipelineColumn {
                status,
                label: status.label().to_string(),
                count: registrations.len(),
                registrations,
            }
        })
        .collect();

    PipelineBoard {
        columns,
        stats: compute_aggregates(records),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::status::RegistrationStatus;
    use chrono::Duration;

    fn at(minutes_ago: i64, now: DateTime<Utc>) -> DateTime<Utc> {
        now - Duration::minutes(minutes_ago)
    }

    #[test]
    fn rejects_unknown_status_without_touching_record() {
        let now = Utc::now();
        let mut record = Registration::sample("Loja A", B2bStatus::LeadSiteVista, now);
        let before = record.clone();

        let err = apply_status_transition(&mut record, "Not A Status").unwrap_err();

        assert!(matches!(err, AppError::InvalidStatus(raw) if raw == "Not A Status"));
        assert_eq!(record.status, before.status);
        assert_eq!(record.updated_at, None);
    }

    #[test]
    fn transition_stamps_updated_at() {
        let now = Utc::now();
        let mut record = Registration::sample("Loja A", B2bStatus::LeadSitePrazo, at(30, now));

        let status = apply_status_transition_at(&mut record, "Cadastro Recebido", now).unwrap();

        assert_eq!(status, B2bStatus::CadastroRecebido);
        assert!(record.status.is(B2bStatus::CadastroRecebido));
        assert_eq!(record.updated_at, Some(now));
        assert_eq!(record.created_at, at(30, now));
    }

    #[test]
    fn same_status_twice_keeps_updated_at_monotonic() {
        let now = Utc::now();
        let mut record = Registration::sample("Loja A", B2bStatus::AguardandoAnalise, at(10, now));

        apply_status_transition_at(&mut record, "Cadastro Pendente", now).unwrap();
        let first = record.updated_at;
        // relógio "voltou" um minuto
        apply_status_transition_at(&mut record, "Cadastro Pendente", at(1, now)).unwrap();

        assert!(record.status.is(B2bStatus::CadastroPendente));
        assert!(record.updated_at >= first);
    }

    #[test]
    fn transitions_can_move_backwards() {
        let now = Utc::now();
        let mut record = Registration::sample("Loja A", B2bStatus::OnboardingRealizado, now);
        apply_status_transition_at(&mut record, "Lead Site", now).unwrap();
        assert!(record.status.is(B2bStatus::LeadSite));
    }

    #[test]
    fn aggregates_partition_known_statuses() {
        let now = Utc::now();
        let records: Vec<Registration> = B2bStatus::ALL
            .into_iter()
            .map(|s| Registration::sample("Loja", s, now))
            .collect();

        let stats = compute_aggregates(&records);
        assert_eq!(stats, DashboardStats { total: 9, pending: 7, completed: 2 });
        assert_eq!(stats.pending + stats.completed, stats.total);
    }

    #[test]
    fn unknown_status_counts_only_in_total() {
        let now = Utc::now();
        let mut legacy = Registration::sample("Loja Antiga", B2bStatus::LeadSite, now);
        legacy.status = RegistrationStatus::Unknown("Arquivado".into());
        let records = vec![
            legacy,
            Registration::sample("Loja B", B2bStatus::CadastroRealizado, now),
        ];

        let stats = compute_aggregates(&records);
        assert_eq!(stats.total, 2);
        assert_eq!(stats.completed, 1);
        assert_eq!(stats.pending, 0);
        assert!(stats.pending + stats.completed <= stats.total);
    }

    #[test]
    fn aggregates_of_empty_collection_are_zero() {
        assert_eq!(compute_aggregates(&[]), DashboardStats::default());
    }

    #[test]
    fn filter_preserves_order() {
        let now = Utc::now();
        let records = vec![
            Registration::sample("A", B2bStatus::CadastroRecebido, now),
            Registration::sample("B", B2bStatus::LeadSite, now),
            Registration::sample("C", B2bStatus::CadastroRecebido, now),
        ];

        let names: Vec<&str> = filter_by_status(&records, B2bStatus::CadastroRecebido)
            .iter()
            .map(|r| r.razao_social.as_str())
            .collect();
        assert_eq!(names, ["A", "C"]);
    }

    #[test]
    fn relative_time_truncates() {
        let now = Utc::now();
        assert_eq!(relative_time(now - Duration::seconds(59), now), RelativeTime::Now);
        assert_eq!(relative_time(at(5, now), now), RelativeTime::Minutes(5));
        assert_eq!(relative_time(at(59, now), now), RelativeTime::Minutes(59));
        assert_eq!(relative_time(at(60, now), now), RelativeTime::Hours(1));
        assert_eq!(relative_time(at(23 * 60 + 59, now), now), RelativeTime::Hours(23));
        assert_eq!(relative_time(at(24 * 60, now), now), RelativeTime::Days(1));
        assert_eq!(relative_time(at(-5, now), now), RelativeTime::Now);
        assert_eq!(RelativeTime::Minutes(5).to_string(), "Há 5 min");
    }

    #[test]
    fn recent_activity_orders_by_recency_and_limits() {
        let now = Utc::now();
        let mut records: Vec<Registration> = (0..7)
            .map(|i| Registration::sample(&format!("Loja {i}"), B2bStatus::LeadSiteVista, at(100 - i, now)))
            .collect();
        // movimentado agora há pouco: sobe para o topo
        records[0].updated_at = Some(at(1, now));
        records[0].status = B2bStatus::CadastroRealizado.into();

        let feed = recent_activity_at(&records, 5, now);
        assert_eq!(feed.len(), 5);
        assert_eq!(feed[0].company, "Loja 0");
        assert_eq!(feed[0].action, "Cadastro aprovado");
        assert_eq!(feed[0].time, RelativeTime::Minutes(1));
        assert_eq!(feed[1].company, "Loja 6");
        assert_eq!(feed[1].action, "Novo cadastro B2B");

        assert_eq!(recent_activity_at(&records, 10, now).len(), 7);
        assert!(recent_activity_at(&records, 0, now).is_empty());
    }

    #[test]
    fn recent_activity_shows_raw_unknown_status() {
        let now = Utc::now();
        let mut legacy = Registration::sample("Loja Antiga", B2bStatus::LeadSite, now);
        legacy.status = RegistrationStatus::Unknown("Arquivado".into());

        let feed = recent_activity_at(&[legacy], 5, now);
        assert_eq!(feed[0].action, "Arquivado");
    }

    #[test]
    fn search_matches_company_contact_or_email() {
        let now = Utc::now();
        let mut other = Registration::sample("Boutique Sol", B2bStatus::CadastroRealizado, now);
        other.contact_name = "Carlos Lima".into();
        other.email = "carlos@sol.com.br".into();
        let records = vec![
            Registration::sample("Loja Exemplo LTDA", B2bStatus::LeadSiteVista, now),
            other,
        ];

        assert_eq!(search(&records, Some("exemplo"), None).len(), 1);
        assert_eq!(search(&records, Some("CARLOS"), None)[0].razao_social, "Boutique Sol");
        assert_eq!(search(&records, Some("@sol.com"), None).len(), 1);
        assert_eq!(search(&records, Some("  "), None).len(), 2);
        assert_eq!(search(&records, None, Some(B2bStatus::CadastroRealizado)).len(), 1);
        assert!(search(&records, Some("exemplo"), Some(B2bStatus::CadastroRealizado)).is_empty());
    }

    #[test]
    fn board_has_one_column_per_status_in_order() {
        let now = Utc::now();
        let records = vec![
            Registration::sample("A", B2bStatus::LeadSitePrazo, now),
            Registration::sample("B", B2bStatus::LeadSitePrazo, now),
            Registration::sample("C", B2bStatus::OnboardingRealizado, now),
        ];

        let board = build_board(&records);
        assert_eq!(board.columns.len(), 9);
        assert_eq!(board.columns[0].status, B2bStatus::LeadSite);
        assert_eq!(board.columns[2].label, "A Prazo");
        assert_eq!(board.columns[2].count, 2);
        assert_eq!(board.columns[8].count, 1);
        assert_eq!(board.stats, DashboardStats { total: 3, pending: 2, completed: 1 });
    }
}
