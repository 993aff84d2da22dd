// src/services/registration_service.rs

use std::{collections::HashMap, sync::Arc};

use tokio::task::JoinHandle;

use crate::{
    common::{
        error::AppError,
        validators::{
            format_cnpj, format_cpf, format_phone, validate_cnpj, validate_cpf, validate_email,
            validate_phone, BILLING_RANGES, BRAZILIAN_STATES,
        },
    },
    db::RegistrationRepository,
    models::registration::{
        NewRegistration, Registration, RegistrationType, SubmitRegistrationPayload,
    },
    services::{
        integration::{self, IntegrationClient, IntegrationOutcome},
        session::SessionRegistry,
    },
};

#[derive(Clone)]
pub struct RegistrationService {
    repo: Arc<dyn RegistrationRepository>,
    integration: Arc<dyn IntegrationClient>,
    sessions: SessionRegistry,
}

impl RegistrationService {
    pub fn new(
        repo: Arc<dyn RegistrationRepository>,
        integration: Arc<dyn IntegrationClient>,
        sessions: SessionRegistry,
    ) -> Self {
        Self { repo, integration, sessions }
    }

    /// Cadastro enviado pelo formulário público. A integração roda solta;
    /// a resposta não espera por ela.
    pub async fn submit(&self, payload: SubmitRegistrationPayload) -> Result<Registration, AppError> {
        let (registration, _integration) = self.create(payload).await?;
        Ok(registration)
    }

    pub async fn create(
        &self,
        payload: SubmitRegistrationPayload,
    ) -> Result<(Registration, JoinHandle<Option<IntegrationOutcome>>), AppError> {
        validate_submission(&payload)?;
        let new = normalize(payload);

        let registration = self.repo.create_registration(&new).await.map_err(|e| {
            tracing::error!("🔥 Falha ao gravar cadastro de '{}': {}", new.razao_social, e);
            AppError::CollaboratorFailure("create_registration".into())
        })?;

        self.sessions.publish(&registration).await;
        let handle = integration::dispatch(self.integration.clone(), registration.id);

        Ok((registration, handle))
    }
}

fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

fn blank_option(value: &Option<String>) -> bool {
    value.as_deref().is_none_or(is_blank)
}

/// Valida o formulário inteiro e devolve todos os erros de uma vez,
/// como `campo -> código`.
pub fn validate_submission(payload: &SubmitRegistrationPayload) -> Result<(), AppError> {
    let mut errors: HashMap<String, String> = HashMap::new();
    let mut fail = |field: &str, code: &str| {
        errors.entry(field.to_string()).or_insert_with(|| code.to_string());
    };

    for (field, value) in [
        ("brandOfInterest", &payload.brand_of_interest),
        ("razaoSocial", &payload.razao_social),
        ("contactName", &payload.contact_name),
    ] {
        if is_blank(value) {
            fail(field, "required");
        }
    }

    if is_blank(&payload.cnpj) {
        fail("cnpj", "required");
    } else if !validate_cnpj(&payload.cnpj) {
        fail("cnpj", "invalid_cnpj");
    }

    if is_blank(&payload.email) {
        fail("email", "required");
    } else if !validate_email(payload.email.trim()) {
        fail("email", "invalid_email");
    }

    if is_blank(&payload.whatsapp_phone) {
        fail("whatsappPhone", "required");
    } else if !validate_phone(&payload.whatsapp_phone) {
        fail("whatsappPhone", "invalid_phone");
    }

    if let Some(phone) = payload.store_phone.as_deref().filter(|p| !is_blank(p)) {
        if !validate_phone(phone) {
            fail("storePhone", "invalid_phone");
        }
    }

    if blank_option(&payload.cidade) {
        fail("cidade", "required");
    }

    match payload.uf.as_deref().map(str::trim) {
        None | Some("") => fail("uf", "required"),
        Some(uf) if !BRAZILIAN_STATES.contains(&uf.to_uppercase().as_str()) => {
            fail("uf", "invalid_uf")
        }
        Some(_) => {}
    }

    match payload.billing_range.as_deref().map(str::trim) {
        None | Some("") => fail("billingRange", "required"),
        Some(range) if !BILLING_RANGES.contains(&range) => fail("billingRange", "invalid_billing_range"),
        Some(_) => {}
    }

    if !payload.lgpd_accepted {
        fail("lgpdAccepted", "lgpd_required");
    }

    if payload.registration_type == RegistrationType::Prazo {
        if payload.business_partners.is_empty() {
            fail("businessPartners", "required");
        }
        for (i, partner) in payload.business_partners.iter().enumerate() {
            if is_blank(&partner.name) {
                fail(&format!("businessPartners[{i}].name"), "required");
            }
            if is_blank(&partner.cpf) {
                fail(&format!("businessPartners[{i}].cpf"), "required");
            } else if !validate_cpf(&partner.cpf) {
                fail(&format!("businessPartners[{i}].cpf"), "invalid_cpf");
            }
        }

        if payload.bank_references.is_empty() {
            fail("bankReferences", "required");
        }
        for (i, bank) in payload.bank_references.iter().enumerate() {
            for (field, value) in [
                ("bankName", &bank.bank_name),
                ("agency", &bank.agency),
                ("account", &bank.account),
            ] {
                if is_blank(value) {
                    fail(&format!("bankReferences[{i}].{field}"), "required");
                }
            }
        }
    }

    for (i, reference) in payload.commercial_references.iter().enumerate() {
        if is_blank(&reference.company_name) {
            fail(&format!("commercialReferences[{i}].companyName"), "required");
        }
        if let Some(cnpj) = reference.cnpj.as_deref().filter(|c| !is_blank(c)) {
            if !validate_cnpj(cnpj) {
                fail(&format!("commercialReferences[{i}].cnpj"), "invalid_cnpj");
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(AppError::FieldValidation(errors))
    }
}

fn clean(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Padroniza o que vai para o banco: documentos e telefones formatados,
/// e-mail em minúsculas, opcionais vazios como `None`.
pub fn normalize(payload: SubmitRegistrationPayload) -> NewRegistration {
    let is_prazo = payload.registration_type == RegistrationType::Prazo;

    // À vista não leva sócios nem referências bancárias
    let (business_partners, bank_references) = if is_prazo {
        let partners = payload
            .business_partners
            .into_iter()
            .map(|mut p| {
                p.name = p.name.trim().to_string();
                p.cpf = format_cpf(&p.cpf);
                p.rg = clean(p.rg);
                p.phone = clean(p.phone).map(|v| format_phone(&v));
                p.email = clean(p.email).map(|v| v.to_lowercase());
                p
            })
            .collect();
        let banks = payload
            .bank_references
            .into_iter()
            .map(|mut b| {
                b.bank_name = b.bank_name.trim().to_string();
                b.agency = b.agency.trim().to_string();
                b.account = b.account.trim().to_string();
                b
            })
            .collect();
        (partners, banks)
    } else {
        (Vec::new(), Vec::new())
    };

    let commercial_references = payload
        .commercial_references
        .into_iter()
        .map(|mut r| {
            r.company_name = r.company_name.trim().to_string();
            r.cnpj = clean(r.cnpj).map(|v| format_cnpj(&v));
            r.contact_name = clean(r.contact_name);
            r.phone = clean(r.phone).map(|v| format_phone(&v));
            r.email = clean(r.email).map(|v| v.to_lowercase());
            r
        })
        .collect();

    NewRegistration {
        registration_type: payload.registration_type,
        status: payload.registration_type.initial_status(),
        brand_of_interest: payload.brand_of_interest.trim().to_string(),
        cnpj: format_cnpj(&payload.cnpj),
        razao_social: payload.razao_social.trim().to_string(),
        nome_fantasia: clean(payload.nome_fantasia),
        inscricao_estadual: clean(payload.inscricao_estadual),
        contact_name: payload.contact_name.trim().to_string(),
        email: payload.email.trim().to_lowercase(),
        whatsapp_phone: format_phone(&payload.whatsapp_phone),
        store_phone: clean(payload.store_phone).map(|v| format_phone(&v)),
        cidade: clean(payload.cidade),
        uf: clean(payload.uf).map(|v| v.to_uppercase()),
        billing_range: clean(payload.billing_range),
        instagram: clean(payload.instagram),
        website: clean(payload.website),
        notes: clean(payload.notes),
        lgpd_accepted: payload.lgpd_accepted,
        business_partners,
        bank_references,
        commercial_references,
    }
}
