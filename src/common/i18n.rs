// src/common/i18n.rs

use std::collections::HashMap;

use crate::middleware::i18n::{Locale, DEFAULT_LANG};

// (código, português, inglês)
const MESSAGES: &[(&str, &str, &str)] = &[
    ("validation_failed", "Um ou mais campos são inválidos.", "One or more fields are invalid."),
    ("invalid_status", "Status de cadastro inválido.", "Invalid registration status."),
    (
        "collaborator_failure",
        "Não foi possível concluir a operação. Por favor, tente novamente.",
        "The operation could not be completed. Please try again.",
    ),
    ("not_found", "Registro não encontrado.", "Record not found."),
    ("email_already_exists", "Este e-mail já está em uso.", "This e-mail is already in use."),
    ("invalid_credentials", "E-mail ou senha inválidos.", "Invalid e-mail or password."),
    (
        "invalid_token",
        "Token de autenticação inválido ou ausente.",
        "Invalid or missing authentication token.",
    ),
    ("forbidden", "Você não tem permissão para realizar esta ação.", "You are not allowed to perform this action."),
    ("internal_error", "Ocorreu um erro inesperado.", "An unexpected error occurred."),
];

/// Catálogo de mensagens por idioma. Idiomas sem tradução caem no português.
#[derive(Debug, Clone)]
pub struct I18nStore {
    messages: HashMap<&'static str, HashMap<&'static str, &'static str>>,
}

impl Default for I18nStore {
    fn default() -> Self {
        let mut pt = HashMap::new();
        let mut en = HashMap::new();
        for (code, pt_msg, en_msg) in MESSAGES {
            pt.insert(*code, *pt_msg);
            en.insert(*code, *en_msg);
        }

        let mut messages = HashMap::new();
        messages.insert("pt", pt);
        messages.insert("en", en);
        Self { messages }
    }
}

impl I18nStore {
    pub fn translate(&self, locale: &Locale, code: &str) -> String {
        let lookup = |lang: &str| {
            self.messages
                .get(lang)
                .and_then(|catalog| catalog.get(code))
                .map(|msg| msg.to_string())
        };

        lookup(&locale.0)
            .or_else(|| lookup(DEFAULT_LANG))
            .unwrap_or_else(|| code.to_string())
    }
}
