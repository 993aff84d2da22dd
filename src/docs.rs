// src/docs.rs

use utoipa::OpenApi;
use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use crate::handlers;
use crate::models;

#[derive(OpenApi)]
#[openapi(
    paths(
        // --- Auth ---
        handlers::auth::login,
        handlers::auth::logout,
        handlers::auth::get_me,

        // --- Cadastro B2B (público) ---
        handlers::registrations::submit_registration,

        // --- Pipeline ---
        handlers::pipeline::get_board,
        handlers::pipeline::list_registrations,
        handlers::pipeline::get_registration,
        handlers::pipeline::transition_status,
        handlers::pipeline::delete_registration,

        // --- Dashboard ---
        handlers::dashboard::get_stats,
        handlers::dashboard::get_activity,

        // --- Users ---
        handlers::users::list_users,
        handlers::users::create_user,
        handlers::users::update_user,
        handlers::users::delete_user,
    ),
    components(
        schemas(
            // --- Auth ---
            models::auth::UserRole,
            models::auth::User,
            models::auth::LoginUserPayload,
            models::auth::AuthResponse,
            models::auth::MeResponse,
            models::auth::CreateUserPayload,
            models::auth::UpdateUserPayload,

            // --- Cadastro B2B ---
            models::registration::RegistrationType,
            models::registration::AccountType,
            models::registration::IntegrationStatus,
            models::registration::BusinessPartner,
            models::registration::BankReference,
            models::registration::CommercialReference,
            models::registration::Registration,
            models::registration::SubmitRegistrationPayload,
            models::registration::TransitionStatusPayload,

            // --- Dashboard / Pipeline ---
            models::dashboard::DashboardStats,
            models::dashboard::ActivityEntry,
            models::dashboard::PipelineColumn,
            models::dashboard::PipelineBoard,
        )
    ),
    tags(
        (name = "Auth", description = "Login, logout e usuário atual"),
        (name = "Cadastro B2B", description = "Formulário público de cadastro de lojistas"),
        (name = "Pipeline", description = "Kanban e tabela de cadastros (admin e cadastro)"),
        (name = "Dashboard", description = "Indicadores e atividades recentes"),
        (name = "Users", description = "Gestão de usuários (somente admin)")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "api_jwt",
            SecurityScheme::Http(
                Http::new(HttpAuthScheme::Bearer)
            ),
        );
    }
}
