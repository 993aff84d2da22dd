//src/main.rs

use anyhow::Context;
use axum::{
    middleware as axum_middleware,
    routing::{get, patch, post},
    Json, Router,
};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;
use utoipa::OpenApi;

mod common;
mod config;
mod db;
mod docs;
mod handlers;
mod middleware;
mod models;
mod services;

// Importações principais
use crate::config::{AppState, Config};
use crate::docs::ApiDoc;
use crate::middleware::auth::auth_guard;

// Monta todas as rotas; separado do main para os testes de rota
pub fn app(app_state: AppState) -> Router {
    // Define as rotas de autenticação (login é público)
    let auth_routes = Router::new()
        .route("/logout", post(handlers::auth::logout))
        .route("/me", get(handlers::auth::get_me))
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth_guard,
        ))
        .route("/login", post(handlers::auth::login));

    // Kanban e tabela (o papel é conferido em cada handler)
    let pipeline_routes = Router::new()
        .route("/board", get(handlers::pipeline::get_board))
        .route("/registrations", get(handlers::pipeline::list_registrations))
        .route("/registrations/{id}"
               ,get(handlers::pipeline::get_registration)
               .delete(handlers::pipeline::delete_registration)
        )
        .route("/registrations/{id}/status", patch(handlers::pipeline::transition_status))
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth_guard,
        ));

    let dashboard_routes = Router::new()
        .route("/stats", get(handlers::dashboard::get_stats))
        .route("/activity", get(handlers::dashboard::get_activity))
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth_guard,
        ));

    let user_routes = Router::new()
        .route("/"
               ,get(handlers::users::list_users)
               .post(handlers::users::create_user)
        )
        .route("/{id}"
               ,patch(handlers::users::update_user)
               .delete(handlers::users::delete_user)
        )
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth_guard,
        ));

    // Combina tudo no router principal
    Router::new()
        .route("/api/health", get(|| async { "OK" }))
        .route("/api-docs/openapi.json", get(|| async { Json(ApiDoc::openapi()) }))
        .route("/api/registrations", post(handlers::registrations::submit_registration))
        .nest("/api/auth", auth_routes)
        .nest("/api/pipeline", pipeline_routes)
        .nest("/api/dashboard", dashboard_routes)
        .nest("/api/users", user_routes)
        .with_state(app_state)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // RUST_LOG controla o nível; padrão "info"
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .compact()
        .init();

    // Se a configuração falhar, a aplicação não deve iniciar.
    let config = Config::from_env()?;
    let db_pool = config.connect().await?;

    // Faz o app rodar as migrações do SQLx na inicialização
    sqlx::migrate!()
        .run(&db_pool)
        .await
        .context("Falha ao rodar as migrações do banco de dados.")?;
    tracing::info!("✅ Migrações do banco de dados executadas com sucesso!");

    let app_state = AppState::from_pool(&config, db_pool);

    if let Some(admin) = &config.admin {
        app_state.auth_service.ensure_admin(admin).await?;
    }

    // Inicia o servidor
    let listener = TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("Falha ao iniciar o listener TCP em {}", config.bind_addr))?;
    tracing::info!("🚀 Servidor escutando em {}", listener.local_addr()?);

    axum::serve(listener, app(app_state))
        .await
        .context("Erro no servidor Axum")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::{to_bytes, Body},
        http::{header, Request, StatusCode},
        response::Response,
    };
    use chrono::{Duration, Utc};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::*;
    use crate::{
        db::memory::{MemoryRegistrationRepository, MemoryUserRepository},
        models::{
            auth::{Claims, UserRole},
            registration::Registration,
            status::B2bStatus,
        },
        services::{
            auth::tests::user_with_role, integration::testing::RecordingIntegration,
            session::SessionRegistry,
        },
    };

    const SECRET: &str = "segredo-de-teste";

    struct TestApp {
        router: Router,
        registrations: Arc<MemoryRegistrationRepository>,
        sessions: SessionRegistry,
    }

    fn test_app(records: Vec<Registration>) -> TestApp {
        let users = Arc::new(MemoryUserRepository::with_users(vec![
            user_with_role("admin@empresa.com.br", UserRole::Admin),
            user_with_role("cadastro@empresa.com.br", UserRole::Cadastro),
            user_with_role("rep@empresa.com.br", UserRole::Representante),
        ]));
        let registrations = Arc::new(MemoryRegistrationRepository::with_records(records));
        let state = AppState::new(
            users,
            registrations.clone(),
            Arc::new(RecordingIntegration::default()),
            SECRET.into(),
            Duration::hours(1),
        );
        let sessions = state.sessions.clone();
        TestApp { router: app(state), registrations, sessions }
    }

    async fn send(app: &TestApp, request: Request<Body>) -> Response {
        app.router.clone().oneshot(request).await.unwrap()
    }

    async fn body_json(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn json_request(method: &str, uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    fn get(uri: &str, token: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        builder.body(Body::empty()).unwrap()
    }

    async fn login(app: &TestApp, email: &str) -> String {
        let response = send(
            app,
            json_request(
                "POST",
                "/api/auth/login",
                None,
                json!({ "email": email, "password": "senha123" }),
            ),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        body_json(response).await["token"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn health_and_openapi_are_public() {
        let app = test_app(Vec::new());
        assert_eq!(send(&app, get("/api/health", None)).await.status(), StatusCode::OK);

        let response = send(&app, get("/api-docs/openapi.json", None)).await;
        assert_eq!(response.status(), StatusCode::OK);
        let doc = body_json(response).await;
        assert!(doc["paths"]["/api/pipeline/board"].is_object());
    }

    #[tokio::test]
    async fn protected_routes_need_a_token() {
        let app = test_app(Vec::new());

        let response = send(&app, get("/api/pipeline/board", None)).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            body_json(response).await["error"],
            "Token de autenticação inválido ou ausente."
        );

        let response = send(&app, get("/api/dashboard/stats", Some("lixo"))).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn roles_decide_what_each_user_reaches() {
        let app = test_app(Vec::new());
        let cadastro = login(&app, "cadastro@empresa.com.br").await;
        let rep = login(&app, "rep@empresa.com.br").await;

        assert_eq!(send(&app, get("/api/pipeline/board", Some(&cadastro))).await.status(), StatusCode::OK);
        assert_eq!(send(&app, get("/api/users", Some(&cadastro))).await.status(), StatusCode::FORBIDDEN);

        assert_eq!(send(&app, get("/api/pipeline/board", Some(&rep))).await.status(), StatusCode::FORBIDDEN);
        assert_eq!(send(&app, get("/api/dashboard/stats", Some(&rep))).await.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn me_reports_access_flags() {
        let app = test_app(Vec::new());
        let token = login(&app, "cadastro@empresa.com.br").await;

        let me = body_json(send(&app, get("/api/auth/me", Some(&token))).await).await;
        assert_eq!(me["email"], "cadastro@empresa.com.br");
        assert_eq!(me["role"], "cadastro");
        assert_eq!(me["isAdmin"], false);
        assert_eq!(me["canAccessCrm"], true);
        assert!(me.get("passwordHash").is_none());
    }

    #[tokio::test]
    async fn public_submission_then_operator_moves_it() {
        let app = test_app(Vec::new());
        let admin = login(&app, "admin@empresa.com.br").await;

        let response = send(
            &app,
            json_request(
                "POST",
                "/api/registrations",
                None,
                json!({
                    "registrationType": "vista",
                    "brandOfInterest": "Mar Quente",
                    "cnpj": "11222333000181",
                    "razaoSocial": "Loja Exemplo LTDA",
                    "contactName": "Maria Souza",
                    "email": "maria@lojaexemplo.com.br",
                    "whatsappPhone": "11987654321",
                    "cidade": "São Paulo",
                    "uf": "SP",
                    "billingRange": "Até R$ 50.000",
                    "lgpdAccepted": true
                }),
            ),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CREATED);
        let created = body_json(response).await;
        assert_eq!(created["status"], "Lead Site - À Vista");
        assert_eq!(created["cnpj"], "11.222.333/0001-81");
        assert!(created["updatedAt"].is_null());
        let id = created["id"].as_str().unwrap().to_string();

        let uri = format!("/api/pipeline/registrations/{id}/status");
        let response = send(
            &app,
            json_request("PATCH", &uri, Some(&admin), json!({ "status": "Not A Status" })),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = send(
            &app,
            json_request("PATCH", &uri, Some(&admin), json!({ "status": "Cadastro Realizado" })),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["status"], "Cadastro Realizado");

        let board = body_json(send(&app, get("/api/pipeline/board", Some(&admin))).await).await;
        assert_eq!(board["stats"], json!({ "total": 1, "pending": 0, "completed": 1 }));
        assert_eq!(board["columns"][7]["count"], 1);
    }

    #[tokio::test]
    async fn invalid_submission_lists_field_errors() {
        let app = test_app(Vec::new());

        let response = send(
            &app,
            json_request(
                "POST",
                "/api/registrations",
                None,
                json!({
                    "registrationType": "prazo",
                    "brandOfInterest": "Mar Quente",
                    "cnpj": "11111111111111",
                    "razaoSocial": "Loja Exemplo LTDA",
                    "contactName": "Maria Souza",
                    "email": "maria@lojaexemplo.com.br",
                    "whatsappPhone": "11987654321",
                    "cidade": "São Paulo",
                    "uf": "SP",
                    "billingRange": "Até R$ 50.000",
                    "lgpdAccepted": true
                }),
            ),
        )
        .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["details"]["cnpj"], "invalid_cnpj");
        assert_eq!(body["details"]["businessPartners"], "required");
        assert_eq!(body["details"]["bankReferences"], "required");
    }

    #[tokio::test]
    async fn table_view_filters_and_rejects_unknown_status() {
        let now = Utc::now();
        let app = test_app(vec![
            Registration::sample("Loja Exemplo LTDA", B2bStatus::CadastroRecebido, now),
            Registration::sample("Boutique Sol", B2bStatus::LeadSite, now),
        ]);
        let token = login(&app, "cadastro@empresa.com.br").await;

        let list = body_json(
            send(&app, get("/api/pipeline/registrations?q=boutique", Some(&token))).await,
        )
        .await;
        assert_eq!(list.as_array().unwrap().len(), 1);

        let list = body_json(
            send(&app, get("/api/pipeline/registrations?status=all", Some(&token))).await,
        )
        .await;
        assert_eq!(list.as_array().unwrap().len(), 2);

        let response = send(&app, get("/api/pipeline/registrations?status=Aprovado", Some(&token))).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn repository_outage_becomes_retryable_error() {
        let record = Registration::sample("Loja A", B2bStatus::AguardandoAnalise, Utc::now());
        let id = record.id;
        let app = test_app(vec![record]);
        let token = login(&app, "admin@empresa.com.br").await;

        app.registrations.fail_with_errors(true);
        let response = send(
            &app,
            json_request(
                "PATCH",
                &format!("/api/pipeline/registrations/{id}/status"),
                Some(&token),
                json!({ "status": "Cadastro Recebido" }),
            ),
        )
        .await;

        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(
            body_json(response).await["error"],
            "Não foi possível concluir a operação. Por favor, tente novamente."
        );
        assert!(app.registrations.stored()[0].status.is(B2bStatus::AguardandoAnalise));
    }

    #[tokio::test]
    async fn logout_drops_the_session_store() {
        let app = test_app(Vec::new());
        let token = login(&app, "admin@empresa.com.br").await;

        let sid = jsonwebtoken::decode::<Claims>(
            &token,
            &jsonwebtoken::DecodingKey::from_secret(SECRET.as_ref()),
            &jsonwebtoken::Validation::default(),
        )
        .unwrap()
        .claims
        .sid;
        assert!(app.sessions.is_open(sid).await);

        let response = send(&app, json_request("POST", "/api/auth/logout", Some(&token), json!({}))).await;
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert!(!app.sessions.is_open(sid).await);

        // O mesmo token não abre outra sessão
        for uri in ["/api/pipeline/board", "/api/dashboard/activity", "/api/auth/me"] {
            assert_eq!(send(&app, get(uri, Some(&token))).await.status(), StatusCode::UNAUTHORIZED);
        }
        assert!(!app.sessions.is_open(sid).await);
    }

    #[tokio::test]
    async fn admin_manages_users() {
        let app = test_app(Vec::new());
        let admin = login(&app, "admin@empresa.com.br").await;

        let response = send(
            &app,
            json_request(
                "POST",
                "/api/users",
                Some(&admin),
                json!({
                    "fullName": "Bruno Costa",
                    "cpf": "52998224725",
                    "email": "bruno@empresa.com.br",
                    "password": "senha123",
                    "role": "representante"
                }),
            ),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CREATED);
        let created = body_json(response).await;
        assert_eq!(created["cpf"], "529.982.247-25");

        let response = send(
            &app,
            json_request(
                "POST",
                "/api/users",
                Some(&admin),
                json!({
                    "fullName": "Outro",
                    "cpf": "52998224725",
                    "email": "bruno@empresa.com.br",
                    "password": "senha123",
                    "role": "user"
                }),
            ),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CONFLICT);

        let users = body_json(send(&app, get("/api/users", Some(&admin))).await).await;
        assert_eq!(users.as_array().unwrap().len(), 4);
    }
}
