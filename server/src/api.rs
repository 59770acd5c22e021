use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::header::AUTHORIZATION;
use axum::http::HeaderMap;
use axum::Json;
use myerrors::AppError;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::handlers::AppState;
use crate::relay::{self, RelayRequest};

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

async fn authenticate(state: &AppState, headers: &HeaderMap) -> Result<Uuid, AppError> {
    let token = bearer_token(headers).ok_or(AppError::Auth)?;
    state
        .store
        .resolve_token(token)
        .await?
        .ok_or(AppError::Auth)
}

#[derive(Deserialize)]
pub struct ConsultaRequest {
    #[serde(default)]
    pub pergunta: String,
    pub telefone: Option<String>,
}

#[derive(Serialize)]
pub struct ConsultaResponse {
    pub resposta: String,
}

/// `POST /api/consulta-mentor`
pub async fn consulta_mentor(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Json<ConsultaRequest>, JsonRejection>,
) -> Result<Json<ConsultaResponse>, AppError> {
    let Json(body) = body.map_err(|e| AppError::Validation(e.body_text()))?;
    let request = RelayRequest::new(body.pergunta, body.telefone)?;
    let user_id = authenticate(&state, &headers).await?;

    let resposta = relay::relay(
        state.store.as_ref(),
        &state.http,
        user_id,
        &request,
        relay::today(),
    )
    .await
    .inspect_err(|e| log::warn!("Consultation for {user_id} failed: {e}"))?;

    Ok(Json(ConsultaResponse { resposta }))
}

#[derive(Serialize)]
pub struct CreateAdminResponse {
    pub success: bool,
    pub message: String,
    pub user_id: Uuid,
}

/// `POST /api/create-admin`
pub async fn create_admin(
    State(state): State<AppState>,
) -> Result<Json<CreateAdminResponse>, AppError> {
    let account = state
        .admin_account
        .as_ref()
        .ok_or_else(|| AppError::Validation("Provisionamento de admin desativado".to_string()))?;

    let user_id = state
        .store
        .create_account(account)
        .await
        .inspect_err(|e| log::error!("Failed to create admin account: {e:#}"))?;
    log::info!("Admin account {} created as {user_id}", account.email);

    Ok(Json(CreateAdminResponse {
        success: true,
        message: "Usuário admin criado com sucesso!".to_string(),
        user_id,
    }))
}

#[derive(Deserialize)]
pub struct TokenRequest {
    pub email: String,
    pub senha: String,
}

#[derive(Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub user_id: Uuid,
}

/// `POST /api/auth/token`
pub async fn issue_token(
    State(state): State<AppState>,
    body: Result<Json<TokenRequest>, JsonRejection>,
) -> Result<Json<TokenResponse>, AppError> {
    let Json(body) = body.map_err(|e| AppError::Validation(e.body_text()))?;
    let user_id = state
        .store
        .authenticate(&body.email, &body.senha)
        .await?
        .ok_or(AppError::InvalidCredentials)?;
    let access_token = state.store.issue_token(user_id).await?;
    Ok(Json(TokenResponse {
        access_token,
        user_id,
    }))
}
