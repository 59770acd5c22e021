use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),

    #[error("Usuário não autenticado")]
    Auth,

    #[error("E-mail ou senha inválidos")]
    InvalidCredentials,

    #[error("Acesso restrito a administradores")]
    Forbidden,

    #[error("Limite diário de consultas atingido")]
    QuotaExceeded,

    #[error(
        "Configuração da API não encontrada. Configure a URL da API no painel administrativo."
    )]
    ConfigurationMissing,

    #[error("Timeout ao aguardar resposta da API")]
    UpstreamTimeout,

    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            _ => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if let AppError::Store(ref e) = self {
            log::error!("Store error: {e:#}");
        }
        let body = Json(serde_json::json!({ "error": self.to_string() }));
        (self.status(), body).into_response()
    }
}
