//! Quota-gated relay of a user question to the external mentor API.

use chrono::NaiveDate;
use common::ApiConfiguration;
use myerrors::AppError;
use reqwest::header::AUTHORIZATION;
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use uuid::Uuid;

use crate::store::MentorStore;

/// Answer returned when the mentor API fails for any reason other than a timeout.
pub const FALLBACK_ANSWER: &str = "Desculpe, houve um problema ao processar sua consulta. Por favor, tente novamente mais tarde ou entre em contato com o suporte.";

/// Answer used when the mentor API succeeds but carries no text.
pub const EMPTY_ANSWER: &str = "Resposta recebida da API";

/// A question that passed validation. Building one never touches the store.
#[derive(Debug, Clone)]
pub struct RelayRequest {
    question: String,
    phone: Option<String>,
}

impl RelayRequest {
    pub fn new(question: String, phone: Option<String>) -> Result<Self, AppError> {
        if question.trim().is_empty() {
            return Err(AppError::Validation("Pergunta é obrigatória".to_string()));
        }
        Ok(Self { question, phone })
    }

    /// Sets the phone forwarded with the question.
    pub fn with_phone(mut self, phone: Option<String>) -> Self {
        self.phone = phone;
        self
    }
}

#[derive(Debug, Serialize)]
struct MentorPayload<'a> {
    id_usuario: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    telefone_usuario: Option<&'a str>,
    mensagem: &'a str,
}

#[derive(Debug)]
enum UpstreamError {
    Timeout,
    Failed(String),
}

impl From<reqwest::Error> for UpstreamError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            UpstreamError::Timeout
        } else {
            UpstreamError::Failed(e.to_string())
        }
    }
}

pub fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

pub async fn relay(
    store: &dyn MentorStore,
    http: &Client,
    user_id: Uuid,
    request: &RelayRequest,
    today: NaiveDate,
) -> Result<String, AppError> {
    let limit = store
        .get_profile(user_id)
        .await?
        .map(|p| p.effective_limit())
        .unwrap_or(common::DEFAULT_DAILY_LIMIT);

    if store.reserve_usage(user_id, today, limit).await?.is_none() {
        return Err(AppError::QuotaExceeded);
    }

    let config = match store.api_configuration().await {
        Ok(Some(config)) => config,
        Ok(None) => {
            release(store, user_id, today).await;
            return Err(AppError::ConfigurationMissing);
        }
        Err(e) => {
            release(store, user_id, today).await;
            return Err(e.into());
        }
    };

    let payload = MentorPayload {
        id_usuario: user_id,
        telefone_usuario: request.phone.as_deref(),
        mensagem: &request.question,
    };

    let answer = match call_mentor(http, &config, &payload).await {
        Ok(answer) => answer,
        Err(UpstreamError::Timeout) => {
            log::error!(
                "Mentor API did not answer within {}s",
                config.timeout_seconds
            );
            release(store, user_id, today).await;
            return Err(AppError::UpstreamTimeout);
        }
        Err(UpstreamError::Failed(reason)) => {
            log::error!("Mentor API call failed, using fallback answer: {reason}");
            FALLBACK_ANSWER.to_string()
        }
    };

    if let Err(e) = store
        .record_consultation(user_id, &request.question, &answer)
        .await
    {
        log::error!("Failed to save consultation for {user_id}: {e:#}");
    }

    Ok(answer)
}

async fn release(store: &dyn MentorStore, user_id: Uuid, today: NaiveDate) {
    if let Err(e) = store.release_usage(user_id, today).await {
        log::error!("Failed to release usage unit for {user_id}: {e:#}");
    }
}

async fn call_mentor(
    http: &Client,
    config: &ApiConfiguration,
    payload: &MentorPayload<'_>,
) -> Result<String, UpstreamError> {
    let auth = config.auth_token.as_deref().filter(|t| !t.is_empty());
    log::info!(
        "Sending question to mentor API: url={} has_auth={} auth_length={}",
        config.base_url,
        auth.is_some(),
        auth.map(str::len).unwrap_or(0)
    );

    let timeout = Duration::from_secs(config.timeout_seconds.max(1) as u64);
    let mut builder = http.post(&config.base_url).timeout(timeout).json(payload);
    if let Some(token) = auth {
        builder = builder.header(AUTHORIZATION, token);
    }

    let response = builder.send().await?;
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await?;
        log::error!("Mentor API returned status {status}: {body}");
        return Err(UpstreamError::Failed(format!(
            "API retornou erro: {}",
            status.as_u16()
        )));
    }

    let body: Value = response.json().await?;
    log::debug!("Mentor API response: {body}");
    Ok(extract_answer(&body))
}

fn extract_answer(body: &Value) -> String {
    ["resposta", "message"]
        .iter()
        .filter_map(|key| body.get(key).and_then(Value::as_str))
        .find(|s| !s.is_empty())
        .unwrap_or(EMPTY_ANSWER)
        .to_string()
}
