use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::Form;
use common::{NewAccount, ProfileUpdate, Role};
use myerrors::AppError;
use reqwest::Client;
use serde::Deserialize;
use std::sync::Arc;
use templates::Notice;
use tower_sessions::Session;
use uuid::Uuid;

use crate::pages;
use crate::pages::home::HomeView;
use crate::pages::make_path;
use crate::pages::settings::ConfigValues;
use crate::pages::users::NewUserValues;
use crate::relay::{self, RelayRequest};
use crate::store::MentorStore;
use crate::validation;

const SESSION_USER_KEY: &str = "user_id";
const HISTORY_SIZE: i64 = 10;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn MentorStore>,
    pub http: Client,
    pub base_path: String,
    pub admin_account: Option<NewAccount>,
}

fn internal_error(e: anyhow::Error) -> Response {
    log::error!("Request failed: {e:#}");
    (StatusCode::INTERNAL_SERVER_ERROR, "Erro interno").into_response()
}

async fn require_login(session: &Session, base: &str) -> Result<Uuid, Response> {
    match session.get::<String>(SESSION_USER_KEY).await {
        Ok(Some(id)) => {
            Uuid::parse_str(&id).map_err(|_| Redirect::to(&make_path(base, "/login")).into_response())
        }
        _ => Err(Redirect::to(&make_path(base, "/login")).into_response()),
    }
}

async fn require_admin(state: &AppState, session: &Session) -> Result<Uuid, Response> {
    let user_id = require_login(session, &state.base_path).await?;
    match state.store.get_role(user_id).await {
        Ok(Some(Role::Admin)) => Ok(user_id),
        Ok(_) => Err(AppError::Forbidden.into_response()),
        Err(e) => Err(internal_error(e)),
    }
}

#[derive(Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub senha: String,
}

pub async fn login_form(State(state): State<AppState>) -> Response {
    Html(pages::login::render(&state.base_path, "", None)).into_response()
}

pub async fn login(
    session: Session,
    State(state): State<AppState>,
    Form(form): Form<LoginForm>,
) -> Response {
    match state.store.authenticate(&form.email, &form.senha).await {
        Ok(Some(user_id)) => {
            if let Err(e) = session.cycle_id().await {
                log::warn!("Failed to rotate session id: {e}");
            }
            if let Err(e) = session
                .insert(SESSION_USER_KEY, user_id.to_string())
                .await
            {
                return internal_error(e.into());
            }
            log::info!("User {user_id} logged in");
            Redirect::to(&make_path(&state.base_path, "")).into_response()
        }
        Ok(None) => {
            let notice = Notice::Error(AppError::InvalidCredentials.to_string());
            (
                StatusCode::UNAUTHORIZED,
                Html(pages::login::render(
                    &state.base_path,
                    &form.email,
                    Some(&notice),
                )),
            )
                .into_response()
        }
        Err(e) => internal_error(e),
    }
}

pub async fn logout(session: Session, State(state): State<AppState>) -> Response {
    if let Err(e) = session.flush().await {
        log::warn!("Failed to flush session: {e}");
    }
    Redirect::to(&make_path(&state.base_path, "/login")).into_response()
}

enum Outcome {
    Idle,
    Answered(String),
    Failed(String),
}

async fn render_home(state: &AppState, user_id: Uuid, outcome: Outcome) -> Response {
    let today = relay::today();
    let loaded = async {
        let profile = state.store.get_profile(user_id).await?;
        let role = state.store.get_role(user_id).await?;
        let used = state.store.usage_count(user_id, today).await?;
        let history = state
            .store
            .recent_consultations(user_id, HISTORY_SIZE)
            .await?;
        anyhow::Ok((profile, role, used, history))
    }
    .await;

    let (profile, role, used_today, history) = match loaded {
        Ok((Some(profile), role, used, history)) => (profile, role, used, history),
        Ok((None, ..)) => return StatusCode::FORBIDDEN.into_response(),
        Err(e) => return internal_error(e),
    };

    let (answer, notice) = match outcome {
        Outcome::Idle => (None, None),
        Outcome::Answered(answer) => (Some(answer), None),
        Outcome::Failed(msg) => (None, Some(Notice::Error(msg))),
    };

    Html(pages::home::render(
        &state.base_path,
        HomeView {
            profile: &profile,
            is_admin: role == Some(Role::Admin),
            used_today,
            history: &history,
            answer: answer.as_deref(),
            notice: notice.as_ref(),
        },
    ))
    .into_response()
}

pub async fn home(session: Session, State(state): State<AppState>) -> Response {
    let user_id = match require_login(&session, &state.base_path).await {
        Ok(id) => id,
        Err(redirect) => return redirect,
    };
    render_home(&state, user_id, Outcome::Idle).await
}

async fn consult(state: &AppState, user_id: Uuid, question: String) -> Result<String, AppError> {
    let request = RelayRequest::new(question, None)?;
    let phone = state
        .store
        .get_profile(user_id)
        .await?
        .and_then(|p| p.phone);
    let request = request.with_phone(phone);
    relay::relay(
        state.store.as_ref(),
        &state.http,
        user_id,
        &request,
        relay::today(),
    )
    .await
}

#[derive(Deserialize)]
pub struct QuestionForm {
    #[serde(default)]
    pub pergunta: String,
}

pub async fn ask(
    session: Session,
    State(state): State<AppState>,
    Form(form): Form<QuestionForm>,
) -> Response {
    let user_id = match require_login(&session, &state.base_path).await {
        Ok(id) => id,
        Err(redirect) => return redirect,
    };

    let result = consult(&state, user_id, form.pergunta).await;

    let outcome = match result {
        Ok(answer) => Outcome::Answered(answer),
        Err(e) => {
            log::warn!("Consultation for {user_id} failed: {e}");
            Outcome::Failed(e.to_string())
        }
    };
    render_home(&state, user_id, outcome).await
}

async fn render_users(
    state: &AppState,
    values: &NewUserValues,
    notice: Option<&Notice>,
) -> Response {
    match state.store.list_profiles().await {
        Ok(profiles) => Html(pages::users::render_index(
            &state.base_path,
            &profiles,
            values,
            notice,
        ))
        .into_response(),
        Err(e) => internal_error(e),
    }
}

pub async fn users(session: Session, State(state): State<AppState>) -> Response {
    if let Err(denied) = require_admin(&state, &session).await {
        return denied;
    }
    render_users(&state, &NewUserValues::default(), None).await
}

#[derive(Deserialize)]
pub struct CreateUserForm {
    pub nome: String,
    pub email: String,
    pub usuario: String,
    pub senha: String,
    #[serde(default)]
    pub telefone: String,
    pub limite_diario: String,
}

fn new_client_account(form: &CreateUserForm) -> Result<NewAccount, String> {
    Ok(NewAccount {
        name: validation::required_text(&form.nome, "Nome")?,
        email: validation::required_text(&form.email, "E-mail")?,
        username: validation::required_text(&form.usuario, "Usuário")?,
        password: form.senha.clone(),
        phone: validation::optional_text(&form.telefone),
        daily_limit: validation::daily_limit(&form.limite_diario)?,
        role: Role::Client,
    })
}

pub async fn create_user(
    session: Session,
    State(state): State<AppState>,
    Form(form): Form<CreateUserForm>,
) -> Response {
    if let Err(denied) = require_admin(&state, &session).await {
        return denied;
    }

    let result = match new_client_account(&form) {
        Ok(account) => state
            .store
            .create_account(&account)
            .await
            .map_err(|e| e.to_string()),
        Err(msg) => Err(msg),
    };

    match result {
        Ok(user_id) => {
            log::info!("Created client account {user_id}");
            let notice = Notice::Success("Usuário criado com sucesso!".to_string());
            render_users(&state, &NewUserValues::default(), Some(&notice)).await
        }
        Err(msg) => {
            let values = NewUserValues {
                name: form.nome,
                email: form.email,
                username: form.usuario,
                phone: form.telefone,
                daily_limit: form.limite_diario,
            };
            render_users(&state, &values, Some(&Notice::Error(msg))).await
        }
    }
}

pub async fn user_edit(
    session: Session,
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Response {
    if let Err(denied) = require_admin(&state, &session).await {
        return denied;
    }
    let Ok(user_id) = Uuid::parse_str(&user_id) else {
        return StatusCode::NOT_FOUND.into_response();
    };
    match state.store.get_profile(user_id).await {
        Ok(Some(profile)) => {
            Html(pages::users::render_edit(&state.base_path, &profile, None)).into_response()
        }
        Ok(None) => StatusCode::NOT_FOUND.into_response(),
        Err(e) => internal_error(e),
    }
}

#[derive(Deserialize)]
pub struct UpdateUserForm {
    pub nome: String,
    #[serde(default)]
    pub telefone: String,
    pub limite_diario: String,
}

pub async fn update_user(
    session: Session,
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Form(form): Form<UpdateUserForm>,
) -> Response {
    if let Err(denied) = require_admin(&state, &session).await {
        return denied;
    }
    let Ok(user_id) = Uuid::parse_str(&user_id) else {
        return StatusCode::NOT_FOUND.into_response();
    };

    let update = validation::required_text(&form.nome, "Nome").and_then(|name| {
        Ok(ProfileUpdate {
            name,
            phone: validation::optional_text(&form.telefone),
            daily_limit: validation::daily_limit(&form.limite_diario)?,
        })
    });
    let notice = match update {
        Ok(update) => match state.store.update_profile(user_id, &update).await {
            Ok(()) => Notice::Success("Usuário atualizado com sucesso!".to_string()),
            Err(e) => Notice::Error(e.to_string()),
        },
        Err(msg) => Notice::Error(msg),
    };

    match state.store.get_profile(user_id).await {
        Ok(Some(profile)) => Html(pages::users::render_edit(
            &state.base_path,
            &profile,
            Some(&notice),
        ))
        .into_response(),
        Ok(None) => StatusCode::NOT_FOUND.into_response(),
        Err(e) => internal_error(e),
    }
}

pub async fn reports(session: Session, State(state): State<AppState>) -> Response {
    if let Err(denied) = require_admin(&state, &session).await {
        return denied;
    }
    let today = relay::today();
    match state.store.usage_report(today).await {
        Ok(rows) => Html(pages::reports::render(&state.base_path, today, &rows)).into_response(),
        Err(e) => internal_error(e),
    }
}

pub async fn config_form(session: Session, State(state): State<AppState>) -> Response {
    if let Err(denied) = require_admin(&state, &session).await {
        return denied;
    }
    match state.store.api_configuration().await {
        Ok(config) => {
            let values = config.as_ref().map(ConfigValues::from).unwrap_or_default();
            Html(pages::settings::render(
                &state.base_path,
                &values,
                config.is_some(),
                None,
            ))
            .into_response()
        }
        Err(e) => internal_error(e),
    }
}

#[derive(Deserialize)]
pub struct ConfigForm {
    pub url_base: String,
    #[serde(default)]
    pub chave_autenticacao: String,
    pub timeout_segundos: String,
}

pub async fn save_config(
    session: Session,
    State(state): State<AppState>,
    Form(form): Form<ConfigForm>,
) -> Response {
    if let Err(denied) = require_admin(&state, &session).await {
        return denied;
    }

    let values = ConfigValues {
        base_url: form.url_base,
        auth_token: form.chave_autenticacao,
        timeout_seconds: form.timeout_segundos,
    };
    let parsed = validation::api_configuration(
        &values.base_url,
        &values.auth_token,
        &values.timeout_seconds,
    );

    let (notice, saved) = match parsed {
        Ok(config) => match state.store.save_api_configuration(&config).await {
            Ok(()) => {
                log::info!(
                    "Mentor API configuration updated: url={} timeout={}s",
                    config.base_url,
                    config.timeout_seconds
                );
                (
                    Notice::Success("Configurações salvas com sucesso!".to_string()),
                    true,
                )
            }
            Err(e) => (Notice::Error(e.to_string()), false),
        },
        Err(msg) => (Notice::Error(msg), false),
    };

    let saved = saved || matches!(state.store.api_configuration().await, Ok(Some(_)));
    Html(pages::settings::render(
        &state.base_path,
        &values,
        saved,
        Some(&notice),
    ))
    .into_response()
}
