mod api;
mod config;
mod handlers;
mod pages;
mod relay;
mod store;
mod validation;

#[cfg(test)]
mod mock;

use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{HeaderName, Method};
use axum::routing::{get, post};
use axum::Router;
use clap::Parser;
use handlers::AppState;
use std::sync::Arc;
use store::PgMentorStore;
use tower_http::cors::{Any, CorsLayer};
use tower_sessions::{ExpiredDeletion, Expiry, SessionManagerLayer};

use crate::config::load_config;

#[derive(Parser)]
#[command(name = "sales-mentor")]
struct Args {
    #[arg(long, default_value = "config")]
    config_file: String,
}

fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::POST, Method::OPTIONS])
        .allow_headers([
            AUTHORIZATION,
            CONTENT_TYPE,
            HeaderName::from_static("x-client-info"),
            HeaderName::from_static("apikey"),
        ])
}

pub fn build_router(state: AppState) -> Router {
    let base = state.base_path.clone();

    let mut api_routes = Router::new()
        .route("/api/consulta-mentor", post(api::consulta_mentor))
        .route("/api/auth/token", post(api::issue_token));
    if state.admin_account.is_some() {
        api_routes = api_routes.route("/api/create-admin", post(api::create_admin));
    } else {
        log::info!("Admin password not set, /api/create-admin is disabled");
    }
    let api_routes = api_routes.layer(cors_layer());

    let routes = Router::new()
        .route("/", get(handlers::home))
        .route("/consultas", post(handlers::ask))
        .route("/login", get(handlers::login_form).post(handlers::login))
        .route("/logout", get(handlers::logout))
        .route(
            "/admin/users",
            get(handlers::users).post(handlers::create_user),
        )
        .route(
            "/admin/users/{id}",
            get(handlers::user_edit).post(handlers::update_user),
        )
        .route("/admin/reports", get(handlers::reports))
        .route(
            "/admin/config",
            get(handlers::config_form).post(handlers::save_config),
        )
        .merge(api_routes)
        .with_state(state);

    if base == "/" {
        routes
    } else {
        Router::new().nest(&base, routes)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("server=info"));

    let args = Args::parse();
    let app_config = load_config(&args.config_file).await?;

    let pool = db::init_pool(&app_config.database_url).await?;
    db::create_tables(&pool).await?;

    let session_store = tower_sessions_sqlx_store::PostgresStore::new(pool.clone());
    session_store.migrate().await?;

    let deletion_task = tokio::task::spawn(
        session_store
            .clone()
            .continuously_delete_expired(tokio::time::Duration::from_secs(3600)),
    );

    let session_layer = SessionManagerLayer::new(session_store)
        .with_expiry(Expiry::OnInactivity(time::Duration::seconds(86400)))
        .with_same_site(tower_sessions::cookie::SameSite::Lax);

    let state = AppState {
        store: Arc::new(PgMentorStore { pool }),
        http: reqwest::Client::new(),
        base_path: app_config.base_path.clone(),
        admin_account: app_config.admin.account(),
    };

    let app = build_router(state).layer(session_layer);

    let listener =
        tokio::net::TcpListener::bind(format!("{}:{}", app_config.host, app_config.port)).await?;
    log::info!(
        "Listening on http://{}:{}",
        app_config.host,
        app_config.port
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(deletion_task.abort_handle()))
        .await?;

    match deletion_task.await {
        Ok(result) => result?,
        Err(e) if e.is_cancelled() => {}
        Err(e) => return Err(e.into()),
    }

    Ok(())
}

async fn shutdown_signal(deletion_task_abort_handle: tokio::task::AbortHandle) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            log::error!("Failed to install Ctrl+C handler: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                log::error!("Failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    log::info!("Shutting down");
    deletion_task_abort_handle.abort();
}
