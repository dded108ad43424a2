use axum::{
    Json, Router,
    extract::{Path, State, rejection::JsonRejection},
    routing::get,
};
use error_advice::exception::find_cause;
use error_advice::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::result::Result;
use tokio::sync::RwLock;

#[derive(Clone, Serialize)]
struct User {
    id: u64,
    name: String,
    email: String,
}

#[derive(Deserialize)]
struct NewUser {
    name: Option<String>,
    email: Option<String>,
}

#[derive(Clone, Default)]
struct AppState {
    users: Arc<RwLock<HashMap<u64, User>>>,
}

async fn list_users(State(state): State<AppState>) -> Json<Vec<User>> {
    Json(state.users.read().await.values().cloned().collect())
}

async fn find_user(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Json<User>, RaisedError> {
    state
        .users
        .read()
        .await
        .get(&id)
        .cloned()
        .map(Json)
        .ok_or_else(|| RaisedError::missing_value().with_message(format!("no user {}", id)))
}

async fn create_user(
    State(state): State<AppState>,
    payload: Result<Json<NewUser>, JsonRejection>,
) -> Result<Json<User>, RaisedError> {
    let Json(new_user) = payload?;

    let mut violations = Vec::new();
    let name = new_user.name.unwrap_or_default();
    let email = new_user.email.unwrap_or_default();
    if name.trim().is_empty() {
        violations.push(Violation::new("name", "name may not be empty"));
    }
    if !email.contains('@') {
        violations.push(Violation::new("email", "email must be a well-formed address"));
    }
    if !violations.is_empty() {
        return Err(RaisedError::constraint_violation(violations));
    }

    let mut users = state.users.write().await;
    if users.values().any(|user| user.email == email) {
        return Err(RaisedError::data_integrity(format!(
            "Unique property `email` = {} already exists",
            email
        )));
    }

    let user = User {
        id: users.len() as u64 + 1,
        name,
        email,
    };
    users.insert(user.id, user.clone());
    Ok(Json(user))
}

#[derive(Debug, thiserror::Error)]
enum ReportError {
    #[error("no report named {0}")]
    Unknown(String),
    #[error("report backend unavailable")]
    Unavailable,
}

fn render_report(name: &str) -> anyhow::Result<Json<User>> {
    let err = match name {
        "monthly" => ReportError::Unavailable,
        other => ReportError::Unknown(other.to_string()),
    };
    Err(anyhow::Error::new(err).context(format!("rendering report {}", name)))
}

async fn report(Path(name): Path<String>) -> Result<Json<User>, RaisedError> {
    render_report(&name).map_err(|err| {
        match find_cause::<ReportError>(&*err) {
            Some(ReportError::Unknown(_)) => {
                RaisedError::missing_value().with_message(format!("{:#}", err))
            }
            _ => err.into(),
        }
    })
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    tracing::info!("Starting advice server...");

    let config = AdviceConfig::from_env().expect("Invalid advice configuration");
    let filter = GlobalExceptionFilter::from_config(&config, Arc::new(TracingErrorLog));

    let router = Router::new()
        .route("/users", get(list_users).post(create_user))
        .route("/users/{id}", get(find_user))
        .route("/reports/{name}", get(report))
        .layer(ExceptionLayer::new(filter))
        .with_state(AppState::default());

    let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
    let port = std::env::var("PORT").unwrap_or_else(|_| "3000".to_string());
    let addr = format!("{}:{}", host, port);

    tracing::info!("Server running on http://127.0.0.1:{}", port);

    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();

    axum::serve(listener, router)
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            tracing::info!("Initiating graceful shutdown...");
        })
        .await
        .unwrap();

    tracing::info!("Server stopped");
}
