//! HTTP routes over the data-access layer.
//!
//! | Method | Path                  | Operation                          |
//! |--------|-----------------------|------------------------------------|
//! | GET    | `/`                   | [`UserStore::check_connectivity`]  |
//! | GET    | `/health`             | [`UserStore::check_connectivity`]  |
//! | GET    | `/users`              | [`UserStore::list_all`]            |
//! | GET    | `/user/id/{id}`       | [`UserStore::find_by_id`]          |
//! | GET    | `/user/email/{email}` | [`UserStore::find_by_email`]       |
//! | POST   | `/user`               | [`UserStore::insert`]              |
//!
//! Lookups answer with a JSON array of zero or one user. Failures answer with
//! a plain-text message and a status derived from the [`Error`] kind.

use axum::{
    Json, Router,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};

use crate::Error;
use crate::store::UserStore;
use crate::user::{NewUser, User, UserId};

/// Text returned by `GET /` when the store answers.
pub const PING_OK: &str = "Succeeded to connect to DB";

/// Text returned by `GET /` when the store does not answer.
pub const PING_FAILED: &str = "Failed to connect to DB";

/// Builds the router. Every handler shares `users`.
pub fn router(users: UserStore) -> Router {
    Router::new()
        .route("/", get(handle_ping))
        .route("/health", get(handle_health))
        .route("/users", get(handle_list_users))
        .route("/user/id/{id}", get(handle_user_by_id))
        .route("/user/email/{email}", get(handle_user_by_email))
        .route("/user", post(handle_create_user))
        .with_state(users)
}

/// Response body of `POST /user`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InsertResponse {
    pub id: UserId,
}

/// Response body of `GET /health`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub backend: String,
}

/// HTTP status for each kind of failure.
pub fn status_for(err: &Error) -> StatusCode {
    if err.is_client_error() {
        StatusCode::BAD_REQUEST
    } else if err.is_unavailable() {
        StatusCode::SERVICE_UNAVAILABLE
    } else if err.is_timeout() {
        StatusCode::GATEWAY_TIMEOUT
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = status_for(&self);
        if status.is_client_error() {
            tracing::warn!(error = %self, %status, "request rejected");
        } else {
            tracing::error!(error = %self, %status, "request failed");
        }
        (status, self.to_string()).into_response()
    }
}

/// Handler for GET / - store liveness probe
async fn handle_ping(State(users): State<UserStore>) -> Response {
    match users.check_connectivity().await {
        Ok(()) => (StatusCode::OK, PING_OK).into_response(),
        Err(e) => {
            tracing::error!(error = %e, "ping failed");
            (status_for(&e), PING_FAILED).into_response()
        }
    }
}

/// Handler for GET /health - JSON health check
async fn handle_health(State(users): State<UserStore>) -> (StatusCode, Json<HealthResponse>) {
    let backend = users.store().kind().to_string();
    match users.check_connectivity().await {
        Ok(()) => (
            StatusCode::OK,
            Json(HealthResponse {
                status: "healthy".to_string(),
                backend,
            }),
        ),
        Err(e) => (
            status_for(&e),
            Json(HealthResponse {
                status: "unhealthy".to_string(),
                backend,
            }),
        ),
    }
}

/// Handler for GET /users
async fn handle_list_users(State(users): State<UserStore>) -> Result<Json<Vec<User>>, Error> {
    Ok(Json(users.list_all().await?))
}

/// Handler for GET /user/id/{id}
async fn handle_user_by_id(
    State(users): State<UserStore>,
    Path(id): Path<String>,
) -> Result<Json<Vec<User>>, Error> {
    Ok(Json(users.find_by_id(&id).await?))
}

/// Handler for GET /user/email/{email}
async fn handle_user_by_email(
    State(users): State<UserStore>,
    Path(email): Path<String>,
) -> Result<Json<Vec<User>>, Error> {
    Ok(Json(users.find_by_email(&email).await?))
}

/// Handler for POST /user
async fn handle_create_user(
    State(users): State<UserStore>,
    body: Result<Json<NewUser>, JsonRejection>,
) -> Response {
    let Json(new_user) = match body {
        Ok(body) => body,
        Err(rejection) => {
            tracing::warn!(error = %rejection, "invalid create-user body");
            return (
                StatusCode::BAD_REQUEST,
                format!("error when unmarshalling json: {}", rejection.body_text()),
            )
                .into_response();
        }
    };

    match users.insert(new_user).await {
        Ok(id) => Json(InsertResponse { id }).into_response(),
        Err(e) => e.into_response(),
    }
}
