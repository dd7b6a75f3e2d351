//! User sign-up endpoint.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::metrics::BusinessEvent;
use crate::models::{normalize_email, NewUser, SignupMethod, User, UserType};
use crate::state::AppState;
use crate::utils::http_helpers::HTTPError;

pub fn routes() -> Router<AppState> {
    Router::new().route("/api/users/signup", post(signup))
}

#[derive(Deserialize, Debug, Default)]
pub struct SignupRequest {
    pub email: Option<String>,
    #[serde(alias = "signupMethod")]
    pub signup_method: Option<String>,
}

#[derive(Serialize)]
struct SignupResponse {
    id: String,
    user_type: UserType,
    signup_method: SignupMethod,
}

async fn signup(
    State(state): State<AppState>,
    payload: Result<Json<SignupRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<SignupResponse>), HTTPError> {
    let Json(request) = payload.map_err(|_| HTTPError::bad_request("invalid signup payload"))?;

    let email = request
        .email
        .as_deref()
        .and_then(normalize_email)
        .ok_or_else(|| HTTPError::bad_request("a valid email is required"))?;

    let user = User::create(NewUser {
        user_type: UserType::classify(&email, &state.config.signup.enterprise_domains),
        signup_method: SignupMethod::parse(request.signup_method.as_deref()),
        email,
    });
    state.store.create_user(&user).await?;

    state.telemetry.record_event(BusinessEvent::Signup {
        method: user.signup_method,
        user_type: user.user_type,
    });
    info!(
        event_name = "user.signup",
        event_domain = "users",
        user_id = user.id.as_str(),
        signup_method = user.signup_method.as_str(),
        user_type = user.user_type.as_str(),
        "user signed up"
    );

    Ok((
        StatusCode::CREATED,
        Json(SignupResponse {
            id: user.id,
            user_type: user.user_type,
            signup_method: user.signup_method,
        }),
    ))
}
