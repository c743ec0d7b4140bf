use std::sync::Arc;

use axum::{
    Extension, Json,
    extract::State,
    http::{HeaderMap, HeaderValue, StatusCode, header::SET_COOKIE},
};
use serde::Deserialize;
use serde_json::{Value, json};
use standard_error::{Interpolate, StandardError, Status};
use validator::Validate;

use crate::{
    pkg::{
        internal::auth::{Session, User},
        server::{middlewares::authn::SESSION_COOKIE, state::AppState},
    },
    prelude::Result,
};

#[derive(Deserialize, Validate)]
pub struct SignupInput {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1))]
    pub name: String,
    #[validate(length(min = 8))]
    pub password: String,
}

#[derive(Deserialize)]
pub struct LoginInput {
    pub email: String,
    pub password: String,
}

pub async fn signup(
    State(state): State<AppState>,
    Json(input): Json<SignupInput>,
) -> Result<Json<User>> {
    input.validate().map_err(|e| {
        StandardError::new("ERR-AUTH-004")
            .code(StatusCode::UNPROCESSABLE_ENTITY)
            .interpolate_err(e.to_string())
    })?;
    let user = User::create(&state, input.email.trim(), input.name.trim(), &input.password).await?;
    tracing::info!("registered admin {}", &user.email);
    Ok(Json(user))
}

pub async fn login(
    State(state): State<AppState>,
    Json(input): Json<LoginInput>,
) -> Result<(HeaderMap, Json<User>)> {
    let (user, session) = User::login(&state, input.email.trim(), &input.password).await?;
    let mut headers = HeaderMap::new();
    headers.insert(
        SET_COOKIE,
        HeaderValue::from_str(&format!(
            "{}={}; Path=/; HttpOnly; SameSite=Strict",
            SESSION_COOKIE, session.token
        ))?,
    );
    Ok((headers, Json(user)))
}

pub async fn logout(
    State(state): State<AppState>,
    Extension(user): Extension<Arc<User>>,
) -> Result<(HeaderMap, Json<Value>)> {
    Session::expire_for_user(&state, &user.user_id).await?;
    tracing::info!("user {} logged out", &user.name);
    let mut headers = HeaderMap::new();
    headers.insert(
        SET_COOKIE,
        HeaderValue::from_str(&format!("{}=; Path=/; Max-Age=0", SESSION_COOKIE))?,
    );
    Ok((headers, Json(json!({"status": "logged out"}))))
}
