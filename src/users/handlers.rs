use axum::{
    extract::{FromRef, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::{error, info, instrument, warn};
use validator::Validate;

use crate::{
    auth::{
        extractors::AuthUser,
        jwt::JwtKeys,
        password::{hash_password, verify_password},
    },
    error::ApiError,
    extract::ApiJson,
    mailer::ActivationEmail,
    state::AppState,
    users::{
        dto::{
            ActivatePayload, ActivateResponse, LoginPayload, ProfileResponse, RegisterPayload,
            RegisterResponse, TokenResponse, UpdateProfilePayload,
        },
        repo::{StoreError, User},
    },
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/activate", post(activate))
        .route("/me", get(get_me).put(update_me))
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    ApiJson(mut payload): ApiJson<RegisterPayload>,
) -> Result<(StatusCode, Json<RegisterResponse>), ApiError> {
    payload.email = payload.email.trim().to_lowercase();

    if let Err(errs) = payload.validate() {
        warn!("invalid register payload");
        return Err(ApiError::from_validation(errs));
    }

    let hash = hash_password(&payload.password).map_err(|e| {
        error!(error = %e, "hash_password failed");
        ApiError::Internal(e)
    })?;

    let user = match User::create(&state.db, &payload, &hash).await {
        Ok(user) => user,
        Err(StoreError::AlreadyExists) => {
            warn!(email = %payload.email, "email already registered");
            return Err(ApiError::Conflict("user already exists".into()));
        }
        Err(e) => {
            error!(error = %e, "create user failed");
            return Err(ApiError::Internal(e.into()));
        }
    };

    // Delivery happens on the mailer worker; a full queue only logs.
    state.mailer.queue_activation(ActivationEmail {
        to: user.email.clone(),
        username: user.username.clone(),
        code: user.activation_code.clone(),
    });

    info!(user_id = user.id, email = %user.email, "user registered");
    Ok((StatusCode::CREATED, Json(RegisterResponse { id: user.id })))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    ApiJson(mut payload): ApiJson<LoginPayload>,
) -> Result<Json<TokenResponse>, ApiError> {
    payload.email = payload.email.trim().to_lowercase();

    if let Err(errs) = payload.validate() {
        warn!("invalid login payload");
        return Err(ApiError::from_validation(errs));
    }

    let user = match User::find_by_email(&state.db, &payload.email).await {
        Ok(user) => user,
        Err(StoreError::NotFound) => {
            warn!(email = %payload.email, "login unknown email");
            return Err(ApiError::NotFound("user not found".into()));
        }
        Err(e) => {
            error!(error = %e, "find_by_email failed");
            return Err(ApiError::Internal(e.into()));
        }
    };

    let ok = verify_password(&payload.password, &user.password_hash).map_err(|e| {
        error!(error = %e, user_id = user.id, "verify_password failed");
        ApiError::Internal(e)
    })?;
    if !ok {
        warn!(user_id = user.id, "login invalid password");
        return Err(ApiError::Authentication);
    }

    let keys = JwtKeys::from_ref(&state);
    let token = keys.sign(user.id).map_err(|e| {
        error!(error = %e, "jwt sign failed");
        ApiError::Internal(e)
    })?;

    info!(user_id = user.id, "user logged in");
    Ok(Json(TokenResponse { token }))
}

#[instrument(skip(state, payload))]
pub async fn activate(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<ActivatePayload>,
) -> Result<Json<ActivateResponse>, ApiError> {
    if let Err(errs) = payload.validate() {
        warn!("invalid activate payload");
        return Err(ApiError::from_validation(errs));
    }

    let mut user = match User::find_by_activation_code(&state.db, &payload.code).await {
        Ok(user) => user,
        Err(StoreError::NotFound) => {
            warn!("unknown activation code");
            return Err(ApiError::NotFound("invalid activation code".into()));
        }
        Err(e) => {
            error!(error = %e, "find_by_activation_code failed");
            return Err(ApiError::Internal(e.into()));
        }
    };

    user.is_active = true;
    user.update(&state.db).await.map_err(|e| {
        error!(error = %e, user_id = user.id, "activate update failed");
        ApiError::Internal(e.into())
    })?;

    info!(user_id = user.id, "user activated");
    Ok(Json(ActivateResponse { activated: true }))
}

#[instrument(skip(state))]
pub async fn get_me(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<ProfileResponse>, ApiError> {
    let user = match User::find_by_id(&state.db, user_id).await {
        Ok(user) => user,
        Err(StoreError::NotFound) => {
            warn!(user_id, "token for missing user");
            return Err(ApiError::NotFound("user not found".into()));
        }
        Err(e) => {
            error!(error = %e, user_id, "find_by_id failed");
            return Err(ApiError::Internal(e.into()));
        }
    };

    Ok(Json(ProfileResponse::from(user)))
}

#[instrument(skip(state, payload))]
pub async fn update_me(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    ApiJson(payload): ApiJson<UpdateProfilePayload>,
) -> Result<Json<ProfileResponse>, ApiError> {
    if let Err(errs) = payload.validate() {
        warn!(user_id, "invalid profile payload");
        return Err(ApiError::from_validation(errs));
    }

    let mut user = match User::find_by_id(&state.db, user_id).await {
        Ok(user) => user,
        Err(StoreError::NotFound) => {
            warn!(user_id, "token for missing user");
            return Err(ApiError::NotFound("user not found".into()));
        }
        Err(e) => {
            error!(error = %e, user_id, "find_by_id failed");
            return Err(ApiError::Internal(e.into()));
        }
    };

    user.username = payload.username;
    user.is_male = payload.is_male;
    user.age = payload.age;
    user.height = payload.height;
    user.weight = payload.weight;
    user.goal = payload.goal;
    user.weight_goal = payload.weight_goal;

    user.update(&state.db).await.map_err(|e| {
        error!(error = %e, user_id, "profile update failed");
        ApiError::Internal(e.into())
    })?;

    info!(user_id, "profile updated");
    Ok(Json(ProfileResponse::from(user)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_response_serialization() {
        let json = serde_json::to_string(&RegisterResponse { id: 1 }).unwrap();
        assert_eq!(json, r#"{"id":1}"#);
    }

    #[test]
    fn token_response_serialization() {
        let json = serde_json::to_string(&TokenResponse {
            token: "abc.def.ghi".into(),
        })
        .unwrap();
        assert_eq!(json, r#"{"token":"abc.def.ghi"}"#);
    }

    #[test]
    fn activate_response_serialization() {
        let json = serde_json::to_string(&ActivateResponse { activated: true }).unwrap();
        assert_eq!(json, r#"{"activated":true}"#);
    }
}
