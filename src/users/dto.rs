use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use validator::{Validate, ValidationError};

use crate::users::repo::User;

pub const GOALS: [&str; 3] = ["lose", "maintain", "gain"];

fn required_str(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("required"));
    }
    Ok(())
}

// A bare `false` counts as missing, so the flag must be sent as `true`.
fn required_flag(value: &bool) -> Result<(), ValidationError> {
    if !value {
        return Err(ValidationError::new("required"));
    }
    Ok(())
}

fn non_zero_int(value: i32) -> Result<(), ValidationError> {
    if value == 0 {
        return Err(ValidationError::new("required"));
    }
    Ok(())
}

fn allowed_goal(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("required"));
    }
    if !GOALS.contains(&value) {
        return Err(ValidationError::new("oneof"));
    }
    Ok(())
}

/// Registration body. Fields default to their zero value on decode so that a
/// missing field is reported as a required-field violation, not a decode error.
#[derive(Debug, Default, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase", default)]
pub struct RegisterPayload {
    #[validate(custom(function = "required_str"), email)]
    pub email: String,
    #[validate(custom(function = "required_str"))]
    pub username: String,
    #[validate(custom(function = "required_str"), length(min = 3, max = 30))]
    pub password: String,
    #[validate(custom(function = "required_flag"))]
    pub is_male: bool,
    #[validate(custom(function = "non_zero_int"))]
    pub age: i32,
    #[validate(custom(function = "non_zero_int"))]
    pub height: i32,
    #[validate(custom(function = "non_zero_int"))]
    pub weight: i32,
    #[validate(custom(function = "allowed_goal"))]
    pub goal: String,
    #[validate(custom(function = "non_zero_int"))]
    pub weight_goal: i32,
}

#[derive(Debug, Default, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase", default)]
pub struct LoginPayload {
    #[validate(custom(function = "required_str"), email)]
    pub email: String,
    #[validate(custom(function = "required_str"), length(min = 3, max = 30))]
    pub password: String,
}

#[derive(Debug, Default, Clone, Deserialize, Validate)]
#[serde(default)]
pub struct ActivatePayload {
    #[validate(custom(function = "required_str"))]
    pub code: String,
}

/// Profile update body: registration constraints minus email and password.
#[derive(Debug, Default, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase", default)]
pub struct UpdateProfilePayload {
    #[validate(custom(function = "required_str"))]
    pub username: String,
    #[validate(custom(function = "required_flag"))]
    pub is_male: bool,
    #[validate(custom(function = "non_zero_int"))]
    pub age: i32,
    #[validate(custom(function = "non_zero_int"))]
    pub height: i32,
    #[validate(custom(function = "non_zero_int"))]
    pub weight: i32,
    #[validate(custom(function = "allowed_goal"))]
    pub goal: String,
    #[validate(custom(function = "non_zero_int"))]
    pub weight_goal: i32,
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub id: i64,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub token: String,
}

#[derive(Debug, Serialize)]
pub struct ActivateResponse {
    pub activated: bool,
}

/// Public part of the user; hash and activation code never leave the server.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileResponse {
    pub id: i64,
    pub email: String,
    pub username: String,
    pub is_male: bool,
    pub age: i32,
    pub height: i32,
    pub weight: i32,
    pub goal: String,
    pub weight_goal: i32,
    pub is_active: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl From<User> for ProfileResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            username: user.username,
            is_male: user.is_male,
            age: user.age,
            height: user.height,
            weight: user.weight,
            goal: user.goal,
            weight_goal: user.weight_goal,
            is_active: user.is_active,
            created_at: user.created_at,
        }
    }
}
