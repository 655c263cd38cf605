/// Authentication endpoints
///
/// # Endpoints
///
/// - `POST /auth/register` - Register new user
/// - `POST /auth/login` - Login and get a token
/// - `GET /auth/profile` - Current user's profile
/// - `PUT /auth/profile` - Update username/email

use crate::{
    app::{AppState, CurrentUser},
    error::{ApiError, ApiResult},
};
use axum::{extract::State, http::StatusCode, Extension, Json};
use serde::{Deserialize, Serialize};
use taskhub_shared::{
    auth::{jwt, password},
    models::user::{CreateUser, UpdateProfile, User, UserView},
};
use validator::Validate;

/// Register request
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    /// Username
    #[validate(length(min = 3, max = 30, message = "Username must be between 3 and 30 characters"))]
    pub username: String,

    /// Email address
    #[validate(email(message = "Please enter a valid email"))]
    pub email: String,

    /// Password
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,
}

/// Login request
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    /// Email address
    #[validate(email(message = "Please enter a valid email"))]
    pub email: String,

    /// Password
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Register/login response: a signed token plus the public user view
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    /// Human-readable outcome
    pub message: String,

    /// Signed JWT, 7-day lifetime
    pub token: String,

    /// Public view of the user
    pub user: UserView,
}

/// Profile response
#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    /// Public view of the user
    pub user: UserView,
}

/// Profile update request
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateProfileRequest {
    /// New username
    #[validate(length(min = 3, max = 30, message = "Username must be between 3 and 30 characters"))]
    pub username: Option<String>,

    /// New email address
    #[validate(email(message = "Please enter a valid email"))]
    pub email: Option<String>,
}

/// Profile update response
#[derive(Debug, Serialize)]
pub struct UpdateProfileResponse {
    /// Human-readable outcome
    pub message: String,

    /// Public view of the updated user
    pub user: UserView,
}

/// Register a new user
///
/// Creates an account, hashes the password, and returns a signed token
/// bound to the new identity.
///
/// # Errors
///
/// - `400 Bad Request`: Validation failed, or username/email already taken
/// - `500 Internal Server Error`: Server error
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<AuthResponse>)> {
    req.validate()?;

    // Check if user already exists
    if User::find_by_username_or_email(&state.db, &req.username, &req.email)
        .await?
        .is_some()
    {
        return Err(ApiError::Conflict(
            "User already exists with this email or username".to_string(),
        ));
    }

    // Hash password and create the user
    let password_hash = password::hash_password(&req.password)?;

    let user = User::create(
        &state.db,
        CreateUser {
            username: req.username,
            email: req.email,
            password_hash,
        },
    )
    .await?;

    // Issue a token bound to the new identity
    let claims = jwt::Claims::new(user.id);
    let token = jwt::create_token(&claims, state.jwt_secret())?;

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            message: "User registered successfully".to_string(),
            token,
            user: UserView::from(&user),
        }),
    ))
}

/// Uniform login failure
///
/// 400, not 401: a 401 means the bearer token is bad and the client should
/// drop its session, which a mistyped login password must not trigger.
fn invalid_credentials() -> ApiError {
    ApiError::BadRequest("Invalid credentials".to_string())
}

/// Login endpoint
///
/// An unknown email and a wrong password produce the same error, so the
/// response never reveals which emails are registered.
///
/// # Errors
///
/// - `400 Bad Request`: Validation failed or invalid credentials
/// - `500 Internal Server Error`: Server error
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<Json<AuthResponse>> {
    req.validate()?;

    let user = User::find_by_email(&state.db, &req.email)
        .await?
        .ok_or_else(invalid_credentials)?;

    let valid = password::verify_password(&req.password, &user.password_hash)?;
    if !valid {
        return Err(invalid_credentials());
    }

    let claims = jwt::Claims::new(user.id);
    let token = jwt::create_token(&claims, state.jwt_secret())?;

    Ok(Json(AuthResponse {
        message: "Login successful".to_string(),
        token,
        user: UserView::from(&user),
    }))
}

/// Get the current user's profile
pub async fn get_profile(
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> ApiResult<Json<ProfileResponse>> {
    Ok(Json(ProfileResponse {
        user: UserView::from(&user),
    }))
}

/// Update the current user's profile
///
/// Only username and email can change. A collision with a *different*
/// user's username or email is a conflict; keeping one's own values is not.
///
/// # Errors
///
/// - `400 Bad Request`: Validation failed, or username/email already taken
/// - `401 Unauthorized`: Missing or invalid token
/// - `500 Internal Server Error`: Server error
pub async fn update_profile(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Json(req): Json<UpdateProfileRequest>,
) -> ApiResult<Json<UpdateProfileResponse>> {
    req.validate()?;

    let update = UpdateProfile {
        username: req.username,
        email: req.email,
    };

    // Nothing to change: return the current profile unchanged
    if update.is_empty() {
        return Ok(Json(UpdateProfileResponse {
            message: "Profile updated successfully".to_string(),
            user: UserView::from(&user),
        }));
    }

    if User::find_conflicting(
        &state.db,
        user.id,
        update.username.as_deref(),
        update.email.as_deref(),
    )
    .await?
    .is_some()
    {
        return Err(ApiError::Conflict(
            "Username or email already exists".to_string(),
        ));
    }

    let updated = User::update_profile(&state.db, user.id, update)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("Invalid token".to_string()))?;

    Ok(Json(UpdateProfileResponse {
        message: "Profile updated successfully".to_string(),
        user: UserView::from(&updated),
    }))
}
