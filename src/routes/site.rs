//! HTTP handlers for the site account operations.
//!
//! Each handler maps 1:1 onto a protocol operation and returns the
//! `{status, message, ...}` envelope; failures are rendered by `AppError`'s
//! `ResponseError` implementation.

use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};

use crate::auth::AccessClaims;
use crate::error::AppError;
use crate::otp;
use crate::password_reset;
use crate::session;
use crate::site::SiteInit;
use crate::startup::AppState;

#[derive(Deserialize)]
pub struct EmailRequest {
    pub email: String,
}

#[derive(Deserialize)]
pub struct VerifyEmailRequest {
    pub email: String,
    pub otp: String,
}

#[derive(Deserialize)]
pub struct ResetPasswordRequest {
    pub token: String,
    pub new_password: String,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: Option<String>,
}

#[derive(Serialize)]
struct ApiMessage {
    status: &'static str,
    message: &'static str,
}

impl ApiMessage {
    fn success(message: &'static str) -> Self {
        Self {
            status: "success",
            message,
        }
    }
}

/// Login response: the envelope plus the minted token pair.
#[derive(Serialize)]
pub struct AuthResponse {
    pub status: &'static str,
    pub message: &'static str,
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: &'static str,
    pub expires_in: i64,
}

#[derive(Serialize)]
pub struct RefreshResponse {
    pub status: &'static str,
    pub message: &'static str,
    pub access_token: String,
    pub token_type: &'static str,
    pub expires_in: i64,
}

/// POST /api/v1/site/init
pub async fn init(
    form: web::Json<SiteInit>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    session::init_site(
        state.store.as_ref(),
        state.mailer.as_ref(),
        &state.otp,
        form.into_inner(),
    )
    .await?;

    Ok(HttpResponse::Created().json(ApiMessage::success("Site initialized successfully")))
}

/// POST /api/v1/site/request-otp (behind `AdminGuard`)
pub async fn request_otp(
    claims: web::ReqData<AccessClaims>,
    form: web::Json<EmailRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    tracing::info!(site_id = %claims.sub, "Verification code requested");

    otp::request_otp(
        state.store.as_ref(),
        state.mailer.as_ref(),
        &state.otp,
        &form.email,
    )
    .await?;

    Ok(HttpResponse::Ok().json(ApiMessage::success("Verification code sent")))
}

/// POST /api/v1/site/verify-email (behind `AdminGuard`)
pub async fn verify_email(
    claims: web::ReqData<AccessClaims>,
    form: web::Json<VerifyEmailRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    tracing::info!(site_id = %claims.sub, "Email verification attempted");

    otp::verify_otp(state.store.as_ref(), &form.email, &form.otp).await?;

    Ok(HttpResponse::Ok().json(ApiMessage::success("Email verified successfully")))
}

/// POST /api/v1/site/forgot-password
pub async fn forgot_password(
    form: web::Json<EmailRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    password_reset::request_reset(
        state.store.as_ref(),
        state.mailer.as_ref(),
        &state.otp,
        &state.base_url,
        &form.email,
    )
    .await?;

    Ok(HttpResponse::Ok().json(ApiMessage::success("Password reset email sent")))
}

/// POST /api/v1/site/reset-password
pub async fn reset_password(
    form: web::Json<ResetPasswordRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    password_reset::reset_password(state.store.as_ref(), &form.token, &form.new_password).await?;

    Ok(HttpResponse::Ok().json(ApiMessage::success("Password has been reset")))
}

/// POST /api/v1/site/login
pub async fn login(
    form: web::Json<LoginRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let tokens = session::login(state.store.as_ref(), &state.jwt, &form.email, &form.password)
        .await?;

    Ok(HttpResponse::Ok().json(AuthResponse {
        status: "success",
        message: "Logged in successfully",
        access_token: tokens.access_token,
        refresh_token: tokens.refresh_token,
        token_type: "Bearer",
        expires_in: state.jwt.access_token_expiry,
    }))
}

/// POST /api/v1/site/refresh-token
pub async fn refresh_token(
    form: web::Json<RefreshRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let access_token =
        session::refresh(state.store.as_ref(), &state.jwt, form.refresh_token.as_deref()).await?;

    Ok(HttpResponse::Ok().json(RefreshResponse {
        status: "success",
        message: "Access token refreshed",
        access_token,
        token_type: "Bearer",
        expires_in: state.jwt.access_token_expiry,
    }))
}
