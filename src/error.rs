//! Unified error handling.
//!
//! Domain-specific error types keep protocol code honest about what can fail;
//! the unified `AppError` maps every kind onto the HTTP envelope
//! `{status, message, errors?}` with `status = "fail"` for client faults and
//! `"error"` for server faults. Backend detail never leaks into envelopes for
//! server faults; it goes to the structured log instead.

use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use std::collections::BTreeMap;
use std::error::Error as StdError;
use std::fmt;

/// A single violated validation rule, carrying the offending field so the
/// envelope can expose a field -> message map.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    Required(&'static str),
    TooShort(&'static str, usize),
    TooLong(&'static str, usize),
    Invalid(&'static str, String),
}

impl ValidationError {
    pub fn field(&self) -> &'static str {
        match self {
            ValidationError::Required(field)
            | ValidationError::TooShort(field, _)
            | ValidationError::TooLong(field, _)
            | ValidationError::Invalid(field, _) => field,
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::Required(field) => write!(f, "{} is required.", field),
            ValidationError::TooShort(field, min) => {
                write!(f, "{} must be at least {} characters long.", field, min)
            }
            ValidationError::TooLong(field, max) => {
                write!(f, "{} cannot exceed {} characters.", field, max)
            }
            ValidationError::Invalid(_, message) => write!(f, "{}", message),
        }
    }
}

impl StdError for ValidationError {}

/// Site account lifecycle errors.
#[derive(Debug, Clone, PartialEq)]
pub enum SiteError {
    AlreadyInitialized,
    AccountNotFound,
    AlreadyVerified,
    /// A resend was attempted inside the backoff window; carries the wait
    /// remaining before the next attempt is allowed.
    TooSoon(chrono::Duration),
    OtpInvalidOrExpired,
    ResetTokenInvalidOrExpired,
}

impl fmt::Display for SiteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SiteError::AlreadyInitialized => {
                write!(f, "Cannot initialize the site more than once.")
            }
            SiteError::AccountNotFound => {
                write!(f, "No site account matches that email address.")
            }
            SiteError::AlreadyVerified => {
                write!(f, "Email address is already verified.")
            }
            SiteError::TooSoon(remaining) => write!(
                f,
                "A verification code was requested too recently. Retry in {} seconds.",
                remaining.num_seconds().max(1)
            ),
            SiteError::OtpInvalidOrExpired => {
                write!(f, "Invalid or expired verification code.")
            }
            SiteError::ResetTokenInvalidOrExpired => {
                write!(f, "Invalid or expired password reset token.")
            }
        }
    }
}

impl StdError for SiteError {}

/// Authentication errors.
#[derive(Debug, Clone, PartialEq)]
pub enum AuthError {
    InvalidCredentials,
    MissingToken,
    InvalidToken,
}

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthError::InvalidCredentials => write!(f, "Invalid email or password."),
            AuthError::MissingToken => write!(f, "Missing authentication token."),
            AuthError::InvalidToken => write!(f, "Invalid or expired token."),
        }
    }
}

impl StdError for AuthError {}

/// Email delivery errors. The detail string is for logs only.
#[derive(Debug, Clone)]
pub enum EmailError {
    DeliveryFailed(String),
}

impl fmt::Display for EmailError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EmailError::DeliveryFailed(detail) => write!(f, "Failed to send email: {}", detail),
        }
    }
}

impl StdError for EmailError {}

/// Account store errors. `Conflict` signals a stale optimistic-concurrency
/// version and is retried inside the protocol layer; it only escapes when a
/// retry loop gives up.
#[derive(Debug, Clone)]
pub enum StoreError {
    Unavailable(String),
    Conflict,
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Unavailable(detail) => write!(f, "Store unavailable: {}", detail),
            StoreError::Conflict => write!(f, "Concurrent update conflict."),
        }
    }
}

impl StdError for StoreError {}

/// Central error type that all application errors map to.
#[derive(Debug)]
pub enum AppError {
    Validation(Vec<ValidationError>),
    Site(SiteError),
    Auth(AuthError),
    Email(EmailError),
    Store(StoreError),
    Internal(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Validation(errors) => {
                let joined = errors
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join(" ");
                write!(f, "Validation failed: {}", joined)
            }
            AppError::Site(e) => write!(f, "{}", e),
            AppError::Auth(e) => write!(f, "{}", e),
            AppError::Email(e) => write!(f, "{}", e),
            AppError::Store(e) => write!(f, "{}", e),
            AppError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl StdError for AppError {}

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        AppError::Validation(vec![err])
    }
}

impl From<Vec<ValidationError>> for AppError {
    fn from(errors: Vec<ValidationError>) -> Self {
        AppError::Validation(errors)
    }
}

impl From<SiteError> for AppError {
    fn from(err: SiteError) -> Self {
        AppError::Site(err)
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        AppError::Auth(err)
    }
}

impl From<EmailError> for AppError {
    fn from(err: EmailError) -> Self {
        AppError::Email(err)
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        AppError::Store(err)
    }
}

/// Response envelope shared by every failure path.
#[derive(Debug, serde::Serialize)]
pub struct ErrorEnvelope {
    pub status: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<BTreeMap<&'static str, String>>,
}

impl AppError {
    /// Builds the caller-visible envelope. Server faults get a generic
    /// message; the specifics are logged, not returned.
    fn envelope(&self) -> ErrorEnvelope {
        let status_code = self.status_code();
        let status = if status_code.is_client_error() {
            "fail"
        } else {
            "error"
        };

        let (message, errors) = match self {
            AppError::Validation(violations) => {
                let mut map = BTreeMap::new();
                for violation in violations {
                    map.entry(violation.field())
                        .or_insert_with(|| violation.to_string());
                }
                ("Validation failed.".to_string(), Some(map))
            }
            AppError::Site(e) => (e.to_string(), None),
            AppError::Auth(e) => (e.to_string(), None),
            AppError::Email(_) => ("Email service temporarily unavailable.".to_string(), None),
            AppError::Store(_) => ("Storage temporarily unavailable.".to_string(), None),
            AppError::Internal(_) => ("Internal server error.".to_string(), None),
        };

        ErrorEnvelope {
            status,
            message,
            errors,
        }
    }

    fn log(&self) {
        match self {
            AppError::Validation(_) | AppError::Site(_) => {
                tracing::warn!(error = %self, "Request rejected");
            }
            AppError::Auth(e) => {
                tracing::warn!(error = %e, "Authentication failed");
            }
            AppError::Email(e) => {
                tracing::error!(error = %e, "Email delivery failed");
            }
            AppError::Store(e) => {
                tracing::error!(error = %e, "Store failure");
            }
            AppError::Internal(msg) => {
                tracing::error!(error = %msg, "Internal error");
            }
        }
    }
}

impl ResponseError for AppError {
    fn error_response(&self) -> HttpResponse {
        self.log();
        HttpResponse::build(self.status_code()).json(self.envelope())
    }

    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Site(e) => match e {
                SiteError::AccountNotFound => StatusCode::NOT_FOUND,
                SiteError::TooSoon(_) => StatusCode::TOO_MANY_REQUESTS,
                SiteError::AlreadyInitialized
                | SiteError::AlreadyVerified
                | SiteError::OtpInvalidOrExpired
                | SiteError::ResetTokenInvalidOrExpired => StatusCode::BAD_REQUEST,
            },
            AppError::Auth(_) => StatusCode::UNAUTHORIZED,
            AppError::Email(_) | AppError::Store(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_error_display_names_the_field() {
        let err = ValidationError::TooShort("site_name", 3);
        assert_eq!(err.to_string(), "site_name must be at least 3 characters long.");
        assert_eq!(err.field(), "site_name");
    }

    #[test]
    fn validation_envelope_carries_field_map() {
        let err = AppError::Validation(vec![
            ValidationError::Required("email"),
            ValidationError::TooShort("password", 8),
        ]);
        let envelope = err.envelope();

        assert_eq!(envelope.status, "fail");
        let errors = envelope.errors.expect("expected errors map");
        assert_eq!(errors["email"], "email is required.");
        assert_eq!(errors["password"], "password must be at least 8 characters long.");
    }

    #[test]
    fn too_soon_reports_remaining_wait() {
        let err = SiteError::TooSoon(chrono::Duration::seconds(95));
        assert!(err.to_string().contains("95 seconds"));
        assert_eq!(
            AppError::from(err).status_code(),
            StatusCode::TOO_MANY_REQUESTS
        );
    }

    #[test]
    fn server_faults_use_generic_messages() {
        let err = AppError::Store(StoreError::Unavailable("connection refused".into()));
        let envelope = err.envelope();

        assert_eq!(envelope.status, "error");
        assert!(!envelope.message.contains("connection refused"));
    }

    #[test]
    fn status_codes_match_fault_classes() {
        assert_eq!(
            AppError::from(SiteError::AlreadyInitialized).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::from(SiteError::AccountNotFound).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::from(AuthError::InvalidCredentials).status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AppError::from(EmailError::DeliveryFailed("smtp down".into())).status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }
}
