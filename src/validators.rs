//! Input validation for the site account.
//!
//! Bootstrap validation collects *every* violated rule so the caller gets one
//! field -> message map rather than the first failure.

use lazy_static::lazy_static;
use regex::Regex;

use crate::auth::password::validate_password;
use crate::error::ValidationError;
use crate::site::SiteInit;

const MAX_EMAIL_LENGTH: usize = 254; // RFC 5321
const MIN_EMAIL_LENGTH: usize = 5;
const MIN_SITE_NAME_LENGTH: usize = 3;
const MAX_SITE_NAME_LENGTH: usize = 60;
const MAX_SITE_DESCRIPTION_LENGTH: usize = 300;

pub const DEFAULT_CURRENCY: &str = "USD";
pub const DEFAULT_TIMEZONE: &str = "America/New_York";
pub const DEFAULT_DATE_FORMAT: &str = "MMMM DD, YYYY";
pub const DEFAULT_TIME_FORMAT: &str = "h:mm A";
pub const DEFAULT_WEEK_STARTS_ON: &str = "Monday";

const DATE_FORMATS: &[&str] = &[
    "YYYY-MM-DD",
    "MM/DD/YYYY",
    "DD-MM-YYYY",
    "YYYY/MM/DD",
    "DD/MM/YYYY",
    "MM-DD-YYYY",
    "DD MMMM, YYYY",
    "DD MMMM YYYY",
    "MMMM DD, YYYY",
    "MMMM DD YYYY",
];

const TIME_FORMATS: &[&str] = &["HH:mm", "h:mm A", "h:mm a"];

const WEEK_DAYS: &[&str] = &[
    "Sunday",
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
];

lazy_static! {
    // RFC 5322 simplified email regex (practical validation)
    static ref EMAIL_REGEX: Regex = Regex::new(
        r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)*$"
    ).unwrap();
}

/// Validates and normalizes an email address.
pub fn is_valid_email(email: &str) -> Result<String, ValidationError> {
    let trimmed = email.trim();

    if trimmed.is_empty() {
        return Err(ValidationError::Required("email"));
    }

    if trimmed.len() < MIN_EMAIL_LENGTH {
        return Err(ValidationError::TooShort("email", MIN_EMAIL_LENGTH));
    }

    if trimmed.len() > MAX_EMAIL_LENGTH {
        return Err(ValidationError::TooLong("email", MAX_EMAIL_LENGTH));
    }

    if !EMAIL_REGEX.is_match(trimmed) || trimmed.matches('@').count() != 1 {
        return Err(ValidationError::Invalid(
            "email",
            "Invalid email format.".to_string(),
        ));
    }

    Ok(trimmed.to_string())
}

pub fn validate_site_name(name: &str) -> Result<String, ValidationError> {
    let trimmed = name.trim();

    if trimmed.is_empty() {
        return Err(ValidationError::Required("site_name"));
    }

    if trimmed.len() < MIN_SITE_NAME_LENGTH {
        return Err(ValidationError::TooShort("site_name", MIN_SITE_NAME_LENGTH));
    }

    if trimmed.len() > MAX_SITE_NAME_LENGTH {
        return Err(ValidationError::TooLong("site_name", MAX_SITE_NAME_LENGTH));
    }

    Ok(trimmed.to_string())
}

pub fn validate_site_description(description: &str) -> Result<String, ValidationError> {
    let trimmed = description.trim();

    if trimmed.len() > MAX_SITE_DESCRIPTION_LENGTH {
        return Err(ValidationError::TooLong(
            "site_description",
            MAX_SITE_DESCRIPTION_LENGTH,
        ));
    }

    Ok(trimmed.to_string())
}

/// Currency codes are checked at the format level (three ASCII uppercase
/// letters, ISO-4217 shape).
pub fn validate_currency(currency: &str) -> Result<String, ValidationError> {
    let trimmed = currency.trim();

    if trimmed.len() != 3 || !trimmed.chars().all(|c| c.is_ascii_uppercase()) {
        return Err(ValidationError::Invalid(
            "currency",
            "Invalid currency code.".to_string(),
        ));
    }

    Ok(trimmed.to_string())
}

pub fn validate_timezone(timezone: &str) -> Result<String, ValidationError> {
    let trimmed = timezone.trim();

    if trimmed.parse::<chrono_tz::Tz>().is_err() {
        return Err(ValidationError::Invalid(
            "timezone",
            "Invalid time zone. Please provide a valid time zone.".to_string(),
        ));
    }

    Ok(trimmed.to_string())
}

pub fn validate_date_format(format: &str) -> Result<String, ValidationError> {
    let trimmed = format.trim();

    if !DATE_FORMATS.contains(&trimmed) {
        return Err(ValidationError::Invalid(
            "date_format",
            "Invalid date format. Please provide a valid date format.".to_string(),
        ));
    }

    Ok(trimmed.to_string())
}

pub fn validate_time_format(format: &str) -> Result<String, ValidationError> {
    let trimmed = format.trim();

    if !TIME_FORMATS.contains(&trimmed) {
        return Err(ValidationError::Invalid(
            "time_format",
            "Invalid time format. Please provide a valid time format.".to_string(),
        ));
    }

    Ok(trimmed.to_string())
}

pub fn validate_week_starts_on(day: &str) -> Result<String, ValidationError> {
    let trimmed = day.trim();

    if !WEEK_DAYS.contains(&trimmed) {
        return Err(ValidationError::Invalid(
            "week_starts_on",
            "Invalid week start day.".to_string(),
        ));
    }

    Ok(trimmed.to_string())
}

/// Profile fields as accepted for account creation, with defaults resolved.
#[derive(Debug, Clone)]
pub struct ValidatedProfile {
    pub site_name: String,
    pub site_description: Option<String>,
    pub email: String,
    pub currency: String,
    pub timezone: String,
    pub date_format: String,
    pub time_format: String,
    pub week_starts_on: String,
}

/// Validates every bootstrap field, collecting all violations. The password
/// is validated raw here and hashed by the caller only after this passes.
pub fn validate_site_init(init: &SiteInit) -> Result<ValidatedProfile, Vec<ValidationError>> {
    let mut errors = Vec::new();

    let site_name = check(validate_site_name(&init.site_name), &mut errors);
    let site_description = match init.site_description.as_deref() {
        Some(description) => check(validate_site_description(description), &mut errors)
            .filter(|d| !d.is_empty()),
        None => None,
    };
    let email = check(is_valid_email(&init.email), &mut errors);

    if let Err(violation) = validate_password(&init.password) {
        errors.push(violation);
    }

    let currency = check(
        validate_currency(init.currency.as_deref().unwrap_or(DEFAULT_CURRENCY)),
        &mut errors,
    );
    let timezone = check(
        validate_timezone(init.timezone.as_deref().unwrap_or(DEFAULT_TIMEZONE)),
        &mut errors,
    );
    let date_format = check(
        validate_date_format(init.date_format.as_deref().unwrap_or(DEFAULT_DATE_FORMAT)),
        &mut errors,
    );
    let time_format = check(
        validate_time_format(init.time_format.as_deref().unwrap_or(DEFAULT_TIME_FORMAT)),
        &mut errors,
    );
    let week_starts_on = check(
        validate_week_starts_on(
            init.week_starts_on
                .as_deref()
                .unwrap_or(DEFAULT_WEEK_STARTS_ON),
        ),
        &mut errors,
    );

    match (
        site_name,
        email,
        currency,
        timezone,
        date_format,
        time_format,
        week_starts_on,
    ) {
        (
            Some(site_name),
            Some(email),
            Some(currency),
            Some(timezone),
            Some(date_format),
            Some(time_format),
            Some(week_starts_on),
        ) if errors.is_empty() => Ok(ValidatedProfile {
            site_name,
            site_description,
            email,
            currency,
            timezone,
            date_format,
            time_format,
            week_starts_on,
        }),
        _ => Err(errors),
    }
}

fn check(result: Result<String, ValidationError>, errors: &mut Vec<ValidationError>) -> Option<String> {
    match result {
        Ok(value) => Some(value),
        Err(violation) => {
            errors.push(violation);
            None
        }
    }
}
