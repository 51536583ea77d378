use config::ConfigError;

#[derive(serde::Deserialize, Clone)]
pub struct Settings {
    pub database: DatabaseSettings,
    pub application: ApplicationSettings,
    pub jwt: JwtSettings,
    pub otp: OtpSettings,
    pub email: EmailSettings,
}

#[derive(serde::Deserialize, Clone)]
pub struct ApplicationSettings {
    pub port: u16,
    /// Public base URL, used to build the password-reset link.
    pub base_url: String,
}

#[derive(serde::Deserialize, Clone)]
pub struct DatabaseSettings {
    pub username: String,
    pub password: String,
    pub port: u16,
    pub host: String,
    pub database_name: String,
}

impl DatabaseSettings {
    pub fn connection_string(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}/{}",
            self.username, self.password, self.host, self.port, self.database_name
        )
    }

    pub fn connection_string_without_db(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}",
            self.username, self.password, self.host, self.port
        )
    }
}

/// Token-signing settings.
///
/// Access and refresh tokens are signed with independent secrets, so leaking
/// one cannot be used to forge the other.
#[derive(serde::Deserialize, Clone)]
pub struct JwtSettings {
    pub access_secret: String,
    pub refresh_secret: String,
    pub access_token_expiry: i64,   // seconds (e.g., 900 for 15 minutes)
    pub refresh_token_expiry: i64,  // seconds (e.g., 604800 for 7 days)
    pub issuer: String,
}

/// One-time credential lifetimes.
#[derive(serde::Deserialize, Clone)]
pub struct OtpSettings {
    #[serde(default = "default_validity_minutes")]
    pub otp_validity_minutes: i64,
    #[serde(default = "default_validity_minutes")]
    pub reset_token_validity_minutes: i64,
}

impl Default for OtpSettings {
    fn default() -> Self {
        Self {
            otp_validity_minutes: default_validity_minutes(),
            reset_token_validity_minutes: default_validity_minutes(),
        }
    }
}

fn default_validity_minutes() -> i64 {
    10
}

#[derive(serde::Deserialize, Clone)]
pub struct EmailSettings {
    /// Base URL of the HTTP email delivery API.
    pub base_url: String,
    pub sender: String,
    #[serde(default = "default_email_timeout")]
    pub timeout_seconds: u64,
}

fn default_email_timeout() -> u64 {
    10
}

pub fn get_configuration() -> Result<Settings, ConfigError> {
    let settings = config::Config::builder()
        .add_source(config::File::with_name("configuration").required(false))
        .build()?;
    settings.try_deserialize::<Settings>()
}
