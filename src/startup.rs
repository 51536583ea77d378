use actix_web::dev::Server;
use actix_web::{web, App, HttpServer};
use std::net::TcpListener;
use std::sync::Arc;

use crate::configuration::{JwtSettings, OtpSettings};
use crate::email_client::Mailer;
use crate::logger::LoggerMiddleware;
use crate::middleware::AdminGuard;
use crate::routes::{
    forgot_password, health_check, init, login, refresh_token, request_otp, reset_password,
    verify_email,
};
use crate::store::SiteStore;

/// Shared application state: the store and mailer capabilities plus the
/// token/OTP configuration.
pub struct AppState {
    pub store: Arc<dyn SiteStore>,
    pub mailer: Arc<dyn Mailer>,
    pub jwt: JwtSettings,
    pub otp: OtpSettings,
    /// Public base URL used in password-reset links.
    pub base_url: String,
}

pub fn run(listener: TcpListener, state: AppState) -> Result<Server, std::io::Error> {
    let jwt_config = state.jwt.clone();
    let state = web::Data::new(state);

    let server = HttpServer::new(move || {
        App::new()
            .wrap(LoggerMiddleware)
            .app_data(state.clone())
            .route("/health_check", web::get().to(health_check))
            .service(
                web::scope("/api/v1/site")
                    // Public routes
                    .route("/init", web::post().to(init))
                    .route("/forgot-password", web::post().to(forgot_password))
                    .route("/reset-password", web::post().to(reset_password))
                    .route("/login", web::post().to(login))
                    .route("/refresh-token", web::post().to(refresh_token))
                    // Privileged routes (require a valid access token)
                    .service(
                        web::scope("")
                            .wrap(AdminGuard::new(jwt_config.clone()))
                            .route("/request-otp", web::post().to(request_otp))
                            .route("/verify-email", web::post().to(verify_email)),
                    ),
            )
    })
    .listen(listener)?
    .run();

    Ok(server)
}
