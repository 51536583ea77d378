mod health_check;
mod site;

pub use health_check::health_check;
pub use site::{
    forgot_password, init, login, refresh_token, request_otp, reset_password, verify_email,
};
