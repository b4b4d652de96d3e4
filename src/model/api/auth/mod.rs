mod request;
mod token;
mod user;

pub use request::{LoginRequest, RegisterRequest, MIN_PASSWORD_LENGTH};
pub use token::{AuthToken, AUTH_TOKEN_COOKIE};
pub use user::{Account, Admin, Rights, User};
