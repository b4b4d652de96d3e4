use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::model::{common::Email, db::voter::NewVoter};

pub const MIN_PASSWORD_LENGTH: usize = 8;

/// A student's sign-up form. The password is plaintext and never stored.
#[derive(Clone, Deserialize, Serialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub name: String,
}

impl RegisterRequest {
    /// Validate the form and turn it into a new (non-admin) voter by hashing the password.
    pub fn into_new_voter(self, config: &Config, now: DateTime<Utc>) -> Result<NewVoter> {
        let email = Email::institutional(&self.email, config.email_domain())?;
        let name = self.name.trim();
        if name.is_empty() {
            return Err(Error::BadRequest("Name must not be empty".to_string()));
        }
        if self.password.chars().count() < MIN_PASSWORD_LENGTH {
            return Err(Error::BadRequest(format!(
                "Password must be at least {MIN_PASSWORD_LENGTH} characters"
            )));
        }
        NewVoter::new(email, &self.password, name.to_string(), false, now)
    }
}

/// Login credentials. Used by students and admins alike.
#[derive(Clone, Deserialize, Serialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[cfg(test)]
mod examples {
    use super::*;
    use crate::model::db::voter::examples::EXAMPLE_PASSWORD;

    impl RegisterRequest {
        pub fn example() -> Self {
            Self {
                email: "Alan.Turing@students.riverside.edu".into(),
                password: "enigma-machine".into(),
                name: "Alan Turing".into(),
            }
        }
    }

    impl LoginRequest {
        /// Credentials of [`NewVoter::example`].
        pub fn example() -> Self {
            Self {
                email: "ada@students.riverside.edu".into(),
                password: EXAMPLE_PASSWORD.into(),
            }
        }

        /// Credentials of the admin configured in `Rocket.toml`.
        pub fn example_admin() -> Self {
            let config = Config::example();
            Self {
                email: config.admin_email().into(),
                password: config.admin_password().into(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registration_produces_student() {
        let now = Utc::now();
        let voter = RegisterRequest::example()
            .into_new_voter(&Config::example(), now)
            .unwrap();

        assert_eq!(voter.email.as_str(), "alan.turing@students.riverside.edu");
        assert_eq!(voter.name, "Alan Turing");
        assert!(!voter.is_admin);
        assert!(!voter.has_voted);
        assert_eq!(voter.created_at, now);
        assert!(voter.verify_password("enigma-machine"));
    }

    #[test]
    fn registration_enforces_domain() {
        let request = RegisterRequest {
            email: "alan@gmail.com".into(),
            ..RegisterRequest::example()
        };
        assert!(matches!(
            request.into_new_voter(&Config::example(), Utc::now()),
            Err(Error::InvalidEmailDomain(_))
        ));
    }

    #[test]
    fn registration_rejects_weak_input() {
        let short_password = RegisterRequest {
            password: "short".into(),
            ..RegisterRequest::example()
        };
        assert!(matches!(
            short_password.into_new_voter(&Config::example(), Utc::now()),
            Err(Error::BadRequest(_))
        ));

        let blank_name = RegisterRequest {
            name: "   ".into(),
            ..RegisterRequest::example()
        };
        assert!(matches!(
            blank_name.into_new_voter(&Config::example(), Utc::now()),
            Err(Error::BadRequest(_))
        ));
    }
}
