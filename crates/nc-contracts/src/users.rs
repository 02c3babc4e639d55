//! User contracts: provisioning and first-login password set

use nc_core::error::ValidationErrors;
use nc_models::User;

use crate::base::{validate_attributes, validate_text, Contract, ValidationResult};

const MAX_PASSWORD_LENGTH: usize = 128;

/// Contract for provisioning an account
pub struct ProvisionUserContract {
    email_taken: bool,
}

impl ProvisionUserContract {
    pub fn new(email_taken: bool) -> Self {
        Self { email_taken }
    }
}

impl Contract<User> for ProvisionUserContract {
    fn validate(&self, user: &User) -> ValidationResult {
        let mut errors = ValidationErrors::new();

        validate_attributes(user, &mut errors);
        if self.email_taken && !errors.has_error("email") {
            errors.add("email", "has already been taken");
        }

        errors.into_result()
    }
}

/// Password with its confirmation
pub struct PasswordChange<'a> {
    pub password: &'a str,
    pub confirmation: &'a str,
}

/// Contract for the one-time first-login password set
pub struct SetPasswordContract<'a> {
    user: &'a User,
    min_length: usize,
}

impl<'a> SetPasswordContract<'a> {
    pub fn new(user: &'a User, min_length: usize) -> Self {
        Self { user, min_length }
    }
}

impl<'a, 'p> Contract<PasswordChange<'p>> for SetPasswordContract<'a> {
    fn validate(&self, change: &PasswordChange<'p>) -> ValidationResult {
        let mut errors = ValidationErrors::new();

        if !self.user.active {
            errors.add_base("Account is deactivated");
        }
        if !self.user.awaiting_first_login() {
            errors.add_base("Password has already been set");
        }

        let length = change.password.chars().count();
        if change.password.trim().is_empty() {
            validate_text("password", change.password, MAX_PASSWORD_LENGTH, &mut errors);
        } else if length < self.min_length {
            errors.add(
                "password",
                format!("is too short (minimum is {} characters)", self.min_length),
            );
        } else if length > MAX_PASSWORD_LENGTH {
            errors.add(
                "password",
                format!("is too long (maximum is {MAX_PASSWORD_LENGTH} characters)"),
            );
        }
        if change.password != change.confirmation {
            errors.add("password_confirmation", "doesn't match password");
        }

        errors.into_result()
    }
}
