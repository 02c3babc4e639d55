//! Base contract system

use nc_core::error::ValidationErrors;
use nc_core::traits::Id;
use nc_core::types::Role;
use nc_models::User;
use validator::Validate;

/// Result of contract validation
pub type ValidationResult = Result<(), ValidationErrors>;

/// The acting user as seen by contracts
pub trait UserContext: Send + Sync {
    fn id(&self) -> Id;
    fn role(&self) -> Role;

    fn is_nc(&self) -> bool {
        self.role().is_nc()
    }
}

impl UserContext for User {
    fn id(&self) -> Id {
        self.id.unwrap_or_default()
    }

    fn role(&self) -> Role {
        self.role
    }
}

/// Base contract trait
pub trait Contract<T: ?Sized>: Send + Sync {
    fn validate(&self, entity: &T) -> ValidationResult;
}

/// Run the attribute rules declared on the model
pub fn validate_attributes<T: Validate>(entity: &T, errors: &mut ValidationErrors) {
    let Err(failed) = entity.validate() else {
        return;
    };
    let mut fields: Vec<_> = failed.field_errors().into_iter().collect();
    fields.sort_by_key(|(field, _)| *field);
    for (field, field_errors) in fields {
        for error in field_errors {
            let message = match &error.message {
                Some(message) => message.to_string(),
                None => format!("is invalid ({})", error.code),
            };
            errors.add(field, message);
        }
    }
}

/// Presence and maximum length of a text attribute
pub fn validate_text(field: &str, value: &str, max: usize, errors: &mut ValidationErrors) {
    if value.trim().is_empty() {
        errors.add(field, "can't be blank");
    } else if value.chars().count() > max {
        errors.add(field, format!("is too long (maximum is {max} characters)"));
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_text() {
        let mut errors = ValidationErrors::new();
        validate_text("title", "   ", 10, &mut errors);
        validate_text("reason", "abcdefghijk", 10, &mut errors);
        validate_text("detail", "ok", 10, &mut errors);

        assert_eq!(errors.get("title").unwrap()[0], "can't be blank");
        assert!(errors.has_error("reason"));
        assert!(!errors.has_error("detail"));
    }

    #[test]
    fn test_validate_attributes_uses_model_messages() {
        let mut errors = ValidationErrors::new();
        let user = User::new("not-an-email", "x".repeat(300), Role::Management);
        validate_attributes(&user, &mut errors);

        assert_eq!(errors.get("email").unwrap()[0], "is not a valid email address");
        assert_eq!(errors.get("name").unwrap()[0], "is too long (maximum is 255 characters)");

        let mut errors = ValidationErrors::new();
        validate_attributes(&User::new("ok@example.org", "Ok", Role::Nc), &mut errors);
        assert!(errors.is_empty());
    }

    #[test]
    fn test_user_model_context() {
        let mut user = User::new("nc@example.org", "NC", Role::Nc);
        user.id = Some(5);
        assert_eq!(UserContext::id(&user), 5);
        assert!(user.is_nc());
    }
}
