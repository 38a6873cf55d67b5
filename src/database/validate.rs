use crate::constants::{NAME_MAX_LEN, QUANTITY_MAX, QUANTITY_MIN, RESERVED_USERNAMES};
use crate::error::ApiError;

/// Ingredient amounts and cooking times share one accepted range.
pub fn validate_quantity(value: i32) -> Result<(), ApiError> {
    if value < QUANTITY_MIN || value >= QUANTITY_MAX {
        return Err(ApiError::Validation(format!(
            "Value {value} is outside the accepted range {QUANTITY_MIN}-{}",
            QUANTITY_MAX - 1
        )));
    }
    Ok(())
}

pub fn validate_username(value: &str) -> Result<(), ApiError> {
    if value.is_empty() || value.len() > NAME_MAX_LEN {
        return Err(ApiError::validation("Username has invalid length"));
    }
    if RESERVED_USERNAMES
        .iter()
        .any(|reserved| reserved.eq_ignore_ascii_case(value))
    {
        return Err(ApiError::Validation(format!(
            "Username `{value}` is reserved"
        )));
    }
    if !value
        .chars()
        .all(|c| c.is_alphanumeric() || matches!(c, '@' | '.' | '+' | '-' | '_'))
    {
        return Err(ApiError::validation(
            "Username may only contain letters, digits and @.+-_",
        ));
    }
    Ok(())
}

pub fn validate_person_name(value: &str) -> Result<(), ApiError> {
    if value.is_empty() || value.len() > NAME_MAX_LEN {
        return Err(ApiError::validation("Name has invalid length"));
    }
    if !value.chars().all(|c| c.is_alphabetic() || c == ' ') {
        return Err(ApiError::validation("Names may only contain letters"));
    }
    Ok(())
}

pub fn validate_email(value: &str) -> Result<(), ApiError> {
    let valid = match value.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty() && domain.contains('.') && !domain.starts_with('.')
        }
        None => false,
    };
    if !valid || value.len() > NAME_MAX_LEN {
        return Err(ApiError::validation("Invalid email address"));
    }
    Ok(())
}

/// Accepts `#RGB`, `#RRGGBB` and the same without the hash; returns the
/// normalised lowercase `#`-prefixed form so the uniqueness index treats
/// `#ABC` and `#abc` as the same color.
pub fn validate_hex_color(value: &str) -> Result<String, ApiError> {
    let digits = value.strip_prefix('#').unwrap_or(value);
    if (digits.len() != 3 && digits.len() != 6)
        || !digits.chars().all(|c| c.is_ascii_hexdigit())
    {
        return Err(ApiError::Validation(format!(
            "`{value}` is not a valid HEX color code"
        )));
    }
    Ok(format!("#{}", digits.to_ascii_lowercase()))
}

pub fn validate_slug(value: &str) -> Result<(), ApiError> {
    if value.is_empty() || value.len() > NAME_MAX_LEN {
        return Err(ApiError::validation("Slug has invalid length"));
    }
    if !value
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || matches!(c, '-' | '_'))
    {
        return Err(ApiError::Validation(format!(
            "`{value}` is not a valid slug"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quantity_bounds() {
        assert!(validate_quantity(0).is_err());
        assert!(validate_quantity(-5).is_err());
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(9999).is_ok());
        assert!(validate_quantity(10_000).is_err());
    }

    #[test]
    fn reserved_username_is_rejected_case_insensitively() {
        for name in ["me", "Me", "mE", "ME"] {
            assert!(validate_username(name).is_err(), "{name} should be reserved");
        }
        assert!(validate_username("melissa").is_ok());
    }

    #[test]
    fn username_charset() {
        assert!(validate_username("jane.doe+test@host").is_ok());
        assert!(validate_username("jane doe").is_err());
        assert!(validate_username("").is_err());
    }

    #[test]
    fn person_names_are_letters_only() {
        assert!(validate_person_name("Anna Maria").is_ok());
        assert!(validate_person_name("R2D2").is_err());
        assert!(validate_person_name("").is_err());
    }

    #[test]
    fn hex_colors_normalise() {
        assert_eq!(validate_hex_color("#E26C2D").unwrap(), "#e26c2d");
        assert_eq!(validate_hex_color("FFF").unwrap(), "#fff");
        assert!(validate_hex_color("#ffff").is_err());
        assert!(validate_hex_color("#ggg").is_err());
        assert!(validate_hex_color("").is_err());
    }

    #[test]
    fn slugs() {
        assert!(validate_slug("breakfast-meals_2").is_ok());
        assert!(validate_slug("Breakfast").is_err());
        assert!(validate_slug("petit déjeuner").is_err());
    }
}
