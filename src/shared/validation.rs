//! Field rules shared by registration, supplier requests and profile edits

/// 1-50 characters of letters and spaces, not blank
pub fn is_valid_name(name: &str) -> bool {
    let count = name.chars().count();
    (1..=50).contains(&count)
        && name.chars().all(|c| c.is_alphabetic() || c == ' ')
        && !name.trim().is_empty()
}

/// Exactly 10 ASCII digits
pub fn is_valid_phone(phone: &str) -> bool {
    phone.len() == 10 && phone.chars().all(|c| c.is_ascii_digit())
}

pub fn is_valid_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
        }
        None => false,
    }
}

/// At least 8 characters with a lowercase letter, an uppercase letter, a
/// digit and a special character
pub fn is_strong_password(password: &str) -> bool {
    password.chars().count() >= 8
        && password.chars().any(|c| c.is_lowercase())
        && password.chars().any(|c| c.is_uppercase())
        && password.chars().any(|c| c.is_ascii_digit())
        && password.chars().any(|c| !c.is_alphanumeric())
}

/// Lowercased, trimmed email used for storage and lookups
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
