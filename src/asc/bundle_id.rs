use std::sync::LazyLock;

use regex::Regex;

use crate::error::AscError;

static COMPONENT: LazyLock<Result<Regex, regex::Error>> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9]([A-Za-z0-9-]*[A-Za-z0-9])?$"));

/// Reverse-domain notation: at least two dot-separated components, each alphanumeric with
/// inner hyphens.
pub fn is_valid(identifier: &str) -> bool {
    let components: Vec<&str> = identifier.split('.').collect();
    let Ok(component) = COMPONENT.as_ref() else {
        return false;
    };
    components.len() >= 2 && components.iter().all(|c| component.is_match(c))
}

pub fn validate(identifier: &str) -> Result<(), AscError> {
    if is_valid(identifier) {
        Ok(())
    } else {
        Err(AscError::InvalidBundleId(identifier.to_owned()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_reverse_domain_identifiers() {
        assert!(is_valid("com.example.app"));
        assert!(is_valid("io.github.user.my-app"));
        assert!(is_valid("com.Example2.App"));
    }

    #[test]
    fn rejects_single_component() {
        assert!(!is_valid("com"));
        assert!(!is_valid(""));
    }

    #[test]
    fn rejects_bad_components() {
        assert!(!is_valid("com.-example.app"));
        assert!(!is_valid("com.example-.app"));
        assert!(!is_valid("com..app"));
        assert!(!is_valid("com.example.app."));
        assert!(!is_valid("com.exa_mple.app"));
        assert!(!is_valid("com.example.*"));
    }

    #[test]
    fn validate_returns_invalid_bundle_id() {
        assert!(validate("com.example.app").is_ok());
        assert!(matches!(validate("com"), Err(AscError::InvalidBundleId(id)) if id == "com"));
    }
}
