//! System-name validation against the host config's recognized list.
//!
//! A name that only differs from a recognized one by letter case is
//! almost always a typo, and a typo here means the session lands in a
//! directory the external sync never looks at. Those get a confirmation
//! prompt; plain unknown names get a warning and pass through.

use anyhow::{Result, bail};

use crate::ui::prompt;

#[derive(Debug, PartialEq, Eq)]
pub enum NameCheck {
    Recognized,
    /// Case-insensitive match of a recognized name; holds the recognized form.
    NearMiss(String),
    Unknown,
}

pub fn check_system_name(name: &str, recognized: &[String]) -> NameCheck {
    if recognized.iter().any(|s| s == name) {
        return NameCheck::Recognized;
    }
    if let Some(close) = recognized.iter().find(|s| s.eq_ignore_ascii_case(name)) {
        return NameCheck::NearMiss(close.clone());
    }
    NameCheck::Unknown
}

/// Validate a system name interactively. Returns an error when the
/// operator declines a near-miss confirmation.
pub fn validate_system_name(name: &str, recognized: &[String]) -> Result<()> {
    if recognized.is_empty() {
        eprintln!("Warning: no recognized systems configured, skipping name check");
        return Ok(());
    }

    match check_system_name(name, recognized) {
        NameCheck::Recognized => Ok(()),
        NameCheck::NearMiss(close) => {
            eprintln!(
                "Warning: system '{}' looks like a typo of recognized system '{}'",
                name, close
            );
            let keep = prompt::confirm(&format!("Really capture under '{}'?", name));
            if keep {
                Ok(())
            } else {
                bail!("aborted: system name '{}' declined", name);
            }
        }
        NameCheck::Unknown => {
            eprintln!(
                "Warning: system '{}' is not in the recognized list and will not be synced",
                name
            );
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recognized() -> Vec<String> {
        vec!["lab-a".to_string(), "Edge-1".to_string()]
    }

    #[test]
    fn test_exact_match() {
        assert_eq!(
            check_system_name("lab-a", &recognized()),
            NameCheck::Recognized
        );
        assert_eq!(
            check_system_name("Edge-1", &recognized()),
            NameCheck::Recognized
        );
    }

    #[test]
    fn test_case_near_miss() {
        assert_eq!(
            check_system_name("LAB-A", &recognized()),
            NameCheck::NearMiss("lab-a".to_string())
        );
        assert_eq!(
            check_system_name("edge-1", &recognized()),
            NameCheck::NearMiss("Edge-1".to_string())
        );
    }

    #[test]
    fn test_unknown() {
        assert_eq!(check_system_name("lab-c", &recognized()), NameCheck::Unknown);
    }

    #[test]
    fn test_empty_list_never_near_misses() {
        assert_eq!(check_system_name("anything", &[]), NameCheck::Unknown);
    }
}
