use once_cell::sync::Lazy;
use regex::Regex;

use crate::models::complaint::Priority;

static SEVERE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(urgent|emergency|immediately|fire|smoke|burning|leak(s|ing)?|flood(ed|ing)?|electric(al)?|shock|spark(s|ing)?|short circuit|gas|injur(y|ed)|danger(ous)?|unsafe|theft|stolen)\b",
    )
    .unwrap()
});

static DEGRADED: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(broken|not working|doesn't work|damaged|repair|stuck|blocked|clogged|noisy|noise|dirty|smell(s|y)?|slow)\b",
    )
    .unwrap()
});

/// Complaint categories that always deserve a closer look.
const SENSITIVE_TYPES: [&str; 3] = ["electrical", "plumbing", "security"];

/// Estimate how urgently a complaint needs attention from its wording.
///
/// Each severe keyword adds 3, each degraded-service keyword adds 1 and a
/// sensitive category adds 1. Three or more is High, one or more Medium.
pub fn complaint_priority(text: &str, complaint_type: &str) -> Priority {
    let mut score = SEVERE.find_iter(text).count() * 3 + DEGRADED.find_iter(text).count();
    if SENSITIVE_TYPES
        .iter()
        .any(|t| complaint_type.trim().eq_ignore_ascii_case(t))
    {
        score += 1;
    }

    match score {
        0 => Priority::Low,
        1 | 2 => Priority::Medium,
        _ => Priority::High,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severe_keyword_is_high() {
        assert_eq!(
            complaint_priority("Water LEAKING from the ceiling", "General"),
            Priority::High
        );
        assert_eq!(complaint_priority("there is smoke near the stairs", "Other"), Priority::High);
    }

    #[test]
    fn test_degraded_keyword_is_medium() {
        assert_eq!(complaint_priority("The fan is not working", "Furniture"), Priority::Medium);
    }

    #[test]
    fn test_sensitive_type_bumps_score() {
        assert_eq!(complaint_priority("please check the socket", "General"), Priority::Low);
        assert_eq!(complaint_priority("please check the socket", "Electrical"), Priority::Medium);
        assert_eq!(
            complaint_priority("tap broken and drain blocked", "plumbing"),
            Priority::High
        );
    }

    #[test]
    fn test_plain_request_is_low() {
        assert_eq!(complaint_priority("Could we get an extra chair?", "Furniture"), Priority::Low);
    }

    #[test]
    fn test_keywords_match_whole_words() {
        // "gasket" and "firewall" are not severe
        assert_eq!(complaint_priority("replace the gasket on the firewall box", "Other"), Priority::Low);
    }
}
