use once_cell::sync::Lazy;
use regex::Regex;

static PHONE_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\+?\d[\d\-\s]{6,}\d").expect("valid phone regex"));
static EMAIL_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[\w.+-]+@[\w-]+\.[\w.-]+").expect("valid email regex"));

/// Replaces phone-number-shaped and email-shaped substrings with a fixed
/// placeholder. Used anywhere a free-text value might end up in a log
/// line; never used on values that are themselves safe to log verbatim
/// (ids, enum tags, counts).
pub fn redact_string(input: &str) -> String {
    let redacted = PHONE_PATTERN.replace_all(input, "[REDACTED_PHONE]");
    EMAIL_PATTERN.replace_all(&redacted, "[REDACTED_EMAIL]").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn redacts_phone_and_email() {
        let input = "call 5511999998888@c.us or guest@example.com about reserva";
        let redacted = redact_string(input);
        assert!(!redacted.contains("5511999998888"));
        assert!(!redacted.contains("guest@example.com"));
    }

    #[test]
    fn leaves_plain_text_untouched() {
        let input = "ready_to_quote";
        assert_eq!(redact_string(input), input);
    }
}
