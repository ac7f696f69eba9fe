// TOTP Warden — Generator Output Parser
//
// Extracts the enrollment secret and provisioning URL from the generator's
// combined stdout/stderr text. Pure function over an immutable input: it
// never fails, and absent markers yield absent fields so callers are forced
// to decide what a missing secret means.

use zeroize::Zeroizing;

/// Literal printed by the generator immediately before the secret.
pub const SECRET_MARKER: &str = "Your new secret key is: ";

/// Prefix of the QR chart URL the generator prints.
pub const URL_PREFIX: &str = "https://www.google.com/chart";

/// Fields recovered from one generator run. Both are optional; the secret
/// is zeroed when this value drops.
#[derive(Debug, Default)]
pub struct ParsedEnrollment {
    pub secret: Option<Zeroizing<String>>,
    pub provisioning_url: Option<String>,
}

/// Scan `raw` for the secret marker and the URL prefix.
///
/// First occurrence wins for each marker. A field runs from the end of its
/// marker (the URL includes its prefix) to the next line break, or to the
/// end of input when no line break follows.
pub fn parse_enrollment(raw: &str) -> ParsedEnrollment {
    let secret = raw
        .find(SECRET_MARKER)
        .map(|pos| line_at(raw, pos + SECRET_MARKER.len()))
        .map(|line| Zeroizing::new(line.to_string()));

    let provisioning_url = raw
        .find(URL_PREFIX)
        .map(|pos| line_at(raw, pos).to_string());

    ParsedEnrollment {
        secret,
        provisioning_url,
    }
}

/// The text from `start` up to the next `\n` (exclusive) or end of input,
/// with a trailing `\r` stripped.
fn line_at(raw: &str, start: usize) -> &str {
    let rest = &raw[start..];
    let end = rest.find('\n').unwrap_or(rest.len());
    let line = &rest[..end];
    line.strip_suffix('\r').unwrap_or(line)
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
Do you want authentication tokens to be time-based (y/n) y\n\
https://www.google.com/chart?chs=200x200&chld=M|0&cht=qr&chl=otpauth://totp/alice\n\
Your new secret key is: ABCD1234\n\
Your verification code is 123456\n\
Your emergency scratch codes are:\n";

    #[test]
    fn test_extracts_secret_and_url() {
        let parsed = parse_enrollment(SAMPLE);
        assert_eq!(parsed.secret.as_deref().map(String::as_str), Some("ABCD1234"));
        assert_eq!(
            parsed.provisioning_url.as_deref(),
            Some("https://www.google.com/chart?chs=200x200&chld=M|0&cht=qr&chl=otpauth://totp/alice")
        );
    }

    #[test]
    fn test_missing_secret_marker_yields_none() {
        let parsed = parse_enrollment("https://www.google.com/chart?x=y\n");
        assert!(parsed.secret.is_none());
        assert_eq!(
            parsed.provisioning_url.as_deref(),
            Some("https://www.google.com/chart?x=y")
        );
    }

    #[test]
    fn test_missing_url_yields_none() {
        let parsed = parse_enrollment("Your new secret key is: XYZ\n");
        assert_eq!(parsed.secret.as_deref().map(String::as_str), Some("XYZ"));
        assert!(parsed.provisioning_url.is_none());
    }

    #[test]
    fn test_empty_input_yields_nothing() {
        let parsed = parse_enrollment("");
        assert!(parsed.secret.is_none());
        assert!(parsed.provisioning_url.is_none());
    }

    #[test]
    fn test_first_occurrence_wins() {
        let raw = "Your new secret key is: FIRST\nYour new secret key is: SECOND\n\
                   https://www.google.com/chart?a=1\nhttps://www.google.com/chart?a=2\n";
        let parsed = parse_enrollment(raw);
        assert_eq!(parsed.secret.as_deref().map(String::as_str), Some("FIRST"));
        assert_eq!(
            parsed.provisioning_url.as_deref(),
            Some("https://www.google.com/chart?a=1")
        );
    }

    #[test]
    fn test_end_of_input_terminates_field() {
        // No trailing newline after the secret.
        let parsed = parse_enrollment("Your new secret key is: TAIL");
        assert_eq!(parsed.secret.as_deref().map(String::as_str), Some("TAIL"));
    }

    #[test]
    fn test_crlf_line_ending_is_trimmed() {
        let parsed = parse_enrollment("Your new secret key is: WIN\r\n");
        assert_eq!(parsed.secret.as_deref().map(String::as_str), Some("WIN"));
    }

    #[test]
    fn test_marker_value_may_be_empty() {
        let parsed = parse_enrollment("Your new secret key is: \nrest\n");
        assert_eq!(parsed.secret.as_deref().map(String::as_str), Some(""));
    }

    #[test]
    fn test_surrounding_noise_is_ignored() {
        let raw = format!("garbage before\n{}noise after\n", SAMPLE);
        let parsed = parse_enrollment(&raw);
        assert_eq!(parsed.secret.as_deref().map(String::as_str), Some("ABCD1234"));
    }
}
