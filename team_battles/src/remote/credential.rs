//! Syntactic API credential checks.

use thiserror::Error;

/// Shortest credential accepted
pub const MIN_CREDENTIAL_LEN: usize = 11;

/// Markers left behind by templates and redacted examples
const PLACEHOLDER_MARKERS: [&str; 3] = ["***", "YOUR_TOKEN", "PLACEHOLDER"];

/// Why a credential was rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CredentialProblem {
    #[error("credential is empty")]
    Empty,

    #[error("credential contains placeholder marker {0:?}")]
    Placeholder(&'static str),

    #[error("credential has {len} characters, need at least 11")]
    TooShort { len: usize },

    #[error("credential contains invalid character {0:?}")]
    InvalidCharacter(char),
}

/// Check that `token` looks like a usable API token.
///
/// Accepts ASCII letters, digits, `_` and `-`, at least
/// [`MIN_CREDENTIAL_LEN`] characters long, with no placeholder markers.
pub fn validate_credential(token: &str) -> Result<(), CredentialProblem> {
    if token.is_empty() {
        return Err(CredentialProblem::Empty);
    }

    if let Some(marker) = PLACEHOLDER_MARKERS
        .into_iter()
        .find(|marker| token.contains(marker))
    {
        return Err(CredentialProblem::Placeholder(marker));
    }

    let len = token.chars().count();
    if len < MIN_CREDENTIAL_LEN {
        return Err(CredentialProblem::TooShort { len });
    }

    if let Some(bad) = token
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || *c == '_' || *c == '-'))
    {
        return Err(CredentialProblem::InvalidCharacter(bad));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_alphanumeric_token() {
        assert_eq!(validate_credential("abcDEF1234567890wxyz"), Ok(()));
        assert_eq!(validate_credential("lip_abc-DEF_123"), Ok(()));
    }

    #[test]
    fn test_rejects_empty() {
        assert_eq!(validate_credential(""), Err(CredentialProblem::Empty));
    }

    #[test]
    fn test_rejects_placeholders() {
        assert_eq!(
            validate_credential("lip_***************"),
            Err(CredentialProblem::Placeholder("***"))
        );
        assert_eq!(
            validate_credential("YOUR_TOKEN_GOES_HERE"),
            Err(CredentialProblem::Placeholder("YOUR_TOKEN"))
        );
        assert_eq!(
            validate_credential("PLACEHOLDER_1234567"),
            Err(CredentialProblem::Placeholder("PLACEHOLDER"))
        );
    }

    #[test]
    fn test_rejects_short() {
        assert_eq!(
            validate_credential("abc123XYZ0"),
            Err(CredentialProblem::TooShort { len: 10 })
        );
        assert_eq!(validate_credential("abc123XYZ01"), Ok(()));
    }

    #[test]
    fn test_rejects_invalid_characters() {
        assert_eq!(
            validate_credential("abc123 XYZ0123"),
            Err(CredentialProblem::InvalidCharacter(' '))
        );
        assert_eq!(
            validate_credential("abc123.XYZ0123"),
            Err(CredentialProblem::InvalidCharacter('.'))
        );
        assert_eq!(
            validate_credential("abc123XYZ0123é"),
            Err(CredentialProblem::InvalidCharacter('é'))
        );
    }
}
