//! HTTP Basic credential extraction
//!
//! `Authorization: Basic <base64(username:password)>`

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use http::header::AUTHORIZATION;
use http::HeaderMap;
use simple_core::types::Credentials;
use simple_core::{Error, Result};

pub const BASIC_SCHEME: &str = "Basic";

/// Pull Basic credentials out of request headers
pub fn extract_credentials(headers: &HeaderMap) -> Result<Credentials> {
    let header = headers
        .get(AUTHORIZATION)
        .ok_or_else(|| Error::CredentialsMalformed("missing Authorization header".into()))?
        .to_str()
        .map_err(|_| Error::CredentialsMalformed("Authorization header is not ASCII".into()))?;

    parse_basic_authorization(header)
}

/// Parse an `Authorization` header value using the Basic scheme
pub fn parse_basic_authorization(header: &str) -> Result<Credentials> {
    let header = header.trim();
    if header.is_empty() {
        return Err(Error::CredentialsMalformed("empty Authorization header".into()));
    }

    let (scheme, encoded) = header
        .split_once(' ')
        .ok_or_else(|| Error::CredentialsMalformed("missing credentials".into()))?;

    // Scheme names are case-insensitive
    if !scheme.eq_ignore_ascii_case(BASIC_SCHEME) {
        return Err(Error::CredentialsMalformed(format!(
            "unsupported scheme: {}",
            scheme
        )));
    }

    let decoded = BASE64
        .decode(encoded.trim())
        .map_err(|_| Error::CredentialsMalformed("invalid base64".into()))?;

    let decoded = String::from_utf8(decoded)
        .map_err(|_| Error::CredentialsMalformed("credentials are not UTF-8".into()))?;

    // The password may itself contain ':'
    let (username, password) = decoded
        .split_once(':')
        .ok_or_else(|| Error::CredentialsMalformed("missing ':' separator".into()))?;

    Ok(Credentials::new(username, password))
}

/// Value of the `WWW-Authenticate` header sent with a 401
pub fn challenge(realm: &str) -> String {
    format!("{} realm=\"{}\"", BASIC_SCHEME, realm)
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::HeaderValue;

    fn basic(user_pass: &str) -> String {
        format!("Basic {}", BASE64.encode(user_pass))
    }

    #[test]
    fn test_parse_valid_header() {
        let creds = parse_basic_authorization(&basic("bgates:123")).unwrap();
        assert_eq!(creds.username, "bgates");
        assert_eq!(creds.password, "123");
    }

    #[test]
    fn test_scheme_case_insensitive() {
        let header = format!("bAsIc {}", BASE64.encode("bgates:123"));
        assert!(parse_basic_authorization(&header).is_ok());
    }

    #[test]
    fn test_password_may_contain_colon() {
        let creds = parse_basic_authorization(&basic("bgates:a:b:c")).unwrap();
        assert_eq!(creds.password, "a:b:c");
    }

    #[test]
    fn test_empty_pair_parses_but_is_blank() {
        let creds = parse_basic_authorization(&basic(":")).unwrap();
        assert!(creds.is_blank());

        let creds = parse_basic_authorization(&basic(" : ")).unwrap();
        assert!(creds.is_blank());
    }

    #[test]
    fn test_malformed_headers() {
        let no_separator = basic("no-separator");
        for header in [
            "",
            "Basic",
            "Bearer abc",
            "Basic !!!not-base64!!!",
            no_separator.as_str(),
        ] {
            assert!(
                matches!(
                    parse_basic_authorization(header),
                    Err(Error::CredentialsMalformed(_))
                ),
                "header {:?} should be rejected",
                header
            );
        }
    }

    #[test]
    fn test_extract_from_headers() {
        let mut headers = HeaderMap::new();
        assert!(matches!(
            extract_credentials(&headers),
            Err(Error::CredentialsMalformed(_))
        ));

        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&basic("bgates:123")).unwrap(),
        );
        assert_eq!(
            extract_credentials(&headers).unwrap(),
            Credentials::new("bgates", "123")
        );
    }

    #[test]
    fn test_challenge() {
        assert_eq!(challenge("Realm"), "Basic realm=\"Realm\"");
    }
}
