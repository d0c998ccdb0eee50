/// Request credential extraction
///
/// Browsers authenticate with the `access_token` cookie set at login; API
/// clients send `Authorization: Bearer <token>`. The cookie wins when both
/// are present.

use axum::http::{header, HeaderMap};

/// Cookie carrying the access token
pub const ACCESS_COOKIE: &str = "access_token";

/// Cookie carrying the refresh token
pub const REFRESH_COOKIE: &str = "refresh_token";

/// Returns the value of cookie `name` from all `Cookie` headers
///
/// Empty values are treated as absent.
pub fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| key.trim() == name)
        .map(|(_, value)| value.trim().trim_matches('"').to_string())
        .filter(|value| !value.is_empty())
}

/// Returns the token from an `Authorization: Bearer <token>` header
pub fn bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(|token| token.trim().to_string())
        .filter(|token| !token.is_empty())
}

/// Returns the access token, preferring the cookie over the bearer header
pub fn access_token(headers: &HeaderMap) -> Option<String> {
    cookie_value(headers, ACCESS_COOKIE).or_else(|| bearer_token(headers))
}

/// Returns the refresh token cookie
pub fn refresh_token(headers: &HeaderMap) -> Option<String> {
    cookie_value(headers, REFRESH_COOKIE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(pairs: &[(header::HeaderName, &str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.append(name.clone(), HeaderValue::from_str(value).unwrap());
        }
        map
    }

    #[test]
    fn test_cookie_value_among_several() {
        let map = headers(&[(header::COOKIE, "theme=dark; access_token=abc.def.ghi; lang=en")]);
        assert_eq!(cookie_value(&map, ACCESS_COOKIE).as_deref(), Some("abc.def.ghi"));
        assert_eq!(cookie_value(&map, "lang").as_deref(), Some("en"));
        assert!(cookie_value(&map, REFRESH_COOKIE).is_none());
    }

    #[test]
    fn test_cookie_value_across_multiple_headers() {
        let map = headers(&[
            (header::COOKIE, "theme=dark"),
            (header::COOKIE, "refresh_token=r1"),
        ]);
        assert_eq!(refresh_token(&map).as_deref(), Some("r1"));
    }

    #[test]
    fn test_empty_cookie_is_absent() {
        let map = headers(&[(header::COOKIE, "access_token=")]);
        assert!(cookie_value(&map, ACCESS_COOKIE).is_none());
    }

    #[test]
    fn test_bearer_token() {
        let map = headers(&[(header::AUTHORIZATION, "Bearer tok123")]);
        assert_eq!(bearer_token(&map).as_deref(), Some("tok123"));

        let map = headers(&[(header::AUTHORIZATION, "Basic dXNlcjpwYXNz")]);
        assert!(bearer_token(&map).is_none());

        let map = headers(&[(header::AUTHORIZATION, "Bearer ")]);
        assert!(bearer_token(&map).is_none());
    }

    #[test]
    fn test_access_token_prefers_cookie() {
        let map = headers(&[
            (header::COOKIE, "access_token=from-cookie"),
            (header::AUTHORIZATION, "Bearer from-header"),
        ]);
        assert_eq!(access_token(&map).as_deref(), Some("from-cookie"));

        let map = headers(&[(header::AUTHORIZATION, "Bearer from-header")]);
        assert_eq!(access_token(&map).as_deref(), Some("from-header"));

        assert!(access_token(&HeaderMap::new()).is_none());
    }
}
