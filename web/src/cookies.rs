use axum::http::header::COOKIE;
use axum::http::HeaderMap;
use cookie::{Cookie, CookieJar};

/// Collect every cookie the client sent into a jar. Unparseable pairs are skipped.
pub(crate) fn cookie_jar(headers: &HeaderMap) -> CookieJar {
    let mut jar = CookieJar::new();
    for value in headers.get_all(COOKIE) {
        let Ok(value) = value.to_str() else {
            continue;
        };
        for cookie in Cookie::split_parse(value).flatten() {
            jar.add_original(cookie.into_owned());
        }
    }
    jar
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_cookie_jar_reads_all_cookie_headers() {
        let mut headers = HeaderMap::new();
        headers.append(COOKIE, HeaderValue::from_static("theme=dark; session=abc"));
        headers.append(COOKIE, HeaderValue::from_static("lang=en"));

        let jar = cookie_jar(&headers);

        assert_eq!(jar.get("session").map(Cookie::value), Some("abc"));
        assert_eq!(jar.get("theme").map(Cookie::value), Some("dark"));
        assert_eq!(jar.get("lang").map(Cookie::value), Some("en"));
    }

    #[test]
    fn test_cookie_jar_is_empty_without_cookie_header() {
        let jar = cookie_jar(&HeaderMap::new());

        assert!(jar.get("session").is_none());
    }
}
