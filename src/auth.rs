use axum::{
    extract::{Request, State},
    http::{HeaderMap, HeaderName, HeaderValue},
    middleware::Next,
    response::Response,
};

use crate::error::AuthError;
use crate::metrics::REQUEST_TOTAL;
use crate::models::KeyContext;
use crate::rate_limit::{Decision, Grant};
use crate::state::AppState;

pub const API_KEY_HEADER: &str = "x-api-key";

// Authenticate by X-API-Key and count the request against the key's tier
pub async fn require_api_key(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    REQUEST_TOTAL.inc();

    let api_key = extract_api_key(request.headers()).ok_or(AuthError::MissingKey)?;

    let grant = match state.limiter.check(&api_key) {
        Decision::Allow(grant) => grant,
        Decision::Deny(denial) => return Err(denial.into()),
    };

    request.extensions_mut().insert(KeyContext {
        api_key,
        tier: grant.tier,
    });

    let mut response = next.run(request).await;
    add_rate_limit_headers(response.headers_mut(), &grant);
    Ok(response)
}

fn extract_api_key(headers: &HeaderMap) -> Option<String> {
    headers
        .get(API_KEY_HEADER)
        .and_then(|value| value.to_str().ok())
        .filter(|key| !key.trim().is_empty())
        .map(str::to_string)
}

fn add_rate_limit_headers(headers: &mut HeaderMap, grant: &Grant) {
    headers.insert(
        HeaderName::from_static("x-ratelimit-limit"),
        HeaderValue::from(grant.limit),
    );
    headers.insert(
        HeaderName::from_static("x-ratelimit-remaining"),
        HeaderValue::from(grant.remaining),
    );
    headers.insert(
        HeaderName::from_static("x-ratelimit-reset"),
        HeaderValue::from(grant.reset_at),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tier::Tier;

    #[test]
    fn key_is_passed_through_as_given() {
        let mut headers = HeaderMap::new();
        headers.insert(API_KEY_HEADER, HeaderValue::from_static("demo-free-key-2026"));
        assert_eq!(
            extract_api_key(&headers).as_deref(),
            Some("demo-free-key-2026")
        );

        headers.insert(API_KEY_HEADER, HeaderValue::from_static(" demo-free-key-2026 "));
        assert_eq!(
            extract_api_key(&headers).as_deref(),
            Some(" demo-free-key-2026 ")
        );
    }

    #[test]
    fn blank_or_missing_key_is_none() {
        let mut headers = HeaderMap::new();
        assert_eq!(extract_api_key(&headers), None);

        headers.insert(API_KEY_HEADER, HeaderValue::from_static("   "));
        assert_eq!(extract_api_key(&headers), None);
    }

    #[test]
    fn grant_headers() {
        let mut headers = HeaderMap::new();
        let grant = Grant {
            tier: Tier::Pro,
            limit: 300,
            remaining: 299,
            reset_at: 1_767_225_660,
        };
        add_rate_limit_headers(&mut headers, &grant);

        assert_eq!(headers["x-ratelimit-limit"], "300");
        assert_eq!(headers["x-ratelimit-remaining"], "299");
        assert_eq!(headers["x-ratelimit-reset"], "1767225660");
    }
}
