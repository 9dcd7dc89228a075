//! Request identity extraction.
//!
//! A signed-in user arrives with the `X-User-Id` header set by the upstream
//! auth gateway. Everyone else is a guest identified by the `guest_token`
//! cookie; a guest without one is issued a fresh token.

use axum::extract::FromRequestParts;
use axum::http::header::{COOKIE, SET_COOKIE};
use axum::http::request::Parts;
use axum::http::{HeaderMap, HeaderName};
use axum::response::AppendHeaders;
use common::{GuestToken, IdentityEvidence, UserId};
use tower_sessions::cookie::time::Duration;
use tower_sessions::cookie::{Cookie, SameSite};

use crate::error::ApiError;

/// Header carrying the authenticated user id.
pub const USER_ID_HEADER: &str = "x-user-id";

/// Cookie carrying the guest token.
pub const GUEST_COOKIE: &str = "guest_token";

/// Identity of the caller of a request.
#[derive(Debug, Clone)]
pub struct RequestIdentity {
    evidence: IdentityEvidence,
    /// True when the guest token was minted for this request.
    issued: bool,
}

impl RequestIdentity {
    pub fn evidence(&self) -> &IdentityEvidence {
        &self.evidence
    }

    pub fn user_id(&self) -> Option<UserId> {
        self.evidence.user_id()
    }

    /// Returns the signed-in user, or `Unauthorized` for guests.
    pub fn require_user(&self) -> Result<UserId, ApiError> {
        self.user_id()
            .ok_or_else(|| ApiError::Unauthorized("Sign in to access orders".to_string()))
    }

    /// `Set-Cookie` header for a newly issued guest token, if any.
    pub fn set_cookie(&self, max_age_secs: u64) -> AppendHeaders<Option<(HeaderName, String)>> {
        let cookie = match &self.evidence {
            IdentityEvidence::Guest(token) if self.issued => {
                let max_age = i64::try_from(max_age_secs).unwrap_or(i64::MAX);
                let cookie = Cookie::build((GUEST_COOKIE, token.as_str().to_owned()))
                    .max_age(Duration::seconds(max_age))
                    .path("/")
                    .http_only(true)
                    .same_site(SameSite::Lax)
                    .build();
                Some((SET_COOKIE, cookie.to_string()))
            }
            _ => None,
        };
        AppendHeaders(cookie)
    }
}

impl<S: Send + Sync> FromRequestParts<S> for RequestIdentity {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        if let Some(value) = parts.headers.get(USER_ID_HEADER) {
            let user = value
                .to_str()
                .map_err(|_| ApiError::BadRequest("X-User-Id must be ASCII".to_string()))?
                .trim()
                .parse::<UserId>()
                .map_err(|e| ApiError::BadRequest(format!("Invalid X-User-Id: {e}")))?;
            return Ok(Self {
                evidence: IdentityEvidence::User(user),
                issued: false,
            });
        }

        if let Some(token) = guest_cookie(&parts.headers) {
            return Ok(Self {
                evidence: IdentityEvidence::Guest(token),
                issued: false,
            });
        }

        let token = GuestToken::new(uuid::Uuid::new_v4().to_string())
            .map_err(|e| ApiError::Internal(e.to_string()))?;
        tracing::debug!("issuing guest token");
        Ok(Self {
            evidence: IdentityEvidence::Guest(token),
            issued: true,
        })
    }
}

/// Finds a usable `guest_token` cookie among the request's `Cookie` headers.
fn guest_cookie(headers: &HeaderMap) -> Option<GuestToken> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(Cookie::split_parse)
        .filter_map(Result::ok)
        .find(|cookie| cookie.name() == GUEST_COOKIE)
        .and_then(|cookie| GuestToken::new(cookie.value_trimmed()).ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{HeaderValue, Request};

    async fn extract(request: Request<()>) -> Result<RequestIdentity, ApiError> {
        let (mut parts, _) = request.into_parts();
        RequestIdentity::from_request_parts(&mut parts, &()).await
    }

    #[tokio::test]
    async fn test_user_header_wins() {
        let user = UserId::generate();
        let request = Request::builder()
            .header(USER_ID_HEADER, user.to_string())
            .header(COOKIE, "guest_token=abc")
            .body(())
            .unwrap();

        let identity = extract(request).await.unwrap();
        assert_eq!(identity.user_id(), Some(user));
        assert!(identity.set_cookie(60).0.is_none());
    }

    #[tokio::test]
    async fn test_invalid_user_header_is_rejected() {
        let request = Request::builder()
            .header(USER_ID_HEADER, "not-a-uuid")
            .body(())
            .unwrap();
        assert!(matches!(
            extract(request).await,
            Err(ApiError::BadRequest(_))
        ));
    }

    #[tokio::test]
    async fn test_guest_cookie_is_reused() {
        let request = Request::builder()
            .header(COOKIE, "theme=dark; guest_token=g-123; other=1")
            .body(())
            .unwrap();

        let identity = extract(request).await.unwrap();
        assert_eq!(
            identity.evidence(),
            &IdentityEvidence::Guest(GuestToken::new("g-123").unwrap())
        );
        assert!(identity.set_cookie(60).0.is_none());
        assert!(identity.require_user().is_err());
    }

    #[tokio::test]
    async fn test_missing_cookie_issues_token() {
        let identity = extract(Request::builder().body(()).unwrap()).await.unwrap();

        let (name, value) = identity.set_cookie(2_592_000).0.unwrap();
        assert_eq!(name, SET_COOKIE);

        let cookie = Cookie::parse(value).unwrap();
        assert_eq!(cookie.name(), GUEST_COOKIE);
        assert_eq!(
            identity.evidence(),
            &IdentityEvidence::Guest(GuestToken::new(cookie.value()).unwrap())
        );
        assert_eq!(cookie.max_age(), Some(Duration::seconds(2_592_000)));
        assert_eq!(cookie.path(), Some("/"));
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.same_site(), Some(SameSite::Lax));
    }

    #[test]
    fn test_quoted_cookie_value_is_unwrapped() {
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_static("guest_token=\"abc\"; theme=dark"));
        assert_eq!(guest_cookie(&headers), Some(GuestToken::new("abc").unwrap()));
    }

    #[test]
    fn test_cookie_split_across_headers() {
        let mut headers = HeaderMap::new();
        headers.append(COOKIE, HeaderValue::from_static("theme=dark"));
        headers.append(COOKIE, HeaderValue::from_static("guest_token=g-7"));
        assert_eq!(guest_cookie(&headers), Some(GuestToken::new("g-7").unwrap()));
    }

    #[test]
    fn test_blank_cookie_is_ignored() {
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_static("guest_token= "));
        assert!(guest_cookie(&headers).is_none());
    }
}
