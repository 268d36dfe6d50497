//! Cookie-carried session ids.

use axum::{
    body::Body,
    extract::State,
    http::{HeaderValue, Request, header::SET_COOKIE},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use tracing::warn;

use crate::application::sessions::{SessionId, SessionStore};

pub const SESSION_COOKIE: &str = "notifier_session";

/// Session of the current request, inserted by [`attach_session`].
#[derive(Debug, Clone, Copy)]
pub struct CurrentSession(pub SessionId);

/// Resolve the visitor's session and hand out a cookie once the session has
/// been written to.
pub async fn attach_session(
    State(store): State<SessionStore>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let jar = CookieJar::from_headers(request.headers());
    let presented = jar.get(SESSION_COOKIE).map(|cookie| cookie.value().to_string());
    let (id, issued) = store.resolve(presented.as_deref());
    request.extensions_mut().insert(CurrentSession(id));

    let mut response = next.run(request).await;

    if issued && store.contains(id) {
        let cookie = Cookie::build((SESSION_COOKIE, id.to_string()))
            .http_only(true)
            .same_site(SameSite::Lax)
            .path("/")
            .build();
        match HeaderValue::from_str(&cookie.to_string()) {
            Ok(value) => {
                response.headers_mut().append(SET_COOKIE, value);
            }
            Err(err) => warn!(
                target = "notifier::http::session",
                error = %err,
                "session cookie could not be encoded"
            ),
        }
    }

    response
}
