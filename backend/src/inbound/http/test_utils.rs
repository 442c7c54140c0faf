//! Test helpers for inbound HTTP components.

use std::sync::Arc;

use actix_session::{SessionMiddleware, storage::CookieSessionStore};
use actix_web::cookie::{Cookie, Key};
use actix_web::dev::{ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{App, HttpResponse, test, web};
use chrono::NaiveDate;

use crate::domain::{ApiResult, MemberId};
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;
use crate::test_support::{InMemoryStore, MutableClock};

const LOGIN_PATH: &str = "/test-login";

/// Session middleware with a fresh key and the `Secure` flag off.
pub fn test_session_middleware() -> SessionMiddleware<CookieSessionStore> {
    SessionMiddleware::builder(CookieSessionStore::default(), Key::generate())
        .cookie_name("session".to_owned())
        .cookie_secure(false)
        .build()
}

/// Services over `store` with the clock pinned to noon on `today`.
pub fn http_state(store: &Arc<InMemoryStore>, today: NaiveDate) -> HttpState {
    HttpState::new(store.ports(), Arc::new(MutableClock::at_date(today)))
}

async fn test_login(
    session: SessionContext,
    member: web::Path<MemberId>,
) -> ApiResult<HttpResponse> {
    session.sign_in(member.into_inner())?;
    Ok(HttpResponse::NoContent().finish())
}

/// The full API plus a login shortcut standing in for the upstream auth.
pub fn api_app(
    state: HttpState,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    App::new()
        .wrap(test_session_middleware())
        .app_data(web::Data::new(state))
        .route(
            &format!("{LOGIN_PATH}/{{member_id}}"),
            web::post().to(test_login),
        )
        .service(web::scope("/api/v1").configure(super::configure))
}

/// Request that logs `member` in through [`api_app`].
pub fn login_request(member: MemberId) -> test::TestRequest {
    test::TestRequest::post().uri(&format!("{LOGIN_PATH}/{member}"))
}

/// The session cookie set by `response`.
pub fn session_cookie<B>(response: &ServiceResponse<B>) -> Cookie<'static> {
    response
        .response()
        .cookies()
        .find(|cookie| cookie.name() == "session")
        .map(Cookie::into_owned)
        .expect("session cookie set")
}
