//! The signed-in member as seen by handlers.
//!
//! Login happens in front of this service; the private session cookie only
//! names the member. Board rights and the active flag are looked up in the
//! [`MemberDirectory`] for every request, so revoking either takes effect
//! without waiting for the cookie to expire.

use actix_session::Session;
use actix_web::{FromRequest, HttpRequest, dev::Payload};
use futures_util::future::LocalBoxFuture;
use tracing::warn;

use crate::domain::{Actor, Error, MemberDirectory, MemberId};

pub(crate) const MEMBER_ID_KEY: &str = "member_id";

/// Handler extractor wrapping the cookie session.
#[derive(Clone)]
pub struct SessionContext(Session);

impl SessionContext {
    pub fn new(session: Session) -> Self {
        Self(session)
    }

    /// Record `member_id` as signed in, replacing whoever was before.
    pub fn sign_in(&self, member_id: MemberId) -> Result<(), Error> {
        self.0.renew();
        self.0
            .insert(MEMBER_ID_KEY, member_id)
            .map_err(|err| Error::internal(format!("cannot write session: {err}")))
    }

    /// The member named by the cookie.
    ///
    /// A value that does not decode as a member id empties the session and
    /// counts as signed out.
    pub fn signed_in_member(&self) -> Result<Option<MemberId>, Error> {
        match self.0.get::<MemberId>(MEMBER_ID_KEY) {
            Ok(member) => Ok(member),
            Err(err) => {
                warn!(error = %err, "discarding unreadable session");
                self.0.purge();
                Ok(None)
            }
        }
    }

    /// `401` unless a member is signed in.
    pub fn require_member(&self) -> Result<MemberId, Error> {
        self.signed_in_member()?
            .ok_or_else(|| Error::unauthorized("login required"))
    }

    pub async fn require_actor(&self, directory: &MemberDirectory) -> Result<Actor, Error> {
        let member_id = self.require_member()?;
        directory.resolve_actor(member_id).await
    }
}

impl FromRequest for SessionContext {
    type Error = actix_web::Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, payload: &mut Payload) -> Self::Future {
        let session = Session::from_request(req, payload);
        Box::pin(async move { session.await.map(Self::new) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::StatusCode;
    use actix_web::{App, HttpResponse, test, web};
    use rstest::rstest;

    use crate::inbound::http::test_utils::{session_cookie, test_session_middleware};

    async fn whoami(session: SessionContext) -> Result<HttpResponse, Error> {
        let member = session.require_member()?;
        Ok(HttpResponse::Ok().body(member.to_string()))
    }

    #[rstest]
    #[actix_web::test]
    async fn signed_in_member_survives_the_next_request() {
        let anna = MemberId::random();
        let app = test::init_service(
            App::new()
                .wrap(test_session_middleware())
                .route(
                    "/sign-in",
                    web::post().to(move |session: SessionContext| async move {
                        session.sign_in(anna)?;
                        Ok::<_, Error>(HttpResponse::NoContent())
                    }),
                )
                .route("/whoami", web::get().to(whoami)),
        )
        .await;

        let signed_in =
            test::call_service(&app, test::TestRequest::post().uri("/sign-in").to_request()).await;
        let res = test::call_service(
            &app,
            test::TestRequest::get()
                .uri("/whoami")
                .cookie(session_cookie(&signed_in))
                .to_request(),
        )
        .await;

        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(test::read_body(res).await, anna.to_string());
    }

    #[rstest]
    #[actix_web::test]
    async fn no_cookie_means_unauthorised() {
        let app = test::init_service(
            App::new()
                .wrap(test_session_middleware())
                .route("/whoami", web::get().to(whoami)),
        )
        .await;

        let res =
            test::call_service(&app, test::TestRequest::get().uri("/whoami").to_request()).await;

        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }

    #[rstest]
    #[actix_web::test]
    async fn garbage_in_the_cookie_signs_the_member_out() {
        let app = test::init_service(
            App::new()
                .wrap(test_session_middleware())
                .route(
                    "/corrupt",
                    web::post().to(|session: Session| async move {
                        session
                            .insert(MEMBER_ID_KEY, 42_u32)
                            .expect("write session value");
                        HttpResponse::NoContent()
                    }),
                )
                .route("/whoami", web::get().to(whoami)),
        )
        .await;

        let corrupted =
            test::call_service(&app, test::TestRequest::post().uri("/corrupt").to_request()).await;
        let res = test::call_service(
            &app,
            test::TestRequest::get()
                .uri("/whoami")
                .cookie(session_cookie(&corrupted))
                .to_request(),
        )
        .await;

        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }
}
