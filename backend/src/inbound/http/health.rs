//! Kubernetes-style probes.
//!
//! The server moves through three phases: starting (migrations, binding),
//! serving, and draining after a shutdown signal. Readiness holds only while
//! serving; liveness fails once draining begins so the pod is not restarted
//! into the middle of its own shutdown.

use std::sync::atomic::{AtomicU8, Ordering};

use actix_web::{HttpResponse, get, http::header, web};
use tracing::debug;

const STARTING: u8 = 0;
const SERVING: u8 = 1;
const DRAINING: u8 = 2;

/// Lifecycle phase shared between the server and the health handlers.
pub struct HealthState {
    phase: AtomicU8,
}

impl Default for HealthState {
    fn default() -> Self {
        Self {
            phase: AtomicU8::new(STARTING),
        }
    }
}

impl HealthState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starting to serving. Has no effect once draining.
    pub fn mark_ready(&self) {
        if self
            .phase
            .compare_exchange(STARTING, SERVING, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            debug!("ignoring readiness while draining");
        }
    }

    pub fn begin_draining(&self) {
        self.phase.store(DRAINING, Ordering::Release);
    }

    pub fn is_ready(&self) -> bool {
        self.phase.load(Ordering::Acquire) == SERVING
    }

    pub fn is_alive(&self) -> bool {
        self.phase.load(Ordering::Acquire) != DRAINING
    }
}

fn health_response(ok: bool) -> HttpResponse {
    let mut response = if ok {
        HttpResponse::Ok()
    } else {
        HttpResponse::ServiceUnavailable()
    };
    response
        .insert_header((header::CACHE_CONTROL, "no-store"))
        .finish()
}

#[utoipa::path(
    get,
    path = "/health/ready",
    tags = ["health"],
    security([]),
    responses(
        (status = 200, description = "Serving requests"),
        (status = 503, description = "Starting up or draining")
    )
)]
#[get("/health/ready")]
pub async fn ready(state: web::Data<HealthState>) -> HttpResponse {
    health_response(state.is_ready())
}

#[utoipa::path(
    get,
    path = "/health/live",
    tags = ["health"],
    security([]),
    responses(
        (status = 200, description = "Process is alive"),
        (status = 503, description = "Draining after a shutdown signal")
    )
)]
#[get("/health/live")]
pub async fn live(state: web::Data<HealthState>) -> HttpResponse {
    health_response(state.is_alive())
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::StatusCode;
    use actix_web::App;
    use rstest::rstest;

    async fn statuses(state: &web::Data<HealthState>) -> (StatusCode, StatusCode) {
        let app =
            actix_web::test::init_service(App::new().app_data(state.clone()).service(ready).service(live))
                .await;
        let ready_res = actix_web::test::call_service(
            &app,
            actix_web::test::TestRequest::get().uri("/health/ready").to_request(),
        )
        .await;
        assert_eq!(
            ready_res.headers().get(header::CACHE_CONTROL).map(|v| v.as_bytes()),
            Some(&b"no-store"[..])
        );
        let live_res = actix_web::test::call_service(
            &app,
            actix_web::test::TestRequest::get().uri("/health/live").to_request(),
        )
        .await;
        (ready_res.status(), live_res.status())
    }

    #[rstest]
    #[actix_web::test]
    async fn health_endpoints_follow_the_lifecycle() {
        let state = web::Data::new(HealthState::new());
        assert_eq!(
            statuses(&state).await,
            (StatusCode::SERVICE_UNAVAILABLE, StatusCode::OK)
        );

        state.mark_ready();
        assert_eq!(statuses(&state).await, (StatusCode::OK, StatusCode::OK));

        state.begin_draining();
        assert_eq!(
            statuses(&state).await,
            (StatusCode::SERVICE_UNAVAILABLE, StatusCode::SERVICE_UNAVAILABLE)
        );
    }

    #[rstest]
    fn a_draining_server_never_becomes_ready_again() {
        let state = HealthState::new();
        state.begin_draining();

        state.mark_ready();

        assert!(!state.is_ready());
    }
}
