use actix_web::{HttpResponse, Responder, get, web};

use crate::monitoring::Engine;

/// Register the health routes
pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.service(health_route);
}

/// Health check route
/// This route returns no content, the response status is enough: 200 while
/// the monitor is running, 503 otherwise.
#[get("/")]
pub async fn health_route(engine: web::Data<Engine>) -> impl Responder {
    if engine.is_running() {
        HttpResponse::Ok().finish()
    } else {
        HttpResponse::ServiceUnavailable().finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{App, http::StatusCode, test};
    use std::sync::Arc;
    use std::time::Duration;

    use crate::config::EngineConfig;
    use crate::mail::LogNotifier;
    use crate::monitoring::{CheckMethod, Checker, Observation, StatusSink};

    struct Up;

    #[async_trait::async_trait]
    impl Checker for Up {
        async fn check(&self, _target: &str) -> Observation {
            Observation::new(200, Duration::from_millis(1))
        }
    }

    #[async_trait::async_trait]
    impl StatusSink for Up {
        async fn record(&self, _target: &str, _status_code: u16, _latency: Duration) -> anyhow::Result<()> {
            Ok(())
        }
    }

    fn engine() -> Arc<Engine> {
        let config = EngineConfig {
            targets: vec!["https://example.com".into()],
            interval: Duration::from_secs(60),
            alert_threshold: 3,
            recipients: vec!["ops@example.com".into()],
            request_timeout: Duration::from_secs(1),
            check_method: CheckMethod::Get,
        };
        Arc::new(Engine::with_checker(config, Arc::new(Up), Arc::new(Up), Arc::new(LogNotifier)))
    }

    #[actix_web::test]
    async fn test_health_reflects_engine_state() {
        let engine = engine();
        let app = test::init_service(
            App::new().app_data(web::Data::from(engine.clone())).configure(routes),
        )
        .await;

        let req = test::TestRequest::get().uri("/").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);

        engine.start().unwrap();
        let req = test::TestRequest::get().uri("/").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        engine.stop();
        let req = test::TestRequest::get().uri("/").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
