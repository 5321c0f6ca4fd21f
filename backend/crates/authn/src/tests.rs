//! End-to-end tests for the authentication pipeline
//! Drives assembled filters with scripted modules.

#[cfg(test)]
mod pipeline_tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use axum::body::Body;
    use http::header::{ACCEPT, CONTENT_TYPE};
    use http::{Request, Response, StatusCode};
    use http_body_util::BodyExt;
    use serde_json::{Value, json};

    use crate::application::config::{AuthnConfig, ModuleConfig};
    use crate::application::filter::AuthenticationFilter;
    use crate::domain::audit_api::AuditApi;
    use crate::domain::auth_context::MessageType;
    use crate::domain::authenticated_request::AuthenticatedRequest;
    use crate::domain::outcome::{Outcome, Phase};
    use crate::error::AuthError;
    use crate::infra::audit::InMemoryAuditApi;
    use crate::presentation::negotiation::ResponseHandler;
    use crate::test_support::{CallLog, MockModule};

    fn request() -> Request<Body> {
        Request::builder()
            .uri("/resource")
            .header("x-transaction-id", "tx-1")
            .body(Body::empty())
            .unwrap()
    }

    fn single(module: MockModule) -> AuthenticationFilter {
        AuthenticationFilter::builder()
            .auth_module(module, ModuleConfig::new())
            .build()
            .unwrap()
    }

    /// Handler that counts its calls and answers `200 resource`
    async fn run<A>(filter: &AuthenticationFilter<A>, request: Request<Body>) -> (Response<Body>, usize)
    where
        A: AuditApi + Send + Sync + 'static,
    {
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();
        let response = filter
            .process_message(request, move |_req| async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Response::new(Body::from("resource"))
            })
            .await;
        (response, hits.load(Ordering::SeqCst))
    }

    async fn body_string(response: Response<Body>) -> String {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    async fn body_json(response: Response<Body>) -> Value {
        serde_json::from_str(&body_string(response).await).unwrap()
    }

    #[tokio::test]
    async fn test_successful_round_trip() {
        let log = CallLog::default();
        let filter = single(MockModule::new("basic").with_log(&log));

        let (response, hits) = run(&filter, request()).await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(hits, 1);
        assert_eq!(body_string(response).await, "resource");
        assert_eq!(
            log.calls(),
            vec![
                ("basic".to_string(), Phase::ValidateRequest),
                ("basic".to_string(), Phase::SecureResponse),
                ("basic".to_string(), Phase::CleanSubject),
            ]
        );
    }

    #[tokio::test]
    async fn test_validate_failure_is_access_denied() {
        let log = CallLog::default();
        let filter = single(
            MockModule::new("basic")
                .validate_returns(Outcome::ResponseFailure)
                .with_log(&log),
        );

        let (response, hits) = run(&filter, request()).await;

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(hits, 0);
        assert_eq!(log.count("basic", Phase::SecureResponse), 0);
        assert_eq!(log.count("basic", Phase::CleanSubject), 1);
        let body = body_json(response).await;
        assert_eq!(body["code"], 401);
        assert_eq!(body["message"], "Access Denied");
    }

    #[tokio::test]
    async fn test_secure_failure_is_server_error() {
        let log = CallLog::default();
        let filter = single(
            MockModule::new("basic")
                .secure_returns(Outcome::ResponseFailure)
                .with_log(&log),
        );

        let (response, hits) = run(&filter, request()).await;

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(hits, 1);
        assert_eq!(log.count("basic", Phase::CleanSubject), 1);
    }

    #[tokio::test]
    async fn test_incomplete_returns_module_response() {
        let log = CallLog::default();
        let filter = single(
            MockModule::new("basic")
                .validate_returns(Outcome::ResponseIncomplete)
                .writes_status(StatusCode::UNAUTHORIZED)
                .with_log(&log),
        );

        let (response, hits) = run(&filter, request()).await;

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(hits, 0);
        assert_eq!(log.count("basic", Phase::SecureResponse), 0);
        assert_eq!(log.count("basic", Phase::CleanSubject), 1);
    }

    #[tokio::test]
    async fn test_response_authenticated_still_reaches_handler() {
        let log = CallLog::default();
        let filter = single(
            MockModule::new("basic")
                .validate_returns(Outcome::ResponseAuthenticated)
                .with_principal("alice")
                .with_log(&log),
        );

        let response = filter
            .process_message(request(), |req: Request<Body>| {
                let has_extension = req.extensions().get::<AuthenticatedRequest>().is_some();
                async move { Response::new(Body::from(has_extension.to_string())) }
            })
            .await;

        assert_eq!(body_string(response).await, "false");
        assert_eq!(log.count("basic", Phase::SecureResponse), 1);
    }

    #[tokio::test]
    async fn test_invalid_and_failed_validation_are_rendered() {
        let log = CallLog::default();
        let filter = single(
            MockModule::new("basic")
                .validate_returns(Outcome::ProtocolError)
                .with_log(&log),
        );
        let (response, hits) = run(&filter, request()).await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(hits, 0);
        assert_eq!(log.count("basic", Phase::CleanSubject), 1);
        let body = body_json(response).await;
        assert_eq!(
            body["message"],
            "Invalid outcome returned from validate_request: PROTOCOL_ERROR"
        );

        let log = CallLog::default();
        let filter = single(
            MockModule::new("basic")
                .validate_error(AuthError::MalformedRequest("token".into()))
                .with_log(&log),
        );
        let (response, hits) = run(&filter, request()).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(hits, 0);
        assert_eq!(log.count("basic", Phase::SecureResponse), 0);
        assert_eq!(log.count("basic", Phase::CleanSubject), 1);
    }

    #[tokio::test]
    async fn test_authenticated_from_secure_is_rendered() {
        let log = CallLog::default();
        let filter = AuthenticationFilter::builder()
            .auth_module(
                MockModule::new("basic")
                    .secure_returns(Outcome::Authenticated)
                    .with_log(&log),
                ModuleConfig::new(),
            )
            .response_handler(ResponseHandler::standard())
            .build()
            .unwrap();

        let (response, hits) = run(&filter, request()).await;
        assert_eq!(hits, 1);
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(response.headers()[CONTENT_TYPE], "application/json");
        assert_eq!(
            body_json(response).await["message"],
            "Invalid outcome returned from secure_response: AUTHENTICATED"
        );

        let mut request = request();
        request
            .headers_mut()
            .insert(ACCEPT, "text/xml".parse().unwrap());
        let (response, _) = run(&filter, request).await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(response.headers()[CONTENT_TYPE], "text/xml");
        assert!(body_string(response).await.contains(
            "<message>Invalid outcome returned from secure_response: AUTHENTICATED</message>"
        ));

        assert_eq!(log.count("basic", Phase::SecureResponse), 2);
        assert_eq!(log.count("basic", Phase::CleanSubject), 2);
    }

    #[tokio::test]
    async fn test_secure_error_is_rendered() {
        let filter = single(MockModule::new("basic").secure_fails("signing key missing"));
        let (response, hits) = run(&filter, request()).await;

        assert_eq!(hits, 1);
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_json(response).await["message"], "signing key missing");
    }

    #[tokio::test]
    async fn test_error_representation_follows_accept() {
        let filter = AuthenticationFilter::builder()
            .auth_module(
                MockModule::new("basic").validate_returns(Outcome::ResponseFailure),
                ModuleConfig::new(),
            )
            .response_handler(ResponseHandler::standard())
            .build()
            .unwrap();

        let mut request = request();
        request
            .headers_mut()
            .insert(ACCEPT, "application/json; q=0.8, application/xml".parse().unwrap());
        let (response, _) = run(&filter, request).await;

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(response.headers()[CONTENT_TYPE], "application/xml");
        assert!(body_string(response).await.contains("<message>Access Denied</message>"));
    }

    #[tokio::test]
    async fn test_initialization_failure_is_reported_every_time() {
        let log = CallLog::default();
        let filter = AuthenticationFilter::builder()
            .auth_module(
                MockModule::new("basic").init_fails("no key store").with_log(&log),
                ModuleConfig::new(),
            )
            .config(AuthnConfig::development())
            .build()
            .unwrap();

        for _ in 0..2 {
            let (response, hits) = run(&filter, request()).await;
            assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
            assert_eq!(hits, 0);
            let body = body_json(response).await;
            assert_eq!(
                body["message"],
                "Failed to initialize auth module basic: no key store"
            );
            assert_eq!(body["detail"]["moduleId"], "basic");
        }

        assert_eq!(log.initialized("basic"), 1);
        assert!(log.calls().is_empty());
        assert!(matches!(
            filter.initialize().await,
            Err(AuthError::Initialization { .. })
        ));
    }

    #[tokio::test]
    async fn test_modules_initialize_once() {
        let log = CallLog::default();
        let filter = AuthenticationFilter::builder()
            .session_module(MockModule::new("session").with_log(&log), ModuleConfig::new())
            .auth_module(MockModule::new("basic").with_log(&log), ModuleConfig::new())
            .build()
            .unwrap();

        filter.initialize().await.unwrap();
        run(&filter, request()).await;
        run(&filter, request()).await;

        assert_eq!(log.initialized("session"), 1);
        assert_eq!(log.initialized("basic"), 1);
    }

    #[tokio::test]
    async fn test_clean_failure_does_not_change_response() {
        let filter = single(MockModule::new("basic").clean_fails("subject busy"));
        let (response, hits) = run(&filter, request()).await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(hits, 1);
    }

    #[tokio::test]
    async fn test_authenticated_request_reaches_handler() {
        let filter = single(MockModule::new("basic").with_principal("alice"));

        let response = filter
            .process_message(request(), |req: Request<Body>| {
                let principal = req
                    .extensions()
                    .get::<AuthenticatedRequest>()
                    .and_then(|auth| auth.principal.clone());
                async move { Response::new(Body::from(principal.unwrap_or_default())) }
            })
            .await;

        assert_eq!(body_string(response).await, "alice");
    }

    #[tokio::test]
    async fn test_authenticated_principal_comes_from_client_subject() {
        let audit = Arc::new(InMemoryAuditApi::new());
        let filter = AuthenticationFilter::builder()
            .auth_module(
                MockModule::new("cert").with_principal("carol").subject_only(),
                ModuleConfig::new(),
            )
            .shared_audit_api(audit.clone())
            .build()
            .unwrap();

        let response = filter
            .process_message(request(), |req: Request<Body>| {
                let principal = req
                    .extensions()
                    .get::<AuthenticatedRequest>()
                    .and_then(|auth| auth.principal.clone());
                async move { Response::new(Body::from(principal.unwrap_or_default())) }
            })
            .await;

        assert_eq!(body_string(response).await, "carol");
        assert_eq!(audit.records()[0]["principal"], json!(["carol"]));
    }

    #[tokio::test]
    async fn test_audit_document_per_request() {
        let audit = Arc::new(InMemoryAuditApi::new());
        let filter = AuthenticationFilter::builder()
            .session_module(
                MockModule::new("session").validate_returns(Outcome::ResponseFailure),
                ModuleConfig::new(),
            )
            .auth_modules([
                (
                    MockModule::new("one")
                        .validate_returns(Outcome::ResponseFailure)
                        .with_failure_reason(json!({ "header": "missing" })),
                    ModuleConfig::new(),
                ),
                (
                    MockModule::new("two")
                        .with_principal("bob")
                        .with_info("ip", "10.0.0.1"),
                    ModuleConfig::new(),
                ),
            ])
            .shared_audit_api(audit.clone())
            .build()
            .unwrap();

        let (response, _) = run(&filter, request()).await;
        assert_eq!(response.status(), StatusCode::OK);

        let records = audit.records();
        assert_eq!(records.len(), 1);
        let record = &records[0];
        assert_eq!(record["transactionId"], "tx-1");
        assert_eq!(record["result"], "SUCCESSFUL");
        assert_eq!(record["principal"], json!(["bob"]));

        let entries = record["entries"].as_array().unwrap();
        let ids: Vec<&str> = entries
            .iter()
            .map(|entry| entry["moduleId"].as_str().unwrap())
            .collect();
        assert_eq!(ids, vec!["session", "one", "two"]);
        assert_eq!(entries[1]["result"], "FAILED");
        assert_eq!(entries[1]["reason"]["header"], "missing");
        assert_eq!(entries[2]["info"]["ip"], "10.0.0.1");
        assert_eq!(entries[2]["info"]["principal"], "bob");
    }

    #[tokio::test]
    async fn test_failed_request_is_audited_as_failed() {
        let audit = Arc::new(InMemoryAuditApi::new());
        let filter = AuthenticationFilter::builder()
            .auth_module(
                MockModule::new("basic").validate_returns(Outcome::ResponseFailure),
                ModuleConfig::new(),
            )
            .shared_audit_api(audit.clone())
            .build()
            .unwrap();

        run(&filter, request()).await;

        let records = audit.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0]["result"], "FAILED");
        assert!(records[0].get("principal").is_none());
    }

    #[tokio::test]
    async fn test_audit_sink_failure_does_not_fail_request() {
        let filter = AuthenticationFilter::builder()
            .auth_module(MockModule::new("basic"), ModuleConfig::new())
            .audit_api(InMemoryAuditApi::failing())
            .build()
            .unwrap();

        let (response, hits) = run(&filter, request()).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(hits, 1);
    }

    #[test]
    fn test_modules_without_http_support_are_rejected() {
        let result = AuthenticationFilter::builder()
            .auth_module(
                MockModule::new("soap").with_message_types(vec![MessageType::HttpRequest]),
                ModuleConfig::new(),
            )
            .build();

        match result {
            Err(AuthError::UnsupportedMessageTypes { module_id }) => assert_eq!(module_id, "soap"),
            Err(other) => panic!("unexpected error: {other:?}"),
            Ok(_) => panic!("module without response support was accepted"),
        }
    }
}

#[cfg(test)]
mod middleware_tests {
    use axum::body::Body;
    use axum::routing::get;
    use axum::{Extension, Router, middleware};
    use http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    use crate::application::config::ModuleConfig;
    use crate::application::filter::AuthenticationFilter;
    use crate::domain::authenticated_request::AuthenticatedRequest;
    use crate::domain::outcome::Outcome;
    use crate::infra::audit::TracingAuditApi;
    use crate::presentation::middleware::authenticate;
    use crate::test_support::MockModule;

    async fn whoami(Extension(auth): Extension<AuthenticatedRequest>) -> String {
        auth.principal().unwrap_or("anonymous").to_string()
    }

    fn app(module: MockModule) -> Router {
        let filter = AuthenticationFilter::builder()
            .auth_module(module, ModuleConfig::new())
            .build()
            .unwrap();
        Router::new()
            .route("/whoami", get(whoami))
            .layer(middleware::from_fn_with_state(
                filter,
                authenticate::<TracingAuditApi>,
            ))
    }

    fn get_whoami() -> Request<Body> {
        Request::builder().uri("/whoami").body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn test_middleware_passes_principal() {
        let response = app(MockModule::new("basic").with_principal("alice"))
            .oneshot(get_whoami())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&bytes[..], b"alice");
    }

    #[tokio::test]
    async fn test_middleware_rejects_unauthenticated() {
        let response = app(MockModule::new("basic").validate_returns(Outcome::ResponseFailure))
            .oneshot(get_whoami())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
