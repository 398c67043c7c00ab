//! Mock tests for the dispatcher
//!
//! These tests use WireMock to simulate the greeting service and verify that
//! dispatched calls hit the right endpoints and come back in order.

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use serde_json::json;
    use wiremock::matchers::{body_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use crate::calls::Outcome;
    use crate::config::{DriverConfig, GreetingServiceConfig};
    use crate::dispatch::{aggregate, dispatch, run, DispatchPlan, TransportFailurePolicy};
    use crate::error::ServiceError;
    use crate::resilience::PollPolicy;
    use crate::services::greeting::GreetingClient;

    /// Sets up a mock greeting service
    async fn setup_mock_server() -> MockServer {
        MockServer::start().await
    }

    /// Creates a test client configured to use the mock server
    fn create_test_client(mock_server: &MockServer) -> GreetingClient {
        GreetingClient::builder()
            .base_url(mock_server.uri())
            .timeout(Duration::from_secs(5))
            .build()
            .expect("Failed to build greeting client")
    }

    /// A plan whose async calls re-poll quickly
    fn plan(sync_count: usize, async_count: usize) -> DispatchPlan {
        let mut plan = DispatchPlan::new(sync_count, async_count);
        plan.poll = PollPolicy {
            delay: Duration::from_millis(10),
            max_delay: Duration::from_millis(10),
            ..PollPolicy::default()
        };
        plan
    }

    fn greeting_body(ticket: &str, greeting: &str) -> serde_json::Value {
        json!({
            "ticket": ticket,
            "metadata": {"worker": "w-1"},
            "output": {"greeting": greeting, "answer_id": 1}
        })
    }

    fn error_body(error: &str, status_code: u16) -> serde_json::Value {
        json!({"error": error, "status_code": status_code, "details": {}})
    }

    /// Mounts the submit/retrieve pair for one asynchronous call that is pending once
    async fn mount_async_pending_once(mock_server: &MockServer, ticket: &str) {
        Mock::given(method("POST"))
            .and(path("/request"))
            .and(query_param("async", "true"))
            .respond_with(ResponseTemplate::new(202).set_body_json(json!({"ticket": ticket, "metadata": {}})))
            .mount(mock_server)
            .await;

        Mock::given(method("GET"))
            .and(path("/retrieve"))
            .and(query_param("ticket", ticket))
            .respond_with(ResponseTemplate::new(408).set_body_json(error_body("RequestTimeout", 408)))
            .up_to_n_times(1)
            .mount(mock_server)
            .await;

        Mock::given(method("GET"))
            .and(path("/retrieve"))
            .and(query_param("ticket", ticket))
            .respond_with(ResponseTemplate::new(200).set_body_json(greeting_body(ticket, "Hello, Worker #0")))
            .mount(mock_server)
            .await;
    }

    #[tokio::test]
    async fn test_sync_calls_all_succeed() {
        let mock_server = setup_mock_server().await;

        Mock::given(method("POST"))
            .and(path("/request"))
            .and(query_param("async", "false"))
            .and(query_param("language", "en"))
            .and(query_param("timeout", "180"))
            .respond_with(ResponseTemplate::new(200).set_body_json(greeting_body("t", "Hello")))
            .expect(2)
            .mount(&mock_server)
            .await;

        let client = create_test_client(&mock_server);
        let outcomes = dispatch(&client, &plan(2, 0)).await.unwrap();
        let result = aggregate(outcomes);

        assert_eq!(result.summary.successes, 2);
        assert_eq!(result.summary.failures, 0);
        assert!((result.summary.success_ratio - 1.0).abs() < f64::EPSILON);
        assert_eq!(result.summary.distinct_greetings, 1);
    }

    #[tokio::test]
    async fn test_async_call_polls_until_ready() {
        let mock_server = setup_mock_server().await;
        mount_async_pending_once(&mock_server, "abc").await;

        let client = create_test_client(&mock_server);
        let outcomes = dispatch(&client, &plan(0, 1)).await.unwrap();

        assert_eq!(outcomes.len(), 1);
        assert!(outcomes[0].is_success());

        let requests = mock_server.received_requests().await.unwrap();
        let polls: Vec<_> = requests.iter().filter(|r| r.url.path() == "/retrieve").collect();
        assert_eq!(polls.len(), 2);
        for poll in polls {
            let ticket = poll.url.query_pairs().find(|(key, _)| key == "ticket").map(|(_, v)| v.into_owned());
            let timeout = poll.url.query_pairs().find(|(key, _)| key == "timeout").map(|(_, v)| v.into_owned());
            assert_eq!(ticket.as_deref(), Some("abc"));
            assert_eq!(timeout.as_deref(), Some("5"));
        }

        let submits = requests.iter().filter(|r| r.url.path() == "/request").count();
        assert_eq!(submits, 1);
    }

    #[tokio::test]
    async fn test_mixed_results() {
        let mock_server = setup_mock_server().await;

        Mock::given(method("POST"))
            .and(path("/request"))
            .and(query_param("async", "false"))
            .respond_with(ResponseTemplate::new(500).set_body_json(error_body("InternalServerError", 500)))
            .mount(&mock_server)
            .await;
        mount_async_pending_once(&mock_server, "abc").await;

        let client = create_test_client(&mock_server);
        let outcomes = dispatch(&client, &plan(1, 1)).await.unwrap();

        assert_eq!(outcomes[0].status(), 500);
        assert!(outcomes[1].is_success());

        let result = aggregate(outcomes);
        assert!((result.summary.success_ratio - 0.5).abs() < f64::EPSILON);
        assert_eq!(result.failures[0].error, "InternalServerError");
    }

    #[tokio::test]
    async fn test_outcomes_keep_construction_order() {
        let mock_server = setup_mock_server().await;

        Mock::given(method("POST"))
            .and(path("/request"))
            .and(body_json(json!({"name": "Worker #0", "age": 18})))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(greeting_body("t0", "slow"))
                    .set_delay(Duration::from_millis(200)),
            )
            .mount(&mock_server)
            .await;

        Mock::given(method("POST"))
            .and(path("/request"))
            .and(body_json(json!({"name": "Worker #1", "age": 18})))
            .respond_with(ResponseTemplate::new(200).set_body_json(greeting_body("t1", "fast")))
            .mount(&mock_server)
            .await;

        let client = create_test_client(&mock_server);
        let outcomes = dispatch(&client, &plan(2, 0)).await.unwrap();

        let greetings: Vec<_> = outcomes
            .iter()
            .map(|outcome| match outcome {
                Outcome::Success(envelope) => envelope.output.greeting.clone(),
                other => panic!("expected success, got {:?}", other),
            })
            .collect();
        assert_eq!(greetings, vec!["slow", "fast"]);
    }

    #[tokio::test]
    async fn test_max_in_flight_still_runs_every_call() {
        let mock_server = setup_mock_server().await;

        Mock::given(method("POST"))
            .and(path("/request"))
            .respond_with(ResponseTemplate::new(200).set_body_json(greeting_body("t", "Hello")))
            .expect(3)
            .mount(&mock_server)
            .await;

        let client = create_test_client(&mock_server);
        let mut plan = plan(3, 0);
        plan.max_in_flight = Some(1);

        let outcomes = dispatch(&client, &plan).await.unwrap();

        assert_eq!(outcomes.len(), 3);
        assert!(outcomes.iter().all(Outcome::is_success));
    }

    #[tokio::test]
    async fn test_zero_max_in_flight_is_rejected() {
        let mock_server = setup_mock_server().await;
        let client = create_test_client(&mock_server);
        let mut plan = plan(1, 0);
        plan.max_in_flight = Some(0);

        let result = dispatch(&client, &plan).await;

        assert!(matches!(result, Err(ServiceError::Validation(_))));
    }

    #[tokio::test]
    async fn test_invalid_poll_policy_is_rejected() {
        let mock_server = setup_mock_server().await;
        let client = create_test_client(&mock_server);
        let mut plan = plan(0, 1);
        plan.poll.multiplier = 0.5;

        let result = dispatch(&client, &plan).await;

        assert!(matches!(result, Err(ServiceError::Configuration(_))));
        assert!(mock_server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_empty_plan_makes_no_requests() {
        let mock_server = setup_mock_server().await;
        let client = create_test_client(&mock_server);

        let outcomes = dispatch(&client, &plan(0, 0)).await.unwrap();
        let result = aggregate(outcomes);

        assert_eq!(result.summary.total, 0);
        assert_eq!(result.summary.success_ratio, 0.0);
        assert!(mock_server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_transport_failure_is_isolated() {
        let client = GreetingClient::builder()
            .base_url("http://127.0.0.1:1")
            .build()
            .expect("Failed to build greeting client");

        let outcomes = dispatch(&client, &plan(1, 1)).await.unwrap();

        assert_eq!(outcomes.len(), 2);
        for (index, outcome) in outcomes.iter().enumerate() {
            match outcome {
                Outcome::Failure { status, error } => {
                    assert_eq!(*status, 0);
                    assert_eq!(error.error, "NetworkError");
                    assert_eq!(error.details["call"], index.to_string());
                }
                other => panic!("expected failure, got {:?}", other),
            }
        }
    }

    #[tokio::test]
    async fn test_transport_failure_aborts_dispatch() {
        let client = GreetingClient::builder()
            .base_url("http://127.0.0.1:1")
            .build()
            .expect("Failed to build greeting client");

        let mut plan = plan(2, 0);
        plan.failure_policy = TransportFailurePolicy::Abort;

        let result = dispatch(&client, &plan).await;

        assert!(matches!(result, Err(ref e) if e.kind() == "NetworkError"));
    }

    #[tokio::test]
    async fn test_status_endpoint() {
        let mock_server = setup_mock_server().await;

        Mock::given(method("GET"))
            .and(path("/status"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"metadata": {}, "request_count": 12, "ticket_count": 3})),
            )
            .mount(&mock_server)
            .await;

        let client = create_test_client(&mock_server);
        let status = client.status().await.unwrap();

        assert_eq!(status.request_count, 12);
        assert_eq!(status.ticket_count, 3);
    }

    #[tokio::test]
    async fn test_run_checks_status_and_aggregates() {
        let mock_server = setup_mock_server().await;

        Mock::given(method("GET"))
            .and(path("/status"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"metadata": {}, "request_count": 0, "ticket_count": 0})),
            )
            .expect(1)
            .mount(&mock_server)
            .await;

        Mock::given(method("POST"))
            .and(path("/request"))
            .and(query_param("async", "false"))
            .respond_with(ResponseTemplate::new(200).set_body_json(greeting_body("t", "Hola")))
            .mount(&mock_server)
            .await;
        mount_async_pending_once(&mock_server, "abc").await;

        let config = DriverConfig {
            service: GreetingServiceConfig {
                base_url: mock_server.uri(),
                ..GreetingServiceConfig::default()
            },
            check_status: true,
            ..DriverConfig::default()
        };
        let plan = {
            let mut plan = DispatchPlan::from_config(1, 1, &config);
            plan.poll = PollPolicy::bounded(5, Duration::from_millis(10));
            plan
        };

        let result = run(&config, &plan).await.unwrap();

        assert_eq!(result.summary.total, 2);
        assert_eq!(result.summary.successes, 2);
        assert_eq!(result.summary.distinct_greetings, 2);
    }
}
