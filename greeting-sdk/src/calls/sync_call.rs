//! Blocking request/response call

use std::time::Instant;

use log::{debug, info};

use super::{CallRequest, Outcome};
use crate::error::mapping::classify_http_error;
use crate::error::Result;
use crate::services::greeting::CallMode;
use crate::transport::GreetingTransport;
use crate::util::elapsed_secs;

/// Perform one synchronous call: a single submit whose response is the outcome
///
/// No retry happens here; whatever status the service answers with is final.
pub async fn sync_call<T>(transport: &T, request: &CallRequest) -> Result<Outcome>
where
    T: GreetingTransport + ?Sized,
{
    let start_time = Instant::now();
    info!(
        "Making blocking request for {} in {}...",
        request.subject.name, request.language
    );

    let response = transport
        .submit(&request.query(CallMode::Sync), &request.subject)
        .await?;

    info!(
        "Blocking request returned {} in {:.2} seconds",
        response.status.as_u16(),
        elapsed_secs(start_time)
    );

    let outcome = Outcome::from_response(&response);
    if !outcome.is_success() {
        debug!(
            "Blocking request for {} failed with a {} error",
            request.subject.name,
            classify_http_error(outcome.status())
        );
    }

    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ServiceError;
    use crate::services::greeting::Language;
    use crate::transport::{MockGreetingTransport, RawResponse};
    use reqwest::StatusCode;
    use serde_json::json;

    #[tokio::test]
    async fn test_sync_call_sends_sync_mode() {
        let mut transport = MockGreetingTransport::new();
        transport
            .expect_submit()
            .withf(|query, payload| query.mode == CallMode::Sync && payload.name == "Worker #3")
            .times(1)
            .returning(|_, _| {
                Ok(RawResponse::new(
                    StatusCode::OK,
                    json!({"ticket": "t", "metadata": {}, "output": {"greeting": "Hello", "answer_id": 7}})
                        .to_string(),
                ))
            });
        transport.expect_retrieve().never();

        let request = CallRequest::new("Worker #3", 18, Language::English, None);
        let outcome = sync_call(&transport, &request).await.unwrap();

        assert!(outcome.is_success());
    }

    #[tokio::test]
    async fn test_sync_call_propagates_transport_error() {
        let mut transport = MockGreetingTransport::new();
        transport
            .expect_submit()
            .times(1)
            .returning(|_, _| Err(ServiceError::network("Connection refused")));

        let request = CallRequest::new("Worker #0", 18, Language::English, None);
        let result = sync_call(&transport, &request).await;

        assert!(matches!(result, Err(ServiceError::Network(_))));
    }
}
