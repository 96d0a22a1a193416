/*!
 * Tests for the resilient call layer: retries, backoff classification,
 * refusal escalation, and the typed terminal error
 */

use std::sync::Arc;

use chapterwise::errors::{CallError, ProviderError, ValidationError};
use chapterwise::providers::mock::{MockOutcome, MockProvider};
use chapterwise::providers::GenerationRequest;
use chapterwise::translation::call_layer::{CallCandidate, ResilientCaller};

use crate::common;

fn single_candidate(mock: Arc<MockProvider>) -> ResilientCaller {
    ResilientCaller::new(
        vec![CallCandidate::new(mock, "mock-model")],
        common::fast_retry(),
    )
}

#[tokio::test]
async fn test_execute_withWorkingProvider_shouldReturnFirstResponse() {
    let mock = Arc::new(MockProvider::scripted(vec![MockOutcome::Text(
        "hello".to_string(),
    )]));
    let caller = single_candidate(mock.clone());

    let response = caller
        .execute(&GenerationRequest::new("prompt"))
        .await
        .unwrap();
    assert_eq!(response.text, "hello");
    assert_eq!(mock.request_count(), 1);
}

#[tokio::test]
async fn test_execute_withTransientFailures_shouldRetrySameCandidate() {
    let mock = Arc::new(MockProvider::scripted(vec![
        MockOutcome::Transient("net down".to_string()),
        MockOutcome::Transient("net still down".to_string()),
        MockOutcome::Text("recovered".to_string()),
    ]));
    let caller = single_candidate(mock.clone());

    let response = caller
        .execute(&GenerationRequest::new("prompt"))
        .await
        .unwrap();
    assert_eq!(response.text, "recovered");
    assert_eq!(mock.request_count(), 3);
}

#[tokio::test]
async fn test_execute_withRateLimitThenSuccess_shouldRecover() {
    let mock = Arc::new(MockProvider::scripted(vec![
        MockOutcome::RateLimited("quota".to_string()),
        MockOutcome::Text("ok".to_string()),
    ]));
    let caller = single_candidate(mock.clone());

    let response = caller
        .execute(&GenerationRequest::new("prompt"))
        .await
        .unwrap();
    assert_eq!(response.text, "ok");
    assert_eq!(mock.request_count(), 2);
}

#[tokio::test]
async fn test_execute_withRefusal_shouldSkipToNextCandidateWithoutRetrying() {
    let refusing = Arc::new(MockProvider::refusing().named("refuser"));
    let working = Arc::new(MockProvider::scripted(vec![MockOutcome::Text(
        "fallback answer".to_string(),
    )]));
    let caller = ResilientCaller::new(
        vec![
            CallCandidate::new(refusing.clone(), "model-a"),
            CallCandidate::new(working.clone(), "model-b"),
        ],
        common::fast_retry(),
    );

    let response = caller
        .execute(&GenerationRequest::new("prompt"))
        .await
        .unwrap();
    assert_eq!(response.text, "fallback answer");
    // A refusal must never be retried on the same candidate
    assert_eq!(refusing.request_count(), 1);
    assert_eq!(working.request_count(), 1);
}

#[tokio::test]
async fn test_execute_withAuthFailure_shouldSkipToNextCandidateWithoutRetrying() {
    let locked_out = Arc::new(
        MockProvider::with_responder(|_| {
            Err(ProviderError::AuthenticationError("bad key".to_string()))
        })
        .named("locked-out"),
    );
    let working = Arc::new(MockProvider::scripted(vec![MockOutcome::Text(
        "fallback answer".to_string(),
    )]));
    let caller = ResilientCaller::new(
        vec![
            CallCandidate::new(locked_out.clone(), "model-a"),
            CallCandidate::new(working.clone(), "model-b"),
        ],
        common::fast_retry(),
    );

    let response = caller
        .execute(&GenerationRequest::new("prompt"))
        .await
        .unwrap();
    assert_eq!(response.text, "fallback answer");
    // A bad credential never improves with retries
    assert_eq!(locked_out.request_count(), 1);
}

#[tokio::test]
async fn test_execute_withAllCandidatesFailing_shouldReturnExhausted() {
    let mock = Arc::new(MockProvider::failing());
    let caller = single_candidate(mock.clone());

    let result = caller.execute(&GenerationRequest::new("prompt")).await;
    match result {
        Err(CallError::Exhausted { candidates, .. }) => assert_eq!(candidates, 1),
        Ok(_) => panic!("expected exhaustion"),
    }
    // Full retry budget spent before giving up
    assert_eq!(mock.request_count(), 3);
}

#[tokio::test]
async fn test_executeParsed_withStructuralViolation_shouldRetryUntilValid() {
    let mock = Arc::new(MockProvider::scripted(vec![
        MockOutcome::Text("garbage".to_string()),
        MockOutcome::Text("valid".to_string()),
    ]));
    let caller = single_candidate(mock.clone());

    let value = caller
        .execute_parsed(&GenerationRequest::new("prompt"), |response| {
            if response.text == "valid" {
                Ok(response.text.clone())
            } else {
                Err(ValidationError::MissingMarkers)
            }
        })
        .await
        .unwrap();
    assert_eq!(value, "valid");
    assert_eq!(mock.request_count(), 2);
}

#[tokio::test]
async fn test_executeParsed_withPersistentViolation_shouldFallBackThenExhaust() {
    let first = Arc::new(MockProvider::working().named("first"));
    let second = Arc::new(MockProvider::working().named("second"));
    let caller = ResilientCaller::new(
        vec![
            CallCandidate::new(first.clone(), "model-a"),
            CallCandidate::new(second.clone(), "model-b"),
        ],
        common::fast_retry(),
    );

    let result: Result<String, _> = caller
        .execute_parsed(&GenerationRequest::new("prompt"), |_| {
            Err(ValidationError::MissingMarkers)
        })
        .await;
    assert!(matches!(result, Err(CallError::Exhausted { candidates: 2, .. })));
    assert_eq!(first.request_count(), 3);
    assert_eq!(second.request_count(), 3);
}

#[tokio::test]
async fn test_execute_withCandidateModel_shouldOverrideRequestModel() {
    let mock = Arc::new(MockProvider::working());
    let caller = single_candidate(mock.clone());

    caller
        .execute(&GenerationRequest::new("prompt").model("ignored-model"))
        .await
        .unwrap();
    assert_eq!(mock.requests()[0].model, "mock-model");
}

#[tokio::test]
async fn test_execute_withSanitizedCandidate_shouldPrependSafeFraming() {
    let mock = Arc::new(MockProvider::working());
    let caller = ResilientCaller::new(
        vec![CallCandidate::sanitized(mock.clone(), "mock-model")],
        common::fast_retry(),
    );

    caller
        .execute(&GenerationRequest::new("the original prompt"))
        .await
        .unwrap();
    let seen = &mock.requests()[0].prompt;
    assert!(seen.starts_with("CONTENT HANDLING NOTE:"));
    assert!(seen.ends_with("the original prompt"));
}
