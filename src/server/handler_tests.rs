// Integration tests for the GraphQL handler
use crate::{
    engine::{
        create_schema,
        graphql::{Mutation, Query, Subscription},
        ExecutionInput, GraphQLOptions, OptionsResolver, QueryExecutor, SchemaExecutor,
    },
    models::{
        BoxError, ExecutionError, ExecutionOutcome, HttpQueryError, RawRequest, RequestMethod,
        ResponseInit,
    },
    server::handler::GraphQLHandler,
    AdapterError, ConfigurationError,
};

use axum::{
    body::Body,
    http::{header, HeaderMap, HeaderValue, Method, Request, Response, StatusCode},
};
use futures::{stream, StreamExt};
use serde_json::{json, Value};
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc, Mutex,
};
use tower::ServiceExt;

// Test helpers

/// What the scripted engine should do for the next request
#[derive(Clone)]
enum Script {
    Single(&'static str, ResponseInit),
    Patches(Vec<&'static str>),
    Protocol(HttpQueryError),
    Unclassified(&'static str),
}

/// Engine double that records its input and replays a script
struct ScriptedExecutor {
    script: Script,
    seen: Arc<Mutex<Vec<(RequestMethod, Value, String)>>>,
}

impl ScriptedExecutor {
    fn new(script: Script) -> (Self, Arc<Mutex<Vec<(RequestMethod, Value, String)>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        (
            Self {
                script,
                seen: Arc::clone(&seen),
            },
            seen,
        )
    }
}

#[derive(Debug, thiserror::Error)]
#[error("{0}")]
struct EngineFailure(&'static str);

#[async_trait::async_trait]
impl QueryExecutor for ScriptedExecutor {
    type Options = String;

    async fn execute(
        &self,
        input: ExecutionInput<Self::Options>,
    ) -> Result<ExecutionOutcome, ExecutionError> {
        self.seen
            .lock()
            .unwrap()
            .push((input.method, input.query, input.options.to_string()));

        match self.script.clone() {
            Script::Single(body, init) => Ok(ExecutionOutcome::single(body, init)),
            Script::Patches(patches) => {
                let patches: Vec<Result<String, BoxError>> =
                    patches.into_iter().map(|patch| Ok(patch.to_string())).collect();
                Ok(ExecutionOutcome::streamed(stream::iter(patches).boxed()))
            }
            Script::Protocol(error) => Err(error.into()),
            Script::Unclassified(message) => Err(ExecutionError::other(EngineFailure(message))),
        }
    }
}

fn scripted_handler(
    script: Script,
) -> (
    GraphQLHandler<ScriptedExecutor>,
    Arc<Mutex<Vec<(RequestMethod, Value, String)>>>,
) {
    let (executor, seen) = ScriptedExecutor::new(script);
    (
        GraphQLHandler::new(OptionsResolver::fixed("static".to_string()), executor),
        seen,
    )
}

fn post_json(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

async fn body_string(response: Response<Body>) -> String {
    let bytes = hyper::body::to_bytes(response.into_body()).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

// Single responses

#[tokio::test]
async fn test_post_single_response_scenario() {
    let body = r#"{"data":{"hello":"world"}}"#;
    let (handler, seen) = scripted_handler(Script::Single(body, ResponseInit::new()));

    let response = handler
        .oneshot(post_json("/graphql", r#"{"query":"{ hello }"}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_LENGTH], "26");
    assert_eq!(body_string(response).await, body);

    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].0, RequestMethod::Post);
    assert_eq!(seen[0].1, json!({ "query": "{ hello }" }));
    assert_eq!(seen[0].2, "static");
}

#[tokio::test]
async fn test_get_payload_comes_from_query_string() {
    let (handler, seen) = scripted_handler(Script::Single("{}", ResponseInit::new()));

    let response = handler.oneshot(get("/graphql?query=%7Bhello%7D")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let seen = seen.lock().unwrap();
    assert_eq!(seen[0].0, RequestMethod::Get);
    assert_eq!(seen[0].1, json!({ "query": "{hello}" }));
}

#[tokio::test]
async fn test_other_method_uses_query_string() {
    let (handler, seen) = scripted_handler(Script::Single("{}", ResponseInit::new()));

    let request = Request::builder()
        .method(Method::PATCH)
        .uri("/graphql?query=%7Bhello%7D")
        .body(Body::from(r#"{"query":"{ ignored }"}"#))
        .unwrap();
    handler.oneshot(request).await.unwrap();

    let seen = seen.lock().unwrap();
    assert_eq!(seen[0].0, RequestMethod::Other);
    assert_eq!(seen[0].1, json!({ "query": "{hello}" }));
}

#[tokio::test]
async fn test_single_response_headers_and_status() {
    let mut headers = HeaderMap::new();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
    headers.insert("x-cache", HeaderValue::from_static("miss"));
    let init = ResponseInit::new()
        .with_status(StatusCode::BAD_REQUEST)
        .with_headers(headers);
    let (handler, _) = scripted_handler(Script::Single("{\"errors\":[]}", init));

    let response = handler
        .oneshot(post_json("/graphql", r#"{"query":"{ x }"}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "application/json");
    assert_eq!(response.headers()["x-cache"], "miss");
    assert_eq!(response.headers()[header::CONTENT_LENGTH], "13");
}

// Streamed responses

#[tokio::test]
async fn test_streamed_response_scenario() {
    let (handler, _) = scripted_handler(Script::Patches(vec!["A", "B"]));

    let response = handler
        .oneshot(post_json("/graphql", r#"{"query":"{ hello }"}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "multipart/mixed; boundary=\"-\""
    );
    assert_eq!(body_string(response).await, "A\r\n---\r\nB\r\n---\r\n\r\n---");
}

#[tokio::test]
async fn test_empty_patch_sequence() {
    let (handler, _) = scripted_handler(Script::Patches(vec![]));

    let response = handler
        .oneshot(post_json("/graphql", r#"{"query":"{ hello }"}"#))
        .await
        .unwrap();

    assert_eq!(body_string(response).await, "\r\n---");
}

// Errors

#[tokio::test]
async fn test_protocol_error_is_rendered() {
    let error = HttpQueryError::method_not_allowed("GET supports only query operation", "POST");
    let (handler, _) = scripted_handler(Script::Protocol(error));

    let response = handler.oneshot(get("/graphql?query=mutation")).await.unwrap();

    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(response.headers()[header::ALLOW], "POST");
    assert_eq!(body_string(response).await, "GET supports only query operation");
}

#[tokio::test]
async fn test_unclassified_error_is_forwarded() {
    let (handler, _) = scripted_handler(Script::Unclassified("engine exploded"));

    let error = handler
        .oneshot(post_json("/graphql", r#"{"query":"{ hello }"}"#))
        .await
        .unwrap_err();

    let failure = error.downcast_ref::<EngineFailure>().expect("error forwarded unchanged");
    assert_eq!(failure.0, "engine exploded");
}

#[tokio::test]
async fn test_forwarded_error_becomes_host_500() {
    let (handler, _) = scripted_handler(Script::Unclassified("engine exploded"));
    let app = handler.into_router("/graphql");

    let response = app
        .oneshot(post_json("/graphql", r#"{"query":"{ hello }"}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn test_invalid_json_body_is_bad_request() {
    let (handler, seen) = scripted_handler(Script::Single("{}", ResponseInit::new()));

    let response = handler
        .oneshot(post_json("/graphql", "{not json"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_string(response).await, "POST body sent invalid JSON.");
    assert!(seen.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_missing_post_body_is_rendered() {
    let (handler, seen) = scripted_handler(Script::Single("{}", ResponseInit::new()));

    let request = Request::builder()
        .method(Method::POST)
        .uri("/graphql")
        .body(Body::empty())
        .unwrap();
    let response = handler.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(seen.lock().unwrap().is_empty());
}

// Options resolution

#[tokio::test]
async fn test_dynamic_options_per_request() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let resolver = OptionsResolver::from_fn(move |request: &RawRequest, headers: &mut HeaderMap| {
        let n = counter.fetch_add(1, Ordering::SeqCst);
        headers.insert("x-resolved", HeaderValue::from(n));
        let tenant = request.header("x-tenant").unwrap_or("none").to_string();
        async move { Ok::<_, BoxError>(format!("tenant={}", tenant)) }
    });

    let (executor, seen) = ScriptedExecutor::new(Script::Single("{}", ResponseInit::new()));
    let handler = GraphQLHandler::new(resolver, executor);

    let request = Request::builder()
        .method(Method::POST)
        .uri("/graphql")
        .header("x-tenant", "acme")
        .body(Body::from(r#"{"query":"{ hello }"}"#))
        .unwrap();
    let first = handler.clone().oneshot(request).await.unwrap();
    let second = handler
        .oneshot(post_json("/graphql", r#"{"query":"{ hello }"}"#))
        .await
        .unwrap();

    assert_eq!(first.headers()["x-resolved"], "0");
    assert_eq!(second.headers()["x-resolved"], "1");
    assert_eq!(calls.load(Ordering::SeqCst), 2);

    let seen = seen.lock().unwrap();
    assert_eq!(seen[0].2, "tenant=acme");
    assert_eq!(seen[1].2, "tenant=none");
}

#[tokio::test]
async fn test_options_failure_is_forwarded_and_isolated() {
    let resolver = OptionsResolver::from_sync_fn(|request: &RawRequest, _: &mut HeaderMap| {
        if request.uri.path() == "/broken" {
            Err::<String, BoxError>(Box::new(EngineFailure("no options")))
        } else {
            Ok("fine".to_string())
        }
    });
    let (executor, seen) = ScriptedExecutor::new(Script::Single("{}", ResponseInit::new()));
    let handler = GraphQLHandler::new(resolver, executor);

    let error = handler
        .clone()
        .oneshot(post_json("/broken", r#"{"query":"{ hello }"}"#))
        .await
        .unwrap_err();
    assert!(error.downcast_ref::<EngineFailure>().is_some());

    let response = handler
        .oneshot(post_json("/graphql", r#"{"query":"{ hello }"}"#))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(seen.lock().unwrap().len(), 1);
}

// Construction

#[test]
fn test_builder_requires_options() {
    let (executor, _) = ScriptedExecutor::new(Script::Patches(vec![]));
    let result = GraphQLHandler::builder().executor(executor).build();

    assert!(matches!(
        result,
        Err(AdapterError::Configuration(ConfigurationError::MissingOptions))
    ));
}

#[test]
fn test_builder_rejects_several_options() {
    let (executor, _) = ScriptedExecutor::new(Script::Patches(vec![]));
    let result = GraphQLHandler::builder()
        .options("a".to_string())
        .options("b".to_string())
        .executor(executor)
        .build();

    match result {
        Err(error @ AdapterError::Configuration(ConfigurationError::TooManyOptions { count: 2 })) => {
            assert!(error.to_string().contains("got 2"));
        }
        Err(other) => panic!("unexpected error: {}", other),
        Ok(_) => panic!("builder accepted two options sources"),
    }
}

#[test]
fn test_builder_requires_executor() {
    let result = GraphQLHandler::<ScriptedExecutor>::builder()
        .options("a".to_string())
        .build();

    assert!(matches!(
        result,
        Err(AdapterError::Configuration(ConfigurationError::MissingExecutor))
    ));
}

#[tokio::test]
async fn test_builder_with_one_source_serves_requests() {
    let (executor, _) = ScriptedExecutor::new(Script::Single("ok", ResponseInit::new()));
    let handler = GraphQLHandler::builder()
        .options_resolver(OptionsResolver::fixed("only".to_string()))
        .executor(executor)
        .build()
        .unwrap();

    let response = handler
        .oneshot(post_json("/graphql", r#"{"query":"{ hello }"}"#))
        .await
        .unwrap();
    assert_eq!(body_string(response).await, "ok");
}

// End to end with the async-graphql engine

fn schema_handler() -> GraphQLHandler<SchemaExecutor<Query, Mutation, Subscription>> {
    GraphQLHandler::new(
        OptionsResolver::fixed(GraphQLOptions::new(create_schema())),
        SchemaExecutor::new(),
    )
}

#[tokio::test]
async fn test_schema_single_response_content_length() {
    let response = schema_handler()
        .oneshot(post_json("/graphql", r#"{"query":"{ hello }"}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let length: usize = response.headers()[header::CONTENT_LENGTH]
        .to_str()
        .unwrap()
        .parse()
        .unwrap();
    let body = body_string(response).await;
    assert_eq!(length, body.len());

    let value: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(value["data"]["hello"], "world");
}

#[tokio::test]
async fn test_schema_multipart_subscription() {
    let request = Request::builder()
        .method(Method::POST)
        .uri("/graphql")
        .header(header::ACCEPT, "multipart/mixed")
        .body(Body::from(
            r#"{"query":"subscription { countdown(from: 1, intervalMs: 1) }"}"#,
        ))
        .unwrap();

    let response = schema_handler().oneshot(request).await.unwrap();
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "multipart/mixed; boundary=\"-\""
    );

    let body = body_string(response).await;
    assert!(body.ends_with("\r\n---\r\n\r\n---"));

    let parts: Vec<Value> = body
        .trim_end_matches("\r\n---")
        .split("\r\n---\r\n")
        .filter(|part| !part.is_empty())
        .map(|part| serde_json::from_str(part).unwrap())
        .collect();
    assert_eq!(parts.len(), 2);
    assert_eq!(parts[0]["data"]["countdown"], 1);
    assert_eq!(parts[1]["data"]["countdown"], 0);
}

#[tokio::test]
async fn test_schema_get_mutation_is_405() {
    let response = schema_handler()
        .oneshot(get(
            "/graphql?query=mutation%20%7B%20setGreeting(greeting%3A%20%22x%22)%20%7D",
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(response.headers()[header::ALLOW], "POST");
    assert_eq!(body_string(response).await, "GET supports only query operation");
}
