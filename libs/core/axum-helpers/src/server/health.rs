use axum::{Json, http::StatusCode};
use futures::future::join_all;
use serde_json::{Map, Value, json};
use std::future::Future;
use std::pin::Pin;

/// A boxed health probe. `Ok` carries optional detail for the report, `Err` the
/// reason the subsystem is considered down.
pub type HealthCheckFuture<'a> = Pin<Box<dyn Future<Output = Result<Value, String>> + Send + 'a>>;

/// Runs health probes concurrently and aggregates them.
///
/// The body is `{"status": "healthy"|"degraded", "subsystems": {name: {...}}}`.
/// Each subsystem entry has `healthy` plus either the probe's detail fields
/// or an `error` string. Any failing probe turns the response into a 503.
///
/// # Example
/// ```ignore
/// let store: HealthCheckFuture = Box::pin(async { store.health().await.map(|_| json!({})) });
/// run_health_checks(vec![("vector_store", store)]).await
/// ```
pub async fn run_health_checks(
    checks: Vec<(&str, HealthCheckFuture<'_>)>,
) -> Result<(StatusCode, Json<Value>), (StatusCode, Json<Value>)> {
    let names: Vec<_> = checks.iter().map(|(name, _)| *name).collect();
    let futures: Vec<_> = checks.into_iter().map(|(_, check)| check).collect();
    let results = join_all(futures).await;

    let mut subsystems = Map::new();
    let mut all_healthy = true;

    for (name, result) in names.into_iter().zip(results) {
        let entry = match result {
            Ok(detail) => {
                let mut entry = match detail {
                    Value::Object(map) => map,
                    Value::Null => Map::new(),
                    other => {
                        let mut map = Map::new();
                        map.insert("detail".to_string(), other);
                        map
                    }
                };
                entry.insert("healthy".to_string(), Value::Bool(true));
                entry
            }
            Err(e) => {
                tracing::warn!(subsystem = name, error = %e, "Health check failed");
                all_healthy = false;
                let mut map = Map::new();
                map.insert("healthy".to_string(), Value::Bool(false));
                map.insert("error".to_string(), Value::String(e));
                map
            }
        };
        subsystems.insert(name.to_string(), Value::Object(entry));
    }

    let response = json!({
        "status": if all_healthy { "healthy" } else { "degraded" },
        "subsystems": subsystems,
    });

    if all_healthy {
        Ok((StatusCode::OK, Json(response)))
    } else {
        Err((StatusCode::SERVICE_UNAVAILABLE, Json(response)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn probe(result: Result<Value, String>) -> HealthCheckFuture<'static> {
        Box::pin(async move { result })
    }

    #[tokio::test]
    async fn test_all_healthy() {
        let checks = vec![
            ("vector_store", probe(Ok(Value::Null))),
            (
                "embedding",
                probe(Ok(json!({"model": "hashing", "dimension": 384}))),
            ),
        ];

        let (status, Json(body)) = run_health_checks(checks).await.unwrap();
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["subsystems"]["vector_store"]["healthy"], true);
        assert_eq!(body["subsystems"]["embedding"]["dimension"], 384);
    }

    #[tokio::test]
    async fn test_one_failure_degrades() {
        let checks = vec![
            ("vector_store", probe(Err("connection refused".to_string()))),
            ("embedding", probe(Ok(Value::Null))),
        ];

        let (status, Json(body)) = run_health_checks(checks).await.unwrap_err();
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["status"], "degraded");
        assert_eq!(body["subsystems"]["vector_store"]["healthy"], false);
        assert_eq!(body["subsystems"]["vector_store"]["error"], "connection refused");
        assert_eq!(body["subsystems"]["embedding"]["healthy"], true);
    }
}
