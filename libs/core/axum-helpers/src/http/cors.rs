use axum::http::{HeaderValue, Method, header};
use std::io;
use std::time::Duration;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tracing::info;

/// Creates a CORS layer from a list of allowed origins.
///
/// A single `"*"` entry allows any origin (without credentials). Any other
/// entry must be a valid origin header value. An empty list is rejected.
pub fn create_cors_layer(origins: &[String]) -> io::Result<CorsLayer> {
    let origins: Vec<&str> = origins
        .iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .collect();

    if origins.is_empty() {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            "CORS origin list cannot be empty; use \"*\" to allow any origin",
        ));
    }

    let base = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT, header::AUTHORIZATION])
        .max_age(Duration::from_secs(3600));

    if origins.contains(&"*") {
        info!("CORS configured to allow any origin");
        return Ok(base.allow_origin(Any));
    }

    let allowed = origins
        .iter()
        .map(|s| s.parse::<HeaderValue>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("Invalid CORS origin: {}", e),
            )
        })?;

    info!("CORS configured with allowed origins: {}", origins.join(","));
    Ok(base.allow_origin(AllowOrigin::list(allowed)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wildcard_and_list_are_accepted() {
        assert!(create_cors_layer(&["*".to_string()]).is_ok());
        assert!(
            create_cors_layer(&[
                "http://localhost:3000".to_string(),
                " https://example.com ".to_string()
            ])
            .is_ok()
        );
    }

    #[test]
    fn test_empty_list_is_rejected() {
        let err = create_cors_layer(&[" ".to_string()]).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
    }

    #[test]
    fn test_invalid_origin_is_rejected() {
        assert!(create_cors_layer(&["bad\norigin".to_string()]).is_err());
    }
}
