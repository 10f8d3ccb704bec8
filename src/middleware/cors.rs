use tower_http::cors::{Any, CorsLayer};

/// The assessment widget is embedded on partner career pages, so origins
/// cannot be pinned ahead of time.
pub fn permissive_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_methods(Any)
        .allow_headers(Any)
        .allow_origin(Any)
}
