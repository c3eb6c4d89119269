//! OpenAPI documentation configuration

use utoipa::OpenApi;

/// Service-level document; the operations come from the events domain
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Events API",
        version = "0.1.0",
        description = "Tenant console and public listing of events and their sessions",
        license(name = "MIT")
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development server")
    )
)]
pub struct ApiDoc;

/// Full document served at `/api-docs/openapi.json`
pub fn document() -> utoipa::openapi::OpenApi {
    let mut doc = ApiDoc::openapi();
    // Domain paths are already absolute (`/api/...`)
    doc.merge(domain_events::ApiDoc::openapi());
    doc
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_carries_domain_paths() {
        let doc = document();
        assert_eq!(doc.info.title, "Events API");
        assert!(doc.paths.paths.contains_key("/api/console/events"));
        assert!(doc.paths.paths.contains_key("/api/public/events"));
    }
}
