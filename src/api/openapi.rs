//! OpenAPI documentation and schema generation
//!
//! The document is generated at compile time with utoipa.

use utoipa::OpenApi;

/// OpenAPI documentation for the batch-media REST API
///
/// Served at `/openapi.json`, and through Swagger UI at `/swagger-ui` when
/// enabled.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "batch-media REST API",
        version = "0.1.0",
        description = "Batch product-image download and image optimisation, packaged as ZIP archives",
        license(
            name = "MIT OR Apache-2.0"
        )
    ),
    servers(
        (url = "http://localhost:5000", description = "Local development server")
    ),
    paths(
        crate::api::routes::download_products,
        crate::api::routes::compress_images,
        crate::api::routes::health_check,
        crate::api::routes::get_config,
        crate::api::routes::openapi_spec,
    ),
    components(schemas(
        crate::config::Config,
        crate::config::FetchConfig,
        crate::config::CompressionConfig,
        crate::config::ArchiveConfig,
        crate::config::ApiConfig,
        crate::config::FileCollisionAction,

        crate::types::CompressionStatus,
        crate::types::CompressionOutcome,
        crate::types::BatchTotals,

        crate::error::ApiError,
        crate::error::ErrorDetail,
    )),
    tags(
        (name = "products", description = "Batch download of product images listed in a CSV table"),
        (name = "compress", description = "Batch optimisation of uploaded images with a reduction report"),
        (name = "system", description = "Health, configuration and API documentation"),
    )
)]
pub struct ApiDoc;
