//! REST API for the crate dispatch service.
//!
//! Provides the HTTP boundary around the allocation engine.
//! Uses Axum as the web framework and supports CORS.

use std::sync::{Arc, OnceLock};

use axum::extract::rejection::JsonRejection;
use axum::extract::{Json, State};
use axum::{
    Router,
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
#[allow(unused_imports)]
use serde_json::json;
use tower_http::cors::{Any, CorsLayer};
use utoipa::{OpenApi, ToSchema};

use crate::catalog::{Catalog, classify_batch};
use crate::config::ApiConfig;
use crate::dispatch::{DispatchConfig, dispatch_lines_with_config};
use crate::model::CrateManifest;

#[derive(Clone)]
struct ApiState {
    catalog: Arc<Catalog>,
    dispatch_config: DispatchConfig,
}

static OPENAPI_DOC: OnceLock<utoipa::openapi::OpenApi> = OnceLock::new();

// SRI hashes verified against https://unpkg.com/swagger-ui-dist@5.17.14/ on 2025-10-29.
const SWAGGER_UI_HTML: &str = r##"<!DOCTYPE html>
<html lang="en">
    <head>
        <meta charset="utf-8" />
        <title>crate-dispatch API Docs</title>
        <link
            rel="stylesheet"
            href="https://unpkg.com/swagger-ui-dist@5.17.14/swagger-ui.css"
            integrity="sha384-wxLW6kwyHktdDGr6Pv1zgm/VGJh99lfUbzSn6HNHBENZlCN7W602k9VkGdxuFvPn"
            crossorigin="anonymous"
        />
    </head>
    <body>
        <div id="swagger-ui"></div>
        <script
            src="https://unpkg.com/swagger-ui-dist@5.17.14/swagger-ui-bundle.js"
            integrity="sha384-wmyclcVGX/WhUkdkATwhaK1X1JtiNrr2EoYJ+diV3vj4v6OC5yCeSu+yW13SYJep"
            crossorigin="anonymous"
        ></script>
        <script
            src="https://unpkg.com/swagger-ui-dist@5.17.14/swagger-ui-standalone-preset.js"
            integrity="sha384-2YH8WDRaj7V2OqU/trsmzSagmk/E2SutiCsGkdgoQwC9pNUJV1u/141DHB6jgs8t"
            crossorigin="anonymous"
        ></script>
        <script>
            window.onload = function () {
                const ui = SwaggerUIBundle({
                    url: "/docs/openapi.json",
                    dom_id: "#swagger-ui",
                    presets: [SwaggerUIBundle.presets.apis, SwaggerUIStandalonePreset],
                    layout: "StandaloneLayout",
                });
                window.ui = ui;
            };
        </script>
    </body>
    </html>"##;

fn openapi_doc() -> &'static utoipa::openapi::OpenApi {
    OPENAPI_DOC.get_or_init(ApiDoc::openapi)
}

/// One order line of the dispatch request.
///
/// Unknown fields are forbidden: an extra field usually indicates a
/// misconception of the API on the consumer side, and a loud 422 with a
/// clear message beats hours of silent coercion surprises.
#[derive(Clone, Debug, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
#[schema(
    example = json!({
        "ID": "1",
        "OrderID": "abc",
        "SKU": "water-50",
        "UnitCount": 26
    })
)]
pub struct DispatchRequestItem {
    #[serde(rename = "ID")]
    pub id: String,
    #[serde(rename = "OrderID")]
    pub order_id: String,
    #[serde(rename = "SKU")]
    pub sku: String,
    #[serde(rename = "UnitCount")]
    pub unit_count: u64,
}

/// Failure body listing every sku the catalog does not know.
#[derive(Serialize, ToSchema)]
pub struct UnknownSkuResponse {
    #[serde(rename = "non-existing-skus")]
    pub non_existing_skus: Vec<String>,
}

#[derive(Serialize, ToSchema)]
struct ErrorResponse {
    error: String,
    details: String,
}

impl ErrorResponse {
    fn new(error: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: details.into(),
        }
    }
}

fn error_response(
    status: StatusCode,
    error: impl Into<String>,
    details: impl Into<String>,
) -> Response {
    (status, Json(ErrorResponse::new(error, details))).into_response()
}

fn json_deserialize_error(err: JsonRejection) -> Response {
    error_response(
        StatusCode::UNPROCESSABLE_ENTITY,
        "Invalid JSON data",
        err.to_string(),
    )
}

#[derive(OpenApi)]
#[openapi(
    paths(handle_dispatch),
    components(
        schemas(
            DispatchRequestItem,
            CrateManifest,
            UnknownSkuResponse,
            ErrorResponse
        )
    ),
    tags((name = "orders", description = "Endpoints for order crate dispatch"))
)]
struct ApiDoc;

/// Starts the API server.
///
/// Configures CORS for cross-origin requests and blocks until the server
/// is terminated.
pub async fn start_api_server(config: ApiConfig, catalog: Catalog, dispatch_config: DispatchConfig) {
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    let state = ApiState {
        catalog: Arc::new(catalog),
        dispatch_config,
    };

    let app = Router::new()
        // API endpoints
        .route("/orders/dispatch", post(handle_dispatch))
        // API documentation
        .route("/docs/openapi.json", get(serve_openapi_json))
        .route("/docs", get(serve_openapi_ui))
        .layer(cors)
        .with_state(state);

    let addr = config.socket_addr();
    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(err) => {
            panic!("❌ Could not bind API server to {}: {}", addr, err);
        }
    };

    let display_host = config.display_host().to_string();
    println!(
        "🚀 Server running on http://{}:{}",
        display_host,
        config.port()
    );
    if config.binds_to_all_interfaces() && config.uses_default_host() {
        println!("💡 Local access: http://localhost:{}", config.port());
    }
    println!("📦 API Endpoints:");
    println!("   - POST /orders/dispatch");
    println!("📑 Documentation:");
    println!("   - GET /docs");
    println!("   - GET /docs/openapi.json");

    if let Err(err) = axum::serve(listener, app).await {
        eprintln!("❌ API server terminated with an error: {err}");
    }
}

/// Handler for POST /orders/dispatch.
///
/// Classifies every line against the catalog, then reduces, aggregates and
/// packs the batch into the minimal crate manifest.
///
/// # Returns
/// JSON manifest with the supplier / 6 / 12 / 20-slot crate counts, or a
/// 404 listing the complete set of unknown skus.
#[utoipa::path(
    post,
    path = "/orders/dispatch",
    request_body = Vec<DispatchRequestItem>,
    responses(
        (status = 200, description = "Crate manifest for the order", body = CrateManifest),
        (
            status = NOT_FOUND,
            description = "At least one sku is not in the catalog",
            body = UnknownSkuResponse
        ),
        (
            status = UNPROCESSABLE_ENTITY,
            description = "Malformed request body",
            body = ErrorResponse
        )
    ),
    tag = "orders"
)]
async fn handle_dispatch(
    State(state): State<ApiState>,
    payload: Result<Json<Vec<DispatchRequestItem>>, JsonRejection>,
) -> impl IntoResponse {
    let Json(items) = match payload {
        Ok(payload) => payload,
        Err(err) => return json_deserialize_error(err),
    };

    println!("📥 New dispatch request: {} order lines", items.len());

    let lines = match classify_batch(
        state.catalog.as_ref(),
        items.iter().map(|item| (item.sku.as_str(), item.unit_count)),
    ) {
        Ok(lines) => lines,
        Err(missing) => {
            println!("❓ {} unknown sku(s) in request", missing.len());
            return (
                StatusCode::NOT_FOUND,
                Json(UnknownSkuResponse {
                    non_existing_skus: missing,
                }),
            )
                .into_response();
        }
    };

    let manifest = dispatch_lines_with_config(&lines, &state.dispatch_config);
    println!(
        "📦 Result: {} supplier, {} slot6, {} slot12, {} slot20 crates",
        manifest.supplier, manifest.slot6, manifest.slot12, manifest.slot20
    );
    (StatusCode::OK, Json(manifest)).into_response()
}

async fn serve_openapi_json(State(_state): State<ApiState>) -> impl IntoResponse {
    Json(openapi_doc())
}

async fn serve_openapi_ui(State(_state): State<ApiState>) -> impl IntoResponse {
    Html(SWAGGER_UI_HTML)
}
