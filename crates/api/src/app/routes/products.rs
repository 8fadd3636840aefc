use std::sync::Arc;

use axum::{
    Json, Router,
    body::Bytes,
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get},
};
use serde::de::DeserializeOwned;

use catalog_products::{ProductAddRequest, ProductCondition, ProductId, ProductUpdateRequest};

use crate::app::errors;
use crate::app::services::AppServices;

pub fn router() -> Router {
    Router::new()
        .route(
            "/",
            get(list_products).post(create_product).put(update_product),
        )
        .route("/search/product-id/:id", get(get_product))
        .route("/search/:search", get(search_products))
        .route("/:id", delete(delete_product))
}

/// Empty body means "no request"; anything else must be valid JSON for `T`.
fn parse_body<T: DeserializeOwned>(body: &Bytes) -> Result<Option<T>, axum::response::Response> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }
    serde_json::from_slice(body)
        .map(Some)
        .map_err(|e| errors::json_error(StatusCode::BAD_REQUEST, "invalid_body", e.to_string()))
}

fn parse_id(id: &str) -> Result<ProductId, axum::response::Response> {
    id.parse()
        .map_err(|_| errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid product id"))
}

pub async fn list_products(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    match services.products.get_products().await {
        Ok(products) => Json(products).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn get_product(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let product_id = match parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services
        .products
        .get_product_by_condition(&ProductCondition::id_eq(product_id))
        .await
    {
        Ok(Some(product)) => Json(product).into_response(),
        Ok(None) => errors::json_error(StatusCode::NOT_FOUND, "not_found", "product not found"),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn search_products(
    Extension(services): Extension<Arc<AppServices>>,
    Path(search): Path<String>,
) -> axum::response::Response {
    match services
        .products
        .get_products_by_condition(&ProductCondition::search(search))
        .await
    {
        Ok(products) => Json(products).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn create_product(
    Extension(services): Extension<Arc<AppServices>>,
    body: Bytes,
) -> axum::response::Response {
    let request = match parse_body::<ProductAddRequest>(&body) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.products.add_product(request).await {
        Ok(Some(product)) => (StatusCode::CREATED, Json(product)).into_response(),
        Ok(None) => errors::json_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            "storage_error",
            "storage did not return the created product",
        ),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn update_product(
    Extension(services): Extension<Arc<AppServices>>,
    body: Bytes,
) -> axum::response::Response {
    let request = match parse_body::<ProductUpdateRequest>(&body) {
        Ok(Some(v)) => v,
        Ok(None) => {
            return errors::json_error(
                StatusCode::BAD_REQUEST,
                "invalid_argument",
                "product request is required",
            );
        }
        Err(resp) => return resp,
    };

    match services.products.update_product(request).await {
        Ok(Some(product)) => Json(product).into_response(),
        Ok(None) => errors::json_error(StatusCode::NOT_FOUND, "not_found", "product not found"),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn delete_product(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let product_id = match parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.products.delete_product(product_id).await {
        Ok(true) => Json(true).into_response(),
        Ok(false) => errors::json_error(StatusCode::NOT_FOUND, "not_found", "product not found"),
        Err(e) => errors::service_error_to_response(e),
    }
}
