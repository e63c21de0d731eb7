use crate::{
    AppState,
    db::ProductExt,
    dtos::{
        ColorResponseDto, CreateColorDto, CreateProductDto, ImageResponseDto, ProductDetailDto,
        ProductDetailResponseDto, ProductListResponseDto, ProductQueryDto, ProductResponseDto,
        Response,
    },
    error::{ErrorMessage, HttpError},
    middleware::admin_auth,
    models::StockOption,
};
use axum::{
    Json, Router, middleware,
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post, put},
};
use std::path::Component;
use tracing::instrument;
use validator::Validate;

/// Router for product endpoints, including colors and gallery images.
/// Listing is public; everything else requires the admin session.
pub fn product_handler(app_state: AppState) -> Router<AppState> {
    Router::new()
        .route("/", get(get_products))
        .route(
            "/",
            post(create_product)
                .route_layer(middleware::from_fn_with_state(app_state.clone(), admin_auth)),
        )
        .route(
            "/{id}",
            put(update_product)
                .delete(delete_product)
                .route_layer(middleware::from_fn_with_state(app_state.clone(), admin_auth)),
        )
        .route(
            "/{id}/colors",
            post(create_color)
                .route_layer(middleware::from_fn_with_state(app_state.clone(), admin_auth)),
        )
        .route(
            "/colors/{color_id}",
            delete(delete_color)
                .route_layer(middleware::from_fn_with_state(app_state.clone(), admin_auth)),
        )
        .route(
            "/{id}/images",
            post(upload_image)
                .route_layer(middleware::from_fn_with_state(app_state.clone(), admin_auth)),
        )
        .route(
            "/images/{image_id}",
            delete(delete_image)
                .route_layer(middleware::from_fn_with_state(app_state, admin_auth)),
        )
}

/// Product listing and detail.
///
/// `?id=` returns one product with its colors and images; `?subcategory_id=`
/// or `?category_id=` filter the list; no filter returns everything, newest
/// first.
#[instrument(skip(app_state))]
pub async fn get_products(
    Query(params): Query<ProductQueryDto>,
    State(app_state): State<AppState>,
) -> Result<impl IntoResponse, HttpError> {
    if let Some(id) = params.id {
        let product = app_state
            .db_client
            .get_product(id)
            .await
            .map_err(|e| {
                tracing::error!("DB error, getting product: {}", e);
                HttpError::server_error(ErrorMessage::ServerError.to_string())
            })?
            .ok_or_else(|| HttpError::not_found("Product not found".to_string()))?;

        let colors = app_state
            .db_client
            .get_product_colors(id)
            .await
            .map_err(|e| {
                tracing::error!("DB error, getting product colors: {}", e);
                HttpError::server_error(ErrorMessage::ServerError.to_string())
            })?;

        let images = app_state
            .db_client
            .get_product_images(id)
            .await
            .map_err(|e| {
                tracing::error!("DB error, getting product images: {}", e);
                HttpError::server_error(ErrorMessage::ServerError.to_string())
            })?;

        return Ok(Json(ProductDetailResponseDto {
            success: true,
            product: ProductDetailDto {
                product,
                colors,
                images,
            },
        })
        .into_response());
    }

    let products = if let Some(subcategory_id) = params.subcategory_id {
        app_state
            .db_client
            .list_products_by_subcategory(subcategory_id)
            .await
    } else if let Some(category_id) = params.category_id {
        app_state.db_client.list_products_by_category(category_id).await
    } else {
        app_state.db_client.list_products().await
    }
    .map_err(|e| {
        tracing::error!("DB error, listing products: {}", e);
        HttpError::server_error(ErrorMessage::ServerError.to_string())
    })?;

    Ok(Json(ProductListResponseDto {
        success: true,
        products,
    })
    .into_response())
}

#[instrument(skip(app_state, body), fields(name = %body.name))]
pub async fn create_product(
    State(app_state): State<AppState>,
    Json(body): Json<CreateProductDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate().map_err(|e| {
        tracing::error!("Invalid create_product input: {}", e);
        HttpError::bad_request(e.to_string())
    })?;

    let stock_quantity = resolve_stock_quantity(body.stock_option, body.stock_quantity)?;

    let result = app_state
        .db_client
        .save_product(
            body.name.trim(),
            body.model.trim(),
            body.category_id,
            body.subcategory_id,
            body.stock_option,
            stock_quantity,
            body.price,
            body.main_image.as_deref(),
        )
        .await;

    match result {
        Ok(product) => {
            tracing::info!(id = product.id, name = %product.name, "Product created");
            Ok((
                StatusCode::CREATED,
                Json(ProductResponseDto {
                    success: true,
                    message: "Product created".to_string(),
                    product,
                }),
            ))
        }
        Err(e) => Err(map_product_save_error(e)),
    }
}

#[instrument(skip(app_state, body), fields(name = %body.name))]
pub async fn update_product(
    Path(id): Path<i64>,
    State(app_state): State<AppState>,
    Json(body): Json<CreateProductDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate().map_err(|e| {
        tracing::error!("Invalid update_product input: {}", e);
        HttpError::bad_request(e.to_string())
    })?;

    let stock_quantity = resolve_stock_quantity(body.stock_option, body.stock_quantity)?;

    let result = app_state
        .db_client
        .update_product(
            id,
            body.name.trim(),
            body.model.trim(),
            body.category_id,
            body.subcategory_id,
            body.stock_option,
            stock_quantity,
            body.price,
            body.main_image.as_deref(),
        )
        .await;

    match result {
        Ok(Some(product)) => {
            tracing::info!(id = product.id, "Product updated");
            Ok(Json(ProductResponseDto {
                success: true,
                message: "Product updated".to_string(),
                product,
            }))
        }
        Ok(None) => Err(HttpError::not_found("Product not found".to_string())),
        Err(e) => Err(map_product_save_error(e)),
    }
}

/// Delete a product with its colors and images; files are swept from
/// storage after the database transaction commits.
#[instrument(skip(app_state))]
pub async fn delete_product(
    Path(id): Path<i64>,
    State(app_state): State<AppState>,
) -> Result<impl IntoResponse, HttpError> {
    let deletion = app_state
        .db_client
        .delete_product(id)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => HttpError::not_found("Product not found".to_string()),
            e => {
                tracing::error!("DB error, deleting product: {}", e);
                HttpError::server_error(ErrorMessage::ServerError.to_string())
            }
        })?;

    for file in &deletion.files {
        remove_stored_file(&app_state.env.upload_dir, file).await;
    }

    tracing::info!(id = id, name = %deletion.name, "Product deleted");
    Ok(Json(Response {
        success: true,
        message: format!("Producto \"{}\" eliminado", deletion.name),
    }))
}

#[instrument(skip(app_state, body))]
pub async fn create_color(
    Path(id): Path<i64>,
    State(app_state): State<AppState>,
    Json(body): Json<CreateColorDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate().map_err(|e| {
        tracing::error!("Invalid create_color input: {}", e);
        HttpError::bad_request(e.to_string())
    })?;

    let product = app_state.db_client.get_product(id).await.map_err(|e| {
        tracing::error!("DB error, getting product: {}", e);
        HttpError::server_error(ErrorMessage::ServerError.to_string())
    })?;

    if product.is_none() {
        return Err(HttpError::not_found("Product not found".to_string()));
    }

    let color = app_state
        .db_client
        .save_color(
            id,
            body.color_name.trim(),
            body.color_hex.trim(),
            body.image_path.as_deref(),
        )
        .await
        .map_err(|e| {
            tracing::error!("DB error, saving color: {}", e);
            HttpError::server_error(ErrorMessage::ServerError.to_string())
        })?;

    tracing::info!(product_id = id, color = %color.color_name, "Color created");
    Ok((
        StatusCode::CREATED,
        Json(ColorResponseDto {
            success: true,
            message: "Color created".to_string(),
            color,
        }),
    ))
}

/// Delete one product color. The audit notification is written inside the
/// same transaction as the row delete; the color's image file is removed
/// best-effort afterwards.
#[instrument(skip(app_state))]
pub async fn delete_color(
    Path(color_id): Path<i64>,
    State(app_state): State<AppState>,
) -> Result<impl IntoResponse, HttpError> {
    let deletion = app_state
        .db_client
        .delete_color(color_id)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => HttpError::not_found("Color not found".to_string()),
            e => {
                tracing::error!("DB error, deleting color: {}", e);
                HttpError::server_error(ErrorMessage::ServerError.to_string())
            }
        })?;

    if let Some(image_path) = &deletion.image_path {
        remove_stored_file(&app_state.env.upload_dir, image_path).await;
    }

    tracing::info!(color_id = color_id, "Color deleted");
    Ok(Json(Response {
        success: true,
        message: format!(
            "Color \"{}\" eliminado del producto {}",
            deletion.color_name, deletion.product_name
        ),
    }))
}

/// Multipart upload of a gallery image: an `image` file field plus an
/// optional `is_cover` flag. The file lands under the upload directory with
/// a UUID name; the original filename only contributes its extension.
#[instrument(skip(app_state, multipart))]
pub async fn upload_image(
    Path(id): Path<i64>,
    State(app_state): State<AppState>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, HttpError> {
    let product = app_state.db_client.get_product(id).await.map_err(|e| {
        tracing::error!("DB error, getting product: {}", e);
        HttpError::server_error(ErrorMessage::ServerError.to_string())
    })?;

    if product.is_none() {
        return Err(HttpError::not_found("Product not found".to_string()));
    }

    let mut upload: Option<(String, axum::body::Bytes)> = None;
    let mut is_cover = false;

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        tracing::error!("Multipart error: {}", e);
        HttpError::bad_request("Invalid multipart payload".to_string())
    })? {
        let name = field.name().map(|name| name.to_string());
        match name.as_deref() {
            Some("image") => {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let bytes = field.bytes().await.map_err(|e| {
                    tracing::error!("Multipart read error: {}", e);
                    HttpError::bad_request("Invalid multipart payload".to_string())
                })?;
                upload = Some((file_name, bytes));
            }
            Some("is_cover") => {
                let value = field.text().await.map_err(|e| {
                    tracing::error!("Multipart read error: {}", e);
                    HttpError::bad_request("Invalid multipart payload".to_string())
                })?;
                is_cover = matches!(value.as_str(), "true" | "1");
            }
            _ => {}
        }
    }

    let (file_name, bytes) = upload
        .ok_or_else(|| HttpError::bad_request("Image file is required".to_string()))?;
    if bytes.is_empty() {
        return Err(HttpError::bad_request("Image file is empty".to_string()));
    }

    let stored_name = format!("{}{}", uuid::Uuid::new_v4(), sanitized_extension(&file_name));
    let stored_path = std::path::Path::new(&app_state.env.upload_dir).join(&stored_name);

    tokio::fs::write(&stored_path, &bytes).await.map_err(|e| {
        tracing::error!("Failed to store uploaded image: {}", e);
        HttpError::server_error(ErrorMessage::ServerError.to_string())
    })?;

    let stored_path = stored_path.to_string_lossy().to_string();
    let result = app_state.db_client.save_image(id, &stored_path, is_cover).await;

    let image = match result {
        Ok(image) => image,
        Err(e) => {
            // Don't leave an orphaned file behind when the row insert fails.
            remove_stored_file(&app_state.env.upload_dir, &stored_path).await;
            tracing::error!("DB error, saving image: {}", e);
            return Err(HttpError::server_error(ErrorMessage::ServerError.to_string()));
        }
    };

    tracing::info!(product_id = id, path = %image.path, "Image uploaded");
    Ok((
        StatusCode::CREATED,
        Json(ImageResponseDto {
            success: true,
            message: "Image uploaded".to_string(),
            image,
        }),
    ))
}

/// Delete one gallery image; same transactional shape as color deletion.
#[instrument(skip(app_state))]
pub async fn delete_image(
    Path(image_id): Path<i64>,
    State(app_state): State<AppState>,
) -> Result<impl IntoResponse, HttpError> {
    let deletion = app_state
        .db_client
        .delete_image(image_id)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => HttpError::not_found("Image not found".to_string()),
            e => {
                tracing::error!("DB error, deleting image: {}", e);
                HttpError::server_error(ErrorMessage::ServerError.to_string())
            }
        })?;

    remove_stored_file(&app_state.env.upload_dir, &deletion.path).await;

    tracing::info!(image_id = image_id, "Image deleted");
    Ok(Json(Response {
        success: true,
        message: format!("Imagen eliminada del producto {}", deletion.product_name),
    }))
}

/// An in-stock product must say how many; a preorder product carries no
/// quantity regardless of what the request sent.
fn resolve_stock_quantity(
    stock_option: StockOption,
    stock_quantity: Option<i32>,
) -> Result<Option<i32>, HttpError> {
    match stock_option {
        StockOption::InStock => match stock_quantity {
            Some(quantity) if quantity >= 0 => Ok(Some(quantity)),
            Some(_) => Err(HttpError::bad_request(
                "Stock quantity cannot be negative".to_string(),
            )),
            None => Err(HttpError::bad_request(
                "Stock quantity is required for in-stock products".to_string(),
            )),
        },
        StockOption::Preorder => Ok(None),
    }
}

fn map_product_save_error(e: sqlx::Error) -> HttpError {
    match e {
        sqlx::Error::Database(db_err) if db_err.is_foreign_key_violation() => {
            tracing::error!("DB error, saving product, foreign key violation: {}", db_err);
            HttpError::bad_request("Invalid category reference".to_string())
        }
        e => {
            tracing::error!("DB error, saving product: {}", e);
            HttpError::server_error(ErrorMessage::ServerError.to_string())
        }
    }
}

/// Remove a stored file, tolerating files that are already gone. Paths are
/// only honored inside the upload directory and may not climb out of it.
async fn remove_stored_file(upload_dir: &str, path: &str) {
    let target = std::path::Path::new(path);
    let escapes = !target.starts_with(upload_dir)
        || target
            .components()
            .any(|component| matches!(component, Component::ParentDir));
    if escapes {
        tracing::warn!(path = %path, "Refusing to remove file outside the upload directory");
        return;
    }

    match tokio::fs::remove_file(target).await {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => tracing::warn!(path = %path, "Failed to remove file: {}", e),
    }
}

/// Keep only a short alphanumeric extension from the client's filename;
/// anything else is dropped rather than guessed at.
fn sanitized_extension(file_name: &str) -> String {
    match file_name.rsplit_once('.') {
        Some((_, ext))
            if !ext.is_empty()
                && ext.len() <= 5
                && ext.chars().all(|c| c.is_ascii_alphanumeric()) =>
        {
            format!(".{}", ext.to_ascii_lowercase())
        }
        _ => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn instock_requires_quantity() {
        let err = resolve_stock_quantity(StockOption::InStock, None).unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
    }

    #[test]
    fn instock_rejects_negative_quantity() {
        let err = resolve_stock_quantity(StockOption::InStock, Some(-5)).unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
    }

    #[test]
    fn instock_keeps_quantity() {
        assert_eq!(
            resolve_stock_quantity(StockOption::InStock, Some(12)).unwrap(),
            Some(12)
        );
    }

    #[test]
    fn preorder_clears_quantity() {
        assert_eq!(
            resolve_stock_quantity(StockOption::Preorder, Some(12)).unwrap(),
            None
        );
    }

    #[test]
    fn extension_is_sanitized() {
        assert_eq!(sanitized_extension("photo.JPG"), ".jpg");
        assert_eq!(sanitized_extension("archive.tar.gz"), ".gz");
        assert_eq!(sanitized_extension("no_extension"), "");
        assert_eq!(sanitized_extension("weird.j!pg"), "");
        assert_eq!(sanitized_extension("toolong.jpegjpeg"), "");
    }
}
