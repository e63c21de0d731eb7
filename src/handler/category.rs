use crate::{
    AppState,
    db::{CategoryExt, FALLBACK_CATEGORY_NAME, NotificationExt},
    dtos::{
        CategoryDto, CategoryListResponseDto, CategoryResponseDto, CategoryTreeDto,
        CreateCategoryDto, CreateSubcategoryDto, DeleteCategoryResponseDto, Response,
        SubcategoryListResponseDto, SubcategoryResponseDto,
    },
    error::{ErrorMessage, HttpError},
    middleware::{AdminSession, admin_auth},
    models::NotificationType,
    utils::slug::slugify,
};
use axum::{
    Extension, Json, Router, middleware,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post},
};
use tracing::instrument;
use validator::Validate;

/// Router for category endpoints. Listings are public; every mutation sits
/// behind the admin session middleware.
pub fn category_handler(app_state: AppState) -> Router<AppState> {
    Router::new()
        .route("/", get(list_categories))
        .route(
            "/",
            post(create_category)
                .route_layer(middleware::from_fn_with_state(app_state.clone(), admin_auth)),
        )
        .route(
            "/{id}",
            delete(delete_category)
                .route_layer(middleware::from_fn_with_state(app_state.clone(), admin_auth)),
        )
        .route("/{id}/subcategories", get(list_subcategories))
        .route(
            "/subcategories",
            post(create_subcategory)
                .route_layer(middleware::from_fn_with_state(app_state.clone(), admin_auth)),
        )
        .route(
            "/subcategories/{id}",
            delete(delete_subcategory)
                .route_layer(middleware::from_fn_with_state(app_state, admin_auth)),
        )
}

/// The fallback category is reserved; it never shows up in storefront
/// listings. Older rows may carry the accented spelling.
fn is_fallback_name(name: &str) -> bool {
    let name = name.to_lowercase();
    name == "falta categoria" || name == "falta categoría"
}

/// Nested category listing for the storefront menu.
#[instrument(skip(app_state))]
pub async fn list_categories(
    State(app_state): State<AppState>,
) -> Result<impl IntoResponse, HttpError> {
    let categories = app_state.db_client.list_categories().await.map_err(|e| {
        tracing::error!("DB error, listing categories: {}", e);
        HttpError::server_error(ErrorMessage::ServerError.to_string())
    })?;

    let tree: Vec<CategoryTreeDto> = categories
        .iter()
        .filter(|category| category.parent_id.is_none() && !is_fallback_name(&category.name))
        .map(|category| CategoryTreeDto {
            id: category.id,
            name: category.name.to_owned(),
            slug: category.slug.to_owned(),
            subcategories: categories
                .iter()
                .filter(|sub| sub.parent_id == Some(category.id))
                .map(CategoryDto::from_model)
                .collect(),
        })
        .collect();

    Ok(Json(CategoryListResponseDto {
        success: true,
        categories: tree,
    }))
}

/// Flat subcategory listing for one parent category.
#[instrument(skip(app_state))]
pub async fn list_subcategories(
    Path(id): Path<i64>,
    State(app_state): State<AppState>,
) -> Result<impl IntoResponse, HttpError> {
    let subcategories = app_state
        .db_client
        .list_subcategories(id)
        .await
        .map_err(|e| {
            tracing::error!("DB error, listing subcategories: {}", e);
            HttpError::server_error(ErrorMessage::ServerError.to_string())
        })?;

    Ok(Json(SubcategoryListResponseDto {
        success: true,
        subcategories: subcategories.iter().map(CategoryDto::from_model).collect(),
    }))
}

/// Create a top-level category. The slug is derived from the name; a clash
/// on either unique column is a 409.
#[instrument(skip(app_state, body), fields(name = %body.name))]
pub async fn create_category(
    State(app_state): State<AppState>,
    Json(body): Json<CreateCategoryDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate().map_err(|e| {
        tracing::error!("Invalid create_category input: {}", e);
        HttpError::bad_request(e.to_string())
    })?;

    let name = body.name.trim();
    let slug = slugify(name);
    if slug.is_empty() {
        return Err(HttpError::bad_request(
            "Name must contain at least one letter or digit".to_string(),
        ));
    }

    let result = app_state.db_client.save_category(name, &slug, None).await;

    match result {
        Ok(category) => {
            tracing::info!(name = %category.name, slug = %category.slug, "Category created");
            Ok((
                StatusCode::CREATED,
                Json(CategoryResponseDto {
                    success: true,
                    message: "Category created".to_string(),
                    category: CategoryDto::from_model(&category),
                }),
            ))
        }
        Err(e) => Err(map_save_error(e, "category")),
    }
}

/// Create a subcategory under an existing top-level category.
#[instrument(skip(app_state, body), fields(name = %body.name, parent_id = body.parent_id))]
pub async fn create_subcategory(
    State(app_state): State<AppState>,
    Json(body): Json<CreateSubcategoryDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate().map_err(|e| {
        tracing::error!("Invalid create_subcategory input: {}", e);
        HttpError::bad_request(e.to_string())
    })?;

    // The parent must be a real top-level category; nesting stops at one
    // level.
    let parent = app_state
        .db_client
        .get_top_level_category(body.parent_id)
        .await
        .map_err(|e| {
            tracing::error!("DB error, getting parent category: {}", e);
            HttpError::server_error(ErrorMessage::ServerError.to_string())
        })?;

    if parent.is_none() {
        return Err(HttpError::not_found("Parent category not found".to_string()));
    }

    let name = body.name.trim();
    let slug = slugify(name);
    if slug.is_empty() {
        return Err(HttpError::bad_request(
            "Name must contain at least one letter or digit".to_string(),
        ));
    }

    let result = app_state
        .db_client
        .save_category(name, &slug, Some(body.parent_id))
        .await;

    match result {
        Ok(subcategory) => {
            tracing::info!(name = %subcategory.name, parent_id = body.parent_id, "Subcategory created");
            Ok((
                StatusCode::CREATED,
                Json(SubcategoryResponseDto {
                    success: true,
                    message: "Subcategory created".to_string(),
                    subcategory: CategoryDto::from_model(&subcategory),
                }),
            ))
        }
        Err(e) => Err(map_save_error(e, "subcategory")),
    }
}

/// Delete a top-level category.
///
/// Products still referencing it are moved to the fallback category inside
/// the same transaction as the delete; the response reports how many. The
/// audit notification is written after commit.
#[instrument(skip(app_state, session), fields(admin = %session.admin_username))]
pub async fn delete_category(
    Path(id): Path<i64>,
    State(app_state): State<AppState>,
    Extension(session): Extension<AdminSession>,
) -> Result<impl IntoResponse, HttpError> {
    let deletion = app_state
        .db_client
        .delete_category(id)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => HttpError::not_found("Category not found".to_string()),
            e => {
                tracing::error!("DB error, deleting category: {}", e);
                HttpError::server_error(ErrorMessage::ServerError.to_string())
            }
        })?;

    let message = if deletion.reassigned > 0 {
        format!(
            "Categoría \"{}\" eliminada. {} productos reasignados a {}",
            deletion.name, deletion.reassigned, FALLBACK_CATEGORY_NAME
        )
    } else {
        format!("Categoría \"{}\" eliminada", deletion.name)
    };

    // The delete already committed; a failed audit write is logged, not
    // surfaced as a request failure.
    if let Err(e) = app_state
        .db_client
        .save_notification(&message, NotificationType::Warning, None)
        .await
    {
        tracing::warn!("Failed to write deletion notification: {}", e);
    }

    tracing::info!(id = id, reassigned = deletion.reassigned, "Category deleted");
    Ok(Json(DeleteCategoryResponseDto {
        success: true,
        message,
        reassigned: deletion.reassigned,
    }))
}

/// Delete a subcategory. Products reference top-level categories for
/// ownership, so no reassignment happens here.
#[instrument(skip(app_state))]
pub async fn delete_subcategory(
    Path(id): Path<i64>,
    State(app_state): State<AppState>,
) -> Result<impl IntoResponse, HttpError> {
    let subcategory = app_state
        .db_client
        .delete_subcategory(id)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => {
                HttpError::not_found("Subcategory not found".to_string())
            }
            e => {
                tracing::error!("DB error, deleting subcategory: {}", e);
                HttpError::server_error(ErrorMessage::ServerError.to_string())
            }
        })?;

    tracing::info!(id = id, name = %subcategory.name, "Subcategory deleted");
    Ok(Json(Response {
        success: true,
        message: format!("Subcategoría \"{}\" eliminada", subcategory.name),
    }))
}

fn map_save_error(e: sqlx::Error, entity: &str) -> HttpError {
    match e {
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
            tracing::error!("DB error, saving {}, unique violation: {}", entity, db_err);
            HttpError::unique_constraint_violation(format!(
                "A {} with this name already exists",
                entity
            ))
        }
        e => {
            tracing::error!("DB error, saving {}: {}", entity, e);
            HttpError::server_error(ErrorMessage::ServerError.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fallback_name_matches_both_spellings() {
        assert!(is_fallback_name("FALTA CATEGORIA"));
        assert!(is_fallback_name("FALTA CATEGORÍA"));
        assert!(is_fallback_name("falta categoría"));
    }

    #[test]
    fn fallback_name_does_not_match_real_categories() {
        assert!(!is_fallback_name("Ópticas"));
        assert!(!is_fallback_name("FALTA"));
    }
}
