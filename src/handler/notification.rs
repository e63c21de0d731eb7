use crate::{
    AppState,
    db::NotificationExt,
    dtos::{CreateNotificationDto, NotificationListResponseDto, Response},
    error::{ErrorMessage, HttpError},
};
use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get},
};
use tracing::instrument;
use validator::Validate;

/// Router for the admin notification feed. The admin session middleware is
/// applied to the whole nest in routes.rs; the feed has no public surface.
pub fn notification_handler() -> Router<AppState> {
    Router::new()
        .route("/", get(list_notifications).post(create_notification))
        .route("/{id}", delete(delete_notification))
}

#[instrument(skip(app_state))]
pub async fn list_notifications(
    State(app_state): State<AppState>,
) -> Result<impl IntoResponse, HttpError> {
    let notifications = app_state.db_client.list_notifications().await.map_err(|e| {
        tracing::error!("DB error, listing notifications: {}", e);
        HttpError::server_error(ErrorMessage::ServerError.to_string())
    })?;

    Ok(Json(NotificationListResponseDto {
        success: true,
        notifications,
    }))
}

#[instrument(skip(app_state, body))]
pub async fn create_notification(
    State(app_state): State<AppState>,
    Json(body): Json<CreateNotificationDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate().map_err(|e| {
        tracing::error!("Invalid create_notification input: {}", e);
        HttpError::bad_request(e.to_string())
    })?;

    let notification = app_state
        .db_client
        .save_notification(body.message.trim(), body.kind, body.duration)
        .await
        .map_err(|e| {
            tracing::error!("DB error, saving notification: {}", e);
            HttpError::server_error(ErrorMessage::ServerError.to_string())
        })?;

    tracing::info!(id = notification.id, "Notification created");
    Ok((
        StatusCode::CREATED,
        Json(Response {
            success: true,
            message: "Notification created".to_string(),
        }),
    ))
}

#[instrument(skip(app_state))]
pub async fn delete_notification(
    Path(id): Path<i64>,
    State(app_state): State<AppState>,
) -> Result<impl IntoResponse, HttpError> {
    app_state
        .db_client
        .delete_notification(id)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => {
                HttpError::not_found("Notification not found".to_string())
            }
            e => {
                tracing::error!("DB error, deleting notification: {}", e);
                HttpError::server_error(ErrorMessage::ServerError.to_string())
            }
        })?;

    tracing::info!(id = id, "Notification deleted");
    Ok(Json(Response {
        success: true,
        message: "Notification deleted".to_string(),
    }))
}
