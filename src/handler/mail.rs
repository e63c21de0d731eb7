use crate::{
    AppState,
    dtos::{CartEmailDto, ContactEmailDto, OrderEmailDto, Response},
    error::HttpError,
    mail::mails::{send_cart_email, send_contact_email, send_order_email},
};
use axum::{Json, Router, extract::State, response::IntoResponse, routing::post};
use tracing::instrument;
use validator::Validate;

/// Sender domains the store accepts mail-triggering requests from. Keeps
/// the public endpoints from being used as an open relay for arbitrary
/// reply-to addresses.
const ALLOWED_SENDER_DOMAINS: &[&str] = &["gmail.com", "hotmail.com", "outlook.com"];

/// Router for the public store-mail endpoints.
pub fn mail_handler() -> Router<AppState> {
    Router::new()
        .route("/cart", post(cart_email))
        .route("/contact", post(contact_email))
        .route("/order", post(order_email))
}

#[instrument(skip(app_state, body), fields(email = %body.email))]
pub async fn cart_email(
    State(app_state): State<AppState>,
    Json(body): Json<CartEmailDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate().map_err(|e| {
        tracing::error!("Invalid cart email input: {}", e);
        HttpError::bad_request(e.to_string())
    })?;
    check_sender_domain(&body.email)?;

    send_cart_email(
        &app_state.env.store_email,
        &body.email,
        body.name.as_deref(),
        &body.items,
    )
    .await
    .map_err(|e| {
        tracing::error!("Failed to send cart email: {}", e);
        HttpError::server_error("Failed to send email".to_string())
    })?;

    tracing::info!("Cart email sent");
    Ok(Json(Response {
        success: true,
        message: "Email sent".to_string(),
    }))
}

#[instrument(skip(app_state, body), fields(email = %body.email))]
pub async fn contact_email(
    State(app_state): State<AppState>,
    Json(body): Json<ContactEmailDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate().map_err(|e| {
        tracing::error!("Invalid contact email input: {}", e);
        HttpError::bad_request(e.to_string())
    })?;
    check_sender_domain(&body.email)?;

    send_contact_email(
        &app_state.env.store_email,
        &body.email,
        &body.name,
        &body.message,
    )
    .await
    .map_err(|e| {
        tracing::error!("Failed to send contact email: {}", e);
        HttpError::server_error("Failed to send email".to_string())
    })?;

    tracing::info!("Contact email sent");
    Ok(Json(Response {
        success: true,
        message: "Email sent".to_string(),
    }))
}

#[instrument(skip(app_state, body), fields(email = %body.email))]
pub async fn order_email(
    State(app_state): State<AppState>,
    Json(body): Json<OrderEmailDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate().map_err(|e| {
        tracing::error!("Invalid order email input: {}", e);
        HttpError::bad_request(e.to_string())
    })?;
    check_sender_domain(&body.email)?;

    send_order_email(
        &app_state.env.store_email,
        &body.email,
        &body.name,
        body.phone.as_deref(),
        &body.items,
    )
    .await
    .map_err(|e| {
        tracing::error!("Failed to send order email: {}", e);
        HttpError::server_error("Failed to send email".to_string())
    })?;

    tracing::info!("Order email sent");
    Ok(Json(Response {
        success: true,
        message: "Email sent".to_string(),
    }))
}

fn check_sender_domain(email: &str) -> Result<(), HttpError> {
    if sender_domain_allowed(email) {
        Ok(())
    } else {
        Err(HttpError::bad_request(
            "Email domain not allowed".to_string(),
        ))
    }
}

fn sender_domain_allowed(email: &str) -> bool {
    email
        .rsplit_once('@')
        .map(|(_, domain)| {
            ALLOWED_SENDER_DOMAINS
                .iter()
                .any(|allowed| domain.eq_ignore_ascii_case(allowed))
        })
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_allowed_domains() {
        assert!(sender_domain_allowed("buyer@gmail.com"));
        assert!(sender_domain_allowed("buyer@hotmail.com"));
        assert!(sender_domain_allowed("buyer@OUTLOOK.COM"));
    }

    #[test]
    fn rejects_other_domains() {
        assert!(!sender_domain_allowed("buyer@yahoo.com"));
        assert!(!sender_domain_allowed("buyer@gmail.com.evil.net"));
        assert!(!sender_domain_allowed("not-an-email"));
    }

    #[test]
    fn uses_the_last_at_sign() {
        assert!(!sender_domain_allowed("a@gmail.com@yahoo.com"));
        assert!(sender_domain_allowed("\"odd@local\"@gmail.com"));
    }
}
