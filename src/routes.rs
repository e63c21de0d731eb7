use axum::{Router, middleware};
use tower_http::trace::TraceLayer;

use crate::{
    AppState,
    handler::{
        auth::auth_handler, category::category_handler, mail::mail_handler,
        notification::notification_handler, product::product_handler,
    },
    middleware::admin_auth,
};

pub fn create_router(app_state: AppState) -> Router {
    let api_route = Router::new()
        .nest("/auth", auth_handler(app_state.clone()))
        .nest("/categories", category_handler(app_state.clone()))
        .nest("/products", product_handler(app_state.clone()))
        .nest(
            "/notifications",
            // The whole feed is admin-only, so the guard wraps the nest.
            notification_handler()
                .layer(middleware::from_fn_with_state(app_state.clone(), admin_auth)),
        )
        .nest("/mail", mail_handler())
        .layer(TraceLayer::new_for_http())
        .with_state(app_state);

    Router::new().nest("/api", api_route)
}
