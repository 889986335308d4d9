use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use super::handlers::{
    AppState, delete_loan, get_loan, list_loans, mark_return, register_loan,
};

/// Creates the API router with all loan desk endpoints
///
/// Command endpoints (Write operations):
/// - POST /loans - Register a new loan
/// - POST /loans/:id/return - Mark a loan as returned
/// - DELETE /loans/:id - Delete a loan record (admin only)
///
/// Query endpoints (Read operations):
/// - GET /loans - List loans, filterable by member_id, isbn or status
/// - GET /loans/:id - Get loan details
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        // Health check endpoint
        .route("/health", get(health_check))
        // Loan collection - register (write) and list (read)
        .route("/loans", post(register_loan).get(list_loans))
        .route("/loans/:id/return", post(mark_return))
        // Single loan - details (read) and delete (admin only)
        .route("/loans/:id", get(get_loan).delete(delete_loan))
        // Add tracing middleware
        .layer(TraceLayer::new_for_http())
        // Add application state
        .with_state(state)
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}
