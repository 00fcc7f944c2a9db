pub mod auth;
pub mod bookings;
pub mod employees;
pub mod organization;
pub mod provider;

use axum::routing::{get, post, put};
use axum::Router;

use crate::state::SharedState;

pub fn api_routes() -> Router<SharedState> {
    Router::new()
        // Auth
        .route("/api/v1/auth/register", post(auth::register))
        .route("/api/v1/auth/login", post(auth::login))
        .route("/api/v1/auth/refresh", post(auth::refresh))
        .route("/api/v1/auth/logout", post(auth::logout))
        .route("/api/v1/auth/change-password", post(auth::change_password))
        // Organization
        .route(
            "/api/v1/organization",
            get(organization::get_organization).put(organization::update_organization),
        )
        .route(
            "/api/v1/organization/booking-hours",
            put(organization::update_booking_hours),
        )
        .route(
            "/api/v1/organization/members",
            get(organization::list_members).post(organization::add_member),
        )
        .route(
            "/api/v1/organization/members/{id}",
            axum::routing::delete(organization::remove_member),
        )
        // Provider connection
        .route(
            "/api/v1/provider",
            get(provider::get_connection)
                .put(provider::connect)
                .delete(provider::disconnect),
        )
        .route("/api/v1/provider/test", post(provider::test_connection))
        // Employees
        .route("/api/v1/employees", get(employees::list))
        .route("/api/v1/employees/sync", post(employees::sync))
        .route("/api/v1/employees/{id}/enabled", put(employees::set_enabled))
        .route(
            "/api/v1/employees/{id}/availability",
            get(employees::availability),
        )
        // Bookings
        .route(
            "/api/v1/bookings",
            get(bookings::list).post(bookings::create),
        )
}
