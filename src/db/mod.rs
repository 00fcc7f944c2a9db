pub mod audit;
pub mod bookings;
pub mod employees;
pub mod organizations;
pub mod provider_connections;
pub mod refresh_tokens;
pub mod users;
