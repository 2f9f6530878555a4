// Declare modules within this crate
pub mod app_state;
pub mod auth;
pub mod handlers;
pub mod routes;
pub mod service_factory;

pub use app_state::AppState;
pub use routes::routes;
pub use service_factory::GoogleSessionFactory;
