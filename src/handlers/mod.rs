// Gateway module - controls public API for handlers
// Modules are private, only exported symbols are public

mod auth;
mod health;
mod metrics;
mod pages;
mod register;
mod root;
mod shared_types;
mod users;

// Core handlers
pub use health::health_check;
pub use metrics::metrics_handler;
pub use root::root_handler;

// Session handlers
pub use auth::{current_session, login, logout};

// Self-registration
pub use register::{issue_registration_code, register};

// Pages
pub use pages::{dashboard, dashboard_section, login_page, register_page};

// User management handlers
pub use users::{create_user, delete_user, list_users};
