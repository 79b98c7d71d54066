mod metrics;
mod registration;
mod repository;
mod user;

// Publicly expose the Metrics abstraction
pub use metrics::{Metrics, MetricsPtr};

// Publicly expose the user store abstraction
pub use registration::{RegistrationCode, REGISTRATION_CODE_TTL_MINUTES};
pub use repository::{AlreadyExists, Repository, RepositoryPtr};
pub use user::{NewUser, User};
