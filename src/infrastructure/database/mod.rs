mod pool;
mod postgres_repository;

pub use pool::connect_with_retry;
pub use postgres_repository::create_postgres_repository;
