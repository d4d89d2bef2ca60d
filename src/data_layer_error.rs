use std::error::Error;

/// Returned by every data layer method, SQLite-backed or in-memory.
pub type Result<T> = std::result::Result<T, DataLayerError>;

///
/// Boxed so each backend can surface its own failures (`sqlx::Error`,
/// migration errors, ...) without the services knowing which backend
/// is in use. Services wrap it and answer with a 500.
///
pub type DataLayerError = Box<dyn Error + Send + Sync>;
