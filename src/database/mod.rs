/*!
 * SQLite persistence for review requests and the audit trail.
 */

pub mod connection;
pub mod models;
pub mod repository;
pub mod schema;

pub use connection::DatabaseConnection;
pub use repository::Repository;
