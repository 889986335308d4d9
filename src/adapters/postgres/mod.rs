pub mod datastore;

pub use datastore::PgDatastore;
