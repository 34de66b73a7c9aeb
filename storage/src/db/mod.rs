pub mod crud;
pub mod live;
pub mod queries;
pub mod schemas;

use std::path::PathBuf;

use log::info;
use surrealdb::Surreal;
use surrealdb::engine::local::{Db, SurrealKv};

use crate::errors::Error;

/// Open (or create) the on-disk catalog database at the given path.
///
/// # Errors
///
/// Returns an error if the database cannot be opened or the schema
/// definitions cannot be applied.
pub async fn init_database(path: PathBuf) -> Result<Surreal<Db>, Error> {
    let db = Surreal::new::<SurrealKv>(path).await?;
    db.use_ns("songboard").await?;
    db.use_db("catalog").await?;
    register_tables(&db).await?;
    info!("Connected to catalog database");
    Ok(db)
}

/// Create a fresh in-memory database, for tests.
///
/// # Errors
///
/// Returns an error if the database cannot be started.
#[cfg(any(test, feature = "test_utils"))]
pub async fn init_test_database() -> Result<Surreal<Db>, Error> {
    use surrealdb::engine::local::Mem;

    let db = Surreal::new::<Mem>(()).await?;
    db.use_ns("songboard").await?;
    db.use_db("catalog").await?;
    register_tables(&db).await?;
    Ok(db)
}

async fn register_tables<C: surrealdb::Connection>(db: &Surreal<C>) -> Result<(), Error> {
    db.query(queries::define_tables()).await?;
    Ok(())
}
