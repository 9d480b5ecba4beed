use crate::SiteResult;
use std::path::Path;

/// The data layer that supplies the snapshot of businesses an analysis runs over.
pub struct BusinessDatabase {
    db: rusqlite::Connection,
}

mod db_businesses;
pub use db_businesses::AddBusinessTransaction;

impl BusinessDatabase {
    pub fn connect<P: AsRef<Path>>(path_to_db: P) -> SiteResult<Self> {
        let conn = rusqlite::Connection::open_with_flags(
            path_to_db,
            rusqlite::OpenFlags::SQLITE_OPEN_READ_WRITE | rusqlite::OpenFlags::SQLITE_OPEN_CREATE,
        )?;

        Self::initialize(conn)
    }

    /// A database that only lives as long as the returned value, mostly useful for testing.
    pub fn open_in_memory() -> SiteResult<Self> {
        let conn = rusqlite::Connection::open_in_memory()?;

        Self::initialize(conn)
    }

    fn initialize(conn: rusqlite::Connection) -> SiteResult<Self> {
        conn.execute_batch(include_str!("business_database/create_db.sql"))?;

        Ok(BusinessDatabase { db: conn })
    }
}
