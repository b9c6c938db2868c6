//! Connection management: credentials in, live table store out

use crate::config::DatabaseCredentials;
use crate::db::sqlite::SqliteStore;
use crate::db::store::TableStore;
use crate::error::Result;
use std::path::PathBuf;
use tracing::info;

/// Builds a live store handle from credentials
pub trait ConnectionFactory {
    type Store: TableStore;

    fn connect(&self, credentials: &DatabaseCredentials) -> Result<Self::Store>;
}

/// Opens `<data_dir>/<database>.db`, or an in-memory database for `:memory:`.
/// User, password, host and port do not apply to SQLite and are only logged.
pub struct SqliteConnectionFactory {
    data_dir: PathBuf,
}

impl SqliteConnectionFactory {
    pub const IN_MEMORY: &'static str = ":memory:";

    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    pub fn database_path(&self, credentials: &DatabaseCredentials) -> PathBuf {
        self.data_dir.join(format!("{}.db", credentials.database))
    }
}

impl ConnectionFactory for SqliteConnectionFactory {
    type Store = SqliteStore;

    fn connect(&self, credentials: &DatabaseCredentials) -> Result<SqliteStore> {
        info!("Connecting to {}", credentials.connection_url());
        if credentials.database == Self::IN_MEMORY {
            return SqliteStore::open_in_memory();
        }
        SqliteStore::open(self.database_path(credentials))
    }
}
