mod database;
mod error;
mod events;
mod handle;
mod pool;
mod rows;

pub use database::Database;
pub use error::EngineError;
pub use events::{QueryEvent, Ready};
pub use handle::LiveQueryHandle;
pub use pool::ConnectionPool;

pub use sqlite_live_query::{Diff, FiringPolicy, KeySelector, Trigger};
pub use sqlite_live_types::{
    Affinity, ColumnCacheSpec, ColumnInfo, Mutation, MutationKind, PoolConfig, Row, Settings,
    SettingsError, TableDescriptor, Value,
};
