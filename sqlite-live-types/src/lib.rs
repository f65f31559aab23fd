pub mod error;
pub mod ident;
pub mod mutation;
pub mod row;
pub mod schema;
pub mod settings;
pub mod value;

pub use error::SettingsError;
pub use ident::quote_ident;
pub use mutation::{IncomingRow, Mutation, MutationKind};
pub use row::{key_atoms, rows_equal, Row};
pub use schema::{Affinity, ColumnInfo, TableDescriptor};
pub use settings::{ColumnCacheSpec, PoolConfig, Settings};
pub use value::{apply_json_affinity, KeyAtom, Value};
