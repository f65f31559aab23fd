pub mod decoder;
pub mod error;
pub mod frame;
pub mod header;
pub mod observer;
pub mod watch;

pub use decoder::decode_and_apply;
pub use error::WalError;
pub use frame::{decode_frames, FrameBatch, FrameHeader};
pub use header::{parse_wal_header, WalHeader, WAL_HEADER_SIZE};
pub use observer::{PollResult, WalObserver};
pub use watch::WalWatcher;
