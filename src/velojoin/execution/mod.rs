pub mod join;
pub mod types;

pub use types::{JoinedRecord, SideRecord, StreamRecord, ValueJoiner};
