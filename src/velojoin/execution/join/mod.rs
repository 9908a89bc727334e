//! Stream-stream windowed join
//!
//! - [`window`] - `JoinWindowSpec`, the `[before, after]` tolerance
//! - [`state_store`] - `TimestampedBuffer`, one per side
//! - [`matcher`] - probe-range logic over the opposite buffer
//! - [`side`] - `SideProcessor`, lookup / emit / insert for one side
//! - [`coordinator`] - `JoinCoordinator`, both sides of one partition instance

pub mod coordinator;
pub mod matcher;
pub mod side;
pub mod state_store;
pub mod window;

pub use coordinator::{JoinCoordinator, JoinCoordinatorStats, JoinSink};
pub use matcher::JoinMatcher;
pub use side::{JoinSide, SideOutcome, SideProcessor};
pub use state_store::{BufferEntry, BufferRange, BufferStats, TimestampedBuffer};
pub use window::JoinWindowSpec;
