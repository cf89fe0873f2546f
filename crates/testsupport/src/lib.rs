//! Test harnesses shared across the workspace's integration tests: a bare
//! in-process [`context::TestContext`] for driving the catalog directly, and
//! a [`server::TestServer`] for driving the real TCP protocol end to end.

pub mod context;
pub mod server;

pub mod prelude {
    pub use crate::context::*;
    pub use crate::server::*;
}
