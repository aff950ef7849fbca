//! Daemon lifecycle concerns

mod shutdown;

pub use shutdown::wait_for_shutdown;
