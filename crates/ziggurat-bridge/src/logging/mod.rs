//! Host logging setup.
//!
//! Both the bridge's own diagnostics and engine-forwarded messages go
//! through the `log` facade configured here.

mod init;

pub use init::init_logging;
