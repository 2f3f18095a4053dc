//! 核心编排层：错误类型、启动流程、优雅关闭

pub mod bootstrap;
pub mod error;
pub mod shutdown;

pub use bootstrap::{bootstrap, App};
pub use error::{ProvisionError, RunError, StartupError, UploadError};
pub use shutdown::{ShutdownManager, ShutdownReason};
