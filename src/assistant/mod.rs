//! 远端助手的创建与替换

pub mod provisioner;

pub use provisioner::{provision_assistant, AssistantConfig};
