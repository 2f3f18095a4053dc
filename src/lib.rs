//! pdfqa - PDF 文档问答命令行工具
//!
//! 模块划分：
//! - **assistant**: 远端助手的创建与同名替换
//! - **config**: 应用配置加载（TOML + 环境变量）
//! - **conversation**: 会话线程、Run 生命周期（提交 → 轮询 → 取回复）
//! - **core**: 错误类型、启动编排、优雅关闭
//! - **documents**: 扫描并上传本地 PDF
//! - **llm**: Assistants API 类型与客户端抽象（OpenAI / Mock）
//! - **observability**: 日志初始化
//! - **ui**: 终端问答循环

pub mod assistant;
pub mod config;
pub mod conversation;
pub mod core;
pub mod documents;
pub mod llm;
pub mod observability;
pub mod ui;

pub use conversation::{RunManager, RunOutcome};
pub use crate::core::{bootstrap, App};
