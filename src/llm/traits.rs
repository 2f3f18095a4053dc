//! 远端助手服务抽象
//!
//! 所有后端（OpenAI Assistants v2 / Mock）实现 AssistantService；上层组件只依赖该 trait，
//! 由 main 注入具体实现，不存在全局客户端。

use std::path::Path;

use async_trait::async_trait;
use thiserror::Error;

use crate::llm::types::{
    Assistant, AssistantId, CreateAssistantRequest, FileObject, ListOrder, Run, RunId, Thread,
    ThreadId, ThreadMessage,
};

/// 远端调用错误
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("API key is not a valid header value: {0}")]
    InvalidApiKey(#[source] reqwest::header::InvalidHeaderValue),

    #[error("Unexpected response: {0}")]
    Decode(String),
}

/// 助手服务：文件、助手、线程、消息、Run
#[async_trait]
pub trait AssistantService: Send + Sync {
    /// 上传文件（purpose = assistants）
    async fn upload_file(&self, path: &Path) -> Result<FileObject, ServiceError>;

    /// 列出全部助手（实现负责翻页）
    async fn list_assistants(&self) -> Result<Vec<Assistant>, ServiceError>;

    async fn delete_assistant(&self, assistant_id: &AssistantId) -> Result<(), ServiceError>;

    async fn create_assistant(&self, request: &CreateAssistantRequest)
        -> Result<Assistant, ServiceError>;

    async fn create_thread(&self) -> Result<Thread, ServiceError>;

    /// 向线程追加一条 user 消息
    async fn create_message(
        &self,
        thread_id: &ThreadId,
        content: &str,
    ) -> Result<ThreadMessage, ServiceError>;

    async fn create_run(
        &self,
        thread_id: &ThreadId,
        assistant_id: &AssistantId,
    ) -> Result<Run, ServiceError>;

    async fn retrieve_run(&self, thread_id: &ThreadId, run_id: &RunId)
        -> Result<Run, ServiceError>;

    /// 请求取消进行中的 Run（服务端异步处理，返回 cancelling 状态）
    async fn cancel_run(&self, thread_id: &ThreadId, run_id: &RunId) -> Result<Run, ServiceError>;

    /// 列出线程消息；order 决定按 created_at 的排序方向
    async fn list_messages(
        &self,
        thread_id: &ThreadId,
        order: ListOrder,
    ) -> Result<Vec<ThreadMessage>, ServiceError>;
}
