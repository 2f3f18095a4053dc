//! 错误类型
//!
//! 启动阶段错误（StartupError）由 main 视为致命；单次提问的错误（RunError）由交互循环捕获并报告。

use std::path::PathBuf;

use thiserror::Error;

use crate::llm::{RunId, ServiceError};

/// 文档上传错误；目录类错误发生在任何远端调用之前
#[derive(Error, Debug)]
pub enum UploadError {
    #[error("Directory '{0}' does not exist")]
    DirectoryNotFound(PathBuf),

    #[error("Directory '{0}' is empty. No files to upload")]
    DirectoryEmpty(PathBuf),

    #[error("No PDF files found in directory '{0}'")]
    NoDocuments(PathBuf),

    #[error("Failed to scan directory '{path}': {source}")]
    Scan {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    #[error("Failed to upload '{file_name}': {source}")]
    Upload {
        file_name: String,
        #[source]
        source: ServiceError,
    },
}

/// 助手创建 / 替换错误
#[derive(Error, Debug)]
pub enum ProvisionError {
    #[error("Assistant name is not set")]
    MissingName,

    #[error("Failed to list assistants: {0}")]
    List(#[source] ServiceError),

    #[error("Failed to delete existing assistant {id}: {source}")]
    Delete {
        id: String,
        #[source]
        source: ServiceError,
    },

    #[error("Failed to create assistant: {0}")]
    Create(#[source] ServiceError),
}

/// 单次提问（消息 → Run → 轮询 → 取回复）的错误
#[derive(Error, Debug)]
pub enum RunError {
    #[error("Query must not be empty")]
    EmptyQuery,

    #[error("Failed to submit message: {0}")]
    MessageSubmission(#[source] ServiceError),

    /// 此时用户消息已写入线程，不做回滚
    #[error("Failed to create run: {0}")]
    RunCreation(#[source] ServiceError),

    #[error("Failed to fetch status of run {run_id}: {source}")]
    StatusFetch {
        run_id: RunId,
        #[source]
        source: ServiceError,
    },

    #[error("Failed to list messages: {0}")]
    MessageList(#[source] ServiceError),

    #[error("Run {run_id} did not finish after {attempts} status checks")]
    PollTimeout { run_id: RunId, attempts: u32 },

    #[error("Run {run_id} was cancelled")]
    Cancelled { run_id: RunId },
}

/// 启动阶段错误：任何一个都会终止进程，不进入交互循环
#[derive(Error, Debug)]
pub enum StartupError {
    #[error("OPENAI_API_KEY is not set in the environment")]
    MissingApiKey,

    #[error(transparent)]
    Upload(#[from] UploadError),

    #[error(transparent)]
    Provision(#[from] ProvisionError),

    #[error("Failed to create conversation thread: {0}")]
    Session(#[source] ServiceError),
}
