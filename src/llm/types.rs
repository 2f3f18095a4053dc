//! Assistants API 领域类型
//!
//! 只保留本程序依赖的字段：创建响应中的 id、Run 的 status / last_error、消息的 role 与文本内容。

use std::fmt;

use serde::{Deserialize, Serialize};

/// 为不同实体生成独立的 ID 类型，避免把 ThreadId 误传成 RunId
macro_rules! id_type {
    ($($(#[$meta:meta])* $name:ident),* $(,)?) => {
        $(
            $(#[$meta])*
            #[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
            #[serde(transparent)]
            pub struct $name(String);

            impl $name {
                pub fn new(id: impl Into<String>) -> Self {
                    Self(id.into())
                }

                pub fn as_str(&self) -> &str {
                    &self.0
                }
            }

            impl fmt::Display for $name {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    f.write_str(&self.0)
                }
            }

            impl From<String> for $name {
                fn from(id: String) -> Self {
                    Self(id)
                }
            }

            impl From<&str> for $name {
                fn from(id: &str) -> Self {
                    Self(id.to_string())
                }
            }
        )*
    };
}

id_type!(
    /// 已上传文件 ID（file-...）
    FileId,
    /// 助手 ID（asst_...）
    AssistantId,
    /// 会话线程 ID（thread_...）
    ThreadId,
    /// Run ID（run_...）
    RunId,
);

/// 上传后的文件对象
#[derive(Clone, Debug, Deserialize)]
pub struct FileObject {
    pub id: FileId,
    #[serde(default)]
    pub filename: String,
}

/// 远端助手
#[derive(Clone, Debug, Deserialize)]
pub struct Assistant {
    pub id: AssistantId,
    pub name: Option<String>,
    #[serde(default)]
    pub model: String,
}

/// 助手启用的工具
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AssistantTool {
    FileSearch,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct FileSearchResources {
    pub vector_store_ids: Vec<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ToolResources {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_search: Option<FileSearchResources>,
}

/// POST /assistants 请求体
#[derive(Clone, Debug, Serialize)]
pub struct CreateAssistantRequest {
    pub name: String,
    pub model: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub instructions: String,
    pub tools: Vec<AssistantTool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_resources: Option<ToolResources>,
}

/// 会话线程
#[derive(Clone, Debug, Deserialize)]
pub struct Thread {
    pub id: ThreadId,
}

/// 消息角色
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
}

/// 线程内的一条消息（内容已拼接为纯文本）
#[derive(Clone, Debug)]
pub struct ThreadMessage {
    pub id: String,
    pub thread_id: ThreadId,
    pub role: MessageRole,
    pub content: String,
    /// Unix 秒
    pub created_at: i64,
    pub run_id: Option<RunId>,
}

/// 列表排序（按 created_at）
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ListOrder {
    Asc,
    Desc,
}

impl ListOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            ListOrder::Asc => "asc",
            ListOrder::Desc => "desc",
        }
    }
}

/// Run 状态；未知字符串保留在 Unknown 中，按非终态处理
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum RunStatus {
    Queued,
    InProgress,
    RequiresAction,
    Cancelling,
    Cancelled,
    Failed,
    Completed,
    Incomplete,
    Expired,
    Unknown(String),
}

impl RunStatus {
    pub fn as_str(&self) -> &str {
        match self {
            RunStatus::Queued => "queued",
            RunStatus::InProgress => "in_progress",
            RunStatus::RequiresAction => "requires_action",
            RunStatus::Cancelling => "cancelling",
            RunStatus::Cancelled => "cancelled",
            RunStatus::Failed => "failed",
            RunStatus::Completed => "completed",
            RunStatus::Incomplete => "incomplete",
            RunStatus::Expired => "expired",
            RunStatus::Unknown(s) => s,
        }
    }

    /// 终态：不会再发生状态迁移
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            RunStatus::Completed
                | RunStatus::Failed
                | RunStatus::Cancelled
                | RunStatus::Incomplete
                | RunStatus::Expired
        )
    }
}

impl From<String> for RunStatus {
    fn from(s: String) -> Self {
        match s.as_str() {
            "queued" => RunStatus::Queued,
            "in_progress" => RunStatus::InProgress,
            "requires_action" => RunStatus::RequiresAction,
            "cancelling" => RunStatus::Cancelling,
            "cancelled" => RunStatus::Cancelled,
            "failed" => RunStatus::Failed,
            "completed" => RunStatus::Completed,
            "incomplete" => RunStatus::Incomplete,
            "expired" => RunStatus::Expired,
            _ => RunStatus::Unknown(s),
        }
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Run 失败时服务端给出的错误
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct RunLastError {
    pub code: String,
    pub message: String,
}

impl fmt::Display for RunLastError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

/// 一次异步作业
#[derive(Clone, Debug, Deserialize)]
pub struct Run {
    pub id: RunId,
    pub thread_id: ThreadId,
    pub assistant_id: AssistantId,
    pub status: RunStatus,
    #[serde(default)]
    pub last_error: Option<RunLastError>,
}
