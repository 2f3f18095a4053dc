//! 远端服务层：Assistants API 类型、服务抽象与实现（OpenAI / Mock）

pub mod mock;
pub mod openai;
pub mod traits;
pub mod types;

pub use mock::{MockAssistantService, MockCall, MockOp};
pub use openai::{OpenAiAssistantClient, DEFAULT_BASE_URL};
pub use traits::{AssistantService, ServiceError};
pub use types::{
    Assistant, AssistantId, AssistantTool, CreateAssistantRequest, FileId, FileObject,
    FileSearchResources, ListOrder, MessageRole, Run, RunId, RunLastError, RunStatus, Thread,
    ThreadId, ThreadMessage, ToolResources,
};
