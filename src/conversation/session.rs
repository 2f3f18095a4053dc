//! 会话：进程生命周期内唯一的远端线程
//!
//! 启动时创建一次，退出时不删除（由远端服务自行过期）。

use crate::llm::{AssistantService, ServiceError, ThreadId};

#[derive(Clone, Debug)]
pub struct ConversationSession {
    thread_id: ThreadId,
}

impl ConversationSession {
    pub async fn start(service: &dyn AssistantService) -> Result<Self, ServiceError> {
        let thread = service.create_thread().await?;
        tracing::info!(thread_id = %thread.id, "Conversation thread created");
        Ok(Self {
            thread_id: thread.id,
        })
    }

    pub fn thread_id(&self) -> &ThreadId {
        &self.thread_id
    }
}
