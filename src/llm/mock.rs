//! Mock 助手服务（用于测试，无需 API）
//!
//! 内存中模拟助手 / 线程 / Run：按脚本返回 Run 状态，Run 完成时追加预设的助手回复，
//! 并按顺序记录每一次调用，便于断言调用次序（如先删后建）。

use std::collections::{HashMap, VecDeque};
use std::path::Path;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::llm::traits::{AssistantService, ServiceError};
use crate::llm::types::{
    Assistant, AssistantId, CreateAssistantRequest, FileId, FileObject, ListOrder, MessageRole,
    Run, RunId, RunLastError, RunStatus, Thread, ThreadId, ThreadMessage,
};

/// 记录下来的调用
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MockCall {
    UploadFile(String),
    ListAssistants,
    DeleteAssistant(AssistantId),
    CreateAssistant(String),
    CreateThread,
    CreateMessage { thread_id: ThreadId, content: String },
    CreateRun { thread_id: ThreadId, assistant_id: AssistantId },
    RetrieveRun(RunId),
    CancelRun(RunId),
    ListMessages(ThreadId),
}

/// 可注入失败的操作
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MockOp {
    UploadFile,
    ListAssistants,
    DeleteAssistant,
    CreateAssistant,
    CreateThread,
    CreateMessage,
    CreateRun,
    RetrieveRun,
    CancelRun,
    ListMessages,
}

#[derive(Debug, Default)]
struct MockState {
    calls: Vec<MockCall>,
    assistants: Vec<Assistant>,
    messages: HashMap<ThreadId, Vec<ThreadMessage>>,
    runs: HashMap<RunId, Run>,
    /// 每次 retrieve_run 依次弹出一个状态；耗尽后保持最后一个
    status_script: VecDeque<RunStatus>,
    last_error: Option<RunLastError>,
    replies: Vec<String>,
    failures: HashMap<MockOp, String>,
    /// 为 true 时 list_messages 忽略 order、总按时间正序返回
    ignore_order: bool,
    clock: i64,
    next_id: u64,
}

impl MockState {
    fn next_id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{prefix}_{}", self.next_id)
    }

    fn tick(&mut self) -> i64 {
        self.clock += 1;
        self.clock
    }

    fn check(&self, op: MockOp) -> Result<(), ServiceError> {
        match self.failures.get(&op) {
            Some(message) => Err(ServiceError::Api {
                status: 500,
                message: message.clone(),
            }),
            None => Ok(()),
        }
    }

    fn push_message(
        &mut self,
        thread_id: &ThreadId,
        role: MessageRole,
        content: &str,
        run_id: Option<RunId>,
    ) -> ThreadMessage {
        let msg = ThreadMessage {
            id: self.next_id("msg"),
            thread_id: thread_id.clone(),
            role,
            content: content.to_string(),
            created_at: self.tick(),
            run_id,
        };
        self.messages
            .entry(thread_id.clone())
            .or_default()
            .push(msg.clone());
        msg
    }
}

/// Mock 服务：默认脚本为 queued → in_progress → completed，回复 "Mock answer"
#[derive(Debug)]
pub struct MockAssistantService {
    state: Mutex<MockState>,
}

impl Default for MockAssistantService {
    fn default() -> Self {
        Self::new()
    }
}

impl MockAssistantService {
    pub fn new() -> Self {
        let state = MockState {
            status_script: VecDeque::from(vec![
                RunStatus::Queued,
                RunStatus::InProgress,
                RunStatus::Completed,
            ]),
            replies: vec!["Mock answer".to_string()],
            ..MockState::default()
        };
        Self {
            state: Mutex::new(state),
        }
    }

    /// 预置一个已存在的助手
    pub fn with_assistant(mut self, id: &str, name: &str) -> Self {
        self.state.get_mut().assistants.push(Assistant {
            id: AssistantId::new(id),
            name: Some(name.to_string()),
            model: "mock-model".to_string(),
        });
        self
    }

    /// 设置 retrieve_run 依次返回的状态
    pub fn with_status_script(mut self, statuses: Vec<RunStatus>) -> Self {
        self.state.get_mut().status_script = statuses.into();
        self
    }

    /// 状态脚本中 failed 时附带的错误
    pub fn with_last_error(mut self, code: &str, message: &str) -> Self {
        self.state.get_mut().last_error = Some(RunLastError {
            code: code.to_string(),
            message: message.to_string(),
        });
        self
    }

    /// Run 完成时按顺序追加的助手回复（可为空）
    pub fn with_replies(mut self, replies: Vec<&str>) -> Self {
        self.state.get_mut().replies = replies.into_iter().map(String::from).collect();
        self
    }

    /// 运行中替换后续 Run 的回复
    pub async fn set_replies(&self, replies: Vec<&str>) {
        self.state.lock().await.replies = replies.into_iter().map(String::from).collect();
    }

    pub fn failing(mut self, op: MockOp, message: &str) -> Self {
        self.state
            .get_mut()
            .failures
            .insert(op, message.to_string());
        self
    }

    /// list_messages 违反 desc 约定，总按时间正序返回
    pub fn with_ascending_listing(mut self) -> Self {
        self.state.get_mut().ignore_order = true;
        self
    }

    pub async fn calls(&self) -> Vec<MockCall> {
        self.state.lock().await.calls.clone()
    }

    pub async fn count(&self, pred: impl Fn(&MockCall) -> bool) -> usize {
        self.state.lock().await.calls.iter().filter(|&c| pred(c)).count()
    }

    pub async fn assistants(&self) -> Vec<Assistant> {
        self.state.lock().await.assistants.clone()
    }

    pub async fn thread_messages(&self, thread_id: &ThreadId) -> Vec<ThreadMessage> {
        self.state
            .lock()
            .await
            .messages
            .get(thread_id)
            .cloned()
            .unwrap_or_default()
    }
}

#[async_trait]
impl AssistantService for MockAssistantService {
    async fn upload_file(&self, path: &Path) -> Result<FileObject, ServiceError> {
        let mut s = self.state.lock().await;
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        s.calls.push(MockCall::UploadFile(filename.clone()));
        s.check(MockOp::UploadFile)?;
        let id = s.next_id("file");
        Ok(FileObject {
            id: FileId::new(id),
            filename,
        })
    }

    async fn list_assistants(&self) -> Result<Vec<Assistant>, ServiceError> {
        let mut s = self.state.lock().await;
        s.calls.push(MockCall::ListAssistants);
        s.check(MockOp::ListAssistants)?;
        Ok(s.assistants.clone())
    }

    async fn delete_assistant(&self, assistant_id: &AssistantId) -> Result<(), ServiceError> {
        let mut s = self.state.lock().await;
        s.calls.push(MockCall::DeleteAssistant(assistant_id.clone()));
        s.check(MockOp::DeleteAssistant)?;
        let before = s.assistants.len();
        s.assistants.retain(|a| &a.id != assistant_id);
        if s.assistants.len() == before {
            return Err(ServiceError::Api {
                status: 404,
                message: format!("No assistant found with id '{assistant_id}'."),
            });
        }
        Ok(())
    }

    async fn create_assistant(
        &self,
        request: &CreateAssistantRequest,
    ) -> Result<Assistant, ServiceError> {
        let mut s = self.state.lock().await;
        s.calls.push(MockCall::CreateAssistant(request.name.clone()));
        s.check(MockOp::CreateAssistant)?;
        let assistant = Assistant {
            id: AssistantId::new(s.next_id("asst")),
            name: Some(request.name.clone()),
            model: request.model.clone(),
        };
        s.assistants.push(assistant.clone());
        Ok(assistant)
    }

    async fn create_thread(&self) -> Result<Thread, ServiceError> {
        let mut s = self.state.lock().await;
        s.calls.push(MockCall::CreateThread);
        s.check(MockOp::CreateThread)?;
        let id = ThreadId::new(s.next_id("thread"));
        s.messages.insert(id.clone(), Vec::new());
        Ok(Thread { id })
    }

    async fn create_message(
        &self,
        thread_id: &ThreadId,
        content: &str,
    ) -> Result<ThreadMessage, ServiceError> {
        let mut s = self.state.lock().await;
        s.calls.push(MockCall::CreateMessage {
            thread_id: thread_id.clone(),
            content: content.to_string(),
        });
        s.check(MockOp::CreateMessage)?;
        Ok(s.push_message(thread_id, MessageRole::User, content, None))
    }

    async fn create_run(
        &self,
        thread_id: &ThreadId,
        assistant_id: &AssistantId,
    ) -> Result<Run, ServiceError> {
        let mut s = self.state.lock().await;
        s.calls.push(MockCall::CreateRun {
            thread_id: thread_id.clone(),
            assistant_id: assistant_id.clone(),
        });
        s.check(MockOp::CreateRun)?;
        let run = Run {
            id: RunId::new(s.next_id("run")),
            thread_id: thread_id.clone(),
            assistant_id: assistant_id.clone(),
            status: RunStatus::Queued,
            last_error: None,
        };
        s.runs.insert(run.id.clone(), run.clone());
        Ok(run)
    }

    async fn retrieve_run(
        &self,
        thread_id: &ThreadId,
        run_id: &RunId,
    ) -> Result<Run, ServiceError> {
        let mut s = self.state.lock().await;
        s.calls.push(MockCall::RetrieveRun(run_id.clone()));
        s.check(MockOp::RetrieveRun)?;

        let next = if s.status_script.len() > 1 {
            s.status_script.pop_front()
        } else {
            s.status_script.front().cloned()
        }
        .unwrap_or(RunStatus::Completed);

        let mut run = s.runs.get(run_id).cloned().ok_or_else(|| ServiceError::Api {
            status: 404,
            message: format!("No run found with id '{run_id}'."),
        })?;

        // 首次进入 completed 时写入助手回复
        if next == RunStatus::Completed && run.status != RunStatus::Completed {
            for reply in s.replies.clone() {
                s.push_message(thread_id, MessageRole::Assistant, &reply, Some(run_id.clone()));
            }
        }
        if next == RunStatus::Failed {
            run.last_error = s.last_error.clone();
        }
        run.status = next;
        s.runs.insert(run_id.clone(), run.clone());
        Ok(run)
    }

    async fn cancel_run(&self, _thread_id: &ThreadId, run_id: &RunId) -> Result<Run, ServiceError> {
        let mut s = self.state.lock().await;
        s.calls.push(MockCall::CancelRun(run_id.clone()));
        s.check(MockOp::CancelRun)?;
        let run = s.runs.get_mut(run_id).ok_or_else(|| ServiceError::Api {
            status: 404,
            message: format!("No run found with id '{run_id}'."),
        })?;
        run.status = RunStatus::Cancelling;
        Ok(run.clone())
    }

    async fn list_messages(
        &self,
        thread_id: &ThreadId,
        order: ListOrder,
    ) -> Result<Vec<ThreadMessage>, ServiceError> {
        let mut s = self.state.lock().await;
        s.calls.push(MockCall::ListMessages(thread_id.clone()));
        s.check(MockOp::ListMessages)?;
        let mut messages = s.messages.get(thread_id).cloned().unwrap_or_default();
        if order == ListOrder::Desc && !s.ignore_order {
            messages.reverse();
        }
        Ok(messages)
    }
}
