//! Run 生命周期：提交问题 → 创建 Run → 轮询至终态 → 取最新助手回复
//!
//! 状态机：Created → {Queued | InProgress | …}* → Completed | Failed | Stopped；
//! 本地另有两个出口：超出轮询上限（PollTimeout）与外部取消（Cancelled），
//! 两者都会尽力向服务端发送 cancel，失败只记日志。

use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::config::RunSection;
use crate::conversation::sleeper::{Sleeper, TokioSleeper};
use crate::core::RunError;
use crate::llm::{
    AssistantId, AssistantService, ListOrder, MessageRole, Run, RunId, RunLastError, RunStatus,
    ThreadId, ThreadMessage,
};

/// 轮询策略：固定间隔，次数与总时长双上限
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PollPolicy {
    pub interval: Duration,
    pub max_attempts: u32,
    pub max_wait: Duration,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self::from(&RunSection::default())
    }
}

impl From<&RunSection> for PollPolicy {
    fn from(section: &RunSection) -> Self {
        Self {
            interval: Duration::from_millis(section.poll_interval_ms),
            max_attempts: section.max_attempts.max(1),
            max_wait: Duration::from_secs(section.max_wait_secs),
        }
    }
}

/// 单次提问的结果
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RunOutcome {
    Success { response_text: String },
    /// 服务端报告 failed；error 为其 last_error（可能缺失）
    RunFailed { error: Option<RunLastError> },
    /// cancelled / expired / incomplete
    Stopped { status: RunStatus },
    /// Run 已完成但线程中没有助手消息
    NoResponseFound,
}

pub struct RunManager {
    service: Arc<dyn AssistantService>,
    sleeper: Arc<dyn Sleeper>,
    policy: PollPolicy,
}

impl RunManager {
    pub fn new(service: Arc<dyn AssistantService>, policy: PollPolicy) -> Self {
        Self {
            service,
            sleeper: Arc::new(TokioSleeper),
            policy,
        }
    }

    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    /// 追加用户消息、创建 Run 并等待其终态；每次调用恰好创建一个 Run
    pub async fn submit_and_await(
        &self,
        thread_id: &ThreadId,
        assistant_id: &AssistantId,
        query: &str,
        cancel: &CancellationToken,
    ) -> Result<RunOutcome, RunError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(RunError::EmptyQuery);
        }

        self.service
            .create_message(thread_id, query)
            .await
            .map_err(RunError::MessageSubmission)?;

        let run = self
            .service
            .create_run(thread_id, assistant_id)
            .await
            .map_err(RunError::RunCreation)?;
        tracing::debug!(run_id = %run.id, "Run created");

        let run = self.await_terminal(thread_id, &run.id, cancel).await?;
        match run.status {
            RunStatus::Completed => self.extract_response(thread_id, &run.id).await,
            RunStatus::Failed => {
                tracing::warn!(run_id = %run.id, error = ?run.last_error, "Run failed");
                Ok(RunOutcome::RunFailed {
                    error: run.last_error,
                })
            }
            status => {
                tracing::warn!(run_id = %run.id, %status, "Run ended without completing");
                Ok(RunOutcome::Stopped { status })
            }
        }
    }

    /// 轮询直到终态；至少查询一次
    async fn await_terminal(
        &self,
        thread_id: &ThreadId,
        run_id: &RunId,
        cancel: &CancellationToken,
    ) -> Result<Run, RunError> {
        let started = Instant::now();
        let mut attempts: u32 = 0;

        loop {
            attempts += 1;
            let run = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    self.abandon(thread_id, run_id).await;
                    return Err(RunError::Cancelled { run_id: run_id.clone() });
                }
                res = self.service.retrieve_run(thread_id, run_id) => {
                    res.map_err(|source| RunError::StatusFetch {
                        run_id: run_id.clone(),
                        source,
                    })?
                }
            };
            tracing::debug!(run_id = %run_id, status = %run.status, attempts, "Polled run");

            if run.status.is_terminal() {
                return Ok(run);
            }

            if attempts >= self.policy.max_attempts || started.elapsed() >= self.policy.max_wait {
                tracing::warn!(run_id = %run_id, attempts, "Run polling limit reached");
                self.abandon(thread_id, run_id).await;
                return Err(RunError::PollTimeout {
                    run_id: run_id.clone(),
                    attempts,
                });
            }

            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    self.abandon(thread_id, run_id).await;
                    return Err(RunError::Cancelled { run_id: run_id.clone() });
                }
                _ = self.sleeper.sleep(self.policy.interval) => {}
            }
        }
    }

    /// 放弃等待时尽力取消远端 Run
    async fn abandon(&self, thread_id: &ThreadId, run_id: &RunId) {
        if let Err(e) = self.service.cancel_run(thread_id, run_id).await {
            tracing::warn!(run_id = %run_id, "Failed to cancel run: {}", e);
        }
    }

    async fn extract_response(
        &self,
        thread_id: &ThreadId,
        run_id: &RunId,
    ) -> Result<RunOutcome, RunError> {
        let messages = self
            .service
            .list_messages(thread_id, ListOrder::Desc)
            .await
            .map_err(RunError::MessageList)?;

        Ok(match latest_assistant_reply(messages, run_id) {
            Some(response_text) => RunOutcome::Success { response_text },
            None => RunOutcome::NoResponseFound,
        })
    }
}

/// 在按 created_at 倒序的消息中取该 Run 产生的第一条助手消息
///
/// 只认 run_id 匹配的消息：Run 没有产出回复时，线程里上一轮的旧回答不会被当作本轮结果。
/// 若列表并非倒序（违反 order=desc 约定），记录警告并重新排序后再取。
pub fn latest_assistant_reply(mut messages: Vec<ThreadMessage>, run_id: &RunId) -> Option<String> {
    let newest_first = messages
        .windows(2)
        .all(|w| w[0].created_at >= w[1].created_at);
    if !newest_first {
        tracing::warn!("Message list is not newest-first; re-sorting by created_at");
        messages.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    }

    messages
        .into_iter()
        .find(|m| m.role == MessageRole::Assistant && m.run_id.as_ref() == Some(run_id))
        .map(|m| m.content)
}
