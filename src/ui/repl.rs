//! 交互循环：逐行读取问题，交给 RunManager，打印回复
//!
//! `exit`（不区分大小写）或输入结束时正常退出；单次提问的错误只报告、不中断会话；
//! Ctrl+C 取消当前 Run 并结束循环。

use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio_util::sync::CancellationToken;

use crate::conversation::{RunManager, RunOutcome};
use crate::core::RunError;
use crate::llm::{AssistantId, ThreadId};
use crate::ui::input::LineSource;

pub const EXIT_KEYWORD: &str = "exit";
pub const PROMPT: &str = "Enter your question (or type 'exit' to quit): ";
const GOODBYE: &str = "Exiting the conversation. Goodbye!";
const RULE_WIDTH: usize = 50;

pub fn is_exit_command(line: &str) -> bool {
    line.trim().eq_ignore_ascii_case(EXIT_KEYWORD)
}

/// 把一次提问的结果渲染为终端文本
pub fn render_outcome(outcome: &RunOutcome) -> String {
    match outcome {
        RunOutcome::Success { response_text } => {
            let heavy = "=".repeat(RULE_WIDTH);
            let light = "-".repeat(RULE_WIDTH);
            format!("\n{heavy}\nAssistant:\n{light}\n{response_text}\n{heavy}\n\n")
        }
        RunOutcome::RunFailed { error: Some(error) } => format!("Run failed: {error}\n"),
        RunOutcome::RunFailed { error: None } => "Run failed: no error detail provided\n".to_string(),
        RunOutcome::Stopped { status } => {
            format!("Run ended without a response (status: {status})\n")
        }
        RunOutcome::NoResponseFound => "No response from assistant.\n".to_string(),
    }
}

pub struct InteractiveLoop {
    runs: RunManager,
    thread_id: ThreadId,
    assistant_id: AssistantId,
    cancel: CancellationToken,
}

impl InteractiveLoop {
    pub fn new(
        runs: RunManager,
        thread_id: ThreadId,
        assistant_id: AssistantId,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            runs,
            thread_id,
            assistant_id,
            cancel,
        }
    }

    /// 运行直到 exit / EOF / 取消；只有 I/O 错误会向上传播
    pub async fn run<L, W>(&self, mut lines: L, output: &mut W) -> std::io::Result<()>
    where
        L: LineSource,
        W: AsyncWrite + Unpin,
    {
        loop {
            output.write_all(PROMPT.as_bytes()).await?;
            output.flush().await?;

            let line = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => None,
                line = lines.next_line() => line?,
            };
            let Some(line) = line else {
                output.write_all(format!("\n{GOODBYE}\n").as_bytes()).await?;
                return Ok(());
            };

            if is_exit_command(&line) {
                output.write_all(format!("{GOODBYE}\n").as_bytes()).await?;
                return Ok(());
            }
            if line.trim().is_empty() {
                continue;
            }

            let result = self
                .runs
                .submit_and_await(&self.thread_id, &self.assistant_id, &line, &self.cancel)
                .await;
            match result {
                Ok(outcome) => output.write_all(render_outcome(&outcome).as_bytes()).await?,
                Err(RunError::Cancelled { run_id }) => {
                    tracing::info!(run_id = %run_id, "Run cancelled by user");
                    output.write_all(format!("\nCancelled. {GOODBYE}\n").as_bytes()).await?;
                    return Ok(());
                }
                Err(e) => {
                    tracing::error!("Query failed: {}", e);
                    output.write_all(format!("Error: {e}\n").as_bytes()).await?;
                }
            }
            output.flush().await?;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use tokio::io::AsyncBufReadExt;

    use super::*;
    use crate::conversation::PollPolicy;
    use crate::llm::{AssistantService, MockAssistantService, MockCall, MockOp, RunStatus};
    use crate::ui::input::ThreadedLines;

    fn fast_policy() -> PollPolicy {
        PollPolicy {
            interval: Duration::from_millis(1),
            max_attempts: 10,
            max_wait: Duration::from_secs(10),
        }
    }

    async fn build(mock: MockAssistantService) -> (Arc<MockAssistantService>, InteractiveLoop) {
        let mock = Arc::new(mock);
        let thread = mock.create_thread().await.unwrap().id;
        let runs = RunManager::new(mock.clone(), fast_policy());
        let repl = InteractiveLoop::new(
            runs,
            thread,
            AssistantId::new("asst_1"),
            CancellationToken::new(),
        );
        (mock, repl)
    }

    async fn drive(repl: &InteractiveLoop, input: &str) -> String {
        let mut out = Vec::new();
        repl.run(input.as_bytes().lines(), &mut out).await.unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_exit_keyword_case_insensitive() {
        for word in ["exit", "EXIT", "Exit", "  eXiT  "] {
            assert!(is_exit_command(word), "{word}");
        }
        assert!(!is_exit_command("exit now"));
        assert!(!is_exit_command("quit"));
    }

    #[tokio::test]
    async fn test_exit_does_not_invoke_run_manager() {
        for word in ["EXIT", "Exit", "exit"] {
            let (mock, repl) = build(MockAssistantService::new()).await;
            let out = drive(&repl, &format!("{word}\nnever asked\n")).await;
            assert!(out.contains(GOODBYE));
            assert_eq!(mock.calls().await, vec![MockCall::CreateThread]);
        }
    }

    #[tokio::test]
    async fn test_prints_assistant_response() {
        let (_mock, repl) = build(MockAssistantService::new().with_replies(vec!["42"])).await;
        let out = drive(&repl, "What is the answer?\nexit\n").await;
        assert!(out.contains("Assistant:\n"));
        assert!(out.contains("\n42\n"));
        assert!(out.trim_end().ends_with(GOODBYE));
    }

    #[tokio::test]
    async fn test_run_failure_is_reported_and_loop_continues() {
        let mock = MockAssistantService::new()
            .with_status_script(vec![RunStatus::Failed])
            .with_last_error("server_error", "try again");
        let (mock, repl) = build(mock).await;
        let out = drive(&repl, "first\nsecond\nexit\n").await;

        assert_eq!(out.matches("Run failed: server_error: try again").count(), 2);
        assert_eq!(
            mock.count(|c| matches!(c, MockCall::CreateRun { .. })).await,
            2
        );
    }

    #[tokio::test]
    async fn test_per_query_error_does_not_end_session() {
        let mock = MockAssistantService::new().failing(MockOp::CreateRun, "no capacity");
        let (_mock, repl) = build(mock).await;
        let out = drive(&repl, "question\nexit\n").await;
        assert!(out.contains("Error: Failed to create run"));
        assert!(out.contains(GOODBYE));
    }

    #[tokio::test]
    async fn test_blank_lines_and_eof() {
        let (mock, repl) = build(MockAssistantService::new()).await;
        let out = drive(&repl, "\n   \n").await;
        assert!(out.contains(GOODBYE));
        assert_eq!(mock.calls().await, vec![MockCall::CreateThread]);
    }

    /// 永远读不到数据的阻塞输入（持有的发送端被丢弃前一直阻塞）
    struct SilentTerminal(std::sync::mpsc::Receiver<()>);

    impl std::io::Read for SilentTerminal {
        fn read(&mut self, _buf: &mut [u8]) -> std::io::Result<usize> {
            let _ = self.0.recv();
            Ok(0)
        }
    }

    #[test]
    fn test_cancel_at_prompt_does_not_wait_for_input() {
        let (hold_open, stall) = std::sync::mpsc::channel::<()>();
        let (done_tx, done_rx) = std::sync::mpsc::channel();

        std::thread::spawn(move || {
            let rt = tokio::runtime::Builder::new_multi_thread()
                .worker_threads(1)
                .enable_all()
                .build()
                .unwrap();
            let result = rt.block_on(async {
                let mock = Arc::new(MockAssistantService::new());
                let thread = mock.create_thread().await.unwrap().id;
                let cancel = CancellationToken::new();
                let repl = InteractiveLoop::new(
                    RunManager::new(mock, fast_policy()),
                    thread,
                    AssistantId::new("asst_1"),
                    cancel.clone(),
                );
                let input = ThreadedLines::spawn(std::io::BufReader::new(SilentTerminal(stall)));
                tokio::spawn(async move {
                    tokio::time::sleep(Duration::from_millis(50)).await;
                    cancel.cancel();
                });
                let mut out = Vec::new();
                repl.run(input, &mut out).await.map(|_| out)
            });
            // 运行时关闭不应等待仍阻塞着的输入读取
            drop(rt);
            let _ = done_tx.send(result);
        });

        let out = done_rx
            .recv_timeout(Duration::from_secs(5))
            .expect("loop and runtime shut down while input is still blocked")
            .unwrap();
        assert!(String::from_utf8(out).unwrap().contains(GOODBYE));
        drop(hold_open);
    }

    #[test]
    fn test_render_no_response() {
        assert_eq!(
            render_outcome(&RunOutcome::NoResponseFound),
            "No response from assistant.\n"
        );
        assert!(render_outcome(&RunOutcome::Stopped {
            status: RunStatus::Expired
        })
        .contains("expired"));
    }
}
