//! pdfqa - PDF 文档问答
//!
//! 入口：初始化日志与配置，上传 PDF、创建助手与会话线程，然后运行终端问答循环。

use std::sync::Arc;

use anyhow::Context;
use pdfqa::config::{load_config, load_dotenv};
use pdfqa::conversation::{PollPolicy, RunManager};
use pdfqa::core::{bootstrap, ShutdownManager};
use pdfqa::llm::{AssistantService, OpenAiAssistantClient};
use pdfqa::observability;
use pdfqa::ui::{InteractiveLoop, ThreadedLines};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 日志：默认 info，可通过 RUST_LOG 覆盖
    observability::init();

    // .env 中的 OPENAI_API_KEY 等变量；不覆盖已有环境变量
    load_dotenv(None);

    let config = load_config(None).context("Failed to load configuration")?;
    let api_key = config.api_key()?;

    let client = OpenAiAssistantClient::new(
        config.api.base_url.as_deref(),
        &api_key,
        config.api.request_timeout(),
    )
    .context("Failed to build API client")?;
    let service: Arc<dyn AssistantService> = Arc::new(client);

    // 启动：上传 → 助手 → 线程，任一步失败即退出
    let app = bootstrap(service.as_ref(), &config)
        .await
        .context("Startup failed")?;
    tracing::info!(
        documents = app.documents.len(),
        assistant_id = %app.assistant.id,
        thread_id = %app.session.thread_id(),
        "Ready"
    );

    let shutdown = Arc::new(ShutdownManager::new());
    shutdown.install_signal_handlers();

    let runs = RunManager::new(service, PollPolicy::from(&config.run));
    let repl = InteractiveLoop::new(
        runs,
        app.session.thread_id().clone(),
        app.assistant.id.clone(),
        shutdown.token(),
    );

    let mut stdout = tokio::io::stdout();
    // stdin 在独立线程读取：Ctrl+C 结束循环后进程可立即退出
    repl.run(ThreadedLines::stdin(), &mut stdout)
        .await
        .context("Terminal I/O failed")?;

    Ok(())
}
