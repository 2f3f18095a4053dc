//! 启动编排：上传文档 → 创建助手 → 创建会话线程
//!
//! 三步严格串行，任一步失败即返回 StartupError，后续步骤不会发起任何远端调用。

use crate::assistant::{provision_assistant, AssistantConfig};
use crate::config::AppConfig;
use crate::conversation::ConversationSession;
use crate::core::StartupError;
use crate::documents::{upload_documents, DocumentRef};
use crate::llm::{Assistant, AssistantService};

/// 启动完成后的运行期状态
#[derive(Clone, Debug)]
pub struct App {
    pub documents: Vec<DocumentRef>,
    pub assistant: Assistant,
    pub session: ConversationSession,
}

pub async fn bootstrap(
    service: &dyn AssistantService,
    config: &AppConfig,
) -> Result<App, StartupError> {
    let documents = upload_documents(service, &config.app.upload_dir).await?;

    // 上传的文件未关联到 file_search 的向量库；仅使用配置中给出的 vector_store_ids
    let assistant_config = AssistantConfig::from(&config.assistant);
    let assistant = provision_assistant(service, &assistant_config).await?;

    let session = ConversationSession::start(service)
        .await
        .map_err(StartupError::Session)?;

    Ok(App {
        documents,
        assistant,
        session,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{MockAssistantService, MockCall, MockOp};
    use tempfile::TempDir;

    fn config_for(dir: &TempDir) -> AppConfig {
        let mut cfg = AppConfig::default();
        cfg.app.upload_dir = dir.path().to_path_buf();
        cfg
    }

    #[tokio::test]
    async fn test_no_documents_aborts_before_assistant_and_thread() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("notes.txt"), "plain text").unwrap();
        let mock = MockAssistantService::new();

        let err = bootstrap(&mock, &config_for(&dir)).await.unwrap_err();
        assert!(matches!(err, StartupError::Upload(_)));
        assert!(mock.calls().await.is_empty());
    }

    #[tokio::test]
    async fn test_startup_order() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("guide.pdf"), b"%PDF").unwrap();
        let mock = MockAssistantService::new();

        let app = bootstrap(&mock, &config_for(&dir)).await.unwrap();
        assert_eq!(app.documents.len(), 1);
        assert_eq!(app.assistant.name.as_deref(), Some("my_assistant"));
        assert_eq!(
            mock.calls().await,
            vec![
                MockCall::UploadFile("guide.pdf".into()),
                MockCall::ListAssistants,
                MockCall::CreateAssistant("my_assistant".into()),
                MockCall::CreateThread,
            ]
        );
    }

    #[tokio::test]
    async fn test_provision_failure_creates_no_thread() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("guide.pdf"), b"%PDF").unwrap();
        let mock = MockAssistantService::new().failing(MockOp::CreateAssistant, "bad model");

        let err = bootstrap(&mock, &config_for(&dir)).await.unwrap_err();
        assert!(matches!(err, StartupError::Provision(_)));
        assert_eq!(
            mock.count(|c| matches!(c, MockCall::CreateThread)).await,
            0
        );
    }
}
