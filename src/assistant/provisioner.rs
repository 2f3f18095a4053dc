//! 助手创建：删除同名旧助手后重建（先删后建，串行执行）

use crate::config::AssistantSection;
use crate::core::ProvisionError;
use crate::llm::{
    Assistant, AssistantService, AssistantTool, CreateAssistantRequest, FileSearchResources,
    ToolResources,
};

/// 助手配置（创建后不再修改）
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AssistantConfig {
    pub name: String,
    pub model: String,
    pub description: String,
    pub instructions: String,
    pub tools: Vec<AssistantTool>,
    pub vector_store_ids: Vec<String>,
}

impl From<&AssistantSection> for AssistantConfig {
    fn from(section: &AssistantSection) -> Self {
        Self {
            name: section.name.clone(),
            model: section.model.clone(),
            description: section.description.clone(),
            instructions: section.instructions.clone(),
            tools: vec![AssistantTool::FileSearch],
            vector_store_ids: section.vector_store_ids.clone(),
        }
    }
}

impl AssistantConfig {
    fn to_request(&self) -> CreateAssistantRequest {
        let tool_resources = self
            .tools
            .contains(&AssistantTool::FileSearch)
            .then(|| ToolResources {
                file_search: Some(FileSearchResources {
                    vector_store_ids: self.vector_store_ids.clone(),
                }),
            });
        CreateAssistantRequest {
            name: self.name.clone(),
            model: self.model.clone(),
            description: (!self.description.is_empty()).then(|| self.description.clone()),
            instructions: self.instructions.clone(),
            tools: self.tools.clone(),
            tool_resources,
        }
    }
}

/// 确保远端只有一个该名称的助手：列出 → 逐个删除同名者 → 创建
pub async fn provision_assistant(
    service: &dyn AssistantService,
    config: &AssistantConfig,
) -> Result<Assistant, ProvisionError> {
    if config.name.trim().is_empty() {
        return Err(ProvisionError::MissingName);
    }

    let existing = service
        .list_assistants()
        .await
        .map_err(ProvisionError::List)?;

    for assistant in existing
        .iter()
        .filter(|a| a.name.as_deref() == Some(config.name.as_str()))
    {
        tracing::info!(
            "Deleting existing assistant '{}' with ID: {}",
            config.name,
            assistant.id
        );
        service
            .delete_assistant(&assistant.id)
            .await
            .map_err(|source| ProvisionError::Delete {
                id: assistant.id.to_string(),
                source,
            })?;
    }

    let assistant = service
        .create_assistant(&config.to_request())
        .await
        .map_err(ProvisionError::Create)?;
    tracing::info!(
        "New assistant '{}' created with ID: {}",
        config.name,
        assistant.id
    );
    Ok(assistant)
}
