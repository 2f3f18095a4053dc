//! OpenAI Assistants v2 客户端
//!
//! 直接通过 reqwest 调用 REST 端点（需 `OpenAI-Beta: assistants=v2` 头）；base_url 可配置，
//! 兼容自建代理。

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::llm::traits::{AssistantService, ServiceError};
use crate::llm::types::{
    Assistant, AssistantId, CreateAssistantRequest, FileObject, ListOrder, MessageRole, Run,
    RunId, Thread, ThreadId, ThreadMessage,
};

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// 单页最大条数（API 上限 100）
const PAGE_LIMIT: u32 = 100;

/// 列表响应
#[derive(Debug, Deserialize)]
struct ListResponse<T> {
    data: Vec<T>,
    #[serde(default)]
    has_more: bool,
    last_id: Option<String>,
}

impl<T> ListResponse<T> {
    /// 下一页的 after 游标；has_more 为真但缺少 last_id 时同样视为最后一页
    fn next_cursor(&self) -> Option<String> {
        if self.has_more {
            self.last_id.clone()
        } else {
            None
        }
    }
}

/// 单页查询参数：固定 limit，附加调用方参数与可选游标
fn page_query(params: &[(&str, &str)], after: Option<&str>) -> Vec<(String, String)> {
    let mut query = vec![("limit".to_string(), PAGE_LIMIT.to_string())];
    query.extend(params.iter().map(|(k, v)| (k.to_string(), v.to_string())));
    if let Some(cursor) = after {
        query.push(("after".to_string(), cursor.to_string()));
    }
    query
}

/// 错误响应体：{"error": {"message": ..., "type": ..., "code": ...}}
#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
}

/// 消息的线上格式：content 是分段数组，只取 text 段
#[derive(Debug, Deserialize)]
struct WireMessage {
    id: String,
    thread_id: ThreadId,
    role: MessageRole,
    #[serde(default)]
    created_at: i64,
    run_id: Option<RunId>,
    #[serde(default)]
    content: Vec<WireContent>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum WireContent {
    Text { text: WireText },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
struct WireText {
    value: String,
}

impl From<WireMessage> for ThreadMessage {
    fn from(m: WireMessage) -> Self {
        let content = m
            .content
            .into_iter()
            .filter_map(|c| match c {
                WireContent::Text { text } => Some(text.value),
                WireContent::Other => None,
            })
            .collect::<Vec<_>>()
            .join("\n");
        Self {
            id: m.id,
            thread_id: m.thread_id,
            role: m.role,
            content,
            created_at: m.created_at,
            run_id: m.run_id,
        }
    }
}

/// OpenAI Assistants 客户端：持有带默认头与超时的 reqwest Client
pub struct OpenAiAssistantClient {
    http: Client,
    base_url: String,
}

impl OpenAiAssistantClient {
    pub fn new(
        base_url: Option<&str>,
        api_key: &str,
        timeout: Duration,
    ) -> Result<Self, ServiceError> {
        let mut headers = HeaderMap::new();
        let auth = HeaderValue::from_str(&format!("Bearer {api_key}"))
            .map_err(ServiceError::InvalidApiKey)?;
        headers.insert(reqwest::header::AUTHORIZATION, auth);
        headers.insert("openai-beta", HeaderValue::from_static("assistants=v2"));

        let http = Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            http,
            base_url: base_url
                .unwrap_or(DEFAULT_BASE_URL)
                .trim_end_matches('/')
                .to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// 按 after 游标翻页直到 has_more = false，返回全部条目
    async fn list_all<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, &str)],
    ) -> Result<Vec<T>, ServiceError> {
        let mut all = Vec::new();
        let mut after: Option<String> = None;
        loop {
            let req = self
                .http
                .get(self.url(path))
                .query(&page_query(params, after.as_deref()));
            let page: ListResponse<T> = self.send(req).await?;
            let next = page.next_cursor();
            all.extend(page.data);
            match next {
                Some(cursor) => after = Some(cursor),
                None => break,
            }
        }
        Ok(all)
    }

    /// 发送请求；非 2xx 时解析错误体为 ServiceError::Api
    async fn send<T: DeserializeOwned>(&self, req: RequestBuilder) -> Result<T, ServiceError> {
        let resp = req.send().await?;
        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await?;
            let message = serde_json::from_str::<ApiErrorBody>(&text)
                .map(|b| b.error.message)
                .unwrap_or(text);
            return Err(ServiceError::Api {
                status: status.as_u16(),
                message,
            });
        }
        let body = resp.bytes().await?;
        serde_json::from_slice(&body).map_err(|e| ServiceError::Decode(e.to_string()))
    }
}

#[async_trait]
impl AssistantService for OpenAiAssistantClient {
    async fn upload_file(&self, path: &Path) -> Result<FileObject, ServiceError> {
        let bytes = tokio::fs::read(path).await.map_err(|source| ServiceError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "document.pdf".to_string());

        let part = Part::bytes(bytes)
            .file_name(file_name)
            .mime_str("application/pdf")?;
        let form = Form::new().text("purpose", "assistants").part("file", part);

        self.send(self.http.post(self.url("files")).multipart(form))
            .await
    }

    async fn list_assistants(&self) -> Result<Vec<Assistant>, ServiceError> {
        self.list_all("assistants", &[]).await
    }

    async fn delete_assistant(&self, assistant_id: &AssistantId) -> Result<(), ServiceError> {
        let _: serde_json::Value = self
            .send(
                self.http
                    .delete(self.url(&format!("assistants/{assistant_id}"))),
            )
            .await?;
        Ok(())
    }

    async fn create_assistant(
        &self,
        request: &CreateAssistantRequest,
    ) -> Result<Assistant, ServiceError> {
        self.send(self.http.post(self.url("assistants")).json(request))
            .await
    }

    async fn create_thread(&self) -> Result<Thread, ServiceError> {
        self.send(
            self.http
                .post(self.url("threads"))
                .json(&serde_json::json!({})),
        )
        .await
    }

    async fn create_message(
        &self,
        thread_id: &ThreadId,
        content: &str,
    ) -> Result<ThreadMessage, ServiceError> {
        let body = serde_json::json!({ "role": "user", "content": content });
        let msg: WireMessage = self
            .send(
                self.http
                    .post(self.url(&format!("threads/{thread_id}/messages")))
                    .json(&body),
            )
            .await?;
        Ok(msg.into())
    }

    async fn create_run(
        &self,
        thread_id: &ThreadId,
        assistant_id: &AssistantId,
    ) -> Result<Run, ServiceError> {
        let body = serde_json::json!({ "assistant_id": assistant_id });
        self.send(
            self.http
                .post(self.url(&format!("threads/{thread_id}/runs")))
                .json(&body),
        )
        .await
    }

    async fn retrieve_run(
        &self,
        thread_id: &ThreadId,
        run_id: &RunId,
    ) -> Result<Run, ServiceError> {
        self.send(
            self.http
                .get(self.url(&format!("threads/{thread_id}/runs/{run_id}"))),
        )
        .await
    }

    async fn cancel_run(&self, thread_id: &ThreadId, run_id: &RunId) -> Result<Run, ServiceError> {
        self.send(
            self.http
                .post(self.url(&format!("threads/{thread_id}/runs/{run_id}/cancel"))),
        )
        .await
    }

    async fn list_messages(
        &self,
        thread_id: &ThreadId,
        order: ListOrder,
    ) -> Result<Vec<ThreadMessage>, ServiceError> {
        let wire: Vec<WireMessage> = self
            .list_all(
                &format!("threads/{thread_id}/messages"),
                &[("order", order.as_str())],
            )
            .await?;
        Ok(wire.into_iter().map(ThreadMessage::from).collect())
    }
}
