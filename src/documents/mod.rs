//! 本地文档：扫描与上传

pub mod uploader;

pub use uploader::{find_documents, upload_documents, DocumentRef};
