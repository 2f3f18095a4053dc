//! 文档上传：扫描目录中的 PDF 并逐个上传
//!
//! 目录不存在 / 为空 / 没有 PDF 都在任何远端调用之前报错；上传按文件名顺序进行，首个失败即中止，不重试。

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::core::UploadError;
use crate::llm::{AssistantService, FileId};

const DOCUMENT_EXTENSION: &str = ".pdf";

/// 本地文件名与远端文件 ID 的对应
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DocumentRef {
    pub file_name: String,
    pub file_id: FileId,
}

/// 列出目录下（不递归）的 PDF 文件，按文件名排序
pub fn find_documents(dir: &Path) -> Result<Vec<PathBuf>, UploadError> {
    if !dir.is_dir() {
        return Err(UploadError::DirectoryNotFound(dir.to_path_buf()));
    }

    let mut has_entries = false;
    let mut documents = Vec::new();
    for entry in WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = entry.map_err(|source| UploadError::Scan {
            path: dir.to_path_buf(),
            source,
        })?;
        has_entries = true;
        if entry.file_type().is_file()
            && entry
                .file_name()
                .to_string_lossy()
                .ends_with(DOCUMENT_EXTENSION)
        {
            documents.push(entry.into_path());
        }
    }

    if !has_entries {
        return Err(UploadError::DirectoryEmpty(dir.to_path_buf()));
    }
    if documents.is_empty() {
        return Err(UploadError::NoDocuments(dir.to_path_buf()));
    }
    Ok(documents)
}

/// 上传目录中的全部 PDF
pub async fn upload_documents(
    service: &dyn AssistantService,
    dir: &Path,
) -> Result<Vec<DocumentRef>, UploadError> {
    let paths = find_documents(dir)?;
    let mut uploaded = Vec::with_capacity(paths.len());

    for path in paths {
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let file = service
            .upload_file(&path)
            .await
            .map_err(|source| UploadError::Upload {
                file_name: file_name.clone(),
                source,
            })?;
        tracing::info!("Uploaded file: {} with ID: {}", file_name, file.id);
        uploaded.push(DocumentRef {
            file_name,
            file_id: file.id,
        });
    }

    tracing::info!("All {} files have been successfully uploaded", uploaded.len());
    Ok(uploaded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{MockAssistantService, MockCall, MockOp};
    use tempfile::TempDir;

    fn touch(dir: &TempDir, name: &str) {
        std::fs::write(dir.path().join(name), b"%PDF-1.4\n").unwrap();
    }

    #[test]
    fn test_missing_directory() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("nope");
        assert!(matches!(
            find_documents(&missing),
            Err(UploadError::DirectoryNotFound(_))
        ));
    }

    #[test]
    fn test_empty_directory() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(
            find_documents(dir.path()),
            Err(UploadError::DirectoryEmpty(_))
        ));
    }

    #[test]
    fn test_only_pdf_files_are_picked() {
        let dir = TempDir::new().unwrap();
        touch(&dir, "b.pdf");
        touch(&dir, "notes.txt");
        touch(&dir, "a.pdf");
        std::fs::create_dir(dir.path().join("nested.pdf")).unwrap();

        let found = find_documents(dir.path()).unwrap();
        let names: Vec<_> = found
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.pdf", "b.pdf"]);
    }

    #[tokio::test]
    async fn test_no_pdf_aborts_before_upload() {
        let dir = TempDir::new().unwrap();
        touch(&dir, "readme.md");
        let mock = MockAssistantService::new();

        let err = upload_documents(&mock, dir.path()).await.unwrap_err();
        assert!(matches!(err, UploadError::NoDocuments(_)));
        assert!(mock.calls().await.is_empty());
    }

    #[tokio::test]
    async fn test_uploads_in_name_order() {
        let dir = TempDir::new().unwrap();
        touch(&dir, "report.pdf");
        touch(&dir, "appendix.pdf");
        let mock = MockAssistantService::new();

        let docs = upload_documents(&mock, dir.path()).await.unwrap();
        assert_eq!(docs.len(), 2);
        assert_eq!(docs[0].file_name, "appendix.pdf");
        assert_ne!(docs[0].file_id, docs[1].file_id);
        assert_eq!(
            mock.calls().await,
            vec![
                MockCall::UploadFile("appendix.pdf".into()),
                MockCall::UploadFile("report.pdf".into()),
            ]
        );
    }

    #[tokio::test]
    async fn test_upload_failure_is_reported() {
        let dir = TempDir::new().unwrap();
        touch(&dir, "a.pdf");
        let mock = MockAssistantService::new().failing(MockOp::UploadFile, "file too large");

        let err = upload_documents(&mock, dir.path()).await.unwrap_err();
        match err {
            UploadError::Upload { file_name, .. } => assert_eq!(file_name, "a.pdf"),
            other => panic!("expected Upload error, got {other:?}"),
        }
    }
}
