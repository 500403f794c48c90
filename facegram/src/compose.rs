//! New-post drafts: caption plus image attachments, validated before upload.

use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DraftError {
    #[error("Caption and at least one attachment are required.")]
    Incomplete,
    #[error("{}: {reason}", .path.display())]
    Unreadable { path: PathBuf, reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DraftAttachment {
    pub path: PathBuf,
    pub mime: &'static str,
}

/// A file ready to go into the multipart form.
#[derive(Debug, Clone)]
pub struct UploadFile {
    pub file_name: String,
    pub mime: &'static str,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone)]
pub struct PostUpload {
    pub caption: String,
    pub files: Vec<UploadFile>,
}

#[derive(Debug, Clone, Default)]
pub struct NewPostDraft {
    caption: String,
    attachments: Vec<DraftAttachment>,
}

/// Image types the server accepts, keyed by file extension.
pub fn image_mime(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "jpg" | "jpeg" => Some("image/jpeg"),
        "png" => Some("image/png"),
        "gif" => Some("image/gif"),
        "webp" => Some("image/webp"),
        _ => None,
    }
}

impl NewPostDraft {
    pub fn new(caption: impl Into<String>) -> Self {
        Self {
            caption: caption.into(),
            attachments: Vec::new(),
        }
    }

    pub fn caption(&self) -> &str {
        &self.caption
    }

    pub fn attachments(&self) -> &[DraftAttachment] {
        &self.attachments
    }

    /// Attach a file. Returns false (and attaches nothing) for non-image files.
    pub fn add_file(&mut self, path: impl Into<PathBuf>) -> bool {
        let path = path.into();
        match image_mime(&path) {
            Some(mime) => {
                self.attachments.push(DraftAttachment { path, mime });
                true
            }
            None => {
                tracing::warn!(path = %path.display(), "skipping non-image attachment");
                false
            }
        }
    }

    pub fn remove_attachment(&mut self, index: usize) -> Option<DraftAttachment> {
        (index < self.attachments.len()).then(|| self.attachments.remove(index))
    }

    /// Remove several attachments by their current index. Returns the indices
    /// that named no attachment.
    pub fn remove_attachments(&mut self, indices: &[usize]) -> Vec<usize> {
        let mut order = indices.to_vec();
        order.sort_unstable_by(|a, b| b.cmp(a));
        order.dedup();
        order
            .into_iter()
            .filter(|&i| self.remove_attachment(i).is_none())
            .collect()
    }

    pub fn validate(&self) -> Result<(), DraftError> {
        if self.caption.trim().is_empty() || self.attachments.is_empty() {
            return Err(DraftError::Incomplete);
        }
        Ok(())
    }

    /// Validate, then read every attachment from disk.
    pub async fn into_upload(self) -> Result<PostUpload, DraftError> {
        self.validate()?;
        let mut files = Vec::with_capacity(self.attachments.len());
        for att in self.attachments {
            let bytes = tokio::fs::read(&att.path)
                .await
                .map_err(|e| DraftError::Unreadable {
                    path: att.path.clone(),
                    reason: e.to_string(),
                })?;
            let file_name = att
                .path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| "attachment".to_string());
            files.push(UploadFile {
                file_name,
                mime: att.mime,
                bytes,
            });
        }
        Ok(PostUpload {
            caption: self.caption,
            files,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_mime_by_extension() {
        assert_eq!(image_mime(Path::new("a.JPG")), Some("image/jpeg"));
        assert_eq!(image_mime(Path::new("dir/b.webp")), Some("image/webp"));
        assert_eq!(image_mime(Path::new("notes.txt")), None);
        assert_eq!(image_mime(Path::new("no_extension")), None);
    }

    #[test]
    fn test_non_images_are_rejected() {
        let mut draft = NewPostDraft::new("hi");
        assert!(draft.add_file("cat.png"));
        assert!(!draft.add_file("cat.pdf"));
        assert_eq!(draft.attachments().len(), 1);
    }

    #[test]
    fn test_blank_caption_is_incomplete() {
        let mut draft = NewPostDraft::new("   ");
        draft.add_file("cat.png");
        assert_eq!(draft.validate(), Err(DraftError::Incomplete));
    }

    #[test]
    fn test_no_attachments_is_incomplete() {
        let draft = NewPostDraft::new("caption");
        assert_eq!(draft.validate(), Err(DraftError::Incomplete));
        assert_eq!(
            DraftError::Incomplete.to_string(),
            "Caption and at least one attachment are required."
        );
    }

    #[test]
    fn test_remove_attachment_by_index() {
        let mut draft = NewPostDraft::new("caption");
        draft.add_file("a.png");
        draft.add_file("b.gif");
        let removed = draft.remove_attachment(0).unwrap();
        assert_eq!(removed.path, PathBuf::from("a.png"));
        assert_eq!(draft.attachments()[0].mime, "image/gif");
        assert!(draft.remove_attachment(5).is_none());
        assert!(draft.validate().is_ok());
    }

    #[test]
    fn test_remove_several_attachments() {
        let mut draft = NewPostDraft::new("caption");
        for name in ["a.png", "b.png", "c.png", "d.png"] {
            draft.add_file(name);
        }
        let missing = draft.remove_attachments(&[0, 2, 2, 9]);
        assert_eq!(missing, vec![9]);
        let left: Vec<_> = draft.attachments().iter().map(|a| a.path.clone()).collect();
        assert_eq!(left, vec![PathBuf::from("b.png"), PathBuf::from("d.png")]);
        assert_eq!(draft.caption(), "caption");
    }

    #[tokio::test]
    async fn test_missing_file_is_unreadable() {
        let mut draft = NewPostDraft::new("caption");
        draft.add_file("/definitely/not/here.png");
        let err = draft.into_upload().await.unwrap_err();
        assert!(matches!(err, DraftError::Unreadable { .. }));
    }
}
