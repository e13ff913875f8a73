//! Input events that can carry attachments: clipboard pastes and file selections.

use std::path::PathBuf;

use super::attachments::AttachmentSource;

/// The payload behind a single clipboard item.
#[derive(Debug, Clone, PartialEq)]
pub enum ClipboardData {
    Text(String),
    File(PathBuf),
    Bytes(Vec<u8>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClipboardItem {
    /// Declared content type, e.g. `text/plain` or `image/png`.
    pub mime_type: String,
    pub data: ClipboardData,
}

impl ClipboardItem {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            mime_type: "text/plain".to_string(),
            data: ClipboardData::Text(text.into()),
        }
    }

    pub fn image_bytes(mime_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            mime_type: mime_type.into(),
            data: ClipboardData::Bytes(bytes),
        }
    }

    pub fn file(mime_type: impl Into<String>, path: PathBuf) -> Self {
        Self {
            mime_type: mime_type.into(),
            data: ClipboardData::File(path),
        }
    }

    pub fn is_image(&self) -> bool {
        self.mime_type.starts_with("image/")
    }

    /// The file-like object behind an image item. `None` for non-image items and for image items
    /// that only carry text.
    pub fn into_attachment_source(self) -> Option<AttachmentSource> {
        if !self.is_image() {
            return None;
        }
        match self.data {
            ClipboardData::File(path) => Some(AttachmentSource::File(path)),
            ClipboardData::Bytes(bytes) => Some(AttachmentSource::Bytes {
                label: "pasted image".to_string(),
                mime_type: self.mime_type,
                bytes,
            }),
            ClipboardData::Text(_) => None,
        }
    }
}

/// A paste carrying one or more clipboard items.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClipboardEvent {
    pub items: Vec<ClipboardItem>,
}

impl ClipboardEvent {
    pub fn new(items: Vec<ClipboardItem>) -> Self {
        Self { items }
    }

    /// Concatenated text of the plain-text items, in clipboard order.
    pub fn text(&self) -> Option<String> {
        let text: String = self
            .items
            .iter()
            .filter(|item| !item.is_image())
            .filter_map(|item| match &item.data {
                ClipboardData::Text(text) => Some(text.as_str()),
                _ => None,
            })
            .collect();
        (!text.is_empty()).then_some(text)
    }
}

/// Files chosen through a picker (or dropped onto the terminal), in enumeration order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FileSelection {
    pub files: Vec<PathBuf>,
}

impl FileSelection {
    pub fn new(files: Vec<PathBuf>) -> Self {
        Self { files }
    }
}
