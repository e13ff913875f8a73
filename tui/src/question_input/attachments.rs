//! Background conversion of pasted and picked images into data URLs.
//!
//! Intake never blocks: every file becomes its own tokio task that reads the bytes, encodes them,
//! and appends the result to a shared [`AttachmentList`] when it finishes. The list therefore
//! reflects completion order, not the order files were handed in.
//!
//! Each task is tied to the pipeline's current *generation*. [`AttachmentPipeline::reset`] (and
//! dropping the pipeline) cancels every outstanding task and bumps the generation under the list
//! lock, so a decode that raced the reset can never append into the next turn's list.

use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;
use std::sync::PoisonError;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;

use question_input_protocol::DataUrl;
use question_input_protocol::DataUrlError;
use tokio_util::sync::CancellationToken;

use crate::app_event::AppEvent;
use crate::app_event_sender::AppEventSender;

/// Something that can be turned into an image attachment.
#[derive(Debug, Clone, PartialEq)]
pub enum AttachmentSource {
    /// A file on disk (file picker, dropped path, `--attach`).
    File(PathBuf),
    /// In-memory bytes with a declared MIME type (clipboard image).
    Bytes {
        label: String,
        mime_type: String,
        bytes: Vec<u8>,
    },
}

impl AttachmentSource {
    pub fn label(&self) -> String {
        match self {
            AttachmentSource::File(path) => path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string()),
            AttachmentSource::Bytes { label, .. } => label.clone(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("could not determine the type of {label}")]
    UnknownType { label: String },
    #[error("{label} is not an image ({mime_type})")]
    NotAnImage { label: String, mime_type: String },
    #[error("failed to encode {label}: {source}")]
    Encode {
        label: String,
        #[source]
        source: DataUrlError,
    },
}

/// Read `source` and encode it as a `data:<mime>;base64,...` URL.
///
/// Files are typed by sniffing their leading bytes, falling back to the file extension. Only
/// `image/*` types are accepted; the image itself is not validated.
pub async fn decode_to_data_url(source: AttachmentSource) -> Result<DataUrl, DecodeError> {
    let label = source.label();
    let (mime_type, bytes) = match source {
        AttachmentSource::File(path) => {
            let bytes = tokio::fs::read(&path)
                .await
                .map_err(|source| DecodeError::Read {
                    path: path.clone(),
                    source,
                })?;
            let Some(mime_type) = detect_mime_type(&path, &bytes) else {
                return Err(DecodeError::UnknownType { label });
            };
            (mime_type, bytes)
        }
        AttachmentSource::Bytes {
            mime_type, bytes, ..
        } => (mime_type, bytes),
    };

    if !mime_type.starts_with("image/") {
        return Err(DecodeError::NotAnImage { label, mime_type });
    }
    DataUrl::encode(&mime_type, &bytes).map_err(|source| DecodeError::Encode { label, source })
}

fn detect_mime_type(path: &Path, bytes: &[u8]) -> Option<String> {
    image::guess_format(bytes)
        .ok()
        .map(|format| format.to_mime_type().to_string())
        .or_else(|| mime_guess::from_path(path).first_raw().map(str::to_string))
}

#[derive(Debug, Default)]
struct Entries {
    urls: Vec<DataUrl>,
    generation: u64,
}

/// Append-only list of decoded attachments shared with in-flight decode tasks.
#[derive(Debug, Clone, Default)]
pub struct AttachmentList {
    inner: Arc<Mutex<Entries>>,
}

impl AttachmentList {
    pub fn snapshot(&self) -> Vec<DataUrl> {
        self.lock().urls.clone()
    }

    pub fn len(&self) -> usize {
        self.lock().urls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().urls.is_empty()
    }

    fn generation(&self) -> u64 {
        self.lock().generation
    }

    fn is_current(&self, generation: u64) -> bool {
        self.lock().generation == generation
    }

    /// Appends `url` unless the list was reset after the decode started.
    fn push_if_current(&self, generation: u64, url: DataUrl) -> bool {
        let mut entries = self.lock();
        if entries.generation != generation {
            return false;
        }
        entries.urls.push(url);
        true
    }

    fn reset(&self) {
        let mut entries = self.lock();
        entries.urls.clear();
        entries.generation += 1;
    }

    fn lock(&self) -> MutexGuard<'_, Entries> {
        // A panicking holder cannot leave `Entries` half-updated.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Decrements the in-flight counter when a decode task ends, however it ends.
struct PendingGuard(Arc<AtomicUsize>);

impl Drop for PendingGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

pub struct AttachmentPipeline {
    list: AttachmentList,
    pending: Arc<AtomicUsize>,
    cancel: CancellationToken,
    app_event_tx: AppEventSender,
}

impl AttachmentPipeline {
    pub fn new(app_event_tx: AppEventSender) -> Self {
        Self {
            list: AttachmentList::default(),
            pending: Arc::new(AtomicUsize::new(0)),
            cancel: CancellationToken::new(),
            app_event_tx,
        }
    }

    pub fn list(&self) -> &AttachmentList {
        &self.list
    }

    /// Number of decodes that have been submitted but not finished yet.
    pub fn pending(&self) -> usize {
        self.pending.load(Ordering::SeqCst)
    }

    /// Start decoding `source` in the background and return immediately.
    ///
    /// Must be called from within a tokio runtime. Completion is reported through
    /// [`AppEvent::AttachmentDecoded`] or [`AppEvent::AttachmentFailed`]; cancelled decodes report
    /// nothing.
    pub fn submit(&self, source: AttachmentSource) {
        let label = source.label();
        tracing::debug!("decoding attachment {label}");

        self.pending.fetch_add(1, Ordering::SeqCst);
        let pending = PendingGuard(Arc::clone(&self.pending));
        let generation = self.list.generation();
        let list = self.list.clone();
        let cancel = self.cancel.clone();
        let app_event_tx = self.app_event_tx.clone();

        tokio::spawn(async move {
            let result = tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::debug!("decode of {label} cancelled");
                    return;
                }
                result = decode_to_data_url(source) => result,
            };
            drop(pending);

            match result {
                Ok(url) => {
                    if list.push_if_current(generation, url) {
                        app_event_tx.send(AppEvent::AttachmentDecoded { label });
                    } else {
                        tracing::debug!("dropping {label}: attachments were reset");
                    }
                }
                Err(error) if list.is_current(generation) => {
                    tracing::warn!("failed to attach image: {error}");
                    app_event_tx.send(AppEvent::AttachmentFailed { label, error });
                }
                Err(error) => tracing::debug!("ignoring stale decode failure: {error}"),
            }
        });
    }

    /// Cancel outstanding decodes and empty the list.
    pub fn reset(&mut self) {
        self.cancel.cancel();
        self.cancel = CancellationToken::new();
        self.list.reset();
    }
}

impl Drop for AttachmentPipeline {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
