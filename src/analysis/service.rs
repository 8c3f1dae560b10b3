use std::io::Write;
use std::time::Duration;

use bytes::Bytes;
use tempfile::NamedTempFile;
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    analysis::{repo::AnalysisResult, suggestions::select_suggestion},
    error::ApiError,
    inference::Prediction,
    state::AppState,
};

/// Formats accepted for analysis, by sniffed MIME type. Both the plain and
/// `x-` prefixed names appear because sniffers and clients disagree.
const ALLOWED_AUDIO_MIME: &[&str] = &[
    "audio/mpeg",
    "audio/wav",
    "audio/x-wav",
    "audio/ogg",
    "audio/aac",
    "audio/m4a",
    "audio/x-m4a",
    "audio/flac",
    "audio/x-flac",
];

/// Upper bound on the whole outbound phase (blob upload + inference).
const PIPELINE_TIMEOUT: Duration = Duration::from_secs(90);

pub struct AudioUpload {
    pub file_name: String,
    pub bytes: Bytes,
}

pub struct AnalysisOutcome {
    pub record: AnalysisResult,
    pub prediction: Prediction,
}

/// Scratch copy of the upload on local disk. The backing temp file is
/// removed when this drops, on every exit path.
struct StagedAudio {
    file: NamedTempFile,
}

impl StagedAudio {
    fn create(bytes: &[u8]) -> anyhow::Result<Self> {
        let mut file = NamedTempFile::new()?;
        file.write_all(bytes)?;
        file.flush()?;
        Ok(Self { file })
    }

    #[allow(dead_code)]
    fn path(&self) -> &std::path::Path {
        self.file.path()
    }
}

fn sniff_audio_mime(bytes: &[u8]) -> Option<&'static str> {
    infer::get(bytes).map(|kind| kind.mime_type())
}

fn is_allowed_audio(mime: &str) -> bool {
    ALLOWED_AUDIO_MIME.contains(&mime)
}

fn sanitize_file_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    if cleaned.is_empty() {
        "audio".into()
    } else {
        cleaned
    }
}

fn object_key(user_id: Uuid, file_name: &str) -> String {
    format!(
        "audio/{}/{}-{}",
        user_id,
        Uuid::new_v4(),
        sanitize_file_name(file_name)
    )
}

async fn cleanup_blob(st: &AppState, key: &str) {
    if let Err(e) = st.storage.delete_object(key).await {
        warn!(error = %e, %key, "blob cleanup failed");
    }
}

/// Runs one upload through the full pipeline: stage locally, sniff the real
/// content type, ship the bytes to blob storage and the model concurrently,
/// pick a suggestion, and persist one result row for the caller.
pub async fn analyze_upload(
    st: &AppState,
    user_id: Uuid,
    upload: AudioUpload,
) -> Result<AnalysisOutcome, ApiError> {
    let _staged = StagedAudio::create(&upload.bytes).map_err(ApiError::Internal)?;

    let mime = sniff_audio_mime(&upload.bytes)
        .ok_or_else(|| ApiError::validation("unrecognized audio format"))?;
    if !is_allowed_audio(mime) {
        return Err(ApiError::validation(format!(
            "unsupported audio format: {mime}"
        )));
    }

    let key = object_key(user_id, &upload.file_name);
    let joined = tokio::time::timeout(PIPELINE_TIMEOUT, async {
        tokio::join!(
            st.storage.put_object(&key, upload.bytes.clone(), mime),
            st.inference
                .classify(&upload.file_name, mime, upload.bytes.clone()),
        )
    })
    .await;

    let (stored, predicted) = match joined {
        Ok(pair) => pair,
        Err(_) => {
            // The upload future was dropped mid-flight; the object may or
            // may not exist, so try to remove it either way.
            cleanup_blob(st, &key).await;
            return Err(ApiError::Upstream {
                status: None,
                message: "analysis timed out".into(),
            });
        }
    };

    let locator = match stored {
        Ok(locator) => locator,
        Err(e) => {
            warn!(error = %e, %key, "blob upload failed");
            return Err(ApiError::Upstream {
                status: None,
                message: "blob store upload failed".into(),
            });
        }
    };

    let prediction = match predicted {
        Ok(p) => p,
        Err(e) => {
            cleanup_blob(st, &key).await;
            return Err(ApiError::Upstream {
                status: e.upstream_status(),
                message: e.to_string(),
            });
        }
    };

    let suggestion = select_suggestion(prediction.label.as_str(), &mut rand::thread_rng());

    let record = match AnalysisResult::insert(
        &st.db,
        user_id,
        prediction.label.as_str(),
        suggestion,
        &upload.file_name,
        Some(&locator),
    )
    .await
    {
        Ok(record) => record,
        Err(e) => {
            cleanup_blob(st, &key).await;
            return Err(ApiError::Internal(e));
        }
    };

    info!(
        user_id = %user_id,
        analysis_id = %record.id,
        label = prediction.label.as_str(),
        "analysis stored"
    );

    Ok(AnalysisOutcome { record, prediction })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inference::{InferenceClient, InferenceError, ScreeningLabel};
    use crate::mailer::Mailer;
    use crate::storage::StorageClient;
    use axum::async_trait;
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex,
    };

    struct RecordingStorage {
        fail_put: bool,
        puts: AtomicUsize,
        deleted: Mutex<Vec<String>>,
    }

    impl RecordingStorage {
        fn new(fail_put: bool) -> Arc<Self> {
            Arc::new(Self {
                fail_put,
                puts: AtomicUsize::new(0),
                deleted: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl StorageClient for RecordingStorage {
        async fn put_object(
            &self,
            key: &str,
            _body: Bytes,
            _content_type: &str,
        ) -> anyhow::Result<String> {
            self.puts.fetch_add(1, Ordering::SeqCst);
            if self.fail_put {
                anyhow::bail!("put refused");
            }
            Ok(format!("s3://test-bucket/{key}"))
        }

        async fn delete_object(&self, key: &str) -> anyhow::Result<()> {
            self.deleted.lock().unwrap().push(key.to_string());
            Ok(())
        }
    }

    struct ScriptedInference {
        fail_status: Option<u16>,
        calls: AtomicUsize,
    }

    impl ScriptedInference {
        fn ok() -> Arc<Self> {
            Arc::new(Self {
                fail_status: None,
                calls: AtomicUsize::new(0),
            })
        }

        fn failing(status: u16) -> Arc<Self> {
            Arc::new(Self {
                fail_status: Some(status),
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl InferenceClient for ScriptedInference {
        async fn classify(
            &self,
            _file_name: &str,
            _content_type: &str,
            _body: Bytes,
        ) -> Result<Prediction, InferenceError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.fail_status {
                Some(status) => Err(InferenceError::Api {
                    status,
                    body: "model unavailable".into(),
                }),
                None => Ok(Prediction {
                    label: ScreeningLabel::NotDepressed,
                    confidence: 0.8,
                }),
            }
        }
    }

    struct NullMailer;

    #[async_trait]
    impl Mailer for NullMailer {
        async fn send_otp(&self, _to: &str, _code: &str) -> anyhow::Result<()> {
            Ok(())
        }
    }

    fn state_with(
        storage: Arc<RecordingStorage>,
        inference: Arc<ScriptedInference>,
    ) -> AppState {
        let base = AppState::fake();
        AppState::from_parts(base.db, base.config, storage, inference, Arc::new(NullMailer))
    }

    fn wav_bytes() -> Bytes {
        let mut v = Vec::with_capacity(64);
        v.extend_from_slice(b"RIFF");
        v.extend_from_slice(&36u32.to_le_bytes());
        v.extend_from_slice(b"WAVEfmt ");
        v.extend_from_slice(&[0u8; 32]);
        Bytes::from(v)
    }

    #[test]
    fn staged_file_is_removed_on_drop() {
        let staged = StagedAudio::create(b"some audio bytes").expect("stage");
        let path = staged.path().to_path_buf();
        assert!(path.exists());
        drop(staged);
        assert!(!path.exists());
    }

    #[test]
    fn sniffs_wav_from_leading_bytes() {
        let mime = sniff_audio_mime(&wav_bytes()).expect("wav should be recognized");
        assert_eq!(mime, "audio/x-wav");
        assert!(is_allowed_audio(mime));
    }

    #[test]
    fn plain_text_is_not_recognized_as_audio() {
        assert_eq!(sniff_audio_mime(b"hello, this is text"), None);
    }

    #[test]
    fn sanitizes_hostile_file_names() {
        assert_eq!(sanitize_file_name("my recording.wav"), "my_recording.wav");
        assert_eq!(sanitize_file_name("../../etc/passwd"), ".._.._etc_passwd");
        assert_eq!(sanitize_file_name(""), "audio");
    }

    #[tokio::test]
    async fn unsupported_content_is_rejected_before_any_outbound_call() {
        let storage = RecordingStorage::new(false);
        let inference = ScriptedInference::ok();
        let state = state_with(storage.clone(), inference.clone());

        let result = analyze_upload(
            &state,
            Uuid::new_v4(),
            AudioUpload {
                file_name: "notes.txt".into(),
                bytes: Bytes::from_static(b"just some plain text"),
            },
        )
        .await;

        assert!(matches!(result, Err(ApiError::Validation(_))));
        assert_eq!(storage.puts.load(Ordering::SeqCst), 0);
        assert_eq!(inference.calls.load(Ordering::SeqCst), 0);
        assert!(storage.deleted.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn inference_failure_deletes_the_uploaded_blob() {
        let storage = RecordingStorage::new(false);
        let inference = ScriptedInference::failing(500);
        let state = state_with(storage.clone(), inference.clone());

        let result = analyze_upload(
            &state,
            Uuid::new_v4(),
            AudioUpload {
                file_name: "voice.wav".into(),
                bytes: wav_bytes(),
            },
        )
        .await;

        match result {
            Err(ApiError::Upstream { status, .. }) => assert_eq!(status, Some(500)),
            Err(other) => panic!("expected upstream error, got {other:?}"),
            Ok(_) => panic!("expected upstream error, got success"),
        }
        assert_eq!(storage.puts.load(Ordering::SeqCst), 1);
        let deleted = storage.deleted.lock().unwrap();
        assert_eq!(deleted.len(), 1);
        assert!(deleted[0].starts_with("audio/"));
    }

    #[tokio::test]
    async fn blob_upload_failure_fails_the_request() {
        let storage = RecordingStorage::new(true);
        let inference = ScriptedInference::ok();
        let state = state_with(storage.clone(), inference.clone());

        let result = analyze_upload(
            &state,
            Uuid::new_v4(),
            AudioUpload {
                file_name: "voice.wav".into(),
                bytes: wav_bytes(),
            },
        )
        .await;

        assert!(matches!(
            result,
            Err(ApiError::Upstream { status: None, .. })
        ));
        // Nothing was stored, so nothing needs cleaning up.
        assert!(storage.deleted.lock().unwrap().is_empty());
    }
}
