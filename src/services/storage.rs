use std::path::{Path, PathBuf};

use futures::{Stream, StreamExt};
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

/// Flat on-disk store for uploaded sources and translated outputs.
///
/// Every file name is derived from a job id or a sanitized original name,
/// so concurrent jobs never collide and nothing outside the directory is
/// ever addressable.
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Open the store, creating the directory if needed.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir).map_err(|e| StorageError::Io {
            path: dir.clone(),
            source: e,
        })?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Persist an uploaded source document under an id-derived temp name.
    pub async fn save_upload(
        &self,
        job_id: Uuid,
        original_filename: &str,
        bytes: &[u8],
    ) -> Result<PathBuf, StorageError> {
        let (base, ext) = split_name(original_filename);
        let mut safe_base = sanitize_component(base);
        safe_base.truncate(50);
        let path = self.dir.join(format!("upload_{job_id}_{safe_base}{ext}"));
        tokio::fs::write(&path, bytes)
            .await
            .map_err(|e| StorageError::Io {
                path: path.clone(),
                source: e,
            })?;
        Ok(path)
    }

    /// Persist a translated result under the given (already derived) name,
    /// draining the stream chunk by chunk.
    ///
    /// Chunks land in a staging file that is renamed into place only after
    /// the stream ends cleanly; an interrupted download never leaves a
    /// downloadable partial result.
    pub async fn write_output_stream<S, E>(
        &self,
        filename: &str,
        mut stream: S,
    ) -> Result<PathBuf, StorageError>
    where
        S: Stream<Item = Result<Vec<u8>, E>> + Unpin,
        E: std::fmt::Display,
    {
        let path = self.dir.join(filename);
        let part_path = self.dir.join(format!("{filename}.part"));

        let written = async {
            let mut file = tokio::fs::File::create(&part_path)
                .await
                .map_err(|e| StorageError::Io {
                    path: part_path.clone(),
                    source: e,
                })?;
            while let Some(chunk) = stream.next().await {
                let chunk = chunk.map_err(|e| StorageError::Stream(e.to_string()))?;
                file.write_all(&chunk).await.map_err(|e| StorageError::Io {
                    path: part_path.clone(),
                    source: e,
                })?;
            }
            file.flush().await.map_err(|e| StorageError::Io {
                path: part_path.clone(),
                source: e,
            })?;
            tokio::fs::rename(&part_path, &path)
                .await
                .map_err(|e| StorageError::Io {
                    path: path.clone(),
                    source: e,
                })?;
            Ok(path.clone())
        }
        .await;

        if written.is_err() {
            let _ = tokio::fs::remove_file(&part_path).await;
        }
        written
    }

    /// Resolve a client-requested download name to a path inside the store.
    ///
    /// The name is sanitized first; anything still containing a traversal
    /// sequence, a path separator, or an absolute prefix is rejected before
    /// any filesystem lookup happens.
    pub fn resolve_download(&self, requested: &str) -> Result<PathBuf, StorageError> {
        if requested.starts_with('/') || requested.starts_with('\\') {
            return Err(StorageError::InvalidName(requested.to_string()));
        }
        let safe = sanitize_download_name(requested);
        if safe.is_empty() || safe.contains("..") {
            return Err(StorageError::InvalidName(requested.to_string()));
        }
        if safe != requested {
            tracing::warn!(requested, sanitized = %safe, "download name sanitized");
        }
        Ok(self.dir.join(safe))
    }
}

/// Derive the public name of a translated output file:
/// `{sanitized base}_translated_{target_lang}{original extension}`.
pub fn output_filename(original_filename: &str, target_lang: &str) -> String {
    let (base, ext) = split_name(original_filename);
    let safe_base = sanitize_component(base);
    format!("{safe_base}_translated_{target_lang}{ext}")
}

/// Split a filename into base name and extension (dot included).
pub fn split_name(filename: &str) -> (&str, &str) {
    match filename.rfind('.') {
        Some(idx) if idx > 0 => filename.split_at(idx),
        _ => (filename, ""),
    }
}

/// Keep alphanumerics, hyphens and underscores; everything else becomes an
/// underscore. Leading/trailing underscores are trimmed.
pub fn sanitize_component(name: &str) -> String {
    let replaced: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    replaced.trim_matches('_').to_string()
}

/// Like `sanitize_component` but keeps dots, for full filenames.
fn sanitize_download_name(name: &str) -> String {
    let replaced: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.' {
                c
            } else {
                '_'
            }
        })
        .collect();
    replaced.trim_matches('_').to_string()
}

/// Removes the wrapped file when dropped, so the uploaded source is released
/// exactly once on every runner exit path.
pub struct TempFileGuard {
    path: PathBuf,
}

impl TempFileGuard {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for TempFileGuard {
    fn drop(&mut self) {
        match std::fs::remove_file(&self.path) {
            Ok(()) => tracing::debug!(path = %self.path.display(), "temp upload removed"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "failed to remove temp upload")
            }
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid file name: {0}")]
    InvalidName(String),

    #[error("download stream failed: {0}")]
    Stream(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_replaces_specials_and_trims() {
        assert_eq!(sanitize_component("Relatório Final!"), "Relat_rio_Final");
        assert_eq!(sanitize_component("__x__"), "x");
        assert_eq!(sanitize_component("a b/c"), "a_b_c");
    }

    #[test]
    fn output_filename_embeds_language_and_extension() {
        assert_eq!(
            output_filename("Annual Report.docx", "en"),
            "Annual_Report_translated_en.docx"
        );
        assert_eq!(output_filename("notes", "pt"), "notes_translated_pt");
    }

    #[test]
    fn split_name_handles_dotfiles_and_missing_extension() {
        assert_eq!(split_name("a.txt"), ("a", ".txt"));
        assert_eq!(split_name("archive.tar.gz"), ("archive.tar", ".gz"));
        assert_eq!(split_name("noext"), ("noext", ""));
        assert_eq!(split_name(".hidden"), (".hidden", ""));
    }

    #[test]
    fn resolve_download_rejects_traversal() {
        let tmp = tempfile::tempdir().unwrap();
        let store = FileStore::new(tmp.path()).unwrap();

        assert!(store.resolve_download("../../etc/passwd").is_err());
        assert!(store.resolve_download("/etc/passwd").is_err());
        assert!(store.resolve_download("..\\secret").is_err());
        assert!(store.resolve_download("").is_err());
    }

    #[test]
    fn resolve_download_accepts_plain_names() {
        let tmp = tempfile::tempdir().unwrap();
        let store = FileStore::new(tmp.path()).unwrap();

        let path = store.resolve_download("doc_translated_en.txt").unwrap();
        assert_eq!(path, tmp.path().join("doc_translated_en.txt"));
    }

    #[tokio::test]
    async fn save_upload_uses_id_derived_name() {
        let tmp = tempfile::tempdir().unwrap();
        let store = FileStore::new(tmp.path()).unwrap();
        let id = Uuid::new_v4();

        let path = store.save_upload(id, "my report.txt", b"body").await.unwrap();
        let name = path.file_name().unwrap().to_str().unwrap();
        assert!(name.starts_with(&format!("upload_{id}_")));
        assert!(name.ends_with(".txt"));
        assert_eq!(std::fs::read(&path).unwrap(), b"body");
    }

    #[tokio::test]
    async fn write_output_stream_assembles_chunks() {
        let tmp = tempfile::tempdir().unwrap();
        let store = FileStore::new(tmp.path()).unwrap();
        let chunks: Vec<Result<Vec<u8>, String>> =
            vec![Ok(b"hel".to_vec()), Ok(b"lo".to_vec())];

        let path = store
            .write_output_stream("out.txt", futures::stream::iter(chunks))
            .await
            .unwrap();

        assert_eq!(std::fs::read(&path).unwrap(), b"hello");
        assert!(!tmp.path().join("out.txt.part").exists());
    }

    #[tokio::test]
    async fn interrupted_stream_leaves_no_output_files() {
        let tmp = tempfile::tempdir().unwrap();
        let store = FileStore::new(tmp.path()).unwrap();
        let chunks: Vec<Result<Vec<u8>, String>> =
            vec![Ok(b"partial".to_vec()), Err("connection reset".to_string())];

        let result = store
            .write_output_stream("out.txt", futures::stream::iter(chunks))
            .await;

        assert!(matches!(result, Err(StorageError::Stream(_))));
        assert!(!tmp.path().join("out.txt").exists());
        assert!(!tmp.path().join("out.txt.part").exists());
    }

    #[test]
    fn temp_guard_removes_file_on_drop() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("upload_x.txt");
        std::fs::write(&path, b"data").unwrap();

        {
            let _guard = TempFileGuard::new(path.clone());
        }
        assert!(!path.exists());
    }

    #[test]
    fn temp_guard_tolerates_already_removed_file() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("gone.txt");
        let _guard = TempFileGuard::new(path);
        // Drop runs with no file present; must not panic.
    }
}
