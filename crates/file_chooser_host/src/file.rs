//! File-like values produced by acquisition and compression.

use std::{any::Any, future::Future, pin::Pin, rc::Rc};

use leptos::logging;

use crate::{time::unix_time_ms_now, ChooserError};

/// Object-safe boxed future used by [`FileLike`] reads.
pub type FileFuture<'a, T> = Pin<Box<dyn Future<Output = T> + 'a>>;

/// Shared handle to a selected or produced file.
pub type ChooserFile = Rc<dyn FileLike>;

/// Extensions treated as compressible images.
pub const IMAGE_EXTENSIONS: [&str; 4] = ["gif", "jpg", "jpeg", "png"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Concrete representation behind a [`FileLike`].
pub enum FileLikeKind {
    /// Native file object.
    File,
    /// Content blob tagged with a name and timestamp after file construction failed.
    Blob,
}

/// Binary content plus the metadata callers read from it.
///
/// Both representations in [`FileLikeKind`] implement this trait; callers should not branch
/// on the representation.
pub trait FileLike {
    /// File name including its extension.
    fn name(&self) -> String;

    /// Content length in bytes.
    fn size(&self) -> u64;

    /// Mime type, empty when unknown.
    fn mime_type(&self) -> String;

    /// Last-modified unix timestamp in milliseconds.
    fn last_modified_ms(&self) -> u64;

    /// Representation backing this value.
    fn kind(&self) -> FileLikeKind;

    /// Reads the full content.
    fn read_bytes(&self) -> FileFuture<'_, Result<Vec<u8>, String>>;

    /// Allows host factories to recover their concrete type.
    fn as_any(&self) -> &dyn Any;
}

impl std::fmt::Debug for dyn FileLike {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileLike")
            .field("name", &self.name())
            .field("size", &self.size())
            .field("kind", &self.kind())
            .finish()
    }
}

/// Host constructor for the two [`FileLikeKind`] representations.
pub trait FileFactory {
    /// Builds a native file from decoded bytes.
    fn from_bytes(
        &self,
        bytes: Vec<u8>,
        name: &str,
        mime_type: &str,
    ) -> Result<ChooserFile, String>;

    /// Re-wraps `source` as a native file named `name`.
    fn to_file(&self, source: &ChooserFile, name: &str) -> Result<ChooserFile, String>;

    /// Re-wraps `source` as a blob stamped with `name` and `last_modified_ms`.
    fn to_blob(
        &self,
        source: &ChooserFile,
        name: &str,
        last_modified_ms: u64,
    ) -> Result<ChooserFile, String>;
}

/// Re-wraps a file into the canonical representation, falling back to a stamped blob.
///
/// # Errors
///
/// Returns an `Other` error when neither representation can be constructed.
pub fn rewrap_file(
    factory: &dyn FileFactory,
    source: &ChooserFile,
    name: &str,
) -> Result<ChooserFile, ChooserError> {
    match factory.to_file(source, name) {
        Ok(file) => Ok(file),
        Err(err) => {
            logging::warn!("file construction failed for `{name}`, using blob fallback: {err}");
            factory
                .to_blob(source, name, unix_time_ms_now())
                .map_err(ChooserError::other)
        }
    }
}

/// Returns the lowercase extension of the last path segment, without the dot.
pub fn file_extension(name: &str) -> Option<String> {
    let base = name.rsplit('/').next().unwrap_or(name);
    base.rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .filter(|ext| !ext.is_empty())
}

/// Returns whether the file name carries one of [`IMAGE_EXTENSIONS`].
pub fn is_image_name(name: &str) -> bool {
    file_extension(name).is_some_and(|ext| IMAGE_EXTENSIONS.contains(&ext.as_str()))
}

/// Returns whether `file` matches a comma-separated list of dotted extensions (`.png,.jpg`).
pub fn matches_extensions(file: &dyn FileLike, extensions: &str) -> bool {
    let Some(ext) = file_extension(&file.name()) else {
        return false;
    };
    extensions
        .split(',')
        .map(|entry| entry.trim().trim_start_matches('.'))
        .any(|entry| entry.eq_ignore_ascii_case(&ext))
}

/// Maps a mime type to the extension used when naming bridge-produced files.
pub fn extension_for_mime(mime_type: &str) -> &'static str {
    match mime_type.to_ascii_lowercase().as_str() {
        "image/png" => "png",
        "image/gif" => "gif",
        "image/webp" => "webp",
        _ => "jpg",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{MemoryFile, MemoryFileFactory};

    #[test]
    fn extension_uses_last_segment_and_lowercases() {
        assert_eq!(file_extension("a/b.dir/photo.JPG"), Some("jpg".into()));
        assert_eq!(file_extension("archive.tar.gz"), Some("gz".into()));
        assert_eq!(file_extension("README"), None);
        assert_eq!(file_extension("trailing."), None);
    }

    #[test]
    fn image_detection_is_case_insensitive() {
        assert!(is_image_name("a.PNG"));
        assert!(is_image_name("a.jpeg"));
        assert!(is_image_name("a.JPEG"));
        assert!(!is_image_name("a.pdf"));
        assert!(!is_image_name("png"));
    }

    #[test]
    fn extension_filter_accepts_dotted_list() {
        let file = MemoryFile::new("scan.PDF", "application/pdf", vec![1, 2]);
        assert!(matches_extensions(&file, ".png, .pdf"));
        assert!(!matches_extensions(&file, ".png,.jpg"));
    }

    #[test]
    fn rewrap_falls_back_to_stamped_blob() {
        let factory = MemoryFileFactory::default();
        factory.fail_file_construction(true);
        let source: ChooserFile = Rc::new(MemoryFile::new("a.png", "image/png", vec![7; 4]));

        let wrapped = rewrap_file(&factory, &source, "renamed.png").expect("rewrap");

        assert_eq!(wrapped.kind(), FileLikeKind::Blob);
        assert_eq!(wrapped.name(), "renamed.png");
        assert!(wrapped.last_modified_ms() > 0);
        assert_eq!(wrapped.size(), 4);
    }

    #[test]
    fn rewrap_prefers_native_file() {
        let factory = MemoryFileFactory::default();
        let source: ChooserFile = Rc::new(MemoryFile::new("a.txt", "text/plain", vec![1]));

        let wrapped = rewrap_file(&factory, &source, "a.txt").expect("rewrap");

        assert_eq!(wrapped.kind(), FileLikeKind::File);
    }
}
