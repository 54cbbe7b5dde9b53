//! Count, type, and size rules applied to a selection before compression.

use crate::{
    file::matches_extensions, format::format_bytes, ChooserError, ChooserFile, ChooserOptions,
};

/// Checks a selection against the count, type, and size limits in `options`.
///
/// The count gate runs first. Files are then checked in selection order, type before size,
/// and the first violation is returned without looking at the remaining files.
///
/// # Errors
///
/// Returns `InvalidCount`, `InvalidType`, or `InvalidSize` for the first violation found.
pub fn validate_files(files: &[ChooserFile], options: &ChooserOptions) -> Result<(), ChooserError> {
    if options.is_multiple() {
        if let Some(max_count) = options.max_count() {
            if files.len() > max_count {
                return Err(ChooserError::invalid_count(format!(
                    "at most {max_count} files can be selected"
                )));
            }
        }
    }

    let limits = options.file_type_limits();
    let dotted = limits
        .iter()
        .map(|ext| format!(".{ext}"))
        .collect::<Vec<_>>()
        .join(",");
    let min_bytes = options.min_size_bytes();
    let max_bytes = options.max_size_bytes();

    for file in files {
        if !limits.is_empty() && !matches_extensions(file.as_ref(), &dotted) {
            return Err(ChooserError::invalid_type(format!(
                "only {} files are supported",
                limits.join(",")
            )));
        }

        if min_bytes.is_none() && max_bytes.is_none() {
            continue;
        }
        let size = file.size();
        if let Some(min) = min_bytes {
            if size < min {
                return Err(ChooserError::invalid_size(format!(
                    "files must be at least {}",
                    format_bytes(min)
                )));
            }
        }
        if let Some(max) = max_bytes {
            if size > max {
                return Err(ChooserError::invalid_size(format!(
                    "files must be at most {}",
                    format_bytes(max)
                )));
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::{any::Any, cell::Cell, rc::Rc};

    use super::*;
    use crate::{
        file::{FileFuture, FileLike, FileLikeKind},
        memory::MemoryFile,
        ChooserErrorKind,
    };

    fn file(name: &str, size: usize) -> ChooserFile {
        Rc::new(MemoryFile::new(name, "", vec![0; size]))
    }

    struct ProbeFile {
        name: String,
        size: u64,
        reads: Rc<Cell<usize>>,
    }

    impl FileLike for ProbeFile {
        fn name(&self) -> String {
            self.reads.set(self.reads.get() + 1);
            self.name.clone()
        }

        fn size(&self) -> u64 {
            self.reads.set(self.reads.get() + 1);
            self.size
        }

        fn mime_type(&self) -> String {
            String::new()
        }

        fn last_modified_ms(&self) -> u64 {
            0
        }

        fn kind(&self) -> FileLikeKind {
            FileLikeKind::File
        }

        fn read_bytes(&self) -> FileFuture<'_, Result<Vec<u8>, String>> {
            Box::pin(async { Ok(Vec::new()) })
        }

        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    fn probe(name: &str, size: u64, reads: &Rc<Cell<usize>>) -> ChooserFile {
        Rc::new(ProbeFile {
            name: name.to_string(),
            size,
            reads: reads.clone(),
        })
    }

    #[test]
    fn accepts_selection_within_limits() {
        let options = ChooserOptions {
            multiple: Some(true),
            max_count: Some(2),
            min_size: Some(1),
            max_size: Some(4),
            file_type_limits: Some(vec!["png".into(), "pdf".into()]),
            ..ChooserOptions::default()
        };
        let files = [file("a.png", 2048), file("b.PDF", 4096)];
        assert_eq!(validate_files(&files, &options), Ok(()));
    }

    #[test]
    fn count_gate_runs_before_per_file_checks() {
        let options = ChooserOptions {
            multiple: Some(true),
            max_count: Some(1),
            max_size: Some(1),
            file_type_limits: Some(vec!["png".into()]),
            ..ChooserOptions::default()
        };
        let files = [file("a.txt", 4096), file("b.txt", 4096)];
        let err = validate_files(&files, &options).expect_err("count violation");
        assert_eq!(err.kind(), ChooserErrorKind::InvalidCount);
    }

    #[test]
    fn size_violation_on_later_file_is_reported() {
        let options = ChooserOptions {
            max_size: Some(1),
            ..ChooserOptions::default()
        };
        let files = [file("a.png", 10), file("b.png", 4096)];
        let err = validate_files(&files, &options).expect_err("size violation");
        assert_eq!(err.kind(), ChooserErrorKind::InvalidSize);
        assert_eq!(err.message(), "files must be at most 1KB");
    }

    #[test]
    fn type_is_checked_before_size_for_one_file() {
        let options = ChooserOptions {
            max_size: Some(1),
            file_type_limits: Some(vec!["png".into()]),
            ..ChooserOptions::default()
        };
        let err = validate_files(&[file("huge.exe", 4096)], &options).expect_err("violation");
        assert_eq!(err.kind(), ChooserErrorKind::InvalidType);
        assert_eq!(err.message(), "only png files are supported");
    }

    #[test]
    fn undersized_file_is_rejected() {
        let options = ChooserOptions {
            min_size: Some(2),
            ..ChooserOptions::default()
        };
        let err = validate_files(&[file("a.png", 100)], &options).expect_err("too small");
        assert_eq!(err.kind(), ChooserErrorKind::InvalidSize);
        assert_eq!(err.message(), "files must be at least 2KB");
    }

    #[test]
    fn first_invalid_file_stops_the_scan() {
        let options = ChooserOptions {
            max_size: Some(1),
            ..ChooserOptions::default()
        };
        let first = Rc::new(Cell::new(0));
        let rest = Rc::new(Cell::new(0));
        let files = [
            probe("a.png", 4096, &first),
            probe("b.png", 10, &rest),
            probe("c.png", 10, &rest),
        ];

        let err = validate_files(&files, &options).expect_err("size violation");

        assert_eq!(err.kind(), ChooserErrorKind::InvalidSize);
        assert_eq!(first.get(), 1);
        assert_eq!(rest.get(), 0);
    }

    #[test]
    fn count_limit_is_ignored_without_multiple() {
        let options = ChooserOptions {
            multiple: Some(false),
            max_count: Some(1),
            ..ChooserOptions::default()
        };
        let files = [file("a", 1), file("b", 1), file("c", 1)];
        assert_eq!(validate_files(&files, &options), Ok(()));
    }
}
