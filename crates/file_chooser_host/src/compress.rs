//! Image compression step run after validation.

use std::{future::Future, pin::Pin};

use crate::{
    file::{is_image_name, rewrap_file, FileFactory},
    validate::validate_files,
    ChooserError, ChooserFile, ChooserOptions, CompressOptions,
};

/// Object-safe boxed future used by [`ImageCompressor`].
pub type CompressFuture<'a, T> = Pin<Box<dyn Future<Output = T> + 'a>>;

/// Output of one compressor call.
pub struct CompressedImage {
    /// Compressed content.
    pub file: ChooserFile,
    /// Name the compressor reports for the output (may differ from the input name).
    pub origin_name: String,
}

/// Black-box image compressor.
pub trait ImageCompressor {
    /// Compresses a single image.
    fn compress<'a>(
        &'a self,
        file: &'a ChooserFile,
        options: &'a CompressOptions,
    ) -> CompressFuture<'a, Result<CompressedImage, String>>;
}

#[derive(Debug, Clone, Copy, Default)]
/// Compressor that returns its input unchanged.
pub struct PassthroughCompressor;

impl ImageCompressor for PassthroughCompressor {
    fn compress<'a>(
        &'a self,
        file: &'a ChooserFile,
        _options: &'a CompressOptions,
    ) -> CompressFuture<'a, Result<CompressedImage, String>> {
        Box::pin(async move {
            Ok(CompressedImage {
                file: file.clone(),
                origin_name: file.name(),
            })
        })
    }
}

/// Compresses every image in `files` and re-wraps each output, keeping input order.
///
/// Non-image files keep their content. The batch is all-or-nothing: the first compressor
/// failure discards every file processed so far.
///
/// # Errors
///
/// Returns `Compress` with the compressor message, or `Other` when a file cannot be
/// re-wrapped.
pub async fn compress_files(
    files: &[ChooserFile],
    options: &ChooserOptions,
    compressor: &dyn ImageCompressor,
    factory: &dyn FileFactory,
) -> Result<Vec<ChooserFile>, ChooserError> {
    let compress_options = options.compress_options();
    let mut output = Vec::with_capacity(files.len());

    for file in files {
        let mut name = file.name();
        let mut current = file.clone();

        if is_image_name(&name) {
            let compressed = compressor
                .compress(file, &compress_options)
                .await
                .map_err(ChooserError::compress)?;
            name = compressed.origin_name;
            current = compressed.file;
        }

        output.push(rewrap_file(factory, &current, &name)?);
    }

    Ok(output)
}

/// Runs validation and then compression over one selection.
///
/// # Errors
///
/// Returns the validation error without compressing anything, or the compression error.
pub async fn process_selection(
    files: &[ChooserFile],
    options: &ChooserOptions,
    compressor: &dyn ImageCompressor,
    factory: &dyn FileFactory,
) -> Result<Vec<ChooserFile>, ChooserError> {
    validate_files(files, options)?;
    compress_files(files, options, compressor, factory).await
}
