//! Image processing backend trait and shared types.
//!
//! The [`ImageBackend`] trait defines the two operations a resize needs: a
//! bounds-only probe (`identify`) and a full decode → scale → encode pass
//! (`scale`). Splitting them lets the resizer answer "does this need work?"
//! without ever allocating the pixel buffer.
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend), pure Rust and statically
//! linked into the binary.

use super::params::{OutputFormat, ScaleParams};
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to decode {path}: {reason}")]
    Decode { path: String, reason: String },
    #[error("Processing failed: {0}")]
    ProcessingFailed(String),
}

/// Result of an identify operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub fn as_tuple(self) -> (u32, u32) {
        (self.width, self.height)
    }
}

/// Trait for image processing backends.
///
/// `Sync` so one backend can serve a rayon batch.
pub trait ImageBackend: Sync {
    /// Read image dimensions without decoding pixel data.
    fn identify(&self, path: &Path) -> Result<Dimensions, BackendError>;

    /// Decode the source, scale it to the requested size and write the result.
    ///
    /// Returns the format actually written to `params.output`.
    fn scale(&self, params: &ScaleParams) -> Result<OutputFormat, BackendError>;
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use crate::imaging::{Filter, Quality};
    use std::sync::Mutex;

    /// Mock backend that records operations without executing them.
    /// Uses Mutex (not RefCell) so it is Sync and works with rayon's par_iter.
    pub struct MockBackend {
        pub dimensions: Option<Dimensions>,
        pub format: OutputFormat,
        pub fail_decode: bool,
        pub operations: Mutex<Vec<RecordedOp>>,
    }

    #[derive(Debug, Clone, PartialEq)]
    pub enum RecordedOp {
        Identify(String),
        Scale {
            source: String,
            output: String,
            width: u32,
            height: u32,
            sample_size: u32,
            quality: u32,
        },
    }

    impl Default for MockBackend {
        fn default() -> Self {
            Self {
                dimensions: None,
                format: OutputFormat::Jpeg,
                fail_decode: false,
                operations: Mutex::new(Vec::new()),
            }
        }
    }

    impl MockBackend {
        /// Backend whose every identify call reports `width × height`.
        pub fn with_dimensions(width: u32, height: u32) -> Self {
            Self {
                dimensions: Some(Dimensions { width, height }),
                ..Self::default()
            }
        }

        /// Backend that cannot read bounds at all.
        pub fn unreadable() -> Self {
            Self::default()
        }

        pub fn failing_decode(mut self) -> Self {
            self.fail_decode = true;
            self
        }

        pub fn writing(mut self, format: OutputFormat) -> Self {
            self.format = format;
            self
        }

        pub fn get_operations(&self) -> Vec<RecordedOp> {
            self.operations.lock().unwrap().clone()
        }
    }

    impl ImageBackend for MockBackend {
        fn identify(&self, path: &Path) -> Result<Dimensions, BackendError> {
            self.operations
                .lock()
                .unwrap()
                .push(RecordedOp::Identify(path.to_string_lossy().to_string()));

            self.dimensions.ok_or_else(|| BackendError::Decode {
                path: path.display().to_string(),
                reason: "no mock dimensions".to_string(),
            })
        }

        fn scale(&self, params: &ScaleParams) -> Result<OutputFormat, BackendError> {
            self.operations.lock().unwrap().push(RecordedOp::Scale {
                source: params.source.to_string_lossy().to_string(),
                output: params.output.to_string_lossy().to_string(),
                width: params.width,
                height: params.height,
                sample_size: params.sample_size,
                quality: params.quality.value(),
            });
            if self.fail_decode {
                return Err(BackendError::Decode {
                    path: params.source.display().to_string(),
                    reason: "mock decode failure".to_string(),
                });
            }
            Ok(self.format)
        }
    }

    #[test]
    fn mock_records_identify() {
        let backend = MockBackend::with_dimensions(800, 600);

        let result = backend.identify(Path::new("/test/image.jpg")).unwrap();
        assert_eq!(result.as_tuple(), (800, 600));

        let ops = backend.get_operations();
        assert_eq!(ops.len(), 1);
        assert!(matches!(&ops[0], RecordedOp::Identify(p) if p == "/test/image.jpg"));
    }

    #[test]
    fn mock_unreadable_identify_fails() {
        let backend = MockBackend::unreadable();
        assert!(matches!(
            backend.identify(Path::new("/broken.jpg")),
            Err(BackendError::Decode { .. })
        ));
    }

    #[test]
    fn mock_records_scale() {
        let backend = MockBackend::with_dimensions(800, 600).writing(OutputFormat::Png);

        let format = backend
            .scale(&ScaleParams {
                source: "/source.png".into(),
                output: "/out/scaled_source.png".into(),
                width: 400,
                height: 300,
                sample_size: 2,
                quality: Quality::new(80),
                filter: Filter::default(),
            })
            .unwrap();
        assert_eq!(format, OutputFormat::Png);

        let ops = backend.get_operations();
        assert_eq!(ops.len(), 1);
        assert!(matches!(
            &ops[0],
            RecordedOp::Scale {
                width: 400,
                height: 300,
                sample_size: 2,
                quality: 80,
                ..
            }
        ));
    }
}
