//! Error types for VesperDB.

use crate::page::PageId;
use thiserror::Error;

/// Result type alias using VesperError.
pub type Result<T> = std::result::Result<T, VesperError>;

/// Errors that can occur in VesperDB operations.
#[derive(Debug, Error)]
pub enum VesperError {
    // I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("File not found: {path}")]
    FileNotFound { path: String },

    #[error("File already exists: {path}")]
    FileExists { path: String },

    // Buffer pool errors
    #[error("Buffer pool full, unable to allocate frame")]
    BufferPoolFull,

    #[error("Page not found: {page_id}")]
    PageNotFound { page_id: PageId },

    #[error("Page {page_id} is not pinned")]
    PageNotPinned { page_id: PageId },

    #[error("Page {page_id} is still pinned in the buffer pool")]
    PagePinned { page_id: PageId },

    // Heap errors
    #[error("Page full, unable to insert record")]
    PageFull,

    #[error("Record too large: {size} bytes (page limit {max})")]
    RecordTooLarge { size: usize, max: usize },

    #[error("End of file reached")]
    EndOfFile,

    // Index errors
    #[error("Index metadata mismatch: {reason}")]
    BadIndexInfo { reason: String },

    #[error("Unsupported scan operator")]
    BadOpcode,

    #[error("Empty scan range")]
    BadScanRange,

    #[error("Key not found in index")]
    NoSuchKey,

    #[error("Scan has not been initialized")]
    ScanNotInitialized,

    #[error("Scan reached the end of its range")]
    ScanCompleted,

    #[error("Operation not allowed while a scan is active")]
    ScanActive,

    #[error("B+ tree node full")]
    NodeFull,

    #[error("Invalid key: {0}")]
    InvalidKey(String),

    // Internal errors
    #[error("Internal error: {0}")]
    Internal(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Error as IoError, ErrorKind};

    #[test]
    fn test_io_error_conversion() {
        let io_err = IoError::new(ErrorKind::NotFound, "no such file");
        let err: VesperError = io_err.into();
        assert!(matches!(err, VesperError::Io(_)));
        assert!(err.to_string().contains("I/O error"));
    }

    #[test]
    fn test_file_errors_display() {
        let err = VesperError::FileNotFound {
            path: "widgets.0".to_string(),
        };
        assert_eq!(err.to_string(), "File not found: widgets.0");

        let err = VesperError::FileExists {
            path: "widgets.0".to_string(),
        };
        assert_eq!(err.to_string(), "File already exists: widgets.0");
    }

    #[test]
    fn test_pin_contract_errors_display() {
        let page_id = PageId::new(2, 7);
        let err = VesperError::PageNotPinned { page_id };
        assert_eq!(err.to_string(), "Page 2:7 is not pinned");

        let err = VesperError::PagePinned { page_id };
        assert_eq!(err.to_string(), "Page 2:7 is still pinned in the buffer pool");
    }

    #[test]
    fn test_scan_errors_display() {
        assert_eq!(
            VesperError::BadOpcode.to_string(),
            "Unsupported scan operator"
        );
        assert_eq!(VesperError::BadScanRange.to_string(), "Empty scan range");
        assert_eq!(
            VesperError::ScanNotInitialized.to_string(),
            "Scan has not been initialized"
        );
        assert_eq!(
            VesperError::ScanCompleted.to_string(),
            "Scan reached the end of its range"
        );
    }

    #[test]
    fn test_index_errors_display() {
        let err = VesperError::BadIndexInfo {
            reason: "attribute offset 4 != 12".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Index metadata mismatch: attribute offset 4 != 12"
        );

        let err = VesperError::InvalidKey("NaN double key".to_string());
        assert_eq!(err.to_string(), "Invalid key: NaN double key");
    }

    #[test]
    fn test_result_type_alias() {
        fn returns_ok() -> Result<i32> {
            Ok(7)
        }

        fn returns_err() -> Result<i32> {
            Err(VesperError::EndOfFile)
        }

        assert!(returns_ok().is_ok());
        assert!(returns_err().is_err());
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<VesperError>();
    }
}
