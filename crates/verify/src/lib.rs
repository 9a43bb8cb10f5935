//! Visual cross-check of redacted pages against an object detector.

mod checker;
mod detector;
mod error;

pub use checker::VisualCrossChecker;
pub use detector::{
    parse_detections, CommandDetector, DetectionBox, DetectionLabel, DetectorConfig,
    DisabledDetector, ObjectDetector, DEFAULT_IDENTIFIER_LABEL,
};
pub use error::{Result, VerifyError};
