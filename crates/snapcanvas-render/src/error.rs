//! Error types for surface and object export.

use std::fmt;

use snapcanvas_core::{ObjectId, SurfaceId};
use thiserror::Error;

/// Result type alias for render and export operations.
pub type Result<T> = std::result::Result<T, ExportError>;

/// Host extension points managed by the [`crate::Platform`] registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    PixelReadback,
    TargetAllocation,
    SurfaceExport,
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Capability::PixelReadback => "pixel read-back",
            Capability::TargetAllocation => "render target allocation",
            Capability::SurfaceExport => "surface export",
        };
        f.write_str(name)
    }
}

#[derive(Error, Debug)]
pub enum ExportError {
    /// A capability was installed twice. Non-fatal: the first one stays.
    #[error("{0} is already defined")]
    AlreadyInstalled(Capability),

    #[error("{0} has not been installed")]
    NotInstalled(Capability),

    /// The render pass or pixel read-back failed.
    #[error("Render failed: {0}")]
    RenderFailure(String),

    /// Rejected before any surface or object was touched.
    #[error("Invalid export options: {0}")]
    InvalidOptions(String),

    #[error("Unknown scene object {0}")]
    UnknownObject(ObjectId),

    #[error("Unknown render surface {0}")]
    UnknownSurface(SurfaceId),

    #[error("Malformed export options: {0}")]
    Json(#[from] serde_json::Error),
}
