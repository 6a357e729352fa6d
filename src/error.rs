//! Error types for vascular-junctions.
//!
//! Input errors (malformed vessel or mesh data, invalid parameters) are fatal
//! and surface to the caller. Failures of the geometry collaborators are
//! reported as [`JunctionError::Collaborator`] and are normally absorbed by the
//! smoothing pipelines, which fall back to a coarser result instead.

use thiserror::Error;

/// Result type alias using [`JunctionError`].
pub type Result<T> = std::result::Result<T, JunctionError>;

/// Errors that can occur while detecting or smoothing junctions.
#[derive(Error, Debug)]
pub enum JunctionError {
    /// A vessel row does not carry both endpoint coordinates.
    #[error("vessel row {row} has {found} columns, expected at least {expected}")]
    MissingField {
        /// The row index.
        row: usize,
        /// Minimum number of columns required.
        expected: usize,
        /// Number of columns present.
        found: usize,
    },

    /// Proximal and distal endpoint lists have different lengths.
    #[error("endpoint count mismatch: {proximal} proximal points, {distal} distal points")]
    EndpointCountMismatch {
        /// Number of proximal points.
        proximal: usize,
        /// Number of distal points.
        distal: usize,
    },

    /// A vessel endpoint is NaN or infinite.
    #[error("vessel {vessel} has a non-finite endpoint coordinate")]
    NonFiniteCoordinate {
        /// The vessel index.
        vessel: usize,
    },

    /// The mesh has no points or no faces.
    #[error("mesh is empty")]
    EmptyMesh,

    /// A face references an invalid point index.
    #[error("face {face} references invalid point index {vertex}")]
    InvalidVertexIndex {
        /// The face index.
        face: usize,
        /// The invalid point index.
        vertex: usize,
    },

    /// A boundary loop spans no area and cannot be capped.
    #[error("boundary loop with {points} points is degenerate")]
    DegenerateLoop {
        /// Number of points in the loop.
        points: usize,
    },

    /// An option is out of range.
    #[error("{name} = {value} is out of range: {reason}")]
    InvalidParameter {
        /// Option name.
        name: &'static str,
        /// The rejected value, formatted.
        value: String,
        /// The accepted range.
        reason: &'static str,
    },

    /// An external geometry primitive failed.
    #[error("{stage} failed: {message}")]
    Collaborator {
        /// The pipeline stage that called the primitive.
        stage: &'static str,
        /// Description of the failure.
        message: String,
    },
}

impl JunctionError {
    /// Create an invalid parameter error.
    pub fn invalid_param<T: std::fmt::Display>(
        name: &'static str,
        value: T,
        reason: &'static str,
    ) -> Self {
        JunctionError::InvalidParameter {
            name,
            value: value.to_string(),
            reason,
        }
    }

    /// Create a collaborator failure for the given stage.
    pub fn collaborator(stage: &'static str, message: impl Into<String>) -> Self {
        JunctionError::Collaborator {
            stage,
            message: message.into(),
        }
    }

    /// Whether this error was caused by malformed caller input.
    pub fn is_input_error(&self) -> bool {
        !matches!(self, JunctionError::Collaborator { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = JunctionError::MissingField {
            row: 3,
            expected: 6,
            found: 4,
        };
        assert_eq!(
            err.to_string(),
            "vessel row 3 has 4 columns, expected at least 6"
        );

        let err = JunctionError::collaborator("remesh", "loop is self-intersecting");
        assert_eq!(err.to_string(), "remesh failed: loop is self-intersecting");
    }

    #[test]
    fn test_input_error_classification() {
        assert!(JunctionError::EmptyMesh.is_input_error());
        assert!(JunctionError::invalid_param("tolerance", -1.0, "must be positive").is_input_error());
        assert!(!JunctionError::collaborator("repair", "boom").is_input_error());
    }
}
