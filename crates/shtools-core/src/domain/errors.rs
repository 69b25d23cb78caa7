use super::Normalization;

pub type ShtResult<T> = Result<T, ShtError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShtErrorCategory {
    InvalidArgument,
    DegreeOverflow,
    ConvergenceFailure,
    ShapeMismatch,
    UnderdeterminedSystem,
}

impl ShtErrorCategory {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::InvalidArgument => "InvalidArgument",
            Self::DegreeOverflow => "DegreeOverflow",
            Self::ConvergenceFailure => "ConvergenceFailure",
            Self::ShapeMismatch => "ShapeMismatch",
            Self::UnderdeterminedSystem => "UnderdeterminedSystem",
        }
    }
}

/// Failures surfaced by every transform entry point. None are recovered
/// locally and no partial results accompany them.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ShtError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error(
        "degree {lmax} exceeds the largest numerically safe degree {max_degree} for {normalization} normalization"
    )]
    DegreeOverflow {
        lmax: usize,
        max_degree: usize,
        normalization: Normalization,
    },
    #[error(
        "Gauss-Legendre node {node} of {node_count} did not converge within {iterations} Newton iterations"
    )]
    ConvergenceFailure {
        node: usize,
        node_count: usize,
        iterations: usize,
    },
    #[error("shape mismatch: {0}")]
    ShapeMismatch(String),
    #[error(
        "least-squares system is underdetermined: {observations} observations resolve {independent} of {unknowns} unknowns"
    )]
    UnderdeterminedSystem {
        observations: usize,
        unknowns: usize,
        independent: usize,
    },
}

impl ShtError {
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }

    pub fn shape_mismatch(message: impl Into<String>) -> Self {
        Self::ShapeMismatch(message.into())
    }

    pub const fn category(&self) -> ShtErrorCategory {
        match self {
            Self::InvalidArgument(_) => ShtErrorCategory::InvalidArgument,
            Self::DegreeOverflow { .. } => ShtErrorCategory::DegreeOverflow,
            Self::ConvergenceFailure { .. } => ShtErrorCategory::ConvergenceFailure,
            Self::ShapeMismatch(_) => ShtErrorCategory::ShapeMismatch,
            Self::UnderdeterminedSystem { .. } => ShtErrorCategory::UnderdeterminedSystem,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ShtError, ShtErrorCategory};
    use crate::domain::Normalization;

    #[test]
    fn category_tracks_variant() {
        assert_eq!(
            ShtError::invalid_argument("x").category(),
            ShtErrorCategory::InvalidArgument
        );
        assert_eq!(
            ShtError::shape_mismatch("x").category(),
            ShtErrorCategory::ShapeMismatch
        );
        let overflow = ShtError::DegreeOverflow {
            lmax: 3000,
            max_degree: 85,
            normalization: Normalization::Unnormalized,
        };
        assert_eq!(overflow.category().as_str(), "DegreeOverflow");
    }

    #[test]
    fn messages_name_the_offending_quantities() {
        let error = ShtError::UnderdeterminedSystem {
            observations: 3,
            unknowns: 9,
            independent: 3,
        };
        let message = error.to_string();
        assert!(message.contains("3 observations"), "{message}");
        assert!(message.contains("9 unknowns"), "{message}");

        let overflow = ShtError::DegreeOverflow {
            lmax: 3000,
            max_degree: 2800,
            normalization: Normalization::Schmidt,
        };
        assert!(overflow.to_string().contains("schmidt"), "{overflow}");
    }
}
