use thiserror::Error;

/// Application-level error carrying the process exit code.
///
/// Exit codes:
/// - 2: bad input (arguments, files, ranges)
/// - 3: no usable data
/// - 4: fit failure
#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}

/// Errors raised by the background fitting core.
///
/// Two tiers are kept apart on purpose: `Fit` means no model parameters could be
/// produced and must reach the caller; `Evaluation` means parameters exist but the
/// model could not be evaluated over the requested axis. The power-law fitter
/// absorbs `Evaluation` by returning a zero background.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BackgroundError {
    /// A pixel range does not satisfy `low < high <= len`.
    #[error("invalid pixel range {low}..{high} for a spectrum of {len} channels")]
    InvalidRange { low: usize, high: usize, len: usize },

    /// Energy axis and spectrum differ in length.
    #[error("energy axis has {energy} values but spectrum has {spectrum}")]
    LengthMismatch { energy: usize, spectrum: usize },

    /// The least-squares solve could not produce parameters.
    #[error("fit failed: {0}")]
    Fit(String),

    /// The fitted model could not be evaluated.
    #[error("background evaluation failed: {0}")]
    Evaluation(String),
}

impl From<BackgroundError> for AppError {
    fn from(err: BackgroundError) -> Self {
        let code = match err {
            BackgroundError::InvalidRange { .. } | BackgroundError::LengthMismatch { .. } => 2,
            BackgroundError::Fit(_) | BackgroundError::Evaluation(_) => 4,
        };
        AppError::new(code, err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn background_errors_map_to_exit_codes() {
        let range: AppError = BackgroundError::InvalidRange { low: 5, high: 2, len: 10 }.into();
        assert_eq!(range.exit_code(), 2);
        assert!(range.to_string().contains("5..2"));

        let fit: AppError = BackgroundError::Fit("singular system".to_string()).into();
        assert_eq!(fit.exit_code(), 4);
        assert_eq!(fit.to_string(), "fit failed: singular system");
    }
}
