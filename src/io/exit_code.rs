//! Process exit codes.

/// Exit status of a `cppfacts` invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ExitCode {
    Success = 0,
    /// The translation unit could not be parsed
    ExtractionFailed = 1,
    /// Bad arguments, unreadable configuration, or an I/O error
    UsageError = 2,
}

impl ExitCode {
    pub fn from_success(success: bool) -> Self {
        if success {
            Self::Success
        } else {
            Self::ExtractionFailed
        }
    }

    pub fn is_success(self) -> bool {
        self == Self::Success
    }
}

impl From<ExitCode> for std::process::ExitCode {
    fn from(code: ExitCode) -> Self {
        std::process::ExitCode::from(code as u8)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes() {
        assert_eq!(ExitCode::from_success(true) as u8, 0);
        assert_eq!(ExitCode::from_success(false) as u8, 1);
        assert_eq!(ExitCode::UsageError as u8, 2);
        assert!(!ExitCode::ExtractionFailed.is_success());
    }
}
