use thiserror::Error;

/// Default watch-time threshold for video lessons, in percent.
pub const DEFAULT_WATCH_PERCENT: u8 = 80;

/// Default required reading time for text lessons, in seconds.
pub const DEFAULT_READ_TIME_SECS: u32 = 60;

/// Lower bound for a configurable reading time.
pub const MIN_READ_TIME_SECS: u32 = 10;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum CriteriaError {
    #[error("watch-time percentage must be between 1 and 100, got {provided}")]
    WatchPercentOutOfRange { provided: u8 },

    #[error("read time must be at least {MIN_READ_TIME_SECS} seconds, got {provided}")]
    ReadTimeTooShort { provided: u32 },
}

/// Per-lesson completion thresholds.
///
/// Authoring input is validated here, once, so the evaluator can assume every
/// criteria value it sees is in range. Defaults are resolved at course-load
/// time via [`CompletionCriteria::resolve`], never re-derived at read time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionCriteria {
    watch_percent: u8,
    read_time_secs: u32,
    require_quiz_pass: bool,
    require_assignment_submission: bool,
}

impl CompletionCriteria {
    /// Creates validated completion criteria.
    ///
    /// # Errors
    ///
    /// Returns `CriteriaError::WatchPercentOutOfRange` if the watch threshold
    /// is 0 or above 100, and `CriteriaError::ReadTimeTooShort` if the read
    /// time is under [`MIN_READ_TIME_SECS`].
    pub fn new(
        watch_percent: u8,
        read_time_secs: u32,
        require_quiz_pass: bool,
        require_assignment_submission: bool,
    ) -> Result<Self, CriteriaError> {
        if watch_percent == 0 || watch_percent > 100 {
            return Err(CriteriaError::WatchPercentOutOfRange {
                provided: watch_percent,
            });
        }
        if read_time_secs < MIN_READ_TIME_SECS {
            return Err(CriteriaError::ReadTimeTooShort {
                provided: read_time_secs,
            });
        }

        Ok(Self {
            watch_percent,
            read_time_secs,
            require_quiz_pass,
            require_assignment_submission,
        })
    }

    /// Resolves possibly-absent authoring input against the defaults.
    ///
    /// # Errors
    ///
    /// Same as [`CompletionCriteria::new`] when a provided value is out of range.
    pub fn resolve(
        watch_percent: Option<u8>,
        read_time_secs: Option<u32>,
        require_quiz_pass: bool,
        require_assignment_submission: bool,
    ) -> Result<Self, CriteriaError> {
        Self::new(
            watch_percent.unwrap_or(DEFAULT_WATCH_PERCENT),
            read_time_secs.unwrap_or(DEFAULT_READ_TIME_SECS),
            require_quiz_pass,
            require_assignment_submission,
        )
    }

    #[must_use]
    pub fn watch_percent(&self) -> u8 {
        self.watch_percent
    }

    #[must_use]
    pub fn read_time_secs(&self) -> u32 {
        self.read_time_secs
    }

    #[must_use]
    pub fn require_quiz_pass(&self) -> bool {
        self.require_quiz_pass
    }

    #[must_use]
    pub fn require_assignment_submission(&self) -> bool {
        self.require_assignment_submission
    }
}

impl Default for CompletionCriteria {
    fn default() -> Self {
        Self {
            watch_percent: DEFAULT_WATCH_PERCENT,
            read_time_secs: DEFAULT_READ_TIME_SECS,
            require_quiz_pass: false,
            require_assignment_submission: false,
        }
    }
}
