use thiserror::Error;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuizError {
    #[error("passing score must be between 0 and 100, got {provided}")]
    InvalidPassingScore { provided: u8 },

    #[error("attempt limit must allow at least one attempt")]
    ZeroAttemptLimit,

    #[error("quiz must contain at least one question")]
    NoQuestions,

    #[error("question prompt cannot be empty")]
    EmptyPrompt,

    #[error("question needs at least two options, got {count}")]
    TooFewOptions { count: usize },

    #[error("correct answer index {index} is out of range for {options} options")]
    CorrectAnswerOutOfRange { index: usize, options: usize },

    #[error("answer sheet has {got} entries but the quiz has {expected} questions")]
    AnswerSheetMismatch { expected: usize, got: usize },
}

//
// ─── ATTEMPT LIMIT ─────────────────────────────────────────────────────────────
//

/// How many scored attempts a quiz allows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptLimit {
    /// No cap on attempts.
    Unlimited,
    /// At most this many attempts (always >= 1).
    Limited(u32),
}

impl AttemptLimit {
    /// Creates a bounded attempt limit.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::ZeroAttemptLimit` when `max_attempts` is 0.
    pub fn limited(max_attempts: u32) -> Result<Self, QuizError> {
        if max_attempts == 0 {
            return Err(QuizError::ZeroAttemptLimit);
        }
        Ok(Self::Limited(max_attempts))
    }

    /// Whether another attempt may be scored after `attempts_used`.
    #[must_use]
    pub fn allows_another(&self, attempts_used: u32) -> bool {
        match self {
            Self::Unlimited => true,
            Self::Limited(max) => attempts_used < *max,
        }
    }

    /// Remaining attempts, `None` when unlimited.
    #[must_use]
    pub fn remaining(&self, attempts_used: u32) -> Option<u32> {
        match self {
            Self::Unlimited => None,
            Self::Limited(max) => Some(max.saturating_sub(attempts_used)),
        }
    }
}

//
// ─── QUESTION ──────────────────────────────────────────────────────────────────
//

/// A single multiple-choice question with exactly one correct option.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizQuestion {
    prompt: String,
    options: Vec<String>,
    correct_answer: usize,
}

impl QuizQuestion {
    /// Creates a validated question.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::EmptyPrompt` for a blank prompt,
    /// `QuizError::TooFewOptions` for fewer than two options, and
    /// `QuizError::CorrectAnswerOutOfRange` when the answer index does not
    /// point at an option.
    pub fn new(
        prompt: impl Into<String>,
        options: Vec<String>,
        correct_answer: usize,
    ) -> Result<Self, QuizError> {
        let prompt = prompt.into();
        if prompt.trim().is_empty() {
            return Err(QuizError::EmptyPrompt);
        }
        if options.len() < 2 {
            return Err(QuizError::TooFewOptions {
                count: options.len(),
            });
        }
        if correct_answer >= options.len() {
            return Err(QuizError::CorrectAnswerOutOfRange {
                index: correct_answer,
                options: options.len(),
            });
        }

        Ok(Self {
            prompt: prompt.trim().to_owned(),
            options,
            correct_answer,
        })
    }

    #[must_use]
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    #[must_use]
    pub fn options(&self) -> &[String] {
        &self.options
    }

    #[must_use]
    pub fn correct_answer(&self) -> usize {
        self.correct_answer
    }

    #[must_use]
    pub fn is_correct(&self, selected: usize) -> bool {
        selected == self.correct_answer
    }
}

//
// ─── QUIZ ──────────────────────────────────────────────────────────────────────
//

/// Quiz attached to a lesson.
#[derive(Debug, Clone, PartialEq)]
pub struct Quiz {
    passing_score: u8,
    attempts_allowed: AttemptLimit,
    questions: Vec<QuizQuestion>,
}

impl Quiz {
    /// Creates a validated quiz.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::InvalidPassingScore` for a score above 100 and
    /// `QuizError::NoQuestions` for an empty question list.
    pub fn new(
        passing_score: u8,
        attempts_allowed: AttemptLimit,
        questions: Vec<QuizQuestion>,
    ) -> Result<Self, QuizError> {
        if passing_score > 100 {
            return Err(QuizError::InvalidPassingScore {
                provided: passing_score,
            });
        }
        if questions.is_empty() {
            return Err(QuizError::NoQuestions);
        }

        Ok(Self {
            passing_score,
            attempts_allowed,
            questions,
        })
    }

    #[must_use]
    pub fn passing_score(&self) -> u8 {
        self.passing_score
    }

    #[must_use]
    pub fn attempts_allowed(&self) -> AttemptLimit {
        self.attempts_allowed
    }

    #[must_use]
    pub fn questions(&self) -> &[QuizQuestion] {
        &self.questions
    }

    /// Scores a full answer sheet as a 0-100 percentage.
    ///
    /// Unanswered questions count as incorrect.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::AnswerSheetMismatch` when the sheet length differs
    /// from the question count.
    pub fn score_answers(&self, answers: &[Option<usize>]) -> Result<f64, QuizError> {
        if answers.len() != self.questions.len() {
            return Err(QuizError::AnswerSheetMismatch {
                expected: self.questions.len(),
                got: answers.len(),
            });
        }

        let correct = self
            .questions
            .iter()
            .zip(answers)
            .filter(|(question, answer)| answer.is_some_and(|a| question.is_correct(a)))
            .count();

        #[allow(clippy::cast_precision_loss)]
        let score = correct as f64 / self.questions.len() as f64 * 100.0;
        Ok(score)
    }

    /// Whether a 0-100 score meets the passing threshold.
    #[must_use]
    pub fn is_passing(&self, score: f64) -> bool {
        score >= f64::from(self.passing_score)
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
