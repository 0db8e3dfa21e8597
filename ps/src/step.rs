//! Step - one instruction line of a plan

use serde::{Deserialize, Serialize};
use std::fmt;

/// A single plan step
///
/// Persisted as one JSON object per line. The display form is the literal
/// text handed to clients: `"<path> |"` or `"<path> | <annotation>"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Step {
    /// The step subject (usually a file path)
    pub path: String,

    /// Instruction attached by `append_instruction`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub annotation: Option<String>,
}

impl Step {
    /// Create an unannotated step
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            annotation: None,
        }
    }

    /// Builder: attach an annotation
    pub fn with_annotation(mut self, annotation: impl Into<String>) -> Self {
        self.annotation = Some(annotation.into());
        self
    }

    /// Copy of this step with its annotation replaced
    pub fn annotated(&self, instruction: &str) -> Self {
        let instruction = instruction.trim();
        Self {
            path: self.path.clone(),
            annotation: (!instruction.is_empty()).then(|| instruction.to_string()),
        }
    }

    /// Parse one stored line
    ///
    /// Returns `None` for blank lines. JSON records are preferred; anything
    /// else is read as a legacy `path | annotation` text line.
    pub fn parse_line(line: &str) -> Option<Self> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }

        if line.starts_with('{')
            && let Ok(step) = serde_json::from_str::<Step>(line)
        {
            return Some(step);
        }

        Some(Self::parse_legacy(line))
    }

    fn parse_legacy(line: &str) -> Self {
        match line.split_once('|') {
            Some((path, annotation)) => {
                let annotation = annotation.trim();
                Self {
                    path: path.trim().to_string(),
                    annotation: (!annotation.is_empty()).then(|| annotation.to_string()),
                }
            }
            None => Self::new(line),
        }
    }

    /// Serialize to a single stored line (no trailing newline)
    pub fn to_line(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.annotation {
            Some(annotation) => write!(f, "{} | {}", self.path, annotation),
            None => write!(f, "{} |", self.path),
        }
    }
}
