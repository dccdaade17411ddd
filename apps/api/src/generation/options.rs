use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::generation::tone::{FocusPoint, Tone};

/// Roles offered to callers. Free text is accepted as well.
pub const KNOWN_ROLES: &[&str] = &[
    "Director of Counseling",
    "Dean of Students",
    "Vice President of Student Affairs",
    "Director of Health Services",
    "Director of Wellness",
    "Chief Financial Officer",
    "Director of Athletics",
];

const MIN_UNIVERSITY_CHARS: usize = 2;

/// Who the outreach is for.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Target {
    pub university: String,
    pub role: String,
}

impl Target {
    /// Trims both fields and rejects empty or too-short values.
    pub fn new(university: &str, role: &str) -> Result<Self, AppError> {
        let university = university.trim();
        let role = role.trim();

        if university.is_empty() {
            return Err(AppError::Validation("university cannot be empty".to_string()));
        }
        if university.chars().count() < MIN_UNIVERSITY_CHARS {
            return Err(AppError::Validation(format!(
                "university must be at least {MIN_UNIVERSITY_CHARS} characters"
            )));
        }
        if role.is_empty() {
            return Err(AppError::Validation("role cannot be empty".to_string()));
        }

        Ok(Self {
            university: university.to_string(),
            role: role.to_string(),
        })
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct OutreachOptions {
    pub tone: Tone,
    pub focus: FocusPoint,
    pub include_meeting_prep: bool,
    pub include_strategic_intel: bool,
}
