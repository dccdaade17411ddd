use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::generation::options::Target;
use crate::prospects::annotate::Annotation;
use crate::research::text::truncate_chars;

pub const DEFAULT_PRIORITY: &str = "Medium";
pub const DEFAULT_STATUS: &str = "Researched";
const PREVIEW_ELLIPSIS: &str = "...";

/// One row per successful generation. Immutable once appended.
///
/// Field order here is the column order of CSV snapshots and exports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProspectRecord {
    pub date: NaiveDate,
    pub university: String,
    pub role: String,
    pub priority: String,
    pub status: String,
    pub output_preview: String,
}

impl ProspectRecord {
    pub fn new(
        date: NaiveDate,
        target: &Target,
        completion: &str,
        preview_chars: usize,
        annotation: Annotation,
    ) -> Self {
        Self {
            date,
            university: target.university.clone(),
            role: target.role.clone(),
            priority: annotation
                .priority
                .unwrap_or_else(|| DEFAULT_PRIORITY.to_string()),
            status: annotation
                .status
                .unwrap_or_else(|| DEFAULT_STATUS.to_string()),
            output_preview: preview(completion, preview_chars),
        }
    }
}

/// First `max_chars` characters of the completion, with an ellipsis when cut.
pub fn preview(completion: &str, max_chars: usize) -> String {
    match truncate_chars(completion.to_string(), max_chars) {
        (text, None) => text,
        (mut text, Some(_)) => {
            text.push_str(PREVIEW_ELLIPSIS);
            text
        }
    }
}
