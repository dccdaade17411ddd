//! Tone and focus calibration: maps the caller's choices to prompt guidance.

use serde::{Deserialize, Serialize};

/// Voice of the generated outreach.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tone {
    #[default]
    Conversational,
    Direct,
    Formal,
}

impl Tone {
    pub const ALL: [Tone; 3] = [Tone::Conversational, Tone::Direct, Tone::Formal];

    pub fn guidance(self) -> &'static str {
        match self {
            Tone::Conversational => {
                "Warm and conversational, like a peer who has read their news. \
                 Short sentences, contractions allowed, no jargon."
            }
            Tone::Direct => {
                "Direct and concise. Lead with the problem and the outcome. \
                 No pleasantries beyond a one-line greeting."
            }
            Tone::Formal => {
                "Formal and respectful, suitable for senior administrators. \
                 Full sentences, no contractions, no slang."
            }
        }
    }
}

/// The pain point the outreach leads with.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FocusPoint {
    #[default]
    CounselingWaitTimes,
    AfterHoursCrisisSupport,
    CounselorBurnout,
    StudentRetention,
    BudgetPressure,
}

impl FocusPoint {
    pub const ALL: [FocusPoint; 5] = [
        FocusPoint::CounselingWaitTimes,
        FocusPoint::AfterHoursCrisisSupport,
        FocusPoint::CounselorBurnout,
        FocusPoint::StudentRetention,
        FocusPoint::BudgetPressure,
    ];

    pub fn guidance(self) -> &'static str {
        match self {
            FocusPoint::CounselingWaitTimes => {
                "Long waits for counseling appointments and the students who give up waiting."
            }
            FocusPoint::AfterHoursCrisisSupport => {
                "Gaps in crisis support on nights, weekends and breaks."
            }
            FocusPoint::CounselorBurnout => {
                "Counseling staff stretched thin by rising caseloads and turnover."
            }
            FocusPoint::StudentRetention => {
                "The link between unmet mental health needs and students leaving the institution."
            }
            FocusPoint::BudgetPressure => {
                "Expanding support capacity without adding permanent headcount."
            }
        }
    }
}
