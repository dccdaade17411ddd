// Prompt template for outreach generation.
// The template is configuration: a built-in default ships with the binary and can be
// replaced at startup with a JSON file `{"version": "...", "body": "..."}`.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Persona used when neither the config nor the request supplies one.
pub const DEFAULT_PERSONA: &str = "You are a senior partnerships representative for a \
    teletherapy provider that works with colleges and universities to expand student \
    mental health support. You write concise, specific, empathetic outreach that \
    respects the reader's time.";

pub const DEFAULT_TEMPLATE_VERSION: &str = "outreach-v4";

/// Outreach prompt template.
/// Placeholders: {persona}, {university}, {role}, {tone_guidance}, {focus_guidance},
///               {research_text}, {optional_sections}
pub const DEFAULT_TEMPLATE_BODY: &str = r#"{persona}

You are preparing personalized outreach for the {role} at {university}.

TONE: {tone_guidance}
PAIN POINT TO LEAD WITH: {focus_guidance}

RESEARCH MATERIAL (verbatim from the source document):
"""
{research_text}
"""

Using ONLY facts supported by the research material, write the following Markdown sections in this order:

## Subject Lines
Three subject line options, each under 60 characters.

## Email Draft
A cold email of 120-180 words addressed to the {role}. Reference one specific fact from the research. End with a low-friction call to action.

## LinkedIn Message
A direct message under 300 characters.

## Voicemail Script
A voicemail script of 20-30 seconds.
{optional_sections}
HARD RULES:
1. Do NOT invent statistics, names, dates or quotes that are not in the research material
2. Do NOT mention competitors by name
3. Output Markdown only, no preamble"#;

const MEETING_PREP_SECTION: &str = "
## Meeting Prep Notes
Five bullets: likely objections, questions to ask, and stakeholders worth naming.
";

const STRATEGIC_INTEL_SECTION: &str = "
## Strategic Intel
Bullets on budget cycles, recent initiatives and institutional priorities evident in the research.
";

/// Placeholders every template must carry.
const REQUIRED_PLACEHOLDERS: &[&str] = &["research_text", "university", "role"];

#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("could not read template file: {0}")]
    Io(#[from] std::io::Error),

    #[error("template file is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("template '{version}' is missing the {{{placeholder}}} placeholder")]
    MissingPlaceholder {
        version: String,
        placeholder: &'static str,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptTemplate {
    pub version: String,
    pub body: String,
}

impl Default for PromptTemplate {
    fn default() -> Self {
        Self {
            version: DEFAULT_TEMPLATE_VERSION.to_string(),
            body: DEFAULT_TEMPLATE_BODY.to_string(),
        }
    }
}

impl PromptTemplate {
    pub fn load(path: &Path) -> Result<Self, TemplateError> {
        let raw = std::fs::read_to_string(path)?;
        let template: PromptTemplate = serde_json::from_str(&raw)?;
        template.validate()?;
        Ok(template)
    }

    pub fn validate(&self) -> Result<(), TemplateError> {
        for placeholder in REQUIRED_PLACEHOLDERS {
            if !self.body.contains(&format!("{{{placeholder}}}")) {
                return Err(TemplateError::MissingPlaceholder {
                    version: self.version.clone(),
                    placeholder,
                });
            }
        }
        Ok(())
    }

    /// Single-pass substitution: values are inserted verbatim and never re-scanned,
    /// so research text containing `{role}` stays literal. Unknown placeholders are kept.
    pub fn render(&self, values: &HashMap<&str, &str>) -> String {
        let body = self.body.as_str();
        let mut out = String::with_capacity(body.len() + values.values().map(|v| v.len()).sum::<usize>());
        let mut rest = body;

        while let Some(open) = rest.find('{') {
            out.push_str(&rest[..open]);
            let after_open = &rest[open + 1..];
            match after_open.find('}') {
                Some(close) if is_placeholder_name(&after_open[..close]) => {
                    let name = &after_open[..close];
                    match values.get(name) {
                        Some(value) => out.push_str(value),
                        None => {
                            out.push('{');
                            out.push_str(name);
                            out.push('}');
                        }
                    }
                    rest = &after_open[close + 1..];
                }
                _ => {
                    out.push('{');
                    rest = after_open;
                }
            }
        }
        out.push_str(rest);
        out
    }
}

fn is_placeholder_name(name: &str) -> bool {
    !name.is_empty() && name.chars().all(|c| c.is_ascii_lowercase() || c == '_')
}

/// The optional Markdown sections requested by the caller, in fixed order.
pub fn optional_sections(include_meeting_prep: bool, include_strategic_intel: bool) -> String {
    let mut sections = String::new();
    if include_meeting_prep {
        sections.push_str(MEETING_PREP_SECTION);
    }
    if include_strategic_intel {
        sections.push_str(STRATEGIC_INTEL_SECTION);
    }
    sections
}
