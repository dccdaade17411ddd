//! Axum route handlers for the Outreach API.

use axum::{
    extract::{multipart::Field, Multipart, State},
    Json,
};
use bytes::Bytes;
use serde::Serialize;
use tracing::debug;

use crate::errors::AppError;
use crate::generation::generator::{GenerateRequest, GenerateResponse};
use crate::generation::options::{OutreachOptions, Target, KNOWN_ROLES};
use crate::generation::tone::{FocusPoint, Tone};
use crate::prospects::sessions::SessionId;
use crate::research::ResearchSource;
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

/// Raw multipart form fields, before validation.
#[derive(Debug, Default)]
pub struct GenerateForm {
    pub university: Option<String>,
    pub role: Option<String>,
    pub tone: Option<String>,
    pub focus: Option<String>,
    pub include_meeting_prep: Option<String>,
    pub include_strategic_intel: Option<String>,
    pub persona: Option<String>,
    pub url: Option<String>,
    pub document: Option<Bytes>,
}

#[derive(Debug, Serialize)]
pub struct OptionsResponse {
    pub tones: Vec<Tone>,
    pub focus_points: Vec<FocusPoint>,
    pub known_roles: &'static [&'static str],
    pub template_version: String,
    pub research_char_budget: usize,
}

impl GenerateForm {
    pub async fn read(mut multipart: Multipart) -> Result<Self, AppError> {
        let mut form = GenerateForm::default();

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| AppError::Validation(format!("Malformed form data: {e}")))?
        {
            let name = field.name().unwrap_or_default().to_string();
            match name.as_str() {
                "document" => {
                    let data = field
                        .bytes()
                        .await
                        .map_err(|e| AppError::Validation(format!("Could not read upload: {e}")))?;
                    if !data.is_empty() {
                        form.document = Some(data);
                    }
                }
                "university" => form.university = Some(field_text(field).await?),
                "role" => form.role = Some(field_text(field).await?),
                "tone" => form.tone = Some(field_text(field).await?),
                "focus" => form.focus = Some(field_text(field).await?),
                "include_meeting_prep" => form.include_meeting_prep = Some(field_text(field).await?),
                "include_strategic_intel" => {
                    form.include_strategic_intel = Some(field_text(field).await?)
                }
                "persona" => form.persona = Some(field_text(field).await?),
                "url" => form.url = Some(field_text(field).await?),
                other => debug!("Ignoring unknown form field '{other}'"),
            }
        }

        Ok(form)
    }

    /// Validates every field. Runs before any document is decoded or any service is called.
    pub fn into_request(self) -> Result<GenerateRequest, AppError> {
        let target = Target::new(
            self.university.as_deref().unwrap_or_default(),
            self.role.as_deref().unwrap_or_default(),
        )?;

        let options = OutreachOptions {
            tone: parse_choice(self.tone.as_deref(), "tone")?,
            focus: parse_choice(self.focus.as_deref(), "focus")?,
            include_meeting_prep: parse_flag(
                self.include_meeting_prep.as_deref(),
                "include_meeting_prep",
            )?,
            include_strategic_intel: parse_flag(
                self.include_strategic_intel.as_deref(),
                "include_strategic_intel",
            )?,
        };

        let url = self
            .url
            .map(|u| u.trim().to_string())
            .filter(|u| !u.is_empty());
        let source = match (self.document, url) {
            (Some(bytes), None) => ResearchSource::Pdf(bytes),
            (None, Some(url)) => ResearchSource::Url(url),
            (Some(_), Some(_)) => {
                return Err(AppError::Validation(
                    "Provide either a document or a url, not both".to_string(),
                ))
            }
            (None, None) => {
                return Err(AppError::Validation(
                    "A research document (PDF upload) or article url is required".to_string(),
                ))
            }
        };

        Ok(GenerateRequest {
            target,
            options,
            persona: self.persona,
            source,
        })
    }
}

async fn field_text(field: Field<'_>) -> Result<String, AppError> {
    let name = field.name().unwrap_or_default().to_string();
    field
        .text()
        .await
        .map_err(|e| AppError::Validation(format!("Field '{name}' is not valid text: {e}")))
}

/// Parses a snake_case enum choice; blank means the default.
fn parse_choice<T>(raw: Option<&str>, field: &str) -> Result<T, AppError>
where
    T: serde::de::DeserializeOwned + Default,
{
    match raw.map(str::trim).filter(|v| !v.is_empty()) {
        None => Ok(T::default()),
        Some(value) => serde_json::from_value(serde_json::Value::String(value.to_lowercase()))
            .map_err(|_| AppError::Validation(format!("Unknown {field} '{value}'"))),
    }
}

/// HTML-form style booleans. Missing or blank means false.
fn parse_flag(raw: Option<&str>, field: &str) -> Result<bool, AppError> {
    match raw.map(|v| v.trim().to_ascii_lowercase()).as_deref() {
        None | Some("") | Some("false") | Some("off") | Some("0") | Some("no") => Ok(false),
        Some("true") | Some("on") | Some("1") | Some("yes") => Ok(true),
        Some(other) => Err(AppError::Validation(format!(
            "{field} must be true or false, got '{other}'"
        ))),
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/outreach/generate
///
/// Full pipeline: validate → ingest → compose → complete → append to the session log.
/// Multipart fields: university, role, tone, focus, include_meeting_prep,
/// include_strategic_intel, persona, and exactly one of document (PDF) / url.
pub async fn handle_generate(
    State(state): State<AppState>,
    session: SessionId,
    multipart: Multipart,
) -> Result<Json<GenerateResponse>, AppError> {
    if let Err(wait) = state.rate_limiter.check() {
        return Err(AppError::TooManyRequests {
            retry_after_secs: wait.as_secs().max(1),
        });
    }

    let request = GenerateForm::read(multipart).await?.into_request()?;

    let log = state.sessions.log(&session).await;
    let result = state.generator.generate(&log, request).await;
    if result.is_err() {
        state.sessions.release(&session, log).await;
    }

    Ok(Json(result?))
}

/// GET /api/v1/outreach/options
///
/// Choices a form can offer: tones, focus points, known roles.
pub async fn handle_options(State(state): State<AppState>) -> Json<OptionsResponse> {
    Json(OptionsResponse {
        tones: Tone::ALL.to_vec(),
        focus_points: FocusPoint::ALL.to_vec(),
        known_roles: KNOWN_ROLES,
        template_version: state.generator.template_version().to_string(),
        research_char_budget: state.generator.research_char_budget(),
    })
}
