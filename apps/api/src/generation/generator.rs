//! Outreach Generation: orchestrates the full pipeline.
//!
//! Flow: validate → ingest research → compose prompt → completion call →
//!       build record → append to the session log → best-effort snapshot.
//!
//! The log is touched only after a completion was obtained, so a failure at any
//! earlier step leaves it exactly as it was.

use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{info, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::generation::options::{OutreachOptions, Target};
use crate::generation::prompts::{optional_sections, PromptTemplate};
use crate::llm_client::CompletionService;
use crate::prospects::annotate::ProspectAnnotator;
use crate::prospects::log::ProspectLog;
use crate::prospects::models::ProspectRecord;
use crate::research::{IngestedResearch, Ingestor, ResearchSource, TruncationNotice};

// ────────────────────────────────────────────────────────────────────────────
// Data models
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct GenerateRequest {
    pub target: Target,
    pub options: OutreachOptions,
    /// Overrides the configured persona for this request only.
    pub persona: Option<String>,
    pub source: ResearchSource,
}

#[derive(Debug, Clone, Serialize)]
pub struct GenerateResponse {
    pub generation_id: Uuid,
    pub completion: String,
    pub truncation: Option<TruncationNotice>,
    pub warnings: Vec<String>,
    pub record: ProspectRecord,
    pub template_version: String,
}

#[derive(Debug, Clone)]
pub struct GenerationSettings {
    pub max_output_tokens: u32,
    pub preview_chars: usize,
    pub default_persona: String,
}

// ────────────────────────────────────────────────────────────────────────────
// Generation pipeline
// ────────────────────────────────────────────────────────────────────────────

pub struct OutreachGenerator {
    ingestor: Ingestor,
    completion: Arc<dyn CompletionService>,
    template: PromptTemplate,
    annotator: Arc<dyn ProspectAnnotator>,
    settings: GenerationSettings,
}

impl OutreachGenerator {
    pub fn new(
        ingestor: Ingestor,
        completion: Arc<dyn CompletionService>,
        template: PromptTemplate,
        annotator: Arc<dyn ProspectAnnotator>,
        settings: GenerationSettings,
    ) -> Self {
        Self {
            ingestor,
            completion,
            template,
            annotator,
            settings,
        }
    }

    pub fn template_version(&self) -> &str {
        &self.template.version
    }

    pub fn research_char_budget(&self) -> usize {
        self.ingestor.char_budget()
    }

    /// Runs the whole pipeline for one request and appends exactly one record on success.
    pub async fn generate(
        &self,
        log: &Mutex<ProspectLog>,
        request: GenerateRequest,
    ) -> Result<GenerateResponse, AppError> {
        let generation_id = Uuid::new_v4();
        let GenerateRequest {
            target,
            options,
            persona,
            source,
        } = request;

        info!(
            "Generation {generation_id}: {} at {} (source={}, tone={:?}, focus={:?})",
            target.role,
            target.university,
            source.kind(),
            options.tone,
            options.focus
        );

        // Step 1: Ingest research material
        let IngestedResearch { text, truncation } = self.ingestor.extract(source).await?;

        let mut warnings = Vec::new();
        if let Some(notice) = &truncation {
            warnings.push(format!(
                "Research text was truncated from {} to {} characters.",
                notice.original, notice.kept
            ));
        }

        // Step 2: Compose prompt
        let persona = persona
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .unwrap_or(&self.settings.default_persona);
        let prompt = compose(&self.template, &text, persona, &target, &options)?;

        // Step 3: Completion call (single attempt)
        let completion = self
            .completion
            .complete(&prompt, self.settings.max_output_tokens)
            .await
            .map_err(|e| {
                warn!("Generation {generation_id} failed at completion: {e}");
                AppError::from(e)
            })?;
        info!(
            "Generation {generation_id}: received {} characters",
            completion.chars().count()
        );

        // Step 4: Record and append
        let record = ProspectRecord::new(
            chrono::Local::now().date_naive(),
            &target,
            &completion,
            self.settings.preview_chars,
            self.annotator.annotate(&completion),
        );

        let outcome = log.lock().await.append(record.clone()).await;
        warnings.extend(outcome.warning());

        Ok(GenerateResponse {
            generation_id,
            completion,
            truncation,
            warnings,
            record,
            template_version: self.template.version.clone(),
        })
    }
}

/// Fills the template. Refuses to build a prompt without research material.
pub fn compose(
    template: &PromptTemplate,
    research_text: &str,
    persona: &str,
    target: &Target,
    options: &OutreachOptions,
) -> Result<String, AppError> {
    if research_text.trim().is_empty() {
        return Err(AppError::Validation(
            "Research text is empty. Provide a document or article with readable text."
                .to_string(),
        ));
    }

    let sections = optional_sections(options.include_meeting_prep, options.include_strategic_intel);
    let values = HashMap::from([
        ("persona", persona),
        ("university", target.university.as_str()),
        ("role", target.role.as_str()),
        ("tone_guidance", options.tone.guidance()),
        ("focus_guidance", options.focus.guidance()),
        ("research_text", research_text),
        ("optional_sections", sections.as_str()),
    ]);

    Ok(template.render(&values))
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
pub mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use bytes::Bytes;

    use crate::generation::prompts::DEFAULT_PERSONA;
    use crate::generation::tone::{FocusPoint, Tone};
    use crate::llm_client::LlmError;
    use crate::prospects::annotate::{Annotation, PlaceholderAnnotator};
    use crate::prospects::models::{DEFAULT_PRIORITY, DEFAULT_STATUS};

    const BU_TEXT: &str = "Boston University announces 40% increase in counseling wait times";

    pub enum StubBehavior {
        Reply(&'static str),
        Unauthorized,
        RateLimited,
    }

    /// Stands in for the completion service; records every prompt it is sent.
    pub struct StubCompletion {
        behavior: StubBehavior,
        pub calls: AtomicUsize,
        pub prompts: std::sync::Mutex<Vec<String>>,
    }

    impl StubCompletion {
        pub fn new(behavior: StubBehavior) -> Arc<Self> {
            Arc::new(Self {
                behavior,
                calls: AtomicUsize::new(0),
                prompts: std::sync::Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl CompletionService for StubCompletion {
        async fn complete(&self, prompt: &str, _max_tokens: u32) -> Result<String, LlmError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.prompts.lock().unwrap().push(prompt.to_string());
            match self.behavior {
                StubBehavior::Reply(text) => Ok(text.to_string()),
                StubBehavior::Unauthorized => Err(LlmError::Authentication {
                    status: 401,
                    message: "invalid x-api-key".into(),
                }),
                StubBehavior::RateLimited => Err(LlmError::RateLimited {
                    message: "slow down".into(),
                }),
            }
        }
    }

    pub fn generator_with(
        completion: Arc<dyn CompletionService>,
        annotator: Arc<dyn ProspectAnnotator>,
    ) -> OutreachGenerator {
        OutreachGenerator::new(
            Ingestor::new(8_000).unwrap(),
            completion,
            PromptTemplate::default(),
            annotator,
            GenerationSettings {
                max_output_tokens: 2_000,
                preview_chars: 150,
                default_persona: DEFAULT_PERSONA.to_string(),
            },
        )
    }

    fn target() -> Target {
        Target::new("Boston University", "Director of Counseling").unwrap()
    }

    #[test]
    fn test_compose_embeds_research_verbatim_and_target() {
        let prompt = compose(
            &PromptTemplate::default(),
            BU_TEXT,
            DEFAULT_PERSONA,
            &target(),
            &OutreachOptions::default(),
        )
        .unwrap();

        assert!(prompt.contains(BU_TEXT));
        assert!(prompt.contains("Director of Counseling at Boston University"));
        assert!(prompt.contains(DEFAULT_PERSONA));
        assert!(prompt.contains("## Subject Lines"));
        assert!(prompt.contains("## Email Draft"));
        assert!(prompt.contains("## LinkedIn Message"));
        assert!(prompt.contains("## Voicemail Script"));
        assert!(!prompt.contains("## Meeting Prep Notes"));
        assert!(!prompt.contains("## Strategic Intel"));
        assert!(!prompt.contains("{research_text}"));
    }

    #[test]
    fn test_compose_applies_options() {
        let options = OutreachOptions {
            tone: Tone::Formal,
            focus: FocusPoint::CounselorBurnout,
            include_meeting_prep: true,
            include_strategic_intel: true,
        };
        let prompt = compose(
            &PromptTemplate::default(),
            BU_TEXT,
            DEFAULT_PERSONA,
            &target(),
            &options,
        )
        .unwrap();

        assert!(prompt.contains(Tone::Formal.guidance()));
        assert!(prompt.contains(FocusPoint::CounselorBurnout.guidance()));
        assert!(prompt.contains("## Meeting Prep Notes"));
        assert!(prompt.contains("## Strategic Intel"));
    }

    #[test]
    fn test_compose_refuses_empty_research() {
        let err = compose(
            &PromptTemplate::default(),
            "  \n ",
            DEFAULT_PERSONA,
            &target(),
            &OutreachOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_boston_university_scenario_appends_one_record() {
        let stub = StubCompletion::new(StubBehavior::Reply("SUBJECT: ..."));
        let generator = generator_with(stub.clone(), Arc::new(PlaceholderAnnotator));
        let log = Mutex::new(ProspectLog::in_memory());

        let research = crate::research::finish(BU_TEXT.to_string(), 8_000).unwrap();
        assert_eq!(research.text, BU_TEXT);
        assert!(research.truncation.is_none());

        let response = generate_from_text(&generator, &log, BU_TEXT).await.unwrap();
        assert_eq!(response.completion, "SUBJECT: ...");
        assert!(response.warnings.is_empty());
        assert!(response.truncation.is_none());

        let log = log.lock().await;
        assert_eq!(log.len(), 1);
        let record = &log.records()[0];
        assert_eq!(record.university, "Boston University");
        assert_eq!(record.role, "Director of Counseling");
        assert_eq!(record.output_preview, "SUBJECT: ...");
        assert_eq!(record.priority, DEFAULT_PRIORITY);
        assert_eq!(record.status, DEFAULT_STATUS);

        let prompts = stub.prompts.lock().unwrap();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains(BU_TEXT));
    }

    #[tokio::test]
    async fn test_authentication_failure_leaves_log_unchanged() {
        let stub = StubCompletion::new(StubBehavior::Unauthorized);
        let generator = generator_with(stub.clone(), Arc::new(PlaceholderAnnotator));
        let log = Mutex::new(ProspectLog::in_memory());

        let err = generate_from_text(&generator, &log, BU_TEXT).await.unwrap_err();
        assert!(matches!(err, AppError::CompletionAuth(_)));
        assert_eq!(stub.calls.load(Ordering::SeqCst), 1);
        assert!(log.lock().await.is_empty());
    }

    #[tokio::test]
    async fn test_rate_limited_completion_is_not_retried() {
        let stub = StubCompletion::new(StubBehavior::RateLimited);
        let generator = generator_with(stub.clone(), Arc::new(PlaceholderAnnotator));
        let log = Mutex::new(ProspectLog::in_memory());

        let err = generate_from_text(&generator, &log, BU_TEXT).await.unwrap_err();
        assert!(matches!(err, AppError::CompletionRateLimited(_)));
        assert_eq!(stub.calls.load(Ordering::SeqCst), 1);
        assert!(log.lock().await.is_empty());
    }

    #[tokio::test]
    async fn test_blank_pdf_is_rejected_before_completion() {
        let stub = StubCompletion::new(StubBehavior::Reply("never"));
        let generator = generator_with(stub.clone(), Arc::new(PlaceholderAnnotator));
        let log = Mutex::new(ProspectLog::in_memory());

        let err = generator
            .generate(
                &log,
                GenerateRequest {
                    target: target(),
                    options: OutreachOptions::default(),
                    persona: None,
                    source: ResearchSource::Pdf(Bytes::from(
                        crate::research::pdf::tests::blank_pdf(1),
                    )),
                },
            )
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::EmptyDocument(_)));
        assert_eq!(stub.calls.load(Ordering::SeqCst), 0);
        assert!(log.lock().await.is_empty());
    }

    #[tokio::test]
    async fn test_annotator_hook_populates_priority_and_status() {
        let stub = StubCompletion::new(StubBehavior::Reply("PRIORITY: High\nSUBJECT: ..."));
        let annotator = |completion: &str| Annotation {
            priority: completion
                .lines()
                .find_map(|l| l.strip_prefix("PRIORITY: "))
                .map(str::to_string),
            status: Some("Drafted".to_string()),
        };
        let generator = generator_with(stub, Arc::new(annotator));
        let log = Mutex::new(ProspectLog::in_memory());

        let response = generate_from_text(&generator, &log, BU_TEXT).await.unwrap();
        assert_eq!(response.record.priority, "High");
        assert_eq!(response.record.status, "Drafted");
    }

    #[tokio::test]
    async fn test_request_persona_overrides_default() {
        let stub = StubCompletion::new(StubBehavior::Reply("ok"));
        let generator = generator_with(stub.clone(), Arc::new(PlaceholderAnnotator));
        let log = Mutex::new(ProspectLog::in_memory());

        generate_from_text_with_persona(&generator, &log, BU_TEXT, Some("You are Pat from Acme."))
            .await
            .unwrap();

        let prompts = stub.prompts.lock().unwrap();
        assert!(prompts[0].starts_with("You are Pat from Acme."));
        assert!(!prompts[0].contains(DEFAULT_PERSONA));
    }

    /// Serves `text` as an article so the full pipeline runs, including ingestion.
    async fn generate_from_text(
        generator: &OutreachGenerator,
        log: &Mutex<ProspectLog>,
        text: &str,
    ) -> Result<GenerateResponse, AppError> {
        generate_from_text_with_persona(generator, log, text, None).await
    }

    async fn generate_from_text_with_persona(
        generator: &OutreachGenerator,
        log: &Mutex<ProspectLog>,
        text: &str,
        persona: Option<&str>,
    ) -> Result<GenerateResponse, AppError> {
        use wiremock::matchers::method;
        use wiremock::{Mock, MockServer, ResponseTemplate};

        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(format!("<html><body><article>{text}</article></body></html>")),
            )
            .mount(&server)
            .await;

        generator
            .generate(
                log,
                GenerateRequest {
                    target: target(),
                    options: OutreachOptions::default(),
                    persona: persona.map(str::to_string),
                    source: ResearchSource::Url(format!("{}/article", server.uri())),
                },
            )
            .await
    }
}
