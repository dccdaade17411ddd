// Outreach Generation
// Implements: form validation, tone/focus calibration, prompt composition, generation.
// All completion calls go through llm_client; no direct Anthropic API calls here.

pub mod generator;
pub mod handlers;
pub mod options;
pub mod prompts;
pub mod tone;
