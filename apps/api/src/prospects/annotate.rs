//! Post-processing hook that may derive priority and status from a completion.
//!
//! Nothing is parsed out of the model output by default. `AppState` carries an
//! `Arc<dyn ProspectAnnotator>`; swap it at startup to populate the fields.

/// Values an annotator may supply. `None` falls back to the record placeholders.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Annotation {
    pub priority: Option<String>,
    pub status: Option<String>,
}

pub trait ProspectAnnotator: Send + Sync {
    fn annotate(&self, completion: &str) -> Annotation;
}

/// Leaves every field to the placeholders.
pub struct PlaceholderAnnotator;

impl ProspectAnnotator for PlaceholderAnnotator {
    fn annotate(&self, _completion: &str) -> Annotation {
        Annotation::default()
    }
}

impl<F> ProspectAnnotator for F
where
    F: Fn(&str) -> Annotation + Send + Sync,
{
    fn annotate(&self, completion: &str) -> Annotation {
        self(completion)
    }
}
