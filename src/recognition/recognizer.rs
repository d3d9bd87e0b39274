//! Request-scoped recognition: decode, detect, match, persist

use super::config::RecognitionConfig;
use super::detector::SlotDetector;
use super::error::{RecognitionError, ScanResult};
use super::matcher::TemplateMatcher;
use super::template::{TemplateLibrary, TemplateSource};
use super::types::{RecognitionResult, RecognitionStage, SlotMatch};
use crate::collection::BlueprintStore;
use std::sync::Arc;

/// Wires slot detection, template matching and the collection store together.
pub struct Recognizer<S: BlueprintStore> {
    config: RecognitionConfig,
    templates: Arc<TemplateLibrary>,
    store: Arc<S>,
}

impl<S: BlueprintStore> Recognizer<S> {
    pub fn new(
        config: RecognitionConfig,
        templates: Arc<TemplateLibrary>,
        store: Arc<S>,
    ) -> ScanResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            templates,
            store,
        })
    }

    /// Recognizer backed by the process-wide template cache for `source`
    pub fn with_shared_templates(
        config: RecognitionConfig,
        source: TemplateSource,
        store: Arc<S>,
    ) -> ScanResult<Self> {
        let templates = TemplateLibrary::shared(source, &config);
        Self::new(config, templates, store)
    }

    pub fn config(&self) -> &RecognitionConfig {
        &self.config
    }

    pub fn templates(&self) -> &TemplateLibrary {
        &self.templates
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Run the full pipeline for one screenshot. Never fails: every error is
    /// reported as `success: false` with a readable message.
    pub async fn recognize(&self, user_id: &str, image_bytes: Option<&[u8]>) -> RecognitionResult {
        let mut stage = RecognitionStage::Idle;
        match self.run(user_id, image_bytes, &mut stage).await {
            Ok(result) => result,
            Err(e) if e.is_input_error() => {
                log::warn!("⚠️ Rejected recognition request: {}", e);
                RecognitionResult::failure(e.to_string())
            }
            Err(e) => {
                log::error!("❌ Recognition failed after {:?}: {}", stage, e);
                RecognitionResult::failure(format!("Failed to process image: {e}"))
            }
        }
    }

    async fn run(
        &self,
        user_id: &str,
        image_bytes: Option<&[u8]>,
        stage: &mut RecognitionStage,
    ) -> ScanResult<RecognitionResult> {
        let bytes = match image_bytes {
            Some(bytes) if !bytes.is_empty() => bytes,
            _ => return Err(RecognitionError::MissingImage),
        };
        if user_id.trim().is_empty() {
            return Err(RecognitionError::MissingUser);
        }

        let image =
            image::load_from_memory(bytes).map_err(|source| RecognitionError::Decode { source })?;
        log::debug!("🖼️ Decoded screenshot {}x{}", image.width(), image.height());

        let templates = self.templates.get().await?;
        advance(stage, RecognitionStage::TemplatesReady);

        let detector = SlotDetector::new(&self.config);
        let (image, rects) = tokio::task::spawn_blocking(move || {
            let rects = detector.detect_slots(&image);
            (image, rects)
        })
        .await?;
        advance(stage, RecognitionStage::SlotsDetected);

        if rects.is_empty() {
            log::info!("🔍 No blueprint slots detected");
            advance(stage, RecognitionStage::Done);
            return Ok(RecognitionResult::no_slots());
        }

        let matcher = TemplateMatcher::new(&self.config);
        let slot_rects = rects.clone();
        let matches = tokio::task::spawn_blocking(move || {
            matcher.match_all_slots(&image, &slot_rects, &templates)
        })
        .await?;
        advance(stage, RecognitionStage::SlotsMatched);

        let accepted: Vec<SlotMatch> = matches.into_iter().filter(SlotMatch::is_accepted).collect();
        self.persist_found(user_id, &accepted).await;
        advance(stage, RecognitionStage::PersistenceUpdated);

        log::info!(
            "✅ Matched {} of {} slot(s) for user '{}'",
            accepted.len(),
            rects.len(),
            user_id
        );
        advance(stage, RecognitionStage::Done);
        Ok(RecognitionResult::found(accepted, rects.len()))
    }

    /// Mark every accepted blueprint found, one call at a time. A failed
    /// call is logged and skipped; earlier updates are not rolled back.
    async fn persist_found(&self, user_id: &str, accepted: &[SlotMatch]) {
        for slot in accepted {
            let Some(blueprint) = slot.template_name.as_deref() else {
                continue;
            };
            if let Err(e) = self.store.mark_found(user_id, blueprint, true).await {
                log::warn!(
                    "⚠️ Failed to mark '{}' found for user '{}': {}",
                    blueprint,
                    user_id,
                    e
                );
            }
        }
    }
}

fn advance(stage: &mut RecognitionStage, next: RecognitionStage) {
    log::debug!("Recognition stage {:?} -> {:?}", stage, next);
    *stage = next;
}
