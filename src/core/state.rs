use crate::core::model::{
    PainPointCard, SocialCopySet, Step, VideoJob, VideoScript, VoiceConfig, WorkflowInput,
    DEFAULT_VIDEO_STYLE,
};
use serde::{Deserialize, Serialize};
use std::sync::{Mutex, MutexGuard};

/// Authoritative in-memory record of one workflow run.
///
/// Readers get a cloned snapshot and never observe a half-applied
/// operation; writers batch all of an operation's field changes under a
/// single lock acquisition.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct WorkflowState {
    pub step: Step,
    pub input: WorkflowInput,
    pub voice: VoiceConfig,
    pub video_style: String,
    /// Most recent analysis batch. Survives a failed re-analysis; only a
    /// successful one replaces it.
    pub cards: Vec<PainPointCard>,
    pub adopted: Option<PainPointCard>,
    pub script: Option<VideoScript>,
    pub video: Option<VideoJob>,
    pub social: SocialCopySet,
    /// Single last-error slot. Holds the most recent failure message;
    /// the next successful operation clears it.
    pub last_error: Option<String>,
    pub analyzing: bool,
    pub script_pending: bool,
    pub video_pending: bool,
    pub polling: bool,
    /// Bumped whenever the tracked job stops mattering. A poll result
    /// carrying an older epoch is discarded instead of written.
    pub job_epoch: u64,
}

impl Default for WorkflowState {
    fn default() -> Self {
        Self {
            step: Step::Input,
            input: WorkflowInput::default(),
            voice: VoiceConfig::default(),
            video_style: DEFAULT_VIDEO_STYLE.to_string(),
            cards: Vec::new(),
            adopted: None,
            script: None,
            video: None,
            social: SocialCopySet::default(),
            last_error: None,
            analyzing: false,
            script_pending: false,
            video_pending: false,
            polling: false,
            job_epoch: 0,
        }
    }
}

impl WorkflowState {
    /// Forgets the tracked job and invalidates any in-flight poll loop.
    pub fn discard_job(&mut self) {
        self.video = None;
        self.job_epoch = self.job_epoch.wrapping_add(1);
        self.polling = false;
    }

    /// Drops everything derived from the adopted card: script, tracked
    /// job and social copies.
    pub fn reset_generated(&mut self) {
        self.script = None;
        self.social = SocialCopySet::default();
        self.discard_job();
    }

    /// A fresh analysis restarts the pipeline, so the adoption goes too.
    /// The card batch itself stays until a successful analysis replaces it.
    pub fn reset_for_analysis(&mut self) {
        self.adopted = None;
        self.reset_generated();
    }

    pub fn record_failure(&mut self, message: impl Into<String>) {
        self.last_error = Some(message.into());
    }

    pub fn clear_error(&mut self) {
        self.last_error = None;
    }

    pub fn adopted_id(&self) -> Option<&str> {
        self.adopted.as_ref().map(|card| card.id.as_str())
    }

    pub fn resolved_video_url(&self) -> Option<&str> {
        self.video.as_ref().and_then(|job| job.video_url.as_deref())
    }
}

/// Locks shared state, recovering the guard if a writer panicked.
pub(crate) fn lock_state(state: &Mutex<WorkflowState>) -> MutexGuard<'_, WorkflowState> {
    state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::model::MarketingCopy;

    fn card(id: &str) -> PainPointCard {
        PainPointCard {
            id: id.to_string(),
            title: "title".to_string(),
            scenario: "scenario".to_string(),
            pain_point: "pain".to_string(),
            solution: "solution".to_string(),
            recommended_copies: vec![MarketingCopy {
                channel: "视频号".to_string(),
                copy: "copy".to_string(),
            }],
            saved: false,
        }
    }

    #[test]
    fn test_reset_generated_keeps_adoption_and_cards() {
        let mut state = WorkflowState::default();
        state.cards = vec![card("a"), card("b")];
        state.adopted = Some(card("a"));
        state.script = Some(VideoScript {
            headline: "h".to_string(),
            scenes: vec![],
        });
        state.video = Some(VideoJob {
            job_id: Some("job-1".to_string()),
            ..Default::default()
        });
        state.social.copies = vec!["one".to_string()];
        state.polling = true;
        let epoch = state.job_epoch;

        state.reset_generated();

        assert_eq!(state.cards.len(), 2);
        assert_eq!(state.adopted_id(), Some("a"));
        assert!(state.script.is_none());
        assert!(state.video.is_none());
        assert!(state.social.is_empty());
        assert!(!state.polling);
        assert_eq!(state.job_epoch, epoch + 1);
    }

    #[test]
    fn test_reset_for_analysis_drops_adoption() {
        let mut state = WorkflowState::default();
        state.cards = vec![card("a")];
        state.adopted = Some(card("a"));
        state.step = Step::Output;

        state.reset_for_analysis();

        assert!(state.adopted.is_none());
        assert_eq!(state.cards.len(), 1);
        // the step is the controller's business, not the reset's
        assert_eq!(state.step, Step::Output);
    }

    #[test]
    fn test_error_slot_overwrites() {
        let mut state = WorkflowState::default();
        state.record_failure("first");
        state.record_failure("second");
        assert_eq!(state.last_error.as_deref(), Some("second"));
        state.clear_error();
        assert!(state.last_error.is_none());
    }
}
