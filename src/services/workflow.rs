use crate::core::config::Config;
use crate::core::error::{WorkflowError, WorkflowResult};
use crate::core::model::{Step, VideoJob, VideoScript, VoiceConfig, WorkflowInput};
use crate::core::state::{lock_state, WorkflowState};
use crate::services::gateway::{
    AnalyzeRequest, GenerationGateway, ScriptRequest, SocialCopyRequest, VideoRequest,
};
use crate::services::poller::spawn_status_poller;
use crate::utils::text::split_keywords;
use log::{debug, info, warn};
use std::sync::{Arc, Mutex};
use tokio::task::JoinHandle;

/// Drives one content-generation workflow from product input to a
/// finished video or social-post copy set.
///
/// All methods take `&self`: state lives behind a mutex and every
/// operation applies its result as one batch write. Reads are cloned
/// snapshots, so observers never see a half-applied operation.
pub struct WorkflowManager {
    config: Config,
    gateway: Arc<dyn GenerationGateway>,
    state: Arc<Mutex<WorkflowState>>,
    poller: Mutex<Option<JoinHandle<()>>>,
}

fn non_empty(value: String) -> Option<String> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value)
    }
}

impl WorkflowManager {
    pub fn new(config: Config, gateway: Arc<dyn GenerationGateway>) -> Self {
        Self {
            config,
            gateway,
            state: Arc::new(Mutex::new(WorkflowState::default())),
            poller: Mutex::new(None),
        }
    }

    pub fn snapshot(&self) -> WorkflowState {
        lock_state(&self.state).clone()
    }

    pub fn update_input<F>(&self, apply: F)
    where
        F: FnOnce(&mut WorkflowInput),
    {
        apply(&mut lock_state(&self.state).input);
    }

    pub fn set_voice(&self, voice: VoiceConfig) {
        lock_state(&self.state).voice = voice;
    }

    pub fn set_video_style(&self, style: impl Into<String>) {
        lock_state(&self.state).video_style = style.into();
    }

    /// Submits the current input for pain-point analysis. This restarts
    /// the pipeline: the adoption and everything derived from it are
    /// cleared up front, and on success the workflow moves to Selection.
    /// The previous card batch survives a failed analysis.
    pub async fn run_analysis(&self) -> WorkflowResult<()> {
        let request = {
            let mut st = lock_state(&self.state);
            if st.analyzing {
                return Err(WorkflowError::AlreadyInProgress("analysis"));
            }
            st.analyzing = true;
            st.step = Step::Input;
            st.reset_for_analysis();
            let input = st.input.clone();
            AnalyzeRequest {
                product_name: input.product_name,
                persona: input.persona,
                target_customer: input.target_customer,
                audience_type: input.audience,
                product_keywords: split_keywords(&input.keywords_raw),
                additional_context: input.extra_context,
            }
        };
        self.abort_poller();

        debug!("submitting analysis for {}", request.product_name);
        let outcome = self.gateway.analyze(&request).await;

        let result = {
            let mut st = lock_state(&self.state);
            st.analyzing = false;
            match outcome {
                Ok(cards) => {
                    info!("analysis produced {} cards", cards.len());
                    // anything adopted or generated while the request was
                    // in flight belongs to the replaced batch
                    st.reset_for_analysis();
                    st.cards = cards;
                    st.step = Step::Selection;
                    st.clear_error();
                    Ok(())
                }
                Err(err) => {
                    warn!("analysis failed: {}", err);
                    st.record_failure(err.to_string());
                    Err(err)
                }
            }
        };
        if result.is_ok() {
            self.abort_poller();
        }
        result
    }

    /// Flips the local bookmark on one card of the current batch.
    pub fn toggle_saved(&self, card_id: &str) -> WorkflowResult<bool> {
        let mut st = lock_state(&self.state);
        let Some(card) = st.cards.iter_mut().find(|card| card.id == card_id) else {
            let err = WorkflowError::Precondition(format!("card {} not in current batch", card_id));
            st.record_failure(err.to_string());
            return Err(err);
        };
        card.saved = !card.saved;
        let saved = card.saved;
        if let Some(adopted) = st.adopted.as_mut() {
            if adopted.id == card_id {
                adopted.saved = saved;
            }
        }
        st.clear_error();
        Ok(saved)
    }

    /// Commits to one card of the current batch. Artifacts derived from
    /// a previous adoption are dropped; the step stays where it is,
    /// since moving on is a separate explicit action.
    pub fn adopt_card(&self, card_id: &str) -> WorkflowResult<()> {
        {
            let mut st = lock_state(&self.state);
            let Some(card) = st.cards.iter().find(|card| card.id == card_id).cloned() else {
                let err =
                    WorkflowError::Precondition(format!("card {} not in current batch", card_id));
                st.record_failure(err.to_string());
                return Err(err);
            };
            debug!("adopting card {}", card_id);
            st.adopted = Some(card);
            st.reset_generated();
            st.clear_error();
        }
        self.abort_poller();
        Ok(())
    }

    /// Moves to the Output step. Fails without changing the step when
    /// no card has been adopted.
    pub fn advance_to_output(&self) -> WorkflowResult<()> {
        let mut st = lock_state(&self.state);
        if st.adopted.is_none() {
            let err = WorkflowError::Precondition("no card adopted".to_string());
            st.record_failure(err.to_string());
            return Err(err);
        }
        st.step = Step::Output;
        st.clear_error();
        Ok(())
    }

    /// Returns the stored script, generating it first when absent.
    /// Never issues a second request while one is outstanding; the
    /// later caller gets `AlreadyInProgress` instead.
    pub async fn ensure_script(&self) -> WorkflowResult<VideoScript> {
        let existing = lock_state(&self.state).script.clone();
        if let Some(script) = existing {
            return Ok(script);
        }
        self.request_script().await
    }

    /// Issues a fresh script generation even when one is stored,
    /// replacing it wholesale.
    pub async fn regenerate_script(&self) -> WorkflowResult<VideoScript> {
        self.request_script().await
    }

    async fn request_script(&self) -> WorkflowResult<VideoScript> {
        let (request, card_id) = {
            let mut st = lock_state(&self.state);
            let Some(card) = st.adopted.clone() else {
                let err = WorkflowError::Precondition("no card adopted".to_string());
                st.record_failure(err.to_string());
                return Err(err);
            };
            if st.script_pending {
                return Err(WorkflowError::AlreadyInProgress("script generation"));
            }
            st.script_pending = true;
            let card_id = card.id.clone();
            let request = ScriptRequest {
                selected_card: card,
                voice: st.voice.clone(),
                video_style: st.video_style.clone(),
                provider: st.input.provider.clone(),
            };
            (request, card_id)
        };

        debug!("requesting script for card {}", card_id);
        let outcome = self.gateway.generate_script(&request).await;

        let mut st = lock_state(&self.state);
        st.script_pending = false;
        match outcome {
            Ok(script) => {
                if st.adopted_id() != Some(card_id.as_str()) {
                    debug!("card {} no longer adopted, dropping its script", card_id);
                    return Err(WorkflowError::Precondition(
                        "adopted card changed during script generation".to_string(),
                    ));
                }
                st.script = Some(script.clone());
                st.clear_error();
                Ok(script)
            }
            Err(err) => {
                warn!("script generation failed: {}", err);
                st.record_failure(err.to_string());
                Err(err)
            }
        }
    }

    /// Submits the stored script for video rendering, generating the
    /// script first when it is missing. When the script cannot be
    /// produced the whole operation is a silent no-op: a half-armed
    /// video request never goes out. A submitted job replaces whatever
    /// job was tracked before.
    pub async fn generate_video(&self) -> WorkflowResult<()> {
        if lock_state(&self.state).script.is_none() {
            if let Err(err) = self.ensure_script().await {
                debug!("implicit script generation failed: {}", err);
            }
        }

        let (request, card_id) = {
            let mut st = lock_state(&self.state);
            let (Some(_), Some(script)) = (st.adopted.as_ref(), st.script.clone()) else {
                debug!("video generation skipped, prerequisites missing");
                return Ok(());
            };
            if st.video_pending {
                return Err(WorkflowError::AlreadyInProgress("video generation"));
            }
            st.video_pending = true;
            st.discard_job();
            let card_id = st.adopted_id().map(str::to_string);
            let request = VideoRequest {
                script,
                voice: st.voice.clone(),
                video_style: st.video_style.clone(),
            };
            (request, card_id)
        };
        self.abort_poller();

        debug!("submitting video generation request");
        let outcome = self.gateway.generate_video(&request).await;

        match outcome {
            Ok(submission) => {
                let mut st = lock_state(&self.state);
                st.video_pending = false;
                if st.adopted_id().map(str::to_string) != card_id {
                    debug!("video submission superseded, dropping result");
                    return Ok(());
                }
                let job = VideoJob {
                    job_id: submission.job_id,
                    status: submission.status,
                    video_url: non_empty(submission.video_url),
                    audio_url: non_empty(submission.audio_url),
                };
                let unresolved = match (&job.job_id, &job.video_url) {
                    (Some(job_id), None) => Some(job_id.clone()),
                    _ => None,
                };
                info!(
                    "video submission accepted (job: {})",
                    job.job_id.as_deref().unwrap_or("none")
                );
                st.video = Some(job);
                st.clear_error();
                let epoch = st.job_epoch;
                if unresolved.is_some() {
                    st.polling = true;
                }
                drop(st);
                if let Some(job_id) = unresolved {
                    self.start_poller(job_id, epoch);
                }
                Ok(())
            }
            Err(err) => {
                warn!("video generation failed: {}", err);
                let mut st = lock_state(&self.state);
                st.video_pending = false;
                st.record_failure(err.to_string());
                Err(err)
            }
        }
    }

    /// Requests a fresh set of social-post copies for the adopted card.
    /// The result replaces the previous set wholesale; selection falls
    /// back to the first entry.
    pub async fn generate_social_copies(&self) -> WorkflowResult<()> {
        let (request, card_id) = {
            let mut st = lock_state(&self.state);
            let Some(card) = st.adopted.clone() else {
                let err = WorkflowError::Precondition("no card adopted".to_string());
                st.record_failure(err.to_string());
                return Err(err);
            };
            let card_id = card.id.clone();
            let request = SocialCopyRequest {
                selected_card: card,
                provider: st.input.provider.clone(),
            };
            (request, card_id)
        };

        debug!("requesting social copies for card {}", card_id);
        match self.gateway.social_copies(&request).await {
            Ok(copies) => {
                let mut st = lock_state(&self.state);
                if st.adopted_id() != Some(card_id.as_str()) {
                    debug!("card {} no longer adopted, dropping social copies", card_id);
                    return Ok(());
                }
                info!("received {} social copies", copies.len());
                st.social.selected = if copies.is_empty() { None } else { Some(0) };
                st.social.copies = copies;
                st.clear_error();
                Ok(())
            }
            Err(err) => {
                warn!("social copy generation failed: {}", err);
                lock_state(&self.state).record_failure(err.to_string());
                Err(err)
            }
        }
    }

    pub fn select_social_copy(&self, index: usize) -> WorkflowResult<()> {
        let mut st = lock_state(&self.state);
        if index >= st.social.copies.len() {
            let err =
                WorkflowError::Precondition(format!("social copy index {} out of range", index));
            st.record_failure(err.to_string());
            return Err(err);
        }
        st.social.selected = Some(index);
        st.clear_error();
        Ok(())
    }

    /// Restarts the poll loop for a tracked job whose URL has not
    /// resolved yet. Returns whether a loop was started; an already
    /// active loop is left alone.
    pub fn resume_polling(&self) -> bool {
        let (job_id, epoch) = {
            let mut st = lock_state(&self.state);
            let Some(job) = st.video.as_ref() else {
                return false;
            };
            if job.video_url.is_some() {
                return false;
            }
            let Some(job_id) = job.job_id.clone() else {
                return false;
            };
            if st.polling {
                return false;
            }
            st.polling = true;
            (job_id, st.job_epoch)
        };
        debug!("resuming status polling for job {}", job_id);
        self.start_poller(job_id, epoch);
        true
    }

    fn start_poller(&self, job_id: String, epoch: u64) {
        let handle = spawn_status_poller(
            Arc::clone(&self.gateway),
            Arc::clone(&self.state),
            job_id,
            epoch,
            self.config.poller.clone(),
        );
        let mut slot = self.poller.lock().unwrap_or_else(|p| p.into_inner());
        if let Some(old) = slot.replace(handle) {
            old.abort();
        }
    }

    fn abort_poller(&self) {
        let handle = {
            let mut slot = self.poller.lock().unwrap_or_else(|p| p.into_inner());
            slot.take()
        };
        if let Some(handle) = handle {
            handle.abort();
        }
    }
}

impl Drop for WorkflowManager {
    fn drop(&mut self) {
        self.abort_poller();
    }
}
