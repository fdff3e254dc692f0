use crate::core::config::PollerConfig;
use crate::core::state::{lock_state, WorkflowState};
use crate::services::gateway::GenerationGateway;
use log::{debug, warn};
use std::sync::{Arc, Mutex};
use tokio::task::JoinHandle;
use tokio::time::sleep;

/// Spawns the poll loop for one submitted video job.
///
/// The loop sleeps one interval, queries the job status, and repeats
/// until the gateway reports a playable URL, a query fails, or the
/// attempt budget runs out. `epoch` is the value of `job_epoch` at
/// submission time; every write re-checks it under the state lock, so a
/// result that arrives after the job stopped mattering is dropped.
pub fn spawn_status_poller(
    gateway: Arc<dyn GenerationGateway>,
    state: Arc<Mutex<WorkflowState>>,
    job_id: String,
    epoch: u64,
    plan: PollerConfig,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        poll_until_settled(gateway, state, job_id, epoch, plan).await;
    })
}

async fn poll_until_settled(
    gateway: Arc<dyn GenerationGateway>,
    state: Arc<Mutex<WorkflowState>>,
    job_id: String,
    epoch: u64,
    plan: PollerConfig,
) {
    let interval = plan.interval();

    for attempt in 1..=plan.max_attempts {
        sleep(interval).await;

        match gateway.video_status(&job_id).await {
            Ok(status) => {
                if let Some(raw) = &status.raw {
                    debug!("job {} raw status payload: {}", job_id, raw);
                }
                let resolved_url = status
                    .video_url
                    .as_deref()
                    .map(str::trim)
                    .filter(|u| !u.is_empty())
                    .map(str::to_string);

                let mut st = lock_state(&state);
                if st.job_epoch != epoch {
                    debug!("job {} superseded, dropping poll result", job_id);
                    return;
                }
                if let Some(job) = st.video.as_mut() {
                    job.status = Some(status.status.clone());
                    if let Some(url) = resolved_url {
                        debug!("job {} resolved after {} attempts", job_id, attempt);
                        job.video_url = Some(url);
                        st.clear_error();
                        st.polling = false;
                        return;
                    }
                }
            }
            Err(err) => {
                warn!("status query for job {} failed: {}", job_id, err);
                let mut st = lock_state(&state);
                if st.job_epoch != epoch {
                    return;
                }
                if let Some(job) = st.video.as_mut() {
                    job.status = Some(err.to_string());
                }
                st.record_failure(err.to_string());
                st.polling = false;
                return;
            }
        }
    }

    let mut st = lock_state(&state);
    if st.job_epoch == epoch {
        warn!(
            "job {} still unresolved after {} attempts, giving up",
            job_id, plan.max_attempts
        );
        st.polling = false;
    }
}
