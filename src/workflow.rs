use crate::{
    config::Config,
    error::{classify, SubmissionError, UserMessage, ValidationError},
    health::{self, ConnectionStatus, HealthView},
    intake::{self, FileCandidate, FileSummary, Preview, SelectedFile},
    progress::ProgressTicker,
    render::{render, ClassificationResult, ResultView},
    service::{ClassifierService, PredictResponse},
};
use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::{oneshot, watch};
use tokio::time::Instant;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionState {
    #[default]
    Idle,
    InFlight,
    Succeeded,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IgnoreReason {
    NoFile,
    InFlight,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    /// Preconditions not met; no request was issued.
    Ignored(IgnoreReason),
    Succeeded(ResultView),
    Failed(UserMessage),
    /// A reset aborted the request or made its reply stale.
    Cancelled,
}

#[derive(Debug, Clone)]
struct ErrorNotice {
    message: UserMessage,
    raised_at: Instant,
}

#[derive(Debug, Default)]
struct WorkflowState {
    selected: Option<Arc<SelectedFile>>,
    selection_id: u64,
    preview: Option<Preview>,
    submission: SubmissionState,
    generation: u64,
    abort: Option<oneshot::Sender<()>>,
    result: Option<ClassificationResult>,
    error: Option<ErrorNotice>,
    connection: ConnectionStatus,
    health_modal: Option<HealthView>,
}

impl WorkflowState {
    fn raise_error(&mut self, message: UserMessage) {
        self.error = Some(ErrorNotice {
            message,
            raised_at: Instant::now(),
        });
    }

    fn clear_selection(&mut self) {
        self.selected = None;
        self.preview = None;
        self.selection_id += 1;
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorView {
    pub message: String,
    /// True for a short window after the error was raised.
    pub emphasized: bool,
}

/// Everything a UI layer needs to draw the workflow.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorkflowView {
    pub submission: SubmissionState,
    pub file: Option<FileSummary>,
    pub preview: Option<Preview>,
    pub show_actions: bool,
    pub submit_enabled: bool,
    pub submit_label: &'static str,
    pub loading: bool,
    pub progress: f64,
    pub result: Option<ResultView>,
    pub error: Option<ErrorView>,
    pub connection: ConnectionStatus,
    pub connection_label: &'static str,
    pub health_modal: Option<HealthView>,
}

impl WorkflowView {
    fn from_state(st: &WorkflowState, progress: f64, now: Instant, emphasis: Duration) -> Self {
        let in_flight = st.submission == SubmissionState::InFlight;
        Self {
            submission: st.submission,
            file: st.selected.as_ref().map(|f| f.summary()),
            preview: st.preview.clone(),
            show_actions: st.selected.is_some(),
            submit_enabled: st.selected.is_some() && !in_flight,
            submit_label: if in_flight { "Processing..." } else { "Classify Leaf" },
            loading: in_flight,
            progress,
            result: st.result.as_ref().map(render),
            error: st.error.as_ref().map(|e| ErrorView {
                message: e.message.to_string(),
                emphasized: now.saturating_duration_since(e.raised_at) < emphasis,
            }),
            connection: st.connection,
            connection_label: st.connection.label(),
            health_modal: st.health_modal.clone(),
        }
    }
}

/// Puts the state back to idle and clears the progress bar if a submit future
/// is dropped before it settles.
struct InFlightGuard<'a> {
    state: &'a Mutex<WorkflowState>,
    progress: &'a watch::Sender<f64>,
    generation: u64,
    armed: bool,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let mut st = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if st.generation == self.generation && st.submission == SubmissionState::InFlight {
            warn!(generation = self.generation, "submission dropped before settling");
            st.submission = SubmissionState::Idle;
            st.abort = None;
            self.progress.send_replace(0.0);
        }
    }
}

/// Owns the client state: staged file, submission, last result, error surface,
/// health display. All methods take `&self`; the state lock is never held
/// across an await.
pub struct UploadWorkflow<S: ClassifierService> {
    cfg: Config,
    service: S,
    state: Mutex<WorkflowState>,
    progress: watch::Sender<f64>,
}

impl<S: ClassifierService> UploadWorkflow<S> {
    pub fn new(cfg: &Config, service: S) -> Self {
        let (progress, _) = watch::channel(0.0);
        Self {
            cfg: cfg.clone(),
            service,
            state: Mutex::new(WorkflowState::default()),
            progress,
        }
    }

    pub fn config(&self) -> &Config {
        &self.cfg
    }

    pub fn service(&self) -> &S {
        &self.service
    }

    fn lock(&self) -> MutexGuard<'_, WorkflowState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn subscribe_progress(&self) -> watch::Receiver<f64> {
        self.progress.subscribe()
    }

    pub fn submission_state(&self) -> SubmissionState {
        self.lock().submission
    }

    pub fn selected_file(&self) -> Option<Arc<SelectedFile>> {
        self.lock().selected.clone()
    }

    /// Validates and stages `candidate`, then attempts a preview. On rejection
    /// the staged file is left as it was and the error surface shows why.
    pub async fn select_file(
        &self,
        candidate: FileCandidate,
    ) -> Result<Arc<SelectedFile>, ValidationError> {
        let file = match intake::validate(&self.cfg.upload, candidate) {
            Ok(file) => Arc::new(file),
            Err(err) => {
                warn!("file rejected: {err}");
                self.lock().raise_error(UserMessage::from(&err));
                return Err(err);
            }
        };

        let selection_id = {
            let mut st = self.lock();
            st.clear_selection();
            st.selected = Some(file.clone());
            st.error = None;
            st.selection_id
        };
        info!(
            name = %file.name,
            bytes = file.size_bytes,
            mime = %file.mime_type,
            "file staged"
        );

        let target = file.clone();
        match tokio::task::spawn_blocking(move || intake::decode_preview(&target)).await {
            Ok(Ok(preview)) => {
                let mut st = self.lock();
                if st.selection_id == selection_id {
                    st.preview = Some(preview);
                } else {
                    debug!("selection changed while decoding; preview dropped");
                }
            }
            Ok(Err(err)) => warn!("preview unavailable: {err:#}"),
            Err(err) => warn!("preview task failed: {err}"),
        }

        Ok(file)
    }

    /// Drop-zone entry point. Only the first file counts; an empty drop is a no-op.
    pub async fn select_dropped(
        &self,
        files: Vec<FileCandidate>,
    ) -> Result<Option<Arc<SelectedFile>>, ValidationError> {
        let dropped = files.len();
        let Some(first) = files.into_iter().next() else {
            return Ok(None);
        };
        if dropped > 1 {
            debug!(dropped, "multiple files dropped; keeping the first");
        }
        self.select_file(first).await.map(Some)
    }

    /// Clears the staged file and error surface. A shown result stays.
    pub fn remove_file(&self) {
        let mut st = self.lock();
        st.clear_selection();
        st.error = None;
    }

    /// Uploads the staged file. A no-op without a file or while a request is
    /// already in flight.
    pub async fn submit(&self) -> SubmitOutcome {
        let (file, generation, abort_rx) = {
            let mut st = self.lock();
            if st.submission == SubmissionState::InFlight {
                debug!("submit ignored: request already in flight");
                return SubmitOutcome::Ignored(IgnoreReason::InFlight);
            }
            let Some(file) = st.selected.clone() else {
                debug!("submit ignored: no file staged");
                return SubmitOutcome::Ignored(IgnoreReason::NoFile);
            };
            st.submission = SubmissionState::InFlight;
            st.result = None;
            st.error = None;
            st.generation += 1;
            let (tx, rx) = oneshot::channel();
            st.abort = Some(tx);
            (file, st.generation, rx)
        };

        let mut guard = InFlightGuard {
            state: &self.state,
            progress: &self.progress,
            generation,
            armed: true,
        };
        info!(name = %file.name, bytes = file.size_bytes, generation, "submitting");

        let started = Instant::now();
        let ticker = ProgressTicker::start(&self.cfg.progress, self.progress.clone());
        let reply = tokio::select! {
            reply = self.service.predict(&file) => Some(reply),
            Ok(()) = abort_rx => None,
        };
        ticker.settle().await;
        self.progress.send_replace(0.0);

        guard.armed = false;
        self.settle(generation, reply, started.elapsed())
    }

    fn settle(
        &self,
        generation: u64,
        reply: Option<Result<PredictResponse, SubmissionError>>,
        elapsed: Duration,
    ) -> SubmitOutcome {
        let mut st = self.lock();
        let Some(reply) = reply.filter(|_| st.generation == generation) else {
            info!(generation, "submission cancelled by reset");
            return SubmitOutcome::Cancelled;
        };
        st.abort = None;

        let marker = &self.cfg.classification.non_target_marker;
        match reply.and_then(|resp| ClassificationResult::from_response(resp, marker)) {
            Ok(result) => {
                info!(
                    prediction = %result.predicted_label,
                    non_target = result.is_non_target_class,
                    elapsed_ms = elapsed.as_millis() as u64,
                    "classification succeeded"
                );
                let view = render(&result);
                st.submission = SubmissionState::Succeeded;
                st.result = Some(result);
                st.error = None;
                SubmitOutcome::Succeeded(view)
            }
            Err(err) => {
                warn!(
                    elapsed_ms = elapsed.as_millis() as u64,
                    "classification failed: {err}"
                );
                let message = classify(&err, self.service.base_url());
                st.submission = SubmissionState::Failed;
                st.raise_error(message.clone());
                SubmitOutcome::Failed(message)
            }
        }
    }

    /// Back to a blank slate: no file, no result, no error, idle. An in-flight
    /// request is aborted.
    pub fn reset_all(&self) {
        {
            let mut st = self.lock();
            if let Some(abort) = st.abort.take() {
                info!(generation = st.generation, "aborting in-flight submission");
                let _ = abort.send(());
            }
            st.generation += 1;
            st.clear_selection();
            st.result = None;
            st.error = None;
            st.submission = SubmissionState::Idle;
        }
        self.progress.send_replace(0.0);
    }

    /// Startup probe: only updates the connection indicator.
    pub async fn probe_connection(&self) -> ConnectionStatus {
        let status = match self.service.health().await {
            Ok(_) => ConnectionStatus::Connected,
            Err(err) => {
                warn!("connection probe failed: {err}");
                ConnectionStatus::Disconnected
            }
        };
        self.lock().connection = status;
        status
    }

    /// On-demand health check; the result is shown in the health dialog.
    pub async fn check_health(&self) -> HealthView {
        let view = health::check_health(&self.service).await;
        self.lock().health_modal = Some(view.clone());
        view
    }

    pub fn close_health_modal(&self) {
        self.lock().health_modal = None;
    }

    pub fn view(&self) -> WorkflowView {
        let progress = *self.progress.borrow();
        let emphasis = Duration::from_millis(self.cfg.workflow.error_emphasis_ms);
        WorkflowView::from_state(&self.lock(), progress, Instant::now(), emphasis)
    }
}
