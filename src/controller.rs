use std::future::Future;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::client::ReportFetcher;
use crate::error::ReportError;
use crate::models::{ReportRequest, ReportTarget};
use crate::notify::Notifier;
use crate::sink::ArtifactSink;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerState {
    Idle,
    Busy,
}

/// Why a request was dropped without contacting the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    Busy,
    Disabled,
    NoEligibleItems,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Report fetched and saved at this path.
    Delivered(PathBuf),
    /// Generic action finished.
    Completed,
    Skipped(SkipReason),
}

/// Failures come back as the message already shown to the user.
pub type RequestResult = Result<Outcome, String>;

/// Drives on-demand report downloads for a single control, at most one in
/// flight at a time. Independent instances share nothing.
pub struct ReportRequestController {
    fetcher: Arc<dyn ReportFetcher>,
    sink: Arc<dyn ArtifactSink>,
    notifier: Arc<dyn Notifier>,
    busy: AtomicBool,
    disabled: AtomicBool,
}

/// Returns the controller to idle on every exit path, including a dropped
/// future.
struct BusyGuard<'a> {
    busy: &'a AtomicBool,
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.busy.store(false, Ordering::Release);
    }
}

impl ReportRequestController {
    pub fn new(
        fetcher: Arc<dyn ReportFetcher>,
        sink: Arc<dyn ArtifactSink>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            fetcher,
            sink,
            notifier,
            busy: AtomicBool::new(false),
            disabled: AtomicBool::new(false),
        }
    }

    pub fn state(&self) -> ControllerState {
        if self.is_busy() {
            ControllerState::Busy
        } else {
            ControllerState::Idle
        }
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    pub fn is_disabled(&self) -> bool {
        self.disabled.load(Ordering::Acquire)
    }

    pub fn set_disabled(&self, disabled: bool) {
        self.disabled.store(disabled, Ordering::Release);
    }

    pub async fn request_individual_report(
        &self,
        student_id: &str,
        student_label: &str,
        term_id: &str,
    ) -> RequestResult {
        let target = ReportTarget::Student {
            student_id: student_id.to_string(),
        };
        let request = ReportRequest::new(target, term_id, student_label, None);
        self.run(request, None).await
    }

    pub async fn request_course_report(
        &self,
        course_id: &str,
        course_label: &str,
        term_id: &str,
        term_label: &str,
        eligible_count: usize,
    ) -> RequestResult {
        let target = ReportTarget::Course {
            course_id: course_id.to_string(),
        };
        let request = ReportRequest::new(target, term_id, course_label, Some(term_label));
        self.run(request, Some(eligible_count)).await
    }

    pub async fn request_subject_report(
        &self,
        subject_course_id: &str,
        subject_label: &str,
        term_id: &str,
        term_label: &str,
    ) -> RequestResult {
        let target = ReportTarget::SubjectCourse {
            subject_course_id: subject_course_id.to_string(),
        };
        let request = ReportRequest::new(target, term_id, subject_label, Some(term_label));
        self.run(request, None).await
    }

    /// Runs a caller-supplied action under the same single-flight and error
    /// surfacing as the built-in reports. `on_action` is not invoked when the
    /// request is skipped.
    pub async fn request_generic<F, Fut>(&self, on_action: F) -> RequestResult
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = anyhow::Result<()>>,
    {
        let _guard = match self.claim(None) {
            Ok(guard) => guard,
            Err(reason) => {
                debug!(?reason, "generic report request skipped");
                return Ok(Outcome::Skipped(reason));
            }
        };

        let span = info_span!("report_request", request_id = %Uuid::new_v4(), kind = "generic");
        match on_action().instrument(span).await {
            Ok(()) => Ok(Outcome::Completed),
            Err(err) => Err(self.surface(ReportError::Action(err))),
        }
    }

    async fn run(&self, request: ReportRequest, eligible_count: Option<usize>) -> RequestResult {
        let _guard = match self.claim(eligible_count) {
            Ok(guard) => guard,
            Err(reason) => {
                debug!(
                    ?reason,
                    kind = request.target.kind(),
                    target_id = request.target.id(),
                    "report request skipped"
                );
                return Ok(Outcome::Skipped(reason));
            }
        };

        let span = info_span!(
            "report_request",
            request_id = %request.id,
            kind = request.target.kind(),
            target_id = request.target.id(),
            term = %request.term_id
        );

        async {
            match self.fetch_and_save(&request).await {
                Ok(path) => {
                    info!(path = %path.display(), "report delivered");
                    self.notifier.success(&request.success_message());
                    Ok(Outcome::Delivered(path))
                }
                Err(err) => Err(self.surface(err)),
            }
        }
        .instrument(span)
        .await
    }

    async fn fetch_and_save(&self, request: &ReportRequest) -> Result<PathBuf, ReportError> {
        let term_id = request.term_id.as_str();
        let artifact = match &request.target {
            ReportTarget::Student { student_id } => {
                self.fetcher.fetch_individual_report(student_id, term_id).await?
            }
            ReportTarget::Course { course_id } => {
                self.fetcher.fetch_course_reports(course_id, term_id).await?
            }
            ReportTarget::SubjectCourse { subject_course_id } => {
                self.fetcher.fetch_subject_report(subject_course_id, term_id).await?
            }
        };
        self.sink.save(artifact).await
    }

    /// Checks the rejection rules, then flips idle to busy.
    fn claim(&self, eligible_count: Option<usize>) -> Result<BusyGuard<'_>, SkipReason> {
        if self.is_disabled() {
            return Err(SkipReason::Disabled);
        }
        if eligible_count == Some(0) {
            return Err(SkipReason::NoEligibleItems);
        }
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| SkipReason::Busy)?;
        Ok(BusyGuard { busy: &self.busy })
    }

    fn surface(&self, err: ReportError) -> String {
        warn!(error = %err, "report request failed");
        let message = err.user_message();
        self.notifier.error(&message);
        message
    }
}
