/// Screen-level controller: the single owner of the picked image, busy flag,
/// last analysis result and overlay selection.
///
/// Presentation code reads from it and reports layout/load/tap events back;
/// it never holds mutable state of its own.
use serde::Serialize;

use crate::analysis::client::AnalysisClient;
use crate::analysis::types::AnalyzeImageResponse;
use crate::analysis::upload::ImageUpload;
use crate::errors::{ObscuraError, ObscuraResult};
use crate::overlay::projector::{finding_at, project_findings};
use crate::overlay::types::{Finding, ProjectedRect, Size, DEFAULT_PADDING};
use crate::screen::state::{ScreenEvent, ScreenState};

/// A finding placed over the displayed image.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Overlay {
    pub index: usize,
    pub label: String,
    pub rect: ProjectedRect,
}

pub struct ScreenController {
    state: ScreenState,
    image: Option<ImageUpload>,
    busy: bool,
    response: Option<AnalyzeImageResponse>,
    findings: Vec<Finding>,
    container: Size,
    natural: Size,
    selected: Option<usize>,
    padding: f64,
    analyzed_at: Option<chrono::DateTime<chrono::Utc>>,
}

impl Default for ScreenController {
    fn default() -> Self {
        Self::new(DEFAULT_PADDING)
    }
}

impl ScreenController {
    pub fn new(padding: f64) -> Self {
        Self {
            state: ScreenState::default(),
            image: None,
            busy: false,
            response: None,
            findings: Vec::new(),
            container: Size::default(),
            natural: Size::default(),
            selected: None,
            padding,
            analyzed_at: None,
        }
    }

    pub fn state(&self) -> &ScreenState {
        &self.state
    }

    pub fn is_busy(&self) -> bool {
        self.busy
    }

    pub fn image(&self) -> Option<&ImageUpload> {
        self.image.as_ref()
    }

    pub fn response(&self) -> Option<&AnalyzeImageResponse> {
        self.response.as_ref()
    }

    pub fn findings(&self) -> &[Finding] {
        &self.findings
    }

    pub fn container_size(&self) -> Size {
        self.container
    }

    pub fn natural_size(&self) -> Size {
        self.natural
    }

    pub fn analyzed_at(&self) -> Option<chrono::DateTime<chrono::Utc>> {
        self.analyzed_at
    }

    fn apply(&mut self, event: ScreenEvent) -> ObscuraResult<()> {
        let next = self.state.next(event)?;
        tracing::debug!(from = self.state.name(), to = next.name(), "screen transition");
        self.state = next;
        Ok(())
    }

    /// Replace the current image. Clears the previous result and selection.
    pub fn pick_image(&mut self, upload: ImageUpload) -> ObscuraResult<()> {
        self.apply(ScreenEvent::ImagePicked)?;
        self.natural = upload.natural;
        self.image = Some(upload);
        self.response = None;
        self.findings.clear();
        self.selected = None;
        self.analyzed_at = None;
        Ok(())
    }

    /// Layout callback for the hosting element.
    pub fn set_container_size(&mut self, size: Size) {
        self.container = size;
    }

    /// Image-load callback. A zero component keeps the previously known value,
    /// since some load events omit the intrinsic size.
    pub fn set_natural_size(&mut self, size: Size) {
        let pick = |new: f64, old: f64| if new > 0.0 { new } else { old };
        self.natural = Size::new(
            pick(size.width, self.natural.width),
            pick(size.height, self.natural.height),
        );
    }

    /// Start an upload. At most one upload may be in flight.
    pub fn begin_upload(&mut self) -> ObscuraResult<ImageUpload> {
        if self.busy {
            return Err(ObscuraError::Busy);
        }
        let upload = self.image.clone().ok_or(ObscuraError::NoImage)?;
        self.apply(ScreenEvent::UploadStarted)?;
        self.busy = true;
        Ok(upload)
    }

    /// Record the outcome of the upload started by [`begin_upload`](Self::begin_upload).
    pub fn finish_upload(&mut self, outcome: ObscuraResult<AnalyzeImageResponse>) -> ObscuraResult<()> {
        if !self.busy {
            return Err(ObscuraError::InvalidTransition(
                "upload finished but none was in flight".into(),
            ));
        }
        self.busy = false;
        match outcome {
            Ok(response) => {
                self.apply(ScreenEvent::UploadSucceeded)?;
                self.findings = response.to_findings();
                self.response = Some(response);
                self.selected = None;
                self.analyzed_at = Some(chrono::Utc::now());
                tracing::info!(findings = self.findings.len(), "analysis complete");
            }
            Err(e) => {
                let message = match e {
                    ObscuraError::Analysis(msg) => msg,
                    other => other.to_string(),
                };
                tracing::warn!(error = %message, "analysis failed");
                self.apply(ScreenEvent::UploadFailed { message })?;
            }
        }
        Ok(())
    }

    /// Upload the current image and wait for the result. Failures end up in
    /// `ScreenState::Idle { error }`; only misuse (no image, busy) is returned.
    pub async fn analyze(&mut self, client: &dyn AnalysisClient) -> ObscuraResult<()> {
        let upload = self.begin_upload()?;
        let outcome = client.analyze_image(&upload).await;
        self.finish_upload(outcome)
    }

    /// Overlay rectangles for the current findings, in container coordinates.
    pub fn overlays(&self) -> Vec<Overlay> {
        project_findings(self.container, self.natural, &self.findings, self.padding)
            .into_iter()
            .zip(&self.findings)
            .enumerate()
            .map(|(index, (rect, finding))| Overlay {
                index,
                label: finding.label.clone(),
                rect,
            })
            .collect()
    }

    /// Select the topmost overlay under a tap. Taps are ignored while loading.
    pub fn tap(&mut self, x: f64, y: f64) -> Option<&Finding> {
        if matches!(self.state, ScreenState::Loading) {
            return None;
        }
        let rects: Vec<ProjectedRect> = self.overlays().into_iter().map(|o| o.rect).collect();
        self.selected = finding_at(&rects, x, y);
        self.selected()
    }

    pub fn selected(&self) -> Option<&Finding> {
        self.selected.and_then(|i| self.findings.get(i))
    }

    /// Masked text the service reported for the selected finding, if any.
    pub fn selected_text(&self) -> Option<&str> {
        self.selected().and_then(|f| f.text.as_deref())
    }

    /// Question shown for the selected finding; quotes its masked text when
    /// the service sent one.
    pub fn censor_prompt(&self) -> Option<String> {
        let f = self.selected()?;
        Some(match self.selected_text() {
            Some(text) => format!("Do you want to censor {} \"{}\"?", f.label, text),
            None => format!("Do you want to censor {}?", f.label),
        })
    }

    /// Accept the censor prompt. Returns the finding that was confirmed.
    pub fn confirm_censor(&mut self) -> Option<Finding> {
        let finding = self.selected().cloned();
        if let Some(f) = &finding {
            tracing::info!(kind = %f.label, "censor confirmed");
        }
        self.selected = None;
        finding
    }

    pub fn dismiss_selection(&mut self) {
        self.selected = None;
    }
}
