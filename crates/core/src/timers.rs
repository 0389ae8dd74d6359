//! Time-driven viewer state. The host passes the current time in
//! milliseconds; nothing here reads a clock.

use campus_tour_protocol::ViewerCommand;

use crate::config::ViewerConfig;

/// Continuous panorama rotation, paused while the user drags and resumed
/// shortly after they let go.
#[derive(Debug, Clone, PartialEq)]
pub struct AutoRotate {
    enabled: bool,
    deg_per_sec: f64,
    resume_delay_ms: f64,
    interacting: bool,
    resume_at: Option<f64>,
}

impl AutoRotate {
    pub fn new(config: &ViewerConfig) -> Self {
        Self {
            enabled: true,
            deg_per_sec: config.autorotate_deg_per_sec,
            resume_delay_ms: config.autorotate_resume_ms,
            interacting: false,
            resume_at: None,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Whether a resume is scheduled.
    pub fn is_pending(&self) -> bool {
        self.resume_at.is_some()
    }

    /// Command matching the current enabled flag.
    pub fn command(&self) -> ViewerCommand {
        if self.enabled {
            ViewerCommand::StartAutoRotate {
                deg_per_sec: self.deg_per_sec,
            }
        } else {
            ViewerCommand::StopAutoRotate
        }
    }

    pub fn toggle(&mut self) -> ViewerCommand {
        self.enabled = !self.enabled;
        self.resume_at = None;
        self.command()
    }

    pub fn disable(&mut self) -> ViewerCommand {
        self.enabled = false;
        self.interacting = false;
        self.resume_at = None;
        ViewerCommand::StopAutoRotate
    }

    /// Forget a scheduled resume without changing the enabled flag.
    pub fn cancel_resume(&mut self) {
        self.interacting = false;
        self.resume_at = None;
    }

    pub fn interaction_start(&mut self) {
        self.interacting = true;
        self.resume_at = None;
    }

    /// Ends a drag. Ignored unless a drag was in progress.
    pub fn interaction_end(&mut self, now_ms: f64) {
        if !self.interacting {
            return;
        }
        self.interacting = false;
        self.resume_at = self.enabled.then_some(now_ms + self.resume_delay_ms);
    }

    pub fn tick(&mut self, now_ms: f64) -> Option<ViewerCommand> {
        let due = self.resume_at.is_some_and(|at| now_ms >= at);
        if !due {
            return None;
        }
        self.resume_at = None;
        self.enabled.then(|| self.command())
    }
}

/// Loading visual of the panorama canvas with a fallback deadline.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadingIndicator {
    fallback_ms: f64,
    loading: bool,
    deadline: Option<f64>,
}

impl LoadingIndicator {
    pub fn new(config: &ViewerConfig) -> Self {
        Self {
            fallback_ms: config.loading_fallback_ms,
            loading: false,
            deadline: None,
        }
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    pub fn start(&mut self, now_ms: f64) -> ViewerCommand {
        self.loading = true;
        self.deadline = Some(now_ms + self.fallback_ms);
        ViewerCommand::LoadingChanged { loading: true }
    }

    /// The panorama engine reported the image as loaded.
    pub fn loaded(&mut self) -> Option<ViewerCommand> {
        self.deadline = None;
        self.clear()
    }

    pub fn tick(&mut self, now_ms: f64) -> Option<ViewerCommand> {
        if !self.deadline.is_some_and(|at| now_ms >= at) {
            return None;
        }
        self.deadline = None;
        self.clear()
    }

    /// Drop the deadline and the visual, as when the viewer closes.
    pub fn cancel(&mut self) -> Option<ViewerCommand> {
        self.deadline = None;
        self.clear()
    }

    fn clear(&mut self) -> Option<ViewerCommand> {
        if !self.loading {
            return None;
        }
        self.loading = false;
        Some(ViewerCommand::LoadingChanged { loading: false })
    }
}
