use std::time::{Duration, SystemTime};

/// How long a toast stays on screen.
const TOAST_SECS: u64 = 3;

#[derive(Clone, Copy, Debug, PartialEq, Eq, strum_macros::Display)]
pub enum NoticeKind {
    Info,
    Success,
    Warning,
    Error,
}

/// Message content for the fire-and-forget toast channel. The core emits
/// kind + text; delivery is the presentation layer's business.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub text: String,
}

impl Notice {
    pub fn info(text: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Info,
            text: text.into(),
        }
    }

    pub fn success(text: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Success,
            text: text.into(),
        }
    }

    pub fn warning(text: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Warning,
            text: text.into(),
        }
    }
}

/// Display state for the single toast line: latest notice wins.
#[derive(Debug, Default)]
pub struct ToastLine {
    current: Option<(Notice, SystemTime)>,
}

impl ToastLine {
    pub fn show(&mut self, notice: Notice) {
        self.current = Some((notice, SystemTime::now()));
    }

    /// Drop the toast once it has been up long enough. Called on tick.
    pub fn expire(&mut self, now: SystemTime) {
        if let Some((_, shown_at)) = &self.current {
            let up = now
                .duration_since(*shown_at)
                .unwrap_or(Duration::ZERO);
            if up >= Duration::from_secs(TOAST_SECS) {
                self.current = None;
            }
        }
    }

    pub fn visible(&self) -> Option<&Notice> {
        self.current.as_ref().map(|(n, _)| n)
    }
}
