//! User-facing notification seam.

/// Severity of a notice.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum NoticeKind {
    Success,
    Error,
    Info,
}

/// A user-facing notification (rendered by the shell as a toast or banner).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub title: String,
    pub message: String,
}

impl Notice {
    pub fn success(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Success,
            title: title.into(),
            message: message.into(),
        }
    }

    pub fn error(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Error,
            title: title.into(),
            message: message.into(),
        }
    }

    pub fn info(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Info,
            title: title.into(),
            message: message.into(),
        }
    }
}

/// Sink for user-facing notices.
pub trait Notifier: Send + Sync {
    fn notify(&self, notice: Notice);
}

/// Default sink: writes notices to the log. Useful headless and in demos.
#[derive(Debug, Clone, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, notice: Notice) {
        match notice.kind {
            NoticeKind::Success | NoticeKind::Info => {
                tracing::info!(title = %notice.title, "{}", notice.message);
            }
            NoticeKind::Error => {
                tracing::warn!(title = %notice.title, "{}", notice.message);
            }
        }
    }
}
