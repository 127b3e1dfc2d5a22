//! Transient user-facing messages.
//!
//! Every outcome the user should hear about (validation rejections, remote
//! successes and failures, a dropped subscription) is reported as a
//! [`Notice`] to a [`NoticeSink`]. None of them are fatal.

use std::fmt;

use crate::validation::ValidationError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    /// Input rejected before any remote call.
    Invalid(ValidationError),
    ItemAdded,
    AddFailed,
    ItemUpdated,
    /// `partial` is set when the old key was already deleted but the new
    /// record was not written.
    UpdateFailed { partial: bool },
    ItemDeleted,
    DeleteFailed,
    /// The subscription was cancelled; the list keeps its last contents.
    LoadFailed,
}

impl Notice {
    /// True for notices that report something going wrong.
    pub fn is_error(&self) -> bool {
        matches!(
            self,
            Notice::Invalid(_)
                | Notice::AddFailed
                | Notice::UpdateFailed { .. }
                | Notice::DeleteFailed
                | Notice::LoadFailed
        )
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notice::Invalid(e) => write!(f, "{}", e),
            Notice::ItemAdded => write!(f, "Item added"),
            Notice::AddFailed => write!(f, "Failed to add item"),
            Notice::ItemUpdated => write!(f, "Item updated"),
            Notice::UpdateFailed { partial: false } => write!(f, "Failed to update item"),
            Notice::UpdateFailed { partial: true } => {
                write!(f, "Failed to update item (old entry already removed)")
            }
            Notice::ItemDeleted => write!(f, "Item deleted"),
            Notice::DeleteFailed => write!(f, "Failed to delete item"),
            Notice::LoadFailed => write!(f, "Error loading data"),
        }
    }
}

impl From<ValidationError> for Notice {
    fn from(e: ValidationError) -> Self {
        Notice::Invalid(e)
    }
}

/// Receives transient notices.
pub trait NoticeSink {
    fn notify(&mut self, notice: Notice);
}

/// Collects notices in order; used by one-shot commands and tests.
impl NoticeSink for Vec<Notice> {
    fn notify(&mut self, notice: Notice) {
        self.push(notice);
    }
}

/// Hands notices to whichever task owns the display.
impl NoticeSink for tokio::sync::mpsc::UnboundedSender<Notice> {
    fn notify(&mut self, notice: Notice) {
        if self.send(notice).is_err() {
            tracing::debug!("Notice receiver dropped");
        }
    }
}

/// Log level for a notice: failures warn, everything else is info.
pub(crate) fn log_level(notice: &Notice) -> tracing::Level {
    if notice.is_error() {
        tracing::Level::WARN
    } else {
        tracing::Level::INFO
    }
}

/// Logs the notice and forwards it.
pub(crate) fn emit(sink: &mut impl NoticeSink, notice: Notice) {
    if log_level(&notice) == tracing::Level::WARN {
        tracing::warn!(%notice, "Notice");
    } else {
        tracing::info!(%notice, "Notice");
    }
    sink.notify(notice);
}
