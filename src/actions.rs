//! Add, update and delete.
//!
//! Each action validates locally, issues keyed calls against the remote
//! store and reports the result as a notice. None of them touch the local
//! list: it catches up when the listener receives the next snapshot.

use crate::models::Item;
use crate::notice::{emit, Notice, NoticeSink};
use crate::remote::{RemoteError, RemoteStore};
use crate::validation::{validate, ValidationError};

/// Why an action did not complete.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionError {
    Invalid(ValidationError),
    Remote(RemoteError),
}

impl std::fmt::Display for ActionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ActionError::Invalid(e) => write!(f, "{}", e),
            ActionError::Remote(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for ActionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ActionError::Invalid(e) => Some(e),
            ActionError::Remote(e) => Some(e),
        }
    }
}

impl From<ValidationError> for ActionError {
    fn from(e: ValidationError) -> Self {
        ActionError::Invalid(e)
    }
}

impl From<RemoteError> for ActionError {
    fn from(e: RemoteError) -> Self {
        ActionError::Remote(e)
    }
}

/// One remote call of an update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateStep {
    /// Remove the record under the original key.
    DeleteOld { key: String },
    /// Store the updated record.
    Write { key: String, item: Item },
}

/// Result of running an update plan.
///
/// Steps are separate remote calls with no rollback. If `DeleteOld`
/// succeeded and `Write` failed, the item is gone from the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateOutcome {
    Applied {
        steps: Vec<UpdateStep>,
    },
    Failed {
        completed: Vec<UpdateStep>,
        failed: UpdateStep,
        error: RemoteError,
    },
}

impl UpdateOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, UpdateOutcome::Applied { .. })
    }

    /// True when the old record was removed but the new one never landed.
    pub fn is_partial(&self) -> bool {
        match self {
            UpdateOutcome::Applied { .. } => false,
            UpdateOutcome::Failed { completed, .. } => completed
                .iter()
                .any(|step| matches!(step, UpdateStep::DeleteOld { .. })),
        }
    }
}

/// Remote calls needed to turn `original` into `updated`.
///
/// A changed id deletes the old key first, then writes the new one. An
/// unchanged id is a single overwrite.
pub fn plan_update(original: &Item, updated: Item) -> Vec<UpdateStep> {
    let mut steps = Vec::with_capacity(2);
    if updated.id != original.id {
        steps.push(UpdateStep::DeleteOld {
            key: original.id.clone(),
        });
    }
    steps.push(UpdateStep::Write {
        key: updated.id.clone(),
        item: updated,
    });
    steps
}

/// Runs item actions against a remote store, reporting to a notice sink.
pub struct ItemActions<'a, R, S> {
    remote: &'a R,
    sink: &'a mut S,
}

impl<'a, R: RemoteStore, S: NoticeSink> ItemActions<'a, R, S> {
    pub fn new(remote: &'a R, sink: &'a mut S) -> Self {
        Self { remote, sink }
    }

    /// Writes a new item under its id, replacing any record already there.
    pub async fn add(&mut self, id: &str, name: &str) -> Result<Item, ActionError> {
        let item = match validate(id, name) {
            Ok(item) => item,
            Err(e) => {
                self.report(Notice::from(e.clone()));
                return Err(e.into());
            }
        };

        match self.remote.write(&item.id, &item).await {
            Ok(()) => {
                tracing::info!(id = %item.id, "Item written");
                self.report(Notice::ItemAdded);
                Ok(item)
            }
            Err(e) => {
                tracing::warn!(id = %item.id, error = %e, "Write failed");
                self.report(Notice::AddFailed);
                Err(e.into())
            }
        }
    }

    /// Replaces `original` with the new id and name.
    ///
    /// Returns `Err` only for invalid input; remote failures are described
    /// by the returned [`UpdateOutcome`].
    pub async fn update(
        &mut self,
        original: &Item,
        new_id: &str,
        new_name: &str,
    ) -> Result<UpdateOutcome, ValidationError> {
        let updated = match validate(new_id, new_name) {
            Ok(item) => item,
            Err(e) => {
                self.report(Notice::from(e.clone()));
                return Err(e);
            }
        };

        let outcome = self.run_steps(plan_update(original, updated)).await;
        match &outcome {
            UpdateOutcome::Applied { .. } => self.report(Notice::ItemUpdated),
            UpdateOutcome::Failed { .. } => self.report(Notice::UpdateFailed {
                partial: outcome.is_partial(),
            }),
        }
        Ok(outcome)
    }

    /// Removes the item's key from the store.
    pub async fn delete(&mut self, item: &Item) -> Result<(), RemoteError> {
        match self.remote.delete(&item.id).await {
            Ok(()) => {
                tracing::info!(id = %item.id, "Item deleted");
                self.report(Notice::ItemDeleted);
                Ok(())
            }
            Err(e) => {
                tracing::warn!(id = %item.id, error = %e, "Delete failed");
                self.report(Notice::DeleteFailed);
                Err(e)
            }
        }
    }

    fn report(&mut self, notice: Notice) {
        emit(&mut *self.sink, notice);
    }

    /// Runs steps in order, stopping at the first failure.
    async fn run_steps(&self, steps: Vec<UpdateStep>) -> UpdateOutcome {
        let mut completed = Vec::with_capacity(steps.len());
        for step in steps {
            let result = match &step {
                UpdateStep::DeleteOld { key } => self.remote.delete(key).await,
                UpdateStep::Write { key, item } => self.remote.write(key, item).await,
            };
            match result {
                Ok(()) => completed.push(step),
                Err(error) => {
                    tracing::warn!(?step, error = %error, "Update step failed");
                    return UpdateOutcome::Failed {
                        completed,
                        failed: step,
                        error,
                    };
                }
            }
        }
        UpdateOutcome::Applied { steps: completed }
    }
}
