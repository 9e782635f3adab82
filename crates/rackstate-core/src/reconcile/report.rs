// ── Pass report ──

use std::fmt;

use tracing::{error, info};

use crate::model::EntityKind;

/// One decision taken during a pass. Every variant except `Skipped`
/// corresponds to exactly one mutating remote call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Created {
        kind: EntityKind,
        name: String,
    },
    Updated {
        kind: EntityKind,
        name: String,
        fields: Vec<&'static str>,
    },
    Deleted {
        kind: EntityKind,
        name: String,
    },
    Skipped {
        kind: EntityKind,
        name: String,
        reason: String,
    },
}

impl Action {
    pub fn kind(&self) -> EntityKind {
        match self {
            Self::Created { kind, .. }
            | Self::Updated { kind, .. }
            | Self::Deleted { kind, .. }
            | Self::Skipped { kind, .. } => *kind,
        }
    }

    pub fn is_write(&self) -> bool {
        !matches!(self, Self::Skipped { .. })
    }
}

/// Everything a reconciliation pass did, in order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    pub actions: Vec<Action>,
}

impl ReconcileReport {
    pub(crate) fn created(&mut self, kind: EntityKind, name: impl Into<String>) {
        let name = name.into();
        info!(%kind, %name, "created");
        self.actions.push(Action::Created { kind, name });
    }

    pub(crate) fn updated(
        &mut self,
        kind: EntityKind,
        name: impl Into<String>,
        fields: Vec<&'static str>,
    ) {
        let name = name.into();
        info!(%kind, %name, ?fields, "updated");
        self.actions.push(Action::Updated { kind, name, fields });
    }

    pub(crate) fn deleted(&mut self, kind: EntityKind, name: impl Into<String>) {
        let name = name.into();
        info!(%kind, %name, "deleted");
        self.actions.push(Action::Deleted { kind, name });
    }

    pub(crate) fn skipped(
        &mut self,
        kind: EntityKind,
        name: impl Into<String>,
        reason: impl Into<String>,
    ) {
        let (name, reason) = (name.into(), reason.into());
        error!(%kind, %name, %reason, "skipped");
        self.actions.push(Action::Skipped { kind, name, reason });
    }

    /// Number of mutating remote calls issued.
    pub fn write_count(&self) -> usize {
        self.actions.iter().filter(|a| a.is_write()).count()
    }

    pub fn created_count(&self) -> usize {
        self.count(|a| matches!(a, Action::Created { .. }))
    }

    pub fn updated_count(&self) -> usize {
        self.count(|a| matches!(a, Action::Updated { .. }))
    }

    pub fn deleted_count(&self) -> usize {
        self.count(|a| matches!(a, Action::Deleted { .. }))
    }

    pub fn skipped_count(&self) -> usize {
        self.count(|a| matches!(a, Action::Skipped { .. }))
    }

    /// Actions touching records of `kind`.
    pub fn of_kind(&self, kind: EntityKind) -> impl Iterator<Item = &Action> {
        self.actions.iter().filter(move |a| a.kind() == kind)
    }

    fn count(&self, pred: impl Fn(&Action) -> bool) -> usize {
        self.actions.iter().filter(|a| pred(a)).count()
    }
}

impl fmt::Display for ReconcileReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} created, {} updated, {} deleted, {} skipped",
            self.created_count(),
            self.updated_count(),
            self.deleted_count(),
            self.skipped_count()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn skipped_actions_are_not_writes() {
        let mut report = ReconcileReport::default();
        report.created(EntityKind::Site, "paris");
        report.updated(EntityKind::Device, "web-01", vec!["name"]);
        report.skipped(EntityKind::DeviceBay, "Slot 5", "bay not found");

        assert_eq!(report.write_count(), 2);
        assert_eq!(report.of_kind(EntityKind::DeviceBay).count(), 1);
        assert_eq!(
            report.to_string(),
            "1 created, 1 updated, 0 deleted, 1 skipped"
        );
    }
}
