//! Progress events out of a reconciliation run.
//!
//! The reconciler never prints. Front ends implement [`Reporter`] to show
//! phases and per-module progress; library callers that do not care pass
//! [`NullReporter`].

use modsync_schema::{ModuleName, Plan};

use crate::reconciler::Phase;

/// Receives progress events from a reconciliation run.
pub trait Reporter: Send + Sync {
    /// The pipeline moved to a new phase.
    fn phase(&self, phase: Phase);

    /// The delta and installation order are known.
    fn planned(&self, plan: &Plan);

    /// A module install is about to be attempted (`current` is 1-based).
    fn installing(&self, module: &ModuleName, current: usize, total: usize);

    /// A module ended installed.
    fn done(&self, module: &ModuleName, detail: &str);

    /// A module failed or was skipped.
    fn failed(&self, module: &ModuleName, reason: &str);

    /// Log a warning message.
    fn warning(&self, msg: &str);
}

impl<T: Reporter + ?Sized> Reporter for std::sync::Arc<T> {
    fn phase(&self, phase: Phase) {
        (**self).phase(phase);
    }
    fn planned(&self, plan: &Plan) {
        (**self).planned(plan);
    }
    fn installing(&self, module: &ModuleName, current: usize, total: usize) {
        (**self).installing(module, current, total);
    }
    fn done(&self, module: &ModuleName, detail: &str) {
        (**self).done(module, detail);
    }
    fn failed(&self, module: &ModuleName, reason: &str) {
        (**self).failed(module, reason);
    }
    fn warning(&self, msg: &str) {
        (**self).warning(msg);
    }
}

/// A no-op reporter for silent operations (e.g., library use, testing).
#[derive(Debug, Clone, Copy, Default)]
pub struct NullReporter;

impl Reporter for NullReporter {
    fn phase(&self, _: Phase) {}
    fn planned(&self, _: &Plan) {}
    fn installing(&self, _: &ModuleName, _: usize, _: usize) {}
    fn done(&self, _: &ModuleName, _: &str) {}
    fn failed(&self, _: &ModuleName, _: &str) {}
    fn warning(&self, _: &str) {}
}
