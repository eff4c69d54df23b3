//! Failures raised while folding or rendering row snapshots.
//!
//! An empty result set is a successful outcome (a zero report, a "no
//! results" table). These variants mean the rows themselves could not be
//! read, so callers must treat them as "no report available".

use std::error::Error as StdError;

pub type BoxError = Box<dyn StdError + Send + Sync + 'static>;

#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("could not read the calorie reference table")]
    LookupBuild(#[source] BoxError),
    #[error("could not read food log rows for the report")]
    Aggregation(#[source] BoxError),
    #[error("could not read food log rows for display")]
    Render(#[source] BoxError),
}

impl ReportError {
    pub(crate) fn lookup_build(err: impl Into<BoxError>) -> Self {
        Self::LookupBuild(err.into())
    }

    pub(crate) fn aggregation(err: impl Into<BoxError>) -> Self {
        Self::Aggregation(err.into())
    }

    pub(crate) fn render(err: impl Into<BoxError>) -> Self {
        Self::Render(err.into())
    }
}
