use rayon::prelude::*;

use super::Compilation;
use crate::hir::{AnalysisFault, Diagnostic};

/// Run independent compilations in parallel.
///
/// Each compilation owns its analyzer, so nothing is shared between jobs.
/// Results come back in input order.
pub fn analyze_batch(jobs: Vec<Compilation>) -> Vec<Result<Vec<Diagnostic>, AnalysisFault>> {
    jobs.into_par_iter().map(|mut job| job.run()).collect()
}
