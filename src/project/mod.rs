//! Drivers that run the analysis passes over whole compilations.
//!
//! A [`Compilation`] owns one [`Analyzer`](crate::hir::Analyzer) and the
//! global code of every unit it compiles. [`analyze_batch`] runs independent
//! compilations on the rayon thread pool.

mod batch;
mod compilation;

pub use batch::analyze_batch;
pub use compilation::{Compilation, CompilationUnit};
