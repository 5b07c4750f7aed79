//! Central data structure of the trimming pipeline.
use partial_ref::{part, PartialRefTarget};

use crate::clauses::Clauses;
use crate::config::TrimConfig;
use crate::rup::Assignment;
use crate::stats::Statistics;

/// Part declarations for the [`Context`] struct.
pub mod parts {
    use super::*;

    part!(pub AssignmentP: Assignment);
    part!(pub ClausesP: Clauses);
    part!(pub ConfigP: TrimConfig);
    part!(pub StatsP: Statistics);
}

use parts::*;

/// Central data structure of the trimming pipeline.
///
/// This struct contains all state kept across the pipeline stages. Functions
/// operating on multiple fields take partial references provided by the
/// `partial_ref` crate, which documents their data dependencies and keeps the
/// borrow checker happy without passing individual references around.
#[derive(PartialRefTarget, Default, Debug)]
pub struct Context {
    #[part(AssignmentP)]
    pub assignment: Assignment,
    #[part(ClausesP)]
    pub clauses: Clauses,
    #[part(ConfigP)]
    pub config: TrimConfig,
    #[part(StatsP)]
    pub stats: Statistics,
}
