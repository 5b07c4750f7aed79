//! Trimming and checking of LRAT unsatisfiability proofs.
//!
//! An LRAT proof is a line oriented certificate of unsatisfiability produced
//! by SAT solvers. Every addition line lists the literals of a derived clause
//! together with the antecedent clauses that make it a reverse unit
//! propagation (RUP) consequence, every deletion line retires clauses that are
//! no longer needed. This crate parses such proofs (and optionally the DIMACS
//! CNF they refer to), trims them down to the clauses actually needed to
//! derive the empty clause and verifies the RUP property of every retained
//! clause, either eagerly while parsing or after trimming. A trimmed proof
//! can be written back out with densely renumbered identifiers and deletion
//! lines placed at the last use of each clause.

use std::io;

use partial_ref::{IntoPartialRefMut, PartialRef};
use thiserror::Error;

pub mod clauses;
pub mod config;
pub mod context;
pub mod dimacs;
pub mod input;
pub mod lrat;
pub mod output;
pub mod rup;
pub mod stats;
pub mod trim;
pub mod write;

pub use crate::config::TrimConfig;
pub use crate::context::Context;
pub use crate::input::Input;
pub use crate::output::Output;
pub use crate::stats::Statistics;

/// Identifier of a clause as assigned by the input order.
///
/// Identifiers are strictly positive; antecedent lists carry a sign encoding
/// the intended polarity of the reference.
pub type ClauseId = i32;

/// A literal in the DIMACS encoding: a nonzero integer whose sign selects the
/// polarity. `i32::MIN` is rejected by the parsers.
pub type Lit = i32;

/// Fatal errors surfaced by the trimming pipeline.
///
/// Every error aborts the run; there is no recovery past the first failure.
#[derive(Debug, Error)]
pub enum TrimError {
    /// Violation of the DIMACS or LRAT syntax or of the clause lifecycle.
    #[error("parse error in '{path}' {} line {line}: {msg}", anchor(.after))]
    Parse {
        path: String,
        line: usize,
        /// The input ended with a newline and the error refers to the line
        /// before it.
        after: bool,
        msg: String,
    },

    /// A clause failed its reverse unit propagation check.
    #[error("{msg} while checking clause '{id}'{}: {}", at_line(.line), clause(.literals))]
    Check {
        id: ClauseId,
        /// Addition line of the failing clause, recorded under `--track`.
        line: Option<usize>,
        msg: String,
        literals: Vec<Lit>,
    },

    #[error("can not read '{path}': {source}")]
    Read { path: String, source: io::Error },

    #[error("can not write '{path}': {source}")]
    Write { path: String, source: io::Error },

    #[error("flushing {bytes} bytes of write buffer to '{path}' failed: {source}")]
    Flush {
        path: String,
        bytes: usize,
        source: io::Error,
    },
}

fn anchor(after: &bool) -> &'static str {
    if *after {
        "after"
    } else {
        "in"
    }
}

fn at_line(line: &Option<usize>) -> String {
    match line {
        Some(line) => format!(" at line '{}'", line),
        None => String::new(),
    }
}

fn clause(literals: &[Lit]) -> String {
    let mut text = String::new();
    for &lit in literals.iter() {
        text.push_str(&lit.to_string());
        text.push(' ');
    }
    text.push('0');
    text
}

/// Trims and checks a single LRAT proof.
///
/// This owns the [`Context`] holding all pipeline state and exposes the
/// pipeline stages in their required order: [`parse_cnf`](Trimmer::parse_cnf)
/// (optional), [`parse_proof`](Trimmer::parse_proof),
/// [`trim`](Trimmer::trim), [`check`](Trimmer::check) and
/// [`write_proof`](Trimmer::write_proof).
#[derive(Default, Debug)]
pub struct Trimmer {
    ctx: Box<Context>,
}

impl Trimmer {
    /// Create a trimmer for the given configuration.
    pub fn new(config: TrimConfig) -> Trimmer {
        let mut trimmer = Trimmer::default();
        trimmer.ctx.config = config;
        trimmer
    }

    /// Parse a CNF in DIMACS format, installing its clauses as the original
    /// clauses `1..=C`.
    pub fn parse_cnf(&mut self, input: &mut Input) -> Result<(), TrimError> {
        let mut ctx = self.ctx.into_partial_ref_mut();
        dimacs::parse_cnf(ctx.borrow(), input)
    }

    /// Parse the LRAT proof, forward checking additions when configured.
    pub fn parse_proof(&mut self, input: &mut Input) -> Result<(), TrimError> {
        let mut ctx = self.ctx.into_partial_ref_mut();
        lrat::parse_proof(ctx.borrow(), input)
    }

    /// Mark the clauses reachable from the empty clause.
    pub fn trim(&mut self) {
        let mut ctx = self.ctx.into_partial_ref_mut();
        trim::trim_proof(ctx.borrow());
    }

    /// Backward check all clauses retained by trimming.
    pub fn check(&mut self) -> Result<(), TrimError> {
        let mut ctx = self.ctx.into_partial_ref_mut();
        rup::check_proof(ctx.borrow())
    }

    /// Write the trimmed, renumbered proof.
    ///
    /// Writes nothing but a log message when no empty clause was derived.
    pub fn write_proof(&mut self, output: &mut Output) -> Result<(), TrimError> {
        let mut ctx = self.ctx.into_partial_ref_mut();
        write::write_proof(ctx.borrow(), output)
    }

    /// Statistics gathered so far.
    pub fn stats(&self) -> &Statistics {
        &self.ctx.stats
    }

    /// Whether the proof added an empty clause.
    pub fn found_empty_clause(&self) -> bool {
        self.ctx.clauses.empty_clause != 0
    }

    /// Whether an empty clause was derived and passed its check.
    pub fn verified(&self) -> bool {
        self.ctx.stats.checked_empty > 0
    }
}
