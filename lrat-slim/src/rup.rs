//! Reverse unit propagation checks.
//!
//! A clause is accepted if assuming the negation of all its literals and
//! propagating its antecedents in order yields a conflict. Negative (RAT)
//! antecedents are not supported and fail the check.

use partial_ref::{partial, PartialRef};

use crate::clauses::{CidMap, Clauses};
use crate::context::{parts::*, Context};
use crate::stats::Statistics;
use crate::{ClauseId, Lit, TrimError};

/// Truth values per variable plus the trail needed to undo them.
#[derive(Default, Debug)]
pub struct Assignment {
    /// `-1`, `0` or `+1` per variable index.
    values: CidMap<i8>,
    /// Literals assigned during the current check.
    trail: Vec<Lit>,
}

impl Assignment {
    /// Pre-size the value map, typically from the CNF header.
    pub fn adjust(&mut self, var: i32) {
        self.values.adjust(var);
    }

    /// Value of a literal under the current assignment.
    #[inline]
    fn value(&self, lit: Lit) -> i8 {
        let value = self.values.get(lit.abs());
        if lit < 0 {
            -value
        } else {
            value
        }
    }

    /// Make a literal true. The variable must be unassigned.
    #[inline]
    fn assign(&mut self, lit: Lit) {
        debug_assert_ne!(lit, 0);
        debug_assert_eq!(self.value(lit), 0);
        *self.values.at_mut(lit.abs()) = if lit < 0 { -1 } else { 1 };
        self.trail.push(lit);
    }

    /// Undo every assignment on the trail.
    fn backtrack(&mut self) {
        let Assignment { values, trail } = self;
        for lit in trail.drain(..) {
            *values.at_mut(lit.abs()) = 0;
        }
    }
}

fn check_failed(
    clauses: &Clauses,
    track: bool,
    id: ClauseId,
    literals: &[Lit],
    msg: String,
) -> TrimError {
    let line = if track {
        Some(clauses.added.get(id).line)
    } else {
        None
    };
    TrimError::Check {
        id,
        line,
        msg,
        literals: literals.to_vec(),
    }
}

/// Check one clause against its antecedents.
///
/// The literal and antecedent slices are passed in explicitly so that the
/// forward-checking parser can hand over its scratch buffers before deciding
/// what to retain.
pub fn check_clause(
    mut ctx: partial!(Context, mut AssignmentP, mut StatsP, ClausesP, ConfigP),
    id: ClauseId,
    literals: &[Lit],
    antecedents: &[ClauseId],
) -> Result<(), TrimError> {
    let track = ctx.part(ConfigP).track;
    let (assignment, mut ctx) = ctx.split_part_mut(AssignmentP);
    let (stats, mut ctx) = ctx.split_part_mut(StatsP);
    let (clauses, _) = ctx.split_part(ClausesP);
    check_clause_slices(assignment, stats, clauses, track, id, literals, antecedents)
}

pub(crate) fn check_clause_slices(
    assignment: &mut Assignment,
    stats: &mut Statistics,
    clauses: &Clauses,
    track: bool,
    id: ClauseId,
    literals: &[Lit],
    antecedents: &[ClauseId],
) -> Result<(), TrimError> {
    debug_assert!(assignment.trail.is_empty());
    stats.resolved += 1;
    stats.checked += 1;
    if literals.is_empty() {
        stats.checked_empty += 1;
    }

    let mut confirmed = false;

    for &lit in literals.iter() {
        let value = assignment.value(lit);
        if value < 0 {
            log::trace!("skipping duplicated literal '{}' in clause '{}'", lit, id);
            continue;
        }
        if value > 0 {
            // The clause contains both a literal and its negation.
            log::trace!("skipping tautological literal '{}' in clause '{}'", lit, id);
            confirmed = true;
            break;
        }
        assignment.assign(-lit);
        stats.assigned += 1;
    }

    if !confirmed {
        for &aid in antecedents.iter() {
            if aid < 0 {
                assignment.backtrack();
                return Err(check_failed(
                    clauses,
                    track,
                    id,
                    literals,
                    format!("checking negative RAT antecedent '{}' not supported", aid),
                ));
            }
            stats.resolved += 1;
            let mut unit: Lit = 0;
            for &lit in clauses.literal_slice(aid).iter() {
                let value = assignment.value(lit);
                if value < 0 {
                    continue;
                }
                if unit != 0 {
                    assignment.backtrack();
                    return Err(check_failed(
                        clauses,
                        track,
                        id,
                        literals,
                        format!("antecedent '{}' does not produce unit", aid),
                    ));
                }
                unit = lit;
                if value == 0 {
                    assignment.assign(lit);
                    stats.assigned += 1;
                }
            }
            if unit == 0 {
                // All literals false: the antecedent is conflicting.
                confirmed = true;
                break;
            }
        }
    }

    assignment.backtrack();
    if confirmed {
        Ok(())
    } else {
        Err(check_failed(
            clauses,
            track,
            id,
            literals,
            "propagating antecedents does not yield conflict".to_string(),
        ))
    }
}

/// Backward check of all clauses retained by trimming.
///
/// Runs only when checking is enabled, forward mode is off and an empty
/// clause exists; visits exactly the clauses the trimmer marked as used.
pub fn check_proof(
    mut ctx: partial!(Context, mut AssignmentP, mut StatsP, ClausesP, ConfigP),
) -> Result<(), TrimError> {
    let config = *ctx.part(ConfigP);
    if !config.checking || config.forward {
        return Ok(());
    }
    let (assignment, mut ctx) = ctx.split_part_mut(AssignmentP);
    let (stats, mut ctx) = ctx.split_part_mut(StatsP);
    let (clauses, _) = ctx.split_part(ClausesP);

    if clauses.empty_clause == 0 {
        return Ok(());
    }

    let mut id = clauses.first_clause_in_proof;
    loop {
        if clauses.used.get(id) != 0 {
            check_clause_slices(
                assignment,
                stats,
                clauses,
                config.track,
                id,
                clauses.literal_slice(id),
                clauses.antecedent_slice(id),
            )?;
        }
        if id == clauses.empty_clause {
            break;
        }
        id += 1;
    }
    Ok(())
}
