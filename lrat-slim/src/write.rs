//! Emitter for the trimmed, renumbered proof.
//!
//! Two passes over the clause store. The first pass walks the original
//! clauses: unused ones go into an initial mass deletion line, used ones are
//! linked to their last use site. The second pass walks the added clauses in
//! order, assigns dense output identifiers to the used ones, writes their
//! addition lines with remapped antecedents and appends a trailing deletion
//! line listing every clause whose last use they were.

use partial_ref::{partial, PartialRef};

use crate::clauses::Clauses;
use crate::context::{parts::*, Context};
use crate::output::Output;
use crate::{ClauseId, TrimError};

/// Output identifier of an antecedent reference, preserving its sign.
fn map_id(clauses: &Clauses, id: ClauseId) -> ClauseId {
    let other = id.abs();
    let mapped = if other < clauses.first_clause_in_proof {
        other
    } else {
        clauses.map.get(other)
    };
    if id < 0 {
        -mapped
    } else {
        mapped
    }
}

/// Write the trimmed proof.
///
/// Without an empty clause there is nothing to write; the run only reports
/// that the proof stays empty.
pub fn write_proof(
    mut ctx: partial!(Context, mut ClausesP, mut StatsP),
    output: &mut Output,
) -> Result<(), TrimError> {
    if ctx.part(ClausesP).empty_clause == 0 {
        log::info!("writing empty proof without empty clause in input proof");
        return Ok(());
    }

    let (clauses, mut ctx) = ctx.split_part_mut(ClausesP);
    let stats = ctx.part_mut(StatsP);

    let empty = clauses.empty_clause;
    let first_proof = clauses.first_clause_in_proof;
    clauses.links.adjust(empty);
    clauses.heads.adjust(empty);
    clauses.map.adjust(empty);

    // Unused originals are deleted up front; used ones are attached to the
    // clause that uses them last.
    for id in 1..first_proof {
        let site = clauses.used.get(id);
        if site != 0 {
            debug_assert!(id < site);
            *clauses.links.at_mut(id) = clauses.heads.get(site);
            *clauses.heads.at_mut(site) = id;
        } else {
            if stats.trimmed.cnf.deleted == 0 {
                output.write_int(first_proof - 1)?;
                output.write_str(" d")?;
            }
            output.write_space()?;
            output.write_int(id)?;
            stats.trimmed.cnf.deleted += 1;
        }
    }
    if stats.trimmed.cnf.deleted != 0 {
        output.write_str(" 0\n")?;
        log::debug!(
            "deleting {} original CNF clauses initially",
            stats.trimmed.cnf.deleted
        );
    }

    let mut mapped = first_proof;
    let mut id = first_proof;
    loop {
        let site = clauses.used.get(id);
        if site != 0 {
            if id != empty {
                debug_assert!(id < site);
                *clauses.links.at_mut(id) = clauses.heads.get(site);
                *clauses.heads.at_mut(site) = id;
                *clauses.map.at_mut(id) = mapped;
            }

            output.write_int(mapped)?;
            for &lit in clauses.literal_slice(id).iter() {
                output.write_space()?;
                output.write_int(lit)?;
            }
            output.write_str(" 0")?;
            for &ante in clauses.antecedent_slice(id).iter() {
                debug_assert!(ante.abs() < id);
                output.write_space()?;
                output.write_int(map_id(clauses, ante))?;
            }
            output.write_str(" 0\n")?;

            let head = clauses.heads.get(id);
            if head != 0 {
                output.write_int(mapped)?;
                output.write_str(" d")?;
                let mut link = head;
                while link != 0 {
                    if clauses.is_original(link) {
                        stats.trimmed.cnf.deleted += 1;
                    } else {
                        stats.trimmed.proof.deleted += 1;
                    }
                    output.write_space()?;
                    output.write_int(map_id(clauses, link))?;
                    link = clauses.links.get(link);
                }
                output.write_str(" 0\n")?;
            }

            mapped += 1;
        }
        if id == empty {
            break;
        }
        id += 1;
    }

    output.flush()?;
    Ok(())
}
