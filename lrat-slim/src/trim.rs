//! Backward reachability over antecedents.
//!
//! Starting from the empty clause, every antecedent of a needed clause is
//! needed as well. `used` records the last use site of each needed clause,
//! which is where the emitter attaches its trailing deletion.

use partial_ref::{partial, PartialRef};

use crate::clauses::{CidMap, Clauses};
use crate::context::{parts::*, Context};
use crate::stats::{percent, Statistics};
use crate::ClauseId;

/// Record that `id` is used by the later clause `used_where`.
///
/// Keeps the largest use site seen so far. Returns `true` when the clause
/// was already marked used; the `0 -> nonzero` transition is counted by
/// origin and tells the caller to put the clause on the worklist.
fn mark_used(
    used: &mut CidMap<ClauseId>,
    first_clause_in_proof: ClauseId,
    stats: &mut Statistics,
    id: ClauseId,
    used_where: ClauseId,
) -> bool {
    debug_assert!(id > 0);
    debug_assert!(id <= used_where);
    let used_before = used.get(id);
    if used_before >= used_where {
        return true;
    }
    *used.at_mut(id) = used_where;
    if used_before != 0 {
        return true;
    }
    if first_clause_in_proof == 0 || id < first_clause_in_proof {
        stats.trimmed.cnf.added += 1;
    } else {
        stats.trimmed.proof.added += 1;
    }
    false
}

/// Mark the clauses reachable from the empty clause.
pub fn trim_proof(mut ctx: partial!(Context, mut ClausesP, mut StatsP, ConfigP)) {
    if !ctx.part(ConfigP).trimming {
        return;
    }

    let (clauses, mut ctx) = ctx.split_part_mut(ClausesP);
    let stats = ctx.part_mut(StatsP);

    clauses.used.adjust(clauses.empty_clause);

    if clauses.empty_clause != 0 {
        let empty = clauses.empty_clause;
        let first_proof = clauses.first_clause_in_proof;
        let Clauses {
            antecedents, used, ..
        } = clauses;

        let mut work: Vec<ClauseId> = vec![];
        mark_used(used, first_proof, stats, empty, empty);
        if !(first_proof == 0 || empty < first_proof) {
            work.push(empty);
        }

        while let Some(id) = work.pop() {
            debug_assert_ne!(used.get(id), 0);
            let list = antecedents
                .get_ref(id)
                .and_then(|antes| antes.as_deref())
                .expect("used clauses retain their antecedents while trimming");
            for &signed in list.iter() {
                let other = signed.abs();
                let marked = mark_used(used, first_proof, stats, other, id);
                if !marked && !(first_proof == 0 || other < first_proof) {
                    work.push(other);
                }
            }
        }
    }

    log::info!(
        "trimmed {} original clauses in CNF to {} clauses {:.0}%",
        stats.original.cnf.added,
        stats.trimmed.cnf.added,
        percent(
            stats.trimmed.cnf.added as f64,
            stats.original.cnf.added as f64
        )
    );
    log::info!(
        "trimmed {} added clauses in original proof to {} clauses {:.0}%",
        stats.original.proof.added,
        stats.trimmed.proof.added,
        percent(
            stats.trimmed.proof.added as f64,
            stats.original.proof.added as f64
        )
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use partial_ref::IntoPartialRefMut;

    use crate::input::Input;
    use crate::TrimConfig;

    fn trimmed(cnf: Option<&[u8]>, proof: &[u8]) -> Context {
        let mut context = Context::default();
        context.config = TrimConfig {
            checking: false,
            forward: false,
            trimming: true,
            track: false,
        };
        if let Some(cnf) = cnf {
            let mut input = Input::from_stream("<cnf>", std::io::Cursor::new(cnf.to_vec()));
            let mut ctx = context.into_partial_ref_mut();
            crate::dimacs::parse_cnf(ctx.borrow(), &mut input).unwrap();
        }
        let mut input = Input::from_stream("<proof>", std::io::Cursor::new(proof.to_vec()));
        let mut ctx = context.into_partial_ref_mut();
        crate::lrat::parse_proof(ctx.borrow(), &mut input).unwrap();
        let mut ctx = context.into_partial_ref_mut();
        trim_proof(ctx.borrow());
        context
    }

    #[test]
    fn marks_the_reachable_clauses() {
        let cnf: &[u8] = b"p cnf 3 4\n1 2 0\n-1 2 0\n1 -2 0\n-1 -2 0\n";
        let proof: &[u8] = b"5 1 0 1 3 0\n6 3 0 1 3 0\n7 2 0 1 2 0\n8 0 7 5 4 0\n";
        let context = trimmed(Some(cnf), proof);

        let used = &context.clauses.used;
        assert_eq!(used.get(8), 8);
        assert_eq!(used.get(7), 8);
        assert_eq!(used.get(5), 8);
        // The unused lemma stays unmarked.
        assert_eq!(used.get(6), 0);
        assert_ne!(used.get(1), 0);
        assert_ne!(used.get(2), 0);
        assert_ne!(used.get(3), 0);
        assert_ne!(used.get(4), 0);

        assert_eq!(context.stats.trimmed.proof.added, 3);
        assert_eq!(context.stats.trimmed.cnf.added, 4);
    }

    #[test]
    fn used_clauses_record_their_last_use() {
        let cnf: &[u8] = b"p cnf 3 4\n1 2 0\n-1 2 0\n1 -2 0\n-1 -2 0\n";
        let proof: &[u8] = b"5 1 0 1 3 0\n6 3 0 1 3 0\n7 2 0 1 2 0\n8 0 7 5 4 0\n";
        let context = trimmed(Some(cnf), proof);

        // Clause 1 is an antecedent of 5 and of 7; the recorded use site must
        // not precede any retained use.
        assert_eq!(context.clauses.used.get(1), 7);
        assert_eq!(context.clauses.used.get(3), 5);
    }

    #[test]
    fn used_set_is_closed_under_antecedents() {
        let proof: &[u8] = b"5 1 0 1 3 0\n6 2 0 1 2 0\n7 0 6 5 4 0\n";
        let context = trimmed(None, proof);

        let clauses = &context.clauses;
        let empty = clauses.empty_clause;
        for id in clauses.first_clause_in_proof..=empty {
            let site = clauses.used.get(id);
            if site == 0 {
                continue;
            }
            assert!(site > id || id == empty);
            for &ante in clauses.antecedent_slice(id).iter() {
                assert_ne!(clauses.used.get(ante.abs()), 0);
            }
        }
    }

    #[test]
    fn nothing_is_marked_without_an_empty_clause() {
        let context = trimmed(None, b"5 1 0 1 3 0\n");
        assert_eq!(context.clauses.used.get(5), 0);
        assert_eq!(context.stats.trimmed.proof.added, 0);
    }
}
