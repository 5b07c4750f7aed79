//! LRAT proof parser.
//!
//! Consumes addition and deletion lines in non-decreasing identifier order,
//! installs literals and antecedents in the clause store and enforces the
//! clause lifecycle: a clause must be present to be deleted or used as an
//! antecedent. In forward mode every addition is checked right after it is
//! parsed and its antecedents are dropped again; without a later
//! output-producing stage the literals of deleted clauses are dropped as
//! well.

use partial_ref::{partial, PartialRef};

use crate::clauses::{Addition, ClauseStatus, Deletion};
use crate::context::{parts::*, Context};
use crate::input::{is_digit, read_number, Input, Scanned};
use crate::rup::check_clause;
use crate::{ClauseId, Lit, TrimError};

/// Parse the LRAT proof, forward checking additions when configured.
pub fn parse_proof(
    mut ctx: partial!(Context, mut AssignmentP, mut ClausesP, mut StatsP, ConfigP),
    input: &mut Input,
) -> Result<(), TrimError> {
    log::info!("reading proof from '{}'", input.path());

    let mut literals: Vec<Lit> = vec![];
    let mut antecedents: Vec<ClauseId> = vec![];
    let mut last_id: ClauseId = 0;
    let mut first_line = true;

    let mut ch = input.read_first_char()?;
    while let Some(first) = ch {
        if !is_digit(first) {
            if first_line && (first == b'c' || first == b'p') {
                return Err(input.parse_error(format!(
                    "unexpected '{}' as first character: \
                     did you use a CNF instead of a proof file?",
                    first as char
                )));
            }
            return Err(input.parse_error("expected digit as first character of line"));
        }
        first_line = false;
        let line = input.lines + 1;

        let (id, next) = match read_number(input, first, false)? {
            Scanned::Number { value, next } => (value, next),
            Scanned::LeadingZero { digit } => {
                return Err(
                    input.parse_error(format!("unexpected digit '{}' after '0'", digit as char))
                )
            }
            Scanned::Overflow { digits } => {
                return Err(input.parse_error(format!(
                    "line identifier '{}' exceeds 'INT_MAX'",
                    digits
                )))
            }
        };
        if next != Some(b' ') {
            return Err(input.parse_error(format!("expected space after identifier '{}'", id)));
        }
        if id < last_id {
            return Err(input.parse_error(format!(
                "identifier '{}' smaller than last '{}'",
                id, last_id
            )));
        }
        ctx.part_mut(ClausesP).status.adjust(id);

        match input.read_char()? {
            Some(b'd') => parse_deletion(ctx.borrow(), input, id)?,
            other => parse_addition(
                ctx.borrow(),
                input,
                id,
                last_id,
                line,
                other,
                &mut literals,
                &mut antecedents,
            )?,
        }

        last_id = id;
        ch = input.read_char()?;
    }

    if ctx.part(ClausesP).empty_clause == 0 {
        log::warn!("no empty clause added in input proof");
    }

    log::debug!("read {} proof lines with {} bytes", input.lines, input.bytes);
    let stats = ctx.part(StatsP);
    log::info!(
        "parsed original proof with {} added and {} deleted clauses",
        stats.original.proof.added,
        stats.original.proof.deleted
    );
    Ok(())
}

fn parse_deletion(
    mut ctx: partial!(Context, mut ClausesP, mut StatsP, ConfigP),
    input: &mut Input,
    id: ClauseId,
) -> Result<(), TrimError> {
    let config = *ctx.part(ConfigP);
    if input.read_char()? != Some(b' ') {
        return Err(input.parse_error(format!("expected space after '{} d' in deletion {}", id, id)));
    }

    let mut last: ClauseId = 0;
    loop {
        let first = match input.read_char()? {
            Some(ch) if is_digit(ch) => ch,
            _ => {
                if last != 0 {
                    return Err(input.parse_error(format!(
                        "expected digit after '{}' in deletion {}",
                        last, id
                    )));
                }
                return Err(input.parse_error(format!(
                    "expected digit after '{} d ' in deletion {}",
                    id, id
                )));
            }
        };
        let (other, next) = match read_number(input, first, false)? {
            Scanned::Number { value, next } => (value, next),
            Scanned::LeadingZero { digit } => {
                return Err(input.parse_error(format!(
                    "unexpected digit '{}' after '0' in deletion {}",
                    digit as char, id
                )))
            }
            Scanned::Overflow { digits } => {
                return Err(input.parse_error(format!(
                    "deleted clause identifier '{}' exceeds 'INT_MAX' in deletion {}",
                    digits, id
                )))
            }
        };

        if other != 0 {
            if next != Some(b' ') {
                return Err(input.parse_error(format!(
                    "expected space after '{}' in deletion {}",
                    other, id
                )));
            }
            if id != 0 && other > id {
                return Err(input.parse_error(format!(
                    "deleted clause '{}' larger than deletion identifier '{}'",
                    other, id
                )));
            }

            let is_original;
            {
                let clauses = ctx.part_mut(ClausesP);
                if clauses.first_clause_in_proof == 0 {
                    // Before the first addition this may name an implicit
                    // original clause that was never seen.
                    clauses.status.adjust(other);
                }
                let status = clauses.status.get(other);
                if status == ClauseStatus::Absent && clauses.first_clause_in_proof != 0 {
                    return Err(input.parse_error(format!(
                        "deleted clause '{}' in deletion {} \
                         is neither an original clause nor has been added",
                        other, id
                    )));
                }
                if status == ClauseStatus::Deleted {
                    if config.track {
                        let earlier = clauses.deleted.get(other);
                        return Err(input.parse_error(format!(
                            "clause {} requested to be deleted in deletion {} \
                             was already deleted in deletion {} at line {}",
                            other, id, earlier.id, earlier.line
                        )));
                    }
                    return Err(input.parse_error(format!(
                        "clause {} requested to be deleted in deletion {} \
                         was already deleted before \
                         (run with '--track' for more information)",
                        other, id
                    )));
                }
                *clauses.status.at_mut(other) = ClauseStatus::Deleted;
                if config.track {
                    *clauses.deleted.at_mut(other) = Deletion {
                        line: input.lines + 1,
                        id,
                    };
                }
                if !config.trimming {
                    // No later stage looks at this clause again.
                    *clauses.literals.at_mut(other) = None;
                }
                is_original = clauses.is_original(other);
            }
            let stats = ctx.part_mut(StatsP);
            if is_original {
                stats.original.cnf.deleted += 1;
            } else {
                stats.original.proof.deleted += 1;
            }
        } else if next != Some(b'\n') {
            return Err(input.parse_error(format!(
                "expected new-line after '0' at end of deletion {}",
                id
            )));
        }

        last = other;
        if last == 0 {
            return Ok(());
        }
    }
}

fn parse_addition(
    mut ctx: partial!(Context, mut AssignmentP, mut ClausesP, mut StatsP, ConfigP),
    input: &mut Input,
    id: ClauseId,
    last_id: ClauseId,
    line: usize,
    first_ch: Option<u8>,
    literals: &mut Vec<Lit>,
    antecedents: &mut Vec<ClauseId>,
) -> Result<(), TrimError> {
    let config = *ctx.part(ConfigP);
    if id == last_id {
        return Err(input.parse_error(format!(
            "line identifier '{}' of addition line does not increase",
            id
        )));
    }

    {
        let clauses = ctx.part_mut(ClausesP);
        if clauses.first_clause_in_proof == 0 {
            if clauses.last_clause_in_cnf != 0 {
                if clauses.last_clause_in_cnf == id {
                    return Err(input.parse_error(format!(
                        "first added clause {} in proof \
                         has same identifier as last original clause",
                        id
                    )));
                }
                if clauses.last_clause_in_cnf > id {
                    return Err(input.parse_error(format!(
                        "first added clause {} in proof \
                         has smaller identifier as last original clause {}",
                        id, clauses.last_clause_in_cnf
                    )));
                }
            }
            log::debug!("adding first clause {} in proof", id);
            clauses.first_clause_in_proof = id;
            if clauses.last_clause_in_cnf == 0 {
                // Identifiers below the first addition are the implicit
                // original clauses.
                for other in 1..id {
                    if clauses.status.get(other) == ClauseStatus::Absent {
                        *clauses.status.at_mut(other) = ClauseStatus::Present;
                    }
                }
                ctx.part_mut(StatsP).original.cnf.added = (id - 1) as usize;
            }
        }
    }

    // Literals up to the first zero. The first character of the first token
    // was already consumed by the caller.
    literals.clear();
    let mut pending = first_ch;
    let mut first = true;
    let mut last: i32 = id;
    while last != 0 {
        let ch = if first {
            first = false;
            pending.take()
        } else {
            input.read_char()?
        };
        let (sign, digit) = match ch {
            Some(b'-') => {
                let ch = match input.read_char()? {
                    Some(ch) if is_digit(ch) => ch,
                    _ => {
                        return Err(input.parse_error(format!(
                            "expected digit after '{} -' in clause {}",
                            last, id
                        )))
                    }
                };
                if ch == b'0' {
                    return Err(
                        input.parse_error(format!("expected non-zero digit after '{} -'", last))
                    );
                }
                (-1, ch)
            }
            Some(ch) if is_digit(ch) => (1, ch),
            _ => {
                return Err(input.parse_error(format!(
                    "expected literal or '0' after '{}' in clause {}",
                    last, id
                )))
            }
        };
        let (idx, next) = match read_number(input, digit, false)? {
            Scanned::Number { value, next } => (value, next),
            Scanned::LeadingZero { digit } => {
                return Err(input.parse_error(format!(
                    "unexpected second '{}' after '{} 0' in clause {}",
                    digit as char, last, id
                )))
            }
            Scanned::Overflow { digits } => {
                if sign < 0 {
                    return Err(input.parse_error(format!(
                        "variable index in literal '-{}' exceeds 'INT_MAX' in clause {}",
                        digits, id
                    )));
                }
                return Err(input.parse_error(format!(
                    "variable index '{}' exceeds 'INT_MAX' in clause {}",
                    digits, id
                )));
            }
        };
        let lit = sign * idx;
        if next != Some(b' ') {
            if idx != 0 {
                return Err(input.parse_error(format!(
                    "expected space after literal '{}' in clause {}",
                    lit, id
                )));
            }
            return Err(input.parse_error(format!(
                "expected space after literals and '0' in clause {}",
                id
            )));
        }
        if lit != 0 {
            literals.push(lit);
        }
        last = lit;
    }

    {
        let clauses = ctx.part_mut(ClausesP);
        if literals.is_empty() && clauses.empty_clause == 0 {
            log::debug!("found empty clause {}", id);
            clauses.empty_clause = id;
        }
        *clauses.literals.at_mut(id) = Some(Box::from(&literals[..]));
    }

    // Antecedents up to the terminating zero.
    antecedents.clear();
    let mut last: ClauseId = 0;
    loop {
        let (sign, digit) = match input.read_char()? {
            Some(b'-') => {
                let ch = match input.read_char()? {
                    Some(ch) if is_digit(ch) => ch,
                    _ => {
                        return Err(input.parse_error(format!(
                            "expected digit after '{} -' in clause {}",
                            last, id
                        )))
                    }
                };
                if ch == b'0' {
                    return Err(
                        input.parse_error(format!("expected non-zero digit after '{} -'", last))
                    );
                }
                (-1, ch)
            }
            Some(ch) if is_digit(ch) => (1, ch),
            _ => {
                return Err(input.parse_error(format!(
                    "expected clause identifier after '{}' in clause {}",
                    last, id
                )))
            }
        };
        let (other, next) = match read_number(input, digit, false)? {
            Scanned::Number { value, next } => (value, next),
            Scanned::LeadingZero { digit } => {
                return Err(input.parse_error(format!(
                    "unexpected second '{}' after '{} 0' in clause {}",
                    digit as char, last, id
                )))
            }
            Scanned::Overflow { digits } => {
                if sign < 0 {
                    return Err(input.parse_error(format!(
                        "antecedent '-{}' exceeds 'INT_MAX' in clause {}",
                        digits, id
                    )));
                }
                return Err(input.parse_error(format!(
                    "antecedent '{}' exceeds 'INT_MAX' in clause {}",
                    digits, id
                )));
            }
        };
        let signed_other = sign * other;

        if other != 0 {
            if next != Some(b' ') {
                return Err(input.parse_error(format!(
                    "expected space after antecedent '{}' in clause {}",
                    signed_other, id
                )));
            }
            if other >= id {
                return Err(input.parse_error(format!(
                    "antecedent '{}' in clause {} exceeds clause",
                    signed_other, id
                )));
            }
            let clauses = ctx.part(ClausesP);
            match clauses.status.get(other) {
                ClauseStatus::Present => (),
                ClauseStatus::Absent => {
                    return Err(input.parse_error(format!(
                        "antecedent '{}' in clause {} \
                         is neither an original clause nor has been added",
                        signed_other, id
                    )))
                }
                ClauseStatus::Deleted => {
                    if config.track {
                        let earlier = clauses.deleted.get(other);
                        return Err(input.parse_error(format!(
                            "antecedent {} in clause {} \
                             was already deleted in deletion {} at line {}",
                            signed_other, id, earlier.id, earlier.line
                        )));
                    }
                    return Err(input.parse_error(format!(
                        "antecedent {} in clause {} was already deleted before \
                         (run with '--track' for more information)",
                        other, id
                    )));
                }
            }
            antecedents.push(signed_other);
        } else if next != Some(b'\n') {
            return Err(input.parse_error(format!(
                "expected new-line after '0' at end of clause {}",
                id
            )));
        }

        last = signed_other;
        if last == 0 {
            break;
        }
    }

    if config.track {
        *ctx.part_mut(ClausesP).added.at_mut(id) = Addition { line };
    }
    ctx.part_mut(StatsP).original.proof.added += 1;

    if config.checking && config.forward {
        check_clause(ctx.borrow(), id, literals, antecedents)?;
        log::trace!("forward checked clause {}", id);
    }
    if config.trimming {
        let clauses = ctx.part_mut(ClausesP);
        *clauses.antecedents.at_mut(id) = Some(Box::from(&antecedents[..]));
    }
    *ctx.part_mut(ClausesP).status.at_mut(id) = ClauseStatus::Present;
    Ok(())
}
