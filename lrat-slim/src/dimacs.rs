//! DIMACS CNF parser filling the clause store.
//!
//! The formula clauses become the original clauses `1..=C` of the clause
//! store. Duplicated and tautological literals are kept verbatim; the
//! checker handles them.

use partial_ref::{partial, PartialRef};

use crate::clauses::ClauseStatus;
use crate::context::{parts::*, Context};
use crate::input::{is_digit, read_number, Input, Scanned};
use crate::{Lit, TrimError};

/// Parse a CNF in DIMACS format into the clause store.
pub fn parse_cnf(
    mut ctx: partial!(Context, mut AssignmentP, mut ClausesP, mut StatsP),
    input: &mut Input,
) -> Result<(), TrimError> {
    log::info!("reading CNF from '{}'", input.path());

    let mut ch = input.read_first_char()?;
    while ch != Some(b'p') {
        if ch != Some(b'c') {
            return Err(input.parse_error("expected 'c' or 'p' as first character"));
        }
        loop {
            match input.read_char()? {
                Some(b'\n') => break,
                Some(_) => (),
                None => {
                    return Err(
                        input.parse_error("unexpected end-of-file in comment before header")
                    )
                }
            }
        }
        ch = input.read_char()?;
    }

    if input.read_char()? != Some(b' ') {
        return Err(input.parse_error("expected space after 'p'"));
    }
    if input.read_char()? != Some(b'c')
        || input.read_char()? != Some(b'n')
        || input.read_char()? != Some(b'f')
    {
        return Err(input.parse_error("expected 'p cnf'"));
    }
    if input.read_char()? != Some(b' ') {
        return Err(input.parse_error("expected space after 'p cnf'"));
    }

    let ch = match input.read_char()? {
        Some(ch) if is_digit(ch) => ch,
        _ => return Err(input.parse_error("expected digit after 'p cnf '")),
    };
    let (header_variables, next) = match read_number(input, ch, true)? {
        Scanned::Number { value, next } => (value, next),
        Scanned::Overflow { digits } => {
            return Err(input.parse_error(format!(
                "number of variables '{}' exceeds 'INT_MAX'",
                digits
            )))
        }
        Scanned::LeadingZero { .. } => unreachable!("leading zeros allowed in the header"),
    };
    if next != Some(b' ') {
        return Err(input.parse_error(format!("expected space after 'p cnf {}'", header_variables)));
    }

    let ch = match input.read_char()? {
        Some(ch) if is_digit(ch) => ch,
        _ => {
            return Err(input.parse_error(format!(
                "expected digit after 'p cnf {} '",
                header_variables
            )))
        }
    };
    let (header_clauses, next) = match read_number(input, ch, true)? {
        Scanned::Number { value, next } => (value, next),
        Scanned::Overflow { digits } => {
            return Err(input.parse_error(format!(
                "number of clauses '{}' exceeds 'INT_MAX'",
                digits
            )))
        }
        Scanned::LeadingZero { .. } => unreachable!("leading zeros allowed in the header"),
    };
    if next != Some(b'\n') {
        return Err(input.parse_error(format!(
            "expected new-line after 'p cnf {} {}'",
            header_variables, header_clauses
        )));
    }

    log::info!(
        "found 'p cnf {} {}' header",
        header_variables,
        header_clauses
    );

    ctx.part_mut(AssignmentP).adjust(header_variables);
    {
        let clauses = ctx.part_mut(ClausesP);
        clauses.literals.adjust(header_clauses);
        clauses.status.adjust(header_clauses);
    }

    let mut scratch: Vec<Lit> = vec![];
    let mut lit: Lit = 0;
    let mut parsed_clauses: i32 = 0;

    loop {
        let ch = match input.read_char()? {
            None => {
                if lit != 0 {
                    return Err(input.parse_error("'0' missing after clause before end-of-file"));
                }
                if parsed_clauses < header_clauses {
                    if parsed_clauses + 1 == header_clauses {
                        return Err(input.parse_error("clause missing"));
                    }
                    return Err(input.parse_error(format!(
                        "{} clauses missing",
                        header_clauses - parsed_clauses
                    )));
                }
                break;
            }
            Some(b' ') | Some(b'\t') | Some(b'\n') => continue,
            Some(b'c') => {
                skip_body_comment(input)?;
                continue;
            }
            Some(ch) => ch,
        };

        let (sign, first) = if ch == b'-' {
            let ch = match input.read_char()? {
                Some(ch) if is_digit(ch) => ch,
                _ => return Err(input.parse_error("expected digit after '-'")),
            };
            if ch == b'0' {
                return Err(input.parse_error("expected non-zero digit after '-'"));
            }
            (-1, ch)
        } else if is_digit(ch) {
            (1, ch)
        } else {
            return Err(input.parse_error("unexpected character instead of literal"));
        };

        let (idx, next) = match read_number(input, first, false)? {
            Scanned::Number { value, next } => (value, next),
            Scanned::LeadingZero { digit } => {
                return Err(
                    input.parse_error(format!("unexpected digit '{}' after '0'", digit as char))
                )
            }
            Scanned::Overflow { digits } => {
                return Err(input.parse_error(format!("variable '{}' exceeds 'INT_MAX'", digits)))
            }
        };
        lit = sign * idx;
        if idx > header_variables {
            return Err(input.parse_error(format!(
                "literal '{}' exceeds maximum variable '{}'",
                lit, header_variables
            )));
        }
        match next {
            Some(b'c') | Some(b' ') | Some(b'\t') | Some(b'\n') | None => (),
            _ => return Err(input.parse_error(format!("expected white space after '{}'", lit))),
        }
        if parsed_clauses >= header_clauses {
            return Err(input.parse_error("too many clauses"));
        }
        if lit == 0 {
            parsed_clauses += 1;
            let clauses = ctx.part_mut(ClausesP);
            *clauses.literals.at_mut(parsed_clauses) = Some(Box::from(&scratch[..]));
            *clauses.status.at_mut(parsed_clauses) = ClauseStatus::Present;
            scratch.clear();
            ctx.part_mut(StatsP).original.cnf.added += 1;
        } else {
            scratch.push(lit);
        }
        if next == Some(b'c') {
            skip_body_comment(input)?;
        }
    }

    debug_assert_eq!(parsed_clauses, header_clauses);
    ctx.part_mut(ClausesP).last_clause_in_cnf = parsed_clauses;

    log::debug!(
        "read {} CNF lines with {} bytes",
        input.lines,
        input.bytes
    );
    log::info!(
        "parsed CNF with {} added clauses",
        ctx.part(StatsP).original.cnf.added
    );
    Ok(())
}

fn skip_body_comment(input: &mut Input) -> Result<(), TrimError> {
    loop {
        match input.read_char()? {
            Some(b'\n') => return Ok(()),
            Some(_) => (),
            None => {
                return Err(input.parse_error("unexpected end-of-file in comment after header"))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use partial_ref::IntoPartialRefMut;
    use proptest::prelude::*;

    fn parse(bytes: &[u8]) -> Result<Context, TrimError> {
        let mut context = Context::default();
        let mut input = Input::from_stream("<test>", std::io::Cursor::new(bytes.to_vec()));
        let mut ctx = context.into_partial_ref_mut();
        parse_cnf(ctx.borrow(), &mut input)?;
        Ok(context)
    }

    macro_rules! expect_error {
        ($input:expr, $needle:expr) => {
            match parse($input) {
                Ok(_) => panic!("expected an error containing {:?}", $needle),
                Err(err) => {
                    let text = err.to_string();
                    assert!(
                        text.contains($needle),
                        "error {:?} does not contain {:?}",
                        text,
                        $needle
                    );
                }
            }
        };
    }

    #[test]
    fn parses_a_small_formula() {
        let context = parse(b"c comment\np cnf 3 2\n1 -2 3 0\n-1 0\n").unwrap();
        assert_eq!(context.clauses.last_clause_in_cnf, 2);
        assert_eq!(context.clauses.literal_slice(1), &[1, -2, 3]);
        assert_eq!(context.clauses.literal_slice(2), &[-1]);
        assert_eq!(context.clauses.status.get(1), ClauseStatus::Present);
        assert_eq!(context.stats.original.cnf.added, 2);
    }

    #[test]
    fn accepts_odd_whitespace_and_inline_comments() {
        let context = parse(b"p cnf 4 3\n1\t2  3\n0 -4 0c inline\n2 0\n").unwrap();
        assert_eq!(context.clauses.literal_slice(1), &[1, 2, 3]);
        assert_eq!(context.clauses.literal_slice(2), &[-4]);
        assert_eq!(context.clauses.literal_slice(3), &[2]);
    }

    #[test]
    fn invalid_headers() {
        expect_error!(b"q cnf 1 1\n1 0\n", "expected 'c' or 'p'");
        expect_error!(b"pcnf 1 1\n1 0\n", "expected space after 'p'");
        expect_error!(b"p dnf 1 1\n1 0\n", "expected 'p cnf'");
        expect_error!(b"p cnf x 1\n1 0\n", "expected digit after 'p cnf '");
        expect_error!(b"p cnf 1\n1 0\n", "expected space after 'p cnf 1'");
        expect_error!(b"p cnf 1 1 \n1 0\n", "expected new-line after 'p cnf 1 1'");
        expect_error!(b"p cnf 99999999999 1\n", "exceeds 'INT_MAX'");
    }

    #[test]
    fn clause_count_must_match_the_header() {
        expect_error!(b"p cnf 1 2\n1 0\n", "clause missing");
        expect_error!(b"p cnf 1 3\n1 0\n", "2 clauses missing");
        expect_error!(b"p cnf 1 1\n1 0\n-1 0\n", "too many clauses");
        expect_error!(b"p cnf 1 1\n1\n", "'0' missing after clause");
    }

    #[test]
    fn literals_must_fit_the_header() {
        expect_error!(b"p cnf 2 1\n3 0\n", "exceeds maximum variable '2'");
        expect_error!(b"p cnf 2 1\n99999999999 0\n", "exceeds 'INT_MAX'");
    }

    #[test]
    fn malformed_literals() {
        expect_error!(b"p cnf 2 1\n- 1 0\n", "expected digit after '-'");
        expect_error!(b"p cnf 2 1\n-0 1 0\n", "expected non-zero digit after '-'");
        expect_error!(b"p cnf 2 1\nx 0\n", "unexpected character instead of literal");
        expect_error!(b"p cnf 2 1\n1? 0\n", "expected white space after '1'");
        expect_error!(b"p cnf 2 1\nc unterminated", "end-of-file in comment");
    }

    #[test]
    fn empty_cnf_clause_is_stored_but_not_the_empty_clause() {
        let context = parse(b"p cnf 1 1\n0\n").unwrap();
        assert_eq!(context.clauses.literal_slice(1), &[] as &[Lit]);
        assert_eq!(context.clauses.empty_clause, 0);
    }

    fn clause_strategy() -> impl Strategy<Value = Vec<Lit>> {
        prop::collection::vec(
            (1i32..=50, any::<bool>()).prop_map(|(var, sign)| if sign { var } else { -var }),
            0..10,
        )
    }

    proptest! {
        #[test]
        fn parses_generated_formulas(clauses in prop::collection::vec(clause_strategy(), 0..40)) {
            let mut text = format!("p cnf 50 {}\n", clauses.len());
            for clause in clauses.iter() {
                for lit in clause.iter() {
                    text.push_str(&lit.to_string());
                    text.push(' ');
                }
                text.push_str("0\n");
            }

            let context = parse(text.as_bytes()).unwrap();
            prop_assert_eq!(context.clauses.last_clause_in_cnf as usize, clauses.len());
            for (index, clause) in clauses.iter().enumerate() {
                prop_assert_eq!(context.clauses.literal_slice(index as i32 + 1), &clause[..]);
            }
        }
    }
}
