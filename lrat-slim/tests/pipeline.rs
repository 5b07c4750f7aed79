//! End-to-end runs of the full trimming pipeline through the public API.

use std::io::Cursor;

use lrat_slim::{Input, Output, TrimConfig, TrimError, Trimmer};

fn input(name: &str, bytes: &[u8]) -> Input {
    Input::from_stream(name, Cursor::new(bytes.to_vec()))
}

fn run(
    cnf: Option<&[u8]>,
    proof: &[u8],
    config: TrimConfig,
) -> Result<(Trimmer, Vec<u8>), TrimError> {
    let mut trimmer = Trimmer::new(config);
    if let Some(cnf) = cnf {
        trimmer.parse_cnf(&mut input("<cnf>", cnf))?;
    }
    trimmer.parse_proof(&mut input("<proof>", proof))?;
    trimmer.trim();
    trimmer.check()?;
    let mut output = Output::memory();
    trimmer.write_proof(&mut output)?;
    Ok((trimmer, output.take_memory()))
}

fn check_and_trim() -> TrimConfig {
    TrimConfig::from_options(false, false, false, false, true, true)
}

#[test]
fn trivial_unsat_formula_is_verified_and_trimmed() {
    let cnf: &[u8] = b"p cnf 1 2\n1 0\n-1 0\n";
    let (trimmer, written) = run(Some(cnf), b"3 0 1 2 0\n", check_and_trim()).unwrap();

    assert!(trimmer.found_empty_clause());
    assert!(trimmer.verified());
    assert_eq!(written, b"3 0 1 2 0\n3 d 2 1 0\n");
}

#[test]
fn unused_lemmas_are_dropped_and_identifiers_renumbered() {
    let cnf: &[u8] = b"p cnf 3 4\n1 2 0\n-1 2 0\n1 -2 0\n-1 -2 0\n";
    let proof: &[u8] = b"5 1 0 1 3 0\n6 3 0 1 3 0\n7 2 0 1 2 0\n8 0 7 5 4 0\n";
    let (trimmer, written) = run(Some(cnf), proof, check_and_trim()).unwrap();

    assert!(trimmer.verified());
    let text = String::from_utf8(written).unwrap();
    // The unused lemma 6 is gone and 7/8 are renumbered to 6/7.
    assert!(!text.contains("3 0 1 3"));
    assert!(text.contains("6 2 0 1 2 0\n"));
    assert!(text.contains("7 0 6 5 4 0\n"));
    assert_eq!(trimmer.stats().trimmed.proof.added, 3);
}

#[test]
fn reparsing_the_emitted_proof_verifies_again() {
    let cnf: &[u8] = b"p cnf 3 4\n1 2 0\n-1 2 0\n1 -2 0\n-1 -2 0\n";
    let proof: &[u8] = b"5 1 0 1 3 0\n6 3 0 1 3 0\n7 2 0 1 2 0\n8 0 7 5 4 0\n";
    let (_, written) = run(Some(cnf), proof, check_and_trim()).unwrap();

    let (trimmer, rewritten) = run(Some(cnf), &written, check_and_trim()).unwrap();
    assert!(trimmer.verified());

    // A third run reproduces the bytes exactly.
    let (_, third) = run(Some(cnf), &rewritten, check_and_trim()).unwrap();
    assert_eq!(rewritten, third);
}

#[test]
fn trimming_without_a_cnf_skips_checking() {
    let proof: &[u8] = b"5 1 0 1 3 0\n6 2 0 1 2 0\n7 0 6 5 4 0\n";
    let config = TrimConfig::from_options(false, false, false, false, false, true);
    assert!(!config.checking);
    let (trimmer, written) = run(None, proof, config).unwrap();

    assert!(trimmer.found_empty_clause());
    assert!(!trimmer.verified());
    assert!(!written.is_empty());
}

#[test]
fn forward_checking_fails_at_the_bad_addition() {
    let cnf: &[u8] = b"p cnf 2 2\n1 2 0\n-1 -2 0\n";
    // Clause 3 is not a unit consequence of its antecedent.
    let proof: &[u8] = b"3 0 1 0\n";

    let forward = TrimConfig::from_options(false, true, true, false, true, false);
    assert!(forward.forward);
    let err = run(Some(cnf), proof, forward).unwrap_err();
    assert!(err.to_string().contains("while checking clause '3'"));

    // Without a CNF the same proof is trimmed and emitted unchecked.
    let trim_only = TrimConfig::from_options(false, false, false, false, false, true);
    let (trimmer, written) = run(None, proof, trim_only).unwrap();
    assert!(!trimmer.verified());
    assert!(!written.is_empty());
}

#[test]
fn backward_checking_skips_unused_invalid_lemmas() {
    let cnf: &[u8] = b"p cnf 3 4\n1 2 0\n-1 2 0\n1 -2 0\n-1 -2 0\n";
    // Lemma 6 does not unit propagate but is never used.
    let proof: &[u8] = b"5 1 0 1 3 0\n6 3 0 1 3 0\n7 2 0 1 2 0\n8 0 7 5 4 0\n";

    let (trimmer, _) = run(Some(cnf), proof, check_and_trim()).unwrap();
    assert!(trimmer.verified());

    let forward = TrimConfig::from_options(false, false, true, false, true, true);
    let err = run(Some(cnf), proof, forward).unwrap_err();
    assert!(err.to_string().contains("while checking clause '6'"));
}

#[test]
fn empty_input_warns_and_writes_nothing() {
    let trim_only = TrimConfig::from_options(false, false, false, false, false, true);
    let (trimmer, written) = run(None, b"", trim_only).unwrap();
    assert!(!trimmer.found_empty_clause());
    assert!(!trimmer.verified());
    assert_eq!(written, b"");
}

#[test]
fn track_mode_cites_proof_lines_in_check_errors() {
    let cnf: &[u8] = b"p cnf 2 2\n1 2 0\n-1 -2 0\n";
    let proof: &[u8] = b"3 1 0 1 0\n4 0 1 2 3 0\n";

    let config = TrimConfig::from_options(false, false, true, true, true, false);
    let err = run(Some(cnf), proof, config).unwrap_err();
    let text = err.to_string();
    assert!(text.contains("while checking clause '3'"));
    assert!(text.contains("at line '1'"));
    assert!(text.contains(": 1 0"));
}

#[test]
fn deleting_a_used_clause_is_reported_at_the_use() {
    let proof: &[u8] = b"5 1 0 1 3 0\n5 d 5 0\n6 0 5 4 0\n";
    let trim_only = TrimConfig::from_options(false, false, false, false, false, true);
    let err = run(None, proof, trim_only).unwrap_err();
    assert!(err
        .to_string()
        .contains("antecedent 5 in clause 6 was already deleted"));
}
