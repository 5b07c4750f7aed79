//! File-slot resolution and format detection.
//!
//! One to four file names map to the slots `{cnf-input, proof-input,
//! proof-output, cnf-output}`. With exactly two names the first byte of the
//! first file decides whether it is a CNF (second name is the proof) or a
//! proof (second name is the proof output, refusing to overwrite anything
//! that looks like a CNF unless forced).

use std::fs::File;
use std::io::Read;

use anyhow::{bail, Error};
use log::warn;

use lrat_slim::Input;

/// The opened inputs and pending output paths of one run.
pub struct FileSlots {
    pub cnf_input: Option<Input>,
    pub proof_input: Input,
    pub proof_output: Option<String>,
    pub cnf_output: Option<String>,
}

impl std::fmt::Debug for FileSlots {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileSlots")
            .field("cnf_input", &self.cnf_input.is_some())
            .field("proof_output", &self.proof_output)
            .field("cnf_output", &self.cnf_output)
            .finish()
    }
}

fn numeral(index: usize) -> &'static str {
    match index {
        0 => "1st",
        1 => "2nd",
        2 => "3rd",
        _ => "4th",
    }
}

fn has_suffix(path: &str, suffix: &str) -> bool {
    // Compare raw bytes so the cut cannot land inside a multi-byte character.
    let path = path.as_bytes();
    let suffix = suffix.as_bytes();
    path.len() >= suffix.len() && path[path.len() - suffix.len()..].eq_ignore_ascii_case(suffix)
}

/// Whether a path names a CNF, judged by its suffix or failing that by its
/// first byte.
pub fn looks_like_a_dimacs_file(path: &str) -> bool {
    if path == "-" {
        return false;
    }
    for base in &[".cnf", ".dimacs"] {
        for compression in &["", ".gz", ".bz2", ".xz"] {
            if has_suffix(path, &format!("{}{}", base, compression)) {
                return true;
            }
        }
    }
    let mut byte = [0u8; 1];
    match File::open(path) {
        Ok(mut file) => match file.read(&mut byte) {
            Ok(1) => byte[0] == b'c' || byte[0] == b'p',
            _ => false,
        },
        Err(_) => false,
    }
}

/// Validate the file list and open the input slots.
pub fn open_files(paths: &[&str], force: bool, no_trim: bool) -> Result<FileSlots, Error> {
    if paths.is_empty() {
        bail!("no input file given (try '-h')");
    }
    if paths.len() > 4 {
        bail!(
            "too many files '{}', '{}', '{}' and '{}' (try '-h')",
            paths[0],
            paths[1],
            paths[2],
            paths[3]
        );
    }

    for i in 0..paths.len() {
        if paths[i] == "-" || paths[i] == "/dev/null" {
            continue;
        }
        for j in i + 1..paths.len() {
            if paths[i] == paths[j] {
                bail!(
                    "identical {} and {} file '{}'",
                    numeral(i),
                    numeral(j),
                    paths[i]
                );
            }
        }
    }

    if paths.len() > 2 && no_trim {
        bail!("can not write to '{}' with '--no-trim'", paths[2]);
    }
    if paths.len() > 2 && paths[0] == "-" && paths[1] == "-" {
        bail!("can not use '<stdin>' for both first two input files");
    }
    if paths.len() == 4 && paths[2] == "-" && paths[3] == "-" {
        bail!("can not use '<stdout>' for both last two output files");
    }

    let slots = match paths.len() {
        1 => FileSlots {
            cnf_input: None,
            proof_input: Input::open(paths[0])?,
            proof_output: None,
            cnf_output: None,
        },
        2 => {
            let mut first = Input::open(paths[0])?;
            let byte = first.peek_first()?;
            if byte == Some(b'c') || byte == Some(b'p') {
                if force {
                    warn!(
                        "using '--force' with CNF as first file '{}' does not make sense",
                        paths[0]
                    );
                }
                FileSlots {
                    cnf_input: Some(first),
                    proof_input: Input::open(paths[1])?,
                    proof_output: None,
                    cnf_output: None,
                }
            } else {
                if no_trim {
                    bail!("can not write to '{}' with '--no-trim'", paths[1]);
                }
                if looks_like_a_dimacs_file(paths[1]) {
                    if force {
                        warn!(
                            "forced to overwrite second file '{}' with trimmed proof \
                             even though it looks like a CNF in DIMACS format",
                            paths[1]
                        );
                    } else {
                        bail!(
                            "will not overwrite second file '{}' with trimmed proof \
                             as it looks like a CNF in DIMACS format \
                             (use '--force' to overwrite nevertheless)",
                            paths[1]
                        );
                    }
                } else if force {
                    warn!(
                        "using '--force' while second file '{}' does not look like a CNF \
                         does not make sense",
                        paths[1]
                    );
                }
                FileSlots {
                    cnf_input: None,
                    proof_input: first,
                    proof_output: Some(paths[1].to_string()),
                    cnf_output: None,
                }
            }
        }
        _ => FileSlots {
            cnf_input: Some(Input::open(paths[0])?),
            proof_input: Input::open(paths[1])?,
            proof_output: Some(paths[2].to_string()),
            cnf_output: paths.get(3).map(|path| path.to_string()),
        },
    };

    if force && paths.len() != 2 {
        warn!("using '--force' without two files does not make sense");
    }

    Ok(slots)
}
