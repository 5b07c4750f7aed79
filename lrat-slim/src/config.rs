//! Pipeline configuration.

/// Which pipeline stages run and how much bookkeeping they keep.
#[derive(Copy, Clone, Default, Debug)]
pub struct TrimConfig {
    /// Verify additions by reverse unit propagation. Requires a CNF.
    pub checking: bool,
    /// Check every addition as it is parsed instead of after trimming.
    pub forward: bool,
    /// Compute the used-clause closure after parsing.
    pub trimming: bool,
    /// Record addition and deletion lines for more precise errors.
    pub track: bool,
}

impl TrimConfig {
    /// Derive the configuration from the command line flags and the presence
    /// of input and output files.
    ///
    /// Checking needs the original formula, so it is only enabled when a CNF
    /// was given. Backward checking walks the used-clause closure, which only
    /// exists when trimming ran, so `--no-trim` with checking enabled forces
    /// forward mode. Trimming itself is skipped in forward mode unless an
    /// output asks for the trimmed proof.
    pub fn from_options(
        no_check: bool,
        no_trim: bool,
        forward: bool,
        track: bool,
        have_cnf: bool,
        have_output: bool,
    ) -> TrimConfig {
        let checking = !no_check && have_cnf;
        let forward = forward || (no_trim && checking);
        let trimming = !no_trim && (!forward || have_output);
        TrimConfig {
            checking,
            forward,
            trimming,
            track,
        }
    }
}
