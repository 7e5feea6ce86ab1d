//! Verbosity-gated diagnostic printing to stderr, used in place of a logging crate.

/// Print a diagnostic line to stderr, unless `quiet` suppresses it.
pub fn note(quiet: bool, message: &str) {
    if !quiet {
        eprintln!("{message}");
    }
}

/// Print a diagnostic line to stderr, only when `verbose` is set and `quiet` isn't.
pub fn verbose(verbose: bool, quiet: bool, message: &str) {
    if verbose && !quiet {
        eprintln!("{message}");
    }
}
