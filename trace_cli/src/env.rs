use std::path::PathBuf;

use tracing::{debug, warn};

/// Loads `.env` from the working directory or one of its parents, if there is
/// one, and returns where it was found.
///
/// A missing or unreadable file is not an error. A file that does not parse is
/// reported and skipped, so the `EVM_TRACE_*` variables then have to come from
/// the real environment or the command line.
pub fn load_dotenvy_vars_if_present() -> Option<PathBuf> {
    match dotenvy::dotenv() {
        Ok(path) => {
            debug!(path = %path.display(), "loaded environment file");
            Some(path)
        }
        Err(dotenvy::Error::Io(_)) => None,
        Err(e) => {
            warn!("found a `.env` file but couldn't parse it: {e}");
            None
        }
    }
}
