//! Loading policy modules from shared artifacts.
//!
//! A policy artifact is a `cdylib` exporting one well-known symbol,
//! [`POLICY_ENTRY_SYMBOL`], whose type is [`PolicyEntryFn`]: a function
//! returning the boxed [`PolicyModule`]. Everything past that one symbol
//! goes through the trait object, so host and policy agree only on this
//! entry point.
//!
//! A policy crate's entry point looks like:
//!
//! ```ignore
//! #[no_mangle]
//! pub fn tatami_policy_entry() -> Box<dyn PolicyModule> {
//!     Box::new(MyPolicy::new())
//! }
//! ```
//!
//! Load failures - a missing artifact, an unreadable library, a missing
//! entry symbol - are ordinary errors. They must never take the host
//! down; the caller keeps its previous policy and logs the failure.

use std::path::Path;

use libloading::Library;
use tracing::{debug, info};

use super::{HostHandle, PolicyError, PolicyHandle, PolicyModule};

/// The well-known entry symbol every policy artifact exports.
pub const POLICY_ENTRY_SYMBOL: &[u8] = b"tatami_policy_entry";

/// The type of the entry symbol.
pub type PolicyEntryFn = fn() -> Box<dyn PolicyModule>;

/// Opens a policy artifact, resolves its entry symbol, and initialises
/// the module it constructs.
///
/// On any failure the artifact is closed and an error returned; the
/// caller's active policy is not touched.
pub(crate) fn load(path: &Path, host: &HostHandle) -> Result<PolicyHandle, PolicyError> {
    if !path.is_file() {
        return Err(PolicyError::ArtifactNotFound(path.to_owned()));
    }

    debug!(path = %path.display(), "opening policy artifact");

    // Safety: loading a library runs its initialisers. Policy artifacts
    // are operator-installed code on the same trust level as the host
    // binary itself.
    let artifact = unsafe { Library::new(path) }
        .map_err(|e| PolicyError::ArtifactUnreadable(e.to_string()))?;

    let entry: PolicyEntryFn = {
        // Safety: the symbol type is fixed by the artifact contract; an
        // artifact exporting it with another type is undefined behaviour
        // the same way any ABI mismatch is.
        let symbol = unsafe { artifact.get::<PolicyEntryFn>(POLICY_ENTRY_SYMBOL) }.map_err(
            |_| {
                PolicyError::EntrySymbolMissing(
                    String::from_utf8_lossy(POLICY_ENTRY_SYMBOL).into_owned(),
                )
            },
        )?;
        *symbol
    };

    let module = entry();
    info!(path = %path.display(), "policy entry resolved, initialising");

    PolicyHandle::initialise(module, Some(artifact), Some(path.to_owned()), host)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::HostHandle;

    use std::io::Write;

    #[test]
    fn missing_artifact_is_not_found() {
        let (host, _rx) = HostHandle::new();

        let err = load(Path::new("/no/such/policy.so"), &host).unwrap_err();
        assert!(matches!(err, PolicyError::ArtifactNotFound(_)));
    }

    #[test]
    fn non_library_file_is_unreadable() {
        let (host, _rx) = HostHandle::new();

        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "this is not a shared object").unwrap();

        let err = load(file.path(), &host).unwrap_err();
        assert!(matches!(err, PolicyError::ArtifactUnreadable(_)));
    }
}
