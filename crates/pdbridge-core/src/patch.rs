//! Patch name resolution and the loaded-patch table

use std::path::{Path, PathBuf};

use crate::engine::{PatchHandle, PatchId};
use crate::error::{PdError, PdResult};

/// File extension of Pd patches
pub const PATCH_EXTENSION: &str = "pd";

/// Resolve a patch name to a file on disk
///
/// Absolute paths are used as-is. Relative names are tried against each
/// directory in `patch_dirs` in order, first verbatim and then with a `.pd`
/// extension appended when the name has none.
pub fn resolve_patch(name: &str, patch_dirs: &[PathBuf]) -> PdResult<PathBuf> {
    let requested = Path::new(name);

    if requested.is_absolute() {
        return if requested.is_file() {
            Ok(requested.to_path_buf())
        } else {
            Err(PdError::PatchNotFound(requested.to_path_buf()))
        };
    }

    let with_extension = if requested.extension().is_none() {
        Some(requested.with_extension(PATCH_EXTENSION))
    } else {
        None
    };

    for dir in patch_dirs {
        let candidate = dir.join(requested);
        if candidate.is_file() {
            return Ok(candidate);
        }
        if let Some(ref alt) = with_extension {
            let candidate = dir.join(alt);
            if candidate.is_file() {
                return Ok(candidate);
            }
        }
    }

    Err(PdError::PatchNotFound(requested.to_path_buf()))
}

/// A patch currently open in the engine
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedPatch {
    /// Name the patch was requested by
    pub name: String,
    /// Resolved file path
    pub path: PathBuf,
    pub handle: PatchHandle,
}

impl LoadedPatch {
    pub fn dollar_zero(&self) -> i32 {
        self.handle.dollar_zero
    }
}

/// Ordered table of loaded patches plus the primary marker
#[derive(Debug, Default)]
pub struct PatchTable {
    entries: Vec<LoadedPatch>,
    primary: Option<PatchId>,
}

impl PatchTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a patch; `primary` makes it the primary patch
    pub fn push(&mut self, patch: LoadedPatch, primary: bool) {
        if primary {
            self.primary = Some(patch.handle.id);
        }
        self.entries.push(patch);
    }

    /// Remove a patch by id, clearing the primary marker if it pointed there
    pub fn remove(&mut self, id: PatchId) -> Option<LoadedPatch> {
        let index = self.entries.iter().position(|p| p.handle.id == id)?;
        if self.primary == Some(id) {
            self.primary = None;
        }
        Some(self.entries.remove(index))
    }

    /// Remove every patch in load order
    pub fn take_all(&mut self) -> Vec<LoadedPatch> {
        self.primary = None;
        std::mem::take(&mut self.entries)
    }

    pub fn primary(&self) -> Option<&LoadedPatch> {
        let id = self.primary?;
        self.entries.iter().find(|p| p.handle.id == id)
    }

    /// Patch at `index` in load order
    pub fn get(&self, index: usize) -> Option<&LoadedPatch> {
        self.entries.get(index)
    }

    pub fn as_slice(&self) -> &[LoadedPatch] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loaded(id: u64, dollar_zero: i32) -> LoadedPatch {
        LoadedPatch {
            name: format!("patch{}.pd", id),
            path: PathBuf::from(format!("/tmp/patch{}.pd", id)),
            handle: PatchHandle {
                id: PatchId(id),
                dollar_zero,
            },
        }
    }

    #[test]
    fn test_resolve_searches_dirs_in_order() {
        let first = tempfile::tempdir().unwrap();
        let second = tempfile::tempdir().unwrap();
        std::fs::write(second.path().join("synth.pd"), "#N canvas 0 0 450 300 12;\n").unwrap();

        let dirs = vec![first.path().to_path_buf(), second.path().to_path_buf()];
        let path = resolve_patch("synth.pd", &dirs).unwrap();
        assert_eq!(path, second.path().join("synth.pd"));

        // Extension is optional
        let path = resolve_patch("synth", &dirs).unwrap();
        assert_eq!(path, second.path().join("synth.pd"));
    }

    #[test]
    fn test_resolve_missing_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = resolve_patch("missing.pd", &[dir.path().to_path_buf()]).unwrap_err();
        assert!(err.is_not_found());

        let err = resolve_patch("/definitely/not/here.pd", &[]).unwrap_err();
        assert!(matches!(err, PdError::PatchNotFound(p) if p.ends_with("here.pd")));
    }

    #[test]
    fn test_resolve_absolute_path() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("abs.pd");
        std::fs::write(&file, "#N canvas 0 0 450 300 12;\n").unwrap();

        assert_eq!(resolve_patch(file.to_str().unwrap(), &[]).unwrap(), file);
    }

    #[test]
    fn test_primary_tracks_push_and_remove() {
        let mut table = PatchTable::new();
        table.push(loaded(1, 1001), true);
        table.push(loaded(2, 1002), false);

        assert_eq!(table.primary().map(|p| p.dollar_zero()), Some(1001));
        assert_eq!(table.get(1).map(|p| p.dollar_zero()), Some(1002));

        let removed = table.remove(PatchId(1)).unwrap();
        assert_eq!(removed.dollar_zero(), 1001);
        assert!(table.primary().is_none());
        assert_eq!(table.len(), 1);
        assert_eq!(table.get(0).map(|p| p.dollar_zero()), Some(1002));
    }

    #[test]
    fn test_take_all_empties_table() {
        let mut table = PatchTable::new();
        table.push(loaded(1, 1001), true);
        table.push(loaded(2, 1002), true);

        let all = table.take_all();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].handle.id, PatchId(1));
        assert!(table.is_empty());
        assert!(table.primary().is_none());
    }

    #[test]
    fn test_remove_unknown_id() {
        let mut table = PatchTable::new();
        table.push(loaded(1, 1001), true);
        assert!(table.remove(PatchId(9)).is_none());
        assert!(table.primary().is_some());
    }
}
