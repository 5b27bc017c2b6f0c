use crate::input::Input;
use rand_core::RngCore;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can arise while loading a seed corpus.
///
/// All of these are fatal to campaign startup: without a usable corpus there
/// is nothing to mutate. Unreadable individual files are *not* errors; they
/// are skipped with a warning so a single bad entry cannot block a campaign.
#[derive(Error, Debug)]
pub enum CorpusError {
    /// The corpus directory yielded zero readable seed files.
    #[error("corpus directory {0:?} contains no readable seed files")]
    Empty(PathBuf),

    /// A seed file was zero bytes long. The mutator picks byte positions in
    /// `[0, len-1]`, so empty seeds are rejected at load time.
    #[error("seed file {0:?} is empty, zero-length seeds cannot be mutated")]
    EmptySeed(PathBuf),

    /// The corpus directory itself could not be listed.
    #[error("corpus I/O error: {0}")]
    Io(String),
}

/// An immutable, content-deduplicated set of seed inputs loaded from disk.
///
/// The store is read-only after [`CorpusStore::load`]; `sample` takes `&self`
/// and touches no shared mutable state, so workers share one store behind an
/// `Arc` without synchronization.
#[derive(Debug)]
pub struct CorpusStore<I: Input> {
    seeds: Vec<I>,
}

impl<I: Input + From<Vec<u8>>> CorpusStore<I> {
    /// Loads every regular file directly inside `directory` as an opaque
    /// byte-sequence seed. Files with identical byte content collapse into a
    /// single seed regardless of filename; retained ordering is unspecified.
    ///
    /// Unreadable entries are skipped with a warning. A zero-length file
    /// aborts the load, as does a directory that yields no seeds at all.
    pub fn load(directory: &Path) -> Result<Self, CorpusError> {
        let entries = fs::read_dir(directory).map_err(|e| {
            CorpusError::Io(format!(
                "failed to list corpus directory {directory:?}: {e}"
            ))
        })?;

        let mut unique: HashSet<Vec<u8>> = HashSet::new();
        for entry_result in entries {
            let entry = match entry_result {
                Ok(entry) => entry,
                Err(e) => {
                    eprintln!("warning: skipping unreadable entry in {directory:?}: {e}");
                    continue;
                }
            };
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            let bytes = match fs::read(&path) {
                Ok(bytes) => bytes,
                Err(e) => {
                    eprintln!("warning: skipping unreadable seed file {path:?}: {e}");
                    continue;
                }
            };
            if bytes.is_empty() {
                return Err(CorpusError::EmptySeed(path));
            }
            unique.insert(bytes);
        }

        if unique.is_empty() {
            return Err(CorpusError::Empty(directory.to_path_buf()));
        }
        Ok(Self {
            seeds: unique.into_iter().map(I::from).collect(),
        })
    }
}

impl<I: Input> CorpusStore<I> {
    /// Returns a uniformly random seed, with replacement.
    ///
    /// The store is guaranteed non-empty by construction, so this never
    /// fails. Callers copy the returned seed before mutating it.
    pub fn sample(&self, rng: &mut dyn RngCore) -> &I {
        let index = rng.next_u64() as usize % self.seeds.len();
        &self.seeds[index]
    }

    /// Number of distinct seeds retained at load time.
    pub fn len(&self) -> usize {
        self.seeds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seeds.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand_chacha::ChaCha8Rng;
    use rand_core::SeedableRng;
    use std::collections::HashSet;
    use tempfile::tempdir;

    #[test]
    fn load_collapses_duplicate_seed_content() -> Result<(), CorpusError> {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("a.bin"), [1, 2, 3]).unwrap();
        fs::write(dir.path().join("b.bin"), [1, 2, 3]).unwrap();
        fs::write(dir.path().join("c.bin"), [4, 5]).unwrap();

        let store: CorpusStore<Vec<u8>> = CorpusStore::load(dir.path())?;
        assert_eq!(store.len(), 2, "duplicate content should collapse to one seed");
        Ok(())
    }

    #[test]
    fn load_skips_subdirectories() -> Result<(), CorpusError> {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("seed"), [9]).unwrap();
        fs::create_dir(dir.path().join("nested")).unwrap();
        fs::write(dir.path().join("nested").join("ignored"), [8]).unwrap();

        let store: CorpusStore<Vec<u8>> = CorpusStore::load(dir.path())?;
        assert_eq!(store.len(), 1);
        Ok(())
    }

    #[test]
    fn load_empty_directory_is_an_error() {
        let dir = tempdir().unwrap();
        let result = CorpusStore::<Vec<u8>>::load(dir.path());
        assert!(matches!(result, Err(CorpusError::Empty(_))));
    }

    #[test]
    fn load_missing_directory_is_io_error() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("does_not_exist");
        let result = CorpusStore::<Vec<u8>>::load(&missing);
        assert!(matches!(result, Err(CorpusError::Io(_))));
    }

    #[test]
    fn load_rejects_zero_length_seed() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("ok"), [1]).unwrap();
        fs::write(dir.path().join("empty"), []).unwrap();

        let result = CorpusStore::<Vec<u8>>::load(dir.path());
        match result {
            Err(CorpusError::EmptySeed(path)) => {
                assert_eq!(path.file_name().and_then(|n| n.to_str()), Some("empty"));
            }
            other => panic!("expected EmptySeed, got {other:?}"),
        }
    }

    #[test]
    fn sample_eventually_returns_every_seed() -> Result<(), CorpusError> {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("a"), [b'a']).unwrap();
        fs::write(dir.path().join("b"), [b'b']).unwrap();
        fs::write(dir.path().join("c"), [b'c']).unwrap();

        let store: CorpusStore<Vec<u8>> = CorpusStore::load(dir.path())?;
        let mut rng = ChaCha8Rng::from_seed([7; 32]);
        let mut seen: HashSet<Vec<u8>> = HashSet::new();
        for _ in 0..200 {
            seen.insert(store.sample(&mut rng).clone());
        }
        assert_eq!(seen.len(), 3, "uniform sampling should hit every seed");
        Ok(())
    }
}
