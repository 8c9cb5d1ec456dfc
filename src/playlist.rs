//! Shuffled circular playlist over image paths.

use std::path::{Path, PathBuf};

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

use crate::error::Error;

/// A circular, pre-shuffled sequence of image paths.
#[derive(Debug, Clone)]
pub struct Playlist {
    items: Vec<PathBuf>,
    idx: usize,
}

impl Playlist {
    /// Shuffle `items` and build the playlist. With `seed` the order is
    /// deterministic; without it the thread RNG decides.
    ///
    /// # Errors
    /// Returns [`Error::EmptyScan`] if `items` is empty.
    pub fn shuffled(mut items: Vec<PathBuf>, seed: Option<u64>) -> Result<Self, Error> {
        if items.is_empty() {
            return Err(Error::EmptyScan);
        }
        match seed {
            Some(seed) => items.shuffle(&mut StdRng::seed_from_u64(seed)),
            None => items.shuffle(&mut rand::rng()),
        }
        Ok(Self { items, idx: 0 })
    }

    /// Number of items contained.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the playlist is empty. Always `false` for constructed values.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// The path currently on display.
    #[must_use]
    pub fn current(&self) -> &PathBuf {
        &self.items[self.idx]
    }

    /// The path that will follow `current`, for prefetching.
    #[must_use]
    pub fn peek_next(&self) -> &PathBuf {
        &self.items[(self.idx + 1) % self.items.len()]
    }

    /// Advance to the next item, wrapping at the end.
    pub fn advance(&mut self) -> &PathBuf {
        self.idx = (self.idx + 1) % self.items.len();
        &self.items[self.idx]
    }

    /// Drop `path` from the rotation, e.g. after a failed decode. Returns
    /// `false` if the path is not in the playlist. The cursor keeps pointing
    /// at the same item unless that item is the one removed, in which case it
    /// moves to the item that would have followed it. The playlist can become
    /// empty this way; callers must check before indexing again.
    pub fn remove(&mut self, path: &Path) -> bool {
        let Some(pos) = self.items.iter().position(|p| p == path) else {
            return false;
        };
        self.items.remove(pos);
        if self.items.is_empty() {
            self.idx = 0;
        } else {
            if pos < self.idx {
                self.idx -= 1;
            }
            self.idx %= self.items.len();
        }
        true
    }

    /// Borrow the internal list (read-only).
    #[must_use]
    pub fn as_slice(&self) -> &[PathBuf] {
        &self.items
    }
}
