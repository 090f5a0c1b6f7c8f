//! Insertion-ordered FourCC → [`Compressor`] registry with an optional
//! forced choice, mirroring the original's `CryptedObjectConfig` (now an
//! explicit value instead of a process singleton — see spec.md §9).

use super::Compressor;
use std::collections::HashMap;

/// Maps FourCC tags to compressors. Lookups fail closed: an unregistered
/// FourCC is never silently substituted with a default.
pub struct AlgorithmRegistry {
    order: Vec<u32>,
    algorithms: HashMap<u32, Box<dyn Compressor>>,
    forced: Option<u32>,
}

impl AlgorithmRegistry {
    pub fn new() -> Self {
        Self {
            order: Vec::new(),
            algorithms: HashMap::new(),
            forced: None,
        }
    }

    /// Insert (or replace) the compressor registered under `fourcc`.
    /// Replacing an existing entry preserves its position in insertion
    /// order.
    pub fn register(&mut self, fourcc: u32, algorithm: Box<dyn Compressor>) {
        if !self.algorithms.contains_key(&fourcc) {
            self.order.push(fourcc);
        }
        self.algorithms.insert(fourcc, algorithm);
    }

    /// Prefer `fourcc` in [`Self::choose`]. A no-op if `fourcc` is not
    /// registered.
    pub fn force(&mut self, fourcc: u32) {
        if self.algorithms.contains_key(&fourcc) {
            self.forced = Some(fourcc);
        }
    }

    /// Clear any forced preference, reverting [`Self::choose`] to the
    /// first insertion.
    pub fn clear_forced(&mut self) {
        self.forced = None;
    }

    /// Rename the FourCC an existing entry is keyed under, preserving its
    /// position in insertion order. A no-op if `old` is not registered.
    pub fn rekey(&mut self, old: u32, new: u32) {
        let Some(algorithm) = self.algorithms.remove(&old) else {
            return;
        };
        if let Some(slot) = self.order.iter_mut().find(|f| **f == old) {
            *slot = new;
        }
        self.algorithms.insert(new, algorithm);
        if self.forced == Some(old) {
            self.forced = Some(new);
        }
    }

    /// Look up a compressor by FourCC. Fails (returns `None`) rather than
    /// falling back to any default.
    pub fn find(&self, fourcc: u32) -> Option<&dyn Compressor> {
        self.algorithms.get(&fourcc).map(|b| b.as_ref())
    }

    /// The forced entry if one is registered, otherwise the first
    /// insertion. `None` only when the registry is empty.
    pub fn choose(&self) -> Option<(u32, &dyn Compressor)> {
        if let Some(fourcc) = self.forced {
            if let Some(algorithm) = self.algorithms.get(&fourcc) {
                return Some((fourcc, algorithm.as_ref()));
            }
        }
        let first = *self.order.first()?;
        self.algorithms.get(&first).map(|a| (first, a.as_ref()))
    }
}

impl Default for AlgorithmRegistry {
    fn default() -> Self {
        Self::new()
    }
}
