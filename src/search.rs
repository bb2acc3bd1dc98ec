//! The backtracking search over resolver tiers.

use std::collections::VecDeque;
use std::sync::Arc;

use camino::Utf8PathBuf;
use tracing::{debug, trace};

use crate::candidates::CandidateList;
use crate::error::ResolveMiss;
use crate::resolver::Resolver;

/// One precedence tier of an import attempt: a resolver handle, the
/// directory it is rooted at, and the candidates still left to try there.
pub struct ResolutionEntry {
    pub resolver: Arc<dyn Resolver>,
    pub base: Utf8PathBuf,
    pub candidates: CandidateList,
}

impl ResolutionEntry {
    pub fn new(
        resolver: Arc<dyn Resolver>,
        base: impl Into<Utf8PathBuf>,
        candidates: CandidateList,
    ) -> Self {
        Self {
            resolver,
            base: base.into(),
            candidates,
        }
    }
}

/// The full precedence chain for one import attempt. Entries are consumed
/// front to back, and candidates within an entry likewise, so the chain
/// encodes the documented lookup order exactly.
#[derive(Default)]
pub struct ResolutionMap {
    entries: VecDeque<ResolutionEntry>,
}

impl ResolutionMap {
    pub fn push(&mut self, entry: ResolutionEntry) {
        self.entries.push_back(entry);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Try candidates in order until one resolves.
    ///
    /// The first hit wins and nothing after it is attempted. A failed
    /// candidate is dropped from its entry; an entry with no candidates
    /// left is dropped whole. Attempts are strictly sequential, a later
    /// candidate must never win a race against an earlier one. The loop is
    /// iterative so the stack stays flat no matter how many candidates the
    /// map holds.
    pub async fn search(mut self) -> Result<Utf8PathBuf, ResolveMiss> {
        while let Some(entry) = self.entries.front_mut() {
            let Some(candidate) = entry.candidates.take_front() else {
                self.entries.pop_front();
                continue;
            };

            match entry.resolver.resolve(&entry.base, &candidate).await {
                Ok(found) => {
                    debug!(%candidate, %found, "import resolved");
                    return Ok(found);
                }
                Err(ResolveMiss) => {
                    trace!(%candidate, base = %entry.base, "candidate missed");
                }
            }
        }

        Err(ResolveMiss)
    }
}
