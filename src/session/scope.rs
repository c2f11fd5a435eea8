use crate::error::SessionError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ScopeId(usize);

impl ScopeId {
    /// The session-level transaction every batch scope descends from.
    pub const ROOT: ScopeId = ScopeId(0);

    pub fn is_root(self) -> bool {
        self == Self::ROOT
    }

    pub fn get(self) -> usize {
        self.0
    }
}

impl std::fmt::Display for ScopeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_root() {
            f.write_str("root")
        } else {
            write!(f, "#{}", self.0)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceState {
    Open,
    Finalized,
}

#[derive(Debug)]
struct ScopeEntry {
    parent: Option<ScopeId>,
    state: ResourceState,
}

/// Chain of transaction scopes inside one session.
///
/// Every scope is only Open or Finalized. Nothing counts how many batches
/// are in flight: a batch learns its parent was closed underneath it only
/// when it tries to submit.
#[derive(Debug)]
pub struct ScopeTree {
    entries: Vec<ScopeEntry>,
    current: ScopeId,
}

impl Default for ScopeTree {
    fn default() -> Self {
        Self {
            entries: vec![ScopeEntry {
                parent: None,
                state: ResourceState::Open,
            }],
            current: ScopeId::ROOT,
        }
    }
}

impl ScopeTree {
    pub fn current(&self) -> ScopeId {
        self.current
    }

    pub fn state(&self, id: ScopeId) -> ResourceState {
        self.entry(id).state
    }

    pub fn parent(&self, id: ScopeId) -> Option<ScopeId> {
        self.entry(id).parent
    }

    /// Opens a child of the current scope and makes it current.
    pub fn begin_nested(&mut self) -> ScopeId {
        let id = ScopeId(self.entries.len());
        self.entries.push(ScopeEntry {
            parent: Some(self.current),
            state: ResourceState::Open,
        });
        self.current = id;
        id
    }

    /// Fails if any scope on the path from `id` to root is finalized. A
    /// finalized root is reported as such; otherwise the nearest finalized
    /// ancestor is.
    pub fn ensure_active(&self, id: ScopeId) -> Result<(), SessionError> {
        if self.state(ScopeId::ROOT) == ResourceState::Finalized {
            return Err(SessionError::ResourceFinalized {
                scope: ScopeId::ROOT,
            });
        }
        let mut cursor = Some(id);
        while let Some(scope) = cursor {
            let entry = self.entry(scope);
            if entry.state == ResourceState::Finalized {
                return Err(SessionError::ResourceFinalized { scope });
            }
            cursor = entry.parent;
        }
        Ok(())
    }

    /// Finalizes a nested scope and hands "current" back to its parent.
    ///
    /// The parent becomes current even if some other scope was current at
    /// this point; later batches then nest under that parent.
    pub fn finish(&mut self, id: ScopeId) {
        let parent = {
            let entry = self.entry_mut(id);
            entry.state = ResourceState::Finalized;
            entry.parent
        };
        if let Some(parent) = parent {
            self.current = parent;
        }
    }

    pub fn finalize_root(&mut self) {
        self.finish(ScopeId::ROOT);
    }

    /// Nested scopes that are still open, regardless of their ancestors.
    pub fn open_nested(&self) -> usize {
        self.entries
            .iter()
            .skip(1)
            .filter(|e| e.state == ResourceState::Open)
            .count()
    }

    fn entry(&self, id: ScopeId) -> &ScopeEntry {
        &self.entries[id.0]
    }

    fn entry_mut(&mut self, id: ScopeId) -> &mut ScopeEntry {
        &mut self.entries[id.0]
    }
}
