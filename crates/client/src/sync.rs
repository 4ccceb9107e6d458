//! Reconciliation status for locally mirrored collections.

/// Relationship between a local collection and its remote counterpart.
///
/// The cart and favorites each keep an optimistic local copy of server
/// state. Every code path that can let the two copies drift apart records
/// it here, so divergence is a single auditable signal instead of an
/// implicit property of scattered error branches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SyncState {
    /// Local collection mirrors the last server response.
    #[default]
    Synced,
    /// A remote mutation is in flight; local state is about to change.
    PendingRemote,
    /// A remote mutation failed after (or instead of) a local one; the
    /// copies may disagree until the next full load.
    Diverged,
}

impl SyncState {
    /// Whether local and remote state are known to agree.
    #[must_use]
    pub const fn is_synced(&self) -> bool {
        matches!(self, Self::Synced)
    }
}
