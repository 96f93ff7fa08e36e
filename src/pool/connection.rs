use std::ops::{Deref, DerefMut};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use deadpool::managed::Object;
use mysql_async::Conn;

use super::manager::MysqlManager;

/// Counts one open connection that lives outside deadpool's bookkeeping.
#[derive(Debug)]
pub(crate) struct OpenGuard(Arc<AtomicUsize>);

impl OpenGuard {
    pub(crate) fn new(open: &Arc<AtomicUsize>) -> Self {
        open.fetch_add(1, Ordering::AcqRel);
        Self(Arc::clone(open))
    }
}

impl Drop for OpenGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::AcqRel);
    }
}

pub(crate) enum Slot {
    Pooled(Object<MysqlManager>),
    Detached { conn: Conn, open: OpenGuard },
}

/// A connection checked out of a [`ConnectionPool`](super::ConnectionPool).
///
/// Hand it back with [`ConnectionPool::release`](super::ConnectionPool::release).
/// Dropping it instead (for example when the operation holding it is
/// cancelled) still gives it up: a pooled connection returns to the pool and a
/// short-mode connection is disconnected.
pub struct PooledConn {
    slot: Slot,
}

impl PooledConn {
    pub(crate) fn pooled(obj: Object<MysqlManager>) -> Self {
        Self {
            slot: Slot::Pooled(obj),
        }
    }

    pub(crate) fn detached(conn: Conn, open: OpenGuard) -> Self {
        Self {
            slot: Slot::Detached { conn, open },
        }
    }

    pub(crate) fn into_slot(self) -> Slot {
        self.slot
    }

    /// Server-side connection id.
    #[must_use]
    pub fn id(&self) -> u32 {
        self.deref().id()
    }

    /// Drop a connection known to be broken without returning it to the pool.
    pub(crate) fn discard(self) {
        match self.slot {
            Slot::Pooled(obj) => drop(Object::take(obj)),
            Slot::Detached { conn, open } => {
                drop(conn);
                drop(open);
            }
        }
    }
}

impl Deref for PooledConn {
    type Target = Conn;

    fn deref(&self) -> &Conn {
        match &self.slot {
            Slot::Pooled(obj) => &**obj,
            Slot::Detached { conn, .. } => conn,
        }
    }
}

impl DerefMut for PooledConn {
    fn deref_mut(&mut self) -> &mut Conn {
        match &mut self.slot {
            Slot::Pooled(obj) => &mut **obj,
            Slot::Detached { conn, .. } => conn,
        }
    }
}

impl std::fmt::Debug for PooledConn {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kind = match self.slot {
            Slot::Pooled(_) => "Pooled",
            Slot::Detached { .. } => "Detached",
        };
        f.debug_struct("PooledConn")
            .field("kind", &kind)
            .field("id", &self.id())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_guard_tracks_live_connections() {
        let open = Arc::new(AtomicUsize::new(0));
        let a = OpenGuard::new(&open);
        let b = OpenGuard::new(&open);
        assert_eq!(open.load(Ordering::Acquire), 2);
        drop(a);
        assert_eq!(open.load(Ordering::Acquire), 1);
        drop(b);
        assert_eq!(open.load(Ordering::Acquire), 0);
    }
}
