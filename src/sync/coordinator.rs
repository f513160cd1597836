//! Build-once coordination of a mesh's derived tables.
//!
//! Every table moves `Absent -> Synchronizing -> Present`. The coordinator
//! hands each absent table to exactly one caller of [`Coordinator::synchronize`];
//! concurrent callers asking for the same table block on the condition
//! variable until the builder finishes instead of building it again.
//!
//! Builders run on the calling thread when only one table is pending (or when
//! [`Dispatch::Sequential`] is selected), otherwise on scoped threads, one per
//! table, all joined before `synchronize` returns. Search grids wait for the
//! bounding box before they start.
//!
//! A builder that panics or returns an error *poisons* the coordinator: all
//! current and future waiters get [`MeshError::Poisoned`] until the state is
//! reset with [`Coordinator::clear`].

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::{Condvar, Mutex};

use super::mask::{Table, TableMask};
use crate::mesh_error::MeshError;

/// How pending tables are executed by one `synchronize` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Dispatch {
    /// One scoped OS thread per pending table.
    #[default]
    Threaded,
    /// Every table on the calling thread, in dependency order.
    Sequential,
}

#[derive(Debug, Clone, Copy)]
struct SyncState {
    synchronized: TableMask,
    synchronizing: TableMask,
    poisoned: Option<Table>,
}

impl SyncState {
    const fn new() -> Self {
        SyncState {
            synchronized: TableMask::RAW,
            synchronizing: TableMask::empty(),
            poisoned: None,
        }
    }
}

/// Number of times each table builder has been started.
///
/// Counters survive [`Coordinator::clear`], so a rebuild after a clear shows
/// up as a second build.
#[derive(Debug, Default)]
pub struct BuildStats {
    counts: [AtomicUsize; 6],
}

impl BuildStats {
    fn record(&self, table: Table) {
        self.counts[table.index()].fetch_add(1, Ordering::Relaxed);
    }

    /// How many times `table` has been built.
    pub fn get(&self, table: Table) -> usize {
        self.counts[table.index()].load(Ordering::Relaxed)
    }
}

/// Tracks which tables exist and dispatches their construction exactly once.
#[derive(Debug)]
pub struct Coordinator {
    state: Mutex<SyncState>,
    changed: Condvar,
    stats: BuildStats,
}

impl Default for Coordinator {
    fn default() -> Self {
        Self::new()
    }
}

impl Coordinator {
    /// A coordinator where only the raw nodes and elements are present.
    pub fn new() -> Self {
        Coordinator {
            state: Mutex::new(SyncState::new()),
            changed: Condvar::new(),
            stats: BuildStats::default(),
        }
    }

    /// Ensures every table in `requested` is present, building the missing
    /// ones with `build`.
    ///
    /// `requested` must already be dependency-closed (see
    /// [`expand`](super::mask::expand)); only its [`TableMask::TABLES`] bits
    /// are considered. Blocks until all requested tables are present.
    pub fn synchronize<F>(
        &self,
        requested: TableMask,
        dispatch: Dispatch,
        build: F,
    ) -> Result<(), MeshError>
    where
        F: Fn(Table) -> Result<(), MeshError> + Sync,
    {
        let requested = requested & TableMask::TABLES;
        let to_do = {
            let mut st = self.state.lock();
            if let Some(table) = st.poisoned {
                return Err(MeshError::Poisoned { table });
            }
            let to_do = requested & !(st.synchronized | st.synchronizing);
            st.synchronizing |= to_do;
            to_do
        };

        if !to_do.is_empty() {
            let tasks: Vec<Table> = to_do.tables().collect();
            log::debug!("synchronize: building {:?} ({:?})", to_do, dispatch);
            if tasks.len() == 1 || dispatch == Dispatch::Sequential {
                for table in tasks {
                    self.run_task(table, &build);
                }
            } else {
                let build = &build;
                std::thread::scope(|s| {
                    for table in tasks {
                        s.spawn(move || self.run_task(table, build));
                    }
                });
            }
        }

        self.wait_for(requested)
    }

    fn run_task<F>(&self, table: Table, build: &F)
    where
        F: Fn(Table) -> Result<(), MeshError>,
    {
        if table.needs_bounding_box() && self.wait_for(TableMask::BOUNDING_BOX).is_err() {
            let mut st = self.state.lock();
            st.synchronizing.remove(table.mask());
            drop(st);
            self.changed.notify_all();
            return;
        }

        self.stats.record(table);
        let outcome = catch_unwind(AssertUnwindSafe(|| build(table)));

        let mut st = self.state.lock();
        st.synchronizing.remove(table.mask());
        match outcome {
            Ok(Ok(())) => st.synchronized |= table.mask(),
            Ok(Err(err)) => {
                log::error!("building {table:?} failed: {err}");
                st.poisoned.get_or_insert(table);
            }
            Err(_) => {
                log::error!("builder for {table:?} panicked; poisoning synchronization");
                st.poisoned.get_or_insert(table);
            }
        }
        drop(st);
        self.changed.notify_all();
    }

    /// Blocks until every table in `mask` is present or the state is poisoned.
    fn wait_for(&self, mask: TableMask) -> Result<(), MeshError> {
        let mut st = self.state.lock();
        loop {
            if st.synchronized.contains(mask) {
                return Ok(());
            }
            if let Some(table) = st.poisoned {
                return Err(MeshError::Poisoned { table });
            }
            self.changed.wait(&mut st);
        }
    }

    /// `true` when every table in `mask` is present. Never blocks on builders.
    pub fn is_synchronized(&self, mask: TableMask) -> bool {
        self.state.lock().synchronized.contains(mask)
    }

    /// Snapshot of the present tables.
    pub fn synchronized(&self) -> TableMask {
        self.state.lock().synchronized
    }

    /// The table whose builder failed, if any.
    pub fn poisoned(&self) -> Option<Table> {
        self.state.lock().poisoned
    }

    /// Kept for API compatibility; tables are only dropped by [`clear`](Self::clear).
    pub fn unsynchronize(&self, _mask: TableMask) -> bool {
        true
    }

    /// Forgets every table and any poison. Exclusive access guarantees no
    /// builder is running.
    pub fn clear(&mut self) {
        *self.state.get_mut() = SyncState::new();
    }

    /// Per-table build counters.
    pub fn stats(&self) -> &BuildStats {
        &self.stats
    }

    /// Shorthand for `stats().get(table)`.
    pub fn build_count(&self, table: Table) -> usize {
        self.stats.get(table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    fn ok(_: Table) -> Result<(), MeshError> {
        Ok(())
    }

    #[test]
    fn raw_tables_start_present() {
        let c = Coordinator::new();
        assert!(c.is_synchronized(TableMask::NODES | TableMask::ELEMS));
        assert!(!c.is_synchronized(TableMask::EDGES));
    }

    #[test]
    fn each_table_is_built_once() {
        let c = Coordinator::new();
        c.synchronize(TableMask::EDGES | TableMask::FACES, Dispatch::Threaded, ok)
            .unwrap();
        c.synchronize(TableMask::EDGES, Dispatch::Threaded, ok).unwrap();
        assert_eq!(c.build_count(Table::Edges), 1);
        assert_eq!(c.build_count(Table::Faces), 1);
        assert_eq!(c.build_count(Table::BoundingBox), 0);
    }

    #[test]
    fn concurrent_callers_share_one_build() {
        let c = Arc::new(Coordinator::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let c = Arc::clone(&c);
                std::thread::spawn(move || {
                    c.synchronize(TableMask::EDGES, Dispatch::Threaded, |_| {
                        std::thread::sleep(Duration::from_millis(20));
                        Ok(())
                    })
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap().unwrap();
        }
        assert_eq!(c.build_count(Table::Edges), 1);
        assert!(c.is_synchronized(TableMask::EDGES));
    }

    #[test]
    fn grids_start_after_bounding_box() {
        let c = Coordinator::new();
        let order = Mutex::new(Vec::new());
        let mask = TableMask::NODE_LOCATE | TableMask::ELEM_LOCATE | TableMask::BOUNDING_BOX;
        c.synchronize(mask, Dispatch::Threaded, |t| {
            if t == Table::BoundingBox {
                std::thread::sleep(Duration::from_millis(20));
            }
            order.lock().push(t);
            Ok(())
        })
        .unwrap();
        let order = order.into_inner();
        assert_eq!(order.len(), 3);
        assert_eq!(order[0], Table::BoundingBox);
    }

    #[test]
    fn sequential_dispatch_runs_in_dependency_order() {
        let c = Coordinator::new();
        let order = Mutex::new(Vec::new());
        c.synchronize(TableMask::TABLES, Dispatch::Sequential, |t| {
            order.lock().push(t);
            Ok(())
        })
        .unwrap();
        assert_eq!(order.into_inner(), Table::ALL.to_vec());
    }

    #[test]
    fn panicking_builder_poisons_until_clear() {
        let mut c = Coordinator::new();
        let err = c
            .synchronize(TableMask::FACES, Dispatch::Threaded, |_| -> Result<(), MeshError> {
                panic!("boom")
            })
            .unwrap_err();
        assert_eq!(err, MeshError::Poisoned { table: Table::Faces });
        assert_eq!(c.poisoned(), Some(Table::Faces));

        // unrelated tables are refused too
        let err = c.synchronize(TableMask::EDGES, Dispatch::Threaded, ok).unwrap_err();
        assert!(matches!(err, MeshError::Poisoned { .. }));

        c.clear();
        c.synchronize(TableMask::FACES, Dispatch::Threaded, ok).unwrap();
        assert_eq!(c.build_count(Table::Faces), 2);
    }

    #[test]
    fn failed_bounding_box_releases_waiting_grids() {
        let c = Coordinator::new();
        let mask = TableMask::NODE_LOCATE | TableMask::BOUNDING_BOX;
        let err = c
            .synchronize(mask, Dispatch::Threaded, |t| match t {
                Table::BoundingBox => Err(MeshError::InvalidGeometry("empty".into())),
                _ => Ok(()),
            })
            .unwrap_err();
        assert_eq!(err, MeshError::Poisoned { table: Table::BoundingBox });
        assert_eq!(c.build_count(Table::NodeLocateGrid), 0);
    }

    #[test]
    fn clear_resets_to_raw() {
        let mut c = Coordinator::new();
        c.synchronize(TableMask::TABLES, Dispatch::Threaded, ok).unwrap();
        assert!(c.is_synchronized(TableMask::TABLES));
        assert!(c.unsynchronize(TableMask::EDGES));
        assert!(c.is_synchronized(TableMask::EDGES));
        c.clear();
        assert_eq!(c.synchronized(), TableMask::RAW);
    }
}
