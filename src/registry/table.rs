use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::{Mutex, RwLock};
use tracing::debug;

use crate::error::AirspaceError;
use crate::registry::{AircraftRecord, Position, Velocity};

/// Stable reference to one registry slot. Components pass handles around
/// instead of holding references into the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SlotHandle(usize);

impl SlotHandle {
    pub fn index(&self) -> usize {
        self.0
    }
}

/// Fixed-capacity concurrent table of aircraft slots; the single source of
/// truth for airspace state.
///
/// Locking is slot-granular: each slot has its own `RwLock`, so mutating
/// slot `k` never blocks traffic on other slots. Table-shape operations
/// (allocate, deallocate) additionally serialize on `table_lock`, which keeps
/// `count` and the active-id-uniqueness invariant consistent without freezing
/// readers.
pub struct AircraftRegistry {
    slots: Vec<RwLock<Option<AircraftRecord>>>,
    table_lock: Mutex<()>,
    count: AtomicUsize,
}

impl AircraftRegistry {
    pub fn new(capacity: usize) -> Result<Self, AirspaceError> {
        if capacity == 0 {
            return Err(AirspaceError::ResourceUnavailable(
                "cannot create an airspace table with zero slots".into(),
            ));
        }
        let mut slots = Vec::with_capacity(capacity);
        for _ in 0..capacity {
            slots.push(RwLock::new(None));
        }
        Ok(Self {
            slots,
            table_lock: Mutex::new(()),
            count: AtomicUsize::new(0),
        })
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Number of active slots.
    pub fn count(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }

    /// Claim the first empty slot for a new aircraft.
    ///
    /// Fails with `DuplicateId` if the id is already active and
    /// `CapacityExceeded` if every slot is taken; the table is unchanged on
    /// any failure.
    pub async fn allocate(
        &self,
        id: u32,
        position: Position,
        velocity: Velocity,
    ) -> Result<SlotHandle, AirspaceError> {
        if id == 0 {
            return Err(AirspaceError::InvalidParameter(
                "aircraft id must be positive".into(),
            ));
        }

        let _guard = self.table_lock.lock().await;

        let mut free: Option<usize> = None;
        for (idx, slot) in self.slots.iter().enumerate() {
            match *slot.read().await {
                Some(record) if record.id == id => {
                    return Err(AirspaceError::DuplicateId(id));
                }
                Some(_) => {}
                None => {
                    if free.is_none() {
                        free = Some(idx);
                    }
                }
            }
        }

        let idx = free.ok_or(AirspaceError::CapacityExceeded)?;
        *self.slots[idx].write().await = Some(AircraftRecord::new(id, position, velocity));
        self.count.fetch_add(1, Ordering::SeqCst);
        debug!("[REGISTRY] Aircraft {} allocated to slot {}", id, idx);
        Ok(SlotHandle(idx))
    }

    /// Mark a slot empty. Idempotent; returns the record that was evicted,
    /// if any.
    pub async fn deallocate(&self, handle: SlotHandle) -> Option<AircraftRecord> {
        let _guard = self.table_lock.lock().await;
        let evicted = self.slots[handle.0].write().await.take();
        if let Some(record) = evicted {
            self.count.fetch_sub(1, Ordering::SeqCst);
            debug!("[REGISTRY] Aircraft {} freed slot {}", record.id, handle.0);
        }
        evicted
    }

    /// Consistent (non-torn) snapshot of one slot.
    pub async fn read(&self, handle: SlotHandle) -> Option<AircraftRecord> {
        *self.slots[handle.0].read().await
    }

    /// Returns false if the slot is empty.
    pub async fn mutate_velocity(&self, handle: SlotHandle, velocity: Velocity) -> bool {
        match self.slots[handle.0].write().await.as_mut() {
            Some(record) => {
                record.velocity = velocity;
                true
            }
            None => false,
        }
    }

    /// Returns false if the slot is empty.
    pub async fn mutate_altitude(&self, handle: SlotHandle, z: f64) -> bool {
        match self.slots[handle.0].write().await.as_mut() {
            Some(record) => {
                record.position.z = z;
                true
            }
            None => false,
        }
    }

    /// Advance one aircraft by `dt` seconds, but only while the slot still
    /// holds `id`. A deallocated or reused slot makes this a no-op so a stale
    /// updater task can detect it lost its aircraft and exit.
    pub async fn advance_if(&self, handle: SlotHandle, id: u32, dt: f64) -> bool {
        match self.slots[handle.0].write().await.as_mut() {
            Some(record) if record.id == id => {
                record.advance(dt);
                true
            }
            _ => false,
        }
    }

    /// Slot index of the active aircraft with this id, if any.
    pub async fn find_by_id(&self, id: u32) -> Option<SlotHandle> {
        for (idx, slot) in self.slots.iter().enumerate() {
            if let Some(record) = *slot.read().await {
                if record.id == id {
                    return Some(SlotHandle(idx));
                }
            }
        }
        None
    }

    /// Ordered snapshot of all active slots.
    ///
    /// Each returned record was the slot's value at some instant during the
    /// call; the sequence is not a single global instant across slots. The
    /// conflict scan tolerates that bounded staleness by design.
    pub async fn snapshot(&self) -> Vec<(SlotHandle, AircraftRecord)> {
        let mut out = Vec::with_capacity(self.count());
        for (idx, slot) in self.slots.iter().enumerate() {
            if let Some(record) = *slot.read().await {
                out.push((SlotHandle(idx), record));
            }
        }
        out
    }
}
