use std::sync::OnceLock;

use parking_lot::Mutex;
use rustc_hash::FxHashMap;

/// Which subsystem an allocation is attributed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AllocationSubsystem {
    /// Render resources: geometry buffers, particle streams, poses.
    Render,
    /// Everything else.
    Other,
}

/// One tracked allocation.
#[derive(Debug, Clone)]
pub struct Allocation {
    /// Allocation size in bytes.
    pub size: usize,
    /// Owning subsystem.
    pub subsystem: AllocationSubsystem,
    /// Optional allocator name, e.g. the manager that made it.
    pub name: Option<&'static str>,
}

/// Snapshot of all live tracked allocations.
#[derive(Debug, Default)]
pub struct MemoryDump {
    /// Live allocations at dump time, in arbitrary order.
    pub allocations: Vec<Allocation>,
}

impl MemoryDump {
    /// Sum of all allocation sizes attributed to `subsystem`.
    #[must_use]
    pub fn total_for(&self, subsystem: AllocationSubsystem) -> usize {
        self.allocations
            .iter()
            .filter(|allocation| allocation.subsystem == subsystem)
            .map(|allocation| allocation.size)
            .sum()
    }
}

/// Process-wide allocation profiler.
///
/// Named allocators report their allocations here when profiling is enabled;
/// the overlay pulls a [`MemoryDump`] once a frame. The internal mutex is
/// taken only while profiling is on, so release builds with profiling off
/// pay a single atomic load per call site.
pub struct MemoryProfiler {
    enabled: std::sync::atomic::AtomicBool,
    allocations: Mutex<FxHashMap<usize, Allocation>>,
}

impl MemoryProfiler {
    /// The process-wide instance.
    pub fn instance() -> &'static MemoryProfiler {
        static INSTANCE: OnceLock<MemoryProfiler> = OnceLock::new();
        INSTANCE.get_or_init(|| MemoryProfiler {
            enabled: std::sync::atomic::AtomicBool::new(false),
            allocations: Mutex::new(FxHashMap::default()),
        })
    }

    /// Turns profiling on or off.
    pub fn set_enabled(&self, enabled: bool) {
        self.enabled
            .store(enabled, std::sync::atomic::Ordering::Relaxed);
    }

    /// Whether profiling is currently enabled.
    pub fn is_enabled(&self) -> bool {
        self.enabled.load(std::sync::atomic::Ordering::Relaxed)
    }

    /// Records an allocation keyed by its address.
    pub fn allocate(
        &self,
        address: usize,
        size: usize,
        subsystem: AllocationSubsystem,
        name: Option<&'static str>,
    ) {
        if !self.is_enabled() {
            return;
        }

        self.allocations.lock().insert(
            address,
            Allocation {
                size,
                subsystem,
                name,
            },
        );
    }

    /// Forgets an allocation keyed by its address.
    pub fn deallocate(&self, address: usize) {
        if !self.is_enabled() {
            return;
        }

        self.allocations.lock().remove(&address);
    }

    /// Returns a snapshot of all live tracked allocations.
    pub fn dump(&self) -> MemoryDump {
        MemoryDump {
            allocations: self.allocations.lock().values().cloned().collect(),
        }
    }
}
