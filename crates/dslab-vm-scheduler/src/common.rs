use serde::Serialize;

/// MIPS values requested by or allocated to a VM, one entry per virtual PE.
pub type MipsShare = Vec<f64>;

/// Outcome of a request to allocate PEs for a VM.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub enum AllocationVerdict {
    /// Requested MIPS are allocated exactly (up to migration multipliers).
    Allocated,
    /// VM is admitted, but the host is oversubscribed and allocations of all VMs were scaled down.
    Oversubscribed,
    /// Some virtual PE requests more MIPS than a single physical PE provides.
    PeCapacityExceeded { requested: f64, pe_capacity: f64 },
    /// Host does not have enough available MIPS.
    NotEnoughMips { requested: f64, available: f64 },
}

impl AllocationVerdict {
    /// Returns true if the VM was admitted to the host.
    pub fn is_success(&self) -> bool {
        matches!(self, AllocationVerdict::Allocated | AllocationVerdict::Oversubscribed)
    }
}

/// Returns the identifier used as a VM key in allocation tables.
pub fn vm_uid(user_id: u32, vm_id: u32) -> String {
    format!("{}-{}", user_id, vm_id)
}
