//! MIPS allocation policies.

use crate::common::{AllocationVerdict, MipsShare};
use crate::state::AllocationState;

pub use crate::policies::time_shared::TimeShared;
pub use crate::policies::time_shared_over_subscription::TimeSharedOverSubscription;

/// Trait for implementation of MIPS allocation policies.
///
/// The policy decides whether a VM with the given requested share can be placed on the host, and updates
/// the host allocation state accordingly. A policy may change the allocations of other VMs already placed
/// on the host (e.g. to share the capacity between all VMs when the host is oversubscribed).
pub trait MipsAllocationPolicy {
    fn allocate_pes(&self, state: &mut AllocationState, vm_uid: &str, mips_share: &[f64]) -> AllocationVerdict;
}

/// Checks that each virtual PE requests no more than a single physical PE provides.
///
/// Returns the total requested MIPS on success.
pub(crate) fn check_pe_capacity(state: &AllocationState, mips_share: &[f64]) -> Result<f64, AllocationVerdict> {
    let pe_capacity = state.pe_capacity();
    let mut total_requested = 0.;
    for &mips in mips_share {
        if mips.is_nan() || mips > pe_capacity {
            return Err(AllocationVerdict::PeCapacityExceeded {
                requested: mips,
                pe_capacity,
            });
        }
        total_requested += mips;
    }
    Ok(total_requested)
}

/// Allocates the requested share scaled only by the VM migration multiplier
/// and withdraws the visible demand from available capacity.
pub(crate) fn allocate_exact(state: &mut AllocationState, vm_uid: &str, mips_share: &[f64], visible_demand: f64) {
    let multiplier = state.migration_multiplier(vm_uid);
    let allocated: MipsShare = mips_share.iter().map(|mips| mips * multiplier).collect();
    state.set_allocation(vm_uid, allocated);
    state.set_available_mips(state.available_mips() - visible_demand);
}
