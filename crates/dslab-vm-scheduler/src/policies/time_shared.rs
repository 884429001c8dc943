//! Time-shared policy without oversubscription.

use log::debug;

use crate::common::AllocationVerdict;
use crate::policy::{allocate_exact, check_pe_capacity, MipsAllocationPolicy};
use crate::state::AllocationState;

/// Shares host PEs between VMs, admitting a VM only if its total request fits into the available capacity.
#[derive(Clone, Copy, Debug, Default)]
pub struct TimeShared;

impl TimeShared {
    pub fn new() -> Self {
        Self {}
    }
}

impl MipsAllocationPolicy for TimeShared {
    fn allocate_pes(&self, state: &mut AllocationState, vm_uid: &str, mips_share: &[f64]) -> AllocationVerdict {
        let total_requested = match check_pe_capacity(state, mips_share) {
            Ok(total) => total,
            Err(verdict) => return verdict,
        };
        if total_requested > state.available_mips() {
            debug!(
                "vm {} requests {} MIPS, only {} MIPS are available",
                vm_uid,
                total_requested,
                state.available_mips()
            );
            return AllocationVerdict::NotEnoughMips {
                requested: total_requested,
                available: state.available_mips(),
            };
        }

        state.record_request(vm_uid, mips_share);
        let visible_demand = state.visible_demand(vm_uid, mips_share);
        allocate_exact(state, vm_uid, mips_share, visible_demand);
        AllocationVerdict::Allocated
    }
}
