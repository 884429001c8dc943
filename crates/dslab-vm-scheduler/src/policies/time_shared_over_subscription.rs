//! Time-shared policy with oversubscription.

use log::{debug, trace, warn};

use crate::common::{AllocationVerdict, MipsShare};
use crate::policy::{allocate_exact, check_pe_capacity, MipsAllocationPolicy};
use crate::state::{AllocationState, MIGRATION_IN_VISIBILITY_FACTOR, MIGRATION_OUT_PENALTY_FACTOR};

/// Shares host PEs between VMs, admitting VMs even when their total request exceeds the host capacity.
///
/// Oversubscription results in performance degradation: once the available capacity is exhausted,
/// the requests of all VMs on the host are scaled down proportionally so that they fit into the
/// physical capacity. Each virtual PE still cannot request more MIPS than a single physical PE provides.
#[derive(Clone, Copy, Debug, Default)]
pub struct TimeSharedOverSubscription;

impl TimeSharedOverSubscription {
    pub fn new() -> Self {
        Self {}
    }

    /// Recomputes allocations of all VMs by scaling their requests by a single host-wide factor.
    ///
    /// Allocated values are rounded down, so the summary allocation never exceeds the host capacity.
    /// Afterwards the host is fully committed and has no available MIPS.
    pub fn redistribute(&self, state: &mut AllocationState) {
        let total_required = state.total_visible_demand();
        let total_mips = state.total_mips();
        state.clear_allocations();

        if total_required > 0. {
            let scaling_factor = total_mips / total_required;
            debug!(
                "redistributing {} MIPS between {} vms requesting {} MIPS, scaling factor = {:.4}",
                total_mips,
                state.requested_mips_map().len(),
                total_required,
                scaling_factor
            );
            let allocations = scale_requests(state, scaling_factor);
            for (vm_uid, allocated) in allocations {
                state.set_allocation(&vm_uid, allocated);
            }
        } else {
            debug!("nothing to redistribute, total requested MIPS is zero");
        }

        state.set_available_mips(0.);
    }
}

fn scale_requests(state: &AllocationState, scaling_factor: f64) -> Vec<(String, MipsShare)> {
    state
        .requested_mips_map()
        .iter()
        .map(|(vm_uid, requested)| {
            let allocated = scale_share(state, vm_uid, requested, scaling_factor);
            trace!("vm {}: requested {:?}, allocated {:?}", vm_uid, requested, allocated);
            (vm_uid.clone(), allocated)
        })
        .collect()
}

fn scale_share(state: &AllocationState, vm_uid: &str, requested: &[f64], scaling_factor: f64) -> MipsShare {
    if state.is_migrating_in(vm_uid) && state.is_migrating_out(vm_uid) {
        warn!(
            "vm {} is migrating both in and out, its demand is discounted as migrating in but allocated as migrating out",
            vm_uid
        );
    }
    requested
        .iter()
        .map(|&mips| {
            let scaled = if state.is_migrating_out(vm_uid) {
                mips * scaling_factor * MIGRATION_OUT_PENALTY_FACTOR
            } else if state.is_migrating_in(vm_uid) {
                mips * MIGRATION_IN_VISIBILITY_FACTOR * scaling_factor
            } else {
                mips * scaling_factor
            };
            scaled.floor()
        })
        .collect()
}

impl MipsAllocationPolicy for TimeSharedOverSubscription {
    fn allocate_pes(&self, state: &mut AllocationState, vm_uid: &str, mips_share: &[f64]) -> AllocationVerdict {
        if let Err(verdict) = check_pe_capacity(state, mips_share) {
            return verdict;
        }

        state.record_request(vm_uid, mips_share);
        let visible_demand = state.visible_demand(vm_uid, mips_share);

        if state.available_mips() >= visible_demand {
            allocate_exact(state, vm_uid, mips_share, visible_demand);
            AllocationVerdict::Allocated
        } else {
            debug!(
                "vm {} requests {} MIPS, only {} MIPS are available, host becomes oversubscribed",
                vm_uid,
                visible_demand,
                state.available_mips()
            );
            self.redistribute(state);
            AllocationVerdict::Oversubscribed
        }
    }
}
