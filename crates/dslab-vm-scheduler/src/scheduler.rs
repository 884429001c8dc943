//! Time-shared scheduler of VMs placed on a single host.

use log::{debug, warn};

use crate::common::{AllocationVerdict, MipsShare};
use crate::pe::PeList;
use crate::policy::{check_pe_capacity, MipsAllocationPolicy, TimeSharedOverSubscription};
use crate::state::AllocationState;

/// Direction of a VM migration relative to the host.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Migration {
    In,
    Out,
}

/// Distributes the capacity of host PEs between VMs according to the allocation policy.
///
/// The scheduler exclusively owns the allocation state, which can only be changed via its methods.
/// It is not meant to be shared between threads: concurrent callers must serialize access per host.
pub struct VmScheduler<P: MipsAllocationPolicy> {
    state: AllocationState,
    policy: P,
}

impl<P: MipsAllocationPolicy> VmScheduler<P> {
    pub fn new(pe_list: PeList, policy: P) -> Self {
        Self {
            state: AllocationState::new(pe_list),
            policy,
        }
    }

    pub fn state(&self) -> &AllocationState {
        &self.state
    }

    /// Requests MIPS for virtual PEs of the VM.
    ///
    /// The previous request of the VM (if any) is released before the new one is admitted, and restored if
    /// the new one is rejected. The request is rejected without changing the state if some virtual PE requests
    /// more MIPS than a single physical PE provides.
    pub fn allocate_pes_for_vm(&mut self, vm_uid: &str, mips_share: &[f64]) -> AllocationVerdict {
        if let Err(verdict) = check_pe_capacity(&self.state, mips_share) {
            debug!("vm {} rejected: {:?}", vm_uid, verdict);
            return verdict;
        }
        let previous = self.state.remove_request(vm_uid);
        if previous.is_some() {
            self.reallocate_all();
        }

        let verdict = self.policy.allocate_pes(&mut self.state, vm_uid, mips_share);
        if let (false, Some(previous)) = (verdict.is_success(), previous) {
            self.policy.allocate_pes(&mut self.state, vm_uid, &previous);
        }
        match &verdict {
            AllocationVerdict::Allocated => {
                debug!(
                    "vm {} allocated {:?}, available MIPS: {}",
                    vm_uid,
                    self.state.allocated_mips(vm_uid),
                    self.state.available_mips()
                );
            }
            AllocationVerdict::Oversubscribed => {
                debug!(
                    "vm {} admitted with {:?} on oversubscribed host",
                    vm_uid,
                    self.state.allocated_mips(vm_uid)
                );
            }
            rejected => {
                debug!("vm {} rejected: {:?}", vm_uid, rejected);
            }
        }
        verdict
    }

    /// Marks the VM as migrating in the given direction and requests MIPS for it.
    pub fn allocate_pes_for_migrating_vm(
        &mut self,
        vm_uid: &str,
        mips_share: &[f64],
        migration: Migration,
    ) -> AllocationVerdict {
        match migration {
            Migration::In => self.state.add_migrating_in(vm_uid),
            Migration::Out => self.state.add_migrating_out(vm_uid),
        }
        self.allocate_pes_for_vm(vm_uid, mips_share)
    }

    /// Releases MIPS of the VM and re-allocates all remaining VMs from their requests.
    ///
    /// Returns false if the VM is not known to the scheduler.
    pub fn deallocate_pes_for_vm(&mut self, vm_uid: &str) -> bool {
        if self.state.remove_request(vm_uid).is_none() {
            return false;
        }
        self.state.remove_migrating_in(vm_uid);
        self.state.remove_migrating_out(vm_uid);
        self.reallocate_all();
        true
    }

    /// Releases MIPS of all VMs.
    pub fn deallocate_pes_for_all_vms(&mut self) {
        self.state.reset();
    }

    fn reallocate_all(&mut self) {
        let requested = self.state.requested_mips_map().clone();
        self.state.clear_allocations();
        self.state.set_pes_in_use(0);
        self.state.set_available_mips(self.state.total_mips());
        for (vm_uid, mips_share) in requested.iter() {
            let verdict = self.policy.allocate_pes(&mut self.state, vm_uid, mips_share);
            if !verdict.is_success() {
                warn!("vm {} can't be re-allocated: {:?}", vm_uid, verdict);
            }
        }
    }

    // Migrations -----------------------------------------------------------------------------------------------------

    pub fn add_migrating_in(&mut self, vm_uid: &str) {
        self.state.add_migrating_in(vm_uid);
    }

    pub fn add_migrating_out(&mut self, vm_uid: &str) {
        self.state.add_migrating_out(vm_uid);
    }

    pub fn remove_migrating_in(&mut self, vm_uid: &str) -> bool {
        self.state.remove_migrating_in(vm_uid)
    }

    pub fn remove_migrating_out(&mut self, vm_uid: &str) -> bool {
        self.state.remove_migrating_out(vm_uid)
    }

    pub fn is_migrating_in(&self, vm_uid: &str) -> bool {
        self.state.is_migrating_in(vm_uid)
    }

    pub fn is_migrating_out(&self, vm_uid: &str) -> bool {
        self.state.is_migrating_out(vm_uid)
    }

    // Queries --------------------------------------------------------------------------------------------------------

    /// Returns MIPS currently allocated to the VM.
    pub fn allocated_mips_for_vm(&self, vm_uid: &str) -> Option<&MipsShare> {
        self.state.allocated_mips(vm_uid)
    }

    /// Returns summary MIPS currently allocated to the VM, or zero if the VM has no allocation.
    pub fn total_allocated_mips_for_vm(&self, vm_uid: &str) -> f64 {
        self.state.allocated_mips(vm_uid).map_or(0., |share| share.iter().sum())
    }

    /// Returns the last MIPS request of the VM.
    pub fn requested_mips_for_vm(&self, vm_uid: &str) -> Option<&MipsShare> {
        self.state.requested_mips(vm_uid)
    }

    pub fn total_allocated_mips(&self) -> f64 {
        self.state.total_allocated_mips()
    }

    pub fn available_mips(&self) -> f64 {
        self.state.available_mips()
    }

    pub fn pes_in_use(&self) -> usize {
        self.state.pes_in_use()
    }

    pub fn pe_capacity(&self) -> f64 {
        self.state.pe_capacity()
    }

    pub fn total_mips(&self) -> f64 {
        self.state.total_mips()
    }

    /// Returns true if the VMs together request more MIPS than the host provides.
    pub fn is_oversubscribed(&self) -> bool {
        self.state.total_visible_demand() > self.state.total_mips()
    }

    /// Returns uids of all VMs known to the scheduler in the order of their requests.
    pub fn vm_uids(&self) -> impl Iterator<Item = &str> {
        self.state.requested_mips_map().keys().map(|uid| uid.as_str())
    }
}

impl VmScheduler<TimeSharedOverSubscription> {
    /// Recomputes allocations of all VMs by scaling their requests to the host capacity.
    pub fn redistribute(&mut self) {
        self.policy.redistribute(&mut self.state);
    }
}
