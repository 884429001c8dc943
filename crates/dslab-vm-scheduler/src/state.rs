//! Allocation state of a host shared by MIPS allocation policies.

use indexmap::{IndexMap, IndexSet};
use serde::Serialize;

use crate::common::MipsShare;
use crate::pe::PeList;

/// Fraction of requested MIPS which a VM keeps on the source host while migrating out.
pub const MIGRATION_OUT_PENALTY_FACTOR: f64 = 0.9;
/// Fraction of requested MIPS of a migrating VM which is experienced by the destination host.
pub const MIGRATION_IN_VISIBILITY_FACTOR: f64 = 0.1;

/// Stores host PEs and the current MIPS allocation of VMs placed on the host.
///
/// Both allocation tables are keyed by VM uid and keep the order in which VMs were first added,
/// so that all traversals (and thus rounding and logging) are deterministic.
#[derive(Clone, Debug, Serialize)]
pub struct AllocationState {
    pe_list: PeList,
    mips_map_requested: IndexMap<String, MipsShare>,
    mips_map: IndexMap<String, MipsShare>,
    available_mips: f64,
    pes_in_use: usize,
    migrating_in: IndexSet<String>,
    migrating_out: IndexSet<String>,
}

impl AllocationState {
    /// Creates empty state with all PE capacity available.
    pub fn new(pe_list: PeList) -> Self {
        let available_mips = pe_list.total_mips();
        Self {
            pe_list,
            mips_map_requested: IndexMap::new(),
            mips_map: IndexMap::new(),
            available_mips,
            pes_in_use: 0,
            migrating_in: IndexSet::new(),
            migrating_out: IndexSet::new(),
        }
    }

    pub fn pe_list(&self) -> &PeList {
        &self.pe_list
    }

    /// Capacity of a single physical PE.
    pub fn pe_capacity(&self) -> f64 {
        self.pe_list.pe_capacity()
    }

    /// Total physical capacity, always computed from the PE list.
    pub fn total_mips(&self) -> f64 {
        self.pe_list.total_mips()
    }

    pub fn available_mips(&self) -> f64 {
        self.available_mips
    }

    pub fn set_available_mips(&mut self, available_mips: f64) {
        self.available_mips = available_mips;
    }

    pub fn pes_in_use(&self) -> usize {
        self.pes_in_use
    }

    pub fn set_pes_in_use(&mut self, pes_in_use: usize) {
        self.pes_in_use = pes_in_use;
    }

    // Requested MIPS -------------------------------------------------------------------------------------------------

    pub fn requested_mips_map(&self) -> &IndexMap<String, MipsShare> {
        &self.mips_map_requested
    }

    pub fn requested_mips(&self, vm_uid: &str) -> Option<&MipsShare> {
        self.mips_map_requested.get(vm_uid)
    }

    /// Replaces the requested share of the VM and accounts its virtual PEs as used.
    pub fn record_request(&mut self, vm_uid: &str, mips_share: &[f64]) {
        self.mips_map_requested.insert(vm_uid.to_string(), mips_share.to_vec());
        self.pes_in_use += mips_share.len();
    }

    pub fn remove_request(&mut self, vm_uid: &str) -> Option<MipsShare> {
        self.mips_map_requested.shift_remove(vm_uid)
    }

    // Allocated MIPS -------------------------------------------------------------------------------------------------

    pub fn mips_map(&self) -> &IndexMap<String, MipsShare> {
        &self.mips_map
    }

    pub fn allocated_mips(&self, vm_uid: &str) -> Option<&MipsShare> {
        self.mips_map.get(vm_uid)
    }

    pub fn set_allocation(&mut self, vm_uid: &str, mips_share: MipsShare) {
        self.mips_map.insert(vm_uid.to_string(), mips_share);
    }

    pub fn clear_allocations(&mut self) {
        self.mips_map.clear();
    }

    /// Drops both tables and migration flags and makes all capacity available again.
    pub fn reset(&mut self) {
        self.mips_map_requested.clear();
        self.mips_map.clear();
        self.migrating_in.clear();
        self.migrating_out.clear();
        self.available_mips = self.total_mips();
        self.pes_in_use = 0;
    }

    // Migrations -----------------------------------------------------------------------------------------------------

    pub fn is_migrating_in(&self, vm_uid: &str) -> bool {
        self.migrating_in.contains(vm_uid)
    }

    pub fn is_migrating_out(&self, vm_uid: &str) -> bool {
        self.migrating_out.contains(vm_uid)
    }

    pub fn add_migrating_in(&mut self, vm_uid: &str) {
        self.migrating_in.insert(vm_uid.to_string());
    }

    pub fn add_migrating_out(&mut self, vm_uid: &str) {
        self.migrating_out.insert(vm_uid.to_string());
    }

    pub fn remove_migrating_in(&mut self, vm_uid: &str) -> bool {
        self.migrating_in.shift_remove(vm_uid)
    }

    pub fn remove_migrating_out(&mut self, vm_uid: &str) -> bool {
        self.migrating_out.shift_remove(vm_uid)
    }

    /// Multiplier applied to each requested entry of the VM when computing its allocation.
    ///
    /// Migrating out takes precedence if the VM is (incorrectly) flagged in both directions.
    pub fn migration_multiplier(&self, vm_uid: &str) -> f64 {
        if self.is_migrating_out(vm_uid) {
            MIGRATION_OUT_PENALTY_FACTOR
        } else if self.is_migrating_in(vm_uid) {
            MIGRATION_IN_VISIBILITY_FACTOR
        } else {
            1.
        }
    }

    /// Total demand of the VM as experienced by this host.
    ///
    /// Only a fraction of a migrating in VM load is visible on the destination host.
    pub fn visible_demand(&self, vm_uid: &str, mips_share: &[f64]) -> f64 {
        let total: f64 = mips_share.iter().sum();
        if self.is_migrating_in(vm_uid) {
            total * MIGRATION_IN_VISIBILITY_FACTOR
        } else {
            total
        }
    }

    /// Summary visible demand of all VMs in the requested table.
    pub fn total_visible_demand(&self) -> f64 {
        self.mips_map_requested
            .iter()
            .map(|(vm_uid, share)| self.visible_demand(vm_uid, share))
            .sum()
    }

    /// Summary MIPS currently allocated to all VMs.
    pub fn total_allocated_mips(&self) -> f64 {
        self.mips_map.values().flatten().sum()
    }
}
