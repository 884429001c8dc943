//! Physical processing elements (PEs) of a host.

use log::warn;
use serde::{Deserialize, Serialize};

/// Physical processing element with a fixed capacity.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Pe {
    pub id: u32,
    /// Capacity in MIPS.
    pub mips: f64,
}

impl Pe {
    pub fn new(id: u32, mips: f64) -> Self {
        Self { id, mips }
    }
}

/// Ordered list of host PEs.
///
/// The schedulers assume that all PEs are identical, so the capacity of a single PE is taken from the first one.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct PeList {
    pes: Vec<Pe>,
}

impl PeList {
    pub fn new(pes: Vec<Pe>) -> Self {
        if let Some(first) = pes.first() {
            if pes.iter().any(|pe| pe.mips != first.mips) {
                warn!(
                    "PE list is heterogeneous, capacity of a single PE is taken from PE {} ({} MIPS)",
                    first.id, first.mips
                );
            }
        }
        Self { pes }
    }

    /// Creates a list of `count` identical PEs with sequential ids.
    pub fn homogeneous(count: u32, mips: f64) -> Self {
        Self::new((0..count).map(|id| Pe::new(id, mips)).collect())
    }

    pub fn pes(&self) -> &[Pe] {
        &self.pes
    }

    pub fn len(&self) -> usize {
        self.pes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pes.is_empty()
    }

    /// Returns the summary capacity of all PEs.
    pub fn total_mips(&self) -> f64 {
        self.pes.iter().map(|pe| pe.mips).sum()
    }

    /// Returns the capacity of a single PE, or zero for an empty list.
    pub fn pe_capacity(&self) -> f64 {
        self.pes.first().map_or(0., |pe| pe.mips)
    }
}
