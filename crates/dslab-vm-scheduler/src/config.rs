//! Host scheduler configuration.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::pe::{Pe, PeList};

/// Holds raw scheduler config parsed from YAML.
#[derive(Debug, Default, PartialEq, Serialize, Deserialize, Clone)]
pub struct RawSchedulerConfig {
    pub pes: Option<Vec<PeConfig>>,
    pub policy: Option<AllocationPolicyKind>,
}

/// Holds configuration of a single physical PE or a set of identical PEs.
#[derive(Debug, PartialEq, Serialize, Deserialize, Clone)]
pub struct PeConfig {
    /// PE capacity in MIPS.
    pub mips: f64,
    /// Number of such PEs.
    pub count: Option<u32>,
}

/// MIPS allocation policy used by the host scheduler.
#[derive(Debug, PartialEq, Eq, Serialize, Deserialize, Clone, Copy)]
pub enum AllocationPolicyKind {
    TimeShared,
    TimeSharedOverSubscription,
}

/// Represents host scheduler configuration.
#[derive(Debug, PartialEq, Serialize, Deserialize, Clone)]
pub struct SchedulerConfig {
    /// Configurations of host PEs.
    pub pes: Vec<PeConfig>,
    /// Used MIPS allocation policy.
    pub policy: AllocationPolicyKind,
}

impl SchedulerConfig {
    /// Creates scheduler config by reading parameter values from YAML file
    /// (uses default values if some parameters are absent).
    pub fn from_file(file_name: &str) -> Self {
        std::fs::read_to_string(file_name)
            .unwrap_or_else(|_| panic!("Can't read file {}", file_name))
            .parse()
            .unwrap_or_else(|e| panic!("Can't parse YAML from file {}: {}", file_name, e))
    }

    /// Builds the list of host PEs with sequential ids.
    pub fn pe_list(&self) -> PeList {
        let mut pes = Vec::new();
        for pe_config in &self.pes {
            for _ in 0..pe_config.count.unwrap_or(1) {
                pes.push(Pe::new(pes.len() as u32, pe_config.mips));
            }
        }
        PeList::new(pes)
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        RawSchedulerConfig::default().into()
    }
}

impl From<RawSchedulerConfig> for SchedulerConfig {
    fn from(raw: RawSchedulerConfig) -> Self {
        Self {
            pes: raw.pes.unwrap_or_else(|| {
                vec![PeConfig {
                    mips: 1000.,
                    count: Some(1),
                }]
            }),
            policy: raw.policy.unwrap_or(AllocationPolicyKind::TimeSharedOverSubscription),
        }
    }
}

impl FromStr for SchedulerConfig {
    type Err = serde_yaml::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw: RawSchedulerConfig = serde_yaml::from_str(s)?;
        Ok(raw.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config: SchedulerConfig = "policy: TimeShared".parse().unwrap();
        assert_eq!(config.policy, AllocationPolicyKind::TimeShared);
        assert_eq!(config.pe_list().total_mips(), 1000.);

        let config = SchedulerConfig::default();
        assert_eq!(config.policy, AllocationPolicyKind::TimeSharedOverSubscription);
        assert_eq!(config.pe_list().len(), 1);
    }

    #[test]
    fn test_pe_groups() {
        let yaml = "
pes:
  - mips: 500
    count: 3
  - mips: 500
";
        let config: SchedulerConfig = yaml.parse().unwrap();
        let pes = config.pe_list();
        assert_eq!(pes.len(), 4);
        assert_eq!(pes.pes()[3], Pe::new(3, 500.));
        assert_eq!(pes.total_mips(), 2000.);
    }

    #[test]
    fn test_unknown_policy() {
        assert!("policy: SpaceShared".parse::<SchedulerConfig>().is_err());
    }
}
