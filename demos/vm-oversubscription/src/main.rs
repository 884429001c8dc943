use clap::Parser;
use log::{info, warn};
use serde::Deserialize;

use dslab_vm_scheduler::common::MipsShare;
use dslab_vm_scheduler::config::{AllocationPolicyKind, RawSchedulerConfig, SchedulerConfig};
use dslab_vm_scheduler::policy::{MipsAllocationPolicy, TimeShared, TimeSharedOverSubscription};
use dslab_vm_scheduler::scheduler::{Migration, VmScheduler};

fn init_logger() {
    use env_logger::Builder;
    use std::io::Write;
    Builder::from_default_env()
        .format(|buf, record| writeln!(buf, "{}", record.args()))
        .init();
}

#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Args {
    /// Path to scenario config
    #[clap(short, long, default_value = "scenario.yaml")]
    config: String,
}

#[derive(Debug, Deserialize)]
struct VmRequest {
    vm: String,
    mips: MipsShare,
}

#[derive(Debug, Deserialize)]
struct VmRef {
    vm: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
enum Step {
    Allocate(VmRequest),
    MigrateIn(VmRequest),
    MigrateOut(VmRequest),
    Deallocate(VmRef),
    Redistribute,
}

#[derive(Debug, Deserialize)]
struct Scenario {
    host: RawSchedulerConfig,
    steps: Vec<Step>,
}

fn run_scenario<P: MipsAllocationPolicy>(
    mut scheduler: VmScheduler<P>,
    steps: &[Step],
    redistribute: fn(&mut VmScheduler<P>),
) {
    for (i, step) in steps.iter().enumerate() {
        info!("step {}: {:?}", i, step);
        match step {
            Step::Allocate(req) => {
                let verdict = scheduler.allocate_pes_for_vm(&req.vm, &req.mips);
                info!("  {:?}", verdict);
            }
            Step::MigrateIn(req) => {
                let verdict = scheduler.allocate_pes_for_migrating_vm(&req.vm, &req.mips, Migration::In);
                info!("  {:?}", verdict);
            }
            Step::MigrateOut(req) => {
                let verdict = scheduler.allocate_pes_for_migrating_vm(&req.vm, &req.mips, Migration::Out);
                info!("  {:?}", verdict);
            }
            Step::Deallocate(vm) => {
                if !scheduler.deallocate_pes_for_vm(&vm.vm) {
                    warn!("  vm {} is not placed on the host", vm.vm);
                }
            }
            Step::Redistribute => redistribute(&mut scheduler),
        }
        for vm_uid in scheduler.vm_uids() {
            info!(
                "  {:<6} requested {:?}, allocated {:?}",
                vm_uid,
                scheduler.requested_mips_for_vm(vm_uid).unwrap(),
                scheduler.allocated_mips_for_vm(vm_uid)
            );
        }
        info!(
            "  allocated {} of {} MIPS, available {}, oversubscribed: {}",
            scheduler.total_allocated_mips(),
            scheduler.total_mips(),
            scheduler.available_mips(),
            scheduler.is_oversubscribed()
        );
    }

    println!("{}", serde_yaml::to_string(scheduler.state()).unwrap());
}

fn main() {
    init_logger();
    let args = Args::parse();

    let scenario: Scenario = serde_yaml::from_str(
        &std::fs::read_to_string(&args.config).unwrap_or_else(|_| panic!("Can't read file {}", args.config)),
    )
    .unwrap_or_else(|e| panic!("Can't parse scenario from file {}: {}", args.config, e));
    let host = SchedulerConfig::from(scenario.host);

    match host.policy {
        AllocationPolicyKind::TimeShared => run_scenario(
            VmScheduler::new(host.pe_list(), TimeShared::new()),
            &scenario.steps,
            |_| warn!("  redistribution is not supported by time-shared policy"),
        ),
        AllocationPolicyKind::TimeSharedOverSubscription => run_scenario(
            VmScheduler::new(host.pe_list(), TimeSharedOverSubscription::new()),
            &scenario.steps,
            |scheduler| scheduler.redistribute(),
        ),
    }
}
