//! The tick loop (§4.9): retire, DRAM-rate scheduling, then fetch, run to
//! completion and rendered as the final stats report.

use crate::corestate::CoreState;
use crate::error::CliError;
use std::path::{Path, PathBuf};
use usimm_config::Ticks;
use usimm_core::{scheduler_by_name, Controller, Operation, ReadEnqueueOutcome, WriteEnqueueOutcome};
use usimm_rob::BIG;
use usimm_trace::{MemOp, PrefixAssigner, TraceError, TraceReader};

/// Fixed read-queue-hit latency, not a configuration token (the write-queue
/// equivalent, `WQ_LOOKUP_LATENCY`, is one).
const RQ_LOOKUP_LATENCY: Ticks = Ticks::new(1);

/// Opens every trace file and assigns its `MT<k>` address-prefix group,
/// failing fast (in argument order) if any file is missing or a trace
/// named `MT<k>`, k>0, has no preceding `MT0`.
fn open_cores(trace_paths: &[PathBuf], rob_size: usize) -> Result<Vec<CoreState>, CliError> {
    let mut assigner = PrefixAssigner::new();
    let mut cores = Vec::with_capacity(trace_paths.len());
    for path in trace_paths {
        let reader = TraceReader::open(path)?;
        let prefix = match assigner.assign(path) {
            Ok(prefix) => prefix,
            Err(TraceError::Mt0Absent { path }) => return Err(CliError::Mt0Absent { path }),
            Err(other) => return Err(CliError::from(other)),
        };
        cores.push(CoreState::new(reader, prefix, rob_size));
    }
    Ok(cores)
}

/// Runs the full simulation for `config_path` (optionally overridden by a
/// second, chip-electrical `vi_path`, §6) against `trace_paths`, then
/// renders the end-of-run stats report.
pub fn run(config_path: &Path, vi_path: Option<&Path>, trace_paths: &[PathBuf]) -> Result<String, CliError> {
    let cfg = usimm_config::load(config_path, vi_path)?;
    let num_cores = trace_paths.len();

    let width_sum = cfg.address_width_sum(num_cores);
    if width_sum != cfg.address_bits {
        return Err(CliError::from(usimm_config::ConfigError::AddressWidthMismatch {
            sum: width_sum,
            expected: cfg.address_bits,
        }));
    }

    let mut cores = open_cores(trace_paths, cfg.rob_size)?;

    let mut ctl = Controller::new(&cfg, num_cores);
    let mut scheduler = scheduler_by_name(&cfg.scheduler, cfg.num_channels, num_cores)
        .unwrap_or_else(|| scheduler_by_name("fcfs", cfg.num_channels, num_cores).expect("fcfs always resolves"));
    scheduler.init(&cfg);

    // Row augmentation per §4.1 puts each trace's prefix in the top bits
    // of the (un-augmented) configured address space.
    let prefix_shift = cfg.address_bits;

    loop {
        for core in &mut cores {
            core.rob.retire_ready(ctl.cycle, cfg.max_retire);
        }

        if ctl.cycle.get() % cfg.processor_clk_multiplier == 0 {
            ctl.begin_dram_tick();
            ctl.refresh_update();
            for channel in 0..cfg.num_channels {
                ctl.update_queue_commands(channel);
                scheduler.schedule(&mut ctl, channel);
                for (thread_id, slot, completion, op) in ctl.cleanup(channel) {
                    if op == Operation::Read {
                        cores[thread_id].rob.set_completion(slot, completion);
                    }
                }
            }
            ctl.accumulate_power_occupancy();
        }

        fetch_phase(&cfg, &mut ctl, &mut cores, prefix_shift)?;

        for core in &mut cores {
            if core.time_done.is_none() && core.finished() {
                core.time_done = Some(ctl.cycle);
            }
        }

        ctl.cycle += Ticks::new(1);

        if cores.iter().all(CoreState::finished) && (0..cfg.num_channels).all(|c| ctl.channels[c].queues.write_len() == 0)
        {
            break;
        }
    }

    let final_cycle = ctl.cycle;
    let active_core_fractions = active_core_fractions(&mut cores, final_cycle);

    Ok(usimm_stats::format_report(&cfg, &ctl, &cfg.scheduler, &scheduler.report_stats(), &active_core_fractions))
}

/// One fetch pass across every core, gated by a single shared (cross-channel,
/// cross-core) write-queue-full flag that stalls every core's fetch loop at
/// once (§4.9).
fn fetch_phase(
    cfg: &usimm_config::SimConfig,
    ctl: &mut Controller,
    cores: &mut [CoreState],
    prefix_shift: u32,
) -> Result<(), CliError> {
    let mut writeqfull = write_queue_full(ctl, cfg);

    for thread_id in 0..cores.len() {
        if cores[thread_id].trace_done {
            continue;
        }

        let mut fetched = 0;
        while fetched < cfg.max_fetch && !cores[thread_id].rob.is_full() && !writeqfull {
            if cores[thread_id].pending.is_none() {
                match cores[thread_id].reader.next() {
                    None => {
                        cores[thread_id].trace_done = true;
                        break;
                    }
                    Some(Err(err)) => return Err(CliError::from(err)),
                    Some(Ok(record)) => {
                        let remaining = record.nonmemops;
                        cores[thread_id].pending = Some((record, remaining));
                    }
                }
            }

            let (record, remaining) = cores[thread_id].pending.expect("just ensured pending is set");

            if remaining > 0 {
                let completion = ctl.cycle + cfg.pipeline_depth;
                cores[thread_id].rob.push(completion).expect("loop guard checked not full");
                cores[thread_id].pending = Some((record, remaining - 1));
                fetched += 1;
                continue;
            }

            match record.op {
                None => {
                    cores[thread_id].pending = None;
                }
                Some(MemOp::Read { address, pc }) => {
                    fetch_read(cfg, ctl, &mut cores[thread_id], thread_id, address, pc, prefix_shift);
                }
                Some(MemOp::Write { address }) => {
                    fetch_write(ctl, &mut cores[thread_id], thread_id, address, prefix_shift, cfg.pipeline_depth);
                }
            }
            fetched += 1;
            writeqfull = write_queue_full(ctl, cfg);
        }
    }

    Ok(())
}

fn write_queue_full(ctl: &Controller, cfg: &usimm_config::SimConfig) -> bool {
    (0..cfg.num_channels).any(|c| ctl.channels[c].queues.write_len() >= cfg.wq_capacity)
}

fn fetch_read(
    cfg: &usimm_config::SimConfig,
    ctl: &mut Controller,
    core: &mut CoreState,
    thread_id: usize,
    address: u64,
    pc: u64,
    prefix_shift: u32,
) {
    let tagged = address | (core.prefix.0 << prefix_shift);
    let channel = ctl.decode(tagged).channel;
    let slot = core.rob.push(BIG).expect("loop guard checked not full");
    let outcome = ctl.enqueue_read(channel, tagged, ctl.cycle, thread_id, slot, pc);
    match outcome {
        ReadEnqueueOutcome::WriteQueueHit => {
            core.rob.set_completion(slot, ctl.cycle + cfg.wq_lookup_latency + cfg.pipeline_depth);
        }
        ReadEnqueueOutcome::ReadQueueHit => {
            core.rob.set_completion(slot, ctl.cycle + RQ_LOOKUP_LATENCY + cfg.pipeline_depth);
        }
        ReadEnqueueOutcome::Enqueued => {}
    }
    core.pending = None;
}

fn fetch_write(
    ctl: &mut Controller,
    core: &mut CoreState,
    thread_id: usize,
    address: u64,
    prefix_shift: u32,
    pipeline_depth: Ticks,
) {
    let tagged = address | (core.prefix.0 << prefix_shift);
    let channel = ctl.decode(tagged).channel;
    let completion = ctl.cycle + pipeline_depth;
    let slot = core.rob.push(completion).expect("loop guard checked not full");
    // Writes are posted: the ROB entry above is final regardless of
    // outcome. The fetch loop only reaches a write once `writeqfull` is
    // known false for every channel, so this channel has spare write-queue
    // capacity and `QueueFull` cannot occur.
    match ctl.enqueue_write(channel, tagged, ctl.cycle, thread_id, slot) {
        WriteEnqueueOutcome::Enqueued | WriteEnqueueOutcome::Coalesced => {}
        WriteEnqueueOutcome::QueueFull => {
            unreachable!("fetch is gated on writeqfull before reaching a write")
        }
    }
    core.pending = None;
}

/// For each core, the fraction of the run's total cycles it was active
/// (§4.9, §4.8): `time_done[core] / final_cycle`. The last core to finish
/// has its `time_done` folded up to `final_cycle` first, crediting it with
/// the tail spent draining other cores' write queues.
fn active_core_fractions(cores: &mut [CoreState], final_cycle: Ticks) -> Vec<f64> {
    if let Some((max_idx, _)) =
        cores.iter().enumerate().max_by_key(|(_, core)| core.time_done.unwrap_or(Ticks::ZERO))
    {
        cores[max_idx].time_done = Some(final_cycle);
    }

    let denom = final_cycle.get().max(1) as f64;
    cores.iter().map(|core| core.time_done.unwrap_or(final_cycle).get() as f64 / denom).collect()
}
