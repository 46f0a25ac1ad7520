use crate::output::print_json;
use anyhow::Context;
use clap::Subcommand;
use pressroom_core::{access::Actor, config::Config, store::Store};
use std::path::Path;

#[derive(Subcommand)]
pub enum EngineSubcommand {
    /// Show liveness, uptime, queue depth, and run state for an engine
    Status { engine: String },

    /// Set the pause flag; a paused engine's claims all come back empty
    Pause { engine: String },

    /// Clear the pause flag
    Resume { engine: String },

    /// Record a heartbeat for an engine (worker convenience)
    Heartbeat { engine: String },
}

pub fn run(
    root: &Path,
    actor: &Actor,
    subcommand: EngineSubcommand,
    json: bool,
) -> anyhow::Result<()> {
    let store = Store::open(root).context("failed to open state store")?;
    let config = Config::load(root).unwrap_or_else(|_| Config::new("pressroom"));
    let timeout_ms = config.engine.heartbeat_timeout_ms;

    match subcommand {
        EngineSubcommand::Status { engine } => {
            let report = store.engine_status(&engine, timeout_ms)?;
            if json {
                return print_json(&report);
            }
            println!("engine:    {}", report.engine);
            println!("liveness:  {}", report.liveness);
            println!("uptime:    {}", report.uptime);
            println!("worker:    {}", report.worker);
            println!("paused:    {}", report.paused);
            println!("run state: {}", report.run_state);
            if let Some(job_id) = report.run_job_id {
                println!("run job:   {job_id}");
            }
            if let Some(note) = &report.run_note {
                println!("run note:  {note}");
            }
            println!(
                "queue:     {} pending, {} processing, {} failed, {} done today",
                report.queue.pending,
                report.queue.processing,
                report.queue.failed,
                report.queue.done_today
            );
            Ok(())
        }
        EngineSubcommand::Pause { engine } => {
            let flag = store.set_engine_paused(actor, &engine, true)?;
            if json {
                print_json(&flag)?;
            } else {
                println!("{engine} paused");
            }
            Ok(())
        }
        EngineSubcommand::Resume { engine } => {
            let flag = store.set_engine_paused(actor, &engine, false)?;
            if json {
                print_json(&flag)?;
            } else {
                println!("{engine} resumed");
            }
            Ok(())
        }
        EngineSubcommand::Heartbeat { engine } => {
            let beat = store.ingest_heartbeat(&engine, timeout_ms)?;
            if json {
                print_json(&beat)?;
            } else {
                println!("recorded beat for {engine} at {}", beat.last_beat_at);
            }
            Ok(())
        }
    }
}
