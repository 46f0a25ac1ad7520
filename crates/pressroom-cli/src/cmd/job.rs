use crate::output::{or_dash, print_json, print_table, short_id};
use anyhow::Context;
use chrono::{DateTime, Utc};
use clap::Subcommand;
use pressroom_core::{
    access::Actor,
    job::JobPatch,
    store::{NewJob, Store},
    types::JobStatus,
};
use std::path::Path;
use uuid::Uuid;

#[derive(Subcommand)]
pub enum JobSubcommand {
    /// Create a SCHEDULED job for an engine
    Create {
        /// Engine name
        engine: String,
        #[arg(long = "batch-size", default_value = "5")]
        batch_size: u32,
        /// Owning schedule
        #[arg(long = "schedule-id")]
        schedule_id: Option<Uuid>,
        /// Planned start, RFC 3339
        #[arg(long)]
        at: Option<String>,
    },

    /// List jobs, newest first
    List,

    /// Show one job
    Show { id: Uuid },

    /// Move a job to PAUSED
    Pause { id: Uuid },

    /// Move a PAUSED job back to RUNNING
    Resume { id: Uuid },

    /// Cancel a job; a held run guard is released
    Cancel { id: Uuid },

    /// Edit a job's planned start or batch size
    Update {
        id: Uuid,
        /// Planned start, RFC 3339
        #[arg(long)]
        at: Option<String>,
        #[arg(long = "batch-size")]
        batch_size: Option<u32>,
    },

    /// Hard-delete a job (refused while RUNNING)
    Delete { id: Uuid },
}

pub fn run(
    root: &Path,
    actor: &Actor,
    subcommand: JobSubcommand,
    json: bool,
) -> anyhow::Result<()> {
    let store = Store::open(root).context("failed to open state store")?;
    match subcommand {
        JobSubcommand::Create {
            engine,
            batch_size,
            schedule_id,
            at,
        } => {
            let scheduled_for = parse_instant(at.as_deref())?;
            let job = store.create_job(
                actor,
                NewJob {
                    engine,
                    schedule_id,
                    scheduled_for,
                    batch_size,
                },
            )?;
            if json {
                print_json(&job)?;
            } else {
                println!("created job {} for engine {}", job.id, job.engine);
            }
            Ok(())
        }
        JobSubcommand::List => run_list(&store, json),
        JobSubcommand::Show { id } => {
            let job = store.get_job(id)?;
            if json {
                print_json(&job)?;
            } else {
                println!("id:         {}", job.id);
                println!("engine:     {}", job.engine);
                println!("status:     {}", job.status);
                println!("batch size: {}", job.batch_size);
                println!("scheduled:  {}", or_dash(&job.scheduled_for));
                println!("started:    {}", or_dash(&job.started_at));
                println!("finished:   {}", or_dash(&job.finished_at));
                println!("last error: {}", or_dash(&job.last_error));
            }
            Ok(())
        }
        JobSubcommand::Pause { id } => transition(&store, actor, id, JobStatus::Paused, json),
        JobSubcommand::Resume { id } => transition(&store, actor, id, JobStatus::Running, json),
        JobSubcommand::Cancel { id } => transition(&store, actor, id, JobStatus::Cancelled, json),
        JobSubcommand::Update {
            id,
            at,
            batch_size,
        } => {
            let scheduled_for = parse_instant(at.as_deref())?;
            let job = store.update_job(
                actor,
                id,
                JobPatch {
                    scheduled_for,
                    batch_size,
                },
            )?;
            if json {
                print_json(&job)?;
            } else {
                println!("updated job {}", job.id);
            }
            Ok(())
        }
        JobSubcommand::Delete { id } => {
            store.delete_job(actor, id)?;
            if json {
                print_json(&serde_json::json!({ "deleted": id }))?;
            } else {
                println!("deleted {id}");
            }
            Ok(())
        }
    }
}

fn parse_instant(at: Option<&str>) -> anyhow::Result<Option<DateTime<Utc>>> {
    at.map(|s| {
        s.parse()
            .with_context(|| format!("invalid RFC 3339 instant: {s}"))
    })
    .transpose()
}

fn transition(
    store: &Store,
    actor: &Actor,
    id: Uuid,
    to: JobStatus,
    json: bool,
) -> anyhow::Result<()> {
    let job = store.transition_job(actor, id, to)?;
    if json {
        print_json(&job)?;
    } else {
        println!("job {} is now {}", job.id, job.status);
    }
    Ok(())
}

fn run_list(store: &Store, json: bool) -> anyhow::Result<()> {
    let jobs = store.list_jobs()?;
    if json {
        print_json(&jobs)?;
        return Ok(());
    }
    let rows = jobs
        .iter()
        .map(|j| {
            vec![
                short_id(&j.id),
                j.engine.clone(),
                j.status.to_string(),
                j.batch_size.to_string(),
                or_dash(&j.scheduled_for),
                or_dash(&j.last_error),
            ]
        })
        .collect();
    print_table(
        &["ID", "ENGINE", "STATUS", "BATCH", "SCHEDULED", "LAST ERROR"],
        rows,
    );
    Ok(())
}
