use crate::output::{or_dash, print_json, print_table, short_id};
use anyhow::Context;
use chrono::NaiveDate;
use clap::Subcommand;
use pressroom_core::{
    access::Actor,
    keyword,
    schedule::NewSchedule,
    store::Store,
    types::{PublishMode, ScheduleMode, ScheduleStatus},
};
use std::path::Path;
use uuid::Uuid;

#[derive(Subcommand)]
pub enum ScheduleSubcommand {
    /// Create an ACTIVE production schedule
    Create {
        /// Display name
        name: String,
        /// Production mode: BLOG or PRODUCT
        #[arg(long)]
        mode: String,
        /// Pieces produced per day
        #[arg(long = "per-day")]
        production_per_day: u32,
        /// First production day, YYYY-MM-DD
        #[arg(long)]
        start: String,
        /// Optional last production day, YYYY-MM-DD
        #[arg(long)]
        end: Option<String>,
        /// AUTO_PUBLISH, DRAFT_ONLY, or QC_REQUIRED
        #[arg(long = "publish-mode")]
        publish_mode: String,
        /// Daily window start, HH:MM
        #[arg(long = "window-start", default_value = "09:00")]
        window_start: String,
        /// Daily window end, HH:MM
        #[arg(long = "window-end", default_value = "17:00")]
        window_end: String,
        /// Owning brand (defaults to the actor's brand)
        #[arg(long)]
        brand: Option<String>,
    },

    /// List all schedules
    List,

    /// Show one schedule with its keyword queue summary
    Show { id: Uuid },

    /// Pause a schedule; its keywords stop being claimable
    Pause { id: Uuid },

    /// Resume a paused schedule
    Resume { id: Uuid },
}

pub fn run(
    root: &Path,
    actor: &Actor,
    subcommand: ScheduleSubcommand,
    json: bool,
) -> anyhow::Result<()> {
    let store = Store::open(root).context("failed to open state store")?;
    match subcommand {
        ScheduleSubcommand::Create {
            name,
            mode,
            production_per_day,
            start,
            end,
            publish_mode,
            window_start,
            window_end,
            brand,
        } => {
            let mode: ScheduleMode = mode.parse()?;
            let publish_mode: PublishMode = publish_mode.parse()?;
            let start_date = parse_date(&start)?;
            let end_date = end.as_deref().map(parse_date).transpose()?;
            let schedule = store.create_schedule(
                actor,
                brand,
                NewSchedule {
                    name,
                    mode,
                    production_per_day,
                    start_date,
                    end_date,
                    publish_mode,
                    time_window_start: window_start,
                    time_window_end: window_end,
                },
            )?;
            if json {
                print_json(&schedule)?;
            } else {
                println!("created {} ({})", schedule.name, schedule.id);
            }
            Ok(())
        }
        ScheduleSubcommand::List => run_list(&store, json),
        ScheduleSubcommand::Show { id } => run_show(&store, id, json),
        ScheduleSubcommand::Pause { id } => {
            let schedule = store.set_schedule_status(actor, id, ScheduleStatus::Paused)?;
            if json {
                print_json(&schedule)?;
            } else {
                println!("{} is now {}", schedule.name, schedule.status);
            }
            Ok(())
        }
        ScheduleSubcommand::Resume { id } => {
            let schedule = store.set_schedule_status(actor, id, ScheduleStatus::Active)?;
            if json {
                print_json(&schedule)?;
            } else {
                println!("{} is now {}", schedule.name, schedule.status);
            }
            Ok(())
        }
    }
}

fn parse_date(s: &str) -> anyhow::Result<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").with_context(|| format!("invalid date: {s}"))
}

fn run_list(store: &Store, json: bool) -> anyhow::Result<()> {
    let schedules = store.list_schedules()?;
    if json {
        print_json(&schedules)?;
        return Ok(());
    }
    let rows = schedules
        .iter()
        .map(|s| {
            vec![
                short_id(&s.id),
                s.name.clone(),
                s.brand.clone(),
                s.mode.to_string(),
                s.status.to_string(),
                format!("{}/day", s.production_per_day),
                s.publish_mode.to_string(),
            ]
        })
        .collect();
    print_table(
        &["ID", "NAME", "BRAND", "MODE", "STATUS", "RATE", "PUBLISH"],
        rows,
    );
    Ok(())
}

fn run_show(store: &Store, id: Uuid, json: bool) -> anyhow::Result<()> {
    let schedule = store.get_schedule(id)?;
    let keywords = store.list_keywords(id)?;
    let summary = keyword::summarize(&keywords);

    if json {
        return print_json(&serde_json::json!({
            "schedule": schedule,
            "keyword_summary": summary,
        }));
    }
    println!("id:           {}", schedule.id);
    println!("name:         {}", schedule.name);
    println!("brand:        {}", schedule.brand);
    println!("mode:         {}", schedule.mode);
    println!("status:       {}", schedule.status);
    println!("rate:         {}/day", schedule.production_per_day);
    println!("start:        {}", schedule.start_date);
    println!("end:          {}", or_dash(&schedule.end_date));
    println!("publish mode: {}", schedule.publish_mode);
    println!(
        "window:       {}-{}",
        schedule.time_window_start, schedule.time_window_end
    );
    println!(
        "keywords:     {} pending, {} processing, {} done, {} failed",
        summary.pending, summary.processing, summary.done, summary.failed
    );
    Ok(())
}
