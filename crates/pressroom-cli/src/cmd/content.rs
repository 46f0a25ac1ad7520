use crate::output::{or_dash, print_json, print_table, short_id};
use anyhow::Context;
use chrono::{DateTime, Utc};
use clap::Subcommand;
use pressroom_core::{
    access::Actor,
    content::ContentEntity,
    store::{NewContent, Store},
    types::{ContentKind, ContentStatus},
};
use std::path::Path;
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Subcommand definition
// ---------------------------------------------------------------------------

#[derive(Subcommand)]
pub enum ContentSubcommand {
    /// Create a new DRAFT entity
    Create {
        /// Display name
        name: String,
        /// Entity kind: PRODUCT or POST
        #[arg(long)]
        kind: String,
        /// Owning brand (defaults to the actor's brand)
        #[arg(long)]
        brand: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        category: Option<String>,
        /// Unit price; PRODUCT entities need one before publish
        #[arg(long)]
        price: Option<f64>,
        /// Image reference; PRODUCT entities need one before publish
        #[arg(long)]
        image: Option<String>,
        #[arg(long)]
        stock: Option<i64>,
    },

    /// List entities visible to the actor's brand
    List,

    /// Show one entity
    Show { id: Uuid },

    /// Move DRAFT to SCHEDULED for a future instant
    Schedule {
        id: Uuid,
        /// Publication instant, RFC 3339 (e.g. 2026-09-01T09:00:00Z)
        #[arg(long)]
        at: String,
    },

    /// Move SCHEDULED to READY_TO_PUBLISH, recording the reviewer
    Approve { id: Uuid },

    /// Move READY_TO_PUBLISH to PUBLISHED
    Publish { id: Uuid },

    /// Archive an entity
    Archive { id: Uuid },

    /// Pull a PUBLISHED entity back to DRAFT (privileged)
    Unpublish { id: Uuid },

    /// Apply one status to many entities, reporting per-item outcomes
    BulkStatus {
        /// Target status: PUBLISHED or ARCHIVED
        #[arg(long)]
        status: String,
        /// Entity ids
        ids: Vec<Uuid>,
    },
}

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

pub fn run(
    root: &Path,
    actor: &Actor,
    subcommand: ContentSubcommand,
    json: bool,
) -> anyhow::Result<()> {
    let store = Store::open(root).context("failed to open state store")?;
    match subcommand {
        ContentSubcommand::Create {
            name,
            kind,
            brand,
            description,
            category,
            price,
            image,
            stock,
        } => {
            let kind: ContentKind = kind.parse()?;
            let entity = store.create_content(
                actor,
                NewContent {
                    kind,
                    name,
                    brand,
                    description,
                    category,
                    price,
                    image,
                    stock,
                },
            )?;
            if json {
                print_json(&entity)?;
            } else {
                println!("created {} ({})", entity.name, entity.id);
            }
            Ok(())
        }
        ContentSubcommand::List => run_list(&store, actor, json),
        ContentSubcommand::Show { id } => {
            let entity = store.get_content(actor, id)?;
            show_entity(&entity, json)
        }
        ContentSubcommand::Schedule { id, at } => {
            let at: DateTime<Utc> = at
                .parse()
                .with_context(|| format!("invalid RFC 3339 instant: {at}"))?;
            transition(store.schedule_content(actor, id, at)?, json)
        }
        ContentSubcommand::Approve { id } => transition(store.approve_content(actor, id)?, json),
        ContentSubcommand::Publish { id } => transition(
            store.change_content_status(actor, id, ContentStatus::Published)?,
            json,
        ),
        ContentSubcommand::Archive { id } => transition(
            store.change_content_status(actor, id, ContentStatus::Archived)?,
            json,
        ),
        ContentSubcommand::Unpublish { id } => {
            transition(store.unpublish_content(actor, id)?, json)
        }
        ContentSubcommand::BulkStatus { status, ids } => {
            let status: ContentStatus = status.parse()?;
            let outcome = store.bulk_change_status(actor, &ids, status)?;
            if json {
                print_json(&outcome)?;
            } else {
                for item in &outcome.results {
                    let mark = if item.ok { "ok  " } else { "FAIL" };
                    println!("{mark}  {}  {}", item.id, item.message);
                }
                println!("{} succeeded, {} failed", outcome.succeeded, outcome.failed);
            }
            Ok(())
        }
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn run_list(store: &Store, actor: &Actor, json: bool) -> anyhow::Result<()> {
    let entities = store.list_content(actor)?;
    if json {
        print_json(&entities)?;
        return Ok(());
    }
    let rows = entities
        .iter()
        .map(|e| {
            vec![
                short_id(&e.id),
                e.name.clone(),
                e.kind.to_string(),
                e.brand.clone(),
                e.effective_status().to_string(),
                e.updated_at.format("%Y-%m-%d %H:%M").to_string(),
            ]
        })
        .collect();
    print_table(&["ID", "NAME", "KIND", "BRAND", "STATUS", "UPDATED"], rows);
    Ok(())
}

fn show_entity(entity: &ContentEntity, json: bool) -> anyhow::Result<()> {
    if json {
        return print_json(entity);
    }
    println!("id:        {}", entity.id);
    println!("name:      {}", entity.name);
    println!("kind:      {}", entity.kind);
    println!("brand:     {}", entity.brand);
    println!("status:    {}", entity.effective_status());
    println!("category:  {}", or_dash(&entity.category));
    println!("price:     {}", or_dash(&entity.price));
    println!("priority:  {}", entity.priority);
    println!("featured:  {}", entity.featured);
    println!("scheduled: {}", or_dash(&entity.scheduled_at));
    println!("approved:  {}", or_dash(&entity.approved_by));
    println!("version:   {}", entity.version);
    Ok(())
}

fn transition((entity, message): (ContentEntity, String), json: bool) -> anyhow::Result<()> {
    if json {
        print_json(&serde_json::json!({ "entity": entity, "message": message }))?;
    } else {
        println!("{message}");
    }
    Ok(())
}
