use crate::output::{or_dash, print_json, print_table, short_id};
use anyhow::Context;
use clap::Subcommand;
use pressroom_core::{
    access::Actor,
    keyword::{KeywordInput, KeywordPatch},
    store::Store,
    types::KeywordStatus,
};
use std::path::Path;
use uuid::Uuid;

#[derive(Subcommand)]
pub enum KeywordSubcommand {
    /// Add PENDING keywords to a schedule's queue
    Add {
        schedule_id: Uuid,
        /// Primary keywords, one queue row each
        #[arg(required = true)]
        keywords: Vec<String>,
        /// Secondary keywords (single primary only), repeatable
        #[arg(long)]
        secondary: Vec<String>,
    },

    /// List a schedule's keywords, newest first
    List { schedule_id: Uuid },

    /// Edit a keyword's text or force its status
    Update {
        schedule_id: Uuid,
        keyword_id: Uuid,
        #[arg(long)]
        primary: Option<String>,
        /// Replacement secondary keywords, repeatable
        #[arg(long)]
        secondary: Vec<String>,
        /// PENDING, PROCESSING, DONE, or FAILED
        #[arg(long)]
        status: Option<String>,
    },

    /// Requeue a FAILED keyword, clearing its recorded error
    Retry {
        schedule_id: Uuid,
        keyword_id: Uuid,
    },

    /// Remove a keyword from the queue
    Delete {
        schedule_id: Uuid,
        keyword_id: Uuid,
    },
}

pub fn run(
    root: &Path,
    actor: &Actor,
    subcommand: KeywordSubcommand,
    json: bool,
) -> anyhow::Result<()> {
    let store = Store::open(root).context("failed to open state store")?;
    match subcommand {
        KeywordSubcommand::Add {
            schedule_id,
            keywords,
            secondary,
        } => {
            if !secondary.is_empty() && keywords.len() != 1 {
                anyhow::bail!("--secondary applies to a single primary keyword");
            }
            let inputs = keywords
                .into_iter()
                .map(|primary_keyword| KeywordInput {
                    primary_keyword,
                    secondary_keywords: secondary.clone(),
                })
                .collect();
            let rows = store.add_keywords(actor, schedule_id, inputs)?;
            if json {
                print_json(&rows)?;
            } else {
                println!("queued {} keyword(s)", rows.len());
            }
            Ok(())
        }
        KeywordSubcommand::List { schedule_id } => run_list(&store, schedule_id, json),
        KeywordSubcommand::Update {
            schedule_id,
            keyword_id,
            primary,
            secondary,
            status,
        } => {
            let status = status.map(|s| s.parse::<KeywordStatus>()).transpose()?;
            let patch = KeywordPatch {
                primary_keyword: primary,
                secondary_keywords: if secondary.is_empty() {
                    None
                } else {
                    Some(secondary)
                },
                status,
            };
            let kw = store.update_keyword(actor, schedule_id, keyword_id, patch)?;
            if json {
                print_json(&kw)?;
            } else {
                println!("{} is now {}", kw.primary_keyword, kw.status);
            }
            Ok(())
        }
        KeywordSubcommand::Retry {
            schedule_id,
            keyword_id,
        } => {
            let patch = KeywordPatch {
                status: Some(KeywordStatus::Pending),
                ..KeywordPatch::default()
            };
            let kw = store.update_keyword(actor, schedule_id, keyword_id, patch)?;
            if json {
                print_json(&kw)?;
            } else {
                println!("{} requeued as {}", kw.primary_keyword, kw.status);
            }
            Ok(())
        }
        KeywordSubcommand::Delete {
            schedule_id,
            keyword_id,
        } => {
            store.delete_keyword(actor, schedule_id, keyword_id)?;
            if json {
                print_json(&serde_json::json!({ "deleted": keyword_id }))?;
            } else {
                println!("deleted {keyword_id}");
            }
            Ok(())
        }
    }
}

fn run_list(store: &Store, schedule_id: Uuid, json: bool) -> anyhow::Result<()> {
    let keywords = store.list_keywords(schedule_id)?;
    if json {
        print_json(&keywords)?;
        return Ok(());
    }
    let rows = keywords
        .iter()
        .map(|kw| {
            vec![
                short_id(&kw.id),
                kw.primary_keyword.clone(),
                kw.secondary_keywords.join(", "),
                kw.status.to_string(),
                or_dash(&kw.last_error),
            ]
        })
        .collect();
    print_table(&["ID", "PRIMARY", "SECONDARY", "STATUS", "LAST ERROR"], rows);
    Ok(())
}
