use crate::output::{or_dash, print_json, print_table, short_id};
use anyhow::Context;
use clap::Subcommand;
use pressroom_core::{
    access::Actor,
    approval::ActionApproval,
    store::{NewApproval, Store},
    types::{ActionKind, ContentKind},
};
use std::path::Path;
use uuid::Uuid;

#[derive(Subcommand)]
pub enum ApprovalSubcommand {
    /// Request an action, queued PENDING for human review
    Request {
        /// Target category: PRODUCT or POST
        #[arg(long)]
        category: String,
        /// PROMOTE, OPTIMIZE, or REVIEW
        #[arg(long)]
        action: String,
        /// Target entity id
        #[arg(long)]
        target: Uuid,
        #[arg(long, default_value = "0")]
        priority: u32,
        /// Free-text rationale; auto-publish intent is rejected
        #[arg(long)]
        note: Option<String>,
    },

    /// List approvals, newest first
    List,

    /// Show one approval
    Show { id: Uuid },

    /// Mark an approval APPROVED, recording the reviewer
    Approve { id: Uuid },

    /// Mark an approval REJECTED
    Reject {
        id: Uuid,
        #[arg(long)]
        reason: Option<String>,
    },

    /// Execute an APPROVED action, applying its modeled effect (privileged)
    Execute { id: Uuid },

    /// Dry-run an action against the current target state; writes nothing
    Simulate {
        /// Target category: PRODUCT or POST
        #[arg(long)]
        category: String,
        /// PROMOTE, OPTIMIZE, or REVIEW
        #[arg(long)]
        action: String,
        /// Target entity id
        #[arg(long)]
        target: Uuid,
    },
}

pub fn run(
    root: &Path,
    actor: &Actor,
    subcommand: ApprovalSubcommand,
    json: bool,
) -> anyhow::Result<()> {
    let store = Store::open(root).context("failed to open state store")?;
    match subcommand {
        ApprovalSubcommand::Request {
            category,
            action,
            target,
            priority,
            note,
        } => {
            let category: ContentKind = category.parse()?;
            let action: ActionKind = action.parse()?;
            let approval = store.create_approval(
                actor,
                NewApproval {
                    category,
                    action,
                    target_id: target,
                    priority,
                    note,
                },
            )?;
            if json {
                print_json(&approval)?;
            } else {
                println!(
                    "requested {} on {} ({})",
                    approval.action, approval.target_id, approval.id
                );
            }
            Ok(())
        }
        ApprovalSubcommand::List => run_list(&store, json),
        ApprovalSubcommand::Show { id } => {
            let approval = store.get_approval(id)?;
            show_approval(&approval, json)
        }
        ApprovalSubcommand::Approve { id } => {
            transition(store.approve_approval(actor, id)?, json)
        }
        ApprovalSubcommand::Reject { id, reason } => {
            transition(store.reject_approval(actor, id, reason)?, json)
        }
        ApprovalSubcommand::Execute { id } => transition(store.execute_approval(actor, id)?, json),
        ApprovalSubcommand::Simulate {
            category,
            action,
            target,
        } => {
            let category: ContentKind = category.parse()?;
            let action: ActionKind = action.parse()?;
            let report = store.simulate_action(actor, category, action, target)?;
            if json {
                return print_json(&report);
            }
            if report.supported {
                println!(
                    "{} on {}: priority {} -> {}, featured {} -> {}",
                    report.action,
                    report.target_id,
                    report.impact.priority_before,
                    report.impact.priority_after,
                    report.impact.featured_before,
                    report.impact.featured_after
                );
                for risk in &report.risks {
                    println!("risk: {risk}");
                }
            } else {
                println!("unsupported: {}", or_dash(&report.gap));
            }
            Ok(())
        }
    }
}

fn run_list(store: &Store, json: bool) -> anyhow::Result<()> {
    let approvals = store.list_approvals()?;
    if json {
        print_json(&approvals)?;
        return Ok(());
    }
    let rows = approvals
        .iter()
        .map(|a| {
            vec![
                short_id(&a.id),
                a.action.to_string(),
                a.category.to_string(),
                short_id(&a.target_id),
                a.status.to_string(),
                a.requested_by.clone(),
                or_dash(&a.reviewed_by),
            ]
        })
        .collect();
    print_table(
        &["ID", "ACTION", "CATEGORY", "TARGET", "STATUS", "REQUESTED", "REVIEWED"],
        rows,
    );
    Ok(())
}

fn show_approval(approval: &ActionApproval, json: bool) -> anyhow::Result<()> {
    if json {
        return print_json(approval);
    }
    println!("id:        {}", approval.id);
    println!("action:    {} on {}", approval.action, approval.category);
    println!("target:    {}", approval.target_id);
    println!("status:    {}", approval.status);
    println!("priority:  {}", approval.priority);
    println!("requested: {}", approval.requested_by);
    println!("note:      {}", or_dash(&approval.note));
    println!("reviewed:  {}", or_dash(&approval.reviewed_by));
    println!("rejected:  {}", or_dash(&approval.reject_reason));
    println!("executed:  {}", or_dash(&approval.executed_by));
    Ok(())
}

fn transition((approval, message): (ActionApproval, String), json: bool) -> anyhow::Result<()> {
    if json {
        print_json(&serde_json::json!({ "approval": approval, "message": message }))?;
    } else {
        println!("{message}");
    }
    Ok(())
}
