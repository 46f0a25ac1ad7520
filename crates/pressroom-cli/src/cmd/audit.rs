use crate::output::{or_dash, print_json, print_table};
use anyhow::Context;
use pressroom_core::store::Store;
use std::path::Path;

pub fn run(root: &Path, entity: Option<&str>, limit: usize, json: bool) -> anyhow::Result<()> {
    let store = Store::open(root).context("failed to open state store")?;
    let entries = match entity {
        Some(id) => store.audit_log().for_entity(id, limit)?,
        None => store.audit_log().recent(limit)?,
    };

    if json {
        print_json(&entries)?;
        return Ok(());
    }
    let rows = entries
        .iter()
        .map(|e| {
            vec![
                e.at.format("%Y-%m-%d %H:%M:%S").to_string(),
                e.actor.clone(),
                e.entity_kind.clone(),
                e.entity_id.clone(),
                or_dash(&e.status_before),
                or_dash(&e.status_after),
            ]
        })
        .collect();
    print_table(&["AT", "ACTOR", "KIND", "ENTITY", "BEFORE", "AFTER"], rows);
    Ok(())
}
