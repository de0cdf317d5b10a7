//! Show command
//!
//! Usage: polymap show <UUID> [--json]

use clap::Args;
use polymap_core::{Entity, LoadedGraph};
use serde::Serialize;
use std::collections::HashSet;
use std::path::Path;
use uuid::Uuid;

use super::open_session;

#[derive(Debug, Args)]
pub struct ShowArgs {
    /// Entity id to load
    pub id: Uuid,

    /// Print the loaded graph as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Serialize)]
struct GraphJson<'a> {
    root: Uuid,
    entities: Vec<&'a Entity>,
}

/// Execute show command
pub fn execute(args: ShowArgs, db: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let session = open_session(db)?;

    let loaded = session
        .find(args.id)?
        .ok_or_else(|| format!("Entity {} not found", args.id))?;

    if args.json {
        let json = GraphJson {
            root: loaded.root_id(),
            entities: loaded.entities().iter().collect(),
        };
        println!("{}", serde_json::to_string_pretty(&json)?);
    } else {
        print!("{}", render_tree(&loaded));
    }

    Ok(())
}

/// Indented tree from the root; repeated entities are marked, not expanded
fn render_tree(loaded: &LoadedGraph) -> String {
    let mut out = String::new();
    let mut seen = HashSet::new();
    // (entity, field it was reached through, depth)
    let mut stack: Vec<(&Entity, Option<&str>, usize)> = vec![(loaded.root(), None, 0)];

    while let Some((entity, via, depth)) = stack.pop() {
        let indent = "  ".repeat(depth);
        let label = match via {
            Some(field) => format!("{}{} -> ", indent, field),
            None => indent,
        };
        let first_visit = seen.insert(entity.id());
        out.push_str(&format!(
            "{}{} {}{}\n",
            label,
            entity.discriminator().type_name(),
            entity.id(),
            if first_visit { "" } else { " (seen)" }
        ));
        if !first_visit {
            continue;
        }

        let (field, target) = match entity {
            Entity::Pending(p) => ("fulfilled_by", p.fulfilled_by),
            Entity::Posted(p) => ("fulfilled_entity", p.fulfilled_entity),
            Entity::Exclusion(e) => ("compensating_entity", e.compensating_entity),
        };
        if let Some(target) = loaded.resolve(target) {
            stack.push((target, Some(field), depth + 1));
        }
    }
    out
}
