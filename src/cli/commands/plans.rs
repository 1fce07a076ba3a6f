use anyhow::{bail, Context};
use clap::Subcommand;
use serde_json::json;
use uuid::Uuid;

use crate::cli::utils::{format_limit, format_price, output_empty_collection, output_success};
use crate::cli::OutputFormat;
use crate::database::models::Plan;
use crate::database::Store;

#[derive(Subcommand)]
pub enum PlanCommands {
    #[command(about = "List every plan by sort order")]
    List,

    #[command(about = "Set plan order; each id's position becomes its sort order")]
    Reorder {
        #[arg(required = true, help = "Plan ids in the desired order")]
        ids: Vec<String>,
    },
}

fn parse_ids(raw: &[String]) -> anyhow::Result<Vec<Uuid>> {
    let mut ids = Vec::with_capacity(raw.len());
    for value in raw {
        let id = Uuid::parse_str(value.trim())
            .with_context(|| format!("'{}' is not a plan id", value))?;
        if ids.contains(&id) {
            bail!("plan id {} given more than once", id);
        }
        ids.push(id);
    }
    Ok(ids)
}

fn print_table(plans: &[Plan]) {
    println!(
        "{:<5} {:<38} {:<16} {:<10} {:<10} {:<7} {}",
        "ORDER", "ID", "NAME", "MONTHLY", "CONTACTS", "ACTIVE", "DEFAULT"
    );
    println!("{}", "-".repeat(98));

    for plan in plans {
        println!(
            "{:<5} {:<38} {:<16} {:<10} {:<10} {:<7} {}",
            plan.sort_order,
            plan.id,
            plan.name,
            format_price(plan.price_monthly),
            format_limit(plan.max_contacts),
            if plan.active { "yes" } else { "no" },
            if plan.is_default { "*" } else { "" },
        );
    }
}

fn output_plans(output_format: OutputFormat, plans: &[Plan]) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&json!({ "plans": plans }))?);
        }
        OutputFormat::Text => print_table(plans),
    }
    Ok(())
}

pub async fn handle(store: &Store, cmd: PlanCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        PlanCommands::List => {
            let plans = store.plans.list_all().await?;
            if plans.is_empty() {
                return output_empty_collection(output_format, "plans", "No plans found");
            }
            output_plans(output_format, &plans)
        }
        PlanCommands::Reorder { ids } => {
            let ids = parse_ids(&ids)?;
            let plans = store
                .plans
                .reorder(&ids)
                .await
                .context("failed to reorder plans")?;

            if output_format == OutputFormat::Text {
                output_plans(output_format, &plans)?;
            }
            output_success(
                output_format,
                &format!("Reordered {} plans", ids.len()),
                Some(json!({ "plans": plans })),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_must_be_unique_uuids() {
        let id = Uuid::new_v4().to_string();
        assert_eq!(parse_ids(&[id.clone()]).unwrap().len(), 1);
        assert!(parse_ids(&[id.clone(), id]).is_err());
        assert!(parse_ids(&["pro".to_string()]).is_err());
    }
}
