use anyhow::{bail, Context};
use clap::Parser;
use daybook_core::DaybookConfig;
use daybook_schedule::{clock, Planner, ScheduleId};
use tracing::warn;

mod cli;
mod render;
mod watch;

use cli::{Cli, Command};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // config: --config > DAYBOOK_CONFIG > ~/.daybook/daybook.toml
    let config_path = cli.config.clone().or_else(|| std::env::var("DAYBOOK_CONFIG").ok());
    let (config, config_error) = match DaybookConfig::load(config_path.as_deref()) {
        Ok(config) => (config, None),
        Err(e) => (DaybookConfig::default(), Some(e)),
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.log.filter.as_str().into()),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Some(e) = config_error {
        warn!("Config load failed ({}), using defaults", e);
    }

    let planner = Planner::open(&config).context("opening schedule database")?;

    run(cli.command, &planner, cli.json).await
}

async fn run(command: Command, planner: &Planner, json: bool) -> anyhow::Result<()> {
    match command {
        Command::Add(args) => {
            let id = planner.insert_schedule(args.into_record()).await?;
            println!("{id}");
        }
        Command::Show { id } => {
            let Some(record) = planner.get_schedule_by_id(ScheduleId::from(id)).await? else {
                bail!("schedule {id} not found");
            };
            if json {
                println!("{}", serde_json::to_string_pretty(&record)?);
            } else {
                println!("{}", render::detail(&record));
            }
        }
        Command::List { date } => {
            let date = date.unwrap_or_else(clock::today);
            let records = planner.schedules_on(date).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&records)?);
            } else {
                println!("{}", render::day(date, &records));
            }
        }
        Command::Edit { id, fields } => {
            let Some(record) = planner.get_schedule_by_id(ScheduleId::from(id)).await? else {
                bail!("schedule {id} not found");
            };
            let updated = planner.update_schedule(fields.apply(record)).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&updated)?);
            } else {
                println!("{}", render::detail(&updated));
            }
        }
        Command::Delete { id } => {
            if planner.delete_schedule_by_id(ScheduleId::from(id)).await? {
                println!("deleted {id}");
            } else {
                println!("no schedule {id}");
            }
        }
        Command::Watch { date } => {
            if let Some(date) = date {
                planner.select_date(date);
            }
            watch::run(planner, json).await?;
        }
    }
    Ok(())
}
