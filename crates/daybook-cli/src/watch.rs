use daybook_schedule::Planner;
use futures_util::StreamExt;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};

use crate::{cli::parse_day_from, render};

/// Print the selected day's schedules on every change until EOF or Ctrl-C.
///
/// Each stdin line selects a new day; the output always reflects the latest one.
pub async fn run(planner: &Planner, json: bool) -> anyhow::Result<()> {
    let stream = planner.subscribe_schedules_for_selected_date();
    tokio::pin!(stream);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            batch = stream.next() => match batch {
                Some(Ok(records)) => {
                    if json {
                        println!("{}", serde_json::to_string(&records)?);
                    } else {
                        println!("{}", render::day(planner.selected_date(), &records));
                    }
                }
                Some(Err(e)) => warn!(error = %e, code = e.code(), "schedule query failed"),
                None => break,
            },
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                let input = line.trim();
                if input.is_empty() {
                    continue;
                }
                match parse_day_from(input, planner.selected_date()) {
                    Ok(date) => {
                        if !planner.select_date(date) {
                            println!("already showing {date}");
                        }
                    }
                    Err(e) => eprintln!("{e}"),
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("interrupted");
                break;
            }
        }
    }
    Ok(())
}
