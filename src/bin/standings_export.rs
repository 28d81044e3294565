use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};

use betpool_terminal::api::{BetPoolApi, HttpApi};
use betpool_terminal::config::{self, Config};
use betpool_terminal::export;
use betpool_terminal::session::SessionStore;

fn main() -> Result<()> {
    config::load_dotenv();
    let config = Config::from_env();

    let out = parse_out_arg().unwrap_or_else(|| config.export_path.clone());

    let session = SessionStore::new(config.session_file.clone())
        .load()
        .ok_or_else(|| anyhow!("no stored session; log in with betpool_terminal first"))?;

    let mut api = HttpApi::new(&config);
    api.set_token(Some(session.token));

    let teams = api.teams().context("fetch teams")?;
    let groups = api.groups().context("fetch groups")?;
    let scoreboard = api.scoreboard().context("fetch scoreboard")?;

    let report = export::export_workbook(&out, &groups, &teams, &scoreboard)?;

    println!("Export complete");
    println!("File: {}", out.display());
    println!("Standings rows: {}", report.standings_rows);
    println!("Scoreboard rows: {}", report.scoreboard_rows);
    Ok(())
}

fn parse_out_arg() -> Option<PathBuf> {
    let args = std::env::args().skip(1).collect::<Vec<_>>();
    for (idx, arg) in args.iter().enumerate() {
        if let Some(path) = arg.strip_prefix("--out=") {
            let trimmed = path.trim();
            if !trimmed.is_empty() {
                return Some(PathBuf::from(trimmed));
            }
        }
        if arg == "--out" {
            let Some(next) = args.get(idx + 1) else {
                continue;
            };
            if !next.trim().is_empty() {
                return Some(PathBuf::from(next));
            }
        }
    }
    None
}
