#![deny(warnings)]

//! Command-line Zakat worksheet. Each invocation restores the saved session,
//! applies one command, saves and prints the worksheet.

mod app;
mod config;
mod render;

use anyhow::{anyhow, bail, Context, Result};
use app::{wall_clock_ms, App};
use config::Config;
use persistence::FileStore;
use price_feed::{HttpSpotSource, SpotSource};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use zakat_core::Catalog;
use zakat_runtime::{Action, Step};

const USAGE: &str = "\
usage: zakat [--config PATH] [--offline] <command>

commands:
  show                      print the worksheet (default)
  fields                    list field ids
  set <field> <amount>      enter an amount
  price <amount>            enter the silver price per gram
  confirm-price             confirm the silver price
  unconfirm-price           withdraw the confirmation
  hawl <yes|no>             wealth held for a full lunar year
  gregorian <yes|no>        apply the solar-calendar adjustment
  refresh-price             discard the entered price and fetch it again
  step <next|back|assets|impermissible|expenses|calculate>
  clear --yes               erase the saved worksheet
  version                   print build information";

#[derive(Debug, Clone, PartialEq)]
enum Command {
    Show,
    Fields,
    Set { field: String, raw: String },
    Price(String),
    ConfirmPrice,
    UnconfirmPrice,
    Hawl(bool),
    Gregorian(bool),
    RefreshPrice,
    Step(Action),
    Clear,
    Version,
    Help,
}

impl Command {
    fn actions(&self) -> Vec<Action> {
        match self {
            Command::Set { field, raw } => vec![Action::SetAmount {
                field: field.clone(),
                raw: raw.clone(),
            }],
            Command::Price(raw) => vec![Action::EditPrice { raw: raw.clone() }],
            Command::ConfirmPrice => vec![Action::ConfirmPrice],
            Command::UnconfirmPrice => vec![Action::RevokeConfirmation],
            Command::Hawl(held) => vec![Action::SetHeldFullPeriod(*held)],
            Command::Gregorian(on) => vec![Action::SetCalendarAdjustment(*on)],
            Command::RefreshPrice => vec![Action::RequestLivePrice],
            Command::Step(action) => vec![action.clone()],
            Command::Clear => vec![Action::ClearAll],
            Command::Show | Command::Fields | Command::Version | Command::Help => vec![],
        }
    }
}

#[derive(Debug, PartialEq)]
struct Cli {
    config: Option<PathBuf>,
    offline: bool,
    command: Command,
}

fn parse_flag(value: Option<String>) -> Result<bool> {
    match value.as_deref() {
        Some("yes" | "y" | "true" | "on") => Ok(true),
        Some("no" | "n" | "false" | "off") => Ok(false),
        Some(other) => bail!("expected yes or no, got {other:?}"),
        None => bail!("expected yes or no"),
    }
}

fn parse_step(value: Option<String>) -> Result<Action> {
    let value = value.ok_or_else(|| anyhow!("step needs a target"))?;
    match value.as_str() {
        "next" => Ok(Action::Next),
        "back" => Ok(Action::Back),
        name => Step::parse(name)
            .map(Action::GoTo)
            .ok_or_else(|| anyhow!("unknown step {name:?}")),
    }
}

fn parse_args<I: IntoIterator<Item = String>>(args: I) -> Result<Cli> {
    let mut config = None;
    let mut offline = false;
    let mut words = Vec::new();
    let mut it = args.into_iter();
    while let Some(arg) = it.next() {
        match arg.as_str() {
            "--config" => {
                config = Some(PathBuf::from(
                    it.next().context("--config needs a path")?,
                ))
            }
            "--offline" => offline = true,
            "-h" | "--help" => words.push("help".to_string()),
            _ => words.push(arg),
        }
    }

    let mut words = words.into_iter();
    let command = match words.next().as_deref() {
        None | Some("show") => Command::Show,
        Some("fields") => Command::Fields,
        Some("set") => {
            let field = words.next().context("set needs a field id")?;
            let raw = words.next().context("set needs an amount")?;
            Command::Set { field, raw }
        }
        Some("price") => Command::Price(words.next().context("price needs an amount")?),
        Some("confirm-price") => Command::ConfirmPrice,
        Some("unconfirm-price") => Command::UnconfirmPrice,
        Some("hawl") => Command::Hawl(parse_flag(words.next())?),
        Some("gregorian") => Command::Gregorian(parse_flag(words.next())?),
        Some("refresh-price") => Command::RefreshPrice,
        Some("step") => Command::Step(parse_step(words.next())?),
        Some("clear") => {
            if words.next().as_deref() != Some("--yes") {
                bail!("refusing to clear the worksheet without --yes");
            }
            Command::Clear
        }
        Some("version") => Command::Version,
        Some("help") => Command::Help,
        Some(other) => bail!("unknown command {other:?}\n\n{USAGE}"),
    };
    if let Some(extra) = words.next() {
        bail!("unexpected argument {extra:?}");
    }
    Ok(Cli {
        config,
        offline,
        command,
    })
}

fn spot_source(cfg: &Config, offline: bool) -> Option<Arc<dyn SpotSource>> {
    if offline || cfg.offline {
        return None;
    }
    match HttpSpotSource::new(cfg.price_source_url.clone(), cfg.request_timeout()) {
        Ok(src) => Some(Arc::new(src)),
        Err(e) => {
            warn!(error = %e, "price source disabled");
            None
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logging setup
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = parse_args(std::env::args().skip(1))?;
    match cli.command {
        Command::Help => {
            println!("{USAGE}");
            return Ok(());
        }
        Command::Version => {
            println!(
                "zakat {} ({} {})",
                env!("CARGO_PKG_VERSION"),
                env!("GIT_SHA"),
                env!("BUILD_DATE")
            );
            return Ok(());
        }
        Command::Fields => {
            println!("{}", render::fields(Catalog::standard()));
            return Ok(());
        }
        _ => {}
    }

    let cfg = Config::load(cli.config.as_deref())?;
    info!(storage = %cfg.storage_dir.display(), command = ?cli.command, "starting");
    let store = FileStore::new(&cfg.storage_dir);
    let mut app = App::open(store, spot_source(&cfg, cli.offline), wall_clock_ms);

    app.dispatch(Action::Startup)?;
    for action in cli.command.actions() {
        app.dispatch(action)?;
    }
    app.settle().await?;

    if cli.command == Command::Clear {
        println!("Worksheet cleared.\n");
    }
    println!("{}", render::worksheet(app.session(), app.catalog()));
    Ok(())
}
