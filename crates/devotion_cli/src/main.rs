//! `devotions` operator CLI.
//!
//! Opens the configured store, runs one command, and prints either a short
//! text rendering or JSON.

mod commands;

use anyhow::{anyhow, bail, Context, Result};
use chrono::NaiveDate;
use clap::Parser;
use commands::{Cli, Commands};
use devotion_core::db::open_db;
use devotion_core::time::local_today;
use devotion_core::{
    init_logging, Dashboard, Devotion, DevotionFilter, DevotionForm, DevotionId, DevotionService,
    GalleryPager, SaveError, ShareCard, SiteConfig, SqliteDevotionRepository,
};
use log::info;
use serde_json::json;

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = SiteConfig::load(cli.config.as_deref())?;
    if let Some(log_dir) = config.log_dir.as_ref() {
        init_logging(config.log_level.as_str(), log_dir)?;
    }

    let conn = open_db(&config.db_path)
        .with_context(|| format!("failed to open `{}`", config.db_path.display()))?;
    let service = DevotionService::new(SqliteDevotionRepository::try_new(&conn)?);
    info!("event=cli_command module=cli status=start command={}", cli.command.name());

    match cli.command {
        Commands::Today => print_one(service.home(None)?, cli.json),
        Commands::Date { date } => print_one(service.home(Some(parse_date(&date)?))?, cli.json),
        Commands::Show { id } => print_one(service.admin_devotion(parse_id(&id)?)?, cli.json),
        Commands::Archive { limit, page } => {
            let devotions = match limit {
                Some(limit) => service.gallery(Some(limit))?,
                None => service.archive()?,
            };
            let mut pager = GalleryPager::new(devotions.len());
            while pager.page() < page && pager.has_next() {
                pager.next();
            }
            print_many(pager.slice(&devotions), cli.json)?;
            if !cli.json && pager.shows_controls() {
                println!("page {} of {}", pager.page(), pager.total_pages());
            }
            Ok(())
        }
        Commands::List { filter } => {
            let filter = DevotionFilter::parse(&filter)
                .ok_or_else(|| anyhow!("unknown filter `{filter}`"))?;
            let dashboard = Dashboard::open(service.repository());
            let devotions = dashboard.devotions_filtered(filter);
            dashboard.close();
            print_many(&devotions, cli.json)
        }
        Commands::Stats => {
            let dashboard = Dashboard::open(service.repository());
            let stats = dashboard.stats();
            dashboard.close();
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&stats)?);
            } else {
                println!(
                    "total={} published={} unpublished={}",
                    stats.total, stats.published, stats.unpublished
                );
            }
            Ok(())
        }
        Commands::Create {
            title,
            verse,
            content,
            excerpt,
            date,
            publish,
        } => {
            let mut form = DevotionForm::blank(local_today());
            form.title = title;
            form.bible_verse = verse;
            form.content = content;
            form.excerpt = excerpt.unwrap_or_default();
            if let Some(date) = date {
                form.publish_date = date;
            }
            form.is_published = publish;

            let id = match service.save(None, &form) {
                Ok(id) => id,
                Err(SaveError::Validation(errors)) => {
                    for (field, message) in errors.iter() {
                        eprintln!("{}: {message}", field.name());
                    }
                    bail!("devotion not saved");
                }
                Err(SaveError::Repo(err)) => return Err(err.into()),
            };
            print_id("created", id, cli.json)
        }
        Commands::Publish { id } => {
            let id = parse_id(&id)?;
            service.set_published(id, true)?;
            print_id("published", id, cli.json)
        }
        Commands::Unpublish { id } => {
            let id = parse_id(&id)?;
            service.set_published(id, false)?;
            print_id("unpublished", id, cli.json)
        }
        Commands::Delete { id } => {
            let id = parse_id(&id)?;
            service.delete(id)?;
            print_id("deleted", id, cli.json)
        }
        Commands::Share { id } => {
            let id = parse_id(&id)?;
            let devotion = service
                .public_devotion(id)?
                .ok_or_else(|| anyhow!("no published devotion with id {id}"))?;
            let card = ShareCard::for_devotion(&devotion, &config.base_url);
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&card)?);
            } else {
                println!("{}\n\n{}\n\n{}", card.title, card.text, card.url);
            }
            Ok(())
        }
    }
}

fn parse_id(value: &str) -> Result<DevotionId> {
    DevotionId::parse_str(value.trim()).with_context(|| format!("invalid devotion id `{value}`"))
}

fn parse_date(value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .with_context(|| format!("invalid date `{value}`; expected YYYY-MM-DD"))
}

fn print_one(devotion: Option<Devotion>, as_json: bool) -> Result<()> {
    match devotion {
        Some(devotion) if as_json => println!("{}", serde_json::to_string_pretty(&devotion)?),
        Some(devotion) => {
            println!("{} ({})", devotion.title, devotion.publish_date.format("%A, %B %-d, %Y"));
            println!("{}", devotion.bible_verse);
            if !devotion.is_published {
                println!("[draft]");
            }
            println!();
            for paragraph in devotion.paragraphs() {
                println!("{paragraph}\n");
            }
        }
        None if as_json => println!("null"),
        None => println!("No devotion found."),
    }
    Ok(())
}

fn print_many(devotions: &[Devotion], as_json: bool) -> Result<()> {
    if as_json {
        println!("{}", serde_json::to_string_pretty(devotions)?);
        return Ok(());
    }
    if devotions.is_empty() {
        println!("No devotions published yet.");
    }
    for devotion in devotions {
        println!(
            "{}  {}  {}\n    {}",
            devotion.publish_date.format("%B %-d, %Y"),
            devotion.id,
            devotion.title,
            devotion.card_excerpt()
        );
    }
    Ok(())
}

fn print_id(action: &str, id: DevotionId, as_json: bool) -> Result<()> {
    if as_json {
        println!("{}", json!({ "action": action, "id": id }));
    } else {
        println!("{action} {id}");
    }
    Ok(())
}
