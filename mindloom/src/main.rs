use anyhow::{Context, anyhow};
use clap::ArgMatches;
use colored::Colorize;
use commands::command_argument_builder;
use indicatif::{ProgressBar, ProgressStyle};
use mindloom::handlers::{ProviderConfig, format_updated, resolve_database_path};
use mindloom_core::data::{Database, LOCAL_OWNER};
use mindloom_core::outline::{OutlineFormat, gather_outline_data, generate_text_outline};
use mindloom_core::print_banner;
use mindloom_core::session::MapSession;
use mindloom_core::sync::AutoSaver;
use mindloom_gen::Generator;
use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;

mod commands;

#[tokio::main]
async fn main() {
    let cmd = command_argument_builder();
    let chosen_command = cmd.get_matches();
    let quiet = chosen_command.get_flag("quiet");

    // Show banner unless --quiet flag is set
    if !quiet {
        print_banner();
    }

    if chosen_command.subcommand().is_none() {
        // No subcommand provided, just show the banner
        return;
    }

    let outcome = match chosen_command.subcommand() {
        Some(("init", primary_command)) => handle_init(primary_command),
        Some(("map", primary_command)) => match primary_command.subcommand() {
            Some(("create", secondary_command)) => handle_map_create(secondary_command),
            Some(("list", secondary_command)) => handle_map_list(secondary_command),
            Some(("rename", secondary_command)) => handle_map_rename(secondary_command),
            Some(("remove", secondary_command)) => handle_map_remove(secondary_command),
            Some(("set-prompt", secondary_command)) => handle_map_set_prompt(secondary_command),
            _ => unreachable!("clap should ensure we don't get here"),
        },
        Some(("topic", primary_command)) => handle_topic(primary_command, quiet).await,
        Some(("expand", primary_command)) => handle_expand(primary_command, quiet).await,
        Some(("delete", primary_command)) => handle_delete(primary_command),
        Some(("connect", primary_command)) => handle_connect(primary_command),
        Some(("arrange", primary_command)) => handle_arrange(primary_command),
        Some(("show", primary_command)) => handle_show(primary_command),
        _ => unreachable!("clap should ensure we don't get here"),
    };

    if let Err(e) = outcome {
        eprintln!("✗ {:#}", e);
        std::process::exit(1);
    }
}

fn database_path(args: &ArgMatches) -> PathBuf {
    let raw = args
        .get_one::<String>("database")
        .map(String::as_str)
        .unwrap_or("~/.config/mindloom/");
    resolve_database_path(raw)
}

fn open_database(args: &ArgMatches) -> anyhow::Result<Database> {
    let path = database_path(args);
    if !Database::exists(&path) {
        return Err(anyhow!(
            "no database at {} (run `mindloom init` first)",
            path.display()
        ));
    }
    Database::new(&path).with_context(|| format!("opening database at {}", path.display()))
}

// Handler functions
fn handle_init(args: &ArgMatches) -> anyhow::Result<()> {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.cyan} {msg}")
            .unwrap(),
    );
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner.set_message("Setting up mindloom...");

    let raw_path = args
        .get_one::<String>("PATH")
        .map(String::as_str)
        .unwrap_or("~/.config/mindloom/");
    let force = args.get_flag("force");
    let expanded = shellexpand::tilde(raw_path);
    let config_dir = PathBuf::from(expanded.as_ref());
    let db_path = resolve_database_path(raw_path);

    if Database::exists(&db_path) && !force {
        spinner.println(format!(
            "[WARNING] A database already exists at: {}",
            db_path.display()
        ));
        spinner.println("This operation will overwrite it.");
        spinner.println("Do you want to continue? [y/N]: ");
        io::stdout().flush()?;

        let mut response = String::new();
        io::stdin().read_line(&mut response)?;
        let response = response.trim().to_lowercase();

        if response != "y" && response != "yes" {
            println!("\nInitialization cancelled.");
            return Ok(());
        }
    }

    spinner.set_message("Creating configuration directory...");
    fs::create_dir_all(&config_dir)
        .with_context(|| format!("creating {}", config_dir.display()))?;

    if Database::exists(&db_path) {
        spinner.set_message("Deleting existing database...");
        Database::drop(&db_path)
            .with_context(|| format!("removing {}", db_path.display()))?;
    }

    spinner.set_message(format!("Initializing database at: {}", db_path.display()));
    Database::new(&db_path).context("Failed to create database")?;

    spinner.finish_with_message(format!(
        r#"
    ✓ mindloom initialization complete!
    ✓ Config directory: {}
    ✓ Database: {}
    "#,
        config_dir.display(),
        db_path.display()
    ));
    Ok(())
}

fn handle_map_create(args: &ArgMatches) -> anyhow::Result<()> {
    let title = args.get_one::<String>("title").unwrap();
    let db = open_database(args)?;
    let map_id = db.create_mind_map(title, LOCAL_OWNER)?;
    println!("✓ Created mind map '{}'", title);
    println!("  id: {}", map_id);
    Ok(())
}

fn handle_map_list(args: &ArgMatches) -> anyhow::Result<()> {
    let db = open_database(args)?;
    let maps = db.list_mind_maps(LOCAL_OWNER)?;
    if maps.is_empty() {
        println!("No mind maps yet. Create one with `mindloom map create`.");
        return Ok(());
    }
    for map in maps {
        let updated = format_updated(map.updated_at);
        println!(
            "{}  {}  {}",
            map.id.dimmed(),
            map.title.bold(),
            format!("(updated {})", updated).dimmed()
        );
    }
    Ok(())
}

fn handle_map_rename(args: &ArgMatches) -> anyhow::Result<()> {
    let map_id = args.get_one::<String>("map").unwrap();
    let title = args.get_one::<String>("title").unwrap();
    let db = open_database(args)?;
    if db.rename_mind_map(map_id, title)? {
        println!("✓ Renamed {} to '{}'", map_id, title);
        Ok(())
    } else {
        Err(anyhow!("no mind map with id {}", map_id))
    }
}

fn handle_map_remove(args: &ArgMatches) -> anyhow::Result<()> {
    let map_id = args.get_one::<String>("map").unwrap();
    let db = open_database(args)?;
    if db.delete_mind_map(map_id)? {
        println!("✓ Deleted mind map {}", map_id);
        Ok(())
    } else {
        Err(anyhow!("no mind map with id {}", map_id))
    }
}

fn handle_map_set_prompt(args: &ArgMatches) -> anyhow::Result<()> {
    let map_id = args.get_one::<String>("map").unwrap();
    let prompt = args.get_one::<String>("prompt").map(String::as_str);
    let db = open_database(args)?;
    if db.update_system_prompt(map_id, prompt)? {
        match prompt {
            Some(_) => println!("✓ System prompt updated for {}", map_id),
            None => println!("✓ System prompt reset to default for {}", map_id),
        }
        Ok(())
    } else {
        Err(anyhow!("no mind map with id {}", map_id))
    }
}

/// Loads a stored map into a fresh session wired to an auto-saver.
fn open_session(
    args: &ArgMatches,
    generator: Arc<Generator>,
    map_id: &str,
) -> anyhow::Result<(MapSession, AutoSaver)> {
    let db = open_database(args)?;
    let meta = db
        .get_mind_map(map_id)?
        .ok_or_else(|| anyhow!("no mind map with id {}", map_id))?;
    let data = db
        .load_mind_map(map_id)?
        .ok_or_else(|| anyhow!("no mind map with id {}", map_id))?;

    let session = MapSession::new(generator);
    session.load(data, meta.system_prompt);

    let saver = AutoSaver::new(Arc::new(StdMutex::new(db)), session.graph(), map_id);
    saver.mark_loaded();
    Ok((session, saver))
}

fn streaming_spinner(quiet: bool) -> Option<ProgressBar> {
    if quiet {
        return None;
    }
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.cyan} {msg}")
            .unwrap(),
    );
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner.set_message("Waiting for first chunk...");
    Some(spinner)
}

async fn handle_topic(args: &ArgMatches, quiet: bool) -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let map_id = args.get_one::<String>("map").unwrap();
    let topic = args.get_one::<String>("TOPIC").unwrap();

    let generator = Arc::new(ProviderConfig::from_env().build());
    let (session, saver) = open_session(args, generator, map_id)?;

    let spinner = streaming_spinner(quiet);
    let progress = spinner.clone().map(|pb| {
        let callback: mindloom_gen::ChunkCallback = Arc::new(move |accumulated: String| {
            pb.set_message(format!("Generating... {} chars", accumulated.chars().count()));
        });
        callback
    });

    let node = session.create_topic_node(topic, progress).await?;
    if let Some(pb) = spinner {
        pb.finish_and_clear();
    }
    saver.flush()?;

    println!("✓ Created node {} for '{}'\n", node.id, topic);
    println!("{}", node.content);
    Ok(())
}

async fn handle_expand(args: &ArgMatches, quiet: bool) -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let map_id = args.get_one::<String>("map").unwrap();
    let node_id = args.get_one::<String>("node").unwrap();
    let selection = args.get_one::<String>("text").unwrap();
    let custom_prompt = args.get_one::<String>("prompt").map(String::as_str);

    let generator = Arc::new(ProviderConfig::from_env().build());
    let (session, saver) = open_session(args, generator, map_id)?;

    let spinner = streaming_spinner(quiet);
    let progress = spinner.clone().map(|pb| {
        let callback: mindloom_gen::ChunkCallback = Arc::new(move |accumulated: String| {
            pb.set_message(format!("Generating... {} chars", accumulated.chars().count()));
        });
        callback
    });

    let node = session
        .expand_selection(node_id, selection, custom_prompt, progress)
        .await?;
    if let Some(pb) = spinner {
        pb.finish_and_clear();
    }
    saver.flush()?;

    println!("✓ Created child node {} under {}\n", node.id, node_id);
    println!("{}", node.content);
    Ok(())
}

fn noop_session(args: &ArgMatches, map_id: &str) -> anyhow::Result<(MapSession, AutoSaver)> {
    // Structural edits never reach the provider, so the endpoint does
    // not need to be valid.
    let generator = Arc::new(Generator::new("http://localhost:0"));
    open_session(args, generator, map_id)
}

fn handle_delete(args: &ArgMatches) -> anyhow::Result<()> {
    let map_id = args.get_one::<String>("map").unwrap();
    let node_id = args.get_one::<String>("node").unwrap();

    let (session, saver) = noop_session(args, map_id)?;
    let removed = session.delete_node(node_id)?;
    saver.flush()?;

    println!("✓ Deleted {} node(s)", removed.len());
    Ok(())
}

fn handle_connect(args: &ArgMatches) -> anyhow::Result<()> {
    let map_id = args.get_one::<String>("map").unwrap();
    let source = args.get_one::<String>("source").unwrap();
    let target = args.get_one::<String>("target").unwrap();

    let (session, saver) = noop_session(args, map_id)?;
    session.connect(source, target)?;
    saver.flush()?;

    println!("✓ Connected {} -> {}", source, target);
    Ok(())
}

fn handle_arrange(args: &ArgMatches) -> anyhow::Result<()> {
    let map_id = args.get_one::<String>("map").unwrap();

    let (session, saver) = noop_session(args, map_id)?;
    session.auto_arrange();
    saver.flush()?;

    println!("✓ Rearranged {}", map_id);
    Ok(())
}

fn handle_show(args: &ArgMatches) -> anyhow::Result<()> {
    let map_id = args.get_one::<String>("map").unwrap();
    let format = args
        .get_one::<String>("format")
        .and_then(|f| OutlineFormat::from_str(f))
        .unwrap_or(OutlineFormat::Text);

    let db = open_database(args)?;
    let data = gather_outline_data(&db, map_id)?
        .ok_or_else(|| anyhow!("no mind map with id {}", map_id))?;

    match format {
        OutlineFormat::Text => print!("{}", generate_text_outline(&data)),
        OutlineFormat::Json => println!("{}", serde_json::to_string_pretty(&data)?),
    }
    Ok(())
}

pub const CLAP_STYLING: clap::builder::styling::Styles = clap::builder::styling::Styles::styled()
    .header(clap_cargo::style::HEADER)
    .usage(clap_cargo::style::USAGE)
    .literal(clap_cargo::style::LITERAL)
    .placeholder(clap_cargo::style::PLACEHOLDER)
    .error(clap_cargo::style::ERROR)
    .valid(clap_cargo::style::VALID)
    .invalid(clap_cargo::style::INVALID);
