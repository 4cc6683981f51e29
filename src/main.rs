use std::io::Read;

use anyhow::{Context, Result, bail};
use clap::Parser;
use time::OffsetDateTime;
use time::macros::format_description;
use tracing::info;

use nota::browse::BrowseView;
use nota::cli::{Cli, Command};
use nota::logging;
use nota::paths;
use nota::session::EditorSession;
use nota::store::FileStore;

fn main() {
    if let Err(err) = run() {
        eprintln!("{:#}", err);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    logging::init_logging().context("initialize logging failed")?;
    let cli = Cli::parse();

    let store_dir = cli.store_dir.unwrap_or_else(paths::default_store_dir);
    info!("using store directory {}", store_dir.display());
    let store = FileStore::new(store_dir);

    let runtime = compio::runtime::Runtime::new().context("initialize async runtime failed")?;
    runtime.block_on(execute(&store, cli.command))
}

async fn execute(store: &FileStore, command: Command) -> Result<()> {
    match command {
        Command::List => list(store).await,
        Command::Cat { name } => cat(store, &name).await,
        Command::Write {
            name,
            text,
            rename,
            stdin,
        } => write(store, &name, text, rename, stdin).await,
        Command::Dup { names } => duplicate(store, &names).await,
        Command::Rm { names, yes } => remove(store, &names, yes).await,
    }
}

async fn list(store: &FileStore) -> Result<()> {
    store.ensure_store_exists().await?;
    let mut view = BrowseView::new();
    view.refresh(store).await.context("list store failed")?;

    let entries = view.entries();
    if entries.is_empty() {
        println!("no notes in {}", store.root().display());
        return Ok(());
    }
    let timestamp = format_description!("[year]-[month]-[day] [hour]:[minute]");
    for entry in entries {
        let modified = entry
            .modified_at
            .map(OffsetDateTime::from)
            .and_then(|moment| moment.format(&timestamp).ok())
            .unwrap_or_else(|| "-".to_string());
        let kind = if entry.is_directory { "dir" } else { "" };
        println!(
            "{:>8}  {:<16}  {:<4} {}",
            entry.size_bytes, modified, kind, entry.name
        );
    }
    Ok(())
}

async fn cat(store: &FileStore, name: &str) -> Result<()> {
    let content = store
        .read(&store.entry_path(name))
        .await
        .with_context(|| format!("read note {name} failed"))?;
    print!("{content}");
    Ok(())
}

async fn write(
    store: &FileStore,
    name: &str,
    text: Option<String>,
    rename: Option<String>,
    stdin: bool,
) -> Result<()> {
    let mut session = match store.read(&store.entry_path(name)).await {
        Ok(existing) => EditorSession::open(name, existing),
        Err(err) if err.is_not_found() => {
            let mut session = EditorSession::new();
            session.rename(name);
            session
        }
        Err(err) => return Err(err).with_context(|| format!("open note {name} failed")),
    };

    if let Some(text) = text {
        session.update_content(text);
    } else if stdin {
        let mut content = String::new();
        std::io::stdin()
            .read_to_string(&mut content)
            .context("read stdin failed")?;
        session.update_content(content);
    }
    if let Some(new_name) = rename {
        session.rename(new_name);
    }

    let saved_name = session
        .save(store)
        .await
        .with_context(|| format!("save note {name} failed"))?;
    println!("saved {saved_name}");
    Ok(())
}

async fn duplicate(store: &FileStore, names: &[String]) -> Result<()> {
    store.ensure_store_exists().await?;
    let mut view = BrowseView::new();
    view.refresh(store).await.context("list store failed")?;

    let mut names = names.iter();
    let first = names.next().expect("clap enforces at least one name");
    view.enter_selection(store.entry_path(first));
    for name in names {
        view.toggle(store.entry_path(name));
    }

    let report = view.duplicate_selected(store).await;
    for item in &report.outcomes {
        match &item.result {
            Ok(new_name) => println!("{} -> {}", item.path.display(), new_name),
            Err(err) => eprintln!("{}: {}", item.path.display(), err),
        }
    }
    if !report.is_clean() {
        bail!(
            "{} of {} duplications failed",
            report.failures(),
            report.len()
        );
    }
    Ok(())
}

async fn remove(store: &FileStore, names: &[String], yes: bool) -> Result<()> {
    if !yes {
        bail!("refusing to delete without --yes");
    }
    store.ensure_store_exists().await?;
    let mut view = BrowseView::new();
    view.refresh(store).await.context("list store failed")?;

    let mut names = names.iter();
    let first = names.next().expect("clap enforces at least one name");
    view.enter_selection(store.entry_path(first));
    for name in names {
        view.toggle(store.entry_path(name));
    }

    let report = view.delete_selected(store).await;
    for item in &report.outcomes {
        match &item.result {
            Ok(()) => println!("removed {}", item.path.display()),
            Err(err) => eprintln!("{}: {}", item.path.display(), err),
        }
    }
    if !report.is_clean() {
        bail!("{} of {} deletions failed", report.failures(), report.len());
    }
    Ok(())
}
