//! lernbox command line
//!
//! Thin presentation layer over the repository: every subcommand maps to
//! one repository or practice-queue operation. Holds no domain logic.

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};

use lernbox::cards::models::DEFAULT_FOLDER_COLOR;
use lernbox::cards::EntityKind;
use lernbox::{Config, FileStore, FolderDraft, FolderSelection, PracticeQueue, Repository};

#[derive(Parser)]
#[command(
    name = "lernbox-cli",
    about = "Flashcard folders, card sets and practice sessions",
    version
)]
struct Cli {
    /// Use a specific data directory (default: config file, then platform dir)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List folders and how their sets are filed
    Folders,

    /// List card sets, all active ones or a single folder's
    Sets {
        /// Folder ID to list (includes its inactive sets)
        #[arg(long)]
        folder: Option<String>,
    },

    /// List the cards of a set
    Cards {
        /// Set ID
        set: String,
    },

    /// Create a folder
    NewFolder {
        title: String,
        /// Accent color
        #[arg(long, default_value = DEFAULT_FOLDER_COLOR)]
        color: String,
    },

    /// Create a card set filed under existing and/or new folders
    NewSet {
        title: String,
        /// Existing folder ID to file the set under (repeatable)
        #[arg(long = "folder")]
        folders: Vec<String>,
        /// Title of a folder to create alongside the set (repeatable)
        #[arg(long = "new-folder")]
        new_folders: Vec<String>,
    },

    /// Create a card in a set's remaining queue
    NewCard {
        /// Set ID
        set: String,
        title: String,
        answer: String,
    },

    /// Rewrite a card's title and answer
    EditCard {
        /// Card ID
        card: String,
        title: String,
        answer: String,
    },

    /// Delete a folder, card set or card by ID, cascading to children
    Delete {
        /// Entity ID (f…, s… or c…)
        id: String,
    },

    /// Mark a set active for daily practice
    Star {
        /// Set ID
        set: String,
    },

    /// Unmark a set
    Unstar {
        /// Set ID
        set: String,
    },

    /// Move every learned card back into the remaining queue
    Reset {
        /// Set ID
        set: String,
    },

    /// Run an interactive practice session over a set
    Practice {
        /// Set ID
        set: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    let config = Config::load();
    let data_dir = cli
        .data_dir
        .clone()
        .or_else(|| config.storage_dir())
        .context("could not resolve a data directory")?;

    let store = FileStore::new(data_dir);
    store.init().await?;
    let mut repo = Repository::load(Arc::new(store)).await?;

    match cli.command {
        Command::Folders => {
            if repo.folders().is_empty() {
                println!("No folders in your library");
            }
            for folder in repo.folders() {
                println!(
                    "{}  {}  ({} active, {} inactive)",
                    folder.folder_id,
                    folder.title,
                    folder.active_sets.len(),
                    folder.inactive_sets.len()
                );
            }
        }

        Command::Sets { folder } => {
            if let Some(folder_id) = folder {
                repo.open_folder(&folder_id).await?;
                for set in repo.card_sets() {
                    if set.parent_folders.contains(&folder_id) {
                        print_set_line(set);
                    }
                }
            } else {
                if repo.card_sets().is_empty() {
                    println!("No sets to practice today");
                }
                for set in repo.card_sets() {
                    print_set_line(set);
                }
            }
        }

        Command::Cards { set } => {
            let record = repo.get_card_set(&set).await?;
            repo.load_cards(&set).await?;
            for card in repo.cards() {
                let mark = if record.learned_cards.contains(&card.card_id) {
                    "learned"
                } else {
                    "remaining"
                };
                println!("{}  [{}]  {}", card.card_id, mark, card.title);
            }
        }

        Command::NewFolder { title, color } => {
            let folder = repo.create_folder(&title, &color).await?;
            println!("Created folder {}", folder.folder_id);
        }

        Command::NewSet {
            title,
            folders,
            new_folders,
        } => {
            let selection = FolderSelection {
                existing: folders,
                new: new_folders.into_iter().map(FolderDraft::new).collect(),
            };
            let set = repo.create_card_set(&title, selection).await?;
            println!(
                "Created set {} under {}",
                set.card_set_id,
                set.parent_folders.join(", ")
            );
        }

        Command::NewCard { set, title, answer } => {
            let card = repo.create_card(&title, &answer, &set).await?;
            println!("Created card {}", card.card_id);
        }

        Command::EditCard {
            card,
            title,
            answer,
        } => {
            repo.update_card(&card, &title, &answer).await?;
            println!("Updated card {}", card);
        }

        Command::Delete { id } => {
            match EntityKind::of_id(&id) {
                Some(EntityKind::Folder) => repo.delete_folder(&id).await?,
                Some(EntityKind::Set) => repo.delete_card_set(&id).await?,
                Some(EntityKind::Card) => repo.delete_card(&id).await?,
                None => anyhow::bail!("unrecognized entity ID: {}", id),
            }
            println!("Deleted {}", id);
        }

        Command::Star { set } => {
            repo.set_active(&set, true).await?;
            println!("Starred {}", set);
        }

        Command::Unstar { set } => {
            repo.set_active(&set, false).await?;
            println!("Unstarred {}", set);
        }

        Command::Reset { set } => {
            let record = repo.reset_progress(&set).await?;
            println!(
                "Reset {}: {} card(s) back in the queue",
                set,
                record.remaining_cards.len()
            );
        }

        Command::Practice { set } => {
            practice(&mut repo, &set).await?;
        }
    }

    Ok(())
}

fn print_set_line(set: &lernbox::CardSet) {
    let star = if set.active { "*" } else { " " };
    println!(
        "{} {}  {}  ({}/{} learned)",
        star,
        set.card_set_id,
        set.title,
        set.learned_cards.len(),
        set.learned_cards.len() + set.remaining_cards.len()
    );
}

/// Interactive review loop; progress is persisted after every answer so
/// an interrupted session loses at most the card on screen.
async fn practice(repo: &mut Repository, set_id: &str) -> anyhow::Result<()> {
    let set = repo.get_card_set(set_id).await?;
    repo.load_cards(set_id).await?;

    let mut queue = PracticeQueue::new(&set, repo.cards())?;
    println!(
        "Practicing {}: {} card(s) to go\n",
        set.title,
        queue.remaining_count()
    );

    while !queue.is_completed() {
        let (title, answer) = {
            let card = queue.current()?;
            (card.title.clone(), card.answer.clone())
        };

        println!("  {}", title);
        prompt("  [Enter] to reveal the answer ")?;
        println!("  {}", answer);

        let correct = loop {
            let line = prompt("  Did you know it? [y/n] ")?;
            match line.trim() {
                "y" | "Y" => break true,
                "n" | "N" => break false,
                _ => continue,
            }
        };

        queue.answer(correct)?;
        let progress = queue.commit();
        repo.save_progress(set_id, progress.remaining, progress.learned)
            .await?;

        println!(
            "  {} left, {} learned, {} wrong so far\n",
            queue.remaining_count(),
            queue.learned_count(),
            queue.wrong_answers()
        );
    }

    println!("Done. {} wrong answer(s) this session.", queue.wrong_answers());
    Ok(())
}

fn prompt(message: &str) -> anyhow::Result<String> {
    print!("{}", message);
    std::io::stdout().flush()?;
    let mut line = String::new();
    std::io::stdin().read_line(&mut line)?;
    Ok(line)
}
