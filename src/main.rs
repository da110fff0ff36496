use std::error::Error;
use std::sync::Arc;

use chrono::Local;
use clap::{Parser, Subcommand};
use dotenvy::dotenv;
use tokio::io::BufReader;
use tokio::sync::mpsc;

use warung::common::Category;
use warung::config::{self, AppConfig};
use warung::feed::{ChatSession, SessionHandle};
use warung::menu::{
    MenuCatalog, MenuUpdate, NewMenuItem, Order, filter_items, group_by_category, render_receipt,
};
use warung::storage::{DocumentStore, SqliteStore};
use warung::ui::ChatApp;
use warung::ui::components::menu_table;

#[derive(Parser)]
#[command(name = "warung", version, about = "Warung menu, orders and realtime chat")]
struct Cli {
    /// Path to JSON config file
    #[arg(long, default_value = config::DEFAULT_CONFIG_PATH, value_name = "FILE")]
    config: String,
    /// Override the database file from the config
    #[arg(long, value_name = "FILE")]
    database: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Open the realtime chat page
    Chat {
        /// Display name for outgoing messages
        #[arg(long)]
        sender: Option<String>,
    },
    /// Manage the menu catalog
    #[command(subcommand)]
    Menu(MenuCommand),
    /// Write the effective configuration to the --config file
    Init,
    /// Take an order by menu codes and print its receipt
    Order {
        #[arg(long, default_value = "")]
        customer: String,
        /// Menu codes; repeat a code to order more than one
        codes: Vec<String>,
    },
}

#[derive(Subcommand)]
enum MenuCommand {
    List {
        #[arg(long, default_value = "")]
        search: String,
        #[arg(long)]
        category: Option<String>,
        /// Group by category the way the waiter page shows it
        #[arg(long)]
        sections: bool,
    },
    Add {
        code: String,
        name: String,
        category: String,
        price: i64,
    },
    Update {
        id: String,
        #[arg(long)]
        code: Option<String>,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        price: Option<i64>,
    },
    Delete {
        id: String,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    dotenv().ok();
    env_logger::init();

    let cli = Cli::parse();
    let mut app_config = config::load_config(&cli.config);
    if let Some(database) = cli.database {
        app_config.database_path = database;
    }

    if let Command::Init = cli.command {
        config::save_config(&cli.config, &app_config)?;
        println!("Wrote {}", cli.config);
        return Ok(());
    }

    let store: Arc<dyn DocumentStore> = Arc::new(SqliteStore::open(&app_config.database_path)?);

    let result = match cli.command {
        Command::Chat { sender } => run_chat(store, &app_config, sender).await,
        Command::Menu(command) => run_menu(store, command).await,
        Command::Order { customer, codes } => run_order(store, customer, codes).await,
        Command::Init => Ok(()),
    };

    if let Err(err) = &result {
        log::error!("warung terminated: {err}");
    }
    result
}

async fn run_chat(
    store: Arc<dyn DocumentStore>,
    app_config: &AppConfig,
    sender: Option<String>,
) -> Result<(), Box<dyn Error>> {
    let session = ChatSession::mount(store, app_config.page_size()).await?;

    // Session -> UI
    let (event_tx, event_rx) = mpsc::channel(100);
    let handle = SessionHandle::spawn(session, event_tx);

    let sender = sender.unwrap_or_else(|| app_config.default_sender.clone());
    log::info!("Chat page opened as {sender}");

    let app = ChatApp::new(handle, event_rx, sender, app_config.chime, std::io::stdout());
    app.run(BufReader::new(tokio::io::stdin())).await?;
    Ok(())
}

async fn run_menu(store: Arc<dyn DocumentStore>, command: MenuCommand) -> Result<(), Box<dyn Error>> {
    let catalog = MenuCatalog::new(store);
    match command {
        MenuCommand::List {
            search,
            category,
            sections,
        } => {
            let items = catalog.list().await?;
            if sections {
                println!("{}", menu_table::render_sections(&group_by_category(&items)));
            } else {
                let category = category.as_deref().map(Category::from);
                println!(
                    "{}",
                    menu_table::render(&filter_items(&items, &search, category.as_ref()))
                );
            }
        }
        MenuCommand::Add {
            code,
            name,
            category,
            price,
        } => {
            let item = catalog
                .add(NewMenuItem {
                    code,
                    name,
                    category: Category::from(category.as_str()),
                    price,
                })
                .await?;
            println!("Added {} ({})", item.name, item.id);
        }
        MenuCommand::Update {
            id,
            code,
            name,
            category,
            price,
        } => {
            let update = MenuUpdate {
                code,
                name,
                category: category.as_deref().map(Category::from),
                price,
            };
            catalog.update(&id, update).await?;
            println!("Updated {id}");
        }
        MenuCommand::Delete { id } => {
            catalog.delete(&id).await?;
            println!("Deleted {id}");
        }
    }
    Ok(())
}

async fn run_order(
    store: Arc<dyn DocumentStore>,
    customer: String,
    codes: Vec<String>,
) -> Result<(), Box<dyn Error>> {
    let catalog = MenuCatalog::new(store);

    let mut order = Order::new(customer);
    for code in &codes {
        match catalog.find_by_code(code).await? {
            Some(item) => order.add_item(&item)?,
            None => log::warn!("Unknown menu code `{code}`; skipped"),
        }
    }

    order.mark_printed(Local::now());
    print!("{}", render_receipt(&order));
    Ok(())
}
