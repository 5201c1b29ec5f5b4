mod command;
mod render;

use serde::de::DeserializeOwned;
use shelf_access::{Action, Role, Section, can_enter, can_perform};
use shelf_client::{Book, BookCategory, ClientConfig, HttpClient, HttpListFetcher, HttpReferenceSource, Staff, User};
use shelf_lists::{ListController, ListError, Phase, ScreenConfig};
use shelf_reference::{BOOK_CATEGORIES, DatasetState, ReferenceCache};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};

use crate::command::{Command, HELP};
use crate::render::Row;

type Categories = ReferenceCache<HttpReferenceSource>;

fn load_config(screen: &str) -> ScreenConfig {
    let Ok(path) = std::env::var("SHELF_SCREEN_CONFIG") else {
        return ScreenConfig::preset(screen).unwrap_or_else(|e| {
            eprintln!("{e}; expected one of {}", ScreenConfig::SCREENS.join(", "));
            std::process::exit(1);
        });
    };

    let content = std::fs::read_to_string(&path).unwrap_or_else(|e| {
        eprintln!("failed to read screen config from {path}: {e}");
        std::process::exit(1);
    });

    ScreenConfig::from_json(&content).unwrap_or_else(|e| {
        eprintln!("failed to parse screen config from {path}: {e}");
        std::process::exit(1);
    })
}

fn authorize(config: &ScreenConfig) {
    let roles = std::env::var("SHELF_ROLES").unwrap_or_else(|_| {
        eprintln!("SHELF_ROLES is required");
        std::process::exit(1);
    });
    let roles = Role::parse_list(&roles);

    if !can_enter(&roles) {
        eprintln!("the admin console requires the Admin or Staff role");
        std::process::exit(1);
    }
    let section: Section = config.id.parse().unwrap_or_else(|e| {
        eprintln!("{e}");
        std::process::exit(1);
    });
    if !can_perform(&roles, Action::View(section)) {
        eprintln!("roles {roles:?} may not open the {section} screen");
        std::process::exit(1);
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();

    let screen = std::env::args().nth(1).unwrap_or_else(|| "books".to_string());
    let config = load_config(&screen);
    authorize(&config);

    let client = HttpClient::new(ClientConfig::from_env());
    let categories = ReferenceCache::new(
        BOOK_CATEGORIES,
        HttpReferenceSource::book_categories(client.clone()),
    );

    info!(
        screen = %config.id,
        api = %client.config().api_base_url,
        "starting shelf console"
    );

    match config.id.as_str() {
        "categories" => run::<BookCategory>(config, client, categories).await,
        "staff" => run::<Staff>(config, client, categories).await,
        "users" => run::<User>(config, client, categories).await,
        _ => run::<Book>(config, client, categories).await,
    }
}

async fn run<T>(config: ScreenConfig, client: HttpClient, categories: Categories)
where
    T: Row + DeserializeOwned + Send + Sync + 'static,
{
    if config.id == "books" {
        let eager = categories.clone();
        tokio::spawn(async move { eager.ensure_loaded().await });
    }
    let _categories_loaded = categories.subscribe(|snapshot| {
        if let DatasetState::Failed(reason) = &snapshot.state {
            warn!(%reason, "book categories unavailable");
        }
    });

    let fetcher = HttpListFetcher::<T>::new(client, &config.endpoint, &config.search_param);
    let title = config.title.clone();
    let controller = ListController::new(config, fetcher);

    let mut views = controller.subscribe();
    let printer = tokio::spawn(async move {
        while views.changed().await.is_ok() {
            let view = views.borrow_and_update().clone();
            if view.phase == Phase::Idle {
                print!("{}", render::view(&title, &view));
            }
        }
    });

    controller.refresh();
    println!("{HELP}");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                eprintln!("failed to read input: {e}");
                break;
            }
        };

        let command = match command::parse(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(e) => {
                println!("{e}");
                continue;
            }
        };

        match command {
            Command::Quit => break,
            Command::Help => println!("{HELP}"),
            Command::Categories => {
                let snapshot = categories.retry().await;
                print!("{}", render::categories(&snapshot));
            }
            other => {
                if let Err(e) = dispatch(&controller, other) {
                    println!("{e}");
                }
            }
        }
    }

    drop(controller);
    printer.abort();
}

fn dispatch<T>(
    controller: &ListController<HttpListFetcher<T>>,
    command: Command,
) -> Result<(), ListError>
where
    T: DeserializeOwned + Send + Sync + 'static,
{
    match command {
        Command::Search(text) => {
            controller.input_text(text);
        }
        Command::Filter { key, value } => {
            controller.set_filter(&key, value)?;
        }
        Command::Unfilter(key) => {
            controller.clear_filter(&key)?;
        }
        Command::Sort {
            key,
            direction: Some(direction),
        } => {
            controller.set_sort(&key, direction)?;
        }
        Command::Sort {
            key,
            direction: None,
        } => {
            controller.toggle_sort(&key)?;
        }
        Command::Page(page) => {
            controller.set_page(page)?;
        }
        Command::Next => {
            if controller.next_page().is_none() {
                println!("already on the last page");
            }
        }
        Command::Prev => {
            if controller.previous_page().is_none() {
                println!("already on the first page");
            }
        }
        Command::Refresh => {
            controller.refresh();
        }
        Command::Categories | Command::Help | Command::Quit => {}
    }
    Ok(())
}
