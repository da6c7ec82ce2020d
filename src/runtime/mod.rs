use std::env;
use std::sync::Arc;

use crossterm::execute;
use crossterm::terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode};
use ratatui::{Terminal, backend::CrosstermBackend};
use tracing::info;

use crate::app::App;
use crate::catalog::{CatalogStore, SqliteBackend};
use crate::detail::DirectoryShare;
use crate::search::{ITunesProvider, SearchClient};

mod event_loop;
mod settings;
mod startup;


pub fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args = match startup::Args::parse(env::args().skip(1)) {
        Ok(args) => args,
        Err(msg) => {
            eprintln!("record: {msg}\n{}", startup::USAGE);
            return Err(msg.into());
        }
    };
    if args.help {
        println!("{}", startup::USAGE);
        return Ok(());
    }

    let mut settings = settings::load_settings(args.config.as_deref());
    if let Some(database) = args.database {
        settings.storage.database_path = database;
    }
    startup::init_logging(&settings.log);
    info!(
        database = %settings.storage.database_path.display(),
        endpoint = %settings.search.endpoint,
        "starting"
    );

    let backend = SqliteBackend::open(&settings.storage.database_path)?;
    let store = CatalogStore::open(Box::new(backend))?;
    let search = SearchClient::spawn(Arc::new(ITunesProvider::new(&settings.search)));
    let share = DirectoryShare::new(settings.export.directory.clone());
    let mut app = App::new(store, search, Box::new(share), &settings.ui);

    enable_raw_mode()?;
    let mut stdout = std::io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let run_result = event_loop::run(&mut terminal, &settings, &mut app);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    info!("shutting down");
    run_result
}
