//! Chat command - the terminal chat client.

use std::{fs::File, io, sync::Mutex, time::Duration};

use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Terminal, backend::CrosstermBackend};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use parley::{Node, NodeConfig};

use crate::{app::App, bootstrap, cli::ChatArgs, handlers::handle_key_event, ui::ui};

/// Logs go to a file when asked; the terminal belongs to the UI.
fn init_logging(args: &ChatArgs) -> io::Result<()> {
    let Some(path) = &args.log_file else {
        return Ok(());
    };
    let default = if args.verbose { "debug" } else { "parley=info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)))
        .with_ansi(false)
        .with_writer(Mutex::new(File::create(path)?))
        .init();
    Ok(())
}

/// Run the chat client until the user quits
pub async fn run(args: &ChatArgs) -> Result<(), Box<dyn std::error::Error>> {
    init_logging(args)?;

    let mut config = NodeConfig::default();
    if let Some(path) = &args.data_file {
        config = config.with_data_file(path.clone());
    }
    let node = Node::open(config).await?;

    let mut app = App::new(node.clone());
    let peer = bootstrap::select_peer(args.url.as_deref(), args.peer.as_deref());
    match bootstrap::connect(&node, peer, &args.host, args.port_base) {
        Ok(address) => app.peer = address,
        Err(e) => app.status_message = Some(format!("Could not dial peer: {e}")),
    }

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, &mut app).await;

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(e) = node.shutdown().await {
        warn!(error = %e, "Failed to shut down node cleanly");
    }
    info!("Chat client closed");

    res?;
    Ok(())
}

async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
) -> io::Result<()> {
    loop {
        app.refresh();
        terminal.draw(|f| ui(f, app))?;

        let mut handled_event = false;
        while event::poll(Duration::from_millis(0))? {
            if let Event::Key(key) = event::read()? {
                handled_event = true;
                if key.kind == KeyEventKind::Press {
                    handle_key_event(app, key.code, key.modifiers).await;
                }
            }
        }

        if app.should_quit {
            break;
        }

        // Give sync tasks room between frames.
        if !handled_event {
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
    }
    Ok(())
}
