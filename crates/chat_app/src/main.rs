use std::io;

use chat_app::app::App;
use chat_app::clients::client_from_config;
use chat_app::config::AppConfig;
use chat_app::event::{AppEvent, EventQueue};
use chat_app::logging::{self, LogConfig};
use chat_app::runtime::RuntimeController;
use chat_app::tui::AppView;
use chat_store::ChatStore;
use chatterm::{ProcessTerminal, TerminalConfig, Tui};
use tracing::{info, warn};

fn main() -> io::Result<()> {
    let config = AppConfig::from_env().map_err(io::Error::other)?;
    let _log_guard = logging::init(&LogConfig {
        file: config.log_file.clone(),
    })
    .map_err(io::Error::other)?;
    info!(
        client = %config.client_id,
        store = %config.store_path.display(),
        "starting chat_app"
    );

    let client = client_from_config(&config).map_err(io::Error::other)?;
    let store = ChatStore::open(&config.store_path);
    if let Err(error) = &store {
        warn!(%error, "store unavailable");
    }

    let (queue, events) = EventQueue::new();
    let mut host = RuntimeController::new(client, store, queue.clone());
    let mut app = App::new(config.dev_notices);

    let mut tui = Tui::new(ProcessTerminal::with_config(&TerminalConfig::from_env()));
    let input_queue = queue.clone();
    let resize_queue = queue;
    tui.start(
        move |event| input_queue.post(AppEvent::Input(event)),
        move || resize_queue.post(AppEvent::Resize),
    )?;

    app.start(&mut host);
    tui.draw(&mut AppView::new(&app));

    while let Ok(event) = events.recv() {
        let resized = matches!(event, AppEvent::Resize);
        app.handle(event, &mut host);
        if resized {
            tui.invalidate();
        }
        if host.take_render_request() {
            tui.draw(&mut AppView::new(&app));
        }
        if app.should_exit || host.stop_requested() {
            break;
        }
    }

    info!("shutting down");
    let stopped = tui.stop();
    host.shutdown();
    stopped
}
