mod dispatch;
mod terminal;

use std::io::Write;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crossterm::event;
use tailgrid_core::ContainerInfo;
use tailgrid_render::input::InputEvent;
use tailgrid_runtime::cache::{CachedRuntime, JsonFileSink};
use tailgrid_runtime::docker::DockerRuntime;
use tailgrid_runtime::runtime::ContainerRuntime;
use tailgrid_tui::app::{App, AppEvent};
use tailgrid_tui::config::ViewerConfig;
use tailgrid_tui::debounce::Debouncer;
use tailgrid_tui::logging::init_file_logging;
use tailgrid_tui::theme::{detect_color_capability, resolve_theme};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::dispatch::Dispatcher;
use crate::terminal::{map_terminal_event, render_frame, terminal_size, TerminalSession};

const EVENT_QUEUE_CAPACITY: usize = 1024;
const INPUT_POLL_INTERVAL: Duration = Duration::from_millis(100);

#[tokio::main]
async fn main() {
    let config = ViewerConfig::from_env(std::env::args().skip(1).collect());
    if let Err(err) = init_file_logging(&config.log_file) {
        eprintln!("tailgrid: {err}");
    }
    // The terminal session is dropped inside `run`, so errors print on a
    // restored screen.
    if let Err(err) = run(config).await {
        eprintln!("tailgrid: {err}");
        std::process::exit(1);
    }
}

async fn run(config: ViewerConfig) -> Result<(), String> {
    let docker: Arc<dyn ContainerRuntime> = Arc::new(
        DockerRuntime::connect(config.socket.clone()).map_err(|err| format!("connect to docker: {err}"))?,
    );
    let cached = Arc::new(CachedRuntime::new(docker, config.listing_ttl));
    let runtime: Arc<dyn ContainerRuntime> = cached.clone();

    let listed = runtime
        .list_containers()
        .await
        .map_err(|err| format!("list containers via {}: {err}", config.socket.display()))?;
    let containers = select_containers(&listed, &config.containers)?;
    info!(count = containers.len(), "starting viewer");

    let capability = detect_color_capability(std::env::var("TERM").ok().as_deref());
    let theme = resolve_theme(&config.palette, capability);
    let mut app = App::new(config.clone(), theme, containers);

    let (events_tx, mut events_rx) = mpsc::channel::<AppEvent>(EVENT_QUEUE_CAPACITY);
    let cancel = CancellationToken::new();
    let mut dispatcher = Dispatcher::new(runtime, cancel.clone(), events_tx.clone(), &config);

    let mut terminal_session =
        TerminalSession::enter().map_err(|err| format!("enter terminal mode: {err}"))?;
    let size = terminal_size().map_err(|err| format!("read terminal size: {err}"))?;
    apply(&mut app, &mut dispatcher, AppEvent::Resize(size), &mut terminal_session.stdout)?;
    let start = app.start();
    dispatcher
        .execute(start, &mut app, &mut terminal_session.stdout)
        .map_err(|err| format!("start streams: {err}"))?;
    spawn_input_reader(events_tx, cancel.clone());

    let mut resize = Debouncer::new(config.resize_debounce);
    let mut dirty = true;
    loop {
        if dirty {
            let frame = app.render();
            render_frame(&mut terminal_session.stdout, &frame)
                .map_err(|err| format!("render frame: {err}"))?;
            dirty = false;
        }
        if app.quitting() {
            break;
        }

        let deadline = resize.deadline();
        let wake = tokio::time::Instant::from_std(deadline.unwrap_or_else(Instant::now));
        tokio::select! {
            received = events_rx.recv() => {
                let Some(event) = received else {
                    break;
                };
                if let AppEvent::Input(InputEvent::Resize(size)) = event {
                    resize.observe(size, Instant::now());
                    continue;
                }
                apply(&mut app, &mut dispatcher, event, &mut terminal_session.stdout)?;
                dirty = true;
            }
            _ = tokio::time::sleep_until(wake), if deadline.is_some() => {
                if let Some(size) = resize.fire(Instant::now()) {
                    apply(&mut app, &mut dispatcher, AppEvent::Resize(size), &mut terminal_session.stdout)?;
                    dirty = true;
                }
            }
        }
    }

    dispatcher.shutdown();
    drop(terminal_session);
    cached.flush(&JsonFileSink::new(config.log_file.with_extension("containers.json")));
    info!("viewer closed");
    Ok(())
}

/// Feed one event to the app and carry out whatever it asks for.
fn apply<W: Write>(app: &mut App, dispatcher: &mut Dispatcher, event: AppEvent, out: &mut W) -> Result<(), String> {
    let command = app.update(event);
    dispatcher
        .execute(command, app, out)
        .map_err(|err| format!("write terminal: {err}"))
}

/// Containers named by `references`, or every running container when none
/// are given.
fn select_containers(listed: &[ContainerInfo], references: &[String]) -> Result<Vec<ContainerInfo>, String> {
    if references.is_empty() {
        let running: Vec<ContainerInfo> = listed.iter().filter(|c| c.is_running()).cloned().collect();
        if running.is_empty() {
            return Err("no running containers".to_owned());
        }
        return Ok(running);
    }
    let mut selected: Vec<ContainerInfo> = Vec::new();
    for reference in references {
        let found = listed
            .iter()
            .find(|candidate| candidate.matches_reference(reference))
            .ok_or_else(|| format!("no container matches {reference:?}"))?;
        if selected.iter().any(|existing| existing.id == found.id) {
            continue;
        }
        selected.push(found.clone());
    }
    Ok(selected)
}

/// Blocking crossterm reads on a dedicated thread, forwarded into the loop.
fn spawn_input_reader(events: mpsc::Sender<AppEvent>, cancel: CancellationToken) {
    tokio::task::spawn_blocking(move || {
        while !cancel.is_cancelled() {
            match event::poll(INPUT_POLL_INTERVAL) {
                Ok(false) => continue,
                Ok(true) => {}
                Err(err) => {
                    warn!(error = %err, "terminal poll failed");
                    break;
                }
            }
            let input = match event::read() {
                Ok(raw) => map_terminal_event(raw),
                Err(err) => {
                    warn!(error = %err, "terminal read failed");
                    break;
                }
            };
            if let Some(input) = input {
                if events.blocking_send(AppEvent::Input(input)).is_err() {
                    break;
                }
            }
        }
    });
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use tailgrid_core::RunState;
    use tailgrid_render::input::{InputEvent, Key, KeyEvent, ResizeEvent};
    use tailgrid_render::style::ThemeSpec;
    use tailgrid_runtime::mock::{test_container, MockRuntime};
    use tailgrid_tui::app::{App, AppEvent};
    use tailgrid_tui::config::ViewerConfig;
    use tokio::sync::mpsc;
    use tokio_util::sync::CancellationToken;

    use super::{apply, select_containers};
    use crate::dispatch::Dispatcher;

    #[test]
    fn applied_events_reach_the_dispatcher() {
        let config = ViewerConfig::default();
        let mut app = App::new(config.clone(), ThemeSpec::default(), vec![test_container("c1", "api", "shop", "api")]);
        let (tx, _rx) = mpsc::channel(8);
        let cancel = CancellationToken::new();
        let mut dispatcher = Dispatcher::new(Arc::new(MockRuntime::new()), cancel.clone(), tx, &config);
        let mut out = Vec::new();

        let resize = AppEvent::Resize(ResizeEvent { width: 80, height: 24 });
        assert!(apply(&mut app, &mut dispatcher, resize, &mut out).is_ok());
        assert_eq!(app.grid_area().height, 23);
        assert!(!cancel.is_cancelled());

        let quit = AppEvent::Input(InputEvent::Key(KeyEvent::plain(Key::Char('q'))));
        assert!(apply(&mut app, &mut dispatcher, quit, &mut out).is_ok());
        assert!(cancel.is_cancelled());
    }

    #[test]
    fn no_references_selects_running_containers() {
        let mut stopped = test_container("c2", "worker", "shop", "worker");
        stopped.state = RunState::Exited;
        let listed = vec![test_container("c1", "api", "shop", "api"), stopped];
        let selected = select_containers(&listed, &[]).unwrap_or_default();
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].id, "c1");
    }

    #[test]
    fn references_keep_order_and_include_stopped() {
        let mut stopped = test_container("c2", "worker", "shop", "worker");
        stopped.state = RunState::Exited;
        let listed = vec![test_container("c1", "api", "shop", "api"), stopped];
        let refs = vec!["worker".to_owned(), "c1".to_owned(), "api".to_owned()];
        let selected = select_containers(&listed, &refs).unwrap_or_default();
        let ids: Vec<&str> = selected.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["c2", "c1"]);
    }

    #[test]
    fn unknown_reference_is_an_error() {
        let listed = vec![test_container("c1", "api", "shop", "api")];
        let err = select_containers(&listed, &["nope".to_owned()]).err();
        assert_eq!(err.as_deref(), Some("no container matches \"nope\""));
        assert!(select_containers(&[], &[]).is_err());
    }
}
