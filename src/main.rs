use anyhow::Result;
use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind, MouseButton,
    MouseEvent, MouseEventKind,
};
use crossterm::execute;
use ratatui::DefaultTerminal;
use std::time::Duration;
use tui_choropleth::app::{App, RegionEvent};
use tui_choropleth::data::GeometryLoader;
use tui_choropleth::ui;
use tui_choropleth::weather::FileWeatherSource;

fn main() -> Result<()> {
    env_logger::init();

    let mut terminal = ratatui::init();
    terminal.clear()?;

    execute!(std::io::stdout(), EnableMouseCapture)?;

    let result = run(&mut terminal);

    let _ = execute!(std::io::stdout(), DisableMouseCapture);
    ratatui::restore();

    result
}

/// Handle mouse events for panning, zooming, hover and clicks
fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    match mouse.kind {
        // Scroll wheel zooms towards the mouse position; crossing the
        // threshold swaps the dataset underneath the cursor
        MouseEventKind::ScrollUp => app.zoom_in_at(mouse.column, mouse.row),
        MouseEventKind::ScrollDown => app.zoom_out_at(mouse.column, mouse.row),
        MouseEventKind::Down(MouseButton::Left) => {
            app.start_drag(mouse.column, mouse.row);
        }
        MouseEventKind::Drag(MouseButton::Left) => {
            app.handle_drag(mouse.column, mouse.row);
        }
        MouseEventKind::Up(MouseButton::Left) => {
            app.end_drag();
            app.click(mouse.column, mouse.row);
        }
        MouseEventKind::Moved => {
            app.update_hover(mouse.column, mouse.row);
        }
        _ => {}
    }
}

/// Forward drained region events to the popup layer's seam.
/// The popups themselves live outside this binary; their inputs are
/// logged so the contract stays observable.
fn dispatch_events(app: &mut App) {
    for event in app.take_events() {
        match event {
            RegionEvent::Clicked {
                level,
                name,
                province,
                id,
                column,
                row,
            } => log::info!(
                "region click: {} ({}) province={:?} id={:?} at {},{}",
                name,
                level.label(),
                province,
                id,
                column,
                row
            ),
            RegionEvent::Hovered {
                name,
                classification,
            } => log::debug!("hover: {} [{}]", name, classification.label()),
        }
    }
}

fn run(terminal: &mut DefaultTerminal) -> Result<()> {
    let size = terminal.size()?;
    let loader = GeometryLoader::new("data");
    let weather = Box::new(FileWeatherSource::new("data"));
    let mut app = App::new(loader, weather, size.width as usize, size.height as usize)?;

    loop {
        terminal.draw(|frame| ui::render(frame, &app))?;

        if event::poll(Duration::from_millis(16))? {
            match event::read()? {
                Event::Key(key) => {
                    // Only handle key press events (not release)
                    if key.kind == KeyEventKind::Press {
                        match key.code {
                            KeyCode::Char('q') | KeyCode::Esc => app.quit(),

                            // Pan with hjkl or arrow keys
                            KeyCode::Left | KeyCode::Char('h') => app.pan(20.0, 0.0),
                            KeyCode::Right | KeyCode::Char('l') => app.pan(-20.0, 0.0),
                            KeyCode::Up | KeyCode::Char('k') => app.pan(0.0, 12.0),
                            KeyCode::Down | KeyCode::Char('j') => app.pan(0.0, -12.0),

                            // Zoom
                            KeyCode::Char('+') | KeyCode::Char('=') => app.zoom_in(),
                            KeyCode::Char('-') | KeyCode::Char('_') => app.zoom_out(),

                            // Weather refresh
                            KeyCode::Char('u') | KeyCode::Char('U') => app.refresh_weather(),

                            // Back to the province map, classifications cleared
                            KeyCode::Char('r') | KeyCode::Char('0') => app.reset(),

                            // Layer toggles
                            KeyCode::Char('L') => {
                                app.renderer.settings.show_labels =
                                    !app.renderer.settings.show_labels;
                            }
                            KeyCode::Char('b') | KeyCode::Char('B') => {
                                app.renderer.settings.show_boundaries =
                                    !app.renderer.settings.show_boundaries;
                            }

                            _ => {}
                        }
                    }
                }
                Event::Mouse(mouse) => {
                    handle_mouse(&mut app, mouse);
                }
                Event::Resize(width, height) => {
                    app.resize(width as usize, height as usize);
                }
                _ => {}
            }
        }

        dispatch_events(&mut app);

        if app.should_quit {
            break;
        }
    }

    Ok(())
}
