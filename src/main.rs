use anyhow::{Context, Result};
use clap::Parser;
use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind, MouseButton, MouseEvent,
    MouseEventKind,
};
use crossterm::execute;
use foodmap::app::App;
use foodmap::config::Args;
use foodmap::dashboard::DashboardView;
use foodmap::report::write_report;
use foodmap::{data, logging, ui};
use ratatui::DefaultTerminal;
use std::io::{self, Write};
use std::process::ExitCode;
use std::time::Duration;
use tracing::{error, info};

fn main() -> Result<ExitCode> {
    let args = Args::parse();

    if args.check {
        logging::init_stderr(&args.log_level)?;
        return check(&args);
    }

    let _guard = logging::init_file(&args.log_dir, &args.log_level)?;
    info!(version = env!("CARGO_PKG_VERSION"), "starting dashboard");

    // Initialize terminal
    let mut terminal = ratatui::init();
    terminal.clear()?;

    // Enable mouse capture
    execute!(io::stdout(), EnableMouseCapture)?;

    // Run the app
    let result = run(&mut terminal, &args);

    // Disable mouse capture and restore terminal
    let _ = execute!(io::stdout(), DisableMouseCapture);
    ratatui::restore();

    if let Err(e) = &result {
        error!(error = %e, "dashboard exited with an error");
    }
    result.map(|()| ExitCode::SUCCESS)
}

/// Load once, print the join report and exit
fn check(args: &Args) -> Result<ExitCode> {
    let dataset = match data::load(&args.sources()) {
        Ok(dataset) => dataset,
        Err(e) => {
            error!(error = %e, "load failed");
            eprintln!("error: {e}");
            return Ok(ExitCode::FAILURE);
        }
    };

    let view = match args.province.as_deref() {
        Some(name) => match dataset.provinces.iter().find(|p| p.eq_ignore_ascii_case(name.trim())) {
            Some(province) => Some(DashboardView::build(&dataset, province)),
            None => {
                eprintln!("error: province {name:?} not found");
                return Ok(ExitCode::FAILURE);
            }
        },
        None => None,
    };

    let mut stdout = io::stdout().lock();
    write_report(&mut stdout, &dataset, view.as_ref()).context("writing report")?;
    stdout.flush()?;
    Ok(ExitCode::SUCCESS)
}

/// Handle mouse events for panning, zooming and hovering
fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    // Always track mouse position for cursor marker and tooltip
    app.set_mouse_pos(mouse.column, mouse.row);

    match mouse.kind {
        MouseEventKind::ScrollUp if app.show_details => app.scroll_details(-1),
        MouseEventKind::ScrollDown if app.show_details => app.scroll_details(1),
        // Scroll wheel zooms towards the mouse position
        MouseEventKind::ScrollUp => app.zoom_in_at(mouse.column, mouse.row),
        MouseEventKind::ScrollDown => app.zoom_out_at(mouse.column, mouse.row),
        // Horizontal scroll for panning (trackpad two-finger swipe)
        MouseEventKind::ScrollLeft => app.pan(-15, 0),
        MouseEventKind::ScrollRight => app.pan(15, 0),
        // Click and drag to pan
        MouseEventKind::Down(MouseButton::Left) => app.begin_drag(mouse.column, mouse.row),
        MouseEventKind::Drag(MouseButton::Left) => app.handle_drag(mouse.column, mouse.row),
        MouseEventKind::Up(MouseButton::Left) => app.end_drag(),
        _ => {}
    }
}

fn handle_key(app: &mut App, code: KeyCode) {
    if app.show_details {
        match code {
            KeyCode::Up | KeyCode::Char('k') => app.scroll_details(-1),
            KeyCode::Down | KeyCode::Char('j') => app.scroll_details(1),
            KeyCode::PageUp => app.scroll_details(-10),
            KeyCode::PageDown => app.scroll_details(10),
            KeyCode::Char('d') | KeyCode::Esc => app.toggle_details(),
            KeyCode::Char('q') => app.quit(),
            _ => {}
        }
        return;
    }

    match code {
        KeyCode::Char('q') | KeyCode::Esc => app.quit(),

        // Province selection
        KeyCode::Down | KeyCode::Char(']') => app.next_province(),
        KeyCode::Up | KeyCode::Char('[') => app.prev_province(),

        // Pan with hjkl
        KeyCode::Left | KeyCode::Char('h') => app.pan(-10, 0),
        KeyCode::Right | KeyCode::Char('l') => app.pan(10, 0),
        KeyCode::Char('k') => app.pan(0, -6),
        KeyCode::Char('j') => app.pan(0, 6),

        // Zoom
        KeyCode::Char('+') | KeyCode::Char('=') => app.zoom_in(),
        KeyCode::Char('-') | KeyCode::Char('_') => app.zoom_out(),
        KeyCode::Char('f') | KeyCode::Char('0') => app.fit_map(),

        KeyCode::Char('L') => {
            app.renderer.settings.show_labels = !app.renderer.settings.show_labels;
        }
        KeyCode::Char('d') => app.toggle_details(),
        KeyCode::Char('r') => app.reload(),

        _ => {}
    }
}

fn run(terminal: &mut DefaultTerminal, args: &Args) -> Result<()> {
    let size = terminal.size()?;
    let mut app = App::new(args.sources(), size.width, size.height, args.province.as_deref());

    // Main loop
    loop {
        terminal.draw(|frame| ui::render(frame, &app))?;

        // Handle events with ~60fps target
        if event::poll(Duration::from_millis(16))? {
            match event::read()? {
                // Only handle key press events (not release)
                Event::Key(key) if key.kind == KeyEventKind::Press => {
                    app.status = None;
                    handle_key(&mut app, key.code);
                }
                Event::Mouse(mouse) => handle_mouse(&mut app, mouse),
                Event::Resize(width, height) => app.resize(width, height),
                _ => {}
            }
        }

        if app.should_quit {
            break;
        }
    }

    info!("dashboard closed");
    Ok(())
}
