use std::io;
use std::path::PathBuf;
use std::sync::mpsc;
use std::time::{Duration, Instant};

use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
    KeyModifiers,
};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::prelude::*;
use tracing::info;

use betpool_terminal::config::{self, Config};
use betpool_terminal::logging;
use betpool_terminal::provider;
use betpool_terminal::session::SessionStore;
use betpool_terminal::state::{AppState, Delta, Page, ProviderCommand, apply_delta};

mod ui;

struct App {
    state: AppState,
    should_quit: bool,
    cmd_tx: Option<mpsc::Sender<ProviderCommand>>,
    export_path: PathBuf,
}

impl App {
    fn new(state: AppState, cmd_tx: Option<mpsc::Sender<ProviderCommand>>, export_path: PathBuf) -> Self {
        Self {
            state,
            should_quit: false,
            cmd_tx,
            export_path,
        }
    }

    fn on_key(&mut self, key: KeyEvent) {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            self.should_quit = true;
            return;
        }
        if self.state.help_overlay {
            if matches!(key.code, KeyCode::Char('?') | KeyCode::Esc) {
                self.state.help_overlay = false;
            }
            return;
        }
        if self.state.form.is_some() {
            self.on_form_key(key);
        } else {
            self.on_list_key(key);
        }
    }

    fn on_form_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::F(2) if self.state.page.is_public() => {
                let target = if self.state.page == Page::Login {
                    Page::Register
                } else {
                    Page::Login
                };
                self.navigate(target);
            }
            KeyCode::Esc => self.state.close_form(),
            KeyCode::Enter => {
                if let Some(cmd) = self.state.submit_form() {
                    self.send(cmd, "submit");
                }
            }
            KeyCode::Tab | KeyCode::Down => self.form_mut(|form| form.focus_next()),
            KeyCode::BackTab | KeyCode::Up => self.form_mut(|form| form.focus_prev()),
            KeyCode::Left => self.form_mut(|form| form.cycle(false)),
            KeyCode::Right => self.form_mut(|form| form.cycle(true)),
            KeyCode::Backspace => self.form_mut(|form| form.backspace()),
            KeyCode::Char(c) => self.form_mut(|form| form.push_char(c)),
            _ => {}
        }
    }

    fn on_list_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Char('?') => self.state.help_overlay = true,
            KeyCode::Char(c) if c.is_ascii_digit() => {
                if let Some(page) = Page::from_hotkey(c) {
                    self.navigate(page);
                }
            }
            KeyCode::Char('j') | KeyCode::Down => self.state.select_next(),
            KeyCode::Char('k') | KeyCode::Up => self.state.select_prev(),
            KeyCode::Char('r') => {
                if let Some(cmd) = self.state.refresh() {
                    self.send(cmd, "refresh");
                }
            }
            KeyCode::Char('n') => self.state.open_create_form(),
            KeyCode::Char('e') => {
                if let Some(cmd) = self.state.open_edit_form() {
                    self.send(cmd, "image");
                }
            }
            KeyCode::Enter => {
                let cmd = if self.state.page == Page::Stadiums {
                    self.state.load_selected_images()
                } else {
                    self.state.open_edit_form()
                };
                if let Some(cmd) = cmd {
                    self.send(cmd, "image");
                }
            }
            KeyCode::Char('p') => {
                if let Some(cmd) = self.state.process_selected() {
                    self.send(cmd, "process");
                }
            }
            KeyCode::Char('g') => {
                if let Some(cmd) = self.state.generate_mass_bets() {
                    self.send(cmd, "mass bets");
                }
            }
            KeyCode::Char('x') => {
                if let Some(cmd) = self.state.export(self.export_path.clone()) {
                    self.send(cmd, "export");
                }
            }
            KeyCode::Char('o') if self.state.session.is_some() => {
                let cmd = self.state.logout();
                self.send(cmd, "logout");
            }
            _ => {}
        }
    }

    fn form_mut(&mut self, f: impl FnOnce(&mut betpool_terminal::forms::Form)) {
        if let Some(form) = self.state.form.as_mut() {
            f(form);
        }
    }

    fn navigate(&mut self, page: Page) {
        if let Some(cmd) = self.state.navigate(page) {
            self.send(cmd, "load");
        }
    }

    fn send(&mut self, cmd: ProviderCommand, what: &str) {
        let Some(tx) = &self.cmd_tx else {
            self.state.push_log(format!("[INFO] {what} unavailable"));
            return;
        };
        if tx.send(cmd).is_err() {
            self.state.push_log(format!("[WARN] {what} request failed"));
        }
    }
}

fn main() -> io::Result<()> {
    config::load_dotenv();
    let config = Config::from_env();

    let log_status = match config.log_file.as_deref() {
        Some(path) => logging::init_file_logging(path)
            .map(|()| format!("[INFO] Logging to {}", path.display()))
            .unwrap_or_else(|err| format!("[WARN] File logging disabled: {err:#}")),
        None => "[INFO] File logging disabled".to_string(),
    };

    let store = SessionStore::new(config.session_file.clone());
    let session = store.load();
    info!(restored = session.is_some(), "starting betpool_terminal");

    let mut state = AppState::new(session.clone());
    state.push_log(log_status);
    if config.backend_url.is_none() {
        state.push_log("[WARN] BETPOOL_BACKEND_URL is not set");
    }

    let (tx, rx) = mpsc::channel();
    let (cmd_tx, cmd_rx) = mpsc::channel();
    let export_path = config.export_path.clone();
    provider::spawn_provider(config, session, tx, cmd_rx);

    let mut app = App::new(state, Some(cmd_tx), export_path);
    if let Some(cmd) = app.state.refresh() {
        app.send(cmd, "load");
    }

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = ratatui::backend::CrosstermBackend::new(stdout);
    let mut terminal = ratatui::Terminal::new(backend)?;

    let res = run_app(&mut terminal, &mut app, rx);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        eprintln!("error: {err}");
    }
    Ok(())
}

fn run_app<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    rx: mpsc::Receiver<Delta>,
) -> io::Result<()> {
    let tick_rate = Duration::from_millis(250);
    let mut last_tick = Instant::now();

    loop {
        while let Ok(delta) = rx.try_recv() {
            apply_delta(&mut app.state, delta);
        }

        terminal.draw(|f| ui::ui(f, &app.state))?;

        let timeout = tick_rate
            .checked_sub(last_tick.elapsed())
            .unwrap_or(Duration::ZERO);
        if event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    app.on_key(key);
                }
            }
        }

        if last_tick.elapsed() >= tick_rate {
            last_tick = Instant::now();
        }

        if app.should_quit {
            return Ok(());
        }
    }
}
