use anyhow::{Context, Result, bail};
use blocknote_config::Config;
use blocknote_engine::editing::{
    AfterSave, BlockId, BlockKind, BlockType, Cmd, Document, EditError, EditSession, Mode,
    RenderBlock, Snapshot,
};
use blocknote_engine::io::{self, FileGateway, NoteId, PersistenceGateway};
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyModifiers},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Frame, Terminal,
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
};
use std::{
    env,
    io::{Stdout, stdout},
    path::PathBuf,
    process,
};

/// What the command line asked for
#[derive(Debug, PartialEq)]
enum Command {
    /// Interactive editor, optionally over an explicit notes directory
    Edit { notes_path: Option<PathBuf> },
    /// Print a note as Markdown
    Export { note: String },
    /// Replace a note with the blocks of a Markdown file
    Import { note: String, file: PathBuf },
}

fn parse_args(args: &[String]) -> Option<Command> {
    match args {
        [] => Some(Command::Edit { notes_path: None }),
        [cmd, note] if cmd == "export" => Some(Command::Export { note: note.clone() }),
        [cmd, note, file] if cmd == "import" => Some(Command::Import {
            note: note.clone(),
            file: PathBuf::from(file),
        }),
        [path] if path != "export" && path != "import" => Some(Command::Edit {
            notes_path: Some(PathBuf::from(path)),
        }),
        _ => None,
    }
}

struct App {
    gateway: FileGateway,
    after_save: AfterSave,
    notes: Vec<NoteId>,
    note_list_state: ListState,
    session: Option<EditSession>,
    status: String,
    quit_armed: bool,
}

impl App {
    fn new(gateway: FileGateway, after_save: AfterSave) -> Result<Self> {
        let notes = gateway.list_notes()?;
        let mut app = Self {
            gateway,
            after_save,
            notes,
            note_list_state: ListState::default(),
            session: None,
            status: String::new(),
            quit_armed: false,
        };

        // Open first note if available
        if !app.notes.is_empty() {
            app.note_list_state.select(Some(0));
            app.open_selected();
        }

        Ok(app)
    }

    fn is_dirty(&self) -> bool {
        self.session
            .as_ref()
            .is_some_and(EditSession::has_unsaved_changes)
    }

    fn mode(&self) -> Mode {
        self.session.as_ref().map_or(Mode::Viewing, EditSession::mode)
    }

    fn select_note(&mut self, delta: isize) {
        if self.notes.is_empty() {
            return;
        }
        if self.is_dirty() {
            self.status = "Unsaved changes: Ctrl-S to save or Ctrl-D to discard".to_string();
            return;
        }
        let len = self.notes.len() as isize;
        let current = self.note_list_state.selected().unwrap_or(0) as isize;
        let next = (current + delta).rem_euclid(len) as usize;
        self.note_list_state.select(Some(next));
        self.open_selected();
    }

    fn open_selected(&mut self) {
        let Some(note_id) = self
            .note_list_state
            .selected()
            .and_then(|i| self.notes.get(i))
            .cloned()
        else {
            return;
        };
        match EditSession::open(&self.gateway, note_id.clone()) {
            Ok(session) => {
                self.status = match session.recovery_warning() {
                    Some(reason) => format!("{note_id} was unreadable, starting fresh: {reason}"),
                    None => format!("Opened {note_id}"),
                };
                self.session = Some(session);
            }
            Err(e) => {
                self.status = format!("Error opening {note_id}: {e}");
                self.session = None;
            }
        }
    }

    fn create_note(&mut self) {
        if self.is_dirty() {
            self.status = "Unsaved changes: Ctrl-S to save or Ctrl-D to discard".to_string();
            return;
        }
        let note_id = (1..)
            .filter_map(|n| NoteId::parse(&format!("note-{n}")).ok())
            .find(|id| !self.notes.contains(id));
        let Some(note_id) = note_id else {
            return;
        };
        self.notes.push(note_id.clone());
        self.notes.sort();
        let index = self.notes.iter().position(|id| id == &note_id);
        self.note_list_state.select(index);

        let mut session = EditSession::new(note_id.clone(), Document::new());
        self.status = match session.enter_edit() {
            Ok(()) => format!("New note {note_id}"),
            Err(e) => e.to_string(),
        };
        self.session = Some(session);
    }

    fn discard_changes(&mut self) {
        if self.mode() == Mode::Saving {
            return;
        }
        let is_stored = self
            .session
            .as_ref()
            .is_some_and(|s| self.gateway.load(s.note_id()).is_ok());
        if is_stored {
            self.open_selected();
        } else if let Some(session) = self.session.as_mut() {
            let note_id = session.note_id().clone();
            if let Err(e) = session.switch_document(note_id, Document::new()) {
                self.status = e.to_string();
                return;
            }
        }
        self.status = "Changes discarded".to_string();
    }

    fn save(&mut self) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        self.status = match session.save(&mut self.gateway, self.after_save) {
            Ok(()) => format!("Saved {}", session.note_id()),
            Err(e) => format!("Save failed: {e}"),
        };
    }

    /// Feed one key to the session. Returns false when the app should exit.
    fn handle_key(&mut self, key: KeyEvent) -> bool {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        if ctrl && key.code == KeyCode::Char('s') {
            self.save();
            return true;
        }
        if ctrl && key.code == KeyCode::Char('d') {
            self.discard_changes();
            return true;
        }

        match self.mode() {
            Mode::Viewing => self.handle_viewing_key(key),
            Mode::Editing | Mode::Saving => {
                self.handle_editing_key(key, ctrl);
                true
            }
        }
    }

    fn handle_viewing_key(&mut self, key: KeyEvent) -> bool {
        if key.code != KeyCode::Char('q') {
            self.quit_armed = false;
        }
        match key.code {
            KeyCode::Char('q') => {
                if !self.is_dirty() || self.quit_armed {
                    return false;
                }
                self.quit_armed = true;
                self.status = "Unsaved changes: press q again to quit anyway".to_string();
            }
            KeyCode::Down | KeyCode::Char('j') => self.select_note(1),
            KeyCode::Up | KeyCode::Char('k') => self.select_note(-1),
            KeyCode::Char('n') => self.create_note(),
            KeyCode::Char('e') | KeyCode::Enter => {
                if let Some(session) = self.session.as_mut()
                    && let Err(e) = session.enter_edit()
                {
                    self.status = e.to_string();
                }
            }
            _ => {}
        }
        true
    }

    fn handle_editing_key(&mut self, key: KeyEvent, ctrl: bool) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        let result = match (key.code, ctrl) {
            (KeyCode::Esc, _) => session.leave_edit(),
            (KeyCode::Up, true) => move_focused(session, -1),
            (KeyCode::Down, true) => move_focused(session, 1),
            (KeyCode::Up, false) => session.focus_previous(),
            (KeyCode::Down, false) => session.focus_next(),
            (KeyCode::Char('t'), true) => with_focused(session, |session, id| {
                let block_type = session
                    .document()
                    .block(&id)
                    .map_or(BlockType::Text, |b| b.block_type().cycle());
                session.apply(Cmd::ChangeType { id, block_type }).map(drop)
            }),
            (KeyCode::Enter, _) => with_focused(session, |session, id| {
                session.commit_and_advance(&id).map(drop)
            }),
            (KeyCode::Backspace, _) => with_focused(session, |session, id| {
                let content = session
                    .document()
                    .block(&id)
                    .map(|b| b.content().to_string())
                    .unwrap_or_default();
                if content.is_empty() {
                    session.delete_if_empty(&id).map(drop)
                } else {
                    let mut shorter = content;
                    shorter.pop();
                    session.set_content(&id, shorter).map(drop)
                }
            }),
            (KeyCode::Char(c), false) => with_focused(session, |session, id| {
                let mut content = session
                    .document()
                    .block(&id)
                    .map(|b| b.content().to_string())
                    .unwrap_or_default();
                content.push(c);
                session.set_content(&id, content).map(drop)
            }),
            _ => Ok(()),
        };
        for event in session.drain_events() {
            log::debug!("{event:?}");
        }
        if let Err(e) = result {
            self.status = e.to_string();
        }
    }
}

/// Run `f` on the focused block, focusing the first block when none is
fn with_focused(
    session: &mut EditSession,
    f: impl FnOnce(&mut EditSession, BlockId) -> Result<(), EditError>,
) -> Result<(), EditError> {
    if session.focused().is_none() {
        session.focus_next()?;
    }
    match session.focused().cloned() {
        Some(id) => f(session, id),
        None => Ok(()),
    }
}

fn move_focused(session: &mut EditSession, delta: isize) -> Result<(), EditError> {
    let Some(from) = session
        .focused()
        .and_then(|id| session.document().position(id))
    else {
        return Ok(());
    };
    // Moving down targets the slot after the next block
    let to = match delta {
        d if d < 0 => from.saturating_sub(1),
        _ => (from + 2).min(session.document().len()),
    };
    session.reorder(from, to).map(drop)
}

fn block_lines(block: &RenderBlock) -> Vec<Line<'static>> {
    let style = if block.focused {
        Style::default().bg(Color::Yellow).fg(Color::Black)
    } else {
        Style::default()
    };
    let cursor = if block.focused { "▌" } else { "" };
    let mut lines: Vec<Line<'static>> = match &block.kind {
        BlockKind::Heading(meta) => vec![Line::from(Span::styled(
            format!("{} {}{cursor}", "#".repeat(usize::from(meta.level)), block.content),
            style.add_modifier(Modifier::BOLD),
        ))],
        BlockKind::Text(_) => {
            let text = format!("{}{cursor}", block.content);
            text.split('\n')
                .map(|line| Line::from(Span::styled(line.to_string(), style)))
                .collect()
        }
        BlockKind::List(meta) => {
            let items: Vec<&str> = block.content.split('\n').collect();
            let last = items.len() - 1;
            items
                .iter()
                .enumerate()
                .map(|(n, item)| {
                    let marker = if meta.ordered {
                        format!("{}.", n + 1)
                    } else {
                        "•".to_string()
                    };
                    let tail = if n == last { cursor } else { "" };
                    Line::from(Span::styled(format!("{marker} {item}{tail}"), style))
                })
                .collect()
        }
        BlockKind::Image(meta) => vec![Line::from(Span::styled(
            format!(
                "[image: {}] {}{cursor}",
                meta.src.as_deref().unwrap_or("no source"),
                block.content
            ),
            style.add_modifier(Modifier::ITALIC),
        ))],
    };
    lines.push(Line::from(""));
    lines
}

fn document_lines(snapshot: &Snapshot) -> Vec<Line<'static>> {
    snapshot.blocks.iter().flat_map(block_lines).collect()
}

fn ui(f: &mut Frame, app: &mut App) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(2)].as_ref())
        .split(f.area());
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .margin(1)
        .constraints([Constraint::Percentage(25), Constraint::Percentage(75)].as_ref())
        .split(rows[0]);

    // Note list panel
    let note_items: Vec<ListItem> = app
        .notes
        .iter()
        .map(|id| ListItem::new(Line::from(Span::raw(format!("📄 {id}")))))
        .collect();
    let notes_list = List::new(note_items)
        .block(Block::default().borders(Borders::ALL).title("Notes"))
        .highlight_style(Style::default().bg(Color::Yellow).fg(Color::Black));
    f.render_stateful_widget(notes_list, columns[0], &mut app.note_list_state);

    // Document panel
    let (title, content) = match app.session.as_ref() {
        Some(session) => {
            let snapshot = session.snapshot();
            let marker = if snapshot.dirty { " *" } else { "" };
            (
                format!("{} [{}]{marker}", session.note_id(), snapshot.mode),
                document_lines(&snapshot),
            )
        }
        None => (
            "Document".to_string(),
            vec![Line::from("Select a note, or press n for a new one")],
        ),
    };
    let document = Paragraph::new(content)
        .block(Block::default().borders(Borders::ALL).title(title))
        .wrap(ratatui::widgets::Wrap { trim: false });
    f.render_widget(document, columns[1]);

    // Status and key help
    let help = match app.mode() {
        Mode::Viewing => "q: Quit | ↑/↓: Notes | e: Edit | n: New | Ctrl-S: Save | Ctrl-D: Discard",
        Mode::Editing | Mode::Saving => {
            "Esc: Stop editing | Enter: Commit | ↑/↓: Focus | Ctrl-↑/↓: Move | Ctrl-T: Type | Ctrl-S: Save"
        }
    };
    let footer = Paragraph::new(vec![
        Line::from(Span::styled(app.status.clone(), Style::default().fg(Color::Cyan))),
        Line::from(help),
    ]);
    f.render_widget(footer, rows[1]);
}

fn run_app(terminal: &mut Terminal<CrosstermBackend<Stdout>>, app: &mut App) -> Result<()> {
    loop {
        terminal.draw(|f| ui(f, app))?;

        if let Event::Key(key) = event::read()?
            && key.kind == event::KeyEventKind::Press
            && !app.handle_key(key)
        {
            return Ok(());
        }
    }
}

fn run_editor(gateway: FileGateway, after_save: AfterSave) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = App::new(gateway, after_save).and_then(|mut app| run_app(&mut terminal, &mut app));

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    res
}

fn export(gateway: &FileGateway, note: &str) -> Result<()> {
    let note_id = NoteId::parse(note)?;
    let document = gateway
        .load(&note_id)
        .with_context(|| format!("loading {note_id}"))?;
    print!("{}", io::to_markdown(&document));
    Ok(())
}

fn import(gateway: &mut FileGateway, note: &str, file: &PathBuf) -> Result<()> {
    let note_id = NoteId::parse(note)?;
    let markdown =
        std::fs::read_to_string(file).with_context(|| format!("reading {}", file.display()))?;
    let document = io::from_markdown(&markdown)?;

    // Go through a session so the stored note gets its plain text
    let mut session = EditSession::new(note_id.clone(), Document::new());
    session.switch_document(note_id.clone(), document)?;
    session.enter_edit()?;
    session.save(gateway, AfterSave::Viewing)?;
    eprintln!(
        "Imported {} blocks into {note_id}",
        session.document().len()
    );
    Ok(())
}

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let program = args.first().map_or("blocknote-cli", String::as_str);
    let Some(command) = parse_args(&args[1.min(args.len())..]) else {
        eprintln!("Usage: {program} [notes-folder-path]");
        eprintln!("       {program} export <note>");
        eprintln!("       {program} import <note> <file.md>");
        process::exit(1);
    };

    let config_path = Config::config_path();
    let config = Config::load()?;
    let after_save = match &config {
        Some(config) if !config.return_to_editing_after_save => AfterSave::Viewing,
        _ => AfterSave::Editing,
    };
    let explicit_path = match &command {
        Command::Edit { notes_path } => notes_path.clone(),
        _ => None,
    };
    let from_config = explicit_path.is_none();
    let Some(notes_path) = explicit_path.or(config.map(|c| c.notes_path)) else {
        eprintln!("Error: No notes path provided and no config file found");
        eprintln!("Create a config file at {}", config_path.display());
        process::exit(1);
    };

    let mut gateway = match FileGateway::new(&notes_path) {
        Ok(gateway) => gateway,
        Err(e) => {
            let source = if from_config {
                format!(" from config file '{}'", config_path.display())
            } else {
                String::new()
            };
            bail!(
                "Notes path '{}'{source} is invalid: {e}",
                notes_path.display()
            );
        }
    };

    match command {
        Command::Edit { .. } => run_editor(gateway, after_save),
        Command::Export { note } => export(&gateway, &note),
        Command::Import { note, file } => import(&mut gateway, &note, &file),
    }
}
