use std::{
    cmp, fs, io,
    path::{Path, PathBuf},
    thread,
    time::{Duration, Instant},
};

use anyhow::{Context, Result};
use cardfile_core::{
    config,
    picture::{self, LoadedPicture, PictureEntry, PictureError},
    validate::{self, FieldReport},
    AppConfig, Contact, ContactDraft, ContactStore,
};
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame, Terminal,
};
use serde::Deserialize;
use tokio::{spawn, sync::mpsc};
use tracing::{debug, error, info};

const TICK_RATE: Duration = Duration::from_millis(250);
const TOAST_DURATION: Duration = Duration::from_secs(4);
const MAX_FIELD_CHARS: usize = 64;
const CARD_LINES: usize = 5;
const PICKER_SCAN_DEPTH: usize = 4;
const THEME_FILE_NAME: &str = "theme.json";

#[derive(Debug, Clone)]
struct Theme {
    primary_fg: Color,
    accent: Color,
    accent_alt: Color,
    muted: Color,
    selection_bg: Color,
    success: Color,
    warning: Color,
    danger: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            primary_fg: Color::White,
            accent: Color::Cyan,
            accent_alt: Color::Blue,
            muted: Color::DarkGray,
            selection_bg: Color::DarkGray,
            success: Color::Green,
            warning: Color::Yellow,
            danger: Color::Red,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ThemeFile {
    foreground: Option<String>,
    accent: Option<String>,
    accent_alt: Option<String>,
    muted: Option<String>,
    selection_bg: Option<String>,
    success: Option<String>,
    warning: Option<String>,
    danger: Option<String>,
}

fn theme_path() -> PathBuf {
    config::config_dir().join(THEME_FILE_NAME)
}

fn load_theme() -> (Theme, String) {
    let mut theme = Theme::default();
    let path = theme_path();
    if !path.exists() {
        return (
            theme,
            format!("No theme file at {}; using default palette.", path.display()),
        );
    }

    let data = match fs::read_to_string(&path) {
        Ok(content) => content,
        Err(err) => {
            return (
                theme,
                format!(
                    "Failed to read {} ({err}); using default palette.",
                    path.display()
                ),
            )
        }
    };

    let file: ThemeFile = match serde_json::from_str(&data) {
        Ok(file) => file,
        Err(err) => {
            return (
                theme,
                format!(
                    "Failed to parse {} ({err}); using default palette.",
                    path.display()
                ),
            )
        }
    };

    let mut applied = 0usize;
    let overrides = [
        (&file.foreground, &mut theme.primary_fg),
        (&file.accent, &mut theme.accent),
        (&file.accent_alt, &mut theme.accent_alt),
        (&file.muted, &mut theme.muted),
        (&file.selection_bg, &mut theme.selection_bg),
        (&file.success, &mut theme.success),
        (&file.warning, &mut theme.warning),
        (&file.danger, &mut theme.danger),
    ];
    for (text, slot) in overrides {
        if let Some(color) = text.as_deref().and_then(parse_hex_color) {
            *slot = color;
            applied += 1;
        }
    }

    let summary = if applied == 0 {
        format!(
            "Loaded {} but no recognized colors were applied.",
            path.display()
        )
    } else {
        format!("Loaded theme from {} ({applied} colors).", path.display())
    };
    (theme, summary)
}

fn parse_hex_color(input: &str) -> Option<Color> {
    let trimmed = input.trim();
    let hex = trimmed.strip_prefix('#').unwrap_or(trimmed);
    let hex = hex.strip_prefix("0x").unwrap_or(hex);
    match hex.len() {
        6 => {
            let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
            let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
            let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
            Some(Color::Rgb(r, g, b))
        }
        3 => {
            let r = u8::from_str_radix(&hex[0..1].repeat(2), 16).ok()?;
            let g = u8::from_str_radix(&hex[1..2].repeat(2), 16).ok()?;
            let b = u8::from_str_radix(&hex[2..3].repeat(2), 16).ok()?;
            Some(Color::Rgb(r, g, b))
        }
        _ => None,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Focus {
    Form,
    List,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum ContactField {
    #[default]
    Name,
    Email,
    Phone,
}

impl ContactField {
    const ALL: [ContactField; 3] = [ContactField::Name, ContactField::Email, ContactField::Phone];

    fn next(self) -> Self {
        match self {
            ContactField::Name => ContactField::Email,
            ContactField::Email => ContactField::Phone,
            ContactField::Phone => ContactField::Name,
        }
    }

    fn prev(self) -> Self {
        match self {
            ContactField::Name => ContactField::Phone,
            ContactField::Email => ContactField::Name,
            ContactField::Phone => ContactField::Email,
        }
    }

    fn index(self) -> usize {
        match self {
            ContactField::Name => 0,
            ContactField::Email => 1,
            ContactField::Phone => 2,
        }
    }

    fn label(self) -> &'static str {
        match self {
            ContactField::Name => "Name",
            ContactField::Email => "Email",
            ContactField::Phone => "Phone",
        }
    }

    fn placeholder(self) -> &'static str {
        match self {
            ContactField::Name => "John Doe",
            ContactField::Email => "john.doe@example.com",
            ContactField::Phone => "(123) 456-7890",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct TextInput {
    value: String,
    cursor: usize,
}

impl TextInput {
    fn from_value(value: &str) -> Self {
        Self {
            value: value.to_string(),
            cursor: value.len(),
        }
    }

    fn value(&self) -> &str {
        &self.value
    }

    fn cursor_col(&self) -> usize {
        self.value[..self.cursor].chars().count()
    }

    fn insert(&mut self, ch: char) {
        if ch.is_control() || self.value.chars().count() >= MAX_FIELD_CHARS {
            return;
        }
        self.value.insert(self.cursor, ch);
        self.cursor += ch.len_utf8();
    }

    fn backspace(&mut self) {
        if let Some(prev) = self.value[..self.cursor].chars().next_back() {
            self.cursor -= prev.len_utf8();
            self.value.remove(self.cursor);
        }
    }

    fn delete(&mut self) {
        if self.cursor < self.value.len() {
            self.value.remove(self.cursor);
        }
    }

    fn move_left(&mut self) {
        if let Some(prev) = self.value[..self.cursor].chars().next_back() {
            self.cursor -= prev.len_utf8();
        }
    }

    fn move_right(&mut self) {
        if let Some(next) = self.value[self.cursor..].chars().next() {
            self.cursor += next.len_utf8();
        }
    }

    fn move_home(&mut self) {
        self.cursor = 0;
    }

    fn move_end(&mut self) {
        self.cursor = self.value.len();
    }

    fn clear(&mut self) {
        self.value.clear();
        self.cursor = 0;
    }
}

#[derive(Debug, Default)]
struct FormState {
    name: TextInput,
    email: TextInput,
    phone: TextInput,
    field: ContactField,
    errors: FieldReport,
    picture: Option<LoadedPicture>,
    pending_picture: Option<String>,
}

impl FormState {
    fn input(&self, field: ContactField) -> &TextInput {
        match field {
            ContactField::Name => &self.name,
            ContactField::Email => &self.email,
            ContactField::Phone => &self.phone,
        }
    }

    fn focused_mut(&mut self) -> &mut TextInput {
        match self.field {
            ContactField::Name => &mut self.name,
            ContactField::Email => &mut self.email,
            ContactField::Phone => &mut self.phone,
        }
    }

    fn draft(&self, placeholder: &str) -> ContactDraft {
        ContactDraft {
            name: self.name.value().to_string(),
            email: self.email.value().to_string(),
            phone: self.phone.value().to_string(),
            profile_picture: self
                .picture
                .as_ref()
                .map(|picture| picture.data_uri.clone())
                .unwrap_or_else(|| placeholder.to_string()),
        }
    }

    fn reset(&mut self) {
        // A read still in flight is not cancelled; when it completes it
        // lands in this emptied preview slot.
        self.name.clear();
        self.email.clear();
        self.phone.clear();
        self.field = ContactField::Name;
        self.errors = FieldReport::default();
        self.picture = None;
    }
}

#[derive(Debug, Clone)]
enum CardMode {
    Viewing,
    Editing(EditBuffer),
}

#[derive(Debug, Clone)]
struct EditBuffer {
    contact_id: String,
    name: TextInput,
    email: TextInput,
    phone: TextInput,
    field: ContactField,
}

impl EditBuffer {
    fn snapshot(contact: &Contact) -> Self {
        Self {
            contact_id: contact.id.clone(),
            name: TextInput::from_value(&contact.name),
            email: TextInput::from_value(&contact.email),
            phone: TextInput::from_value(&contact.phone),
            field: ContactField::Name,
        }
    }

    fn input(&self, field: ContactField) -> &TextInput {
        match field {
            ContactField::Name => &self.name,
            ContactField::Email => &self.email,
            ContactField::Phone => &self.phone,
        }
    }

    fn focused_mut(&mut self) -> &mut TextInput {
        match self.field {
            ContactField::Name => &mut self.name,
            ContactField::Email => &mut self.email,
            ContactField::Phone => &mut self.phone,
        }
    }

    fn merged(&self, existing: &Contact) -> Contact {
        Contact {
            id: existing.id.clone(),
            name: self.name.value().to_string(),
            email: self.email.value().to_string(),
            phone: self.phone.value().to_string(),
            profile_picture: existing.profile_picture.clone(),
        }
    }
}

#[derive(Debug, Clone)]
struct DeleteConfirm {
    contact_id: String,
    name: String,
}

#[derive(Debug, Clone)]
struct PicturePicker {
    entries: Vec<PictureEntry>,
    cursor: usize,
    offset: usize,
}

impl PicturePicker {
    fn new(entries: Vec<PictureEntry>) -> Self {
        Self {
            entries,
            cursor: 0,
            offset: 0,
        }
    }

    fn move_cursor(&mut self, delta: isize) {
        if self.entries.is_empty() {
            return;
        }
        let len = self.entries.len() as isize;
        let mut idx = self.cursor as isize + delta;
        if idx < 0 {
            idx = 0;
        } else if idx >= len {
            idx = len - 1;
        }
        self.cursor = idx as usize;
    }

    fn jump(&mut self, index: usize) {
        if self.entries.is_empty() {
            return;
        }
        self.cursor = index.min(self.entries.len() - 1);
    }

    fn selected(&self) -> Option<&PictureEntry> {
        self.entries.get(self.cursor)
    }

    fn clamp(&mut self, visible: usize) {
        let len = self.entries.len();
        if len == 0 {
            self.cursor = 0;
            self.offset = 0;
            return;
        }
        if self.cursor >= len {
            self.cursor = len - 1;
        }
        if len <= visible {
            self.offset = 0;
            return;
        }
        if self.offset + visible > len {
            self.offset = len - visible;
        }
        if self.cursor < self.offset {
            self.offset = self.cursor;
        } else if self.cursor >= self.offset + visible {
            self.offset = self.cursor + 1 - visible;
        }
    }
}

#[derive(Debug, Clone)]
struct Toast {
    title: String,
    body: String,
    shown_at: Instant,
}

impl Toast {
    fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
            shown_at: Instant::now(),
        }
    }

    fn is_expired(&self, now: Instant) -> bool {
        now.duration_since(self.shown_at) >= TOAST_DURATION
    }
}

enum AppEvent {
    Input(Event),
    Tick,
    PictureLoaded(Result<LoadedPicture, PictureError>),
}

/// High-level application state for the contact manager TUI.
pub struct CardfileApp {
    config: AppConfig,
    store: ContactStore,
    state: UiState,
    form: FormState,
    card_mode: CardMode,
    confirm_delete: Option<DeleteConfirm>,
    picker: Option<PicturePicker>,
    toast: Option<Toast>,
    event_tx: Option<mpsc::Sender<AppEvent>>,
    theme: Theme,
    theme_status: Option<String>,
}

impl CardfileApp {
    pub fn new(config: AppConfig, store: ContactStore) -> Self {
        let (theme, theme_status) = load_theme();
        Self {
            config,
            store,
            state: UiState::default(),
            form: FormState::default(),
            card_mode: CardMode::Viewing,
            confirm_delete: None,
            picker: None,
            toast: None,
            event_tx: None,
            theme,
            theme_status: Some(theme_status),
        }
    }

    pub async fn run(&mut self) -> Result<()> {
        let mut status = if self.store.is_empty() {
            "Add a contact to get started".to_string()
        } else {
            format!("Loaded {} contacts", self.store.len())
        };
        if let Some(note) = self.theme_status.as_ref() {
            status.push_str(" • ");
            status.push_str(note);
        }
        self.state.set_status(status);
        info!(
            pictures_root = %self.config.pictures_root.display(),
            "cardfile started"
        );

        let mut stdout = io::stdout();
        enable_raw_mode().context("failed to enter raw mode")?;
        execute!(stdout, EnterAlternateScreen).context("failed to enter alternate screen")?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend).context("failed to create terminal")?;
        terminal.hide_cursor()?;
        terminal.clear()?;

        let (event_tx, mut event_rx) = mpsc::channel::<AppEvent>(128);
        spawn_input_thread(event_tx.clone());
        self.event_tx = Some(event_tx);

        loop {
            terminal.draw(|frame| self.draw(frame))?;
            if self.state.should_quit {
                break;
            }

            let maybe_event = event_rx.recv().await;
            if !self.process_app_event(maybe_event) {
                break;
            }

            if self.state.should_quit {
                break;
            }
        }

        restore_terminal(&mut terminal)?;
        self.event_tx = None;
        Ok(())
    }

    fn process_app_event(&mut self, maybe_event: Option<AppEvent>) -> bool {
        match maybe_event {
            Some(AppEvent::Input(event)) => {
                if let Event::Key(ref key) = event {
                    if self.handle_global_shortcut(key) {
                        return true;
                    }
                }
                if self.confirm_delete.is_some() {
                    if let Event::Key(key) = event {
                        self.handle_confirm_key(key);
                    }
                } else if self.picker.is_some() {
                    if let Event::Key(key) = event {
                        self.handle_picker_key(key);
                    }
                } else {
                    self.handle_input(event);
                }
                true
            }
            Some(AppEvent::Tick) => {
                self.handle_tick();
                true
            }
            Some(AppEvent::PictureLoaded(result)) => {
                self.handle_picture_loaded(result);
                true
            }
            None => false,
        }
    }

    fn handle_global_shortcut(&mut self, key: &KeyEvent) -> bool {
        if key.modifiers == KeyModifiers::CONTROL {
            if let KeyCode::Char('c') = key.code {
                self.state.should_quit = true;
                return true;
            }
        }
        false
    }

    fn handle_tick(&mut self) {
        let expired = self
            .toast
            .as_ref()
            .map(|toast| toast.is_expired(Instant::now()))
            .unwrap_or(false);
        if expired {
            self.toast = None;
        }
    }

    fn handle_picture_loaded(&mut self, result: Result<LoadedPicture, PictureError>) {
        self.form.pending_picture = None;
        match result {
            Ok(loaded) => {
                info!(path = %loaded.path.display(), bytes = loaded.len, "profile picture ready");
                self.state.set_status(format!(
                    "Picture ready: {} ({})",
                    file_label(&loaded.path),
                    format_size(loaded.len)
                ));
                // Last completed read wins, even if a submit reset the form
                // in the meantime.
                self.form.picture = Some(loaded);
            }
            Err(err) => {
                error!(%err, "profile picture load failed");
                self.form.picture = None;
                self.state.set_status(format!("Picture failed: {err}"));
            }
        }
    }

    fn handle_input(&mut self, event: Event) {
        if let Event::Key(key) = event {
            if let CardMode::Editing(_) = self.card_mode {
                self.handle_edit_key(key);
            } else {
                match self.state.focus {
                    Focus::Form => self.handle_form_key(key),
                    Focus::List => self.handle_list_key(key),
                }
            }
        }
    }

    fn handle_form_key(&mut self, key: KeyEvent) {
        if key.modifiers == KeyModifiers::CONTROL {
            match key.code {
                KeyCode::Char('p') => {
                    self.open_picture_picker();
                    return;
                }
                KeyCode::Char('u') => {
                    self.clear_picture();
                    return;
                }
                _ => {}
            }
        }
        match key.code {
            KeyCode::Esc => {
                self.state.focus = Focus::List;
                self.state.set_status("Browsing contacts".to_string());
            }
            KeyCode::Enter => self.submit_form(),
            KeyCode::Tab | KeyCode::Down => self.form.field = self.form.field.next(),
            KeyCode::BackTab | KeyCode::Up => self.form.field = self.form.field.prev(),
            KeyCode::Left => self.form.focused_mut().move_left(),
            KeyCode::Right => self.form.focused_mut().move_right(),
            KeyCode::Home => self.form.focused_mut().move_home(),
            KeyCode::End => self.form.focused_mut().move_end(),
            KeyCode::Backspace => self.form.focused_mut().backspace(),
            KeyCode::Delete => self.form.focused_mut().delete(),
            KeyCode::Char(ch) => {
                if key.modifiers.is_empty() || key.modifiers == KeyModifiers::SHIFT {
                    self.form.focused_mut().insert(ch);
                }
            }
            _ => {}
        }
    }

    fn handle_list_key(&mut self, key: KeyEvent) {
        let total = self.store.len();
        let visible = self.state.visible_cards.max(1);
        match key.code {
            KeyCode::Char('q') if key.modifiers.is_empty() => {
                self.state.should_quit = true;
            }
            KeyCode::Tab => {
                self.state.focus = Focus::Form;
                self.state
                    .set_status("Fill in the form; Enter adds the contact".to_string());
            }
            KeyCode::Char('j') | KeyCode::Down => self.state.move_list_cursor(1, total, visible),
            KeyCode::Char('k') | KeyCode::Up => self.state.move_list_cursor(-1, total, visible),
            KeyCode::Char('g') if key.modifiers.is_empty() => {
                self.state.jump_list_cursor(0, total, visible)
            }
            KeyCode::Char('G') => {
                self.state
                    .jump_list_cursor(total.saturating_sub(1), total, visible)
            }
            KeyCode::Home => self.state.jump_list_cursor(0, total, visible),
            KeyCode::End => self
                .state
                .jump_list_cursor(total.saturating_sub(1), total, visible),
            KeyCode::PageDown => self
                .state
                .move_list_cursor(visible as isize, total, visible),
            KeyCode::PageUp => self
                .state
                .move_list_cursor(-(visible as isize), total, visible),
            KeyCode::Char('e') | KeyCode::Enter => self.begin_edit(),
            KeyCode::Char('d') | KeyCode::Delete => self.request_delete(),
            _ => {}
        }
    }

    fn handle_edit_key(&mut self, key: KeyEvent) {
        let mut commit = false;
        let mut cancel = false;
        if let CardMode::Editing(buffer) = &mut self.card_mode {
            match key.code {
                KeyCode::Esc => cancel = true,
                KeyCode::Enter => commit = true,
                KeyCode::Tab | KeyCode::Down => buffer.field = buffer.field.next(),
                KeyCode::BackTab | KeyCode::Up => buffer.field = buffer.field.prev(),
                KeyCode::Left => buffer.focused_mut().move_left(),
                KeyCode::Right => buffer.focused_mut().move_right(),
                KeyCode::Home => buffer.focused_mut().move_home(),
                KeyCode::End => buffer.focused_mut().move_end(),
                KeyCode::Backspace => buffer.focused_mut().backspace(),
                KeyCode::Delete => buffer.focused_mut().delete(),
                KeyCode::Char(ch) => {
                    if key.modifiers.is_empty() || key.modifiers == KeyModifiers::SHIFT {
                        buffer.focused_mut().insert(ch);
                    }
                }
                _ => {}
            }
        }
        if cancel {
            self.cancel_edit();
        }
        if commit {
            self.save_edit();
        }
    }

    fn handle_confirm_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Enter | KeyCode::Char('y') | KeyCode::Char('Y') => {
                if let Some(confirm) = self.confirm_delete.take() {
                    if self.store.delete(&confirm.contact_id) {
                        self.state.set_status(format!("Deleted {}", confirm.name));
                    } else {
                        self.state
                            .set_status("Contact was already removed".to_string());
                    }
                    let total = self.store.len();
                    let visible = self.state.visible_cards.max(1);
                    self.state.move_list_cursor(0, total, visible);
                }
            }
            KeyCode::Esc | KeyCode::Char('n') | KeyCode::Char('N') => {
                self.confirm_delete = None;
                self.state.set_status("Delete cancelled".to_string());
            }
            _ => {}
        }
    }

    fn handle_picker_key(&mut self, key: KeyEvent) {
        let mut close = false;
        let mut rescan = false;
        let mut chosen: Option<PictureEntry> = None;
        if let Some(picker) = self.picker.as_mut() {
            match key.code {
                KeyCode::Esc => close = true,
                KeyCode::Char('j') | KeyCode::Down => picker.move_cursor(1),
                KeyCode::Char('k') | KeyCode::Up => picker.move_cursor(-1),
                KeyCode::Home => picker.jump(0),
                KeyCode::End => {
                    let last = picker.entries.len().saturating_sub(1);
                    picker.jump(last);
                }
                KeyCode::Char('r') => rescan = true,
                KeyCode::Enter => chosen = picker.selected().cloned(),
                _ => {}
            }
        }
        if close {
            self.picker = None;
            self.state
                .set_status("Picture selection cancelled".to_string());
        }
        if rescan {
            self.open_picture_picker();
        }
        if let Some(entry) = chosen {
            self.picker = None;
            self.start_picture_load(entry);
        }
    }

    fn submit_form(&mut self) {
        let report = validate::validate_fields(
            self.form.name.value(),
            self.form.email.value(),
            self.form.phone.value(),
        );
        self.form.errors = report;
        if !report.is_clean() {
            self.state
                .set_status("Fix the highlighted fields first".to_string());
            return;
        }

        let draft = self.form.draft(&self.config.placeholder_url);
        let contact = self.store.add(draft);
        let name = contact.name.clone();
        self.form.reset();
        self.toast = Some(Toast::new(
            "Contact Added",
            format!("{name} has been added to your contacts."),
        ));
        self.state.set_status(format!("Added {name}"));
    }

    fn begin_edit(&mut self) {
        let Some(contact) = self.store.contacts().get(self.state.cursor) else {
            self.state.set_status("No contact selected".to_string());
            return;
        };
        info!(id = %contact.id, "editing contact");
        self.state.set_status(format!("Editing {}", contact.name));
        self.card_mode = CardMode::Editing(EditBuffer::snapshot(contact));
    }

    fn save_edit(&mut self) {
        let CardMode::Editing(buffer) =
            std::mem::replace(&mut self.card_mode, CardMode::Viewing)
        else {
            return;
        };
        let Some(existing) = self.store.get(&buffer.contact_id) else {
            debug!(id = %buffer.contact_id, "edited contact disappeared before save");
            self.state
                .set_status("Contact no longer exists".to_string());
            return;
        };
        // Edits are committed as typed; creation rules are not re-applied.
        let updated = buffer.merged(existing);
        let name = updated.name.clone();
        if self.store.update(updated) {
            self.state.set_status(format!("Saved changes to {name}"));
        } else {
            self.state
                .set_status("Contact no longer exists".to_string());
        }
    }

    fn cancel_edit(&mut self) {
        self.card_mode = CardMode::Viewing;
        self.state.set_status("Edit cancelled".to_string());
    }

    fn request_delete(&mut self) {
        let Some(contact) = self.store.contacts().get(self.state.cursor) else {
            self.state.set_status("No contact selected".to_string());
            return;
        };
        self.confirm_delete = Some(DeleteConfirm {
            contact_id: contact.id.clone(),
            name: contact.name.clone(),
        });
    }

    fn open_picture_picker(&mut self) {
        let entries = picture::discover_pictures(&self.config.pictures_root, PICKER_SCAN_DEPTH);
        debug!(count = entries.len(), "pictures discovered");
        if entries.is_empty() {
            self.state.set_status(format!(
                "No images under {}",
                self.config.pictures_root.display()
            ));
        } else {
            self.state
                .set_status(format!("{} images found", entries.len()));
        }
        self.picker = Some(PicturePicker::new(entries));
    }

    fn clear_picture(&mut self) {
        if self.form.picture.take().is_some() {
            self.state
                .set_status("Picture cleared; the placeholder will be used".to_string());
        } else {
            self.state.set_status("No picture selected".to_string());
        }
    }

    fn start_picture_load(&mut self, entry: PictureEntry) {
        let Some(sender) = self.event_tx.clone() else {
            self.state
                .set_status("Internal error: event channel unavailable".to_string());
            error!("event channel missing for picture load");
            return;
        };

        let timeout = self.config.picture_timeout();
        info!(path = %entry.path.display(), "loading profile picture");
        self.state.set_status(format!("Loading {}…", entry.file_name));
        self.form.pending_picture = Some(entry.file_name.clone());
        let path = entry.path.clone();
        spawn(async move {
            let result = picture::load_data_uri(path, timeout).await;
            let _ = sender.send(AppEvent::PictureLoaded(result)).await;
        });
    }

    fn draw(&mut self, frame: &mut Frame) {
        let area = frame.size();
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Min(12),
                Constraint::Length(4),
            ])
            .split(area);

        self.render_header(frame, rows[0]);

        let body = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Length(46), Constraint::Min(30)])
            .split(rows[1]);

        self.render_form(frame, body[0]);
        self.render_card_list(frame, body[1]);
        self.render_status(frame, rows[2]);

        if let Some(picker) = self.picker.as_mut() {
            Self::render_picture_picker(&self.theme, &self.config, frame, area, picker);
        }
        if let Some(confirm) = &self.confirm_delete {
            self.render_delete_confirm(frame, confirm);
        }
        if let Some(toast) = &self.toast {
            self.render_toast(frame, area, toast);
        }
    }

    fn render_header(&self, frame: &mut Frame, area: Rect) {
        let lines = vec![
            Line::from(Span::styled(
                "ContactCard Creator",
                Style::default()
                    .fg(self.theme.accent)
                    .add_modifier(Modifier::BOLD),
            )),
            Line::from(Span::styled(
                "Create and manage your contacts with ease.",
                Style::default().fg(self.theme.muted),
            )),
        ];
        let paragraph = Paragraph::new(lines).alignment(Alignment::Center);
        frame.render_widget(paragraph, area);
    }

    fn render_form(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default().borders(Borders::ALL).title("Add New Contact");
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(2),
                Constraint::Length(3),
                Constraint::Length(3),
                Constraint::Length(3),
                Constraint::Length(3),
                Constraint::Min(0),
            ])
            .split(inner);

        let description = Paragraph::new(Line::from(Span::styled(
            "Fill in the details to create a new contact card.",
            Style::default().fg(self.theme.muted),
        )))
        .wrap(Wrap { trim: true });
        frame.render_widget(description, chunks[0]);

        for field in ContactField::ALL {
            self.render_form_field(frame, chunks[field.index() + 1], field);
        }

        let picture_line = if let Some(name) = &self.form.pending_picture {
            Line::from(Span::styled(
                format!("loading {name}…"),
                Style::default().fg(self.theme.warning),
            ))
        } else if let Some(loaded) = &self.form.picture {
            Line::from(Span::styled(
                format!("{} ({})", file_label(&loaded.path), format_size(loaded.len)),
                Style::default().fg(self.theme.success),
            ))
        } else {
            Line::from(Span::styled(
                "placeholder (none uploaded)",
                Style::default().fg(self.theme.muted),
            ))
        };
        let picture = Paragraph::new(vec![
            Line::from(Span::styled(
                "Profile Picture",
                Style::default().fg(self.theme.primary_fg),
            )),
            picture_line,
        ]);
        frame.render_widget(picture, chunks[4]);

        let help = Paragraph::new(vec![
            Line::from("Enter  add contact"),
            Line::from("Tab/Shift+Tab  next / previous field"),
            Line::from("Ctrl+P  choose picture · Ctrl+U  clear it"),
            Line::from("Esc  jump to the card list"),
        ])
        .style(Style::default().fg(self.theme.muted));
        frame.render_widget(help, chunks[5]);

        if self.state.focus == Focus::Form
            && matches!(self.card_mode, CardMode::Viewing)
            && self.picker.is_none()
            && self.confirm_delete.is_none()
        {
            let chunk = chunks[self.form.field.index() + 1];
            let input = self.form.input(self.form.field);
            let x = (chunk.x + 2 + input.cursor_col() as u16)
                .min(chunk.x + chunk.width.saturating_sub(1));
            frame.set_cursor(x, chunk.y + 1);
        }
    }

    fn render_form_field(&self, frame: &mut Frame, area: Rect, field: ContactField) {
        let focused = self.state.focus == Focus::Form && self.form.field == field;
        let label_style = if focused {
            Style::default()
                .fg(self.theme.accent)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(self.theme.primary_fg)
        };
        let prefix_style = if focused {
            Style::default().fg(self.theme.accent)
        } else {
            Style::default().fg(self.theme.muted)
        };
        let input = self.form.input(field);
        let value_span = if input.value().is_empty() {
            Span::styled(field.placeholder(), Style::default().fg(self.theme.muted))
        } else {
            Span::raw(input.value().to_string())
        };

        let mut lines = vec![
            Line::from(Span::styled(field.label(), label_style)),
            Line::from(vec![Span::styled("> ", prefix_style), value_span]),
        ];
        let error = match field {
            ContactField::Name => self.form.errors.name,
            ContactField::Email => self.form.errors.email,
            ContactField::Phone => self.form.errors.phone,
        };
        if let Some(err) = error {
            lines.push(Line::from(Span::styled(
                err.to_string(),
                Style::default().fg(self.theme.danger),
            )));
        }
        frame.render_widget(Paragraph::new(lines), area);
    }

    fn render_card_list(&mut self, frame: &mut Frame, area: Rect) {
        let block = Block::default()
            .borders(Borders::ALL)
            .title(format!("Contacts ({})", self.store.len()));
        let inner = block.inner(area);
        frame.render_widget(block, area);

        if self.store.is_empty() {
            let empty = Paragraph::new(vec![
                Line::from(""),
                Line::from(Span::styled(
                    "No Contacts Yet",
                    Style::default()
                        .fg(self.theme.primary_fg)
                        .add_modifier(Modifier::BOLD),
                )),
                Line::from(Span::styled(
                    "Add a new contact using the form to see it here.",
                    Style::default().fg(self.theme.muted),
                )),
            ])
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true });
            frame.render_widget(empty, inner);
            self.state.visible_cards = 1;
            return;
        }

        let visible = (inner.height as usize / CARD_LINES).max(1);
        self.state.visible_cards = visible;
        let total = self.store.len();
        self.state.clamp_list(total, visible);

        let focus_list = self.state.focus == Focus::List;
        let mut lines: Vec<Line> = Vec::new();
        let mut edit_cursor: Option<(u16, u16)> = None;
        let end = cmp::min(self.state.offset + visible, total);
        for idx in self.state.offset..end {
            let contact = &self.store.contacts()[idx];
            let selected = idx == self.state.cursor;
            let row = (idx - self.state.offset) * CARD_LINES;

            let editing = if selected {
                match &self.card_mode {
                    CardMode::Editing(buffer) => Some(buffer),
                    CardMode::Viewing => None,
                }
            } else {
                None
            };

            let initials = contact.initials();
            let marker = if selected {
                let style = if focus_list {
                    Style::default()
                        .fg(self.theme.accent)
                        .add_modifier(Modifier::BOLD)
                } else {
                    Style::default().fg(self.theme.muted)
                };
                Span::styled("▶ ", style)
            } else {
                Span::raw("  ")
            };
            let badge = Span::styled(
                format!("[{initials}] "),
                Style::default()
                    .fg(self.theme.accent_alt)
                    .add_modifier(Modifier::BOLD),
            );

            if let Some(buffer) = editing {
                let name_prefix = 5 + initials.chars().count();
                for field in ContactField::ALL {
                    let focused = buffer.field == field;
                    let input = buffer.input(field);
                    let value_style = if focused {
                        Style::default()
                            .fg(self.theme.accent)
                            .add_modifier(Modifier::UNDERLINED)
                    } else {
                        Style::default().fg(self.theme.primary_fg)
                    };
                    let (line, prefix_cols) = match field {
                        ContactField::Name => (
                            Line::from(vec![
                                marker.clone(),
                                badge.clone(),
                                Span::styled(input.value().to_string(), value_style),
                            ]),
                            name_prefix,
                        ),
                        ContactField::Email | ContactField::Phone => (
                            Line::from(vec![
                                Span::raw("   "),
                                Span::styled(
                                    format!("{}  ", field.label()),
                                    Style::default().fg(self.theme.muted),
                                ),
                                Span::styled(input.value().to_string(), value_style),
                            ]),
                            10,
                        ),
                    };
                    lines.push(line);
                    if focused {
                        let x = (inner.x + (prefix_cols + input.cursor_col()) as u16)
                            .min(inner.x + inner.width.saturating_sub(1));
                        let y = inner.y + (row + field.index()) as u16;
                        edit_cursor = Some((x, y));
                    }
                }
                lines.push(Line::from(Span::styled(
                    "   editing · Enter save · Esc cancel",
                    Style::default().fg(self.theme.muted),
                )));
            } else {
                let mut name_style = Style::default()
                    .fg(self.theme.primary_fg)
                    .add_modifier(Modifier::BOLD);
                if selected && focus_list {
                    name_style = name_style.bg(self.theme.selection_bg);
                }
                lines.push(Line::from(vec![
                    marker,
                    badge,
                    Span::styled(contact.name.clone(), name_style),
                ]));
                lines.push(Line::from(vec![
                    Span::raw("   "),
                    Span::styled("Email  ", Style::default().fg(self.theme.muted)),
                    Span::raw(contact.email.clone()),
                ]));
                lines.push(Line::from(vec![
                    Span::raw("   "),
                    Span::styled("Phone  ", Style::default().fg(self.theme.muted)),
                    Span::raw(contact.phone.clone()),
                ]));
                let photo = if contact.has_uploaded_picture() {
                    "uploaded picture"
                } else {
                    "placeholder"
                };
                lines.push(Line::from(Span::styled(
                    format!("   Photo  {photo} · id {}", contact.id),
                    Style::default().fg(self.theme.muted),
                )));
            }
            lines.push(Line::from(""));
        }

        frame.render_widget(Paragraph::new(lines), inner);

        if let Some((x, y)) = edit_cursor {
            if self.picker.is_none() && self.confirm_delete.is_none() {
                frame.set_cursor(x, y);
            }
        }
    }

    fn render_status(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default().borders(Borders::ALL).title("Status");
        let secondary = format!(
            "Contacts: {} · in-memory only, gone when you quit",
            self.store.len()
        );
        let paragraph = Paragraph::new(vec![
            Line::from(self.state.status.clone()),
            Line::from(Span::styled(
                secondary,
                Style::default().fg(self.theme.muted),
            )),
        ])
        .block(block)
        .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, area);
    }

    fn render_picture_picker(
        theme: &Theme,
        config: &AppConfig,
        frame: &mut Frame,
        area: Rect,
        picker: &mut PicturePicker,
    ) {
        let width = cmp::max(cmp::min(area.width.saturating_sub(4), 64), cmp::min(30, area.width));
        let header_lines = 3usize;
        let len = picker.entries.len();
        let max_height = area.height.saturating_sub(2) as usize;
        let mut height = header_lines + 2 + len.max(1);
        if max_height > 0 {
            height = height.min(max_height).max(header_lines + 3);
        }
        let popup = centered_rect(width, height as u16, area);
        frame.render_widget(Clear, popup);

        let block = Block::default()
            .borders(Borders::ALL)
            .title("Choose Profile Picture");
        let mut lines = Vec::new();
        lines.push(Line::from(Span::styled(
            format!("Scanning {}", config.pictures_root.display()),
            Style::default().fg(theme.muted),
        )));
        lines.push(Line::from("Enter select · Esc cancel · r rescan"));
        lines.push(Line::from(""));

        if len == 0 {
            lines.push(Line::from(Span::styled(
                "No images found here.",
                Style::default().fg(theme.warning),
            )));
        } else {
            let visible = height.saturating_sub(header_lines + 2).max(1);
            picker.clamp(visible);
            let end = cmp::min(picker.offset + visible, len);
            for idx in picker.offset..end {
                let entry = &picker.entries[idx];
                let pointer = if idx == picker.cursor {
                    Span::styled("▶ ", Style::default().fg(theme.accent))
                } else {
                    Span::raw("  ")
                };
                let modified = entry
                    .modified
                    .map(|stamp| stamp.format("%Y-%m-%d %H:%M").to_string())
                    .unwrap_or_else(|| "-".to_string());
                lines.push(Line::from(vec![
                    pointer,
                    Span::raw(format!(
                        "{}  {}  {}",
                        entry.file_name,
                        format_size(entry.len),
                        modified
                    )),
                ]));
            }
        }

        let paragraph = Paragraph::new(lines).block(block);
        frame.render_widget(paragraph, popup);
    }

    fn render_delete_confirm(&self, frame: &mut Frame, confirm: &DeleteConfirm) {
        let frame_area = frame.size();
        let width = cmp::max(
            cmp::min(58, frame_area.width.saturating_sub(4)),
            cmp::min(30, frame_area.width),
        );
        let area = centered_rect(width, 8, frame_area);
        frame.render_widget(Clear, area);

        let body = format!(
            "This action cannot be undone. This will permanently delete the contact for {}.",
            confirm.name
        );
        let helper = Line::from(vec![
            Span::styled("y/Enter", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw(" delete  "),
            Span::styled("n/Esc", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw(" cancel"),
        ]);
        let paragraph = Paragraph::new(vec![
            Line::from(Span::styled(
                "Are you absolutely sure?",
                Style::default()
                    .fg(self.theme.danger)
                    .add_modifier(Modifier::BOLD),
            )),
            Line::from(""),
            Line::from(body),
            Line::from(""),
            helper,
        ])
        .block(Block::default().borders(Borders::ALL).title("Delete Contact"))
        .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, area);
    }

    fn render_toast(&self, frame: &mut Frame, area: Rect, toast: &Toast) {
        if area.width < 20 || area.height < 6 {
            return;
        }
        let longest = toast
            .body
            .chars()
            .count()
            .max(toast.title.chars().count()) as u16;
        let width = cmp::min(area.width.saturating_sub(4), longest.saturating_add(4).max(24));
        let x = area.x + area.width.saturating_sub(width + 1);
        let y = area.y + 1;
        let rect = Rect::new(x, y, width, 4);
        frame.render_widget(Clear, rect);

        let paragraph = Paragraph::new(vec![
            Line::from(Span::styled(
                toast.title.clone(),
                Style::default()
                    .fg(self.theme.success)
                    .add_modifier(Modifier::BOLD),
            )),
            Line::from(toast.body.clone()),
        ])
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(self.theme.success)),
        )
        .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, rect);
    }
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
    disable_raw_mode().context("failed to disable raw mode")?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)
        .context("failed to leave alternate screen")?;
    terminal.show_cursor()?;
    Ok(())
}

fn spawn_input_thread(sender: mpsc::Sender<AppEvent>) {
    thread::spawn(move || loop {
        match event::poll(TICK_RATE) {
            Ok(true) => match event::read() {
                Ok(evt) => {
                    if sender.blocking_send(AppEvent::Input(evt)).is_err() {
                        break;
                    }
                }
                Err(_) => break,
            },
            Ok(false) => {
                if sender.blocking_send(AppEvent::Tick).is_err() {
                    break;
                }
            }
            Err(_) => break,
        }
    });
}

fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    let x = area.x + (area.width.saturating_sub(width)) / 2;
    let y = area.y + (area.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width, height)
}

fn file_label(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}

fn format_size(len: u64) -> String {
    if len < 1024 {
        format!("{len} B")
    } else if len < 1024 * 1024 {
        format!("{:.1} KB", len as f64 / 1024.0)
    } else {
        format!("{:.1} MB", len as f64 / (1024.0 * 1024.0))
    }
}

struct UiState {
    cursor: usize,
    offset: usize,
    visible_cards: usize,
    status: String,
    focus: Focus,
    should_quit: bool,
}

impl Default for UiState {
    fn default() -> Self {
        Self {
            cursor: 0,
            offset: 0,
            visible_cards: 1,
            status: "Ready".to_string(),
            focus: Focus::Form,
            should_quit: false,
        }
    }
}

impl UiState {
    fn set_status(&mut self, message: String) {
        self.status = message;
    }

    fn move_list_cursor(&mut self, delta: isize, total: usize, visible: usize) {
        if total == 0 {
            self.cursor = 0;
            self.offset = 0;
            return;
        }
        let mut idx = self.cursor as isize + delta;
        if idx < 0 {
            idx = 0;
        } else if idx >= total as isize {
            idx = total as isize - 1;
        }
        self.cursor = idx as usize;
        self.ensure_list_visible(total, visible);
    }

    fn jump_list_cursor(&mut self, index: usize, total: usize, visible: usize) {
        if total == 0 {
            self.cursor = 0;
            self.offset = 0;
            return;
        }
        self.cursor = index.min(total - 1);
        self.ensure_list_visible(total, visible);
    }

    fn clamp_list(&mut self, total: usize, visible: usize) {
        self.move_list_cursor(0, total, visible);
    }

    fn ensure_list_visible(&mut self, total: usize, visible: usize) {
        let visible = visible.max(1);
        if self.cursor < self.offset {
            self.offset = self.cursor;
        } else if self.cursor >= self.offset + visible {
            self.offset = self.cursor + 1 - visible;
        }
        let max_offset = total.saturating_sub(visible);
        if self.offset > max_offset {
            self.offset = max_offset;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cardfile_core::picture::PLACEHOLDER_PICTURE_URL;

    fn test_app() -> CardfileApp {
        let config = AppConfig {
            pictures_root: PathBuf::from("."),
            placeholder_url: PLACEHOLDER_PICTURE_URL.to_string(),
            picture_timeout_secs: 5,
        };
        CardfileApp::new(config, ContactStore::with_sequential_ids())
    }

    fn fill_form(app: &mut CardfileApp, name: &str, email: &str, phone: &str) {
        app.form.name = TextInput::from_value(name);
        app.form.email = TextInput::from_value(email);
        app.form.phone = TextInput::from_value(phone);
    }

    fn loaded_png(name: &str) -> LoadedPicture {
        LoadedPicture {
            path: PathBuf::from(name),
            data_uri: "data:image/png;base64,YWJj".to_string(),
            len: 3,
        }
    }

    #[test]
    fn text_input_edits_at_char_boundaries() {
        let mut input = TextInput::default();
        for ch in "Él".chars() {
            input.insert(ch);
        }
        assert_eq!(input.value(), "Él");
        assert_eq!(input.cursor_col(), 2);

        input.move_left();
        input.move_left();
        input.insert('…');
        assert_eq!(input.value(), "…Él");

        input.move_end();
        input.backspace();
        assert_eq!(input.value(), "…É");
        input.move_home();
        input.delete();
        assert_eq!(input.value(), "É");
    }

    #[test]
    fn field_cycling_wraps_both_ways() {
        assert_eq!(ContactField::Name.next(), ContactField::Email);
        assert_eq!(ContactField::Phone.next(), ContactField::Name);
        assert_eq!(ContactField::Name.prev(), ContactField::Phone);
    }

    #[test]
    fn submit_rejects_short_name_and_keeps_store_empty() {
        let mut app = test_app();
        fill_form(&mut app, "A", "jane@x.com", "1234567890");
        app.submit_form();

        assert!(app.store.is_empty());
        assert!(app.form.errors.name.is_some());
        assert!(app.toast.is_none());
        // Typed values survive a failed submit.
        assert_eq!(app.form.name.value(), "A");
    }

    #[test]
    fn submit_adds_contact_resets_form_and_raises_toast() {
        let mut app = test_app();
        fill_form(&mut app, "Jane Doe", "jane@x.com", "1234567890");
        app.submit_form();

        assert_eq!(app.store.len(), 1);
        let contact = &app.store.contacts()[0];
        assert_eq!(contact.name, "Jane Doe");
        assert_eq!(contact.profile_picture, PLACEHOLDER_PICTURE_URL);

        assert_eq!(app.form.name.value(), "");
        assert_eq!(app.form.phone.value(), "");
        assert!(app.form.errors.is_clean());

        let toast = app.toast.as_ref().expect("toast raised");
        assert_eq!(toast.title, "Contact Added");
        assert_eq!(toast.body, "Jane Doe has been added to your contacts.");
    }

    #[test]
    fn submit_before_picture_read_completes_uses_placeholder() {
        let mut app = test_app();
        fill_form(&mut app, "Jane Doe", "jane@x.com", "1234567890");
        app.form.pending_picture = Some("avatar.png".to_string());
        app.submit_form();

        assert_eq!(
            app.store.contacts()[0].profile_picture,
            PLACEHOLDER_PICTURE_URL
        );
    }

    #[test]
    fn late_picture_completion_lands_in_the_fresh_form() {
        let mut app = test_app();
        fill_form(&mut app, "Jane Doe", "jane@x.com", "1234567890");
        app.form.pending_picture = Some("avatar.png".to_string());
        app.submit_form();

        app.handle_picture_loaded(Ok(loaded_png("avatar.png")));
        assert!(app.form.pending_picture.is_none());
        let preview = app.form.picture.as_ref().expect("preview filled");
        assert_eq!(preview.data_uri, "data:image/png;base64,YWJj");
    }

    #[test]
    fn loaded_picture_is_embedded_on_the_next_submit() {
        let mut app = test_app();
        app.handle_picture_loaded(Ok(loaded_png("avatar.png")));
        fill_form(&mut app, "Jane Doe", "jane@x.com", "1234567890");
        app.submit_form();

        assert_eq!(
            app.store.contacts()[0].profile_picture,
            "data:image/png;base64,YWJj"
        );
        // The preview resets with the rest of the form.
        assert!(app.form.picture.is_none());
    }

    #[test]
    fn picture_failure_returns_preview_to_placeholder() {
        let mut app = test_app();
        app.handle_picture_loaded(Ok(loaded_png("avatar.png")));
        app.form.pending_picture = Some("big.png".to_string());
        app.handle_picture_loaded(Err(PictureError::TooLarge {
            path: PathBuf::from("big.png"),
            len: 10,
            limit: 4,
        }));

        assert!(app.form.pending_picture.is_none());
        assert!(app.form.picture.is_none());
        assert!(app.state.status.starts_with("Picture failed"));
    }

    #[test]
    fn edit_cancel_restores_committed_values() {
        let mut app = test_app();
        fill_form(&mut app, "Jane Doe", "jane@x.com", "1234567890");
        app.submit_form();

        app.begin_edit();
        if let CardMode::Editing(buffer) = &mut app.card_mode {
            buffer.phone = TextInput::from_value("9999999999");
        } else {
            panic!("expected edit mode");
        }
        app.cancel_edit();

        assert!(matches!(app.card_mode, CardMode::Viewing));
        let contact = &app.store.contacts()[0];
        assert_eq!(contact.phone, "1234567890");
        assert_eq!(contact.name, "Jane Doe");
    }

    #[test]
    fn edit_save_commits_buffer_and_preserves_id_and_picture() {
        let mut app = test_app();
        app.handle_picture_loaded(Ok(loaded_png("avatar.png")));
        fill_form(&mut app, "Jane Doe", "jane@x.com", "1234567890");
        app.submit_form();
        let id = app.store.contacts()[0].id.clone();

        app.begin_edit();
        if let CardMode::Editing(buffer) = &mut app.card_mode {
            buffer.phone = TextInput::from_value("9999999999");
            // Edit-save skips creation validation on purpose.
            buffer.name = TextInput::from_value("J");
        } else {
            panic!("expected edit mode");
        }
        app.save_edit();

        assert!(matches!(app.card_mode, CardMode::Viewing));
        assert_eq!(app.store.len(), 1);
        let contact = &app.store.contacts()[0];
        assert_eq!(contact.id, id);
        assert_eq!(contact.phone, "9999999999");
        assert_eq!(contact.name, "J");
        assert_eq!(contact.profile_picture, "data:image/png;base64,YWJj");
    }

    #[test]
    fn delete_goes_through_the_confirmation_gate() {
        let mut app = test_app();
        fill_form(&mut app, "Jane Doe", "jane@x.com", "1234567890");
        app.submit_form();

        app.request_delete();
        assert!(app.confirm_delete.is_some());
        assert_eq!(app.store.len(), 1);

        app.handle_confirm_key(KeyEvent::new(KeyCode::Esc, KeyModifiers::NONE));
        assert!(app.confirm_delete.is_none());
        assert_eq!(app.store.len(), 1, "cancel must not delete");

        app.request_delete();
        app.handle_confirm_key(KeyEvent::new(KeyCode::Enter, KeyModifiers::NONE));
        assert!(app.store.is_empty());

        // With nothing selected the gate never opens again.
        app.request_delete();
        assert!(app.confirm_delete.is_none());
    }

    #[test]
    fn list_keys_route_edit_and_delete() {
        let mut app = test_app();
        fill_form(&mut app, "Jane Doe", "jane@x.com", "1234567890");
        app.submit_form();
        app.state.focus = Focus::List;

        app.handle_list_key(KeyEvent::new(KeyCode::Char('e'), KeyModifiers::NONE));
        assert!(matches!(app.card_mode, CardMode::Editing(_)));
        app.handle_edit_key(KeyEvent::new(KeyCode::Esc, KeyModifiers::NONE));
        assert!(matches!(app.card_mode, CardMode::Viewing));

        app.handle_list_key(KeyEvent::new(KeyCode::Char('d'), KeyModifiers::NONE));
        assert!(app.confirm_delete.is_some());
    }

    #[test]
    fn toast_expires_after_its_window() {
        let toast = Toast::new("Contact Added", "Jane has been added to your contacts.");
        assert!(!toast.is_expired(toast.shown_at + Duration::from_secs(3)));
        assert!(toast.is_expired(toast.shown_at + Duration::from_secs(4)));
    }

    #[test]
    fn list_cursor_stays_in_bounds() {
        let mut state = UiState::default();
        state.move_list_cursor(5, 3, 2);
        assert_eq!(state.cursor, 2);
        assert_eq!(state.offset, 1);

        state.move_list_cursor(-10, 3, 2);
        assert_eq!(state.cursor, 0);
        assert_eq!(state.offset, 0);

        state.jump_list_cursor(99, 3, 2);
        assert_eq!(state.cursor, 2);

        state.clamp_list(0, 2);
        assert_eq!(state.cursor, 0);
        assert_eq!(state.offset, 0);
    }
}
