use anyhow::{Context, Result};
use crossterm::{
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers,
        MouseButton, MouseEvent, MouseEventKind,
    },
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use md_jinja_config::Config;
use md_jinja_engine::config::{JinjaConfig, JinjaPlugin, resolve_jinja};
use md_jinja_engine::document::{Document, Edit, Element, Path, Range};
use md_jinja_engine::highlight::Decorator;
use md_jinja_engine::panel::{
    CommitOutcome, DocumentHost, KeyOutcome, ListenerKind, OpenOutcome, PanelBody, PanelKey, PanelOptions,
    TemplatePanel,
};
use ratatui::{
    Frame, Terminal,
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Position},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Clear, Paragraph},
};
use std::{env, io::stdout, path::PathBuf, process};

mod host;
mod render;

use host::TerminalHost;

/// Panel size limit in terminal rows.
const PANEL_MAX_ROWS: f32 = 9.0;

struct App {
    host: TerminalHost,
    decorator: Decorator,
    /// `None` when Jinja or the panel is switched off.
    panel: Option<TemplatePanel>,
    selected: usize,
    file_path: PathBuf,
    status: String,
    panel_area: Option<ratatui::layout::Rect>,
}

impl App {
    fn new(file_path: PathBuf, jinja: Option<&JinjaConfig>) -> Result<Self> {
        let content = if file_path.exists() {
            std::fs::read_to_string(&file_path)
                .with_context(|| format!("Failed to read {}", file_path.display()))?
        } else {
            String::new()
        };
        Ok(Self::with_document(
            file_path,
            Document::from_markdown_lines(content.trim_end_matches('\n')),
            jinja,
        ))
    }

    fn with_document(file_path: PathBuf, document: Document, jinja: Option<&JinjaConfig>) -> Self {
        let panel = jinja.filter(|config| config.panel_enabled()).map(|config| {
            TemplatePanel::new(PanelOptions {
                max_height: PANEL_MAX_ROWS,
                ..PanelOptions::from_config(config)
            })
        });
        let mut host = TerminalHost::new(document);
        host.focus();
        Self {
            host,
            decorator: Decorator::new(jinja.is_some()),
            panel,
            selected: 0,
            file_path,
            status: String::new(),
            panel_area: None,
        }
    }

    fn anchor(&self) -> Path {
        Path::from([self.selected])
    }

    /// Drop cached decorations for everything the last edits replaced.
    fn sync(&mut self) {
        for patch in self.host.take_patches() {
            self.decorator.sync(&patch);
        }
    }

    /// Returns `true` when the app should quit.
    fn handle_key(&mut self, key: KeyEvent) -> Result<bool> {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Char('q') if ctrl => return Ok(true),
            KeyCode::Char('s') if ctrl => {
                self.save()?;
                return Ok(false);
            }
            _ => {}
        }

        if let Some(panel) = &mut self.panel
            && self.host.captures(ListenerKind::Keyboard)
        {
            let panel_key = match key.code {
                KeyCode::Up => PanelKey::ArrowUp,
                KeyCode::Down => PanelKey::ArrowDown,
                KeyCode::Enter => PanelKey::Enter,
                KeyCode::Esc => PanelKey::Escape,
                _ => PanelKey::Other,
            };
            match panel.handle_key(panel_key, &mut self.host) {
                KeyOutcome::Ignored => {}
                KeyOutcome::Consumed | KeyOutcome::Closed => return Ok(false),
                KeyOutcome::Committed(outcome) => {
                    self.status = describe(&outcome);
                    self.sync();
                    return Ok(false);
                }
            }
        }

        match key.code {
            KeyCode::Esc => return Ok(true),
            KeyCode::Up => self.selected = self.selected.saturating_sub(1),
            KeyCode::Down => {
                if self.selected + 1 < self.host.document.block_count() {
                    self.selected += 1;
                }
            }
            KeyCode::Enter => self.split_block()?,
            KeyCode::Backspace => self.backspace()?,
            KeyCode::Char(c) if !ctrl => {
                self.type_char(c)?;
                self.check_trigger();
            }
            _ => {}
        }
        Ok(false)
    }

    fn handle_mouse(&mut self, mouse: MouseEvent) {
        let Some(panel) = &mut self.panel else {
            return;
        };
        let Some(area) = self.panel_area else {
            return;
        };

        let inside = area.contains(Position::new(mouse.column, mouse.row));
        let item = (inside && mouse.row > area.y).then(|| usize::from(mouse.row - area.y - 1));
        match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) if !inside => {
                if self.host.captures(ListenerKind::OutsideClick) {
                    panel.pointer_down(false, &mut self.host);
                }
            }
            MouseEventKind::Down(MouseButton::Left) => {
                if let Some(outcome) = item.and_then(|index| panel.commit(index, &mut self.host)) {
                    self.status = describe(&outcome);
                } else {
                    panel.pointer_down(true, &mut self.host);
                }
            }
            MouseEventKind::Moved => {
                if let Some(index) = item {
                    panel.hover(index);
                }
            }
            _ => {}
        }
        self.sync();
    }

    fn ensure_block(&mut self) -> Result<()> {
        if self.host.document.block_count() == 0 {
            self.host.edit(vec![Edit::InsertNode {
                at: Path::from([0]),
                node: Element::paragraph(""),
            }])?;
            self.selected = 0;
        }
        Ok(())
    }

    fn type_char(&mut self, c: char) -> Result<()> {
        self.ensure_block()?;
        let end = self
            .host
            .end_of(&self.anchor())
            .context("Selected block has no text")?;
        self.host.edit(vec![Edit::InsertText {
            at: end,
            text: c.to_string(),
        }])?;
        self.sync();
        self.close_stale_panel();
        Ok(())
    }

    /// Open the panel when the selected block now ends with the trigger.
    fn check_trigger(&mut self) {
        let anchor = self.anchor();
        let Some(panel) = &mut self.panel else {
            return;
        };
        if !self.host.document.string(&anchor).ends_with(panel.trigger()) {
            return;
        }
        match panel.open(anchor, &mut self.host) {
            OpenOutcome::Ready => {}
            OpenOutcome::Loading(pending) => {
                let completion = futures::executor::block_on(pending.settle());
                panel.finish_load(completion);
            }
            OpenOutcome::Ignored => log::debug!("trigger ignored while templates load"),
        }
    }

    /// Close the panel once its anchor block no longer ends with the trigger,
    /// so a later commit cannot delete text the user typed.
    fn close_stale_panel(&mut self) {
        let Some(panel) = &mut self.panel else {
            return;
        };
        let Some(anchor) = panel.anchor() else {
            return;
        };
        if !self.host.document.string(anchor).ends_with(panel.trigger()) {
            log::debug!("trigger edited away, closing template panel");
            panel.close(&mut self.host);
        }
    }

    fn backspace(&mut self) -> Result<()> {
        let anchor = self.anchor();
        let Some(end) = self.host.end_of(&anchor) else {
            return Ok(());
        };
        if let Some(start) = self.host.point_before(&end, 1)
            && start.path == end.path
        {
            self.host.edit(vec![Edit::Delete {
                range: Range::new(start, end),
            }])?;
        } else if self.selected > 0 && self.host.document.string(&anchor).is_empty() {
            self.host.edit(vec![Edit::RemoveNode { at: anchor }])?;
            self.selected -= 1;
        }
        self.sync();
        self.close_stale_panel();
        Ok(())
    }

    fn split_block(&mut self) -> Result<()> {
        let at = if self.host.document.block_count() == 0 {
            0
        } else {
            self.selected + 1
        };
        self.host.edit(vec![Edit::InsertNode {
            at: Path::from([at]),
            node: Element::paragraph(""),
        }])?;
        self.selected = at;
        self.sync();
        self.close_stale_panel();
        Ok(())
    }

    fn save(&mut self) -> Result<()> {
        let mut text = self.host.document.to_text();
        text.push('\n');
        std::fs::write(&self.file_path, text)
            .with_context(|| format!("Failed to write {}", self.file_path.display()))?;
        self.status = format!("Saved {}", self.file_path.display());
        log::info!("saved {}", self.file_path.display());
        Ok(())
    }
}

fn describe(outcome: &CommitOutcome) -> String {
    match outcome {
        CommitOutcome::Inserted(_) => "Template inserted".to_string(),
        CommitOutcome::Skipped => "Nothing inserted: the block is gone".to_string(),
        CommitOutcome::Failed(e) => format!("Insert failed: {e}"),
    }
}

struct Args {
    file: Option<PathBuf>,
    jinja: bool,
    spans: bool,
}

fn parse_args(args: &[String]) -> Option<Args> {
    let mut parsed = Args {
        file: None,
        jinja: false,
        spans: false,
    };
    for arg in args.iter().skip(1) {
        match arg.as_str() {
            "--jinja" => parsed.jinja = true,
            "--spans" => parsed.spans = true,
            flag if flag.starts_with('-') => return None,
            path if parsed.file.is_none() => parsed.file = Some(PathBuf::from(path)),
            _ => return None,
        }
    }
    Some(parsed)
}

fn init_logging(to_file: bool) -> Result<()> {
    let mut builder = env_logger::Builder::from_default_env();
    builder.filter_level(log::LevelFilter::Info);
    if to_file {
        // The alternate screen owns stderr while the editor runs.
        let log_path = env::temp_dir().join("md-jinja-cli.log");
        let file = std::fs::File::create(&log_path)
            .with_context(|| format!("Failed to create log file {}", log_path.display()))?;
        builder.target(env_logger::Target::Pipe(Box::new(file)));
    }
    builder.init();
    Ok(())
}

/// Print every span of `document`, one per line.
fn print_spans(document: &Document, decorator: &mut Decorator) {
    for span in decorator.decorate_document(document) {
        println!(
            "- path: {} run: {} range: {}..{} category: {:?}",
            span.path, span.child_index, span.start, span.end, span.category
        );
    }
}

fn main() -> Result<()> {
    let args: Vec<String> = env::args().collect();
    let config_path = Config::config_path();

    let Some(parsed) = parse_args(&args) else {
        eprintln!("Usage: {} [--jinja] [--spans] [FILE]", args[0]);
        process::exit(1);
    };

    let config = match Config::load() {
        Ok(config) => config.unwrap_or_default(),
        Err(e) => {
            eprintln!("Error: Failed to load config file: {e}");
            process::exit(1);
        }
    };

    let Some(file_path) = parsed.file.or_else(|| config.default_document.clone()) else {
        eprintln!("Error: No file provided and no default_document configured");
        eprintln!("Usage: {} [--jinja] [--spans] [FILE]", args[0]);
        eprintln!("Or set default_document in {}", config_path.display());
        process::exit(1);
    };

    init_logging(!parsed.spans)?;
    log::info!("md-jinja-cli starting, config {}", config_path.display());

    let plugins: Vec<JinjaPlugin> = if parsed.jinja {
        vec![JinjaPlugin::default()]
    } else {
        Vec::new()
    };
    let jinja = resolve_jinja(Some(&config.jinja), &plugins);
    let mut app = App::new(file_path, jinja.as_ref())?;

    if parsed.spans {
        print_spans(&app.host.document, &mut app.decorator);
        return Ok(());
    }

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, &mut app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        println!("{err:?}");
    }

    Ok(())
}

fn run_app<B: ratatui::backend::Backend>(terminal: &mut Terminal<B>, app: &mut App) -> Result<()>
where
    B::Error: Send + Sync + 'static,
{
    loop {
        terminal.draw(|f| ui(f, app))?;

        match event::read()? {
            Event::Key(key) if key.kind == KeyEventKind::Press => {
                if app.handle_key(key)? {
                    return Ok(());
                }
            }
            Event::Mouse(mouse) => app.handle_mouse(mouse),
            _ => {}
        }
    }
}

fn ui(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(1)].as_ref())
        .split(f.area());
    let editor = chunks[0];

    app.host.begin_frame(editor.height);
    let visible = usize::from(editor.height);
    let first = app.selected.saturating_sub(visible.saturating_sub(1));

    let mut lines = Vec::new();
    for (row, index) in (first..app.host.document.block_count()).take(visible).enumerate() {
        app.host
            .record_block(index, editor.x, editor.y + row as u16, editor.width);
        let path = Path::from([index]);
        let Some(element) = app.host.document.element(&path) else {
            continue;
        };

        let highlights = app.decorator.decorate(element, &path);
        let base = if index == app.selected {
            Style::default().add_modifier(Modifier::BOLD)
        } else {
            Style::default()
        };
        lines.push(render::styled_line(&element.string(), &highlights, base));
    }

    if let Some(row) = app.selected.checked_sub(first)
        && row < visible
    {
        let width = app.host.document.string(&app.anchor()).chars().count();
        let x = editor.x + (width as u16).min(editor.width.saturating_sub(1));
        f.set_cursor_position((x, editor.y + row as u16));
    }
    f.render_widget(Paragraph::new(lines), editor);

    app.panel_area = None;
    if let Some(view) = app.panel.as_ref().and_then(TemplatePanel::view) {
        let area = render::panel_area(view.position, render::panel_height(&view), editor);
        let mut block = Block::bordered().title(view.label);
        if let Some(link) = &view.doc_link {
            block = block.title_bottom(format!("{}: {}", link.text, link.href));
        }
        let body: Vec<Line> = match &view.body {
            PanelBody::Loading(text) | PanelBody::Empty(text) => vec![Line::from(text.clone())],
            PanelBody::Options(options) => options
                .iter()
                .map(|option| render::option_line(&option.title, option.description.as_deref(), option.selected))
                .collect(),
        };
        f.render_widget(Clear, area);
        f.render_widget(Paragraph::new(body).block(block), area);
        app.panel_area = Some(area);
    }

    let help = if app.host.captures(ListenerKind::Keyboard) {
        "↑/↓: Choose | Enter: Insert | Esc: Close"
    } else {
        "Ctrl-S: Save | Ctrl-Q/Esc: Quit | ↑/↓: Select line"
    };
    let status = Line::from(vec![
        Span::styled(app.status.clone(), Style::default().fg(Color::Green)),
        Span::raw(if app.status.is_empty() { "" } else { " | " }),
        Span::raw(help),
    ]);
    f.render_widget(Paragraph::new(status), chunks[1]);
}
