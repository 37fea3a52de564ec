use anyhow::{Context, Result};
use arbor::render::Renderer;
use arbor::style::Palette;
use arbor::tree::Tree;
use clap::Parser;
use crossterm::cursor::{Hide, MoveTo, Show};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, Clear, ClearType, EnterAlternateScreen,
    LeaveAlternateScreen,
};
use crossterm::{execute, queue};
use std::io::{self, Write};
use std::path::PathBuf;
use tracing::warn;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "arbor", about = "Terminal file-tree browser")]
struct Cli {
    /// Directory to browse
    #[arg(default_value = ".")]
    path: PathBuf,

    /// Context lines kept above/below the selection while scrolling
    #[arg(long, default_value_t = 2)]
    padding: usize,

    /// Disable colored output
    #[arg(long)]
    no_color: bool,

    /// Append logs to this file (filtered by RUST_LOG)
    #[arg(long)]
    log_file: Option<PathBuf>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Some(path) = &cli.log_file {
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("opening log file {}", path.display()))?;
        tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .with_writer(file)
            .with_ansi(false)
            .init();
    }

    let mut tree =
        Tree::from_path(&cli.path).with_context(|| format!("opening {}", cli.path.display()))?;
    let palette = if cli.no_color {
        Palette::plain()
    } else {
        Palette::auto()
    };
    let mut renderer = Renderer::new(cli.padding, palette);

    let mut stdout = io::stdout();
    enable_raw_mode()?;
    execute!(stdout, EnterAlternateScreen, Hide)?;
    let result = run(&mut stdout, &mut tree, &mut renderer);
    execute!(stdout, Show, LeaveAlternateScreen)?;
    disable_raw_mode()?;
    result
}

fn run(stdout: &mut io::Stdout, tree: &mut Tree, renderer: &mut Renderer) -> Result<()> {
    loop {
        let (width, height) = crossterm::terminal::size()?;
        let frame = renderer.render(tree, height as usize, width as usize);

        queue!(stdout, Clear(ClearType::All))?;
        for (row, line) in frame.lines().enumerate() {
            queue!(stdout, MoveTo(0, row as u16))?;
            stdout.write_all(line.as_bytes())?;
        }
        stdout.flush()?;

        match event::read()? {
            Event::Key(key) if key.kind != KeyEventKind::Release => {
                if handle_key(key, tree) {
                    return Ok(());
                }
            }
            Event::Resize(..) => {}
            _ => {}
        }
    }
}

/// Returns true when the app should quit.
fn handle_key(key: KeyEvent, tree: &mut Tree) -> bool {
    if key.modifiers.contains(KeyModifiers::CONTROL) && matches!(key.code, KeyCode::Char('c')) {
        return true;
    }
    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => return true,
        KeyCode::Up | KeyCode::Char('k') => tree.select_prev(),
        KeyCode::Down | KeyCode::Char('j') => tree.select_next(),
        KeyCode::Right | KeyCode::Char('l') | KeyCode::Enter => {
            if let Err(err) = tree.enter_selected() {
                warn!(%err, "could not enter directory");
            }
        }
        KeyCode::Left | KeyCode::Char('h') => tree.go_up(),
        KeyCode::Char('m') => tree.toggle_mark(),
        _ => {}
    }
    false
}
