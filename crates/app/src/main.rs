use std::fmt;
use std::io::Write;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;
use url::Url;

use gateway::Gateways;
use services::session::{SessionDriver, SessionLauncher, SessionView, Surfaces};
use services::{
    BufferEditor, EditorSurface, Notice, NoticeLevel, Notifier, Popup, PreviewPane, SourcePane,
    SourceTable,
};
use tutor_core::model::{CatalogEntry, LessonId, NextLessonTarget, PreviewTable};

const DEFAULT_BASE_URL: &str = "http://127.0.0.1:5000";

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidBaseUrl { raw: String },
    InvalidLesson { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidBaseUrl { raw } => write!(f, "invalid --base-url value: {raw}"),
            ArgsError::InvalidLesson { raw } => write!(f, "invalid --lesson value: {raw}"),
        }
    }
}

impl std::error::Error for ArgsError {}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

struct Args {
    base_url: Url,
    lesson: Option<LessonId>,
    strict_preview: bool,
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p app -- [--base-url <url>] [--lesson <slug>] [--strict-preview]");
    eprintln!();
    eprintln!("Defaults:");
    eprintln!("  --base-url {DEFAULT_BASE_URL}");
    eprintln!("  --lesson   first uncompleted lesson in the catalog");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  SQLTUTOR_BASE_URL, SQLTUTOR_LESSON");
}

impl Args {
    fn parse(args: &mut impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        let mut base_url = std::env::var("SQLTUTOR_BASE_URL")
            .unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        let mut lesson = std::env::var("SQLTUTOR_LESSON")
            .ok()
            .and_then(|value| value.parse::<LessonId>().ok());
        let mut strict_preview = false;

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--base-url" => {
                    base_url = require_value(args, "--base-url")?;
                }
                "--lesson" => {
                    let value = require_value(args, "--lesson")?;
                    let parsed = value
                        .parse::<LessonId>()
                        .map_err(|_| ArgsError::InvalidLesson { raw: value.clone() })?;
                    lesson = Some(parsed);
                }
                "--strict-preview" => strict_preview = true,
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        let base_url =
            Url::parse(&base_url).map_err(|_| ArgsError::InvalidBaseUrl { raw: base_url })?;
        Ok(Self {
            base_url,
            lesson,
            strict_preview,
        })
    }
}

/// Preview pane that renders result tables to stdout.
struct ConsolePane {
    visible: Mutex<bool>,
}

impl ConsolePane {
    fn new() -> Self {
        Self {
            visible: Mutex::new(true),
        }
    }

    fn is_visible(&self) -> bool {
        *self.visible.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl PreviewPane for ConsolePane {
    fn show_results(&self, table: PreviewTable) {
        if self.is_visible() {
            print_table(&table);
        }
    }

    fn set_visible(&self, visible: bool) {
        *self.visible.lock().unwrap_or_else(PoisonError::into_inner) = visible;
    }
}

fn print_table(table: &PreviewTable) {
    if table.columns().is_empty() {
        println!("(empty result)");
        return;
    }
    let mut widths: Vec<usize> = table.columns().iter().map(String::len).collect();
    for row in table.rows() {
        for (index, cell) in row.iter().enumerate() {
            if let Some(width) = widths.get_mut(index) {
                *width = (*width).max(cell.len());
            }
        }
    }

    let header: Vec<String> = table
        .columns()
        .iter()
        .zip(&widths)
        .map(|(name, &width)| format!("{name:<width$}"))
        .collect();
    println!("{}", header.join(" | "));
    let rule: Vec<String> = widths.iter().map(|width| "-".repeat(*width)).collect();
    println!("{}", rule.join("-+-"));
    for row in table.rows() {
        let cells: Vec<String> = row
            .iter()
            .zip(&widths)
            .map(|(cell, &width)| format!("{cell:<width$}"))
            .collect();
        println!("{}", cells.join(" | "));
    }
    println!("({} rows)", table.row_count());
}

/// Prints the lesson's source tables once they load.
struct ConsoleTables;

impl SourcePane for ConsoleTables {
    fn show_tables(&self, tables: Vec<SourceTable>) {
        for table in tables {
            println!("{} (read only)", table.name);
            print_table(&table.contents);
        }
    }
}

/// Notifier that prints notices and popups to stdout.
struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn notify(&self, notice: Notice) {
        match notice.level() {
            NoticeLevel::Success => println!("ok: {}", notice.message()),
            NoticeLevel::Error => println!("error: {}", notice.message()),
        }
    }

    fn popup(&self, popup: Popup) {
        match popup {
            Popup::Answer {
                task,
                description,
                sql,
            } => {
                println!("Task {task} Answer: {description}");
                println!("{sql}");
            }
            Popup::RevealError { message } => println!("{message}"),
        }
    }
}

fn describe_target(target: &NextLessonTarget) -> String {
    match target {
        NextLessonTarget::Lesson(id) => format!("{}: {id}", target.label()),
        _ => target.label().to_owned(),
    }
}

fn print_tasks(view: &SessionView) {
    for task in &view.tasks {
        let cursor = if task.selected { '>' } else { ' ' };
        let done = if task.completed { 'x' } else { ' ' };
        println!("{cursor} [{done}] {}. {}", task.number, task.description);
    }
    println!("{}/{} complete", view.progress.completed, view.progress.total);
}

fn print_menu(view: &SessionView) {
    for item in view.navigation.items() {
        let here = if item.is_current() { '*' } else { ' ' };
        let done = if item.entry().completed() { 'x' } else { ' ' };
        println!(
            "{here} [{done}] {} ({})",
            item.entry().title(),
            item.entry().difficulty()
        );
    }
    if let Some(target) = &view.next_lesson {
        println!("{}", describe_target(target));
    }
}

fn print_help() {
    println!("Plain lines are appended to the query buffer and preview automatically.");
    println!("  :task <n>   switch to task n            (alias :t)");
    println!("  :submit     grade the current buffer    (alias :s)");
    println!("  :answer     reveal the task answer      (alias :a)");
    println!("  :preview    run a preview right now     (alias :p)");
    println!("  :tasks      list the lesson's tasks");
    println!("  :menu       show the lesson menu");
    println!("  :show       print the query buffer");
    println!("  :clear      empty the query buffer");
    println!("  :reset      reseed the task's starter query");
    println!("  :quit       leave the session            (alias :q)");
}

async fn pick_lesson(gateways: &Gateways) -> Result<LessonId, Box<dyn std::error::Error>> {
    let mut catalog = gateways.lessons.list_lessons().await?;
    catalog.sort_by_key(CatalogEntry::order);
    let entry = catalog
        .iter()
        .find(|entry| !entry.completed())
        .or_else(|| catalog.first())
        .ok_or("the lesson catalog is empty")?;
    Ok(entry.id().clone())
}

async fn dispatch(driver: &SessionDriver, editor: &BufferEditor, command: &str) -> bool {
    let mut parts = command.split_whitespace();
    match parts.next() {
        Some("task" | "t") => match parts.next().and_then(|raw| raw.parse::<u32>().ok()) {
            Some(number) => {
                driver.select_task(number).await;
                print_tasks(&driver.view());
            }
            None => println!("usage: :task <number>"),
        },
        Some("submit" | "s") => {
            driver.submit().await;
            if driver.is_terminal() {
                println!("Lesson complete.");
                if let Some(target) = driver.next_lesson() {
                    println!("{}", describe_target(&target));
                }
            }
        }
        Some("answer" | "a") => driver.reveal_answer().await,
        Some("preview" | "p") => driver.preview_now().await,
        Some("tasks") => print_tasks(&driver.view()),
        Some("menu") => print_menu(&driver.view()),
        Some("show") => {
            let text = editor.text();
            print!("{text}");
            if !text.ends_with('\n') {
                println!();
            }
        }
        Some("clear") => editor.set_text(""),
        Some("reset") => driver.reset_editor(),
        Some("help") => print_help(),
        Some("quit" | "q") => return false,
        _ => println!("unknown command: :{command} (:help lists commands)"),
    }
    true
}

async fn repl(
    driver: SessionDriver,
    editor: Arc<BufferEditor>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("sql> ");
        std::io::stdout().flush()?;
        let Some(line) = lines.next_line().await? else {
            break;
        };
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        if let Some(command) = trimmed.strip_prefix(':') {
            if !dispatch(&driver, &editor, command).await {
                break;
            }
            continue;
        }
        let text = editor.text();
        editor.set_text(&format!("{text}{line}\n"));
        driver.content_changed();
    }
    Ok(())
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let mut argv = std::env::args().skip(1);
    let args = Args::parse(&mut argv).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    let gateways = Gateways::http(args.base_url.clone());
    let lesson_id = match args.lesson.clone() {
        Some(id) => id,
        None => pick_lesson(&gateways).await?,
    };

    let editor = Arc::new(BufferEditor::new());
    let surfaces = Surfaces {
        editor: editor.clone(),
        pane: Arc::new(ConsolePane::new()),
        tables: Arc::new(ConsoleTables),
        notifier: Arc::new(ConsoleNotifier),
    };
    let launcher = SessionLauncher::new(gateways, surfaces)
        .with_strict_task_matching(args.strict_preview);
    let driver = launcher.start(&lesson_id).await?;

    let view = driver.view();
    println!("{} - {}", view.title, view.subtitle);
    print_tasks(&view);
    println!("Type SQL lines to build a query, :help for commands.");

    repl(driver, editor).await
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}
