use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use gateway::{GatewayError, Gateways, InMemoryGateway, LessonGateway, QueryGateway};
use services::session::{DEBOUNCE_QUIET_PERIOD, SessionLauncher, Surfaces};
use services::{
    BufferEditor, BufferNotifier, BufferPane, BufferSourcePane, EditorSurface, Notice, SUBMIT_HINT,
};
use tutor_core::fixed_clock;
use tutor_core::model::{
    CatalogEntry, Evaluation, ExerciseTask, Lesson, LessonId, PreviewTable, TableName,
    TableSchema, TaskId,
};

const LESSON: &str = "lesson-1-basic-select";

fn lesson_id() -> LessonId {
    LessonId::new(LESSON)
}

fn users_table() -> TableName {
    TableName::new("users").unwrap()
}

fn build_task(number: u32, initial_query: &str) -> ExerciseTask {
    ExerciseTask::new(
        TaskId::new(format!("1.{number}")),
        number,
        format!("Task {number}"),
        initial_query,
    )
    .unwrap()
}

fn build_lesson(tasks: Vec<ExerciseTask>) -> Lesson {
    Lesson::new(
        lesson_id(),
        "Lesson 1",
        "Basic SELECT",
        tasks,
        vec![users_table()],
    )
    .unwrap()
}

fn seeded_fake(lesson: Lesson) -> InMemoryGateway {
    let fake = InMemoryGateway::new();
    fake.seed_catalog_entry(CatalogEntry::new(
        lesson_id(),
        "Lesson 1",
        "Basic SELECT",
        1,
        false,
        "easy",
    ));
    fake.seed_table(TableSchema::new(
        users_table(),
        vec!["id".into(), "name".into()],
    ));
    fake.seed_lesson(lesson);
    fake
}

struct Harness {
    fake: InMemoryGateway,
    editor: Arc<BufferEditor>,
    pane: Arc<BufferPane>,
    notifier: Arc<BufferNotifier>,
    launcher: SessionLauncher,
}

fn build_harness(fake: InMemoryGateway) -> Harness {
    let editor = Arc::new(BufferEditor::new());
    let pane = Arc::new(BufferPane::new());
    let notifier = Arc::new(BufferNotifier::new());
    let surfaces = Surfaces {
        editor: editor.clone(),
        pane: pane.clone(),
        tables: Arc::new(BufferSourcePane::new()),
        notifier: notifier.clone(),
    };
    let launcher =
        SessionLauncher::new(Gateways::from_fake(fake.clone()), surfaces).with_clock(fixed_clock());
    Harness {
        fake,
        editor,
        pane,
        notifier,
        launcher,
    }
}

#[tokio::test]
async fn preview_renders_the_seeded_table() {
    let lesson = build_lesson(vec![build_task(1, "SELECT 1;")]);
    let fake = seeded_fake(lesson);
    let table = PreviewTable::new(
        vec!["name".into()],
        vec![vec!["Ada".into()], vec!["Grace".into()]],
    );
    fake.seed_preview("SELECT name FROM users;", table.clone());
    let harness = build_harness(fake);
    let driver = harness.launcher.start(&lesson_id()).await.unwrap();

    harness.editor.set_text("SELECT name FROM users;");
    driver.preview_now().await;

    assert_eq!(harness.pane.latest(), Some(table));
    assert!(harness.pane.is_visible());
}

#[tokio::test]
async fn a_rejected_preview_surfaces_the_server_message() {
    let lesson = build_lesson(vec![build_task(1, "SELECT 1;")]);
    let fake = seeded_fake(lesson);
    fake.seed_rejection("SELECT broken;", "syntax error near broken");
    let harness = build_harness(fake);
    let driver = harness.launcher.start(&lesson_id()).await.unwrap();
    let renders_before = harness.pane.render_count();

    harness.editor.set_text("SELECT broken;");
    driver.preview_now().await;

    assert_eq!(
        harness.notifier.last_notice(),
        Some(Notice::error("syntax error near broken"))
    );
    assert_eq!(harness.pane.render_count(), renders_before);
}

#[tokio::test(start_paused = true)]
async fn tasks_that_disallow_previews_never_dispatch_one() {
    let task = build_task(1, "SELECT 1;").with_preview_allowed(false);
    let lesson = build_lesson(vec![task]);
    let harness = build_harness(seeded_fake(lesson));
    let driver = harness.launcher.start(&lesson_id()).await.unwrap();

    assert!(!harness.pane.is_visible());
    assert!(harness.fake.preview_queries().is_empty());

    harness.editor.set_text("SELECT id FROM users;");
    driver.content_changed();
    tokio::time::sleep(DEBOUNCE_QUIET_PERIOD + Duration::from_millis(100)).await;

    assert!(harness.fake.preview_queries().is_empty());
    assert_eq!(harness.pane.render_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn rapid_edits_collapse_into_one_preview() {
    let lesson = build_lesson(vec![build_task(1, "SELECT 1;")]);
    let harness = build_harness(seeded_fake(lesson));
    let driver = harness.launcher.start(&lesson_id()).await.unwrap();
    let baseline = harness.fake.preview_queries().len();

    for text in ["SELECT 1", "SELECT 12", "SELECT 123"] {
        harness.editor.set_text(text);
        driver.content_changed();
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    tokio::time::sleep(DEBOUNCE_QUIET_PERIOD + Duration::from_millis(100)).await;

    let queries = harness.fake.preview_queries();
    assert_eq!(queries.len(), baseline + 1);
    assert_eq!(queries.last().map(String::as_str), Some("SELECT 123"));
}

#[tokio::test(start_paused = true)]
async fn a_task_switch_supersedes_a_pending_debounced_preview() {
    let lesson = build_lesson(vec![build_task(1, "SELECT 1;"), build_task(2, "SELECT 2;")]);
    let harness = build_harness(seeded_fake(lesson));
    let driver = harness.launcher.start(&lesson_id()).await.unwrap();

    harness.editor.set_text("SELECT name FROM users");
    driver.content_changed();
    driver.select_task(2).await;
    tokio::time::sleep(DEBOUNCE_QUIET_PERIOD + Duration::from_millis(100)).await;

    assert_eq!(
        harness.fake.preview_queries(),
        vec![format!("{SUBMIT_HINT}SELECT 1;"), "SELECT 2;".to_owned()]
    );
}

/// Query gateway whose preview stalls on queries containing `SLOW`, echoing
/// every query back as a one-cell table.
struct StallingPreview {
    delay: Duration,
}

fn echo_table(query: &str) -> PreviewTable {
    PreviewTable::new(vec!["query".into()], vec![vec![query.into()]])
}

#[async_trait]
impl QueryGateway for StallingPreview {
    async fn preview(
        &self,
        _lesson: &LessonId,
        _task: &TaskId,
        query: &str,
    ) -> Result<PreviewTable, GatewayError> {
        if query.contains("SLOW") {
            tokio::time::sleep(self.delay).await;
        }
        Ok(echo_table(query))
    }

    async fn evaluate(
        &self,
        _lesson: &LessonId,
        _task: &ExerciseTask,
        _query: &str,
    ) -> Result<Evaluation, GatewayError> {
        Ok(Evaluation::new(false, ""))
    }
}

fn stalling_harness(strict: bool) -> (Harness, Duration) {
    let delay = Duration::from_secs(10);
    let lesson = build_lesson(vec![build_task(1, "SELECT 1;"), build_task(2, "SELECT 2;")]);
    let mut harness = build_harness(seeded_fake(lesson));
    let base = Gateways::from_fake(harness.fake.clone());
    let gateways = Gateways {
        queries: Arc::new(StallingPreview { delay }),
        ..base
    };
    let surfaces = Surfaces {
        editor: harness.editor.clone(),
        pane: harness.pane.clone(),
        tables: Arc::new(BufferSourcePane::new()),
        notifier: harness.notifier.clone(),
    };
    harness.launcher = SessionLauncher::new(gateways, surfaces)
        .with_clock(fixed_clock())
        .with_strict_task_matching(strict);
    (harness, delay)
}

#[tokio::test(start_paused = true)]
async fn arrival_order_rendering_shows_the_slow_response_last() {
    let (harness, delay) = stalling_harness(false);
    let driver = harness.launcher.start(&lesson_id()).await.unwrap();

    harness.editor.set_text("SELECT SLOW");
    driver.content_changed();
    // Let the debounced preview start its long round trip, then switch away.
    tokio::time::sleep(Duration::from_millis(450)).await;
    driver.select_task(2).await;
    assert_eq!(harness.pane.latest(), Some(echo_table("SELECT 2;")));

    tokio::time::sleep(delay + Duration::from_secs(1)).await;

    assert_eq!(harness.pane.latest(), Some(echo_table("SELECT SLOW")));
}

#[tokio::test(start_paused = true)]
async fn strict_matching_discards_the_superseded_response() {
    let (harness, delay) = stalling_harness(true);
    let driver = harness.launcher.start(&lesson_id()).await.unwrap();

    harness.editor.set_text("SELECT SLOW");
    driver.content_changed();
    tokio::time::sleep(Duration::from_millis(450)).await;
    driver.select_task(2).await;

    tokio::time::sleep(delay + Duration::from_secs(1)).await;

    assert_eq!(harness.pane.latest(), Some(echo_table("SELECT 2;")));
}

/// Lesson gateway that counts catalog listings and serves them slowly.
struct SlowCatalog {
    inner: Arc<dyn LessonGateway>,
    delay: Duration,
    listings: Arc<AtomicU64>,
}

#[async_trait]
impl LessonGateway for SlowCatalog {
    async fn list_lessons(&self) -> Result<Vec<CatalogEntry>, GatewayError> {
        self.listings.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        self.inner.list_lessons().await
    }

    async fn get_lesson(&self, id: &LessonId) -> Result<Lesson, GatewayError> {
        self.inner.get_lesson(id).await
    }

    async fn complete_lesson(&self, id: &LessonId) -> Result<(), GatewayError> {
        self.inner.complete_lesson(id).await
    }

    async fn next_lesson(&self, id: &LessonId) -> Result<Option<LessonId>, GatewayError> {
        self.inner.next_lesson(id).await
    }
}

#[tokio::test(start_paused = true)]
async fn overlapping_navigation_refreshes_collapse_to_one_fetch() {
    let lesson = build_lesson(vec![build_task(1, "SELECT 1;")]);
    let fake = seeded_fake(lesson);
    let listings = Arc::new(AtomicU64::new(0));
    let base = Gateways::from_fake(fake);
    let gateways = Gateways {
        lessons: Arc::new(SlowCatalog {
            inner: base.lessons.clone(),
            delay: Duration::from_secs(5),
            listings: listings.clone(),
        }),
        ..base
    };
    let launcher =
        SessionLauncher::new(gateways, Surfaces::buffered()).with_clock(fixed_clock());
    let driver = launcher.start(&lesson_id()).await.unwrap();
    let baseline = listings.load(Ordering::SeqCst);

    let background = tokio::spawn({
        let driver = driver.clone();
        async move { driver.refresh_navigation().await }
    });
    tokio::task::yield_now().await;
    assert_eq!(listings.load(Ordering::SeqCst), baseline + 1);

    // The slow fetch is still in flight; this call must bail out unstarted.
    driver.refresh_navigation().await;
    assert_eq!(listings.load(Ordering::SeqCst), baseline + 1);

    background.await.unwrap();
    driver.refresh_navigation().await;
    assert_eq!(listings.load(Ordering::SeqCst), baseline + 2);
}
