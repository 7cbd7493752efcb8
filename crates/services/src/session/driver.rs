//! The session driver: one object owning task progression, the schema
//! context, live preview, graded submission, answer reveal and the
//! navigation menu for a single lesson.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use gateway::{GatewayError, Gateways};
use tutor_core::Clock;
use tutor_core::completion::{self, Suggestion};
use tutor_core::model::{ExerciseTask, LessonId, NavigationView, NextLessonTarget, SqlContext};

use crate::editor::{BufferEditor, EditorSurface, SUBMIT_HINT};
use crate::error::SessionError;
use crate::notify::{BufferNotifier, Notice, Notifier, Popup};
use crate::pane::{BufferPane, BufferSourcePane, PreviewPane, SourcePane, SourceTable};
use crate::session::context::ContextResolver;
use crate::session::progression::{SelectOutcome, TaskProgression};
use crate::session::view::{LessonProgress, SessionView, TaskItem};

// ─── MESSAGES ──────────────────────────────────────────────────────────────────

/// Quiet period between the last content change and the debounced preview.
pub const DEBOUNCE_QUIET_PERIOD: Duration = Duration::from_millis(400);

/// Notice shown when a submission matches the expected answer.
pub const CORRECT_MESSAGE: &str = "Correct!";

/// Notice shown when a submission does not match and the server gave no
/// explanation. With an explanation the notice reads
/// `Incorrect Answer: {explanation}`.
pub const INCORRECT_MESSAGE: &str = "Incorrect Answer";

/// Popup shown when the attempt timer blocks answer reveal.
pub const TIMER_LOCKED_MESSAGE: &str = "Unable to reveal answers when the timer is active.";

/// Popup shown when no answer is stored for the task.
pub const ANSWER_MISSING_MESSAGE: &str = "Unable to find an answer for this task.";

/// Generic notice for failed server round trips.
pub const NETWORK_MESSAGE: &str = "Unable to reach the server. Please try again.";

// ─── SURFACES ──────────────────────────────────────────────────────────────────

/// The UI surfaces a session drives. Handles are shared so a front-end (or
/// a test) keeps its own view of each surface.
#[derive(Clone)]
pub struct Surfaces {
    pub editor: Arc<dyn EditorSurface>,
    pub pane: Arc<dyn PreviewPane>,
    pub tables: Arc<dyn SourcePane>,
    pub notifier: Arc<dyn Notifier>,
}

impl Surfaces {
    /// Buffer-backed implementations of every surface.
    #[must_use]
    pub fn buffered() -> Self {
        Self {
            editor: Arc::new(BufferEditor::new()),
            pane: Arc::new(BufferPane::new()),
            tables: Arc::new(BufferSourcePane::new()),
            notifier: Arc::new(BufferNotifier::new()),
        }
    }
}

// ─── LAUNCHER ──────────────────────────────────────────────────────────────────

/// Builds running sessions. One launcher can start any number of lessons
/// against the same gateways and surfaces.
#[derive(Clone)]
pub struct SessionLauncher {
    gateways: Gateways,
    surfaces: Surfaces,
    clock: Clock,
    strict_task_matching: bool,
}

impl SessionLauncher {
    #[must_use]
    pub fn new(gateways: Gateways, surfaces: Surfaces) -> Self {
        Self {
            gateways,
            surfaces,
            clock: Clock::default(),
            strict_task_matching: false,
        }
    }

    #[must_use]
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Discard preview responses that arrive for a task that is no longer
    /// selected. The default renders responses in arrival order, which can
    /// briefly show a stale result after a rapid task switch.
    #[must_use]
    pub fn with_strict_task_matching(mut self, strict: bool) -> Self {
        self.strict_task_matching = strict;
        self
    }

    /// Fetch the lesson and drive every surface into its opening state.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError`] when the lesson cannot be fetched or fails
    /// validation. Once a driver exists, later failures surface as notices
    /// instead of errors.
    pub async fn start(&self, lesson_id: &LessonId) -> Result<SessionDriver, SessionError> {
        let lesson = self.gateways.lessons.get_lesson(lesson_id).await?;
        info!("Starting session for lesson {}", lesson.id());

        let progression = TaskProgression::new(lesson);
        let driver = SessionDriver {
            shared: Arc::new(SessionShared {
                resolver: ContextResolver::new(self.gateways.schema.clone()),
                gateways: self.gateways.clone(),
                editor: self.surfaces.editor.clone(),
                pane: self.surfaces.pane.clone(),
                tables: self.surfaces.tables.clone(),
                notifier: self.surfaces.notifier.clone(),
                clock: self.clock,
                strict_task_matching: self.strict_task_matching,
                preview_generation: AtomicU64::new(0),
                nav_refreshing: AtomicBool::new(false),
                state: Mutex::new(SessionState {
                    progression,
                    context: SqlContext::default(),
                    navigation: NavigationView::default(),
                    next_lesson: None,
                    completed_at: None,
                }),
            }),
        };
        driver.render_initial().await;
        Ok(driver)
    }
}

// ─── DRIVER ────────────────────────────────────────────────────────────────────

struct SessionState {
    progression: TaskProgression,
    context: SqlContext,
    navigation: NavigationView,
    next_lesson: Option<NextLessonTarget>,
    completed_at: Option<DateTime<Utc>>,
}

struct SessionShared {
    gateways: Gateways,
    resolver: ContextResolver,
    editor: Arc<dyn EditorSurface>,
    pane: Arc<dyn PreviewPane>,
    tables: Arc<dyn SourcePane>,
    notifier: Arc<dyn Notifier>,
    clock: Clock,
    strict_task_matching: bool,
    preview_generation: AtomicU64,
    nav_refreshing: AtomicBool,
    state: Mutex<SessionState>,
}

/// A running lesson session. Cheap to clone; clones share all state.
#[derive(Clone)]
pub struct SessionDriver {
    shared: Arc<SessionShared>,
}

impl SessionDriver {
    fn state(&self) -> MutexGuard<'_, SessionState> {
        self.shared
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn selected_task_snapshot(&self) -> Option<ExerciseTask> {
        self.state().progression.selected_task().cloned()
    }

    #[must_use]
    pub fn lesson_id(&self) -> LessonId {
        self.state().progression.lesson().id().clone()
    }

    #[must_use]
    pub fn selected_task_number(&self) -> Option<u32> {
        self.state().progression.cursor()
    }

    #[must_use]
    pub fn is_terminal(&self) -> bool {
        self.state().progression.is_terminal()
    }

    /// When the last task was completed, if the lesson finished during this
    /// session.
    #[must_use]
    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.state().completed_at
    }

    /// Where the next-lesson affordance points, once resolved.
    #[must_use]
    pub fn next_lesson(&self) -> Option<NextLessonTarget> {
        self.state().next_lesson.clone()
    }

    /// The schema context currently driving completions.
    #[must_use]
    pub fn context(&self) -> SqlContext {
        self.state().context.clone()
    }

    /// Completion suggestions for a cursor position, resolved purely over
    /// the cached schema context.
    #[must_use]
    pub fn completions(&self, line: &str, cursor: usize) -> Vec<Suggestion> {
        let state = self.state();
        completion::resolve_at(&state.context, line, cursor)
    }

    /// One consistent snapshot of everything a front-end renders.
    #[must_use]
    pub fn view(&self) -> SessionView {
        let state = self.state();
        let lesson = state.progression.lesson();
        let cursor = state.progression.cursor();
        let tasks = lesson
            .tasks()
            .iter()
            .map(|task| TaskItem {
                number: task.number(),
                description: task.description().to_owned(),
                completed: task.is_completed(),
                selected: cursor == Some(task.number()),
            })
            .collect();
        SessionView {
            lesson_id: lesson.id().clone(),
            title: lesson.title().to_owned(),
            subtitle: lesson.subtitle().to_owned(),
            tasks,
            progress: LessonProgress {
                total: lesson.tasks().len(),
                completed: lesson.completed_count(),
                is_terminal: cursor.is_none(),
            },
            navigation: state.navigation.clone(),
            next_lesson: state.next_lesson.clone(),
        }
    }

    // ─── SELECTION ─────────────────────────────────────────────────────────────

    /// Opening render: seed the editor with the banner and the starter
    /// query, build the context, fire the first preview, show the lesson's
    /// source tables and fill the navigation menu. A lesson that is already
    /// finished renders read-only and resolves the next-lesson affordance
    /// right away.
    async fn render_initial(&self) {
        match self.selected_task_snapshot() {
            Some(task) => {
                self.shared.editor.set_read_only(false);
                self.shared
                    .editor
                    .set_text(&format!("{SUBMIT_HINT}{}", task.initial_query()));
                self.refresh_context(&task).await;
                self.shared.editor.set_large_layout(task.large_query());
                self.shared.pane.set_visible(task.preview_allowed());
                self.preview_now().await;
                self.render_source_tables().await;
                self.refresh_navigation().await;
            }
            None => {
                let first = { self.state().progression.lesson().task(1).cloned() };
                if let Some(task) = first {
                    self.shared
                        .editor
                        .set_text(&format!("{SUBMIT_HINT}{}", task.initial_query()));
                }
                self.shared.editor.set_read_only(true);
                self.render_source_tables().await;
                self.refresh_navigation().await;
                self.resolve_next_lesson().await;
            }
        }
    }

    /// Fetch and render the lesson's default tables read-only. A table that
    /// fails to load is skipped and the rest still render.
    async fn render_source_tables(&self) {
        let names = { self.state().progression.lesson().tables().to_vec() };
        let mut tables = Vec::with_capacity(names.len());
        for name in names {
            match self.shared.gateways.schema.get_table_rows(&name).await {
                Ok(contents) => tables.push(SourceTable { name, contents }),
                Err(err) => warn!("Source table {name} failed to load: {err}"),
            }
        }
        self.shared.tables.show_tables(tables);
    }

    /// Switch the selection to task `number`. Selecting a completed or
    /// unknown task leaves everything untouched.
    pub async fn select_task(&self, number: u32) {
        let outcome = self.state().progression.select(number);
        match outcome {
            SelectOutcome::Selected => {
                debug!("Selected task {number}");
                self.apply_selection().await;
            }
            SelectOutcome::AlreadyCompleted => {
                debug!("Ignoring select of completed task {number}");
            }
            SelectOutcome::UnknownTask => {
                debug!("Ignoring select of unknown task {number}");
            }
        }
    }

    /// Drive the surfaces to the freshly selected task: raw starter query,
    /// new schema context, layout, one immediate preview pass, a navigation
    /// refresh, then pane visibility.
    async fn apply_selection(&self) {
        let Some(task) = self.selected_task_snapshot() else {
            return;
        };
        self.shared.editor.set_text(task.initial_query());
        self.refresh_context(&task).await;
        self.shared.editor.set_large_layout(task.large_query());
        self.preview_now().await;
        self.refresh_navigation().await;
        self.shared.pane.set_visible(task.preview_allowed());
    }

    /// Reseed the editor with the selected task's starter query.
    pub fn reset_editor(&self) {
        let initial = self
            .state()
            .progression
            .selected_task()
            .map(|task| task.initial_query().to_owned());
        if let Some(initial) = initial {
            self.shared.editor.set_text(&initial);
        }
    }

    // ─── CONTEXT ───────────────────────────────────────────────────────────────

    /// Rebuild the schema context for `task`. The fresh context is
    /// installed only if the task is still selected when the fetches
    /// finish; a failed fetch installs an empty context instead of a
    /// partial one.
    async fn refresh_context(&self, task: &ExerciseTask) {
        let names = {
            let state = self.state();
            ContextResolver::effective_tables(state.progression.lesson(), task)
        };
        let number = task.number();
        let outcome = self.shared.resolver.resolve(&names).await;

        let failure = {
            let mut state = self.state();
            if state.progression.cursor() != Some(number) {
                debug!("Discarding schema context for superseded task {number}");
                return;
            }
            match outcome {
                Ok(context) => {
                    state.context = context;
                    None
                }
                Err(err) => {
                    state.context = SqlContext::default();
                    Some(err)
                }
            }
        };
        if let Some(err) = failure {
            warn!("Schema metadata fetch failed: {err}");
            self.shared.notifier.notify(Notice::error(NETWORK_MESSAGE));
        }
    }

    // ─── PREVIEW ───────────────────────────────────────────────────────────────

    /// Note a content change in the editor. Schedules a preview after the
    /// quiet period; every further change reschedules, so only the last
    /// change in a burst fires.
    pub fn content_changed(&self) {
        let generation = self
            .shared
            .preview_generation
            .fetch_add(1, Ordering::SeqCst)
            + 1;
        let driver = self.clone();
        tokio::spawn(async move {
            tokio::time::sleep(DEBOUNCE_QUIET_PERIOD).await;
            if driver
                .shared
                .preview_generation
                .load(Ordering::SeqCst)
                != generation
            {
                return;
            }
            driver.preview_now().await;
        });
    }

    /// Run one preview pass immediately with the current editor text.
    ///
    /// Skipped silently when no task is selected, the task does not allow
    /// previews, or the text is blank after trimming.
    pub async fn preview_now(&self) {
        // An immediate pass supersedes any pending debounced one.
        self.shared
            .preview_generation
            .fetch_add(1, Ordering::SeqCst);

        let snapshot = {
            let state = self.state();
            state.progression.selected_task().map(|task| {
                (
                    state.progression.lesson().id().clone(),
                    task.id().clone(),
                    task.number(),
                    task.preview_allowed(),
                )
            })
        };
        let Some((lesson_id, task_id, number, allowed)) = snapshot else {
            debug!("Skipping preview: no task selected");
            return;
        };
        if !allowed {
            debug!("Skipping preview: task {number} does not allow it");
            return;
        }
        let sql = self.shared.editor.text();
        if sql.trim().is_empty() {
            return;
        }

        let outcome = self
            .shared
            .gateways
            .queries
            .preview(&lesson_id, &task_id, &sql)
            .await;
        match outcome {
            Ok(table) => {
                if self.shared.strict_task_matching && self.selected_task_number() != Some(number)
                {
                    debug!("Discarding preview response for superseded task {number}");
                    return;
                }
                self.shared.pane.show_results(table);
            }
            Err(GatewayError::Rejected(message)) => {
                self.shared.notifier.notify(Notice::error(message));
            }
            Err(err) => {
                warn!("Preview request failed: {err}");
                self.shared.notifier.notify(Notice::error(NETWORK_MESSAGE));
            }
        }
    }

    // ─── SUBMISSION ────────────────────────────────────────────────────────────

    /// Submit the editor content for grading.
    ///
    /// No-ops silently when no task is selected, the task is already
    /// complete, or the text is blank. A match completes the task and
    /// advances the cursor; finishing the last task completes the lesson.
    pub async fn submit(&self) {
        let Some(task) = self.selected_task_snapshot() else {
            debug!("Skipping submit: no task selected");
            return;
        };
        if task.is_completed() {
            return;
        }
        let sql = self.shared.editor.text();
        if sql.trim().is_empty() {
            return;
        }
        let lesson_id = self.lesson_id();

        let evaluation = match self
            .shared
            .gateways
            .queries
            .evaluate(&lesson_id, &task, &sql)
            .await
        {
            Ok(evaluation) => evaluation,
            Err(err) => {
                warn!("Evaluation request failed: {err}");
                self.shared.notifier.notify(Notice::error(NETWORK_MESSAGE));
                return;
            }
        };

        if !evaluation.matched() {
            let message = match evaluation.explanation() {
                Some(explanation) => format!("{INCORRECT_MESSAGE}: {explanation}"),
                None => INCORRECT_MESSAGE.to_owned(),
            };
            self.shared.notifier.notify(Notice::error(message));
            return;
        }

        let next = {
            let mut state = self.state();
            if state.progression.complete(task.number()).is_err() {
                return;
            }
            state.progression.advance(task.number())
        };
        info!("Task {} completed", task.number());
        self.refresh_navigation().await;
        self.shared.notifier.notify(Notice::success(CORRECT_MESSAGE));

        match next {
            Some(_) => self.apply_selection().await,
            None => self.finish_lesson(&lesson_id).await,
        }
    }

    /// Terminal housekeeping: stamp the finish time, report completion to
    /// the server and resolve the next-lesson affordance. A failed
    /// completion call leaves the affordance unresolved.
    async fn finish_lesson(&self, lesson_id: &LessonId) {
        let now = self.shared.clock.now();
        self.state().completed_at = Some(now);
        info!("Lesson {lesson_id} finished");

        if let Err(err) = self.shared.gateways.lessons.complete_lesson(lesson_id).await {
            warn!("Lesson completion call failed: {err}");
            self.shared.notifier.notify(Notice::error(NETWORK_MESSAGE));
            return;
        }
        self.resolve_next_lesson().await;
    }

    /// Decide where the next-lesson affordance points: home when the whole
    /// catalog is complete, the reported next lesson when there is one, the
    /// lesson list otherwise.
    async fn resolve_next_lesson(&self) {
        let lesson_id = self.lesson_id();
        let reported = match self.shared.gateways.lessons.next_lesson(&lesson_id).await {
            Ok(reported) => reported,
            Err(err) => {
                warn!("Next-lesson lookup failed: {err}");
                self.shared.notifier.notify(Notice::error(NETWORK_MESSAGE));
                return;
            }
        };
        let catalog = match self.shared.gateways.lessons.list_lessons().await {
            Ok(catalog) => catalog,
            Err(err) => {
                warn!("Catalog fetch failed: {err}");
                self.shared.notifier.notify(Notice::error(NETWORK_MESSAGE));
                return;
            }
        };
        let target = NextLessonTarget::resolve(&catalog, reported);
        info!("Next-lesson affordance resolved: {}", target.label());
        self.state().next_lesson = Some(target);
        self.refresh_navigation().await;
    }

    // ─── REVEAL ────────────────────────────────────────────────────────────────

    /// Ask the server for the selected task's answer and show it in a
    /// popup. The timer lock and a missing answer get their own popup
    /// variants; plain connectivity failures fall back to a notice.
    pub async fn reveal_answer(&self) {
        let Some(task) = self.selected_task_snapshot() else {
            debug!("Skipping reveal: no task selected");
            return;
        };
        let lesson_id = self.lesson_id();

        let outcome = self
            .shared
            .gateways
            .answers
            .reveal_answer(&lesson_id, task.id())
            .await;
        match outcome {
            Ok(answer) => self.shared.notifier.popup(Popup::Answer {
                task: task.id().clone(),
                description: task.description().to_owned(),
                sql: answer,
            }),
            Err(GatewayError::PermissionDenied) => self.shared.notifier.popup(Popup::RevealError {
                message: TIMER_LOCKED_MESSAGE.to_owned(),
            }),
            Err(GatewayError::NotFound) => self.shared.notifier.popup(Popup::RevealError {
                message: ANSWER_MISSING_MESSAGE.to_owned(),
            }),
            Err(err) => {
                warn!("Answer reveal failed: {err}");
                self.shared.notifier.notify(Notice::error(NETWORK_MESSAGE));
            }
        }
    }

    // ─── NAVIGATION ────────────────────────────────────────────────────────────

    /// Rebuild the navigation menu from the catalog listing. Guarded
    /// against reentrant execution: an overlapping call returns at once and
    /// the running one finishes alone.
    pub async fn refresh_navigation(&self) {
        if self.shared.nav_refreshing.swap(true, Ordering::SeqCst) {
            debug!("Navigation refresh already running, skipping");
            return;
        }
        let _reset = NavGuard(&self.shared.nav_refreshing);

        match self.shared.gateways.lessons.list_lessons().await {
            Ok(entries) => {
                let mut state = self.state();
                let current = state.progression.lesson().id().clone();
                state.navigation = NavigationView::build(entries, &current);
            }
            Err(err) => warn!("Navigation refresh failed: {err}"),
        }
    }
}

/// Clears the navigation busy flag even if the refresh future is dropped.
struct NavGuard<'a>(&'a AtomicBool);

impl Drop for NavGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}
