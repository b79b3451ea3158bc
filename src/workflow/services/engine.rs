//! Workflow engine orchestrating status changes and phase side effects.

use super::{
    ConfigResolverError, DEFAULT_EVENT_PUBLISH_TIMEOUT, TaskLockRegistry, WorkflowConfigResolver,
    WorkflowEventEmitter,
};
use crate::workflow::{
    domain::{
        HumanReviewDecision, InvalidTransition, IterationTracker, ProjectId, ReviewCorrelationId,
        ReviewFeedback, ReviewVerdict, Task, TaskId, TaskStatus, UserId, WorkflowConfig,
        WorkflowConfigPatch, WorkflowEvent,
    },
    ports::{
        EventBus, ReviewRequest, ReviewSubmitter, ReviewerError, SubtaskCreationError,
        SubtaskCreator, TaskRepository, TaskRepositoryError, WorkflowConfigRepository,
    },
};
use minijinja::{Environment, context};
use mockable::Clock;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, error, info, warn};

/// Prompt used when a project has no custom review template.
pub const DEFAULT_REVIEW_PROMPT: &str = "Review the work done for task \"{{ title }}\" ({{ task_id }}).\n\
{% if description %}Task description:\n{{ description }}\n{% endif %}\
This is review attempt {{ attempt }} of at most {{ max_iterations }}.\n\
Answer with Pass, Fail with a list of concrete issues, or NeedsIntervention \
when a human has to decide.";

/// Engine-level settings that are not stored per project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkflowEngineSettings {
    /// `minijinja` template used when a project has no custom prompt.
    pub default_review_prompt: String,
    /// Upper bound on delivering one event to the bus.
    pub event_publish_timeout: Duration,
}

impl Default for WorkflowEngineSettings {
    fn default() -> Self {
        Self {
            default_review_prompt: DEFAULT_REVIEW_PROMPT.to_owned(),
            event_publish_timeout: DEFAULT_EVENT_PUBLISH_TIMEOUT,
        }
    }
}

/// Errors returned by workflow engine operations.
#[derive(Debug, Error)]
pub enum WorkflowError {
    /// The requested status change is not permitted.
    #[error(transparent)]
    InvalidTransition(#[from] InvalidTransition),
    /// The task does not exist.
    #[error("task not found: {0}")]
    TaskNotFound(TaskId),
    /// Configuration could not be resolved or updated.
    #[error(transparent)]
    Config(#[from] ConfigResolverError),
    /// Task storage failed, including concurrent modification.
    #[error(transparent)]
    Storage(#[from] TaskRepositoryError),
    /// The reviewer could not accept the review.
    #[error("reviewer unavailable: {0}")]
    ReviewerUnavailable(#[from] ReviewerError),
    /// A follow-up subtask could not be created.
    #[error("subtask creation failed: {0}")]
    SubtaskCreationFailed(#[from] SubtaskCreationError),
    /// The review prompt template failed to render.
    #[error("review prompt could not be rendered: {0}")]
    PromptRendering(String),
    /// Human review rejections need a reason.
    #[error("a rejection reason is required")]
    EmptyRejectionReason,
}

impl WorkflowError {
    /// Returns `true` when retrying the whole operation from a fresh read
    /// may succeed.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        match self {
            Self::Storage(TaskRepositoryError::DuplicateTask(_) | TaskRepositoryError::NotFound(_)) => {
                false
            }
            Self::Storage(_)
            | Self::Config(ConfigResolverError::Storage(_))
            | Self::ReviewerUnavailable(_)
            | Self::SubtaskCreationFailed(_) => true,
            Self::InvalidTransition(_)
            | Self::TaskNotFound(_)
            | Self::Config(ConfigResolverError::Validation(_))
            | Self::PromptRendering(_)
            | Self::EmptyRejectionReason => false,
        }
    }
}

/// Result type for workflow engine operations.
pub type WorkflowResult<T> = Result<T, WorkflowError>;

/// Review workflow state machine.
///
/// Every mutating operation holds the task's lock across
/// load, validate, apply and persist, and saves with the version it read.
pub struct WorkflowEngine<T, G, R, S, B, C>
where
    T: TaskRepository,
    G: WorkflowConfigRepository,
    R: ReviewSubmitter,
    S: SubtaskCreator,
    B: EventBus + 'static,
    C: Clock + Send + Sync,
{
    tasks: Arc<T>,
    configs: WorkflowConfigResolver<G>,
    reviewer: Arc<R>,
    subtasks: Arc<S>,
    events: WorkflowEventEmitter<B>,
    clock: Arc<C>,
    locks: TaskLockRegistry,
    settings: WorkflowEngineSettings,
}

impl<T, G, R, S, B, C> Clone for WorkflowEngine<T, G, R, S, B, C>
where
    T: TaskRepository,
    G: WorkflowConfigRepository,
    R: ReviewSubmitter,
    S: SubtaskCreator,
    B: EventBus + 'static,
    C: Clock + Send + Sync,
{
    fn clone(&self) -> Self {
        Self {
            tasks: Arc::clone(&self.tasks),
            configs: self.configs.clone(),
            reviewer: Arc::clone(&self.reviewer),
            subtasks: Arc::clone(&self.subtasks),
            events: self.events.clone(),
            clock: Arc::clone(&self.clock),
            locks: self.locks.clone(),
            settings: self.settings.clone(),
        }
    }
}

impl<T, G, R, S, B, C> WorkflowEngine<T, G, R, S, B, C>
where
    T: TaskRepository,
    G: WorkflowConfigRepository,
    R: ReviewSubmitter,
    S: SubtaskCreator,
    B: EventBus + 'static,
    C: Clock + Send + Sync,
{
    /// Creates an engine with default settings.
    #[must_use]
    pub fn new(
        tasks: Arc<T>,
        configs: WorkflowConfigResolver<G>,
        reviewer: Arc<R>,
        subtasks: Arc<S>,
        bus: Arc<B>,
        clock: Arc<C>,
    ) -> Self {
        Self {
            tasks,
            configs,
            reviewer,
            subtasks,
            events: WorkflowEventEmitter::new(bus),
            clock,
            locks: TaskLockRegistry::new(),
            settings: WorkflowEngineSettings::default(),
        }
    }

    /// Replaces the engine settings.
    #[must_use]
    pub fn with_settings(mut self, settings: WorkflowEngineSettings) -> Self {
        self.events = self.events.with_publish_timeout(settings.event_publish_timeout);
        self.settings = settings;
        self
    }

    /// Waits until every event emitted so far has reached the bus or timed
    /// out.
    pub async fn flush_events(&self) {
        self.events.flush().await;
    }

    /// Returns the configuration resolver.
    #[must_use]
    pub const fn config_resolver(&self) -> &WorkflowConfigResolver<G> {
        &self.configs
    }

    /// Returns the per-task lock registry.
    #[must_use]
    pub const fn locks(&self) -> &TaskLockRegistry {
        &self.locks
    }

    /// Stores a new task in [`TaskStatus::Todo`].
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::Storage`] when the repository rejects it.
    pub async fn create_task(
        &self,
        project_id: ProjectId,
        title: impl Into<String> + Send,
        description: Option<String>,
    ) -> WorkflowResult<Task> {
        let task = Task::new(project_id, title, description, &*self.clock);
        self.tasks.insert_task(&task).await?;
        info!(task_id = %task.id(), %project_id, "task created");
        Ok(task)
    }

    /// Returns a task by identifier.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::TaskNotFound`] or a storage error.
    pub async fn get_task(&self, task_id: TaskId) -> WorkflowResult<Task> {
        self.tasks
            .find_by_id(task_id)
            .await?
            .ok_or(WorkflowError::TaskNotFound(task_id))
    }

    /// Returns the effective configuration for a project.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::Config`] when the store fails.
    pub async fn get_effective_config(&self, project_id: ProjectId) -> WorkflowResult<WorkflowConfig> {
        Ok(self.configs.resolve(project_id).await?)
    }

    /// Applies a partial configuration update.
    ///
    /// Requests already past configuration resolution keep the values they
    /// read.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::Config`] when validation or storage fails.
    pub async fn update_config(
        &self,
        project_id: ProjectId,
        patch: &WorkflowConfigPatch,
    ) -> WorkflowResult<WorkflowConfig> {
        Ok(self.configs.validate_and_store(project_id, patch).await?)
    }

    /// Moves a task to `target` on behalf of `actor`.
    ///
    /// Entering automated review with `auto_start_review` set submits the
    /// review; if submission fails the task is restored and the error
    /// returned.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::InvalidTransition`] when the edge is not
    /// permitted, or the storage, reviewer and rendering errors of the
    /// steps involved.
    pub async fn request_transition(
        &self,
        task_id: TaskId,
        target: TaskStatus,
        actor: UserId,
    ) -> WorkflowResult<Task> {
        let _lock = self.locks.acquire(task_id).await;
        let mut task = self.get_task(task_id).await?;
        let config = self.configs.resolve(task.project_id()).await?;
        let original = task.clone();

        if let Err(rejection) = task.transition_to(target, &config, &*self.clock) {
            return Err(self.reject(&original, rejection, Some(actor)));
        }

        let saved = self.tasks.save_task(&task, original.version()).await?;
        self.enter_phase(&original, saved, &config, Some(actor)).await
    }

    /// Finishes the Testing phase and moves the task to automated review.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::InvalidTransition`] unless the task is in
    /// Testing, plus the errors of [`Self::request_transition`].
    pub async fn complete_testing(&self, task_id: TaskId) -> WorkflowResult<Task> {
        let _lock = self.locks.acquire(task_id).await;
        let mut task = self.get_task(task_id).await?;
        let config = self.configs.resolve(task.project_id()).await?;
        let original = task.clone();

        let outcome = task
            .ensure_status(TaskStatus::Testing, TaskStatus::InReview, &config)
            .and_then(|()| task.transition_to(TaskStatus::InReview, &config, &*self.clock));
        if let Err(rejection) = outcome {
            return Err(self.reject(&original, rejection, None));
        }

        let saved = self.tasks.save_task(&task, original.version()).await?;
        self.enter_phase(&original, saved, &config, None).await
    }

    /// Submits an automated review for a task already in review.
    ///
    /// Returns as soon as the reviewer accepts the request; the verdict
    /// arrives through [`Self::submit_review_verdict`].
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::InvalidTransition`] unless the task is in
    /// review, [`WorkflowError::PromptRendering`] when the template fails,
    /// and [`WorkflowError::ReviewerUnavailable`] on rejection or timeout.
    pub async fn start_review(&self, task_id: TaskId) -> WorkflowResult<ReviewCorrelationId> {
        let _lock = self.locks.acquire(task_id).await;
        let task = self.get_task(task_id).await?;
        let config = self.configs.resolve(task.project_id()).await?;

        if let Err(rejection) = task.ensure_status(TaskStatus::InReview, TaskStatus::InReview, &config) {
            return Err(self.reject(&task, rejection, None));
        }

        let correlation_id = self.submit_review(&task, &config).await?;
        self.events
            .emit(&WorkflowEvent::ReviewRequested {
                task_id,
                project_id: task.project_id(),
                correlation_id,
            });
        Ok(correlation_id)
    }

    /// Applies an automated review verdict.
    ///
    /// Verdicts for cancelled tasks are discarded and the task returned
    /// unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::InvalidTransition`] when the task is not in
    /// review, [`WorkflowError::SubtaskCreationFailed`] when follow-up
    /// subtasks cannot be created, or storage errors. On any failure the
    /// task is left untouched and subtasks created for this verdict are
    /// discarded.
    pub async fn submit_review_verdict(
        &self,
        task_id: TaskId,
        verdict: ReviewVerdict,
    ) -> WorkflowResult<Task> {
        let _lock = self.locks.acquire(task_id).await;
        let mut task = self.get_task(task_id).await?;

        if task.status() == TaskStatus::Cancelled {
            info!(%task_id, verdict = verdict.label(), "discarding review verdict for cancelled task");
            return Ok(task);
        }

        let config = self.configs.resolve(task.project_id()).await?;
        let original = task.clone();
        let target = match &verdict {
            ReviewVerdict::Pass => pass_target(&config),
            ReviewVerdict::Fail { .. } => TaskStatus::InProgress,
            ReviewVerdict::NeedsIntervention => TaskStatus::InReview,
        };

        if let Err(rejection) = task.ensure_status(TaskStatus::InReview, target, &config) {
            return Err(self.reject(&original, rejection, None));
        }

        let created = match self.apply_verdict(&mut task, &verdict, &config).await {
            Ok(created) => created,
            Err(WorkflowError::InvalidTransition(rejection)) => {
                return Err(self.reject(&original, rejection, None));
            }
            Err(err) => return Err(err),
        };

        match self.tasks.save_task(&task, original.version()).await {
            Ok(saved) => {
                self.announce_verdict(&original, &saved, verdict);
                Ok(saved)
            }
            Err(err) => {
                self.discard_subtasks(task_id, &created).await;
                Err(err.into())
            }
        }
    }

    /// Approves a task in human review, finishing it.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::InvalidTransition`] unless the task is in
    /// human review, or storage errors.
    pub async fn approve_human_review(&self, task_id: TaskId, actor: UserId) -> WorkflowResult<Task> {
        let _lock = self.locks.acquire(task_id).await;
        let mut task = self.get_task(task_id).await?;
        let config = self.configs.resolve(task.project_id()).await?;
        let original = task.clone();

        let outcome = task
            .ensure_status(TaskStatus::HumanReview, TaskStatus::Done, &config)
            .and_then(|()| task.transition_to(TaskStatus::Done, &config, &*self.clock));
        if let Err(rejection) = outcome {
            return Err(self.reject(&original, rejection, Some(actor)));
        }
        let decision = HumanReviewDecision::Approved {
            by: actor,
            at: self.clock.utc(),
        };
        task.record_human_review(decision, &*self.clock);

        let saved = self.tasks.save_task(&task, original.version()).await?;
        info!(%task_id, %actor, "task approved in human review");
        self.emit_status_changed(&original, &saved, Some(actor));
        self.events
            .emit(&WorkflowEvent::HumanReviewApproved {
                task_id,
                project_id: saved.project_id(),
                actor,
            });
        Ok(saved)
    }

    /// Sends a task in human review back to work with a reason.
    ///
    /// The review iteration count is left as it was.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::EmptyRejectionReason`] for a blank reason,
    /// [`WorkflowError::InvalidTransition`] unless the task is in human
    /// review, or storage errors.
    pub async fn reject_human_review(
        &self,
        task_id: TaskId,
        actor: UserId,
        reason: &str,
    ) -> WorkflowResult<Task> {
        let reason = reason.trim();
        if reason.is_empty() {
            return Err(WorkflowError::EmptyRejectionReason);
        }

        let _lock = self.locks.acquire(task_id).await;
        let mut task = self.get_task(task_id).await?;
        let config = self.configs.resolve(task.project_id()).await?;
        let original = task.clone();

        let outcome = task
            .ensure_status(TaskStatus::HumanReview, TaskStatus::InProgress, &config)
            .and_then(|()| task.transition_to(TaskStatus::InProgress, &config, &*self.clock));
        if let Err(rejection) = outcome {
            return Err(self.reject(&original, rejection, Some(actor)));
        }
        let decision = HumanReviewDecision::Rejected {
            by: actor,
            at: self.clock.utc(),
            reason: reason.to_owned(),
        };
        task.record_human_review(decision, &*self.clock);

        let saved = self.tasks.save_task(&task, original.version()).await?;
        info!(%task_id, %actor, reason, "task rejected in human review");
        self.emit_status_changed(&original, &saved, Some(actor));
        self.events
            .emit(&WorkflowEvent::HumanReviewRejected {
                task_id,
                project_id: saved.project_id(),
                actor,
                reason: reason.to_owned(),
            });
        Ok(saved)
    }

    /// Runs entry effects for the status `saved` has just been committed in.
    async fn enter_phase(
        &self,
        original: &Task,
        saved: Task,
        config: &WorkflowConfig,
        actor: Option<UserId>,
    ) -> WorkflowResult<Task> {
        let review = if saved.status() == TaskStatus::InReview && config.auto_start_review {
            match self.submit_review(&saved, config).await {
                Ok(correlation_id) => Some(correlation_id),
                Err(err) => {
                    self.restore(original, &saved).await;
                    return Err(err);
                }
            }
        } else {
            None
        };

        self.emit_status_changed(original, &saved, actor);
        if let Some(correlation_id) = review {
            self.events
                .emit(&WorkflowEvent::ReviewRequested {
                    task_id: saved.id(),
                    project_id: saved.project_id(),
                    correlation_id,
                });
        }
        Ok(saved)
    }

    /// Writes `original` back over `saved` after a failed entry effect.
    async fn restore(&self, original: &Task, saved: &Task) {
        match self.tasks.save_task(original, saved.version()).await {
            Ok(_) => warn!(
                task_id = %original.id(),
                status = %original.status(),
                "restored task after failed review submission"
            ),
            Err(err) => error!(
                task_id = %original.id(),
                error = %err,
                "failed to restore task after failed review submission"
            ),
        }
    }

    async fn submit_review(
        &self,
        task: &Task,
        config: &WorkflowConfig,
    ) -> WorkflowResult<ReviewCorrelationId> {
        let prompt = self.render_prompt(task, config)?;
        let request = ReviewRequest {
            task_id: task.id(),
            project_id: task.project_id(),
            prompt,
        };
        let timeout = self.reviewer.submission_timeout();
        let correlation_id = tokio::time::timeout(timeout, self.reviewer.submit(request))
            .await
            .map_err(|_| ReviewerError::TimedOut(timeout))??;
        info!(task_id = %task.id(), %correlation_id, "automated review submitted");
        Ok(correlation_id)
    }

    fn render_prompt(&self, task: &Task, config: &WorkflowConfig) -> WorkflowResult<String> {
        let template = config
            .review_prompt_template
            .as_deref()
            .unwrap_or(self.settings.default_review_prompt.as_str());
        let environment = Environment::new();
        environment
            .render_str(
                template,
                context! {
                    task_id => task.id().to_string(),
                    project_id => task.project_id().to_string(),
                    title => task.title(),
                    description => task.description(),
                    attempt => task.review_iterations().saturating_add(1),
                    review_iterations => task.review_iterations(),
                    max_iterations => config.max_review_iterations,
                },
            )
            .map_err(|err| WorkflowError::PromptRendering(err.to_string()))
    }

    /// Mutates `task` according to `verdict` and returns the follow-up
    /// subtasks it created. The task itself is not persisted here.
    async fn apply_verdict(
        &self,
        task: &mut Task,
        verdict: &ReviewVerdict,
        config: &WorkflowConfig,
    ) -> WorkflowResult<Vec<TaskId>> {
        let mut forced_intervention = false;
        let mut created = Vec::new();
        match verdict {
            ReviewVerdict::Pass => {
                task.transition_to(pass_target(config), config, &*self.clock)?;
            }
            ReviewVerdict::Fail { issues } => {
                let iterations = task.register_failed_review();
                if IterationTracker::exceeded(iterations, config.max_review_iterations) {
                    forced_intervention = true;
                    warn!(
                        task_id = %task.id(),
                        iterations,
                        max = config.max_review_iterations,
                        "review iteration cap reached, manual intervention required"
                    );
                } else {
                    task.transition_to(TaskStatus::InProgress, config, &*self.clock)?;
                    created = self.create_review_subtasks(task.id(), issues).await?;
                }
            }
            ReviewVerdict::NeedsIntervention => {}
        }

        task.record_review_feedback(ReviewFeedback {
            verdict: verdict.clone(),
            iteration: task.review_iterations(),
            forced_intervention,
            received_at: self.clock.utc(),
        });
        Ok(created)
    }

    /// Creates one subtask per issue. If any creation fails, the ones
    /// already created are discarded before the error is returned.
    async fn create_review_subtasks(
        &self,
        parent_id: TaskId,
        issues: &[String],
    ) -> WorkflowResult<Vec<TaskId>> {
        let mut created = Vec::with_capacity(issues.len());
        for issue in issues {
            let title = format!("Fix: {issue}");
            let description = format!("Automated review issue: {issue}");
            match self.subtasks.create(parent_id, &title, &description).await {
                Ok(subtask_id) => {
                    debug!(%parent_id, %subtask_id, "created review follow-up subtask");
                    created.push(subtask_id);
                }
                Err(err) => {
                    self.discard_subtasks(parent_id, &created).await;
                    return Err(err.into());
                }
            }
        }
        Ok(created)
    }

    async fn discard_subtasks(&self, parent_id: TaskId, subtask_ids: &[TaskId]) {
        for &subtask_id in subtask_ids {
            match self.subtasks.discard(subtask_id).await {
                Ok(()) => debug!(%parent_id, %subtask_id, "discarded review follow-up subtask"),
                Err(err) => error!(
                    %parent_id,
                    %subtask_id,
                    error = %err,
                    "failed to discard review follow-up subtask"
                ),
            }
        }
    }

    fn announce_verdict(&self, original: &Task, saved: &Task, verdict: ReviewVerdict) {
        info!(
            task_id = %saved.id(),
            verdict = verdict.label(),
            from = %original.status(),
            to = %saved.status(),
            review_iterations = saved.review_iterations(),
            "review verdict applied"
        );
        self.emit_status_changed(original, saved, None);
        self.events
            .emit(&WorkflowEvent::ReviewVerdictApplied {
                task_id: saved.id(),
                project_id: saved.project_id(),
                verdict,
                status: saved.status(),
                review_iterations: saved.review_iterations(),
            });

        if let Some(feedback) = saved.review_feedback().filter(|f| f.requires_intervention()) {
            self.events
                .emit(&WorkflowEvent::InterventionRequired {
                    task_id: saved.id(),
                    project_id: saved.project_id(),
                    review_iterations: saved.review_iterations(),
                    forced_by_iteration_cap: feedback.forced_intervention,
                });
        }
    }

    fn emit_status_changed(&self, original: &Task, saved: &Task, actor: Option<UserId>) {
        if original.status() == saved.status() {
            return;
        }
        info!(
            task_id = %saved.id(),
            from = %original.status(),
            to = %saved.status(),
            "task status changed"
        );
        self.events
            .emit(&WorkflowEvent::StatusChanged {
                task_id: saved.id(),
                project_id: saved.project_id(),
                from: original.status(),
                to: saved.status(),
                actor,
            });
    }

    fn reject(
        &self,
        task: &Task,
        rejection: InvalidTransition,
        actor: Option<UserId>,
    ) -> WorkflowError {
        debug!(
            task_id = %task.id(),
            from = %rejection.from,
            to = %rejection.to,
            reason = %rejection.reason,
            "transition rejected"
        );
        self.events
            .emit(&WorkflowEvent::TransitionRejected {
                task_id: task.id(),
                project_id: task.project_id(),
                rejection,
                actor,
            });
        WorkflowError::InvalidTransition(rejection)
    }
}

const fn pass_target(config: &WorkflowConfig) -> TaskStatus {
    if config.enable_human_review {
        TaskStatus::HumanReview
    } else {
        TaskStatus::Done
    }
}
