//! Weekly control loop — two independently timed triggers (planning,
//! publishing) driven by one task.
//!
//! The planning half runs idle → planning → generating → idle; the
//! publish half runs idle → publishing → idle. The halves are independent
//! state machines: a generation batch runs in its own task, so the
//! publish trigger fires on time even while jobs are in flight. They never
//! write the same rows — planning/generation owns `generation_jobs`,
//! publishing owns `content_feed_items` visibility.

pub mod clock;
pub mod publish;

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tokio::sync::{watch, Semaphore};
use tokio::task::{JoinHandle, JoinSet};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::generator::execute_job;
use crate::planner::plan_weekly_content;
use crate::scheduler::clock::{next_weekly_instant, Clock};
use crate::scheduler::publish::run_publish_cycle;
use crate::state::AppState;
use crate::store::JobStore;

/// Runs the scheduler until the shutdown signal flips. Spawned once at
/// startup.
pub async fn run(state: AppState, mut shutdown: watch::Receiver<bool>) {
    // Jobs stranded in_progress by a crashed run are claimable again.
    match state.jobs.reset_in_progress().await {
        Ok(0) => {}
        Ok(n) => warn!("Startup recovery: reset {n} stuck in_progress jobs to pending"),
        Err(e) => error!("Startup recovery failed: {e}"),
    }

    let mut next_planning = planning_instant(&state, state.clock.now());
    let mut next_publish = publish_instant(&state, state.clock.now());
    info!("Scheduler started: next planning {next_planning}, next publish {next_publish}");

    let mut planning_task: Option<JoinHandle<()>> = None;

    loop {
        let now = state.clock.now();
        tokio::select! {
            _ = tokio::time::sleep(until(next_planning, now)) => {
                planning_task = Some(tokio::spawn(run_planning_cycle(
                    state.clone(),
                    shutdown.clone(),
                )));
                next_planning = planning_instant(&state, state.clock.now());
                info!("Next planning trigger at {next_planning}");
            }
            _ = tokio::time::sleep(until(next_publish, now)) => {
                run_publish_cycle(state.content.as_ref(), state.clock.as_ref()).await;
                next_publish = publish_instant(&state, state.clock.now());
                info!("Next publish trigger at {next_publish}");
            }
            _ = shutdown.changed() => {
                info!("Scheduler shutting down");
                break;
            }
        }
    }

    // The planning task reacts to the same shutdown signal: it aborts its
    // workers and releases their claims. Wait for that to finish so no
    // job is left in_progress.
    if let Some(task) = planning_task {
        let _ = task.await;
    }
    if let Err(e) = state.jobs.reset_in_progress().await {
        error!("Shutdown job reset failed: {e}");
    }
}

fn planning_instant(state: &AppState, after: DateTime<Utc>) -> DateTime<Utc> {
    next_weekly_instant(
        after,
        state.config.planning_weekday,
        state.config.planning_hour,
        0,
        state.config.schedule_offset,
    )
}

/// The publish trigger fires a fixed delay after each weekly planning
/// instant, on its own timer.
fn publish_instant(state: &AppState, after: DateTime<Utc>) -> DateTime<Utc> {
    let delay = Duration::hours(state.config.publish_delay_hours);
    next_weekly_instant(
        after - delay,
        state.config.planning_weekday,
        state.config.planning_hour,
        0,
        state.config.schedule_offset,
    ) + delay
}

fn until(instant: DateTime<Utc>, now: DateTime<Utc>) -> std::time::Duration {
    (instant - now).to_std().unwrap_or(std::time::Duration::ZERO)
}

/// One planning trigger: requeue retryable failures, plan, then dispatch
/// every pending job under the concurrency bound.
async fn run_planning_cycle(state: AppState, shutdown: watch::Receiver<bool>) {
    match state.jobs.requeue_retryable(state.config.max_job_attempts).await {
        Ok(0) => {}
        Ok(n) => info!("Requeued {n} failed jobs for retry"),
        Err(e) => error!("Requeue of failed jobs failed: {e}"),
    }

    let outcome = match plan_weekly_content(
        state.clock.as_ref(),
        state.stages.as_ref(),
        state.trends.as_ref(),
        state.jobs.as_ref(),
        &state.config,
    )
    .await
    {
        Ok(outcome) => outcome,
        Err(e) => {
            error!("Planning cycle failed: {e}");
            return;
        }
    };

    // Dispatch order: freshly planned jobs in priority order, then any
    // other pending jobs (requeued retries, prior leftovers).
    let mut ids: Vec<Uuid> = outcome.jobs.iter().map(|j| j.id).collect();
    let planned: HashSet<Uuid> = ids.iter().copied().collect();
    match state.jobs.pending_jobs().await {
        Ok(pending) => {
            ids.extend(pending.iter().map(|j| j.id).filter(|id| !planned.contains(id)));
        }
        Err(e) => error!("Could not list pending jobs for dispatch: {e}"),
    }

    if ids.is_empty() {
        return;
    }
    info!(
        "Dispatching {} jobs ({} max in flight)",
        ids.len(),
        state.config.max_concurrent_jobs
    );
    dispatch_jobs(&state, ids, shutdown).await;
}

/// Executes jobs with bounded concurrency. On shutdown, in-flight workers
/// are aborted and their claims released; the all-or-nothing pipeline
/// guarantees an aborted job has persisted nothing.
async fn dispatch_jobs(state: &AppState, ids: Vec<Uuid>, mut shutdown: watch::Receiver<bool>) {
    let semaphore = Arc::new(Semaphore::new(state.config.max_concurrent_jobs));
    let mut workers = JoinSet::new();

    for id in ids {
        // Stop handing out work as soon as shutdown is signalled, even
        // while waiting on a permit.
        let permit = tokio::select! {
            permit = semaphore.clone().acquire_owned() => match permit {
                Ok(permit) => permit,
                Err(_) => break,
            },
            _ = shutdown.changed() => break,
        };
        let state = state.clone();
        workers.spawn(async move {
            let _permit = permit;
            let result = execute_job(
                state.jobs.as_ref(),
                state.content.as_ref(),
                state.provider.as_ref(),
                state.media.as_ref(),
                state.clock.as_ref(),
                &state.config,
                id,
            )
            .await;
            if let Err(e) = result {
                // Attempt bookkeeping is logged by the orchestrator;
                // per-job failures never fail the cycle.
                warn!("Job {id} did not complete: {e}");
            }
        });
    }

    loop {
        if *shutdown.borrow() {
            warn!("Shutdown during generation; aborting in-flight jobs");
            workers.abort_all();
            while workers.join_next().await.is_some() {}
            if let Err(e) = state.jobs.reset_in_progress().await {
                error!("Failed to release claimed jobs on shutdown: {e}");
            }
            return;
        }
        tokio::select! {
            joined = workers.join_next() => {
                if joined.is_none() {
                    return;
                }
            }
            changed = shutdown.changed() => {
                // A dropped sender means no signal is coming; finish the
                // batch normally instead of spinning on the error.
                if changed.is_err() {
                    while workers.join_next().await.is_some() {}
                    return;
                }
            }
        }
    }
}
