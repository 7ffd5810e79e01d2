//! Sequential step runner.

use super::{Collaborators, RunState, Step, StepContext, default_steps};
use crate::{
    cli::OutputManager,
    error::Error,
    settings::{BuildContext, InstallerConfig},
};
use std::time::Instant;

/// Where the pipeline is in its lifecycle.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PipelineState {
    Idle,
    Running { index: usize, step: &'static str },
    Done,
    /// Terminal; `index` is the failing step (0-based).
    Aborted { index: usize, step: &'static str },
}

/// Outcome of one pipeline execution.
#[derive(Debug)]
pub struct PipelineReport {
    pub state: PipelineState,
    /// Names of the steps that completed, in order.
    pub completed: Vec<&'static str>,
    pub error: Option<Error>,
    pub run_state: RunState,
}

impl PipelineReport {
    pub fn succeeded(&self) -> bool {
        self.state == PipelineState::Done
    }

    /// `0` on success, `1` for any failure.
    pub fn exit_code(&self) -> i32 {
        if self.succeeded() { 0 } else { 1 }
    }
}

/// Runs steps in order and stops at the first failure.
pub struct PipelineRunner<'a> {
    build: &'a BuildContext,
    config: &'a InstallerConfig,
    tools: &'a Collaborators,
    output: OutputManager,
    steps: Vec<Box<dyn Step>>,
}

impl<'a> PipelineRunner<'a> {
    /// Runner over the standard installer build steps.
    pub fn new(
        build: &'a BuildContext,
        config: &'a InstallerConfig,
        tools: &'a Collaborators,
        output: OutputManager,
    ) -> Self {
        Self {
            build,
            config,
            tools,
            output,
            steps: default_steps(),
        }
    }

    /// Replaces the step list.
    pub fn with_steps(mut self, steps: Vec<Box<dyn Step>>) -> Self {
        self.steps = steps;
        self
    }

    pub fn step_names(&self) -> Vec<&'static str> {
        self.steps.iter().map(|s| s.name()).collect()
    }

    /// Executes every step, stopping at the first failure.
    pub async fn execute(&self) -> PipelineReport {
        let mut run_state = RunState::default();
        let mut completed = Vec::with_capacity(self.steps.len());
        let mut state = PipelineState::Idle;
        log::trace!("Pipeline state: {:?}", state);
        let total = self.steps.len();
        let started = Instant::now();

        for (index, step) in self.steps.iter().enumerate() {
            state = PipelineState::Running {
                index,
                step: step.name(),
            };
            log::trace!("Pipeline state: {:?}", state);
            self.output
                .section(&format!("[{}/{}] {}", index + 1, total, step.name()));

            let mut cx = StepContext {
                build: self.build,
                config: self.config,
                tools: self.tools,
                state: &mut run_state,
            };

            let step_started = Instant::now();
            if let Err(error) = step.run(&mut cx).await {
                log::debug!("{} failed after {:?}", step.name(), step_started.elapsed());
                return PipelineReport {
                    state: PipelineState::Aborted {
                        index,
                        step: step.name(),
                    },
                    completed,
                    error: Some(error),
                    run_state,
                };
            }

            log::debug!("{} finished in {:?}", step.name(), step_started.elapsed());
            completed.push(step.name());
        }

        state = PipelineState::Done;
        log::info!("Pipeline finished in {:?}", started.elapsed());

        PipelineReport {
            state,
            completed,
            error: None,
            run_state,
        }
    }

    /// Executes the pipeline and reports to the console.
    ///
    /// Returns the process exit code.
    pub async fn run(&self) -> i32 {
        let report = self.execute().await;

        match (&report.state, &report.error) {
            (PipelineState::Aborted { index, step }, Some(error)) => {
                self.output.error(&format!(
                    "Build aborted at step {}/{} ({}): {} error: {}",
                    index + 1,
                    self.steps.len(),
                    step,
                    error.kind(),
                    error
                ));
            }
            _ => {
                for path in &report.run_state.published {
                    self.output.success(&format!("Installer: {}", path.display()));
                }
                self.output.success("Build complete");
            }
        }

        report.exit_code()
    }
}
