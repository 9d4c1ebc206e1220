// src/driver/mod.rs

//! Plan driver: walks the decomposed plan strictly in order, delegates
//! executable steps to the step runner, and finishes with the synthesis
//! call. Progress is surfaced as one ordered [`SolverEvent`] sequence; a
//! streaming consumer forwards each event as it is produced, while
//! [`Solver::solve`] buffers the same sequence into a [`Solution`].

use crate::agents::{
    Critic, Decomposer, LlmClient, LlmCritic, LlmDecomposer, LlmError, LlmSnippetGenerator,
    LlmSynthesizer, SnippetGenerator, Synthesizer,
};
use crate::config::SolverConfig;
use crate::context::ContextStore;
use crate::protocol::{AttemptEvent, Solution, SolverEvent, StepReport};
use crate::runner::StepRunner;

/// A query-level failure. Per-step faults never surface here; they are
/// absorbed into attempt feedback and the `FAILED_TO_REFINE` sentinel.
#[derive(Debug, thiserror::Error)]
pub enum SolverError {
    #[error("failed to decompose problem: {0}")]
    Decompose(#[source] LlmError),

    #[error("failed to synthesize final answer: {0}")]
    Synthesize(#[source] LlmError),
}

pub struct Solver<D, G, C, S> {
    decomposer: D,
    generator: G,
    critic: C,
    synthesizer: S,
}

/// The production wiring: all four collaborators backed by one LLM client.
pub type LlmSolver = Solver<LlmDecomposer, LlmSnippetGenerator, LlmCritic, LlmSynthesizer>;

impl LlmSolver {
    pub fn from_config(config: SolverConfig) -> Self {
        let client = LlmClient::new(config);
        Solver::new(
            LlmDecomposer::new(client.clone()),
            LlmSnippetGenerator::new(client.clone()),
            LlmCritic::new(client.clone()),
            LlmSynthesizer::new(client),
        )
    }
}

impl<D, G, C, S> Solver<D, G, C, S>
where
    D: Decomposer,
    G: SnippetGenerator,
    C: Critic,
    S: Synthesizer,
{
    pub fn new(decomposer: D, generator: G, critic: C, synthesizer: S) -> Self {
        Self {
            decomposer,
            generator,
            critic,
            synthesizer,
        }
    }

    /// Solve `query`, buffering the event sequence into the returned
    /// [`Solution`].
    pub fn solve(&self, query: &str) -> Result<Solution, SolverError> {
        self.solve_with(query, |_| {})
    }

    /// Solve `query`, reporting each [`SolverEvent`] through `emit` as it is
    /// produced. The sequence always ends with [`SolverEvent::Done`], even
    /// after a fatal error.
    pub fn solve_with(
        &self,
        query: &str,
        mut emit: impl FnMut(SolverEvent),
    ) -> Result<Solution, SolverError> {
        let plan = match self.decomposer.decompose(query) {
            Ok(plan) => plan,
            Err(err) => {
                let err = SolverError::Decompose(err);
                emit(SolverEvent::Error(err.to_string()));
                emit(SolverEvent::Done);
                return Err(err);
            }
        };
        tracing::info!(steps = plan.steps.len(), "plan received");
        emit(SolverEvent::Plan(plan.steps.clone()));

        let mut ctx = ContextStore::new();
        let mut reports = Vec::with_capacity(plan.steps.len());
        let runner = StepRunner::new(&self.generator, &self.critic, query);

        for step in &plan.steps {
            if step.kind.is_executable() {
                let attempts = runner.run(step, &mut ctx, &mut |step, record| {
                    emit(SolverEvent::Attempt(AttemptEvent {
                        step: step.clone(),
                        record: record.clone(),
                    }));
                });
                reports.push(StepReport {
                    step: step.clone(),
                    attempts,
                });
            } else {
                // final_synthesis is consumed by the synthesis call below;
                // unknown kinds are skipped, not errors.
                tracing::debug!(step = step.step_num, kind = %step.kind, "skipping non-executable step");
                reports.push(StepReport {
                    step: step.clone(),
                    attempts: Vec::new(),
                });
            }
        }

        let results = ctx.snapshot();
        let final_answer = match self.synthesizer.synthesize(query, &results) {
            Ok(answer) => answer,
            Err(err) => {
                let err = SolverError::Synthesize(err);
                emit(SolverEvent::Error(err.to_string()));
                emit(SolverEvent::Done);
                return Err(err);
            }
        };
        emit(SolverEvent::FinalAnswer(final_answer.clone()));
        emit(SolverEvent::Done);

        Ok(Solution {
            query: query.to_string(),
            plan,
            steps: reports,
            results,
            final_answer,
        })
    }
}
