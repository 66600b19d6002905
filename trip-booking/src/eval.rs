//! Runs declarative test cases against the travel pipeline

use async_trait::async_trait;
use std::sync::Arc;
use trip_core::Llm;
use trip_eval::{CaseRun, CaseRunner, TestCase};
use trip_telemetry::{SpanKind, SpanRecord, TraceCollector};

use crate::config::PipelineConfig;
use crate::pipeline::PipelineBuilder;

/// [`CaseRunner`] that builds a fresh pipeline for every case
///
/// Spans are read from `collector`, which must be fed by a
/// [`TraceLayer`](trip_telemetry::TraceLayer) in the active subscriber. Only
/// the trees of this case's own turns are returned.
pub struct PipelineCaseRunner {
    config: PipelineConfig,
    model: Arc<dyn Llm>,
    collector: TraceCollector,
}

impl PipelineCaseRunner {
    pub fn new(config: PipelineConfig, model: Arc<dyn Llm>, collector: TraceCollector) -> Self {
        Self { config, model, collector }
    }

    fn spans_for(&self, session_ids: &[String]) -> Vec<SpanRecord> {
        self.collector
            .spans_of_kind(SpanKind::Turn)
            .into_iter()
            .filter(|turn| {
                turn.attributes.get("session.id").is_some_and(|id| session_ids.contains(id))
            })
            .flat_map(|turn| self.collector.tree(turn.seq))
            .collect()
    }
}

#[async_trait]
impl CaseRunner for PipelineCaseRunner {
    async fn run_case(&self, case: &TestCase) -> trip_eval::Result<CaseRun> {
        let mut builder = PipelineBuilder::new(self.config.clone()).model(self.model.clone());
        for mock in &case.mock_tools {
            builder = builder.mock_tool(&mock.name, mock.response.clone())?;
        }
        let pipeline = builder.build()?;

        let mut run = CaseRun::default();
        let mut session_ids = Vec::new();
        for input in &case.test_input {
            let session_id = uuid::Uuid::new_v4().to_string();
            session_ids.push(session_id.clone());
            match pipeline.run_in_session(input, session_id).await {
                Ok(result) => run.output = result.output,
                Err(e) => {
                    run.error = Some(e.to_string());
                    break;
                }
            }
        }
        run.spans = self.spans_for(&session_ids);
        Ok(run)
    }
}
