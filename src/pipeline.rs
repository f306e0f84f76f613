//! Check pipeline: runs every configured capability over one request.
//!
//! Capabilities run in order. A capability that fails is recorded and the
//! remaining ones still run.

use tracing::{debug, error, info};

use crate::capability::{Capability, ProtocolError};
use crate::protocol::{AnalysisRequest, Report};

/// Result of one capability invocation.
#[derive(Debug)]
pub struct CapabilityOutcome {
    pub name: String,
    pub result: Result<Vec<Report>, ProtocolError>,
}

impl CapabilityOutcome {
    pub fn reports(&self) -> &[Report] {
        match &self.result {
            Ok(reports) => reports,
            Err(_) => &[],
        }
    }
}

/// Outcomes of a whole pipeline pass, in capability order.
#[derive(Debug, Default)]
pub struct RunSummary {
    pub outcomes: Vec<CapabilityOutcome>,
}

impl RunSummary {
    /// True iff any diagnostic from any successful capability is fatal.
    pub fn is_fatal(&self) -> bool {
        self.outcomes
            .iter()
            .any(|outcome| crate::analysis::is_fatal(outcome.reports()))
    }

    pub fn failures(&self) -> impl Iterator<Item = (&str, &ProtocolError)> {
        self.outcomes.iter().filter_map(|outcome| match &outcome.result {
            Ok(_) => None,
            Err(err) => Some((outcome.name.as_str(), err)),
        })
    }

    pub fn has_failures(&self) -> bool {
        self.failures().next().is_some()
    }

    pub fn diagnostic_count(&self) -> usize {
        self.outcomes
            .iter()
            .flat_map(|outcome| outcome.reports())
            .map(|report| report.diagnostics.len())
            .sum()
    }
}

/// Ordered set of capabilities run over each request.
#[derive(Default)]
pub struct CheckPipeline {
    capabilities: Vec<Box<dyn Capability>>,
}

impl CheckPipeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capability(mut self, capability: Box<dyn Capability>) -> Self {
        self.capabilities.push(capability);
        self
    }

    pub fn push(&mut self, capability: Box<dyn Capability>) {
        self.capabilities.push(capability);
    }

    /// Run every capability over `request`.
    pub fn run(&self, request: &AnalysisRequest) -> RunSummary {
        let mut summary = RunSummary::default();
        for capability in &self.capabilities {
            let name = capability.name().to_string();
            debug!(analyzer = %name, migrations = request.migrations.len(), "running analyzer");

            let result = capability.invoke(request).map(|response| response.reports);
            if let Err(err) = &result {
                error!(analyzer = %name, error = %err, "analyzer failed");
            }
            summary.outcomes.push(CapabilityOutcome { name, result });
        }

        info!(
            analyzers = summary.outcomes.len(),
            diagnostics = summary.diagnostic_count(),
            fatal = summary.is_fatal(),
            "analysis finished"
        );
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::{ExternalProcess, InProcess};
    use crate::input::{Migration, MigrationOptions};
    use crate::rules::AnalyzerId;

    fn request(up: &str, down: &str) -> AnalysisRequest {
        AnalysisRequest {
            metadata: Default::default(),
            migrations: vec![Migration {
                file_name: "001_idx.sql".to_string(),
                up: up.to_string(),
                up_options: MigrationOptions::with_transaction(true),
                down: down.to_string(),
                down_options: MigrationOptions::with_transaction(true),
                ..Migration::default()
            }],
        }
    }

    #[test]
    fn test_empty_pipeline() {
        let summary = CheckPipeline::new().run(&request("SELECT 1;\n", ""));
        assert!(summary.outcomes.is_empty());
        assert!(!summary.is_fatal());
        assert!(!summary.has_failures());
    }

    #[test]
    fn test_warnings_are_not_fatal() {
        let pipeline = CheckPipeline::new()
            .with_capability(Box::new(InProcess::new(AnalyzerId::CreateIndexConcurrently)))
            .with_capability(Box::new(InProcess::new(AnalyzerId::DropIndexConcurrently)));
        let summary = pipeline.run(&request(
            "-- migrate:up\nCREATE INDEX i ON t(c);\n",
            "-- migrate:down\nDROP INDEX i;\n",
        ));
        assert_eq!(summary.outcomes.len(), 2);
        assert_eq!(summary.diagnostic_count(), 2);
        assert!(!summary.is_fatal());
    }

    #[test]
    fn test_fatal_from_any_capability() {
        let pipeline = CheckPipeline::new()
            .with_capability(Box::new(InProcess::new(AnalyzerId::CreateIndexConcurrently)))
            .with_capability(Box::new(InProcess::new(
                AnalyzerId::IndexConcurrentlyWithinTransaction,
            )));
        let summary = pipeline.run(&request("CREATE INDEX CONCURRENTLY i ON t(c);\n", ""));
        assert!(summary.is_fatal());
    }

    #[test]
    fn test_failing_capability_does_not_stop_the_rest() {
        let pipeline = CheckPipeline::new()
            .with_capability(Box::new(ExternalProcess::new("/nonexistent/analyzer")))
            .with_capability(Box::new(InProcess::new(AnalyzerId::CreateIndexConcurrently)));
        let summary = pipeline.run(&request("CREATE INDEX i ON t(c);\n", ""));

        let failed: Vec<_> = summary.failures().map(|(name, _)| name).collect();
        assert_eq!(failed, vec!["/nonexistent/analyzer"]);
        assert_eq!(summary.outcomes[1].reports().len(), 1);
        assert!(!summary.is_fatal());
    }
}
