//! Rule evaluation
//!
//! [`RuleEngine`] runs [`RULES`] in order, drops findings whose code is
//! disabled and applies severity overrides. The concurrent path runs each
//! rule on its own scoped thread and merges results back in rule order, so
//! both paths produce the same sequence.

use crate::rules::{Rule, RULES};
use ddllint_core::{Config, Finding, RuleSelection, Schema, SeverityThreshold};
use ddllint_sql::DdlExtractor;

/// Configured rule runner
#[derive(Debug, Clone, Default)]
pub struct RuleEngine {
    rules: RuleSelection,
    severity: SeverityThreshold,
}

impl RuleEngine {
    pub fn new(config: &Config) -> Self {
        Self {
            rules: config.rules.clone(),
            severity: config.severity.clone(),
        }
    }

    /// Rules that can still emit at least one enabled code
    pub fn active_rules(&self) -> Vec<&'static Rule> {
        RULES
            .iter()
            .filter(|rule| rule.codes.iter().any(|code| self.rules.is_enabled(*code)))
            .collect()
    }

    /// Run every active rule sequentially
    pub fn validate(&self, schema: &Schema) -> Vec<Finding> {
        let mut findings = Vec::new();
        for rule in self.active_rules() {
            findings.extend(self.run_rule(rule, schema));
        }
        findings
    }

    /// Run every active rule on its own thread, merged in rule order
    pub fn validate_concurrent(&self, schema: &Schema) -> Vec<Finding> {
        let rules = self.active_rules();

        let batches: Vec<Vec<Finding>> = std::thread::scope(|scope| {
            let handles: Vec<_> = rules
                .iter()
                .map(|rule| (rule, scope.spawn(move || self.run_rule(rule, schema))))
                .collect();

            handles
                .into_iter()
                .map(|(rule, handle)| {
                    handle.join().unwrap_or_else(|panic| {
                        tracing::error!(rule = rule.name, "rule worker panicked");
                        std::panic::resume_unwind(panic)
                    })
                })
                .collect()
        });

        batches.into_iter().flatten().collect()
    }

    /// Drop disabled codes and apply severity overrides
    ///
    /// Used for rule output and for parse findings from the extractor.
    pub fn screen(&self, findings: Vec<Finding>) -> Vec<Finding> {
        findings
            .into_iter()
            .filter(|finding| self.rules.is_enabled(finding.code))
            .map(|finding| self.severity.apply(finding))
            .collect()
    }

    fn run_rule(&self, rule: &Rule, schema: &Schema) -> Vec<Finding> {
        let findings = self.screen(rule.run(schema));

        tracing::debug!(rule = rule.name, findings = findings.len(), "rule evaluated");
        findings
    }
}

/// Validate with the default configuration
pub fn validate(schema: &Schema) -> Vec<Finding> {
    RuleEngine::default().validate(schema)
}

/// Extract and validate in one pass: parse findings first, then rule findings
///
/// Severity overrides and disabled codes apply to parse findings too.
pub fn analyze(ddl: &str, config: &Config) -> Vec<Finding> {
    let extraction = DdlExtractor::from_config(config).extract(ddl);
    let engine = RuleEngine::new(config);

    let mut findings = engine.screen(extraction.findings);
    findings.extend(engine.validate(&extraction.schema));
    findings
}
