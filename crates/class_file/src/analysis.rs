//! Per-method analysis with failure isolation.
//!
//! [`ClassFile::analyse_methods`](crate::ClassFile::analyse_methods) visits every
//! method in declaration order and records one [`MethodOutcome`] per method. A failing
//! method never stops the others from being analysed.

use std::collections::BTreeSet;

use thiserror::Error;

use crate::{attributes::CodeAttribute, BoxError, MethodRef};

/// Run configuration and per-method analysis step.
pub trait Analyser {
    /// Whether the method with this simple name should be analysed at all.
    fn should_analyse(&self, method_name: &str) -> bool;

    fn analyse(&self, method: MethodRef<'_>, code: &CodeAttribute) -> Result<(), BoxError>;
}

#[derive(Debug)]
pub enum Outcome {
    Skipped,
    Analysed,
    Failed(BoxError),
}

#[derive(Debug)]
pub struct MethodOutcome {
    pub name: String,
    pub outcome: Outcome,
}

/// Outcomes of one analysis run, in declaration order.
#[derive(Debug, Default)]
pub struct AnalysisReport {
    outcomes: Vec<MethodOutcome>,
}
impl AnalysisReport {
    pub(crate) fn push(&mut self, name: String, outcome: Outcome) {
        self.outcomes.push(MethodOutcome { name, outcome });
    }

    pub fn outcomes(&self) -> &[MethodOutcome] {
        &self.outcomes
    }

    pub fn failures(&self) -> impl Iterator<Item = &MethodOutcome> {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.outcome, Outcome::Failed(_)))
    }

    pub fn analysed_count(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.outcome, Outcome::Analysed))
            .count()
    }

    pub fn is_success(&self) -> bool {
        self.failures().next().is_none()
    }

    /// Escalates the failures, if any, into a single error.
    pub fn into_result(self) -> Result<(), AnalysisFailed> {
        let failures = self
            .outcomes
            .into_iter()
            .filter_map(|o| match o.outcome {
                Outcome::Failed(cause) => Some(MethodFailure {
                    name: o.name,
                    cause,
                }),
                _ => None,
            })
            .collect::<Vec<_>>();

        if failures.is_empty() {
            Ok(())
        } else {
            Err(AnalysisFailed { failures })
        }
    }
}

#[derive(Error, Debug)]
#[error("{name}: {cause}")]
pub struct MethodFailure {
    pub name: String,
    pub cause: BoxError,
}

/// One or more methods failed to analyse.
#[derive(Error, Debug)]
#[error("Failed to analyse {} method(s){}", .failures.len(), failure_lines(.failures))]
pub struct AnalysisFailed {
    failures: Vec<MethodFailure>,
}
impl AnalysisFailed {
    pub fn failures(&self) -> &[MethodFailure] {
        &self.failures
    }
}

fn failure_lines(failures: &[MethodFailure]) -> String {
    failures
        .iter()
        .map(|failure| format!("\n  {}", failure))
        .collect()
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
enum MethodFilter {
    #[default]
    All,
    Only(BTreeSet<String>),
    Nothing,
}

/// Checks that each selected method's `Code` attribute is internally consistent.
#[derive(Debug, Clone, Default)]
pub struct AnalysisOptions {
    filter: MethodFilter,
}
impl AnalysisOptions {
    pub fn all() -> Self {
        Self {
            filter: MethodFilter::All,
        }
    }

    pub fn none() -> Self {
        Self {
            filter: MethodFilter::Nothing,
        }
    }

    pub fn only<S: Into<String>>(names: impl IntoIterator<Item = S>) -> Self {
        Self {
            filter: MethodFilter::Only(names.into_iter().map(Into::into).collect()),
        }
    }
}
impl Analyser for AnalysisOptions {
    fn should_analyse(&self, method_name: &str) -> bool {
        match &self.filter {
            MethodFilter::All => true,
            MethodFilter::Only(names) => names.contains(method_name),
            MethodFilter::Nothing => false,
        }
    }

    fn analyse(&self, method: MethodRef<'_>, code: &CodeAttribute) -> Result<(), BoxError> {
        let code_length = code.code.len();
        if code_length == 0 {
            return Err(CodeError::EmptyCode.into());
        }

        for (index, entry) in code.exception_table.iter().enumerate() {
            let start_pc = entry.start_pc as usize;
            let end_pc = entry.end_pc as usize;
            let handler_pc = entry.handler_pc as usize;
            if start_pc >= end_pc || end_pc > code_length || handler_pc >= code_length {
                return Err(CodeError::HandlerOutOfRange {
                    index,
                    start_pc,
                    end_pc,
                    handler_pc,
                    code_length,
                }
                .into());
            }
            if entry.catch_type != 0 {
                method
                    .class()
                    .constant_pool()
                    .class_ref(entry.catch_type)?;
            }
        }

        Ok(())
    }
}

#[derive(Error, Debug)]
pub enum CodeError {
    #[error("Code attribute has no instructions")]
    EmptyCode,
    #[error("Exception handler {index} [{start_pc}, {end_pc}) -> {handler_pc} lies outside {code_length} bytes of code")]
    HandlerOutOfRange {
        index: usize,
        start_pc: usize,
        end_pc: usize,
        handler_pc: usize,
        code_length: usize,
    },
}
