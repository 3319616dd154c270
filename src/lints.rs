use std::convert::TryInto;

use codespan_reporting::diagnostic::{
    Diagnostic as CodespanDiagnostic, Label as CodespanLabel, Severity as CodespanSeverity,
};
use serde::de::DeserializeOwned;

use crate::ast::SyntaxTree;

pub mod no_excess_parens;

#[cfg(test)]
mod test_util;

pub trait Lint {
    type Config: DeserializeOwned;
    type Error: std::error::Error;

    const SEVERITY: Severity;
    const LINT_TYPE: LintType;

    fn new(config: Self::Config) -> Result<Self, Self::Error>
    where
        Self: Sized;

    fn pass(&self, tree: &SyntaxTree) -> Vec<Diagnostic>;
}

pub enum LintType {
    /// Code that hides a simple expression behind extra syntax
    Complexity,

    /// Code that does not do what it was meant to
    /// Should have severity "Error"
    Correctness,

    /// Code with a cheaper equivalent
    Performance,

    /// Code carrying syntax that changes nothing, like redundant parentheses
    Style,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Severity {
    Allow,
    Error,
    Warning,
}

#[derive(Debug)]
pub struct Diagnostic {
    pub code: &'static str,
    pub message: String,
    pub primary_label: Label,
}

impl Diagnostic {
    pub fn new(code: &'static str, message: String, primary_label: Label) -> Self {
        Self {
            code,
            message,
            primary_label,
        }
    }

    pub fn into_codespan_diagnostic(
        self,
        file_id: codespan::FileId,
        severity: CodespanSeverity,
    ) -> CodespanDiagnostic<codespan::FileId> {
        CodespanDiagnostic {
            code: Some(self.code.to_owned()),
            labels: vec![self.primary_label.codespan_label(file_id)],
            message: self.message,
            notes: Vec::new(),
            severity,
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct Label {
    pub range: (u32, u32),
}

impl Label {
    pub fn new<P: TryInto<u32>>(range: (P, P)) -> Label {
        let range = (
            range
                .0
                .try_into()
                .unwrap_or_else(|_| panic!("TryInto failed for Label::new range")),
            range
                .1
                .try_into()
                .unwrap_or_else(|_| panic!("TryInto failed for Label::new range")),
        );

        Label { range }
    }

    pub fn codespan_label(&self, file_id: codespan::FileId) -> CodespanLabel<codespan::FileId> {
        CodespanLabel::primary(
            file_id.to_owned(),
            codespan::Span::new(self.range.0, self.range.1),
        )
    }
}
