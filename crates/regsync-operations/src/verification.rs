//! Hierarchical step results and their Markdown rendering.

use std::fmt::{Display, Write};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Success,
    Failure,
    NotRun,
    Skipped,
    Warning,
}

impl Status {
    fn badge(&self) -> &'static str {
        match self {
            Status::Success => "✅ **Success**",
            Status::Failure => "❌ **Failure**",
            Status::NotRun => "⚠️ **Not Run**",
            Status::Skipped => "⚠️ **Skipped**",
            Status::Warning => "⚠️ **Warning**",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Step {
    pub name: String,
    pub status: Status,
    #[serde(default)]
    pub errors: Vec<String>,
    #[serde(default)]
    pub remarks: Vec<String>,
    #[serde(default)]
    pub sub_steps: Vec<Step>,
}

impl Step {
    pub fn new(name: impl Into<String>, status: Status) -> Self {
        Self {
            name: name.into(),
            status,
            errors: Vec::new(),
            remarks: Vec::new(),
            sub_steps: Vec::new(),
        }
    }

    pub fn add_step(&mut self, name: impl Into<String>, status: Status) -> &mut Step {
        self.sub_steps.push(Step::new(name, status));
        let last = self.sub_steps.len() - 1;
        &mut self.sub_steps[last]
    }

    /// Adds a sub-step whose status follows `result`.
    pub fn record<E: Display>(
        &mut self,
        name: impl Into<String>,
        result: std::result::Result<(), E>,
    ) -> &mut Step {
        let step = self.add_step(name, Status::NotRun);
        step.set_result(result);
        step
    }

    /// Runs `check` and records it as a sub-step.
    pub fn run_step<E, F>(&mut self, name: impl Into<String>, check: F) -> &mut Step
    where
        E: Display,
        F: FnOnce() -> std::result::Result<(), E>,
    {
        self.record(name, check())
    }

    pub fn set_result<E: Display>(&mut self, result: std::result::Result<(), E>) {
        match result {
            Ok(()) => self.status = Status::Success,
            Err(err) => self.fail(err),
        }
    }

    pub fn fail<E: Display>(&mut self, err: E) {
        self.errors.push(err.to_string());
        self.status = Status::Failure;
    }

    pub fn add_remark(&mut self, remark: impl Into<String>) {
        self.remarks.push(remark.into());
    }

    /// Downgrades a failure of this step to a warning.
    pub fn failure_to_warning(&mut self) {
        if self.status == Status::Failure {
            self.status = Status::Warning;
        }
    }

    /// Whether this step or any step below it failed.
    pub fn did_fail(&self) -> bool {
        self.status == Status::Failure || self.sub_steps.iter().any(Step::did_fail)
    }

    fn render(&self, depth: usize, out: &mut String) {
        let level = "#".repeat((depth + 2).min(6));
        let _ = writeln!(out, "{level} {}", self.name);
        for remark in &self.remarks {
            let _ = write!(out, "> [!NOTE]\n> {remark}\n\n");
        }
        let _ = writeln!(out, "{}", self.status.badge());
        for err in &self.errors {
            let _ = writeln!(out, "- {err}");
        }
        for step in &self.sub_steps {
            step.render(depth + 1, out);
        }
    }
}

/// The root of a verification run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationResult {
    pub steps: Vec<Step>,
}

impl VerificationResult {
    pub fn add_step(&mut self, name: impl Into<String>, status: Status) -> &mut Step {
        self.steps.push(Step::new(name, status));
        let last = self.steps.len() - 1;
        &mut self.steps[last]
    }

    pub fn push(&mut self, step: Step) {
        self.steps.push(step);
    }

    pub fn did_fail(&self) -> bool {
        self.steps.iter().any(Step::did_fail)
    }

    pub fn render_markdown(&self) -> String {
        let mut out = String::new();
        for step in &self.steps {
            step.render(0, &mut out);
            out.push('\n');
        }
        out
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
