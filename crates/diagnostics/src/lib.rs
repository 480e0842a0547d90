#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Diagnostic reports produced by a toolchain run
//!
//! [`DiagnosticReport`] is the parsed structured report. [`OutputParser`]
//! recovers the diagnostics that only ever show up in captured console
//! output (package restore and SDK resolution problems), which
//! [`DiagnosticReport::enrich`] folds back into the report as one extra run.

mod parser;
mod report;

pub use parser::OutputParser;
pub use report::{DiagnosticReport, Level, Message, ResultEntry, Run};

impl DiagnosticReport {
    /// Append everything `parser` finds in `output` as one synthetic run.
    /// Returns the number of results added.
    pub fn enrich<I, S>(&mut self, parser: &OutputParser, output: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let recovered = parser.parse(output);
        let added = recovered.len();
        self.push_run(Run::new(recovered));
        added
    }
}
