// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Human-readable compile error reports.

use std::string::{String, ToString};
use std::vec::Vec;

use ariadne::{Config, Label, Report, ReportKind, Source};

use crate::error::CompileError;

impl CompileError {
    /// Renders this error as a plain-text report with the offending source
    /// line underlined.
    ///
    /// Falls back to the one-line [`Display`](core::fmt::Display) form if
    /// the report cannot be written.
    #[must_use]
    pub fn report(&self, source_name: &str, source: &str) -> String {
        let range = self.span.into_range();
        let mut bytes = Vec::new();
        let written = Report::build(ReportKind::Error, (source_name, range.clone()))
            .with_config(Config::default().with_color(false))
            .with_message(self.kind.to_string())
            .with_label(
                Label::new((source_name, range)).with_message(self.position.to_string()),
            )
            .finish()
            .write((source_name, Source::from(source)), &mut bytes);
        match written {
            Ok(()) => String::from_utf8_lossy(&bytes).into_owned(),
            Err(err) => {
                log::debug!("could not render report: {err}");
                self.to_string()
            }
        }
    }
}
