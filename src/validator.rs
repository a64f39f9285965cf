//! Validation context and aggregated reporting
//!
//! Structural parsing stays purely structural; after a subtree is fully
//! built, a resolve walk asks every element to validate itself. Errors
//! accumulate here rather than aborting at the first violation, so a caller
//! sees every problem with a document in one pass.

use std::fmt;

use crate::model::element::Element;
use crate::model::metadata::ElementMetadata;
use crate::model::registry::MetadataRegistry;

/// One semantic problem found during resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationIssue {
    /// Path from the root to the offending element, like
    /// `feed/entry[2]/gd:when`.
    pub path: String,
    /// Human-readable description of the violation.
    pub message: String,
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

/// Accumulator for semantic errors across a parsed subtree.
///
/// The resolve walk maintains the element path; hooks only ever call
/// [`ValidationContext::add_error`].
#[derive(Debug, Default)]
pub struct ValidationContext {
    path: Vec<String>,
    issues: Vec<ValidationIssue>,
}

impl ValidationContext {
    /// Create an empty context.
    pub fn new() -> Self {
        ValidationContext::default()
    }

    /// Record an error against the element currently being resolved.
    pub fn add_error(&mut self, message: impl Into<String>) {
        self.issues.push(ValidationIssue {
            path: self.path.join("/"),
            message: message.into(),
        });
    }

    /// True if no errors have been recorded.
    pub fn is_valid(&self) -> bool {
        self.issues.is_empty()
    }

    /// The issues recorded so far.
    pub fn issues(&self) -> &[ValidationIssue] {
        &self.issues
    }

    /// Consume the context into a report.
    pub fn into_report(self) -> ValidationReport {
        ValidationReport {
            issues: self.issues,
        }
    }

    pub(crate) fn push_path(&mut self, segment: String) {
        self.path.push(segment);
    }

    pub(crate) fn pop_path(&mut self) {
        self.path.pop();
    }
}

/// Every issue found while resolving one document, reported as a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationReport {
    issues: Vec<ValidationIssue>,
}

impl ValidationReport {
    /// The issues in the order they were found.
    pub fn issues(&self) -> &[ValidationIssue] {
        &self.issues
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} validation error(s)", self.issues.len())?;
        for issue in &self.issues {
            write!(f, "\n  - {}", issue)?;
        }
        Ok(())
    }
}

/// Metadata-driven checks shared by every element: required attributes,
/// required children, required text content.
pub(crate) fn check_metadata(
    element: &Element,
    metadata: &ElementMetadata,
    registry: &MetadataRegistry,
    ctx: &mut ValidationContext,
) {
    for attr in metadata.attributes() {
        if attr.is_required() && !element.has_attribute(attr.key()) {
            ctx.add_error(format!(
                "missing required attribute '{}'",
                attr.key().id()
            ));
        }
    }

    for child_key in metadata.elements() {
        let Ok(child_meta) = registry.bind(child_key) else {
            continue;
        };
        if child_meta.is_required() && !element.has_element(child_key) {
            ctx.add_error(format!("missing required element '{}'", child_key.id()));
        }
    }

    if metadata.is_content_required()
        && element
            .text_value()
            .map(|v| v.to_text().is_empty())
            .unwrap_or(true)
    {
        ctx.add_error("missing required text content");
    }
}
