//! Terminal rendering of analysis reports and consolidation results.

use std::io::{self, Write};

use crate::advisor::AnalysisReport;
use crate::dedup::{ConsolidationFailure, ConsolidationResult, ConsolidationSuggestion};

// ANSI color codes for terminal output
const GREEN: &str = "\x1b[32m";
const RED: &str = "\x1b[31m";
const YELLOW: &str = "\x1b[33m";
const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";
const DIM: &str = "\x1b[2m";

/// Prints the suggestions of an analysis, numbered from 1.
pub fn print_analysis_report(report: &AnalysisReport) {
    let failed_lookups: Vec<_> = report
        .usage_analysis
        .iter()
        .filter_map(|(id, record)| record.error.as_ref().map(|e| (id, e)))
        .collect();

    println!("{}Tag deduplication report{}", BOLD, RESET);
    println!(
        "{}Generated {} · threshold {:.2}{}",
        DIM, report.generated_at, report.threshold, RESET
    );
    println!(
        "Tags analyzed: {}  Similar groups: {}",
        report.usage_analysis.len(),
        report.similar_groups.len()
    );
    println!();

    if report.suggestions.is_empty() {
        println!("{}No similar tag names found.{}", GREEN, RESET);
    }

    for (i, suggestion) in report.suggestions.iter().enumerate() {
        print!("{}[{}]{} ", BOLD, i + 1, RESET);
        print_suggestion(suggestion);

        let last_used = report
            .usage_analysis
            .get(&suggestion.primary_tag.id)
            .and_then(|r| r.last_used_timestamp.as_deref());
        if let Some(last_used) = last_used {
            println!("    {}primary last used {}{}", DIM, last_used, RESET);
        }
        println!();
    }

    if !failed_lookups.is_empty() {
        println!(
            "{}Usage lookup failed for {} tag(s):{}",
            YELLOW,
            failed_lookups.len(),
            RESET
        );
        for (id, error) in failed_lookups.iter().take(10) {
            println!("  {}#{}{}: {}", DIM, id, RESET, error);
        }
        if failed_lookups.len() > 10 {
            println!("  {}... and {} more{}", DIM, failed_lookups.len() - 10, RESET);
        }
    }
}

/// Prints one suggestion: the primary tag, its secondaries and the confidence.
pub fn print_suggestion(suggestion: &ConsolidationSuggestion) {
    let color = confidence_color(suggestion.confidence);
    println!(
        "{} {}({:.0}% confidence){}",
        suggestion.reason,
        color,
        suggestion.confidence * 100.0,
        RESET
    );
    println!(
        "    keep   {}{}{} #{} ({} documents)",
        BOLD,
        suggestion.primary_tag.name,
        RESET,
        suggestion.primary_tag.id,
        suggestion.primary_tag.document_count
    );
    for secondary in &suggestion.secondary_tags {
        println!(
            "    merge  {} #{} ({} documents)",
            secondary.name, secondary.id, secondary.document_count
        );
    }
}

/// Prints the outcome of a consolidation run.
pub fn print_consolidation_result(result: &ConsolidationResult) {
    if result.success {
        println!("{}Consolidation succeeded{}", GREEN, RESET);
    } else {
        println!("{}Consolidation finished with errors{}", RED, RESET);
    }
    println!("Documents updated: {}", result.documents_updated);
    if result.unprocessed_documents > 0 {
        println!(
            "{}Documents not re-tagged (beyond the first page): {}{}",
            YELLOW, result.unprocessed_documents, RESET
        );
    }

    if !result.deleted_tags.is_empty() {
        let deleted: Vec<String> = result.deleted_tags.iter().map(|id| format!("#{id}")).collect();
        println!("Tags deleted: {}", deleted.join(", "));
    }

    for failure in &result.errors {
        let subject = match failure {
            ConsolidationFailure::Document { document_id, .. } => format!("document #{document_id}"),
            ConsolidationFailure::Tag { tag_id, .. } => format!("tag #{tag_id}"),
            ConsolidationFailure::Run { .. } => "run".to_string(),
        };
        println!("  {}{}{}: {}", RED, subject, RESET, failure.message());
    }
}

/// Asks before merging; anything but "y" or "yes" declines.
pub fn confirm_consolidation() -> bool {
    print!("\nMerge and delete the secondary tags? This can't be undone. [y/N] ");
    if io::stdout().flush().is_err() {
        return false;
    }

    let mut input = String::new();
    if io::stdin().read_line(&mut input).is_err() {
        return false;
    }

    matches!(input.trim().to_lowercase().as_str(), "y" | "yes")
}

fn confidence_color(confidence: f64) -> &'static str {
    if confidence >= 0.8 {
        GREEN
    } else if confidence >= 0.5 {
        YELLOW
    } else {
        RED
    }
}
