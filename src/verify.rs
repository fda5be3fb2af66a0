//! Data Source Verification Module
//!
//! Probes every configured sample point against the live APIs to find out
//! which ones answer and which fields they actually return. Run it before
//! changing the sample point grid or the requested fields.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::error::Error;

use crate::config::MonitorConfig;
use crate::ingest::open_meteo::{self, Endpoints};
use crate::model::{Reading, SamplePoint, SourceError, SourceKind};
use crate::sample_points;

// ============================================================================
// Verification Results
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationReport {
    pub timestamp: String,
    pub sources: Vec<SourceVerification>,
    pub summary: VerificationSummary,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceVerification {
    pub source: SourceKind,
    pub points: Vec<PointVerification>,
    pub total: usize,
    pub working: usize,
    pub failed: usize,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VerificationSummary {
    pub total: usize,
    pub working: usize,
    pub failed: usize,
}

impl VerificationSummary {
    pub fn success_rate(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.working as f64 / self.total as f64 * 100.0
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PointVerification {
    pub point_id: String,
    pub name: String,
    pub status: VerificationStatus,
    pub fields_available: Vec<String>,
    pub fields_missing: Vec<String>,
    pub error_message: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum VerificationStatus {
    Success,
    PartialSuccess,
    Failed,
}

// ============================================================================
// Per-point verification
// ============================================================================

/// Grades one point's fetch outcome.
///
/// Every requested field present is a success, some present is partial,
/// none present (or an error) is a failure.
pub fn grade_point(point: &SamplePoint, outcome: Result<Vec<Reading>, SourceError>) -> PointVerification {
    let mut result = PointVerification {
        point_id: point.id.to_string(),
        name: point.name.to_string(),
        status: VerificationStatus::Failed,
        fields_available: Vec::new(),
        fields_missing: Vec::new(),
        error_message: None,
    };

    match outcome {
        Ok(readings) => {
            for reading in &readings {
                let field = open_meteo::field_name(reading.phenomenon).to_string();
                if reading.value.is_some() {
                    result.fields_available.push(field);
                } else {
                    result.fields_missing.push(field);
                }
            }
            if !result.fields_available.is_empty() {
                result.status = if result.fields_missing.is_empty() {
                    VerificationStatus::Success
                } else {
                    VerificationStatus::PartialSuccess
                };
            } else {
                result.error_message = Some("no requested field carried a value".to_string());
            }
        }
        Err(e) => {
            result.error_message = Some(e.to_string());
        }
    }

    result
}

pub fn verify_point(
    client: &reqwest::blocking::Client,
    endpoints: &Endpoints,
    kind: SourceKind,
    point: &SamplePoint,
) -> PointVerification {
    grade_point(point, open_meteo::fetch_current(client, endpoints, kind, &point.coordinate))
}

pub fn verify_source(
    client: &reqwest::blocking::Client,
    endpoints: &Endpoints,
    kind: SourceKind,
) -> SourceVerification {
    println!("\nVerifying {} source...", kind);
    let mut verification = SourceVerification {
        source: kind,
        points: Vec::new(),
        total: 0,
        working: 0,
        failed: 0,
    };

    for point in sample_points::points_for(kind) {
        print!("  {} ... ", point.id);
        let result = verify_point(client, endpoints, kind, point);
        match result.status {
            VerificationStatus::Success => {
                println!("OK ({} fields)", result.fields_available.len());
                verification.working += 1;
            }
            VerificationStatus::PartialSuccess => {
                println!("Partial (missing: {:?})", result.fields_missing);
                verification.working += 1;
            }
            VerificationStatus::Failed => {
                println!("FAILED: {}", result.error_message.as_deref().unwrap_or("Unknown"));
                verification.failed += 1;
            }
        }
        verification.total += 1;
        verification.points.push(result);
    }

    verification
}

// ============================================================================
// Full run
// ============================================================================

pub fn summarize(sources: &[SourceVerification]) -> VerificationSummary {
    sources.iter().fold(VerificationSummary::default(), |mut acc, s| {
        acc.total += s.total;
        acc.working += s.working;
        acc.failed += s.failed;
        acc
    })
}

pub fn run_full_verification(config: &MonitorConfig) -> Result<VerificationReport, Box<dyn Error>> {
    let client = config.http.build_client()?;
    let endpoints = Endpoints::from(&config.http);

    let sources: Vec<SourceVerification> = SourceKind::ALL
        .into_iter()
        .map(|kind| verify_source(&client, &endpoints, kind))
        .collect();
    let summary = summarize(&sources);

    Ok(VerificationReport {
        timestamp: Utc::now().to_rfc3339(),
        sources,
        summary,
    })
}

pub fn print_summary(report: &VerificationReport) {
    let rule = "=".repeat(60);
    println!("\n{}", rule);
    println!("VERIFICATION SUMMARY");
    println!("{}", rule);
    println!();
    for source in &report.sources {
        println!(
            "{:<10} {}/{} working  ({} failed)",
            source.source.as_str(),
            source.working,
            source.total,
            source.failed
        );
    }
    println!();
    println!(
        "Overall Success Rate: {:.1}% ({}/{})",
        report.summary.success_rate(),
        report.summary.working,
        report.summary.total
    );
    println!("{}", rule);
}
