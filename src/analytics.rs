use serde::Serialize;
use std::cmp::Ordering;

use crate::record::{DepartmentCount, StudentRecord, SubjectResult, MAX_SUBJECTS};

/// Display cut applied to subject labels when the caller asks for the
/// legacy truncated form.
pub const LABEL_DISPLAY_LEN: usize = 20;

const SKEW_BALANCE_BAND: f64 = 0.5;

pub fn round1(x: f64) -> f64 {
    (x * 10.0).round() / 10.0
}

pub fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Stats {
    pub avg: f64,
    pub min: f64,
    pub max: f64,
    pub median: f64,
}

impl Stats {
    pub fn zero() -> Self {
        Stats {
            avg: 0.0,
            min: 0.0,
            max: 0.0,
            median: 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceMetrics {
    pub total: Stats,
    pub external: Stats,
    pub internal: Stats,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectPassFail {
    pub subject: String,
    pub passed: usize,
    pub failed: usize,
    pub total: usize,
    /// None when no record carries a P or F for this slot; callers must
    /// render the undefined case instead of showing 0.
    pub rate: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectAverage {
    pub subject: String,
    pub code: String,
    pub average: f64,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Performer {
    pub name: String,
    pub marks: f64,
    pub seat: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Performers {
    pub top: Vec<Performer>,
    pub bottom: Vec<Performer>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum SkewShape {
    RightSkewed,
    LeftSkewed,
    Balanced,
}

impl SkewShape {
    pub fn classify(skew: f64) -> Self {
        if skew > SKEW_BALANCE_BAND {
            SkewShape::RightSkewed
        } else if skew < -SKEW_BALANCE_BAND {
            SkewShape::LeftSkewed
        } else {
            SkewShape::Balanced
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DistributionMetrics {
    pub median: f64,
    pub standard_deviation: f64,
    pub largest_dept: DepartmentCount,
    pub smallest_dept: DepartmentCount,
    /// None when fewer than three departments exist or every count is
    /// identical; the coefficient divides by zero otherwise.
    pub skew: Option<f64>,
    pub skew_shape: Option<SkewShape>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardModel {
    pub performance: PerformanceMetrics,
    pub pass_fail: Vec<SubjectPassFail>,
    pub subject_averages: Vec<SubjectAverage>,
    pub performers: Performers,
    pub distribution: Option<DistributionMetrics>,
}

pub fn compute_median(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
    let n = sorted.len();
    if n % 2 == 1 {
        sorted[n / 2]
    } else {
        (sorted[(n / 2) - 1] + sorted[n / 2]) / 2.0
    }
}

pub fn compute_stats(values: &[f64]) -> Stats {
    if values.is_empty() {
        return Stats::zero();
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
    let n = sorted.len();
    Stats {
        avg: values.iter().sum::<f64>() / (n as f64),
        min: sorted[0],
        max: sorted[n - 1],
        median: if n % 2 == 1 {
            sorted[n / 2]
        } else {
            (sorted[(n / 2) - 1] + sorted[n / 2]) / 2.0
        },
    }
}

pub fn compute_performance_metrics(records: &[StudentRecord]) -> PerformanceMetrics {
    let totals: Vec<f64> = records.iter().filter_map(|r| r.total_marks).collect();
    let externals: Vec<f64> = records.iter().filter_map(|r| r.external_marks).collect();
    let internals: Vec<f64> = records.iter().filter_map(|r| r.internal_marks).collect();
    PerformanceMetrics {
        total: compute_stats(&totals),
        external: compute_stats(&externals),
        internal: compute_stats(&internals),
    }
}

/// First present value wins, scanning records in their original order.
fn resolve_label<'a, F>(records: &'a [StudentRecord], slot: usize, present: F) -> Option<&'a str>
where
    F: Fn(&StudentRecord, usize) -> bool,
{
    records
        .iter()
        .filter(|r| present(r, slot))
        .filter_map(|r| r.slot(slot).and_then(|s| s.subject_name.as_deref()))
        .next()
}

fn result_at(record: &StudentRecord, slot: usize) -> Option<&SubjectResult> {
    record.slot(slot).and_then(|s| s.result.as_ref())
}

fn mark_at(record: &StudentRecord, slot: usize) -> Option<f64> {
    record.slot(slot).and_then(|s| s.total_marks)
}

pub fn pass_fail_analysis(records: &[StudentRecord]) -> Vec<SubjectPassFail> {
    let mut out: Vec<SubjectPassFail> = Vec::new();
    for slot in 0..MAX_SUBJECTS {
        let present = records.iter().filter(|r| result_at(r, slot).is_some()).count();
        if present == 0 {
            continue;
        }

        let label = resolve_label(records, slot, |r, s| result_at(r, s).is_some())
            .map(|s| s.to_string())
            .unwrap_or_else(|| format!("Subject {}", slot + 1));

        let passed = records
            .iter()
            .filter(|r| result_at(r, slot) == Some(&SubjectResult::Pass))
            .count();
        let failed = records
            .iter()
            .filter(|r| result_at(r, slot) == Some(&SubjectResult::Fail))
            .count();
        let counted = passed + failed;
        let rate = if counted > 0 {
            Some(round1((passed as f64) / (counted as f64) * 100.0))
        } else {
            None
        };

        let entry = SubjectPassFail {
            subject: label,
            passed,
            failed,
            total: counted,
            rate,
        };
        // Same label appearing at two slot indexes: keep the first position,
        // let the later slot's numbers win.
        if let Some(existing) = out.iter_mut().find(|e| e.subject == entry.subject) {
            *existing = entry;
        } else {
            out.push(entry);
        }
    }
    out
}

pub fn subject_averages(records: &[StudentRecord], truncate_labels: bool) -> Vec<SubjectAverage> {
    let mut keyed: Vec<(String, SubjectAverage)> = Vec::new();
    for slot in 0..MAX_SUBJECTS {
        let marks: Vec<f64> = records.iter().filter_map(|r| mark_at(r, slot)).collect();
        if marks.is_empty() {
            continue;
        }

        let label = resolve_label(records, slot, |r, s| mark_at(r, s).is_some())
            .map(|s| s.to_string())
            .unwrap_or_else(|| format!("Subject {}", slot + 1));
        let code = records
            .iter()
            .filter(|r| mark_at(r, slot).is_some())
            .filter_map(|r| r.slot(slot).and_then(|s| s.subject_code.as_deref()))
            .next()
            .unwrap_or("")
            .to_string();

        let entry = SubjectAverage {
            subject: label.clone(),
            code,
            average: round2(marks.iter().sum::<f64>() / (marks.len() as f64)),
            count: marks.len(),
        };
        // Dedupe on the full label even when output labels are truncated.
        if let Some((_, existing)) = keyed.iter_mut().find(|(k, _)| *k == label) {
            *existing = entry;
        } else {
            keyed.push((label, entry));
        }
    }

    keyed
        .into_iter()
        .map(|(_, mut entry)| {
            if truncate_labels {
                entry.subject = entry.subject.chars().take(LABEL_DISPLAY_LEN).collect();
            }
            entry
        })
        .collect()
}

pub fn get_performers(records: &[StudentRecord], count: usize) -> Performers {
    let mut ranked: Vec<Performer> = records
        .iter()
        .filter_map(|r| {
            r.total_marks.map(|marks| Performer {
                name: r.name.clone(),
                marks,
                seat: r.seat_number.clone(),
            })
        })
        .collect();
    // Stable sort: equal marks keep their original relative order.
    ranked.sort_by(|a, b| b.marks.partial_cmp(&a.marks).unwrap_or(Ordering::Equal));

    let take = count.min(ranked.len());
    let top = ranked[..take].to_vec();
    let mut bottom = ranked[ranked.len() - take..].to_vec();
    bottom.reverse();
    // Top and bottom overlap when 2*count exceeds the ranked population.
    Performers { top, bottom }
}

pub fn department_counts(records: &[StudentRecord]) -> Vec<DepartmentCount> {
    let mut out: Vec<DepartmentCount> = Vec::new();
    for record in records {
        let department = record.department.as_deref().unwrap_or("Unknown");
        if let Some(entry) = out.iter_mut().find(|d| d.department == department) {
            entry.total_students += 1;
        } else {
            out.push(DepartmentCount {
                department: department.to_string(),
                total_students: 1,
            });
        }
    }
    out
}

/// Population standard deviation (divisor n). Pinned to 0.0 for empty input.
pub fn std_dev(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    variance.sqrt()
}

/// Adjusted Fisher–Pearson skewness coefficient:
/// g1 = (n / ((n-1)(n-2))) * sum(((x - mean) / sd)^3).
/// None when n < 3 or the deviation is zero.
pub fn skewness(values: &[f64]) -> Option<f64> {
    let n = values.len();
    if n < 3 {
        return None;
    }
    let sd = std_dev(values);
    if sd == 0.0 {
        return None;
    }
    let nf = n as f64;
    let mean = values.iter().sum::<f64>() / nf;
    let cube_sum: f64 = values.iter().map(|v| ((v - mean) / sd).powi(3)).sum();
    Some(nf / ((nf - 1.0) * (nf - 2.0)) * cube_sum)
}

pub fn distribution_metrics(departments: &[DepartmentCount]) -> Option<DistributionMetrics> {
    let first = departments.first()?;
    let counts: Vec<f64> = departments.iter().map(|d| d.total_students as f64).collect();

    // Reduce with strict comparisons: ties keep the first-encountered
    // department.
    let mut largest = first;
    let mut smallest = first;
    for d in &departments[1..] {
        if d.total_students > largest.total_students {
            largest = d;
        }
        if d.total_students < smallest.total_students {
            smallest = d;
        }
    }

    let skew = skewness(&counts);
    Some(DistributionMetrics {
        median: compute_median(&counts),
        standard_deviation: std_dev(&counts),
        largest_dept: largest.clone(),
        smallest_dept: smallest.clone(),
        skew,
        skew_shape: skew.map(SkewShape::classify),
    })
}

pub fn compute_dashboard(
    records: &[StudentRecord],
    performer_count: usize,
    truncate_labels: bool,
) -> DashboardModel {
    DashboardModel {
        performance: compute_performance_metrics(records),
        pass_fail: pass_fail_analysis(records),
        subject_averages: subject_averages(records, truncate_labels),
        performers: get_performers(records, performer_count),
        distribution: distribution_metrics(&department_counts(records)),
    }
}
