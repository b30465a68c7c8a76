//! Z-score anomaly detection
//!
//! Income and expense transactions form separate cohorts. Within each cohort a
//! transaction whose amount sits more than `low_z` standard deviations from the
//! cohort mean is reported, graded by how far out it is.

use std::cmp::Ordering;

use serde::Serialize;

use crate::config::AnomalyConfig;
use crate::models::{Transaction, TransactionType};

use super::outcome::Outcome;
use super::stats::{mean, round_to, std_dev, z_score};

/// How far outside the cohort a transaction is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    High,
    Medium,
    Low,
}

impl Severity {
    /// Sort rank, most severe first
    pub fn rank(&self) -> u8 {
        match self {
            Self::High => 0,
            Self::Medium => 1,
            Self::Low => 2,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AnomalyType {
    UnusualAmount,
    UnusualHighIncome,
    UnusualLowIncome,
}

/// One unusual transaction
#[derive(Debug, Clone, Serialize)]
pub struct AnomalyFinding {
    /// Id of the flagged transaction
    pub id: i64,
    pub transaction: Transaction,
    pub anomaly_type: AnomalyType,
    pub severity: Severity,
    /// Rounded to two decimals
    pub z_score: f64,
    pub description: String,
    /// Cohort mean
    pub mean: f64,
    /// Cohort population standard deviation
    #[serde(rename = "stdDev")]
    pub std_dev: f64,
    /// Rounded percentage above (or below) the cohort mean; expenses only
    #[serde(rename = "deviationPercent", skip_serializing_if = "Option::is_none")]
    pub deviation_percent: Option<i64>,
}

/// Counts over every finding, before truncation
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnomalyStatistics {
    pub total_transactions: usize,
    pub anomaly_count: usize,
    pub high_severity: usize,
    pub medium_severity: usize,
    pub low_severity: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct AnomalyReport {
    pub anomalies: Vec<AnomalyFinding>,
    pub statistics: AnomalyStatistics,
}

/// Detects unusually large or small transactions
pub struct AnomalyDetector {
    config: AnomalyConfig,
}

impl Default for AnomalyDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl AnomalyDetector {
    pub fn new() -> Self {
        Self {
            config: AnomalyConfig::default(),
        }
    }

    pub fn with_config(config: AnomalyConfig) -> Self {
        Self { config }
    }

    /// Classify an absolute z-score (strict inequalities)
    pub fn classify(&self, abs_z: f64) -> Option<Severity> {
        if abs_z > self.config.high_z {
            Some(Severity::High)
        } else if abs_z > self.config.medium_z {
            Some(Severity::Medium)
        } else if abs_z > self.config.low_z {
            Some(Severity::Low)
        } else {
            None
        }
    }

    /// Run detection over a user's recent transactions
    pub fn detect(&self, transactions: &[Transaction]) -> Outcome<AnomalyReport> {
        if transactions.len() < self.config.min_transactions {
            return Outcome::insufficient(format!(
                "At least {} transactions are needed to detect anomalies",
                self.config.min_transactions
            ));
        }

        let mut findings = Vec::new();
        for cohort in [TransactionType::Expense, TransactionType::Income] {
            let members: Vec<&Transaction> = transactions
                .iter()
                .filter(|t| t.transaction_type == cohort)
                .collect();
            if members.len() < self.config.min_cohort_size {
                continue;
            }
            findings.extend(self.scan_cohort(cohort, &members));
        }

        findings.sort_by(|a, b| {
            a.severity
                .rank()
                .cmp(&b.severity.rank())
                .then_with(|| b.transaction.date.cmp(&a.transaction.date))
                .then_with(|| b.id.cmp(&a.id))
        });

        let statistics = AnomalyStatistics {
            total_transactions: transactions.len(),
            anomaly_count: findings.len(),
            high_severity: count_severity(&findings, Severity::High),
            medium_severity: count_severity(&findings, Severity::Medium),
            low_severity: count_severity(&findings, Severity::Low),
        };

        tracing::debug!(
            transactions = transactions.len(),
            anomalies = findings.len(),
            "Anomaly detection complete"
        );

        findings.truncate(self.config.max_results);
        Outcome::Ready(AnomalyReport {
            anomalies: findings,
            statistics,
        })
    }

    fn scan_cohort(&self, cohort: TransactionType, members: &[&Transaction]) -> Vec<AnomalyFinding> {
        let amounts: Vec<f64> = members.iter().map(|t| t.amount).collect();
        let cohort_mean = mean(&amounts);
        let cohort_std = std_dev(&amounts, cohort_mean);

        members
            .iter()
            .filter_map(|tx| {
                let z = z_score(tx.amount, cohort_mean, cohort_std);
                let severity = self.classify(z.abs())?;

                let (anomaly_type, description, deviation_percent) = match cohort {
                    TransactionType::Expense => {
                        let pct = if cohort_mean > 0.0 {
                            ((tx.amount - cohort_mean) / cohort_mean * 100.0).round() as i64
                        } else {
                            0
                        };
                        let direction = if pct >= 0 { "above" } else { "below" };
                        (
                            AnomalyType::UnusualAmount,
                            format!(
                                "{}% {} average ({:.2})",
                                pct.abs(),
                                direction,
                                cohort_mean
                            ),
                            Some(pct),
                        )
                    }
                    TransactionType::Income if z > 0.0 => (
                        AnomalyType::UnusualHighIncome,
                        "Unusually high income".to_string(),
                        None,
                    ),
                    TransactionType::Income => (
                        AnomalyType::UnusualLowIncome,
                        "Income significantly below average".to_string(),
                        None,
                    ),
                };

                Some(AnomalyFinding {
                    id: tx.id,
                    transaction: (*tx).clone(),
                    anomaly_type,
                    severity,
                    z_score: round_to(z, 2),
                    description,
                    mean: cohort_mean,
                    std_dev: cohort_std,
                    deviation_percent,
                })
            })
            .collect()
    }
}

fn count_severity(findings: &[AnomalyFinding], severity: Severity) -> usize {
    findings.iter().filter(|f| f.severity == severity).count()
}

impl PartialOrd for Severity {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Severity {
    /// Greater means more severe
    fn cmp(&self, other: &Self) -> Ordering {
        other.rank().cmp(&self.rank())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::fixtures::{expense, income};

    fn expenses(amounts: &[f64]) -> Vec<Transaction> {
        amounts
            .iter()
            .enumerate()
            .map(|(i, &a)| expense(1, a, &format!("2024-03-{:02}", i + 1)))
            .collect()
    }

    #[test]
    fn test_requires_five_transactions() {
        let detector = AnomalyDetector::new();
        let outcome = detector.detect(&expenses(&[10.0, 20.0, 30.0, 40.0]));
        assert_eq!(
            outcome.message(),
            Some("At least 5 transactions are needed to detect anomalies")
        );
    }

    #[test]
    fn test_zero_spread_cohort_has_no_findings() {
        let detector = AnomalyDetector::new();
        let report = detector
            .detect(&expenses(&[50.0; 8]))
            .ready()
            .unwrap();
        assert!(report.anomalies.is_empty());
        assert_eq!(report.statistics.total_transactions, 8);
    }

    #[test]
    fn test_boundary_case_is_not_flagged() {
        // mean 180, stdDev 160, z of 500 is exactly 2.0 -> not strictly above
        let detector = AnomalyDetector::new();
        let report = detector
            .detect(&expenses(&[100.0, 100.0, 100.0, 100.0, 500.0]))
            .ready()
            .unwrap();
        assert!(report.anomalies.is_empty());
    }

    #[test]
    fn test_flags_large_expense_with_description() {
        let mut amounts = vec![100.0; 20];
        amounts.push(1000.0);
        let detector = AnomalyDetector::new();
        let report = detector.detect(&expenses(&amounts)).ready().unwrap();

        assert_eq!(report.anomalies.len(), 1);
        let finding = &report.anomalies[0];
        assert_eq!(finding.anomaly_type, AnomalyType::UnusualAmount);
        assert_eq!(finding.severity, Severity::High);
        assert!(finding.z_score > 3.0);
        // mean = 3000/21 = 142.857..., (1000 - mean)/mean = 600%
        assert_eq!(finding.deviation_percent, Some(600));
        assert!(finding.description.starts_with("600% above average"));
        assert_eq!(report.statistics.high_severity, 1);
    }

    #[test]
    fn test_income_cohort_uses_binary_framing() {
        let mut txs: Vec<Transaction> = (1..=20)
            .map(|d| income(9, 1000.0, &format!("2024-03-{:02}", d)))
            .collect();
        txs.push(income(9, 100.0, "2024-03-25"));
        txs.extend(expenses(&[10.0, 20.0]));

        let report = AnomalyDetector::new().detect(&txs).ready().unwrap();
        assert_eq!(report.anomalies.len(), 1);
        let finding = &report.anomalies[0];
        assert_eq!(finding.anomaly_type, AnomalyType::UnusualLowIncome);
        assert!(finding.deviation_percent.is_none());
        assert!(finding.z_score < 0.0);
    }

    #[test]
    fn test_small_cohorts_are_skipped() {
        // Two expenses only: the expense cohort is skipped even with a wild value
        let mut txs: Vec<Transaction> = (1..=5)
            .map(|d| income(9, 1000.0, &format!("2024-03-{:02}", d)))
            .collect();
        txs.extend(expenses(&[10.0, 99999.0]));

        let report = AnomalyDetector::new().detect(&txs).ready().unwrap();
        assert!(report.anomalies.is_empty());
    }

    #[test]
    fn test_sorted_by_severity_then_date_and_truncated() {
        let config = AnomalyConfig {
            max_results: 2,
            ..Default::default()
        };
        let detector = AnomalyDetector::with_config(config);

        let start = chrono::NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let mut txs: Vec<Transaction> = (0..60)
            .map(|i| expense(1, 100.0, &(start + chrono::Duration::days(i)).to_string()))
            .collect();
        txs.push(expense(1, 600.0, "2024-01-15"));
        txs.push(expense(1, 600.0, "2024-02-20"));
        txs.push(expense(1, 600.0, "2024-01-02"));

        let report = detector.detect(&txs).ready().unwrap();
        // Statistics count everything, the list is truncated
        assert_eq!(report.statistics.anomaly_count, 3);
        assert_eq!(report.statistics.high_severity, 3);
        assert_eq!(report.anomalies.len(), 2);
        assert_eq!(report.anomalies[0].transaction.date.to_string(), "2024-02-20");
        assert_eq!(report.anomalies[1].transaction.date.to_string(), "2024-01-15");
    }

    #[test]
    fn test_deterministic() {
        let mut amounts = vec![100.0; 15];
        amounts.extend([800.0, 900.0]);
        let txs = expenses(&amounts);
        let detector = AnomalyDetector::new();

        let a = detector.detect(&txs).ready().unwrap();
        let b = detector.detect(&txs).ready().unwrap();
        let ids_a: Vec<i64> = a.anomalies.iter().map(|f| f.id).collect();
        let ids_b: Vec<i64> = b.anomalies.iter().map(|f| f.id).collect();
        assert_eq!(ids_a, ids_b);
        assert_eq!(a.statistics, b.statistics);
    }
}
