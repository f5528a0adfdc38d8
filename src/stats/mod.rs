//! Portfolio statistics over extracted holdings.

use crate::holdings::ExportTable;
use serde::{Deserialize, Serialize};

/// HHI below this is a diversified portfolio
const HHI_LOW: f64 = 1500.0;
/// HHI below this (and at least `HHI_LOW`) is moderately concentrated
const HHI_MODERATE: f64 = 2500.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Concentration {
    Low,
    Moderate,
    High,
}

impl Concentration {
    pub fn from_hhi(hhi: f64) -> Self {
        if hhi < HHI_LOW {
            Self::Low
        } else if hhi < HHI_MODERATE {
            Self::Moderate
        } else {
            Self::High
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Low => "Low concentration",
            Self::Moderate => "Moderate concentration",
            Self::High => "High concentration",
        }
    }
}

/// Value held in one asset class
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetClassAllocation {
    pub asset_class: String,
    pub value: f64,
    /// 0.0 - 100.0
    pub share: f64,
}

/// Summary statistics; only holdings with a known value are counted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioStats {
    pub count: usize,
    pub total_value: f64,
    pub average_value: f64,
    pub median_value: f64,
    pub min_value: f64,
    pub max_value: f64,
    /// Share of the five largest holdings, 0.0 - 100.0
    pub top5_share: f64,
    /// Share of the ten largest holdings, 0.0 - 100.0
    pub top10_share: f64,
    /// Herfindahl-Hirschman index on a 0 - 10000 scale
    pub hhi: f64,
    pub concentration: Concentration,
    pub allocation: Vec<AssetClassAllocation>,
}

/// Calculate statistics for a table.
///
/// Returns `None` when no holding has a positive total value.
pub fn calculate_stats(table: &ExportTable) -> Option<PortfolioStats> {
    let valued: Vec<(&str, f64)> = table
        .iter()
        .filter_map(|r| r.current_value.map(|v| (r.asset_class.as_str(), v)))
        .collect();

    let total_value: f64 = valued.iter().map(|(_, v)| v).sum();
    if valued.is_empty() || total_value <= 0.0 {
        return None;
    }

    let mut values: Vec<f64> = valued.iter().map(|(_, v)| *v).collect();
    values.sort_by(|a, b| b.total_cmp(a));

    let count = values.len();
    let median_value = if count % 2 == 0 {
        (values[count / 2 - 1] + values[count / 2]) / 2.0
    } else {
        values[count / 2]
    };

    let top_share = |n: usize| values.iter().take(n).sum::<f64>() / total_value * 100.0;
    let hhi = values
        .iter()
        .map(|v| (v / total_value * 100.0).powi(2))
        .sum::<f64>();

    // Group in first appearance order, then order by value
    let mut allocation: Vec<AssetClassAllocation> = Vec::new();
    for (asset_class, value) in &valued {
        match allocation.iter_mut().find(|a| a.asset_class == *asset_class) {
            Some(existing) => existing.value += value,
            None => allocation.push(AssetClassAllocation {
                asset_class: asset_class.to_string(),
                value: *value,
                share: 0.0,
            }),
        }
    }
    for entry in &mut allocation {
        entry.share = entry.value / total_value * 100.0;
    }
    allocation.sort_by(|a, b| b.value.total_cmp(&a.value));

    Some(PortfolioStats {
        count,
        total_value,
        average_value: total_value / count as f64,
        median_value,
        min_value: values[count - 1],
        max_value: values[0],
        top5_share: top_share(5),
        top10_share: top_share(10),
        hhi,
        concentration: Concentration::from_hhi(hhi),
        allocation,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::holdings::HoldingRecord;

    fn holding(name: &str, class: &str, value: Option<f64>) -> HoldingRecord {
        HoldingRecord {
            fund_name: name.to_string(),
            asset_class: class.to_string(),
            allocation_percent: None,
            current_value: value,
            shares: None,
            price_per_share: None,
        }
    }

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_basic_stats() {
        let table = ExportTable::new(vec![
            holding("A", "Equity", Some(600.0)),
            holding("B", "Fixed Income", Some(300.0)),
            holding("C", "Equity", Some(100.0)),
            holding("D", "Cash", None),
        ]);
        let stats = calculate_stats(&table).unwrap();

        assert_eq!(stats.count, 3);
        assert!(approx(stats.total_value, 1000.0));
        assert!(approx(stats.median_value, 300.0));
        assert!(approx(stats.min_value, 100.0));
        assert!(approx(stats.max_value, 600.0));
        assert!(approx(stats.top5_share, 100.0));
        // 60^2 + 30^2 + 10^2
        assert!(approx(stats.hhi, 4600.0));
        assert_eq!(stats.concentration, Concentration::High);

        assert_eq!(stats.allocation.len(), 2);
        assert_eq!(stats.allocation[0].asset_class, "Equity");
        assert!(approx(stats.allocation[0].share, 70.0));
        assert_eq!(stats.allocation[1].asset_class, "Fixed Income");
    }

    #[test]
    fn test_even_count_median() {
        let table = ExportTable::new(
            (1..=10)
                .map(|i| holding(&format!("F{}", i), "Equity", Some(100.0)))
                .collect(),
        );
        let stats = calculate_stats(&table).unwrap();
        assert!(approx(stats.median_value, 100.0));
        assert!(approx(stats.top5_share, 50.0));
        assert!(approx(stats.hhi, 1000.0));
        assert_eq!(stats.concentration, Concentration::Low);
    }

    #[test]
    fn test_no_values() {
        let table = ExportTable::new(vec![holding("A", "Equity", None)]);
        assert!(calculate_stats(&table).is_none());
        assert!(calculate_stats(&ExportTable::default()).is_none());
    }

    #[test]
    fn test_concentration_thresholds() {
        assert_eq!(Concentration::from_hhi(1499.9), Concentration::Low);
        assert_eq!(Concentration::from_hhi(1500.0), Concentration::Moderate);
        assert_eq!(Concentration::from_hhi(2500.0), Concentration::High);
    }
}
