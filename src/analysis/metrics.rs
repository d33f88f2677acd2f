//! Key metric extraction for the property snapshot.

use crate::models::{PropertyRecord, COUNTY_NAME, LAND_AREA, PRICE};

pub const MEDIAN_HOME_VALUE_5M: &str = "2024 Median Home Value(5m)";
pub const MEDIAN_HH_INCOME_5M: &str = "2024 Med HH Inc(5m)";

/// `(label, column)` pairs in snapshot order.
const SNAPSHOT: &[(&str, &str)] = &[
    ("For Sale Price", PRICE),
    ("Land Area (acres)", LAND_AREA),
    ("Zoning", "Zoning"),
    ("County", COUNTY_NAME),
    ("Proposed Land Use", "Proposed Land Use"),
    ("Home Affordability Score", "Home_Affordability"),
    ("Rent Affordability Score", "Rent_Affordability"),
    ("Population Growth 2020-2024 (5mi, %)", "% Pop Grwth 2020-2024(5m)"),
    ("Projected Growth 2024-2029 (5mi, %)", "% Pop Grwth 2024-2029(5m)"),
    ("2024 Population (5mi)", "2024 Population(5m)"),
    ("2024 Median Home Value (5mi)", MEDIAN_HOME_VALUE_5M),
    ("2024 Median HH Income (5mi)", MEDIAN_HH_INCOME_5M),
    ("Convenience Index", "Convenience_Index"),
    ("Population Access", "Population_Access"),
    ("Composite Score", "Composite_Score"),
];

/// Ordered snapshot rows. Missing values read `N/A`.
pub fn key_metrics(record: &PropertyRecord) -> Vec<(String, String)> {
    let mut rows: Vec<(String, String)> = SNAPSHOT
        .iter()
        .map(|(label, column)| (label.to_string(), record.text(column)))
        .collect();

    if let Some(ratio) = affordability_ratio(record) {
        rows.push((
            "Home Value to Income Ratio".to_string(),
            format!("{:.2}", ratio),
        ));
    }

    rows
}

/// Median home value divided by median household income (5-mile radius).
pub fn affordability_ratio(record: &PropertyRecord) -> Option<f64> {
    let value = record.number(MEDIAN_HOME_VALUE_5M)?;
    let income = record.number(MEDIAN_HH_INCOME_5M)?;
    if income == 0.0 {
        return None;
    }
    Some(value / income)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CellValue;

    fn record(value: CellValue, income: CellValue) -> PropertyRecord {
        PropertyRecord::new(vec![
            (PRICE.to_string(), CellValue::Text("$500,000".to_string())),
            (MEDIAN_HOME_VALUE_5M.to_string(), value),
            (MEDIAN_HH_INCOME_5M.to_string(), income),
        ])
    }

    #[test]
    fn test_affordability_ratio() {
        let r = record(CellValue::Number(400_000.0), CellValue::Number(80_000.0));
        assert_eq!(affordability_ratio(&r), Some(5.0));

        let r = record(CellValue::Number(400_000.0), CellValue::Number(0.0));
        assert_eq!(affordability_ratio(&r), None);

        let r = record(CellValue::Empty, CellValue::Number(80_000.0));
        assert_eq!(affordability_ratio(&r), None);
    }

    #[test]
    fn test_key_metrics() {
        let r = record(CellValue::Number(400_000.0), CellValue::Number(80_000.0));
        let rows = key_metrics(&r);

        assert_eq!(rows[0], ("For Sale Price".to_string(), "$500,000".to_string()));
        assert_eq!(rows[2].1, "N/A");
        assert_eq!(
            rows.last().unwrap(),
            &("Home Value to Income Ratio".to_string(), "5.00".to_string())
        );
    }
}
