//! Lot development economics.
//!
//! A simple lot-count projection: density times acreage gives the lot
//! count, a flat per-lot cost gives the development budget.

use crate::models::{LotEconomics, PropertyRecord, LAND_AREA, PRICE};

/// Inputs to the lot projection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LotAssumptions {
    pub lots_per_acre: f64,
    pub development_cost_per_lot: f64,
}

impl Default for LotAssumptions {
    fn default() -> Self {
        Self {
            lots_per_acre: 3.5,
            development_cost_per_lot: 55_000.0,
        }
    }
}

impl From<&crate::config::AnalysisConfig> for LotAssumptions {
    fn from(config: &crate::config::AnalysisConfig) -> Self {
        Self {
            lots_per_acre: config.lots_per_acre,
            development_cost_per_lot: config.development_cost_per_lot,
        }
    }
}

/// Project lot economics for a record.
///
/// Returns `None` when acreage is missing or not numeric. A missing price
/// counts as zero.
pub fn lot_economics(record: &PropertyRecord, assumptions: &LotAssumptions) -> Option<LotEconomics> {
    let acres = record.number(LAND_AREA)?;
    let price = record.number(PRICE).unwrap_or(0.0);

    let total_lots = assumptions.lots_per_acre * acres;
    let development_cost = assumptions.development_cost_per_lot * total_lots;
    let total_investment = price + development_cost;
    let cost_per_lot_all_in = (total_lots > 0.0).then(|| total_investment / total_lots);

    Some(LotEconomics {
        acres,
        price,
        lots_per_acre: assumptions.lots_per_acre,
        development_cost_per_lot: assumptions.development_cost_per_lot,
        total_lots,
        development_cost,
        total_investment,
        cost_per_lot_all_in,
    })
}

/// Format a dollar amount with thousands separators, no cents.
pub fn format_usd(amount: f64) -> String {
    let rounded = amount.round() as i64;
    let digits = rounded.unsigned_abs().to_string();
    let mut grouped = String::new();
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if rounded < 0 {
        format!("-${}", grouped)
    } else {
        format!("${}", grouped)
    }
}

/// Render the projection as prompt-ready bullet lines.
pub fn render(economics: &LotEconomics) -> String {
    let mut out = String::new();
    out.push_str(&format!("- Lot Density: {} lots per acre\n", economics.lots_per_acre));
    out.push_str(&format!("- Total Potential Lots: {:.1}\n", economics.total_lots));
    out.push_str(&format!(
        "- Development Cost: {} per lot\n",
        format_usd(economics.development_cost_per_lot)
    ));
    out.push_str(&format!(
        "- Total Development Cost: {}\n",
        format_usd(economics.development_cost)
    ));
    out.push_str(&format!(
        "- Total Lot Investment: {}\n",
        format_usd(economics.total_investment)
    ));
    if let Some(per_lot) = economics.cost_per_lot_all_in {
        out.push_str(&format!("- All-in Cost per Lot: {}\n", format_usd(per_lot)));
    }
    out
}
