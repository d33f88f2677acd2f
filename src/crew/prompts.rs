//! Task descriptions filled in with property facts.

use super::PropertyContext;
use crate::analysis::economics::{self, format_usd, LotAssumptions};
use crate::analysis::lot_economics;
use crate::data::columns;
use crate::models::{PropertyRecord, CITY, LAND_AREA, PRICE, STATE};

const COMPARISON_CRITERIA: &[(&str, u32)] = &[
    ("Land cost per acre", 25),
    ("Location quality", 20),
    ("Development capacity", 20),
    ("Regulatory environment", 15),
    ("Market strength", 20),
];

fn snapshot_block(property: &PropertyContext) -> String {
    property
        .snapshot
        .iter()
        .map(|(label, value)| format!("- {}: {}\n", label, value))
        .collect()
}

fn economics_block(property: &PropertyContext) -> String {
    match &property.economics {
        Some(lots) => economics::render(lots),
        None => "- Lot economics unavailable: land area is missing from the data.\n".to_string(),
    }
}

fn header(property: &PropertyContext) -> String {
    format!(
        "Property: Stock# {} at {}",
        property.record.stock_number(),
        property.record.location()
    )
}

pub fn data_analysis(property: &PropertyContext) -> String {
    format!(
        "{}\n\n\
         Analyze this property's potential for attainable, higher-density residential \
         development using the data below.\n\n\
         Key metrics:\n{}\n\
         Column meanings:\n{}\n\
         Cover location quality, population and income trends, home and rent \
         affordability, site size and zoning fit, and list the top three strengths \
         and concerns.",
        header(property),
        snapshot_block(property),
        columns::render_for(&property.record),
    )
}

pub fn market_research(property: &PropertyContext) -> String {
    let research = match &property.research {
        Some(digest) => digest.render(),
        None => "Web research was skipped for this run. Draw on the property data and \
                 general knowledge of the area, and flag what needs verification.\n"
            .to_string(),
    };

    format!(
        "{}\n\n\
         Research the market around {}, {}. Assess economic development, the housing \
         market, infrastructure and utilities, zoning and government policy, and \
         community factors.\n\n\
         Research findings:\n{}",
        header(property),
        property.record.text(CITY),
        property.record.text(STATE),
        research,
    )
}

pub fn financial_analysis(property: &PropertyContext) -> String {
    format!(
        "{}\n\n\
         Evaluate the financial feasibility of subdividing this parcel into lots for \
         attainable single-family homes.\n\n\
         Key metrics:\n{}\n\
         Lot projection:\n{}\n\
         Compare the all-in cost per lot with local home values and incomes, estimate \
         absorption, and name the main financial risks.",
        header(property),
        snapshot_block(property),
        economics_block(property),
    )
}

pub fn full_report(property: &PropertyContext) -> String {
    format!(
        "{}\n\n\
         Combine the data analysis, market research and financial analysis into one \
         investment report for this property.\n\n\
         Key metrics:\n{}\n\
         Lot projection:\n{}\n\
         Use these sections: Property Overview, Market Analysis, Development Potential, \
         Financial Analysis, Risks, Recommendations.",
        header(property),
        snapshot_block(property),
        economics_block(property),
    )
}

pub fn executive_summary(property: &PropertyContext) -> String {
    format!(
        "{}\n\n\
         Write an executive summary of the analysis for a busy investor. State the \
         opportunity, the three most important facts, the main risk and a clear \
         recommendation.",
        header(property),
    )
}

pub fn investment_summary(property: &PropertyContext) -> String {
    let price = property
        .record
        .number(PRICE)
        .map(format_usd)
        .unwrap_or_else(|| "N/A".to_string());

    format!(
        "{}\n\n\
         Write a short investment summary. Asking price: {}. Summarize the opportunity, \
         strengths, risks and a verdict on whether to pursue the deal at this price.",
        header(property),
        price,
    )
}

/// Description for the property comparison task.
pub fn comparison(records: &[&PropertyRecord], assumptions: &LotAssumptions) -> String {
    let mut properties = String::new();
    for (i, record) in records.iter().enumerate() {
        properties.push_str(&format!(
            "Property {} (Stock# {}): {}\n- Size: {} acres\n- Price: {}\n- Zoning: {}\n",
            i + 1,
            record.stock_number(),
            record.location(),
            record.text(LAND_AREA),
            record
                .number(PRICE)
                .map(format_usd)
                .unwrap_or_else(|| "N/A".to_string()),
            record.text("Zoning"),
        ));
        match lot_economics(record, assumptions) {
            Some(lots) => properties.push_str(&economics::render(&lots)),
            None => properties.push_str("- Lot economics unavailable\n"),
        }
        properties.push('\n');
    }

    let criteria: String = COMPARISON_CRITERIA
        .iter()
        .map(|(name, weight)| format!("- {} ({}%)\n", name, weight))
        .collect();

    format!(
        "Compare the following properties for attainable, higher-density residential \
         development.\n\n{}\
         Score each property from 1 to 10 on these weighted criteria:\n{}\n\
         Present a comparison table, the weighted totals and a ranked recommendation.",
        properties, criteria,
    )
}
