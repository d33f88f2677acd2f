//! Descriptions of the dataset columns the agents rely on.

use crate::models::PropertyRecord;

/// `(column, description)` for the columns worth explaining to the model.
pub const COLUMN_DESCRIPTIONS: &[(&str, &str)] = &[
    ("StockNumber", "Unique identifier for each property listing"),
    ("Property Address", "Street address of the property"),
    ("City", "City where the property is located"),
    ("State", "State where the property is located"),
    ("Zip", "ZIP code of the property location"),
    ("County Name", "County where the property is located"),
    ("For Sale Price", "Listing price in USD"),
    ("Land Area (AC)", "Parcel size in acres; drives density and lot count"),
    ("Zoning", "Legal zoning classification governing allowed development"),
    ("Proposed Land Use", "Suggested or approved future use"),
    ("Last Sale Date", "Date of the last recorded sale"),
    ("Last Sale Price", "Price of the last recorded sale in USD"),
    ("In SFHA", "Whether the parcel lies in a Special Flood Hazard Area"),
    ("Fema Flood Zone", "FEMA flood zone classification (A, AE, X, ...)"),
    ("% Pop Grwth 2020-2024(5m)", "Population growth within 5 miles, 2020-2024, percent"),
    ("% Pop Grwth 2024-2029(5m)", "Projected population growth within 5 miles, 2024-2029, percent"),
    ("% Pop Grwth 2020-2024(10m)", "Population growth within 10 miles, 2020-2024, percent"),
    ("2024 Population(5m)", "Current population estimate within 5 miles"),
    ("2029 Population(5m)", "Projected population within 5 miles in 2029"),
    ("2024 Med HH Inc(5m)", "Median household income within 5 miles, 2024"),
    ("2029 Med HH Inc(5m)", "Projected median household income within 5 miles, 2029"),
    ("2024 Median Home Value(5m)", "Median home value within 5 miles, 2024"),
    ("2029 Median HH Value(5m)", "Projected median home value within 5 miles, 2029"),
    ("% HU Grwth 2020-2024(5m)", "Housing unit growth within 5 miles, 2020-2024, percent"),
    ("RenterVacRate_5", "Renter vacancy rate within 5 miles; market tightness"),
    ("OwnerVacRate_5", "Owner vacancy rate within 5 miles"),
    ("MedianGrossRent_5", "Median gross rent within 5 miles"),
    ("AvgGrossRent_5", "Average gross rent within 5 miles"),
    ("Nearest_Hospital_Distance_Miles", "Distance to the nearest hospital in miles"),
    ("Nearest_Walmart_Distance_Miles", "Distance to the nearest Walmart in miles"),
    ("Nearest_Park_Distance_Miles", "Distance to the nearest park in miles"),
    ("Home_Affordability", "Home price affordability relative to incomes (higher is better)"),
    ("Rent_Affordability", "Rent affordability relative to incomes (higher is better)"),
    ("Convenience_Index", "Proximity to amenities (higher is better)"),
    ("Population_Access", "Access to population centers (higher is better)"),
    ("Market_Saturation", "Competitive saturation (lower means less competition)"),
    ("Composite_Score", "Overall development potential score (higher is better)"),
    ("Composite_Score Percentile", "Percentile rank of the composite score"),
];

/// Description for a column, if known.
pub fn describe(column: &str) -> Option<&'static str> {
    COLUMN_DESCRIPTIONS
        .iter()
        .find(|(name, _)| *name == column)
        .map(|(_, description)| *description)
}

/// Render a bullet list of descriptions for the described columns this
/// record has, in the record's column order.
pub fn render_for(record: &PropertyRecord) -> String {
    let mut out = String::new();
    for (column, _) in record.fields() {
        if let Some(description) = describe(column) {
            out.push_str(&format!("- {}: {}\n", column, description));
        }
    }
    out
}
