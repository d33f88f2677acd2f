//! Agent roles.

use serde::Serialize;

/// A prompt persona. Roles differ only in the system prompt they produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentRole {
    DataAnalyst,
    WebResearcher,
    MarketAnalyst,
    ReportWriter,
}

impl AgentRole {
    pub fn title(&self) -> &'static str {
        match self {
            AgentRole::DataAnalyst => "Property Data Analyst",
            AgentRole::WebResearcher => "Web Researcher",
            AgentRole::MarketAnalyst => "Real Estate Market Analyst",
            AgentRole::ReportWriter => "Property Development Report Writer",
        }
    }

    pub fn goal(&self) -> &'static str {
        match self {
            AgentRole::DataAnalyst => {
                "Analyze property data to determine investment potential and highest and best use"
            }
            AgentRole::WebResearcher => {
                "Research the local market, regulations and infrastructure around the property"
            }
            AgentRole::MarketAnalyst => {
                "Assess market trends and the financial feasibility of developing the property"
            }
            AgentRole::ReportWriter => {
                "Write clear, data-driven development reports with concrete recommendations"
            }
        }
    }

    pub fn backstory(&self) -> &'static str {
        match self {
            AgentRole::DataAnalyst => {
                "You are a senior real estate data analyst with 15 years of experience \
                 evaluating land for development. You read demographic and pricing data \
                 quickly and flag what matters for attainable housing."
            }
            AgentRole::WebResearcher => {
                "You are a property researcher with 8 years of experience investigating \
                 real estate opportunities. You turn scattered news, zoning notices and \
                 infrastructure plans into a clear picture of a location."
            }
            AgentRole::MarketAnalyst => {
                "You are a market analyst with 12 years in residential development. You \
                 specialize in supply and demand, absorption and land residual analysis \
                 for lot development projects."
            }
            AgentRole::ReportWriter => {
                "You are an experienced writer of real estate investment memos. You \
                 synthesize analysis from several specialists into structured Markdown \
                 that investors can act on."
            }
        }
    }

    /// System message sent with every task for this role.
    pub fn system_prompt(&self) -> String {
        format!(
            "You are the {}.\n\nGoal: {}\n\n{}\n\nAnswer in Markdown. Use the figures you are given and say so when data is missing instead of inventing it.",
            self.title(),
            self.goal(),
            self.backstory()
        )
    }
}
