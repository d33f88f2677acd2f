//! Templated search strategy.
//!
//! Each category has a fixed set of query templates. A category is searched
//! at medium location specificity first and falls back to high and then low
//! specificity until some query returns hits.

use super::search::{SearchHit, SearchProvider};
use super::{CategoryResults, MetaAnalysis, ResearchDigest, ResearchFinding};
use crate::models::{PropertyRecord, CITY, COUNTY_NAME, STATE, ZIP};
use futures::stream::{self, StreamExt};
use regex::Regex;
use serde::Serialize;
use std::collections::HashSet;
use std::sync::LazyLock;
use tracing::{debug, info, warn};

const SUMMARY_CHARS: usize = 500;
const RECENCY_WORDS: &[&str] = &[
    "2024", "2023", "recent", "new", "latest", "update", "month", "week",
];

static DOLLAR_AMOUNT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\$\s*\d+(?:,\d+)*(?:\.\d+)?(?:\s*(?:million|billion|m|b))?")
        .expect("dollar amount pattern is valid")
});

/// Research topic with its own query templates and scoring keywords.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    EconomicDevelopment,
    HousingMarket,
    Infrastructure,
    GovernmentPolicy,
    CommunityFactors,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::EconomicDevelopment,
        Category::HousingMarket,
        Category::Infrastructure,
        Category::GovernmentPolicy,
        Category::CommunityFactors,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            Category::EconomicDevelopment => "economic_development",
            Category::HousingMarket => "housing_market",
            Category::Infrastructure => "infrastructure",
            Category::GovernmentPolicy => "government_policy",
            Category::CommunityFactors => "community_factors",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Category::EconomicDevelopment => "Economic Development",
            Category::HousingMarket => "Housing Market",
            Category::Infrastructure => "Infrastructure",
            Category::GovernmentPolicy => "Government Policy",
            Category::CommunityFactors => "Community Factors",
        }
    }

    /// Query templates; `{location}` is replaced by the location query.
    pub fn templates(&self) -> &'static [&'static str] {
        match self {
            Category::EconomicDevelopment => &[
                "{location} economic development news past year",
                "{location} new business opening 2023 2024",
                "{location} major employer hiring expanding",
                "{location} economic growth statistics recent",
                "{location} upcoming development projects",
                "{location} job market trends",
            ],
            Category::HousingMarket => &[
                "{location} housing market analysis 2024",
                "{location} affordable housing initiative",
                "{location} housing shortage statistics",
                "{location} new housing development project",
                "{location} manufactured home community zoning",
                "{location} rental market trends 2024",
            ],
            Category::Infrastructure => &[
                "{location} infrastructure improvement plan",
                "{location} road expansion project",
                "{location} utilities upgrade plan",
                "{location} transportation development",
                "{location} broadband expansion rural",
                "{location} water sewer capacity development",
            ],
            Category::GovernmentPolicy => &[
                "{location} zoning changes residential development",
                "{location} new property development regulations",
                "{location} tax incentives housing development",
                "{location} permitting process development",
                "{location} planning commission decisions recent",
                "{location} development impact fees",
            ],
            Category::CommunityFactors => &[
                "{location} school district performance ranking",
                "{location} crime statistics trends",
                "{location} quality of life ranking",
                "{location} recreational facilities development",
                "{location} community sentiment growth survey",
                "{location} healthcare facilities access",
            ],
        }
    }

    fn keywords(&self) -> &'static [&'static str] {
        match self {
            Category::EconomicDevelopment => {
                &["business", "economy", "job", "employment", "growth", "industry"]
            }
            Category::HousingMarket => {
                &["housing", "home", "apartment", "rent", "mortgage", "residential"]
            }
            Category::Infrastructure => &[
                "road",
                "transit",
                "utility",
                "infrastructure",
                "transportation",
                "development",
            ],
            Category::GovernmentPolicy => {
                &["zoning", "regulation", "permit", "tax", "incentive", "government"]
            }
            Category::CommunityFactors => {
                &["school", "education", "crime", "recreation", "healthcare", "park"]
            }
        }
    }
}

/// How precisely the location is named in a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Specificity {
    High,
    Medium,
    Low,
}

impl Specificity {
    /// Order in which levels are tried.
    pub const SEARCH_ORDER: [Specificity; 3] =
        [Specificity::Medium, Specificity::High, Specificity::Low];
}

/// Location fields used to build queries.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LocationContext {
    pub city: String,
    pub county: String,
    pub state: String,
    pub zip: String,
}

impl LocationContext {
    pub fn from_record(record: &PropertyRecord) -> Self {
        let field = |column: &str| {
            record
                .get(column)
                .filter(|v| !v.is_empty())
                .map(|v| v.to_string())
                .filter(|s| s != "Unknown")
                .unwrap_or_default()
        };

        Self {
            city: field(CITY),
            county: field(COUNTY_NAME),
            state: field(STATE),
            zip: field(ZIP),
        }
    }

    /// `"<city>, <county>, <state>"` without the blanks.
    pub fn full_location(&self) -> String {
        [&self.city, &self.county, &self.state]
            .iter()
            .filter(|s| !s.is_empty())
            .map(|s| s.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Location phrase for a specificity level, falling back to the full
    /// location when the level's fields are missing.
    pub fn query(&self, specificity: Specificity) -> String {
        let has = |s: &String| !s.is_empty();
        match specificity {
            Specificity::High if has(&self.city) && has(&self.county) && has(&self.state) => {
                format!("{} {} County {}", self.city, self.county, self.state)
            }
            Specificity::Medium if has(&self.city) && has(&self.state) => {
                format!("{} {}", self.city, self.state)
            }
            Specificity::Low if (has(&self.city) || has(&self.county)) && has(&self.state) => {
                let place = if has(&self.city) { &self.city } else { &self.county };
                format!("{} area {}", place, self.state)
            }
            _ => self.full_location(),
        }
    }
}

/// Runs the templated searches for a property.
pub struct ResearchStrategy<'a> {
    provider: &'a dyn SearchProvider,
    max_queries: usize,
    max_results: usize,
    concurrency: usize,
}

impl<'a> ResearchStrategy<'a> {
    pub fn new(
        provider: &'a dyn SearchProvider,
        config: &crate::config::ResearchConfig,
        concurrency: usize,
    ) -> Self {
        Self {
            provider,
            max_queries: config.max_queries_per_category,
            max_results: config.max_results_per_query,
            concurrency: concurrency.max(1),
        }
    }

    /// Search every category for the property's location.
    pub async fn execute(&self, record: &PropertyRecord) -> ResearchDigest {
        let location = LocationContext::from_record(record);
        info!("Researching {}", location.full_location());

        let mut executed = HashSet::new();
        let mut categories = Vec::new();

        for category in Category::ALL {
            if let Some(results) = self.research_category(&location, category, &mut executed).await {
                categories.push(results);
            }
        }

        let meta = MetaAnalysis::from_categories(&categories);
        info!(
            "Research finished: {} queries, {} categories with findings",
            executed.len(),
            categories.len()
        );

        ResearchDigest {
            location,
            categories,
            meta,
        }
    }

    async fn research_category(
        &self,
        location: &LocationContext,
        category: Category,
        executed: &mut HashSet<String>,
    ) -> Option<CategoryResults> {
        let templates = &category.templates()[..self.max_queries.min(category.templates().len())];

        for specificity in Specificity::SEARCH_ORDER {
            let location_query = location.query(specificity);
            if location_query.is_empty() {
                continue;
            }

            let queries: Vec<String> = templates
                .iter()
                .map(|t| t.replace("{location}", &location_query))
                .filter(|q| executed.insert(q.clone()))
                .collect();

            if queries.is_empty() {
                continue;
            }

            debug!(
                "{}: {} queries at {:?} specificity",
                category.key(),
                queries.len(),
                specificity
            );

            let mut responses: Vec<(usize, String, Vec<SearchHit>)> =
                stream::iter(queries.into_iter().enumerate())
                    .map(|(index, query)| async move {
                        match self.provider.search(&query, self.max_results).await {
                            Ok(hits) => (index, query, hits),
                            Err(e) => {
                                warn!("Error during {} search: {:#}", category.key(), e);
                                (index, query, Vec::new())
                            }
                        }
                    })
                    .buffer_unordered(self.concurrency)
                    .collect()
                    .await;
            responses.sort_by_key(|(index, _, _)| *index);

            let mut used_queries = Vec::new();
            let mut findings = Vec::new();
            for (_, query, hits) in responses {
                if hits.is_empty() {
                    continue;
                }
                used_queries.push(query);
                findings.extend(hits.iter().map(|hit| analyze_hit(hit, category)));
            }

            if !findings.is_empty() {
                let insights = generate_insights(&findings, category);
                return Some(CategoryResults {
                    category,
                    queries: used_queries,
                    findings,
                    insights,
                });
            }
        }

        None
    }
}

fn analyze_hit(hit: &SearchHit, category: Category) -> ResearchFinding {
    ResearchFinding {
        title: hit.title.clone(),
        url: hit.url.clone(),
        source: source_from_url(&hit.url),
        summary: hit.body.chars().take(SUMMARY_CHARS).collect(),
        key_points: key_points(&hit.body),
        amounts: dollar_amounts(&hit.body),
        relevance: relevance(hit, category),
    }
}

/// Publication name from a URL: the second-level domain, capitalized.
pub fn source_from_url(url: &str) -> String {
    let without_scheme = url.split("://").nth(1).unwrap_or(url);
    let host = without_scheme
        .split(['/', '?', '#'])
        .next()
        .unwrap_or_default()
        .split(':')
        .next()
        .unwrap_or_default();
    let domain = host.strip_prefix("www.").unwrap_or(host);

    if domain.is_empty() {
        return "Unknown source".to_string();
    }

    let parts: Vec<&str> = domain.split('.').collect();
    let name = if parts.len() >= 2 {
        parts[parts.len() - 2]
    } else {
        domain
    };
    capitalize(name)
}

fn capitalize(s: &str) -> String {
    let lower = s.to_lowercase();
    let mut chars = lower.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// First three sentences of the text, each ending in a period.
pub fn key_points(text: &str) -> Vec<String> {
    text.split(". ")
        .take(3)
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(|p| {
            if p.ends_with('.') {
                p.to_string()
            } else {
                format!("{}.", p)
            }
        })
        .collect()
}

/// Up to five dollar amounts mentioned in the text.
pub fn dollar_amounts(text: &str) -> Vec<String> {
    DOLLAR_AMOUNT
        .find_iter(text)
        .take(5)
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Relevance in `[0.5, 0.95]` from category keywords and recency words.
pub fn relevance(hit: &SearchHit, category: Category) -> f64 {
    let content = format!("{} {}", hit.title, hit.body).to_lowercase();

    let keyword_matches = category
        .keywords()
        .iter()
        .filter(|k| content.contains(*k))
        .count();
    let recency_matches = RECENCY_WORDS
        .iter()
        .filter(|w| content.contains(*w))
        .count();

    let score = 0.5
        + (keyword_matches as f64 * 0.1).min(0.4)
        + (recency_matches as f64 * 0.05).min(0.2);
    score.min(0.95)
}

fn any_summary_mentions(findings: &[ResearchFinding], terms: &[&str]) -> bool {
    findings.iter().any(|f| {
        let summary = f.summary.to_lowercase();
        terms.iter().any(|t| summary.contains(t))
    })
}

/// Category-level takeaways drawn from the finding summaries.
pub fn generate_insights(findings: &[ResearchFinding], category: Category) -> Vec<String> {
    if findings.is_empty() {
        return Vec::new();
    }

    let mut insights = Vec::new();

    match category {
        Category::EconomicDevelopment => {
            if any_summary_mentions(
                findings,
                &["expansion", "growth", "new jobs", "hiring", "investment"],
            ) {
                insights.push("Evidence of economic growth in the area".to_string());
            }
            if any_summary_mentions(
                findings,
                &["layoff", "closing", "downturn", "recession", "struggling"],
            ) {
                insights.push("Potential economic challenges in the area".to_string());
            }
        }
        Category::HousingMarket => {
            if any_summary_mentions(
                findings,
                &["shortage", "crisis", "lack of housing", "insufficient", "limited supply"],
            ) {
                insights.push("Indicators of housing shortage in the market".to_string());
            }
            if any_summary_mentions(
                findings,
                &["development", "construction", "new homes", "building", "project"],
            ) {
                insights.push("Active housing development in the area".to_string());
            }
        }
        _ => {}
    }

    if insights.is_empty() {
        insights.push(format!(
            "Information found related to {}",
            category.label().to_lowercase()
        ));
    }

    insights
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ResearchConfig;
    use crate::models::CellValue;
    use anyhow::bail;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Returns a hit only for queries containing `answer_for`.
    struct FakeSearch {
        answer_for: String,
        seen: Mutex<Vec<String>>,
    }

    impl FakeSearch {
        fn new(answer_for: &str) -> Self {
            Self {
                answer_for: answer_for.to_string(),
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl SearchProvider for FakeSearch {
        async fn search(&self, query: &str, _max_results: usize) -> anyhow::Result<Vec<SearchHit>> {
            self.seen.lock().unwrap().push(query.to_string());
            if query.contains("fail") {
                bail!("network down");
            }
            if !query.contains(&self.answer_for) {
                return Ok(Vec::new());
            }
            Ok(vec![SearchHit {
                title: format!("Result for {}", query),
                url: "https://www.statesman.com/story/news".to_string(),
                body: "New jobs and business growth in 2024. A $25 million plant is planned. More to come"
                    .to_string(),
            }])
        }
    }

    fn record(city: &str, county: &str, state: &str) -> PropertyRecord {
        PropertyRecord::new(vec![
            (CITY.to_string(), CellValue::parse(city)),
            (COUNTY_NAME.to_string(), CellValue::parse(county)),
            (STATE.to_string(), CellValue::parse(state)),
            (ZIP.to_string(), CellValue::parse("78701")),
        ])
    }

    #[test]
    fn test_location_queries() {
        let location = LocationContext::from_record(&record("Austin", "Travis", "TX"));
        assert_eq!(location.query(Specificity::High), "Austin Travis County TX");
        assert_eq!(location.query(Specificity::Medium), "Austin TX");
        assert_eq!(location.query(Specificity::Low), "Austin area TX");
        assert_eq!(location.full_location(), "Austin, Travis, TX");

        let county_only = LocationContext::from_record(&record("", "Travis", "TX"));
        assert_eq!(county_only.query(Specificity::Medium), "Travis, TX");
        assert_eq!(county_only.query(Specificity::Low), "Travis area TX");
    }

    #[test]
    fn test_unknown_city_is_blank() {
        let location = LocationContext::from_record(&record("Unknown", "Travis", "TX"));
        assert!(location.city.is_empty());
    }

    #[test]
    fn test_source_from_url() {
        assert_eq!(source_from_url("https://www.statesman.com/story"), "Statesman");
        assert_eq!(source_from_url("http://news.kxan.com:8080/a?b"), "Kxan");
        assert_eq!(source_from_url("localhost"), "Localhost");
        assert_eq!(source_from_url(""), "Unknown source");
    }

    #[test]
    fn test_key_points() {
        let points = key_points("First point. Second point. Third. Fourth.");
        assert_eq!(points, vec!["First point.", "Second point.", "Third."]);
        assert!(key_points("").is_empty());
    }

    #[test]
    fn test_dollar_amounts() {
        let amounts = dollar_amounts("A $25 million plant and $1,200.50 fees, $3B deal");
        assert_eq!(amounts, vec!["$25 million", "$1,200.50", "$3B"]);
    }

    #[test]
    fn test_relevance_bounds() {
        let plain = SearchHit {
            title: "Nothing".to_string(),
            url: String::new(),
            body: "unrelated".to_string(),
        };
        assert_eq!(relevance(&plain, Category::HousingMarket), 0.5);

        let rich = SearchHit {
            title: "Housing home apartment rent mortgage residential".to_string(),
            url: String::new(),
            body: "2024 2023 recent new latest update month week".to_string(),
        };
        assert_eq!(relevance(&rich, Category::HousingMarket), 0.95);
    }

    #[test]
    fn test_insights_fallback() {
        let finding = ResearchFinding {
            title: String::new(),
            url: String::new(),
            source: String::new(),
            summary: "Parks are nice".to_string(),
            key_points: Vec::new(),
            amounts: Vec::new(),
            relevance: 0.5,
        };
        assert_eq!(
            generate_insights(std::slice::from_ref(&finding), Category::CommunityFactors),
            vec!["Information found related to community factors"]
        );
        assert!(generate_insights(&[], Category::HousingMarket).is_empty());
    }

    #[tokio::test]
    async fn test_strategy_falls_back_to_high_specificity() {
        let search = FakeSearch::new("County");
        let config = ResearchConfig {
            max_queries_per_category: 2,
            ..Default::default()
        };
        let strategy = ResearchStrategy::new(&search, &config, 2);

        let digest = strategy.execute(&record("Austin", "Travis", "TX")).await;

        assert_eq!(digest.categories.len(), 5);
        let economic = &digest.categories[0];
        assert_eq!(economic.category, Category::EconomicDevelopment);
        assert_eq!(economic.findings.len(), 2);
        assert!(economic.queries[0].starts_with("Austin Travis County TX"));
        assert!(economic
            .insights
            .contains(&"Evidence of economic growth in the area".to_string()));
        assert_eq!(economic.findings[0].source, "Statesman");
        assert_eq!(economic.findings[0].amounts, vec!["$25 million"]);

        // medium then high per category, nothing repeated
        let seen = search.seen.lock().unwrap();
        assert_eq!(seen.len(), 5 * 2 * 2);
        let unique: HashSet<_> = seen.iter().collect();
        assert_eq!(unique.len(), seen.len());
    }

    #[tokio::test]
    async fn test_strategy_survives_search_errors() {
        let search = FakeSearch::new("never matches");
        let config = ResearchConfig::default();
        let strategy = ResearchStrategy::new(&search, &config, 3);

        let digest = strategy.execute(&record("fail", "", "TX")).await;
        assert!(digest.is_empty());
    }
}
