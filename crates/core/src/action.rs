//! Action Catalog
//!
//! The closed vocabulary of operations the executor knows how to run.
//!
//! - `SupportedAction` - one variant per backend operation, with a static
//!   descriptor (wire name, description, keyword hints, mutating flag)
//! - `PlannedAction` - what a plan actually carries: either a catalog entry or
//!   an action name the model produced that the catalog does not know
//!
//! Unknown names are kept rather than dropped so the fallback cascade can tell
//! the user which part of the request it could not serve.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Static metadata for one catalog entry.
#[derive(Debug, Clone, Copy)]
pub struct ActionDescriptor {
    pub name: &'static str,
    pub description: &'static str,
    pub keywords: &'static [&'static str],
    /// Whether the action changes backend state (pause, enable, budget edits).
    pub mutating: bool,
}

macro_rules! action_catalog {
    ($( $variant:ident => $name:literal, $desc:literal, [$($kw:literal),*], $mutating:literal; )*) => {
        /// Closed set of actions the plan executor can run.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(rename_all = "SCREAMING_SNAKE_CASE")]
        pub enum SupportedAction {
            $( $variant, )*
        }

        impl SupportedAction {
            /// Every catalog entry in declaration order.
            pub const ALL: &'static [SupportedAction] = &[ $( SupportedAction::$variant, )* ];

            /// Static descriptor for this action.
            pub fn descriptor(&self) -> ActionDescriptor {
                match self {
                    $( SupportedAction::$variant => ActionDescriptor {
                        name: $name,
                        description: $desc,
                        keywords: &[$($kw),*],
                        mutating: $mutating,
                    }, )*
                }
            }

            /// Look up an action by its wire name (case-insensitive).
            pub fn from_name(name: &str) -> Option<Self> {
                let upper = name.trim().to_ascii_uppercase();
                match upper.as_str() {
                    $( $name => Some(SupportedAction::$variant), )*
                    _ => None,
                }
            }
        }
    };
}

action_catalog! {
    GetCampaigns => "GET_CAMPAIGNS",
        "List all campaigns in the account with status, type and budget",
        ["campaigns", "list campaigns", "show campaigns", "all campaigns"], false;
    GetCampaignsWithFilters => "GET_CAMPAIGNS_WITH_FILTERS",
        "List campaigns restricted by status, budget, channel type or metric thresholds",
        ["active campaigns", "paused campaigns", "budget over", "campaigns with", "filter"], false;
    GetCampaignByName => "GET_CAMPAIGN_BY_NAME",
        "Fetch a single campaign the user refers to by name",
        ["campaign named", "campaign called", "details of"], false;
    GetAccounts => "GET_ACCOUNTS",
        "List the advertising accounts the user can access",
        ["accounts", "my accounts", "customer ids"], false;
    GetAdGroups => "GET_AD_GROUPS",
        "List ad groups, optionally within specific campaigns",
        ["ad groups", "adgroups"], false;
    GetAds => "GET_ADS",
        "List ads and their creative text",
        ["ads", "creatives", "headlines"], false;
    GetKeywords => "GET_KEYWORDS",
        "List keywords with match types and bids",
        ["keywords", "search terms", "bids"], false;
    GetBudgets => "GET_BUDGETS",
        "Show campaign budgets and spend pacing",
        ["budgets", "budget", "spend", "pacing"], false;
    GetPerformance => "GET_PERFORMANCE",
        "Account-level performance metrics over a date range",
        ["performance", "metrics", "how am i doing", "results"], false;
    GetCampaignPerformance => "GET_CAMPAIGN_PERFORMANCE",
        "Per-campaign performance metrics over a date range",
        ["campaign performance", "clicks", "impressions", "conversions", "ctr", "roas"], false;
    ComparePerformance => "COMPARE_PERFORMANCE",
        "Compare metrics between two or more periods or campaigns",
        ["compare", "versus", "vs", "week over week", "month over month"], false;
    AnalyzePerformance => "ANALYZE_PERFORMANCE",
        "Explain trends and anomalies in performance data",
        ["analyze", "analyse", "why did", "trend", "insights"], false;
    GetDemographics => "GET_DEMOGRAPHICS",
        "Performance broken down by age and gender",
        ["demographics", "age", "gender", "audience breakdown"], false;
    GetLocationPerformance => "GET_LOCATION_PERFORMANCE",
        "Performance broken down by geographic location",
        ["location", "geo", "country", "city", "region"], false;
    GetDevicePerformance => "GET_DEVICE_PERFORMANCE",
        "Performance broken down by device type",
        ["device", "mobile", "desktop", "tablet"], false;
    GetKeywordSuggestions => "GET_KEYWORD_SUGGESTIONS",
        "Suggest new keywords for a campaign or business",
        ["keyword ideas", "suggest keywords", "new keywords", "keyword suggestions"], false;
    OptimizeCampaign => "OPTIMIZE_CAMPAIGN",
        "Recommend optimizations for one or more campaigns",
        ["optimize", "optimise", "improve", "recommendations", "suggestions"], false;
    OptimizeBudget => "OPTIMIZE_BUDGET",
        "Recommend budget reallocation across campaigns",
        ["reallocate", "budget optimization", "shift budget", "optimize budget"], false;
    PauseCampaign => "PAUSE_CAMPAIGN",
        "Pause one or more campaigns",
        ["pause", "stop", "turn off"], true;
    EnableCampaign => "ENABLE_CAMPAIGN",
        "Enable one or more paused campaigns",
        ["enable", "resume", "turn on", "activate"], true;
}

impl SupportedAction {
    /// Wire name, e.g. `GET_CAMPAIGNS`.
    pub fn as_str(&self) -> &'static str {
        self.descriptor().name
    }
}

impl fmt::Display for SupportedAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An action name as it appears in a plan.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PlannedAction {
    Supported(SupportedAction),
    Unsupported(String),
}

impl PlannedAction {
    /// Parse a model-produced action name; unknown names become `Unsupported`.
    pub fn parse(name: &str) -> Self {
        match SupportedAction::from_name(name) {
            Some(action) => PlannedAction::Supported(action),
            None => PlannedAction::Unsupported(name.trim().to_ascii_uppercase()),
        }
    }

    pub fn as_supported(&self) -> Option<SupportedAction> {
        match self {
            PlannedAction::Supported(action) => Some(*action),
            PlannedAction::Unsupported(_) => None,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            PlannedAction::Supported(action) => action.as_str(),
            PlannedAction::Unsupported(name) => name,
        }
    }
}

impl From<String> for PlannedAction {
    fn from(name: String) -> Self {
        PlannedAction::parse(&name)
    }
}

impl From<PlannedAction> for String {
    fn from(action: PlannedAction) -> String {
        action.name().to_string()
    }
}

impl From<SupportedAction> for PlannedAction {
    fn from(action: SupportedAction) -> Self {
        PlannedAction::Supported(action)
    }
}

impl fmt::Display for PlannedAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
