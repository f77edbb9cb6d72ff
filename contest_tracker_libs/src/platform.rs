use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use thiserror::Error;

/// Contest series recognized by the tracker.
///
/// Only one flagship series per platform is recognized. Everything else is `Other`
/// and never leaves the aggregator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Platform {
    Codeforces,
    LeetCode,
    CodeChef,
    AtCoder,
    Other,
}

impl Platform {
    pub fn is_recognized(&self) -> bool {
        !matches!(self, Platform::Other)
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Platform::Codeforces => write!(f, "Codeforces"),
            Platform::LeetCode => write!(f, "LeetCode"),
            Platform::CodeChef => write!(f, "CodeChef"),
            Platform::AtCoder => write!(f, "AtCoder"),
            Platform::Other => write!(f, "Other"),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown platform `{0}`")]
pub struct UnknownPlatform(pub String);

impl FromStr for Platform {
    type Err = UnknownPlatform;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "codeforces" => Ok(Platform::Codeforces),
            "leetcode" => Ok(Platform::LeetCode),
            "codechef" => Ok(Platform::CodeChef),
            "atcoder" => Ok(Platform::AtCoder),
            _ => Err(UnknownPlatform(s.to_string())),
        }
    }
}

/// Derive the platform label of an upstream contest.
///
/// Matching is case-insensitive and the first matching rule wins.
/// A missing resource name is treated as an empty string.
pub fn classify(resource_name: Option<&str>, event: &str) -> Platform {
    let resource = resource_name.unwrap_or_default().to_lowercase();
    let event = event.to_lowercase();

    if resource.contains("codeforces") && event.contains("div. 3") {
        Platform::Codeforces
    } else if resource.contains("leetcode")
        && (event.contains("weekly") || event.contains("biweekly"))
    {
        Platform::LeetCode
    } else if resource.contains("codechef") && event.contains("starter") {
        Platform::CodeChef
    } else if resource.contains("atcoder") && event.contains("beginner") {
        Platform::AtCoder
    } else {
        Platform::Other
    }
}

/// Platform selection applied on the client side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlatformFilter {
    #[default]
    All,
    Only(Platform),
}

impl PlatformFilter {
    pub fn matches(&self, platform: Platform) -> bool {
        match self {
            PlatformFilter::All => true,
            PlatformFilter::Only(selected) => *selected == platform,
        }
    }
}

impl fmt::Display for PlatformFilter {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            PlatformFilter::All => write!(f, "All"),
            PlatformFilter::Only(platform) => write!(f, "{}", platform),
        }
    }
}

impl FromStr for PlatformFilter {
    type Err = UnknownPlatform;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("all") {
            return Ok(PlatformFilter::All);
        }
        Platform::from_str(s).map(PlatformFilter::Only)
    }
}
