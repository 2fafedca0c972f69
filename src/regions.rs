//! Region catalogue for synthetic data generation
//! Maps county FIPS codes to display names and census-style baselines

use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

use crate::error::{Result, SegmentationError};

/// Static facts about a region: names plus the demographic baseline the
/// generators perturb.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RegionInfo {
    pub code: &'static str,
    pub short_name: &'static str,
    pub name: &'static str,
    pub population: u64,
    pub median_income: f64,
    pub college_pct: f64,
}

/// Region codes analysed by default, in generation order
pub const DEFAULT_REGION_CODES: [&str; 7] = [
    "17031", "36061", "06037", "48201", "04013", "53033", "25025",
];

/// Region catalogue keyed by FIPS code
pub static REGIONS: LazyLock<HashMap<&'static str, RegionInfo>> = LazyLock::new(|| {
    let mut m = HashMap::new();

    let entries = [
        RegionInfo {
            code: "17031",
            short_name: "CHI",
            name: "Cook County, IL (Chicago)",
            population: 5_150_000,
            median_income: 65_000.0,
            college_pct: 0.45,
        },
        RegionInfo {
            code: "36061",
            short_name: "MAN",
            name: "New York County, NY (Manhattan)",
            population: 1_690_000,
            median_income: 85_000.0,
            college_pct: 0.65,
        },
        RegionInfo {
            code: "06037",
            short_name: "LAX",
            name: "Los Angeles County, CA",
            population: 9_830_000,
            median_income: 70_000.0,
            college_pct: 0.35,
        },
        RegionInfo {
            code: "48201",
            short_name: "HOU",
            name: "Harris County, TX (Houston)",
            population: 4_710_000,
            median_income: 55_000.0,
            college_pct: 0.35,
        },
        RegionInfo {
            code: "04013",
            short_name: "PHX",
            name: "Maricopa County, AZ (Phoenix)",
            population: 4_420_000,
            median_income: 60_000.0,
            college_pct: 0.30,
        },
        RegionInfo {
            code: "53033",
            short_name: "SEA",
            name: "King County, WA (Seattle)",
            population: 2_270_000,
            median_income: 95_000.0,
            college_pct: 0.60,
        },
        RegionInfo {
            code: "25025",
            short_name: "BOS",
            name: "Suffolk County, MA (Boston)",
            population: 800_000,
            median_income: 80_000.0,
            college_pct: 0.55,
        },
    ];

    for info in entries {
        m.insert(info.code, info);
    }

    m
});

/// Look up a region, failing on codes the catalogue does not know
pub fn lookup_region(code: &str) -> Result<&'static RegionInfo> {
    REGIONS.get(code).ok_or_else(|| {
        SegmentationError::configuration(format!("unknown region code requested: {code}"))
    })
}

/// Check a requested region list: every code catalogued, none repeated
pub fn check_region_codes(codes: &[String]) -> Result<()> {
    let mut seen = HashSet::with_capacity(codes.len());
    for code in codes {
        lookup_region(code)?;
        if !seen.insert(code.as_str()) {
            return Err(SegmentationError::configuration(format!(
                "duplicate region code requested: {code}"
            )));
        }
    }
    Ok(())
}

/// Get region display name, falling back to the raw code if not mapped
pub fn get_region_name(code: &str) -> String {
    REGIONS
        .get(code)
        .map(|r| r.name.to_string())
        .unwrap_or_else(|| format!("Region {code}"))
}

/// Get the three-letter label used in terminal tables
pub fn get_region_short(code: &str) -> String {
    REGIONS
        .get(code)
        .map(|r| r.short_name.to_string())
        .unwrap_or_else(|| code.to_string())
}

/// Default region list as owned strings
pub fn default_region_codes() -> Vec<String> {
    DEFAULT_REGION_CODES.iter().map(|c| c.to_string()).collect()
}
