//! Regional Segmentation Report
//! Clusters regions by mobility and spending and prints the derived personas
//!
//! Run: ./target/release/segment_report [section] [OPTIONS]
//! Sections: all, segments, personas, opportunities, forecast, intelligence

use anyhow::{bail, Context, Result};
use clap::Parser;
use mobility_segments::intelligence::format_thousands;
use mobility_segments::models::Season;
use mobility_segments::opportunities::opportunities_for;
use mobility_segments::regions::get_region_short;
use mobility_segments::{
    create_advanced_visualizations, run_analysis, AnalysisResult, PipelineConfig,
};
use std::path::PathBuf;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "segment_report")]
#[command(about = "Segment regions into mobility personas and report on them")]
struct Args {
    /// Report section to print
    #[arg(default_value = "all")]
    section: String,

    /// JSON config file; flags below override its values
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long)]
    seed: Option<u64>,

    /// Number of clusters
    #[arg(long)]
    clusters: Option<usize>,

    #[arg(long)]
    max_iters: Option<usize>,

    #[arg(long)]
    tolerance: Option<f64>,

    /// Comma-separated region FIPS codes
    #[arg(long, value_delimiter = ',')]
    regions: Option<Vec<String>>,

    /// Print the full analysis result as JSON instead of the report
    #[arg(long)]
    json: bool,

    /// Print the chart-ready visualization data as JSON
    #[arg(long, conflicts_with = "json")]
    viz: bool,
}

fn load_config(args: &Args) -> Result<PipelineConfig> {
    let mut config = match &args.config {
        Some(path) => PipelineConfig::from_json_file(path)
            .with_context(|| format!("loading config from {:?}", path))?,
        None => PipelineConfig::default(),
    };

    if let Some(seed) = args.seed {
        config.seed = seed;
    }
    if let Some(k) = args.clusters {
        config.n_clusters = k;
    }
    if let Some(max_iters) = args.max_iters {
        config.max_iterations = max_iters;
    }
    if let Some(tolerance) = args.tolerance {
        config.tolerance = tolerance;
    }
    if let Some(regions) = &args.regions {
        config.region_codes = regions.clone();
    }
    Ok(config)
}

fn print_section_header(title: &str) {
    println!("\n{}", "═".repeat(90));
    println!("  {}", title);
    println!("{}\n", "═".repeat(90));
}

fn print_subsection(title: &str) {
    println!("\n{}", title);
    println!("{}", "─".repeat(80));
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let config = load_config(&args)?;
    info!("Running analysis with {:?}", config);

    let result = run_analysis(&config).context("segmentation analysis failed")?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }
    if args.viz {
        let viz = create_advanced_visualizations(&result);
        println!("{}", serde_json::to_string_pretty(&viz)?);
        return Ok(());
    }

    println!("\n{}", "█".repeat(90));
    println!("{}  REGIONAL SEGMENTATION REPORT  {}", "█".repeat(28), "█".repeat(29));
    println!("{}  Mobility & Spending Personas  {}", "█".repeat(28), "█".repeat(29));
    println!("{}\n", "█".repeat(90));

    match args.section.as_str() {
        "all" => {
            print_segments(&result);
            print_personas(&result);
            print_opportunities(&result);
            print_forecast(&result);
            print_intelligence(&result);
        }
        "segments" => print_segments(&result),
        "personas" => print_personas(&result),
        "opportunities" => print_opportunities(&result),
        "forecast" => print_forecast(&result),
        "intelligence" => print_intelligence(&result),
        other => bail!(
            "unknown section: {} (available: all, segments, personas, opportunities, \
             forecast, intelligence)",
            other
        ),
    }

    println!("\n{}", "█".repeat(90));
    Ok(())
}

fn print_segments(result: &AnalysisResult) {
    let seg = &result.segmentation_results;
    print_section_header("SEGMENTS");

    println!(
        "Algorithm: {} | k = {} | Silhouette: {:.3} | Inertia: {:.3}",
        seg.algorithm, seg.n_clusters, seg.silhouette_score, seg.inertia
    );

    print_subsection("Clusters");
    println!(
        "  {:8} {:>5} {:>10} {:>8} {:>9} {:>12}  {:10} {:10} {:10}",
        "Cluster",
        "Size",
        "Trips",
        "Member",
        "Duration",
        "Restaurants",
        "Mobility",
        "Engagement",
        "Dining"
    );
    println!("  {}", "─".repeat(88));
    for profile in &seg.cluster_profiles {
        println!(
            "  {:8} {:>5} {:>10.0} {:>7.1}% {:>8.1}m {:>12.0}  {:10} {:10} {:10}",
            profile.cluster_id,
            profile.size,
            profile.avg_trips(),
            profile.avg_member_ratio() * 100.0,
            profile.avg_duration(),
            profile.avg_restaurant_spending(),
            profile.characteristics.mobility_level,
            profile.characteristics.engagement,
            profile.characteristics.dining_preference
        );
        let names: Vec<String> = profile.regions.iter().map(|c| get_region_short(c)).collect();
        println!("           regions: {}", names.join(", "));
    }

    print_subsection("Feature Importance");
    let mut weights = seg.feature_importance.clone();
    weights.sort_by(|a, b| b.weight.total_cmp(&a.weight));
    for w in &weights {
        let bar = "▇".repeat((w.weight * 20.0) as usize);
        println!("  {:22} {:>6.3}  {}", w.feature.name(), w.weight, bar);
    }
}

fn print_personas(result: &AnalysisResult) {
    print_section_header("PERSONAS");

    for (id, persona) in &result.personas {
        println!(
            "👤 {} [{}] - {} (cluster {})",
            persona.persona_name, id, persona.persona_type, persona.cluster_id
        );
        println!("   {}", persona.description);
        println!(
            "   Population: {} | Market value: ${} | Targeting effectiveness: {:.1}%",
            format_thousands(persona.estimated_population),
            format_thousands(persona.market_value),
            persona.targeting_effectiveness * 100.0
        );
        println!(
            "   Mobility: {} trips, {:.1}% members, {:.1} min avg ({} usage)",
            format_thousands(persona.mobility_profile.avg_trips),
            persona.mobility_profile.member_ratio * 100.0,
            persona.mobility_profile.avg_duration,
            persona.mobility_profile.usage_intensity
        );
        if let Some(demo) = &persona.demographic_profile {
            println!(
                "   Demographics: ${:.0} median income, {:.1}% college, {:.1}% aged 18-34",
                demo.median_income,
                demo.college_educated_pct * 100.0,
                demo.age_18_34_pct * 100.0
            );
        }
        let seasonal: Vec<String> = Season::ALL
            .iter()
            .map(|s| format!("{:?} {:.2}", s, persona.seasonal_trends.get(*s)))
            .collect();
        println!("   Seasonal: {}", seasonal.join(" | "));
        println!("   Channels: {}", persona.preferred_channels.join(", "));

        let matched = opportunities_for(&result.opportunities, &persona.persona_name);
        if !matched.is_empty() {
            let types: Vec<&str> = matched.iter().map(|o| o.opportunity_type.as_str()).collect();
            println!("   Opportunities: {}", types.join(", "));
        }
        println!();
    }
}

fn print_opportunities(result: &AnalysisResult) {
    print_section_header("OPPORTUNITIES");

    println!(
        "  {:32} {:>12} {:>10} {:>8} {:>12}",
        "Opportunity", "Market", "ROI", "Invest", "Timeline"
    );
    println!("  {}", "─".repeat(78));
    for opp in &result.opportunities {
        println!(
            "  {:32} {:>12} {:>10} {:>8} {:>12}",
            opp.opportunity_type,
            format!("${}", format_thousands(opp.estimated_market_size)),
            opp.expected_roi,
            opp.investment_level,
            opp.implementation_timeline
        );
    }
}

fn print_forecast(result: &AnalysisResult) {
    let forecast = &result.predictive_analytics;
    print_section_header("FORECAST");

    let next = &forecast.demand_forecast.next_quarter;
    println!(
        "Next quarter growth: {} (peak: {})",
        next.expected_growth,
        next.peak_months.join(", ")
    );
    println!("Drivers: {}", next.growth_drivers.join(", "));

    print_subsection("Seasonal Patterns");
    for (season, pattern) in &forecast.demand_forecast.seasonal_patterns {
        println!(
            "  {:8} x{:.2}  (confidence {:.0}%)",
            format!("{:?}", season),
            pattern.multiplier,
            pattern.confidence * 100.0
        );
    }

    print_subsection("Revenue Projections");
    println!("  Base:         {}", forecast.revenue_projections.base_case);
    println!("  Optimistic:   {}", forecast.revenue_projections.optimistic_case);
    println!("  Conservative: {}", forecast.revenue_projections.conservative_case);
    println!(
        "\n  Based on {} regions and {} spending categories",
        forecast.basis.regions_observed, forecast.basis.spending_categories
    );
}

fn print_intelligence(result: &AnalysisResult) {
    let intel = &result.insights;
    let overview = &intel.market_overview;
    print_section_header("MARKET INTELLIGENCE");

    println!("Total addressable market: ${}", format_thousands(overview.total_addressable_market));
    println!("Total population:         {}", format_thousands(overview.total_population));
    println!("Avg targeting:            {:.1}%", overview.average_targeting_effectiveness * 100.0);
    println!("Segments:                 {}", overview.number_of_segments);
    println!("Opportunity value:        ${}", format_thousands(overview.total_opportunity_value));

    print_subsection("Key Insights");
    for insight in &intel.key_insights {
        println!("  • {}", insight);
    }

    print_subsection("Recommendations");
    for (i, rec) in intel.strategic_recommendations.iter().enumerate() {
        println!("  {}. {}", i + 1, rec);
    }

    print_subsection("Risk Factors");
    for risk in &intel.risk_factors {
        println!("  ⚠️  {}", risk);
    }
}
