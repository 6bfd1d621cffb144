//! Terminal rendering for the report subcommands.
//!
//! Each view loads the source through a [`Dashboard`], applies the filter
//! selection and prints tables (or JSON). An empty selection is reported as a
//! warning and nothing else is rendered.

use anyhow::{Context, Result};
use log::{info, warn};

use crate::{
    aggregate::{Aggregates, GroupTotal},
    cli::{OptionsArgs, ReportArgs},
    dashboard::Dashboard,
    data::format_number,
    filter::FilterDomain,
    load_source,
    table::{TextTable, group_thousands},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Summary,
    Leaderboard,
    Breakdown,
}

pub fn execute(view: View, args: &ReportArgs) -> Result<()> {
    let (mut dashboard, bytes) = load_source(&args.source, args.report_options())?;
    let table = dashboard.load(&bytes).context("Loading contestant data")?;
    let selection = args.filters.to_selection();
    let aggregates = match dashboard.refresh(&table, &selection) {
        Ok((_, aggregates)) => aggregates,
        Err(empty) => {
            warn!("{empty}");
            return Ok(());
        }
    };

    if args.json {
        let json = serde_json::to_string_pretty(&aggregates).context("Serializing aggregates")?;
        println!("{json}");
        return Ok(());
    }

    match view {
        View::Summary => print_summary(&aggregates),
        View::Leaderboard => print_leaderboard(&aggregates),
        View::Breakdown => print_breakdown(&aggregates),
    }
    info!(
        "Rendered {view:?} for {} of {} record(s)",
        aggregates.row_count,
        table.len()
    );
    Ok(())
}

fn print_summary(aggregates: &Aggregates) {
    let mut overview = TextTable::new(["metric", "value"]).titled("Competition Overview");
    for (metric, value) in [
        ("Total Clicks", group_thousands(aggregates.total_clicks)),
        (
            "Total Contestants",
            group_thousands(aggregates.distinct_contestants as u64),
        ),
        (
            "Average Clicks per Contestant",
            format!("{:.1}", aggregates.mean_clicks),
        ),
        ("Max Clicks", group_thousands(aggregates.max_clicks)),
    ] {
        overview.push_row(vec![metric.to_string(), value]);
    }
    overview.print();
    println!();

    let mut monthly = TextTable::new(["month", "num_clicks"]).titled("Monthly Clicks Trend");
    for entry in &aggregates.monthly_clicks {
        monthly.push_row(vec![entry.month.to_string(), entry.clicks.to_string()]);
    }
    monthly.print();
}

fn print_leaderboard(aggregates: &Aggregates) {
    let mut board = TextTable::new(["rank", "name", "gender", "location", "num_clicks"])
        .titled(format!(
            "Top {} contestants by clicks",
            aggregates.leaderboard.len()
        ));
    for entry in &aggregates.leaderboard {
        board.push_row(vec![
            entry.rank.to_string(),
            entry.name.clone().unwrap_or_default(),
            entry.gender.clone().unwrap_or_default(),
            entry.location.clone().unwrap_or_default(),
            entry.num_clicks.to_string(),
        ]);
    }
    board.print();
    println!();
    group_table("Total Clicks by Gender", "gender", "num_clicks", &aggregates.gender_clicks).print();
}

fn print_breakdown(aggregates: &Aggregates) {
    group_table(
        "Total Clicks by Location",
        "location",
        "num_clicks",
        &aggregates.location_clicks,
    )
    .print();
    println!();
    group_table("Contestants by Gender", "gender", "count", &aggregates.gender_counts).print();
    println!();

    let genders = aggregates
        .gender_counts
        .iter()
        .map(|g| g.key.clone())
        .collect::<Vec<_>>();
    let mut headers = vec!["from".to_string(), "to".to_string(), "total".to_string()];
    headers.extend(genders.iter().cloned());
    let mut histogram = TextTable::new(headers).titled("Clicks Histogram by Gender");
    for bin in &aggregates.click_histogram {
        let mut row = vec![
            format_number(bin.lower),
            format_number(bin.upper),
            bin.total.to_string(),
        ];
        row.extend(
            genders
                .iter()
                .map(|g| bin.by_gender.get(g).copied().unwrap_or(0).to_string()),
        );
        histogram.push_row(row);
    }
    histogram.print();
    println!();

    match &aggregates.age_points {
        Some(points) => {
            let mut ages = TextTable::new(["age", "num_clicks", "gender", "name", "location", "rank"])
                .titled("Clicks vs Age");
            for point in points {
                ages.push_row(vec![
                    format_number(point.age),
                    point.num_clicks.to_string(),
                    point.gender.clone().unwrap_or_default(),
                    point.name.clone().unwrap_or_default(),
                    point.location.clone().unwrap_or_default(),
                    point.rank.to_string(),
                ]);
            }
            ages.print();
        }
        None => info!("Age column not found in data; skipping clicks vs age"),
    }
}

fn group_table(title: &str, key: &str, value: &str, groups: &[GroupTotal]) -> TextTable {
    let mut table = TextTable::new([key, value]).titled(title);
    for group in groups {
        table.push_row(vec![group.key.clone(), group.value.to_string()]);
    }
    table
}

pub fn execute_options(args: &OptionsArgs) -> Result<()> {
    let (mut dashboard, bytes) = load_source(&args.source, Default::default())?;
    let table = dashboard.load(&bytes).context("Loading contestant data")?;
    let domain = Dashboard::domain(&table);
    if args.json {
        let json = serde_json::to_string_pretty(&domain).context("Serializing filter domain")?;
        println!("{json}");
        return Ok(());
    }
    print_domain(&domain);
    Ok(())
}

fn print_domain(domain: &FilterDomain) {
    let mut options = TextTable::new(["filter", "values"]).titled("Filters");
    let dates = domain
        .date_bounds
        .map(|(from, to)| format!("{from} .. {to}"))
        .unwrap_or_default();
    let ranks = domain
        .rank_bounds
        .map(|(min, max)| format!("{min} .. {max}"))
        .unwrap_or_default();
    options.push_row(vec!["date range".to_string(), dates]);
    options.push_row(vec!["locations".to_string(), domain.locations.join(", ")]);
    options.push_row(vec!["genders".to_string(), domain.genders.join(", ")]);
    options.push_row(vec!["rank range".to_string(), ranks]);
    options.print();
}
