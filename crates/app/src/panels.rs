//! Dashboard panels built from registry queries.
//!
//! Each panel names the dataset it needs and the query it runs. Rendering is
//! plain text; the point is that every panel goes through the registry
//! operations and reports absent, empty and unusable datasets separately.

use services::{
    aggregate, derive_column, head, records_json, select, sort_by, top_n, AggregateOp, Lookup,
    Registry, SortOrder,
};
use shared::{SchemaError, Table, Value};

pub const GEO_LOCATION: &str = "Geo_Location";
pub const LANDING_PAGES: &str = "Landing_Pages";
pub const SEARCHES: &str = "Searches(Search_2025.01.01-2025.03.26)";
pub const DEVICES: &str = "Devices(2025.01.01-2025.03.26)";
pub const AUCTION_INSIGHTS: &str = "Auction_insights(Compare_metrics_2025.01.01-2025.03.26)";
pub const CAMPAIGNS: &str = "Campaigns";
pub const TIME_SERIES: &str = "Time_series(2025.01.01-2025.03.26)";
pub const ACTIVE_USERS: [&str; 2] = ["active_users", "GA4_python_output"];

#[derive(Debug, Clone, PartialEq)]
pub enum PanelData {
    Ready(Table),
    /// Dataset is loaded but has no rows; columns are kept for axis labels
    Empty { dataset: String, columns: Vec<String> },
    Missing { dataset: String },
    Unusable(SchemaError),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Panel {
    pub title: &'static str,
    pub data: PanelData,
}

pub fn build_panels(registry: &Registry) -> Vec<Panel> {
    vec![
        audience_engagement(registry),
        landing_pages(registry),
        paid_search(registry),
        display_ads(registry),
        source_attribution(registry),
        geo_analysis(registry),
        top_regions(registry),
        paid_campaigns(registry),
        device_performance(registry),
        funnel_velocity(registry),
    ]
}

fn run<F>(lookup: Lookup<'_>, dataset: &str, query: F) -> PanelData
where
    F: FnOnce(&Table) -> Result<Table, SchemaError>,
{
    match lookup {
        Lookup::Absent => PanelData::Missing {
            dataset: dataset.to_string(),
        },
        Lookup::Empty(table) => PanelData::Empty {
            dataset: dataset.to_string(),
            columns: table.columns().to_vec(),
        },
        Lookup::Present(table) => match query(table) {
            Ok(out) => PanelData::Ready(out),
            Err(err) => PanelData::Unusable(err),
        },
    }
}

/// New vs returning users per country
fn audience_engagement(registry: &Registry) -> Panel {
    let data = run(registry.get(GEO_LOCATION), GEO_LOCATION, |geo| {
        let derived = derive_column(geo, "returningUsers", |row| {
            match (row.number("sessions"), row.number("newUsers")) {
                (Some(sessions), Some(new_users)) => Value::Number(sessions - new_users),
                _ => Value::Missing,
            }
        })?;
        select(&derived, &["country", "newUsers", "returningUsers"])
    });
    Panel {
        title: "Audience Engagement",
        data,
    }
}

/// Three lowest-converting landing pages
fn landing_pages(registry: &Registry) -> Panel {
    let data = run(registry.get(LANDING_PAGES), LANDING_PAGES, |lp| {
        let low = top_n(lp, "sessionConversionRate", 3, SortOrder::Ascending)?;
        select(&low, &["landingPage", "sessionConversionRate"])
    });
    Panel {
        title: "Landing Pages",
        data,
    }
}

/// Five best-converting searches
fn paid_search(registry: &Registry) -> Panel {
    let data = run(registry.get(SEARCHES), SEARCHES, |searches| {
        let top = top_n(searches, "Conversions", 5, SortOrder::Descending)?;
        select(&top, &["Search", "Conversions"])
    });
    Panel {
        title: "Paid Search",
        data,
    }
}

/// First five advertisers from the auction insights
fn display_ads(registry: &Registry) -> Panel {
    let data = run(registry.get(AUCTION_INSIGHTS), AUCTION_INSIGHTS, |ins| {
        let picked = select(ins, &["Advertiser Name", "Overlap rate", "Top of page rate"])?;
        Ok(head(&picked, 5))
    });
    Panel {
        title: "Display Ads",
        data,
    }
}

/// Active users by session medium
fn source_attribution(registry: &Registry) -> Panel {
    let dataset = ACTIVE_USERS.join(" | ");
    let data = run(registry.get_first(&ACTIVE_USERS), &dataset, |act| {
        aggregate(act, "sessionMedium", "activeUsers", AggregateOp::Sum)
    });
    Panel {
        title: "Source Attribution",
        data,
    }
}

/// Countries by sessions, busiest first
fn geo_analysis(registry: &Registry) -> Panel {
    let data = run(registry.get(GEO_LOCATION), GEO_LOCATION, |geo| {
        let picked = select(geo, &["country", "sessions", "userConversionRate"])?;
        sort_by(&picked, "sessions", SortOrder::Descending)
    });
    Panel {
        title: "Geo Analysis",
        data,
    }
}

/// Three busiest countries with every recorded metric
fn top_regions(registry: &Registry) -> Panel {
    let data = run(registry.get(GEO_LOCATION), GEO_LOCATION, |geo| {
        Ok(head(&sort_by(geo, "sessions", SortOrder::Descending)?, 3))
    });
    Panel {
        title: "Top Regions",
        data,
    }
}

fn paid_campaigns(registry: &Registry) -> Panel {
    let data = run(registry.get(CAMPAIGNS), CAMPAIGNS, |camps| {
        select(camps, &["Campaign Name", "Clicks", "CTR", "Cost"])
    });
    Panel {
        title: "Paid Campaign Effectiveness",
        data,
    }
}

fn device_performance(registry: &Registry) -> Panel {
    let data = run(registry.get(DEVICES), DEVICES, |dev| {
        select(dev, &["Device", "Clicks", "Cost"])
    });
    Panel {
        title: "Device Performance",
        data,
    }
}

/// Clicks and impressions over time
fn funnel_velocity(registry: &Registry) -> Panel {
    let data = run(registry.get(TIME_SERIES), TIME_SERIES, |ts| {
        select(ts, &["Date", "Clicks", "Impressions"])
    });
    Panel {
        title: "Funnel Velocity",
        data,
    }
}

/// Plain-text rendering of one panel
pub fn render(panel: &Panel) -> String {
    let mut out = format!("## {}\n", panel.title);
    match &panel.data {
        PanelData::Ready(table) => out.push_str(&render_table(table)),
        PanelData::Empty { dataset, columns } => {
            out.push_str(&format!("{} has no rows (columns: {})\n", dataset, columns.join(", ")))
        }
        PanelData::Missing { dataset } => out.push_str(&format!("{} data missing.\n", dataset)),
        PanelData::Unusable(err) => out.push_str(&format!("cannot build panel: {}\n", err)),
    }
    out
}

/// Rows of a ready panel as JSON records; `None` when the panel has no table.
pub fn records(panel: &Panel) -> anyhow::Result<Option<String>> {
    match &panel.data {
        PanelData::Ready(table) => Ok(Some(records_json(table)?)),
        _ => Ok(None),
    }
}

fn render_table(table: &Table) -> String {
    let mut out = table.columns().join(" | ");
    out.push('\n');
    for row in table.rows() {
        let cells: Vec<String> = row.values().iter().map(|v| v.to_string()).collect();
        out.push_str(&cells.join(" | "));
        out.push('\n');
    }
    out
}
