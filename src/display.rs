//! # Display Module
//!
//! Renders price rows pivoted with instance types down the side and regions
//! across the top. Both axes are sorted; a missing price shows as `-`.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Write as _;

#[cfg(feature = "colors")]
use owo_colors::OwoColorize;

use crate::pipeline::PriceRow;
use crate::regions;

const MISSING: &str = "-";

/// Output format for the price table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Csv,
    Html,
    Json,
    Table,
}

/// Prices pivoted into instance × region cells
#[derive(Debug, Clone, PartialEq)]
pub struct PivotTable {
    pub regions: Vec<String>,
    pub rows: Vec<(String, Vec<Option<f64>>)>,
}

impl PivotTable {
    /// Smallest and largest price present in the table
    pub fn price_range(&self) -> Option<(f64, f64)> {
        self.rows
            .iter()
            .flat_map(|(_, cells)| cells.iter().flatten().copied())
            .fold(None, |acc, p| match acc {
                None => Some((p, p)),
                Some((lo, hi)) => Some((lo.min(p), hi.max(p))),
            })
    }
}

pub fn pivot(rows: &[PriceRow]) -> PivotTable {
    let regions: BTreeSet<&str> = rows.iter().map(|r| r.region.as_str()).collect();
    let mut by_instance: BTreeMap<&str, BTreeMap<&str, f64>> = BTreeMap::new();
    for row in rows {
        by_instance
            .entry(row.instance.as_str())
            .or_default()
            .insert(row.region.as_str(), row.price);
    }

    PivotTable {
        regions: regions.iter().map(|r| r.to_string()).collect(),
        rows: by_instance
            .into_iter()
            .map(|(instance, prices)| {
                let cells = regions.iter().map(|r| prices.get(r).copied()).collect();
                (instance.to_string(), cells)
            })
            .collect(),
    }
}

pub fn render(format: OutputFormat, rows: &[PriceRow], color: bool) -> anyhow::Result<String> {
    let out = match format {
        OutputFormat::Json => serde_json::to_string(rows)?,
        OutputFormat::Csv => render_csv(&pivot(rows)),
        OutputFormat::Html => render_html(&pivot(rows)),
        OutputFormat::Table => render_table(&pivot(rows), color),
    };
    Ok(out)
}

pub fn render_csv(table: &PivotTable) -> String {
    let mut out = String::new();
    let header: Vec<String> = std::iter::once("instance")
        .chain(table.regions.iter().map(String::as_str))
        .map(csv_field)
        .collect();
    out.push_str(&header.join(","));
    out.push('\n');
    for (instance, cells) in &table.rows {
        out.push_str(&csv_field(instance));
        for cell in cells {
            out.push(',');
            out.push_str(&format_cell(*cell));
        }
        out.push('\n');
    }
    out
}

/// HTML table with a white → orange background gradient over the price range
pub fn render_html(table: &PivotTable) -> String {
    let range = table.price_range();
    let mut out = String::new();
    out.push_str("<table class=\"ec2-prices\">\n<thead>\n<tr><th>instance</th>");
    for region in &table.regions {
        let _ = write!(
            out,
            "<th title=\"{}\">{}</th>",
            html_escape(regions::display_name(region).unwrap_or(region.as_str())),
            html_escape(region)
        );
    }
    out.push_str("</tr>\n</thead>\n<tbody>\n");
    for (instance, cells) in &table.rows {
        let _ = write!(out, "<tr><th>{}</th>", html_escape(instance));
        for cell in cells {
            match (cell, range) {
                (Some(price), Some((lo, hi))) => {
                    let (r, g, b) = orange_gradient(*price, lo, hi);
                    let _ = write!(
                        out,
                        "<td style=\"background-color: #{r:02x}{g:02x}{b:02x}; text-align: right\">{price}</td>"
                    );
                }
                _ => {
                    let _ = write!(out, "<td style=\"text-align: right\">{MISSING}</td>");
                }
            }
        }
        out.push_str("</tr>\n");
    }
    out.push_str("</tbody>\n</table>\n");
    out
}

/// Aligned text table. With `color`, the cheapest price in each row is
/// green and the most expensive red.
pub fn render_table(table: &PivotTable, color: bool) -> String {
    let cells: Vec<Vec<String>> = table
        .rows
        .iter()
        .map(|(_, cells)| cells.iter().map(|c| format_cell(*c)).collect())
        .collect();

    let first_width = table
        .rows
        .iter()
        .map(|(i, _)| i.len())
        .chain(std::iter::once("instance".len()))
        .max()
        .unwrap_or(0);
    let widths: Vec<usize> = table
        .regions
        .iter()
        .enumerate()
        .map(|(col, region)| {
            cells
                .iter()
                .map(|row| row[col].len())
                .chain(std::iter::once(region.len()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let mut out = String::new();
    let _ = write!(out, "{:<first_width$}", "instance");
    for (region, w) in table.regions.iter().zip(&widths) {
        let _ = write!(out, "  {:>w$}", region, w = *w);
    }
    out.push('\n');

    for ((instance, prices), texts) in table.rows.iter().zip(&cells) {
        let (lo, hi) = row_extremes(prices);
        let _ = write!(out, "{:<first_width$}", instance);
        for ((price, text), w) in prices.iter().zip(texts).zip(&widths) {
            let padded = format!("{:>w$}", text, w = *w);
            let painted = match price {
                Some(p) if color && lo < hi && *p == lo => paint_cheap(&padded),
                Some(p) if color && lo < hi && *p == hi => paint_expensive(&padded),
                _ => padded,
            };
            let _ = write!(out, "  {painted}");
        }
        out.push('\n');
    }
    out
}

/// Known regions with their display names, one per line
pub fn render_regions() -> String {
    let width = regions::region_codes().map(str::len).max().unwrap_or(0);
    regions::REGIONS
        .iter()
        .map(|(code, name)| format!("{code:<width$}  {name}\n"))
        .collect()
}

fn format_cell(cell: Option<f64>) -> String {
    cell.map(|p| p.to_string())
        .unwrap_or_else(|| MISSING.to_string())
}

fn row_extremes(prices: &[Option<f64>]) -> (f64, f64) {
    prices
        .iter()
        .flatten()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), p| {
            (lo.min(*p), hi.max(*p))
        })
}

fn orange_gradient(price: f64, lo: f64, hi: f64) -> (u8, u8, u8) {
    let t = if hi > lo {
        ((price - lo) / (hi - lo)).clamp(0.0, 1.0)
    } else {
        0.0
    };
    // white (255,255,255) → orange (255,165,0)
    let lerp = |from: f64, to: f64| (from + (to - from) * t).round() as u8;
    (255, lerp(255.0, 165.0), lerp(255.0, 0.0))
}

fn csv_field(s: &str) -> String {
    if s.contains([',', '"', '\n']) {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

fn html_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(feature = "colors")]
fn paint_cheap(s: &str) -> String {
    s.green().to_string()
}

#[cfg(feature = "colors")]
fn paint_expensive(s: &str) -> String {
    s.red().to_string()
}

// Without the colors feature the table is always plain
#[cfg(not(feature = "colors"))]
fn paint_cheap(s: &str) -> String {
    s.to_string()
}

#[cfg(not(feature = "colors"))]
fn paint_expensive(s: &str) -> String {
    s.to_string()
}
