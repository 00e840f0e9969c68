//! Plain-text and JSON rendering of the check report.

use chrono::NaiveDate;
use esports_db::stats::{EntityCounts, MapPoolListing, MapPoolRow, MatchLine, TeamSummary};
use serde_json::{Value, json};

/// Everything the check prints, taken from one snapshot
#[derive(Debug, Clone)]
pub struct Report {
    pub as_of: NaiveDate,
    pub counts: EntityCounts,
    pub matches: Vec<MatchLine>,
    pub summary: Vec<TeamSummary>,
    pub map_pool: Vec<MapPoolRow>,
}

impl Report {
    pub fn to_text(&self) -> String {
        let mut out = String::from("Table counts:\n");
        for (table, count) in self.counts.as_pairs() {
            out.push_str(&format!("  {table}: {count}\n"));
        }

        out.push_str("\nSample matches:\n");
        out.push_str(&render_table(
            &["ID", "Date", "Tournament", "Team 1", "Team 2", "Score", "Winner"],
            &self.matches.iter().map(match_row).collect::<Vec<_>>(),
        ));

        out.push_str("\nTeam summary:\n");
        out.push_str(&render_table(
            &["ID", "Team", "Played", "Wins", "Earnings"],
            &self
                .summary
                .iter()
                .map(|s| {
                    vec![
                        s.team_id.to_string(),
                        s.team_name.clone(),
                        s.matches_played.to_string(),
                        s.wins.to_string(),
                        s.total_earnings.to_string(),
                    ]
                })
                .collect::<Vec<_>>(),
        ));

        out.push_str(&format!("\nMap pool as of {}:\n", self.as_of));
        out.push_str(&render_table(
            &["Map", "Status", "From", "To"],
            &self.map_pool.iter().map(map_pool_row).collect::<Vec<_>>(),
        ));
        out
    }

    pub fn to_json(&self) -> Value {
        json!({
            "as_of": self.as_of,
            "counts": self.counts,
            "matches": self.matches,
            "team_summary": self.summary,
            "map_pool": self.map_pool,
        })
    }
}

fn dash(value: Option<impl ToString>) -> String {
    value.map_or_else(|| "-".to_string(), |v| v.to_string())
}

fn match_row(m: &MatchLine) -> Vec<String> {
    let score = match (m.team1_score, m.team2_score) {
        (Some(a), Some(b)) => format!("{a}-{b}"),
        _ => "-".to_string(),
    };
    vec![
        m.match_id.to_string(),
        dash(m.match_date),
        m.tournament.clone(),
        m.team1.clone(),
        m.team2.clone(),
        score,
        dash(m.winner.as_deref()),
    ]
}

fn map_pool_row(row: &MapPoolRow) -> Vec<String> {
    match &row.listing {
        MapPoolListing::Listed {
            status,
            valid_from,
            valid_to,
            ..
        } => vec![
            row.map_name.clone(),
            status.as_str().to_string(),
            valid_from.to_string(),
            dash(*valid_to),
        ],
        MapPoolListing::Unlisted => vec![
            row.map_name.clone(),
            "unlisted".to_string(),
            "-".to_string(),
            "-".to_string(),
        ],
    }
}

/// Left-aligned columns separated by ` | `, with a dashed rule under the header
pub fn render_table(headers: &[&str], rows: &[Vec<String>]) -> String {
    if rows.is_empty() {
        return "No rows.\n".to_string();
    }

    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let header = padded(headers.iter().copied(), &widths);
    let mut out = format!("{header}\n{}\n", "-".repeat(header.chars().count()));
    for row in rows {
        out.push_str(&padded(row.iter().map(String::as_str), &widths));
        out.push('\n');
    }
    out
}

fn padded<'a>(cells: impl Iterator<Item = &'a str>, widths: &[usize]) -> String {
    cells
        .zip(widths)
        .map(|(cell, &width)| format!("{cell:<width$}"))
        .collect::<Vec<_>>()
        .join(" | ")
}
