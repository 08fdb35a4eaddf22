use crate::api::{Asset, CampusLocation, Claim, ItemCategory, ItemResponse};
use crate::identity::UserIdentity;

const MAX_COL_WIDTH: usize = 48;

/// Render rows as an ASCII table. Returns an empty string when there are no rows.
pub fn render_table(cols: &[&str], rows: &[Vec<String>]) -> String {
    if rows.is_empty() {
        return String::new();
    }
    let mut widths: Vec<usize> = cols.iter().map(|s| display_len(s).min(MAX_COL_WIDTH)).collect();
    for r in rows {
        for (i, cell) in r.iter().enumerate().take(cols.len()) {
            let w = display_len(cell);
            if w > widths[i] { widths[i] = w.min(MAX_COL_WIDTH); }
        }
    }
    let header: Vec<String> = cols.iter().map(|c| c.to_string()).collect();
    let sep = build_separator(&widths);
    let mut out = String::new();
    out.push_str(&sep);
    out.push('\n');
    out.push_str(&build_row(&header, &widths));
    out.push('\n');
    out.push_str(&sep);
    out.push('\n');
    for r in rows {
        out.push_str(&build_row(r, &widths));
        out.push('\n');
    }
    out.push_str(&sep);
    out.push('\n');
    out.push_str(&format!("rows: {}\n", rows.len()));
    out
}

pub fn print_table(cols: &[&str], rows: &[Vec<String>]) {
    if rows.is_empty() {
        println!("(no results)");
        return;
    }
    print!("{}", render_table(cols, rows));
}

fn opt(v: &Option<String>) -> String { v.clone().unwrap_or_default() }

pub fn item_rows(items: &[ItemResponse]) -> Vec<Vec<String>> {
    items
        .iter()
        .map(|i| {
            let place = i.location_name.clone().or_else(|| i.location_last_seen.clone()).unwrap_or_default();
            let date = i.date_lost.clone().or_else(|| i.date_found.clone()).unwrap_or_default();
            vec![i.id.clone(), i.kind.as_wire(), i.status.as_wire(), i.title.clone(), i.category_name.clone(), place, date]
        })
        .collect()
}
pub const ITEM_COLS: [&str; 7] = ["id", "type", "status", "title", "category", "location", "date"];

pub fn claim_rows(claims: &[Claim]) -> Vec<Vec<String>> {
    claims
        .iter()
        .map(|c| vec![c.id.clone(), c.status.as_wire(), c.owner.name.clone(), c.created_at.clone()])
        .collect()
}
pub const CLAIM_COLS: [&str; 4] = ["id", "status", "claimer", "created_at"];

pub fn category_rows(cats: &[ItemCategory]) -> Vec<Vec<String>> {
    cats.iter().map(|c| vec![c.id.clone(), c.name.clone(), opt(&c.description)]).collect()
}
pub const CATEGORY_COLS: [&str; 3] = ["id", "name", "description"];

pub fn location_rows(locs: &[CampusLocation]) -> Vec<Vec<String>> {
    locs.iter()
        .map(|l| vec![l.id.clone(), l.name.clone(), format!("{:.5}", l.latitude), format!("{:.5}", l.longitude)])
        .collect()
}
pub const LOCATION_COLS: [&str; 4] = ["id", "name", "latitude", "longitude"];

pub fn asset_rows(assets: &[Asset]) -> Vec<Vec<String>> {
    assets
        .iter()
        .map(|a| vec![a.id.clone(), opt(&a.description), opt(&a.category_name), a.lost_mode.to_string()])
        .collect()
}
pub const ASSET_COLS: [&str; 4] = ["id", "description", "category", "lost_mode"];

pub fn describe_user(user: Option<&UserIdentity>) -> String {
    match user {
        Some(u) => {
            let mut s = format!("{} <{}> role={} id={}", u.name, u.email, u.role, u.id);
            if let Some(f) = &u.faculty { s.push_str(&format!(" faculty={}", f)); }
            s
        }
        None => "not logged in".to_string(),
    }
}

fn display_len(s: &str) -> usize { s.chars().count() }

fn build_separator(widths: &[usize]) -> String {
    let mut s = String::new();
    s.push('+');
    for w in widths {
        s.push_str(&"-".repeat(*w + 2));
        s.push('+');
    }
    s
}

fn build_row(cells: &[String], widths: &[usize]) -> String {
    let mut s = String::new();
    s.push('|');
    for (i, w) in widths.iter().enumerate() {
        let cell = cells.get(i).cloned().unwrap_or_default();
        let (text, align_right) = (truncate(&cell, *w), is_numeric_like(&cell));
        let pad = w.saturating_sub(display_len(&text));
        s.push(' ');
        if align_right {
            s.push_str(&" ".repeat(pad));
            s.push_str(&text);
        } else {
            s.push_str(&text);
            s.push_str(&" ".repeat(pad));
        }
        s.push_str(" |");
    }
    s
}

fn truncate(s: &str, max: usize) -> String {
    let len = s.chars().count();
    if len <= max { return s.to_string(); }
    if max <= 1 { return "…".to_string(); }
    s.chars().take(max - 1).collect::<String>() + "…"
}

fn is_numeric_like(s: &str) -> bool {
    // crude detection for aligning numbers to right
    let st = s.trim();
    if st.is_empty() { return false; }
    let mut has_digit = false;
    for ch in st.chars() {
        if ch.is_ascii_digit() { has_digit = true; continue; }
        if ".-+".contains(ch) { continue; }
        return false;
    }
    has_digit
}
