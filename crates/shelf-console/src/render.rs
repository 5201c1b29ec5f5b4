use std::fmt::Write;

use shelf_client::{Book, BookCategory, Staff, User};
use shelf_lists::ListView;
use shelf_reference::Snapshot;

/// A model that can be shown as one table row.
pub trait Row {
    const COLUMNS: &'static [&'static str];

    fn cells(&self) -> Vec<String>;
}

fn or_dash(value: Option<&str>) -> String {
    value.filter(|v| !v.is_empty()).unwrap_or("-").to_string()
}

fn yes_no(flag: bool) -> String {
    if flag { "yes" } else { "no" }.to_string()
}

impl Row for Book {
    const COLUMNS: &'static [&'static str] =
        &["title", "author", "category", "premium", "rating", "views"];

    fn cells(&self) -> Vec<String> {
        vec![
            self.title.clone(),
            self.author.clone(),
            or_dash(Some(self.category_name.as_str())),
            yes_no(self.is_premium),
            format!("{:.1} ({})", self.average_rating, self.total_ratings),
            self.total_views.to_string(),
        ]
    }
}

impl Row for BookCategory {
    const COLUMNS: &'static [&'static str] = &["name", "description", "status", "books"];

    fn cells(&self) -> Vec<String> {
        vec![
            self.name.clone(),
            or_dash(Some(self.description.as_str())),
            or_dash(Some(self.status.as_str())),
            self.books_count.to_string(),
        ]
    }
}

impl Row for Staff {
    const COLUMNS: &'static [&'static str] = &["code", "name", "email", "position", "active"];

    fn cells(&self) -> Vec<String> {
        vec![
            or_dash(Some(self.staff_code.as_str())),
            self.full_name.clone(),
            self.email.clone(),
            or_dash(Some(self.position.as_str())),
            yes_no(self.is_active),
        ]
    }
}

impl Row for User {
    const COLUMNS: &'static [&'static str] = &["username", "name", "email", "phone", "active"];

    fn cells(&self) -> Vec<String> {
        vec![
            self.username.clone(),
            self.full_name.clone(),
            self.email.clone(),
            or_dash(self.phone.as_deref()),
            yes_no(self.is_active),
        ]
    }
}

fn line<'a>(cells: impl Iterator<Item = &'a str>, widths: &[usize]) -> String {
    let padded: Vec<String> = cells
        .zip(widths)
        .map(|(cell, &width)| format!("{cell:<width$}"))
        .collect();
    padded.join(" | ").trim_end().to_string()
}

pub fn table(columns: &[&str], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = columns.iter().map(|c| c.chars().count()).collect();
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut out = String::new();
    let _ = writeln!(out, "{}", line(columns.iter().copied(), &widths));
    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    let _ = writeln!(out, "{}", rule.join("-+-"));
    for row in rows {
        let _ = writeln!(out, "{}", line(row.iter().map(String::as_str), &widths));
    }
    out
}

pub fn view<T: Row>(title: &str, view: &ListView<T>) -> String {
    let mut out = String::new();
    let query = &view.query;
    let _ = write!(
        out,
        "{title}: page {} of {} ({} total), sorted by {} {}",
        query.page_number(),
        view.total_pages().max(1),
        view.total_count(),
        query.sort().key,
        if query.sort().direction.is_ascending() { "asc" } else { "desc" },
    );
    if !query.free_text().trim().is_empty() {
        let _ = write!(out, ", search \"{}\"", query.free_text().trim());
    }
    for (key, value) in query.filters() {
        let _ = write!(out, ", {key}={value}");
    }
    out.push('\n');

    if let Some(error) = &view.error {
        let _ = writeln!(out, "error: {error}");
    }
    if view.items().is_empty() {
        if view.result.is_some() {
            out.push_str("(no rows)\n");
        }
        return out;
    }

    let rows: Vec<Vec<String>> = view.items().iter().map(Row::cells).collect();
    out.push_str(&table(T::COLUMNS, &rows));
    out
}

pub fn categories(snapshot: &Snapshot) -> String {
    if let Some(error) = snapshot.error() {
        return format!("categories unavailable: {error}\n");
    }
    let rows: Vec<Vec<String>> = snapshot
        .options
        .iter()
        .map(|option| vec![option.value.clone(), option.label.clone()])
        .collect();
    table(&["id", "name"], &rows)
}
