pub fn header(level: usize, text: &str) -> String {
    let level = level.max(1);
    format!("{} {}", "#".repeat(level), text)
}

pub fn bold(label: &str, value: &str) -> String {
    format!("**{}:** {}", label, value)
}

pub fn table_row(cells: &[&str]) -> String {
    format!("| {} |", cells.join(" | "))
}

pub fn table_divider(columns: usize) -> String {
    format!("|{}", "---|".repeat(columns.max(1)))
}
