//! Rendering for fetched resources.

use clap::ValueEnum;

use crate::resource::Resource;

/// Output format of the get command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Aligned columns driven by the kind's field descriptors
    Table,
    /// One YAML document per resource
    Yaml,
}

/// Values longer than the column hint are clipped with an ellipsis.
pub(crate) fn clip(value: &str, width: usize) -> String {
    if value.chars().count() <= width {
        return value.to_string();
    }
    let mut clipped: String = value.chars().take(width.saturating_sub(3)).collect();
    clipped.push_str("...");
    clipped
}

fn render_table(items: &[Resource]) -> String {
    let Some(first) = items.first() else {
        return String::new();
    };
    let fields = first.kind().fields();

    let mut rows: Vec<Vec<String>> = Vec::with_capacity(items.len() + 1);
    rows.push(fields.iter().map(|f| f.header.to_string()).collect());
    for item in items {
        rows.push(
            fields
                .iter()
                .map(|f| clip(&(f.get)(item), f.width))
                .collect(),
        );
    }

    let mut widths = vec![0usize; fields.len()];
    for row in &rows {
        for (i, cell) in row.iter().enumerate() {
            widths[i] = widths[i].max(cell.chars().count());
        }
    }

    let mut out = String::new();
    for row in &rows {
        let mut line = String::new();
        for (i, cell) in row.iter().enumerate() {
            line.push_str(cell);
            if i + 1 < row.len() {
                for _ in cell.chars().count()..widths[i] + 3 {
                    line.push(' ');
                }
            }
        }
        out.push_str(line.trim_end());
        out.push('\n');
    }
    out
}

/// Prints resources as an aligned table.
pub(crate) fn print_table(items: &[Resource]) {
    print!("{}", render_table(items));
}

/// Prints resources as YAML documents.
pub(crate) fn print_yaml(items: &[Resource]) -> anyhow::Result<()> {
    for item in items {
        print!("{}", item.to_yaml()?);
        println!();
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Domain;

    #[test]
    fn clip_keeps_short_values_and_ellipsizes_long_ones() {
        assert_eq!(clip("short", 10), "short");
        assert_eq!(clip("exactly-ten", 11), "exactly-ten");
        assert_eq!(clip("much-too-long-value", 10), "much-to...");
    }

    #[test]
    fn table_has_a_header_and_one_row_per_item() {
        let items = vec![
            Resource::Domain(Domain::new("alpha")),
            Resource::Domain(Domain::new("beta")),
        ];
        let table = render_table(&items);
        let lines: Vec<&str> = table.lines().collect();

        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("NAME"));
        assert!(lines[1].starts_with("alpha"));
        assert!(lines[2].starts_with("beta"));
    }

    #[test]
    fn empty_listing_renders_nothing() {
        assert!(render_table(&[]).is_empty());
    }
}
