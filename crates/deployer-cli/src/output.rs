use serde::Serialize;

pub fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    println!("{}", json);
    Ok(())
}

pub fn print_table(headers: &[&str], rows: Vec<Vec<String>>) {
    print!("{}", render_table(headers, &rows));
}

/// Left-aligned columns separated by two spaces. Widths count characters,
/// not bytes, so shortened addresses line up.
fn render_table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let widths: Vec<usize> = (0..headers.len())
        .map(|col| {
            rows.iter()
                .filter_map(|row| row.get(col))
                .map(|cell| cell.chars().count())
                .chain(std::iter::once(headers[col].chars().count()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let line = |cells: &mut dyn Iterator<Item = &str>| -> String {
        let padded: Vec<String> = cells
            .zip(&widths)
            .map(|(cell, &width)| format!("{cell:width$}"))
            .collect();
        format!("{}\n", padded.join("  ").trim_end())
    };

    let mut out = line(&mut headers.iter().copied());
    let rule: Vec<String> = widths.iter().map(|&w| "-".repeat(w)).collect();
    out.push_str(&line(&mut rule.iter().map(String::as_str)));
    for row in rows {
        out.push_str(&line(&mut row.iter().map(String::as_str)));
    }
    out
}

/// Shorten an address for table output: `0x1234…abcd`.
pub fn short_address(address: &str) -> String {
    if address.len() <= 14 {
        return address.to_string();
    }
    format!("{}…{}", &address[..6], &address[address.len() - 4..])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_columns_align_on_characters() {
        let rows = vec![
            vec!["PAYR".to_string(), short_address("0x6B175474E89094C44Da98b954EedeAC495271d0F")],
            vec!["Crowdsale".to_string(), String::new()],
        ];
        let table = render_table(&["COMPONENT", "ADDRESS"], &rows);
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines[0], "COMPONENT  ADDRESS");
        assert_eq!(lines[1], "---------  -----------");
        assert_eq!(lines[2], "PAYR       0x6B17…1d0F");
        assert_eq!(lines[3], "Crowdsale");
    }

    #[test]
    fn short_address_keeps_both_ends() {
        assert_eq!(
            short_address("0x6B175474E89094C44Da98b954EedeAC495271d0F"),
            "0x6B17…1d0F"
        );
        assert_eq!(short_address("0x12"), "0x12");
    }
}
