use crate::common::{Category, MenuItem};
use crate::menu::format_rupiah;

pub fn render(items: &[&MenuItem]) -> String {
    if items.is_empty() {
        return "No menu items".to_string();
    }

    let mut rows = vec![format!(
        "{:<8} {:<24} {:<10} {:>14}  {}",
        "CODE", "NAME", "CATEGORY", "PRICE", "ID"
    )];
    for item in items {
        rows.push(format!(
            "{:<8} {:<24} {:<10} {:>14}  {}",
            item.code,
            item.name,
            item.category.as_str(),
            format_rupiah(item.price),
            item.id
        ));
    }
    rows.join("\n")
}

/// Waiter view: one section per category with the price of each item.
pub fn render_sections(sections: &[(Category, Vec<&MenuItem>)]) -> String {
    sections
        .iter()
        .map(|(category, items)| {
            let mut block = vec![category.label()];
            if items.is_empty() {
                block.push("  (empty)".to_string());
            }
            for item in items {
                block.push(format!(
                    "  [{}] {} - {}",
                    item.code,
                    item.name,
                    format_rupiah(item.price)
                ));
            }
            block.join("\n")
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}
