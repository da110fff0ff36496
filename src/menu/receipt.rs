use std::fmt::Write;

use super::order::Order;

const RULE: &str = "----------------------------------------";

/// Rupiah amount with dot thousands separators, e.g. `Rp 12.500`.
pub fn format_rupiah(amount: i64) -> String {
    let digits = amount.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (idx, ch) in digits.chars().enumerate() {
        if idx > 0 && (digits.len() - idx) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(ch);
    }
    if amount < 0 {
        format!("-Rp {grouped}")
    } else {
        format!("Rp {grouped}")
    }
}

/// Plain-text receipt for an order.
pub fn render_receipt(order: &Order) -> String {
    let mut out = String::new();
    let customer = match order.customer.trim() {
        "" => "-",
        name => name,
    };

    // writing into a String cannot fail
    let _ = writeln!(out, "Customer: {customer}");
    let _ = writeln!(out, "{RULE}");
    for line in order.lines() {
        let _ = writeln!(
            out,
            "{} x{} @ {} = {}",
            line.name,
            line.quantity,
            format_rupiah(line.price),
            format_rupiah(line.subtotal())
        );
    }
    let _ = writeln!(out, "{RULE}");
    let _ = writeln!(out, "TOTAL {}", format_rupiah(order.total()));
    if let Some(printed_at) = order.printed_at() {
        let _ = writeln!(out, "Printed: {}", printed_at.format("%d/%m/%Y %H.%M.%S"));
    }
    out
}
