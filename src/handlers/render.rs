//! MarkdownV2 message bodies. Everything user-supplied goes through
//! [`escape_markdown`].

use crate::{
    db::models::{HistoryEntry, Medicine, MedicineProfile, Money, PurchasedMedicine, RankedMedicine},
    services::{PurchaseReceipt, Recommendations, StockShortage},
    utils::{escape_markdown, format_timestamp},
};

fn price(money: Money) -> String {
    escape_markdown(&format!("₹{}", money))
}

pub fn medicine(medicine: &Medicine) -> String {
    let mut text = format!(
        "💊 *{}* \\(\\#{}\\)\n   Uses: {}\n   Stock: {} · Price per unit: {}",
        escape_markdown(&medicine.name),
        medicine.id,
        escape_markdown(&medicine.uses),
        medicine.stock,
        price(medicine.price)
    );

    if medicine.is_out_of_stock() {
        text.push_str(&format!(
            "\n   ⚠️ Out of stock\\. Try /substitutes {}",
            medicine.id
        ));
    }

    text
}

fn section<T>(title: &str, items: &[T], line: impl Fn(&T) -> String) -> Option<String> {
    if items.is_empty() {
        return None;
    }

    let body = items.iter().map(line).collect::<Vec<_>>().join("\n\n");
    Some(format!("*{}*\n\n{}", title, body))
}

fn ranked(entry: &RankedMedicine) -> String {
    format!(
        "{}\n   Bought {} times",
        medicine(&entry.medicine),
        entry.frequency
    )
}

fn purchased(entry: &PurchasedMedicine) -> String {
    format!(
        "{}\n   Bought on: {}",
        medicine(&entry.medicine),
        escape_markdown(&format_timestamp(entry.purchased_at))
    )
}

pub fn recommendations(recs: &Recommendations) -> String {
    let sections = [
        section("📌 Your purchase history", &recs.history, purchased),
        section(
            "🤝 People like you also purchased",
            &recs.collaborative,
            ranked,
        ),
        section("🔥 Top medicines", &recs.top_meds, ranked),
    ];

    let body = sections.into_iter().flatten().collect::<Vec<_>>();

    let greeting = if recs.new_user {
        "Welcome\\! Here is what other customers buy most\\.\n\n"
    } else {
        ""
    };

    if body.is_empty() {
        return format!("{}No medicines available yet\\.", greeting);
    }

    format!("{}{}", greeting, body.join("\n\n"))
}

pub fn search_results(query: &str, results: &[Medicine]) -> String {
    if results.is_empty() {
        return format!("No medicines found for '{}'\\.", escape_markdown(query));
    }

    let body = results.iter().map(medicine).collect::<Vec<_>>().join("\n\n");
    format!(
        "🔍 *Found {} medicine\\(s\\) for '{}'*\n\n{}",
        results.len(),
        escape_markdown(query),
        body
    )
}

pub fn receipt(receipt: &PurchaseReceipt) -> String {
    format!(
        "✅ {}\n\nTotal: {} \\({} × {}\\)\nRemaining stock: {}\nOrder \\#{}",
        escape_markdown(&receipt.message),
        price(receipt.total_price),
        receipt.quantity,
        price(receipt.unit_price),
        receipt.stock,
        receipt.purchase_id
    )
}

pub fn shortage(shortage: &StockShortage) -> String {
    let headline = escape_markdown(&format!(
        "Only {} units of '{}' are available!",
        shortage.available, shortage.name
    ));

    match section("Substitutes", &shortage.substitutes, medicine) {
        Some(substitutes) => format!("❌ {}\n\n{}", headline, substitutes),
        None => format!("❌ {}", headline),
    }
}

pub fn history(entries: &[HistoryEntry]) -> String {
    if entries.is_empty() {
        return "You have not purchased anything yet\\.".to_string();
    }

    let body = entries
        .iter()
        .map(|entry| {
            format!(
                "• {} · *{}* x{} for {}",
                escape_markdown(&format_timestamp(entry.purchased_at)),
                escape_markdown(&entry.medicine.name),
                entry.quantity,
                price(entry.total_price)
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    format!("📜 *Your purchases*\n\n{}", body)
}

pub fn substitutes(medicine_id: i64, substitutes: &[Medicine]) -> String {
    section(
        &format!("Substitutes for \\#{}", medicine_id),
        substitutes,
        medicine,
    )
    .unwrap_or_else(|| format!("No substitutes found for \\#{}\\.", medicine_id))
}

pub fn profile(profile: &MedicineProfile) -> String {
    let details = [
        ("Chemical class", &profile.chemical_class),
        ("Therapeutic class", &profile.therapeutic_class),
        ("Action class", &profile.action_class),
        ("Habit forming", &profile.habit_forming),
        ("Side effects", &profile.side_effects),
    ];

    let mut text = medicine(&profile.medicine);
    for (label, value) in details {
        if let Some(value) = value {
            text.push_str(&format!("\n   {}: {}", label, escape_markdown(value)));
        }
    }
    text
}
