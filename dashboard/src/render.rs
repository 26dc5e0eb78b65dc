//! Terminal rendering of the render models produced by `shared`.

use std::fmt::Write;

use serde_json::Value;
use shared::chat::{ChatEntry, ChatView};
use shared::epd::{RiskCounts, RiskLevel, ScanCreated, ScanEntry, ScanReport};
use shared::format::{FormattedMessage, Style};
use shared::models::{
    CertificationNames, FilterOption, Health, Product, SimilarProducts, Stats, IMAGE_KEYS,
};
use shared::{PageItem, PaginationModel, ResultsBody, ResultsView, SearchStatus};

const BOLD: &str = "\x1b[1m";
const DIM: &str = "\x1b[2m";
const RESET: &str = "\x1b[0m";
const CLEAR_SCREEN: &str = "\x1b[2J\x1b[H";

/// Longest description shown on a result card.
const CARD_DESCRIPTION_CHARS: usize = 160;

pub fn results(view: &ResultsView<'_>) -> String {
    let mut out = String::new();
    if view.scroll_to_top {
        out.push_str(CLEAR_SCREEN);
    }

    if view.status == SearchStatus::Loading {
        out.push_str("Searching...\n");
        return out;
    }

    match &view.body {
        ResultsBody::Empty => out.push_str("No search yet. Type a query or pick a filter.\n"),
        ResultsBody::Error(message) => {
            let _ = writeln!(out, "Error: {}", message);
        }
        ResultsBody::Products(products) => {
            let heading = if view.query.trim().is_empty() {
                "Browsing all products".to_string()
            } else {
                format!("Results for \"{}\"", view.query.trim())
            };
            let _ = writeln!(
                out,
                "{}{}{} ({} found, {} filters active)\n",
                BOLD, heading, RESET, view.total, view.active_filters
            );
            if products.is_empty() {
                out.push_str("No products match the current search.\n");
            }
            for product in products.iter() {
                out.push_str(&card(product));
                out.push('\n');
            }
        }
    }

    if let Some(model) = &view.pagination {
        out.push_str(&pagination(model));
        out.push('\n');
    }
    out
}

pub fn card(product: &Product) -> String {
    let mut out = String::new();
    let _ = write!(out, "{}{}{}", BOLD, product.display_name(), RESET);
    let _ = write!(out, " {}(ID: {}){}", DIM, product.id, RESET);
    if let Some(score) = product.relevance() {
        let _ = write!(out, "  relevance {:.0}%", score * 100.0);
    }
    out.push('\n');

    if let Some(manufacturer) = &product.manufacturer_name {
        let _ = writeln!(out, "  {}", manufacturer);
    }
    let categories = product.category_names();
    if !categories.is_empty() {
        let _ = writeln!(out, "  Categories: {}", categories.join(", "));
    }
    if let Some(description) = &product.product_description {
        let _ = writeln!(out, "  {}", truncate(description, CARD_DESCRIPTION_CHARS));
    }

    let mut badges = Vec::new();
    let certifications = product.certification_names();
    if !certifications.is_empty() {
        badges.push(format!("{} certifications", certifications.len()));
    }
    if let Some(recycled) = product.recycled_content_percentage {
        badges.push(format!("{:.0}% recycled", recycled));
    }
    if let Some(carbon) = product.net_carbon_emissions {
        badges.push(format!("{} kg CO2e", carbon));
    }
    if !badges.is_empty() {
        let _ = writeln!(out, "  [{}]", badges.join("] ["));
    }
    if let Some(explanation) = product.explanation() {
        let _ = writeln!(out, "  {}Why: {}{}", DIM, explanation, RESET);
    }
    out
}

pub fn pagination(model: &PaginationModel) -> String {
    let mut parts = Vec::new();
    parts.push(if model.previous_enabled {
        "< Prev".to_string()
    } else {
        format!("{}< Prev{}", DIM, RESET)
    });
    for item in &model.items {
        parts.push(match item {
            PageItem::Page { number, current: true } => format!("{}[{}]{}", BOLD, number, RESET),
            PageItem::Page { number, .. } | PageItem::Jump { number } => number.to_string(),
            PageItem::Ellipsis => "...".to_string(),
        });
    }
    parts.push(if model.next_enabled {
        "Next >".to_string()
    } else {
        format!("{}Next >{}", DIM, RESET)
    });
    format!("{}   page {} of {}", parts.join(" "), model.page, model.total_pages)
}

/// Every field of a product, for the detail view.
pub fn product_detail(product: &Product) -> String {
    let mut out = card(product);

    let certifications = product.certification_names();
    if !certifications.is_empty() {
        out.push_str("  Certifications:\n");
        for name in certifications {
            let _ = writeln!(out, "    - {}", name);
        }
    }
    if let Some(path) = product.image_path() {
        let _ = writeln!(out, "  Image: {}", path);
    }
    let numbers = [
        ("Recyclable", product.recyclable_percentage, "%"),
        ("Expected lifespan", product.expected_lifespan_years, " years"),
        ("Warranty", product.manufacturers_warranty_years, " years"),
    ];
    for (label, value, unit) in numbers {
        if let Some(value) = value {
            let _ = writeln!(out, "  {}: {}{}", label, value, unit);
        }
    }

    let mut keys: Vec<_> = product
        .extra
        .keys()
        .filter(|key| !IMAGE_KEYS.contains(&key.as_str()))
        .collect();
    keys.sort();
    for key in keys {
        match &product.extra[key] {
            Value::Null => {}
            Value::String(s) if s.trim().is_empty() => {}
            Value::String(s) => {
                let _ = writeln!(out, "  {}: {}", key, s);
            }
            other => {
                let _ = writeln!(out, "  {}: {}", key, other);
            }
        }
    }
    out
}

pub fn stats(stats: &Stats) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}Catalog statistics{}", BOLD, RESET);
    let _ = writeln!(out, "  Products:       {}", stats.total_products);
    let _ = writeln!(out, "  Categories:     {}", stats.total_categories);
    let _ = writeln!(out, "  Manufacturers:  {}", stats.total_manufacturers);
    let sustainability = &stats.sustainability_stats;
    let _ = writeln!(out, "  Certified:      {}", sustainability.with_certifications);
    let _ = writeln!(out, "  Carbon data:    {}", sustainability.with_carbon_data);
    let _ = writeln!(out, "  Recycled data:  {}", sustainability.with_recycled_content);

    out.push_str("  Top categories:\n");
    for (name, count) in &stats.top_categories {
        let _ = writeln!(out, "    {:<40} {}", name, count);
    }
    out.push_str("  Top manufacturers:\n");
    for (name, count) in &stats.top_manufacturers {
        let _ = writeln!(out, "    {:<40} {}", name, count);
    }
    out
}

pub fn filter_options(title: &str, options: &[&FilterOption]) -> String {
    let mut out = format!("{}{}{}\n", BOLD, title, RESET);
    if options.is_empty() {
        out.push_str("  (none)\n");
    }
    for option in options {
        let _ = writeln!(out, "  {} ({})", option.name, option.count);
    }
    out
}

pub fn similar(similar: &SimilarProducts) -> String {
    let mut out = format!("{}Similar to {}{} ({} found)\n", BOLD, similar.product_id, RESET, similar.count);
    for product in &similar.similar_products {
        out.push_str(&card(product));
    }
    out
}

pub fn certifications(names: &CertificationNames) -> String {
    let mut out = format!("{}{} certification types{}\n", BOLD, names.count, RESET);
    for name in &names.names {
        let _ = writeln!(out, "  {}", name);
    }
    out
}

pub fn health(health: &Health) -> String {
    let mut out = format!("Backend: {}\n", health.status);
    if let Some(loaded) = health.products_loaded {
        let _ = writeln!(out, "  Products loaded: {}", loaded);
    }
    if let Some(ready) = health.embeddings_ready {
        let _ = writeln!(out, "  Embeddings ready: {}", ready);
    }
    if let Some(configured) = health.api_configured {
        let _ = writeln!(out, "  Model API configured: {}", configured);
    }
    if let Some(error) = &health.error {
        let _ = writeln!(out, "  Error: {}", error);
    }
    out
}

/// Result of a scan that was just run.
pub fn scan(scan: &ScanCreated) -> String {
    let summary = &scan.summary;
    let mut out = format!("{}EPD scan #{}{}
", BOLD, summary.scan_id, RESET);
    out.push_str(&risk_counts(&summary.counts));
    if let Some(advisory) = &summary.advisory {
        let _ = writeln!(out, "  {}{}{}", DIM, advisory, RESET);
    }
    out.push_str(&scan_entries(&scan.results));
    out
}

/// A stored scan fetched by number.
pub fn scan_report(report: &ScanReport) -> String {
    let mut out = format!("{}EPD scan #{}{}", BOLD, report.scan_id, RESET);
    if let Some(created_at) = &report.created_at {
        let _ = write!(out, " {}({}){}", DIM, created_at, RESET);
    }
    out.push('\n');
    out.push_str(&risk_counts(&report.counts));
    out.push_str(&scan_entries(&report.results));
    out
}

fn risk_counts(counts: &RiskCounts) -> String {
    let buckets: Vec<_> = [RiskLevel::Red, RiskLevel::Yellow, RiskLevel::Green]
        .into_iter()
        .map(|level| format!("{} {}", counts.get(level), level))
        .collect();
    format!("  {} of {} products\n", buckets.join(", "), counts.total)
}

fn scan_entries(entries: &[ScanEntry]) -> String {
    let mut out = String::new();
    for entry in entries {
        let _ = write!(out, "  [{:<6}] {}", entry.risk_level, entry.display_name());
        let _ = write!(out, " {}(input {}){}", DIM, entry.input_product_id, RESET);
        if let Some(manufacturer) = &entry.manufacturer_name {
            let _ = write!(out, " - {}", manufacturer);
        }
        out.push('\n');
        if !entry.certifications.is_empty() {
            let _ = writeln!(out, "      Certifications: {}", entry.certifications.join(", "));
        }
        if let Some(url) = &entry.epd_url {
            let _ = writeln!(out, "      EPD: {}", url);
        }
        for reason in &entry.reasons {
            let _ = writeln!(out, "      - {}", reason);
        }
    }
    out
}

/// A completed assistant message with terminal styling.
pub fn formatted(message: &FormattedMessage) -> String {
    message
        .lines
        .iter()
        .map(|line| {
            line.iter()
                .map(|segment| match segment.style {
                    Style::Plain => segment.text.clone(),
                    Style::Bold => format!("{}{}{}", BOLD, segment.text, RESET),
                    Style::Muted => format!("{}{}{}", DIM, segment.text, RESET),
                })
                .collect::<String>()
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn chat_entry(entry: &ChatEntry) -> String {
    match entry {
        ChatEntry::User(text) => format!("{}you>{} {}", BOLD, RESET, text),
        ChatEntry::Assistant { formatted: message, .. } => {
            format!("{}assistant>{}\n{}", BOLD, RESET, formatted(message))
        }
        ChatEntry::Suggestions(items) => {
            let mut out = format!("{}assistant>{} Try asking:", BOLD, RESET);
            for (i, item) in items.iter().enumerate() {
                let _ = write!(out, "\n  /{} {}", i + 1, item);
            }
            out
        }
        ChatEntry::Error(message) => format!("{}error>{} {}", BOLD, RESET, message),
    }
}

/// Whole transcript, used when the panel is first drawn.
pub fn chat(view: &ChatView<'_>) -> String {
    let mut out: Vec<String> = view.entries.iter().map(chat_entry).collect();
    if view.typing {
        out.push(format!("{}assistant is typing...{}", DIM, RESET));
    }
    if let Some(partial) = view.partial {
        out.push(format!("{}{}{}", DIM, partial, RESET));
    }
    out.join("\n")
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let cut: String = text.chars().take(max_chars).collect();
    format!("{}...", cut.trim_end())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product(json: serde_json::Value) -> Product {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn test_card_shows_relevance_and_explanation() {
        let rendered = card(&product(serde_json::json!({
            "id": 3,
            "product_name": "Cork Underlay",
            "manufacturer_name": "Amorim",
            "llm_relevance": 0.9,
            "llm_explanation": "Natural, low carbon"
        })));
        assert!(rendered.contains("Cork Underlay"));
        assert!(rendered.contains("(ID: 3)"));
        assert!(rendered.contains("relevance 90%"));
        assert!(rendered.contains("Why: Natural, low carbon"));
    }

    #[test]
    fn test_card_skips_blank_explanation() {
        let rendered = card(&product(serde_json::json!({
            "id": 4,
            "product_name": "Wool Carpet",
            "llm_relevance": 0.7,
            "llm_explanation": ""
        })));
        assert!(rendered.contains("relevance 70%"));
        assert!(!rendered.contains("Why:"));
    }

    #[test]
    fn test_scan_report_lists_risk_and_reasons() {
        let report: ScanReport = serde_json::from_value(serde_json::json!({
            "scan_id": 5,
            "created_at": "2026-03-01T10:00:00",
            "counts": {"high": 1, "medium": 0, "low": 1, "total": 2},
            "results": [
                {
                    "input_product_id": "42",
                    "product_name": "Acoustic Panel",
                    "epd_url": "https://epd.example.com/42.pdf",
                    "risk_level": "Green",
                    "reasons": ["EPD link is accessible; please verify the issue date manually"]
                },
                {"input_product_id": "nope", "risk_level": "Red", "reasons": ["Missing EPD file link"]}
            ]
        }))
        .unwrap();
        let rendered = scan_report(&report);
        assert!(rendered.contains("EPD scan #5"));
        assert!(rendered.contains("1 High, 0 Medium, 1 Low of 2 products"));
        assert!(rendered.contains("[Low   ] Acoustic Panel"));
        assert!(rendered.contains("[High  ] Unknown product"));
        assert!(rendered.contains("- Missing EPD file link"));
    }

    #[test]
    fn test_pagination_marks_current_page() {
        let model = PaginationModel::build(5, 12).unwrap();
        let rendered = pagination(&model);
        assert!(rendered.contains(&format!("{}[5]{}", BOLD, RESET)));
        assert!(rendered.contains("..."));
        assert!(rendered.ends_with("page 5 of 12"));
    }

    #[test]
    fn test_truncate_on_char_boundary() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("ééééé", 3), "ééé...");
    }

    #[test]
    fn test_detail_lists_extra_fields() {
        let rendered = product_detail(&product(serde_json::json!({
            "id": 1,
            "product_name": "Panel",
            "lead_time": "6 weeks",
            "image_url": "/products/p.jpg",
            "product_code": "",
            "warranty_notes": null
        })));
        assert!(rendered.contains("lead_time: 6 weeks"));
        assert!(rendered.contains("Image: /products/p.jpg"));
        assert!(!rendered.contains("image_url"));
        assert!(!rendered.contains("product_code"));
        assert!(!rendered.contains("warranty_notes"));
    }
}
