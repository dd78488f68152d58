use captable_core::format::{
    format_currency, format_percentage, format_shares, instrument_label, instrument_labels,
    parse_percentage, stakeholder_color,
};
use captable_core::model::{Instrument, StakeholderType, Valuation};
use rust_decimal_macros::dec;

#[test]
fn currency_groups_thousands_and_drops_whole_cents() {
    assert_eq!(format_currency(dec!(2_000_000)), "€2,000,000");
    assert_eq!(format_currency(dec!(8_000_000)), "€8,000,000");
    assert_eq!(format_currency(dec!(950)), "€950");
}

#[test]
fn currency_keeps_two_decimals_for_fractional_amounts() {
    assert_eq!(format_currency(dec!(0.72)), "€0.72");
    assert_eq!(format_currency(dec!(1_234_567.5)), "€1,234,567.50");
}

#[test]
fn currency_handles_negative_amounts() {
    assert_eq!(format_currency(dec!(-1_500)), "-€1,500");
}

#[test]
fn percentage_renders_one_decimal_place() {
    assert_eq!(format_percentage(dec!(20)), "20.0%");
    assert_eq!(format_percentage(dec!(43.2)), "43.2%");
    assert_eq!(format_percentage(dec!(8)), "8.0%");
}

/// Formatting is idempotent under a format → parse → format round trip.
#[test]
fn percentage_round_trips_to_the_same_string() {
    for value in [dec!(20), dec!(43.2), dec!(28.8), dec!(0), dec!(99.9)] {
        let formatted = format_percentage(value);
        let reparsed = parse_percentage(&formatted).expect("reparse");
        assert_eq!(format_percentage(reparsed), formatted);
    }
}

#[test]
fn shares_group_thousands() {
    assert_eq!(format_shares(6_000_000), "6,000,000");
    assert_eq!(format_shares(100), "100");
    assert_eq!(format_shares(1_000), "1,000");
}

#[test]
fn stakeholder_colors_are_deterministic_per_type() {
    assert_eq!(
        stakeholder_color(StakeholderType::Founder, 0),
        stakeholder_color(StakeholderType::Founder, 7),
    );
    assert_ne!(
        stakeholder_color(StakeholderType::Founder, 0),
        stakeholder_color(StakeholderType::Investor, 0),
    );
}

#[test]
fn other_type_cycles_its_palette_by_index() {
    let first = stakeholder_color(StakeholderType::Other, 0);
    let second = stakeholder_color(StakeholderType::Other, 1);
    assert_ne!(first, second);
    // The palette wraps.
    assert_eq!(first, stakeholder_color(StakeholderType::Other, 5));
}

#[test]
fn instrument_labels_cover_every_variant() {
    let equity = Instrument::Equity { valuation: Valuation::PreMoney(dec!(1)) };
    let safe = Instrument::Safe { valuation_cap: None, discount_pct: None };
    assert_eq!(instrument_label(&equity), "Priced equity round");
    assert!(instrument_label(&safe).contains("SAFE"));

    let labels = instrument_labels();
    assert_eq!(labels.len(), 3);
    for (tag, label) in labels {
        assert!(!tag.is_empty());
        assert!(!label.is_empty());
    }
}
