use paddy_stock::aggregate::aggregate;
use paddy_stock::normalize::normalize_all;
use paddy_stock::{normalize, reconcile, reconcile_values, GroupMode, RawRecord, StockError};
use serde_json::json;

const ALL_MODES: [GroupMode; 4] = [
    GroupMode::NoGroup,
    GroupMode::ByWeekday,
    GroupMode::ByDate,
    GroupMode::ByType,
];

fn bags(n: i64) -> RawRecord {
    RawRecord::new().with("Bags", n)
}

fn weight(kg: f64) -> RawRecord {
    RawRecord::new().with("Weight", kg)
}

fn dated(rec: RawRecord, date: &str, ty: &str) -> RawRecord {
    rec.with("Date", date).with("Type", ty)
}

/// A messy mix of casings, formats and missing fields across several days.
fn mixed_rows() -> Vec<RawRecord> {
    vec![
        dated(bags(12), "2025-09-01", "Sona"),
        dated(weight(500.25), "2025-09-01", "Basmati"),
        RawRecord::new().with("bags", "1,000").with("date", "2025-09-02").with("type", "Sona"),
        RawRecord::new().with("weight", " 75.5 ").with("Date", "2025-09-03T09:30:00.000Z"),
        RawRecord::new().with("Weight", "0.1").with("Type", "Sona"),
        RawRecord::new().with("Weight", "0.2").with("Type", "Sona"),
        RawRecord::new().with("Weight", "abc").with("Bags", ""),
        dated(bags(3), "2025-09-07", ""),
    ]
}

// -------------------------------------------------------------------------
// Scenarios
// -------------------------------------------------------------------------

#[test]
fn scenario_a_bags_only() {
    let result = reconcile(&[bags(10)], &[], GroupMode::NoGroup);
    assert_eq!(result.totals.net_bags, 10);
    assert_eq!(result.totals.net_kg, 600.0);
    assert_eq!(result.totals.net_quintals, 6.0);
}

#[test]
fn scenario_b_weight_against_bags() {
    let result = reconcile(&[weight(500.0)], &[bags(3)], GroupMode::NoGroup);
    let all = &result.groups["All"];
    assert_eq!(all.gross_kg, 500.0);
    assert_eq!(all.scanned_kg, 180.0);
    assert_eq!(all.net_kg, 320.0);
    assert_eq!(all.net_quintals, 3.2);
    assert_eq!(result.totals.net_quintals, 3.2);
}

#[test]
fn scenario_c_scanned_exceeds_gross() {
    let result = reconcile(&[bags(5)], &[bags(10)], GroupMode::NoGroup);
    assert_eq!(result.totals.net_bags, 0);
    assert_eq!(result.totals.net_kg, 0.0);
    assert_eq!(result.totals.net_quintals, 0.0);
}

#[test]
fn scenario_d_malformed_row() {
    let row = normalize(&RawRecord::new().with("Bags", "1,250").with("Weight", "abc"));
    assert_eq!(row.bags_count, 1250);
    assert_eq!(row.kilograms, 75000.0);
}

#[test]
fn scenario_e_weekdays_clamp_independently() {
    // 2025-09-01 is a Monday, 2025-09-02 a Tuesday.
    let gross = vec![
        dated(bags(10), "2025-09-01", "Sona"),
        dated(bags(2), "2025-09-02", "Sona"),
    ];
    let scanned = vec![dated(bags(8), "2025-09-02", "Sona")];
    let result = reconcile(&gross, &scanned, GroupMode::ByWeekday);

    assert_eq!(result.groups.len(), 2);
    assert_eq!(result.groups["Mon"].net_kg, 600.0);
    assert_eq!(result.groups["Mon"].net_bags, 10);
    assert_eq!(result.groups["Tue"].net_kg, 0.0);
    assert_eq!(result.groups["Tue"].net_bags, 0);
    assert_eq!(result.totals.net_bags, 10);
    assert_eq!(result.totals.net_kg, 600.0);
}

// -------------------------------------------------------------------------
// Properties
// -------------------------------------------------------------------------

#[test]
fn bags_rule_holds() {
    for n in [0.6_f64, 1.0, 2.5, 59.4, 1234.0] {
        let row = normalize(&RawRecord::new().with("Bags", n).with("Weight", 1));
        assert_eq!(row.kilograms, n.round() * 60.0, "bags = {n}");
    }
}

#[test]
fn weight_rule_holds() {
    for kg in [1.0, 29.9, 30.0, 61.5, 12_345.67] {
        let row = normalize(&RawRecord::new().with("Bags", 0).with("Weight", kg));
        assert_eq!(row.kilograms, kg);
        assert_eq!(row.bags_count, (kg / 60.0).round() as i64);
    }
}

#[test]
fn empty_rule_holds() {
    for raw in [
        RawRecord::new(),
        RawRecord::new().with("Bags", 0).with("Weight", 0),
        RawRecord::new().with("Bags", "").with("Weight", json!(null)),
    ] {
        let row = normalize(&raw);
        assert_eq!(row.bags_count, 0);
        assert_eq!(row.kilograms, 0.0);
        assert_eq!(row.product_type, "Unknown");
    }
}

#[test]
fn aggregation_is_order_invariant() {
    let rows = normalize_all(&mixed_rows());
    let n = rows.len();
    for mode in ALL_MODES {
        let expected = aggregate(&rows, mode);
        for shift in 1..n {
            let mut rotated = rows.clone();
            rotated.rotate_left(shift);
            assert_eq!(aggregate(&rotated, mode), expected, "mode {mode}, shift {shift}");
        }
        let mut reversed = rows.clone();
        reversed.reverse();
        assert_eq!(aggregate(&reversed, mode), expected, "mode {mode}, reversed");
    }
}

#[test]
fn net_is_never_negative() {
    let gross = mixed_rows();
    let mut scanned = mixed_rows();
    scanned.push(dated(bags(500), "2025-09-01", "Sona"));
    scanned.push(dated(weight(9999.0), "2025-09-03", "Unknown"));
    for mode in ALL_MODES {
        for (g, s) in [(&gross, &scanned), (&scanned, &gross)] {
            let result = reconcile(g, s, mode);
            for (key, entry) in &result.groups {
                assert!(entry.net_kg >= 0.0, "{mode}/{key}");
                assert!(entry.net_bags >= 0, "{mode}/{key}");
                assert!(entry.net_quintals >= 0.0, "{mode}/{key}");
            }
        }
    }
}

#[test]
fn totals_are_sum_of_groups() {
    let gross = mixed_rows();
    let scanned = vec![dated(weight(250.5), "2025-09-01", "Basmati"), bags(1)];
    for mode in ALL_MODES {
        let result = reconcile(&gross, &scanned, mode);
        let kg: f64 = result.groups.values().map(|e| e.net_kg).sum();
        let bags: i64 = result.groups.values().map(|e| e.net_bags).sum();
        assert_eq!(kg, result.totals.net_kg, "mode {mode}");
        assert_eq!(bags, result.totals.net_bags, "mode {mode}");
    }
}

#[test]
fn reconcile_is_idempotent() {
    let gross = mixed_rows();
    let scanned = vec![bags(4), weight(33.3)];
    for mode in ALL_MODES {
        assert_eq!(reconcile(&gross, &scanned, mode), reconcile(&gross, &scanned, mode));
    }
}

#[test]
fn json_payloads_round_trip_through_reconcile_values() {
    let gross = json!([
        { "Bags": "10", "Type": "Sona", "Date": "2025-09-01", "CarNo": "MH12" },
        { "weight": 500, "type": "Basmati" }
    ]);
    let scanned = json!([{ "Bags": 3, "Type": "Basmati", "scannedAt": "2025-09-02T06:00:00Z" }]);
    let result = reconcile_values(&gross, &scanned, GroupMode::ByType).unwrap();
    assert_eq!(result.groups["Sona"].net_kg, 600.0);
    assert_eq!(result.groups["Basmati"].net_kg, 320.0);
    assert_eq!(result.totals.net_quintals, 9.2);

    assert!(matches!(
        reconcile_values(&json!(null), &scanned, GroupMode::ByType),
        Err(StockError::InvalidInput(_))
    ));
}

#[test]
fn extreme_values_never_break_reconcile() {
    let values = [
        "9e18", "1e40", "-1e40", "1.7976931348623157e308", "-5", "0.4", "0.5", "2.5e1",
        "1,000,000,000,000", "  12.75  ", "1e-9", "",
    ];
    let mut gross = Vec::new();
    let mut scanned = Vec::new();
    for (i, v) in values.iter().enumerate() {
        let date = format!("2025-09-{:02}", i % 7 + 1);
        let ty = if i % 2 == 0 { "Sona" } else { "Basmati" };
        gross.push(dated(RawRecord::new().with("Bags", *v), &date, ty));
        gross.push(dated(RawRecord::new().with("Weight", *v), &date, ty));
        scanned.push(dated(RawRecord::new().with("weight", *v), &date, ty));
    }
    // The same huge row twice must not overflow any accumulator.
    gross.push(bags(0).with("Bags", "9e18"));
    gross.push(bags(0).with("Bags", "9e18"));
    scanned.push(weight(0.0).with("Weight", "1e40"));
    scanned.push(weight(0.0).with("Weight", "1e40"));

    for mode in ALL_MODES {
        for (g, s) in [(&gross, &scanned), (&scanned, &gross)] {
            let result = reconcile(g, s, mode);
            let mut kg = 0.0;
            let mut bag_sum = 0i64;
            for (key, entry) in &result.groups {
                assert!(entry.net_kg >= 0.0 && entry.net_kg.is_finite(), "{mode}/{key}");
                assert!(entry.net_bags >= 0, "{mode}/{key}");
                assert!(entry.gross_kg.is_finite() && entry.scanned_kg.is_finite());
                kg += entry.net_kg;
                bag_sum += entry.net_bags;
            }
            assert_eq!(kg, result.totals.net_kg, "mode {mode}");
            assert_eq!(bag_sum, result.totals.net_bags, "mode {mode}");
            assert!(result.totals.net_quintals >= 0.0);
        }
    }
}

#[test]
fn huge_weights_are_capped_not_wrapped() {
    use paddy_stock::normalize::MAX_ROW_KILOGRAMS;

    let one = reconcile(&[weight(0.0).with("Weight", "1e40")], &[], GroupMode::NoGroup);
    assert_eq!(one.groups["All"].gross_kg, MAX_ROW_KILOGRAMS);

    let two = vec![weight(0.0).with("Weight", "1e40"), weight(0.0).with("Weight", "1e40")];
    let result = reconcile(&two, &[], GroupMode::NoGroup);
    assert_eq!(result.groups["All"].gross_kg, 2.0 * MAX_ROW_KILOGRAMS);

    let bag_rows = vec![bags(0).with("Bags", "9e18"), bags(0).with("Bags", "9e18")];
    let result = reconcile(&bag_rows, &[], GroupMode::NoGroup);
    assert!(result.totals.net_bags > 0);
    assert!(result.totals.net_kg > 0.0);
}
