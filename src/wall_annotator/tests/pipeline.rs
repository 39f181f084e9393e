use wall_annotator::{
    AnnotationParams, annotate,
    bar::parse_bars_json,
    render::ShapeKind,
    threshold::{Endpoint, ThresholdPair},
    timezone::parse_tz,
};

/// Three trading days, deliberately out of order, one malformed row.
fn fixture() -> &'static str {
    r#"
{
  "data": [
    { "date": "2024-01-02", "time": "10:00", "open": 100, "high": 101.5, "low": 99.8, "close": 101,
      "volumeZ": 2.5, "rangeOpenCloseZ": 0.5, "rangeHighLowZ": 0.2 },
    { "date": "2024-01-02", "time": "11:00", "open": 100, "high": 100.2, "low": 98.6, "close": 99,
      "volumeZ": -3.5, "rangeOpenCloseZ": -0.4, "rangeHighLowZ": 0.1 },
    { "date": "2024-01-02", "time": "9:30", "open": 100, "high": 100.8, "low": 99.7, "close": 100.5,
      "volumeZ": 0.4, "rangeOpenCloseZ": 0.01, "rangeHighLowZ": 0.3,
      "wallLevel": 4500, "wallPercentile": 0.95, "durationScore": 0.05 },
    { "date": "2024-01-03", "time": "10:00", "open": 101, "high": 102, "low": 99.5, "close": 100,
      "volumeZ": "1.2", "rangeOpenCloseZ": -0.6, "rangeHighLowZ": 1.4,
      "wallLevel": 4510, "wallPercentile": 0.5, "durationScore": 0.93 },
    { "date": "2024-01-03", "time": "11:00", "open": 100, "high": 102.4, "low": 99.9, "close": 102,
      "volumeZ": -1.5, "rangeOpenCloseZ": 0.9, "rangeHighLowZ": 0.2,
      "wallLevel": 4520, "wallPercentile": 0.05, "durationScore": 0.01 },
    { "date": "2024-01-03", "time": "12:00", "open": "abc", "high": 102, "low": 99, "close": 100,
      "rangeOpenCloseZ": 0.5, "rangeHighLowZ": 0 },
    { "date": "2024-01-01", "time": "10:00", "open": 90, "high": 95, "low": 89, "close": 94,
      "volumeZ": 4.2, "rangeOpenCloseZ": 0.5, "rangeHighLowZ": 0.1,
      "wallLevel": 4400, "wallPercentile": 0.99, "durationScore": 0.99 }
  ]
}
"#
}

fn params() -> AnnotationParams {
    AnnotationParams {
        lookback: 2,
        ..Default::default()
    }
}

#[test]
fn fixture_category_codes() {
    let raw = parse_bars_json(fixture()).unwrap();
    let set = annotate(&raw, &params());
    let codes: Vec<u8> = set.categories().into_iter().map(|c| c.code()).collect();
    insta::assert_debug_snapshot!("fixture_category_codes", codes);
}

#[test]
fn window_drops_the_oldest_day() {
    let raw = parse_bars_json(fixture()).unwrap();
    let set = annotate(&raw, &params());
    assert_eq!(set.trading_days, ["2024-01-02", "2024-01-03"]);
    assert_eq!(set.bars.len(), 6);
    assert_eq!(set.bars[0].x, "2024-01-02T09:30:00");
}

#[test]
fn bands_rings_and_shapes_line_up() {
    let raw = parse_bars_json(fixture()).unwrap();
    let set = annotate(&raw, &params());

    assert_eq!(set.bands.high, [Some(4500.0), None, None]);
    assert_eq!(set.bands.mid, [None, Some(4510.0), None]);
    assert_eq!(set.bands.low, [None, None, Some(4520.0)]);

    assert_eq!(set.rings.low_ring_days, ["2024-01-02"]);
    assert_eq!(set.rings.high_ring_days, ["2024-01-03"]);

    let kinds: Vec<_> = set.shapes.iter().map(|s| (s.kind, s.date.as_str())).collect();
    assert_eq!(
        kinds,
        [
            (ShapeKind::LowRing, "2024-01-02"),
            (ShapeKind::WallMarker, "2024-01-02"),
            (ShapeKind::HighRing, "2024-01-03"),
            (ShapeKind::WallMarker, "2024-01-03"),
        ]
    );

    let ring = &set.shapes[0];
    assert_eq!(ring.x0, "2024-01-02T09:30:00");
    assert_eq!(ring.x1, "2024-01-02T11:00:00");
    assert!((ring.y0 - 98.5).abs() < 1e-9);
    assert!((ring.y1 - 101.6).abs() < 1e-9);
    assert_eq!((set.shapes[3].y0, set.shapes[3].y1), (4510.0, 4510.0));
}

#[test]
fn tighter_percentile_pair_moves_points_between_bands() {
    let raw = parse_bars_json(fixture()).unwrap();
    let pair = ThresholdPair::default()
        .adjust(Endpoint::Low, 0.6)
        .adjust(Endpoint::High, 0.4);
    assert!(pair.is_coupled());
    let set = annotate(
        &raw,
        &AnnotationParams {
            percentile: pair,
            ..params()
        },
    );
    // Every point still lands in exactly one band.
    for i in 0..set.bands.len() {
        let filled = [set.bands.high[i], set.bands.mid[i], set.bands.low[i]]
            .iter()
            .filter(|v| v.is_some())
            .count();
        assert_eq!(filled, 1);
    }
}

#[test]
fn market_zone_renders_offsets() {
    let raw = parse_bars_json(fixture()).unwrap();
    let set = annotate(
        &raw,
        &AnnotationParams {
            market_tz: Some(parse_tz("America/New_York").unwrap()),
            ..params()
        },
    );
    assert_eq!(set.bars[0].x, "2024-01-02T09:30:00-05:00");
    assert_eq!(set.bands.x[0], "2024-01-02T09:30:00-05:00");
    assert_eq!(set.shapes[0].x1, "2024-01-02T11:00:00-05:00");
}

#[test]
fn json_output_uses_camel_case_and_nulls() {
    let raw = parse_bars_json(fixture()).unwrap();
    let v = serde_json::to_value(annotate(&raw, &params())).unwrap();
    assert_eq!(v["tradingDays"][0], "2024-01-02");
    assert_eq!(v["rings"]["lowRingDays"][0], "2024-01-02");
    assert_eq!(v["bars"][5]["open"], serde_json::Value::Null);
    assert_eq!(v["bars"][5]["category"], 0);
    assert_eq!(v["bands"]["high"][1], serde_json::Value::Null);
    assert_eq!(v["days"][0]["firstBarDurationScore"], 0.05);
    assert_eq!(v["shapes"][0]["kind"], "low_ring");
}

#[test]
fn empty_payload_is_not_an_error() {
    let raw = parse_bars_json("[]").unwrap();
    let set = annotate(&raw, &params());
    assert!(set.is_empty());
    assert!(set.shapes.is_empty());
}
