use super::*;

#[test]
fn quality_above_one_is_pixels_per_particle() {
    assert_eq!(BlockSide::from_quality(4.0).unwrap().get(), 4);
    assert_eq!(BlockSide::from_quality(4.9).unwrap().get(), 4);
    assert_eq!(BlockSide::from_quality(1.5).unwrap().get(), 1);
}

#[test]
fn quality_at_or_below_one_is_inverse_scale() {
    assert_eq!(BlockSide::from_quality(1.0).unwrap().get(), 1);
    assert_eq!(BlockSide::from_quality(0.5).unwrap().get(), 2);
    assert_eq!(BlockSide::from_quality(0.3).unwrap().get(), 3);
    assert_eq!(BlockSide::from_quality(0.125).unwrap().get(), 8);
}

#[test]
fn quality_duality_agrees() {
    assert_eq!(
        BlockSide::from_quality(8.0).unwrap(),
        BlockSide::from_quality(0.125).unwrap()
    );
}

#[test]
fn degenerate_quality_is_rejected() {
    for q in [0.0, -1.0, -0.5, f64::NAN, f64::INFINITY, f64::NEG_INFINITY, 1e-20] {
        assert!(BlockSide::from_quality(q).is_err(), "quality {q} accepted");
    }
    assert!(BlockSide::new(0).is_err());
}

#[test]
fn defaults_match_documented_values() {
    let cfg = HoverOptions::default().validate_and_normalize().unwrap();
    assert_eq!(cfg.block_side.get(), 4);
    assert_eq!(cfg.force_radius, 50.0);
    assert_eq!(cfg.force_speed, 5.0);
    assert_eq!(cfg.return_speed, 0.1);
    assert_eq!(cfg.resize_debounce, Duration::from_millis(200));
    assert_eq!(cfg, HoverConfig::default());
}

#[test]
fn json_fields_are_optional() {
    let opts = HoverOptions::from_json_str(r#"{"quality": 0.25, "force_radius": 30}"#).unwrap();
    assert_eq!(opts.quality, 0.25);
    assert_eq!(opts.force_radius, 30.0);
    assert_eq!(opts.force_speed, 5.0);

    let cfg = opts.validate_and_normalize().unwrap();
    assert_eq!(cfg.block_side.get(), 4);
}

#[test]
fn json_unknown_field_is_serde_error() {
    let err = HoverOptions::from_json_str(r#"{"qualty": 2}"#).unwrap_err();
    assert!(matches!(err, ScatterError::Serde(_)));
}

#[test]
fn out_of_range_motion_parameters_are_rejected() {
    let bad = [
        HoverOptions {
            force_radius: 0.0,
            ..HoverOptions::default()
        },
        HoverOptions {
            force_speed: -1.0,
            ..HoverOptions::default()
        },
        HoverOptions {
            return_speed: 0.0,
            ..HoverOptions::default()
        },
        HoverOptions {
            return_speed: 1.5,
            ..HoverOptions::default()
        },
        HoverOptions {
            rest_epsilon: f64::NAN,
            ..HoverOptions::default()
        },
        HoverOptions {
            rest_epsilon: 0.0,
            ..HoverOptions::default()
        },
    ];
    for opts in bad {
        let err = opts.validate_and_normalize().unwrap_err();
        assert!(matches!(err, ScatterError::Validation(_)), "{opts:?}");
    }
}
