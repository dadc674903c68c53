use sieve_amr::prelude::*;

#[test]
fn full_document_parses() {
    let json = r#"{
        "refineInterval": 2,
        "field": "alpha.water",
        "lowerRefineLevel": 0.001,
        "upperRefineLevel": 0.999,
        "unrefineLevel": 10,
        "nBufferLayers": 2,
        "maxRefinement": 3,
        "maxCells": 500000,
        "correctFluxes": { "phi": "U", "nHatf": "none", "rhoPhi": "NaN" },
        "dumpLevel": true,
        "enableCriteria": true,
        "pointSmoothing": true,
        "budget": { "childrenPerSplit": 4, "ceilingRounding": "down" },
        "protectionSweepCap": 64,
        "criteria": {
            "phase": {
                "kind": "fields",
                "fieldName": "alpha.water",
                "minValue": 0.01,
                "maxValue": 0.99,
                "refineLevel": 3,
                "nAddLayers": 1
            },
            "vorticity": {
                "kind": "curl",
                "fieldName": "U",
                "minValue": 5.0,
                "maxValue": 1e15,
                "refineLevel": 2
            },
            "surface": { "kind": "interface", "fieldName": "alpha.water", "innerLayers": 2 },
            "inlet": { "kind": "refinedRegion", "cells": [0, 1, 2], "refineLevel": 1 }
        }
    }"#;
    let cfg: RefinementConfig = serde_json::from_str(json).unwrap();
    cfg.validate().unwrap();

    assert_eq!(cfg.refine_interval, 2);
    assert_eq!(cfg.unrefine_level, Some(10.0));
    assert_eq!(cfg.max_refinement, 3);
    assert!(cfg.dump_level && cfg.point_smoothing);
    assert_eq!(cfg.budget.children_per_split, Some(4));
    assert_eq!(cfg.budget.ceiling_rounding, CeilingRounding::Down);
    assert_eq!(cfg.protection_sweep_cap, Some(64));
    assert_eq!(cfg.correct_fluxes["phi"], FluxCorrection::Velocity("U".into()));
    assert_eq!(cfg.correct_fluxes["nHatf"], FluxCorrection::Skip);
    assert_eq!(cfg.correct_fluxes["rhoPhi"], FluxCorrection::Poison);
    assert_eq!(cfg.criteria.len(), 4);

    let kinds: Vec<CriterionKind> = cfg
        .criteria
        .iter()
        .map(|(name, c)| Criterion::from_config(name, c).unwrap().kind())
        .collect();
    // BTreeMap order: inlet, phase, surface, vorticity
    assert_eq!(
        kinds,
        vec![
            CriterionKind::StaticRegion,
            CriterionKind::Field,
            CriterionKind::Interface,
            CriterionKind::Curl
        ]
    );
    assert_eq!(cfg.criteria["phase"].n_add_layers, 1);
    assert_eq!(cfg.criteria["surface"].inner_layers, 2);
}

#[test]
fn empty_document_takes_defaults() {
    let cfg: RefinementConfig = serde_json::from_str("{}").unwrap();
    assert_eq!(cfg, RefinementConfig::default());
    assert_eq!(cfg.lower_refine_level, 0.5);
    assert_eq!(cfg.max_cells, 200_000);
    assert!(cfg.enable_criteria);
    assert_eq!(cfg.budget.ceiling_rounding, CeilingRounding::Up);
}

#[test]
fn config_roundtrips_through_json() {
    let mut cfg = RefinementConfig {
        field: Some("alpha".into()),
        unrefine_level: Some(0.2),
        ..RefinementConfig::default()
    };
    cfg.correct_fluxes.insert("phi".into(), FluxCorrection::Poison);
    let json = serde_json::to_string(&cfg).unwrap();
    assert!(json.contains("\"correctFluxes\":{\"phi\":\"NaN\"}"));
    let back: RefinementConfig = serde_json::from_str(&json).unwrap();
    assert_eq!(back, cfg);
}

#[test]
fn unknown_kind_fails_the_step() {
    let json = r#"{ "criteria": { "odd": { "kind": "vorticity", "fieldName": "U" } } }"#;
    let cfg: RefinementConfig = serde_json::from_str(json).unwrap();
    let mesh = hex_box([2, 1, 1], [2.0, 1.0, 1.0]).unwrap();
    let err = decide(&mesh, &FieldSet::new(), &cfg).unwrap_err();
    assert_eq!(
        err,
        AdaptError::Config(ConfigError::UnknownCriterionKind {
            name: "odd".into(),
            kind: "vorticity".into()
        })
    );
    assert!(err.to_string().contains("unknown kind `vorticity`"));
}

#[test]
fn inverted_band_fails_validation() {
    let json = r#"{ "field": "alpha", "lowerRefineLevel": 0.9, "upperRefineLevel": 0.1 }"#;
    let cfg: RefinementConfig = serde_json::from_str(json).unwrap();
    assert!(matches!(cfg.validate(), Err(ConfigError::InvalidRange { .. })));
    assert!(RefinementController::new(cfg).is_err());
}

#[test]
fn field_errors_are_reported_before_selection() {
    let mesh = hex_box([3, 1, 1], [3.0, 1.0, 1.0]).unwrap();
    let cfg = RefinementConfig {
        field: Some("alpha".into()),
        ..RefinementConfig::default()
    };

    let mut short = FieldSet::new();
    short.insert_scalar("alpha", vec![0.0; 2]);
    assert!(matches!(
        decide(&mesh, &short, &cfg),
        Err(AdaptError::Config(ConfigError::FieldLength { expected: 3, found: 2, .. }))
    ));

    let mut poisoned = FieldSet::new();
    poisoned.insert_scalar("alpha", vec![0.0, f64::INFINITY, 0.0]);
    assert!(matches!(
        decide(&mesh, &poisoned, &cfg),
        Err(AdaptError::Config(ConfigError::NonFiniteValue { .. }))
    ));
}
