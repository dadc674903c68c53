#![allow(dead_code)]
use std::collections::BTreeMap;

use sieve_amr::prelude::*;
use sieve_amr::topology::validation::{balance_violations, projected_levels};

pub fn cid(u: u32) -> CellId {
    CellId::new(u)
}

pub fn ids(v: &[u32]) -> Vec<CellId> {
    v.iter().copied().map(CellId::new).collect()
}

/// `field` criterion block on `field` with band `[min, max]`.
pub fn field_criterion(field: &str, min: f64, max: f64, level: Level) -> CriterionConfig {
    CriterionConfig {
        kind: "field".into(),
        field_name: Some(field.into()),
        min_value: Some(min),
        max_value: Some(max),
        refine_level: Some(level),
        ..Default::default()
    }
}

/// Static region pinning `cells` to `level`.
pub fn static_region(cells: &[u32], level: Level) -> CriterionConfig {
    CriterionConfig {
        kind: "staticRegion".into(),
        cells: Some(cells.to_vec()),
        refine_level: Some(level),
        ..Default::default()
    }
}

/// Criteria-mode configuration from named blocks.
pub fn with_criteria(blocks: &[(&str, CriterionConfig)]) -> RefinementConfig {
    let criteria: BTreeMap<String, CriterionConfig> = blocks
        .iter()
        .map(|(name, cfg)| (name.to_string(), cfg.clone()))
        .collect();
    RefinementConfig {
        criteria,
        ..RefinementConfig::default()
    }
}

/// Scalar field set with one field.
pub fn scalar(name: &str, values: Vec<f64>) -> FieldSet {
    let mut f = FieldSet::new();
    f.insert_scalar(name, values);
    f
}

/// Assert the projected decision keeps every face pair within one level.
pub fn assert_balanced(mesh: &InMemoryMesh, d: &RefinementDecision) {
    let levels = projected_levels(mesh, &d.refine, &d.unrefine);
    let bad = balance_violations(mesh, &levels);
    assert!(bad.is_empty(), "2:1 violated at {bad:?} for {d:?}");
}
