//! Contract Invariant Tests
//!
//! These tests verify the update protocol guarantees.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use contentpatch_core::{
    ContentSource, Contextual, Patch, PatchConfig, PatchKind, TokenMap, TokenString,
};

struct FakeSource {
    files: HashSet<String>,
}

impl FakeSource {
    fn with(files: &[&str]) -> Self {
        Self {
            files: files.iter().map(|f| f.to_string()).collect(),
        }
    }
}

impl ContentSource for FakeSource {
    fn id(&self) -> &str {
        "Test.Pack"
    }

    fn has_file(&self, normalized_path: &str) -> bool {
        self.files.contains(normalized_path)
    }

    fn resolve_full_path(&self, normalized_path: &str) -> PathBuf {
        Path::new("/packs/test").join(normalized_path)
    }
}

fn patch(config: PatchConfig, source: &FakeSource) -> Patch {
    Patch::new(&config, source).unwrap()
}

#[test]
fn invariant_field_ready_iff_all_tokens_defined() {
    let mut field = TokenString::parse("{{A}}/{{B}}").unwrap();

    field.update(&TokenMap::new().with("A", "1").with("B", "2"));
    assert!(field.is_ready());
    assert_eq!(field.value(), Some("1/2"));

    field.update(&TokenMap::new().with("A", "1"));
    assert!(!field.is_ready());
    assert_eq!(field.value(), None);
}

#[test]
fn invariant_identical_context_reports_no_change() {
    let source = FakeSource::with(&[]);
    let mut p = patch(
        PatchConfig::new(PatchKind::EditData, "Characters/{{Name}}").when("Season", "spring"),
        &source,
    );
    let ctx = TokenMap::new().with("Name", "Abigail").with("Season", "spring");

    assert!(p.update_context(&ctx, &source).unwrap());
    assert!(!p.update_context(&ctx, &source).unwrap());

    let renamed = TokenMap::new().with("Name", "Haley").with("Season", "spring");
    assert!(p.update_context(&renamed, &source).unwrap());
    assert_eq!(p.target_asset(), "Characters/Haley");
}

#[test]
fn invariant_readiness_flip_counts_as_change() {
    let source = FakeSource::with(&[]);
    let mut p = patch(
        PatchConfig::new(PatchKind::EditData, "Data/Events").when("Season", "spring"),
        &source,
    );

    p.update_context(&TokenMap::new().with("Season", "spring"), &source).unwrap();
    assert!(p.is_ready());

    assert!(p.update_context(&TokenMap::new().with("Season", "fall"), &source).unwrap());
    assert!(!p.is_ready());
    assert_eq!(p.target_asset(), "Data/Events");
}

#[test]
fn invariant_order_does_not_change_independent_results() {
    let source = FakeSource::with(&["assets/spring.png"]);
    let ctx = TokenMap::new().with("Name", "Abigail").with("Season", "spring");
    let mut p = patch(
        PatchConfig::new(PatchKind::Load, "Portraits/{{Name}}").from_file("assets/{{Season}}.png"),
        &source,
    );
    p.update_context(&ctx, &source).unwrap();

    let mut target = TokenString::parse("Portraits/{{Name}}").unwrap();
    let mut from = TokenString::parse("assets/{{Season}}.png").unwrap();
    from.update(&ctx);
    target.update(&ctx);

    assert!(p.is_ready());
    assert_eq!(Some(p.target_asset()), target.value());
    assert_eq!(p.from_asset(), from.value());
}

#[test]
fn invariant_false_condition_blocks_ready_fields() {
    let source = FakeSource::with(&["assets/x.png"]);
    let mut p = patch(
        PatchConfig::new(PatchKind::Load, "Maps/Town")
            .from_file("assets/x.png")
            .when("Weather", "rain"),
        &source,
    );

    p.update_context(&TokenMap::new().with("Weather", "sun"), &source).unwrap();
    assert!(!p.matches_conditions());
    assert!(!p.is_ready());
}

#[test]
fn invariant_no_conditions_means_applicable() {
    let source = FakeSource::with(&[]);
    let mut p = patch(PatchConfig::new(PatchKind::EditData, "Data/Events"), &source);
    p.update_context(&TokenMap::new(), &source).unwrap();
    assert!(p.matches_conditions());
    assert!(p.is_ready());
}

#[test]
fn invariant_missing_file_error_suppressed_when_conditions_fail() {
    let source = FakeSource::with(&[]);
    let mut p = patch(
        PatchConfig::new(PatchKind::Load, "Maps/Town")
            .from_file("assets/missing.png")
            .when("Weather", "rain"),
        &source,
    );

    p.update_context(&TokenMap::new().with("Weather", "sun"), &source).unwrap();
    assert!(!p.diagnostic_state().has_errors());

    p.update_context(&TokenMap::new().with("Weather", "rain"), &source).unwrap();
    assert_eq!(p.diagnostic_state().errors().len(), 1);
}

#[test]
fn scenario_target_resolves_from_name() {
    let source = FakeSource::with(&[]);
    let mut p = patch(PatchConfig::new(PatchKind::EditData, "Characters/{{Name}}"), &source);

    p.update_context(&TokenMap::new().with("Name", "Abigail"), &source).unwrap();
    assert!(p.is_ready());
    assert_eq!(p.target_asset(), "Characters/Abigail");
}

#[test]
fn scenario_target_reads_from_file() {
    let source = FakeSource::with(&["assets/x.png"]);
    let mut p = patch(
        PatchConfig::new(PatchKind::Load, "Sprites/{{FromFile}}").from_file("assets/x.png"),
        &source,
    );

    p.update_context(&TokenMap::new(), &source).unwrap();
    assert!(p.is_ready());
    assert_eq!(p.from_asset(), Some("assets/x.png"));
    assert_eq!(p.target_asset(), "Sprites/assets/x.png");
}

#[test]
fn scenario_missing_source_file_reported_once() {
    let source = FakeSource::with(&[]);
    let mut p = patch(
        PatchConfig::new(PatchKind::Load, "Maps/Town")
            .from_file("assets/{{Season}}.png")
            .when("Season", "spring"),
        &source,
    );

    p.update_context(&TokenMap::new().with("Season", "spring"), &source).unwrap();
    let state = p.diagnostic_state();
    assert_eq!(state.errors().len(), 1);
    assert!(state.errors()[0].contains("assets/spring.png"));
    assert!(!p.source_asset_exists());

    p.update_context(&TokenMap::new().with("Season", "spring"), &source).unwrap();
    assert_eq!(p.diagnostic_state().errors().len(), 1);
}

#[test]
fn invariant_tokens_used_covers_fields_and_conditions() {
    let source = FakeSource::with(&[]);
    let p = patch(
        PatchConfig::new(PatchKind::Load, "Portraits/{{Name}}")
            .from_file("assets/{{Variant}}.png")
            .when("Season", "{{Favorite}}"),
        &source,
    );

    let used: Vec<_> = p.tokens_used().into_iter().map(|t| t.key()).collect();
    assert_eq!(used, vec!["favorite", "name", "season", "variant"]);
}

#[test]
fn invariant_patches_do_not_share_local_tokens() {
    let source = FakeSource::with(&["assets/a.png"]);
    let mut with_source = patch(
        PatchConfig::new(PatchKind::Load, "Sprites/{{FromFile}}").from_file("assets/a.png"),
        &source,
    );
    let mut reader = patch(PatchConfig::new(PatchKind::EditData, "Data/{{FromFile}}"), &source);

    let ctx = TokenMap::new();
    with_source.update_context(&ctx, &source).unwrap();
    reader.update_context(&ctx, &source).unwrap();

    assert!(with_source.is_ready());
    assert!(!reader.is_ready());
}

#[test]
fn invariant_unready_source_makes_dependent_target_unready() {
    let source = FakeSource::with(&["assets/spring.png"]);
    let mut p = patch(
        PatchConfig::new(PatchKind::Load, "Sprites/{{FromFile}}").from_file("assets/{{Season}}.png"),
        &source,
    );

    // the outer FromFile must stay shadowed while the local field is unready
    let without_season = TokenMap::new().with("FromFile", "outer.png");
    p.update_context(&without_season, &source).unwrap();
    assert!(!p.is_ready());
    assert_eq!(p.target_asset(), "");
    assert_eq!(p.from_asset(), None);
    let unready = p.diagnostic_state().unready_tokens().clone();
    assert!(unready.contains("Season"));
    assert!(unready.contains("FromFile"));

    let with_season = TokenMap::new().with("FromFile", "outer.png").with("Season", "spring");
    assert!(p.update_context(&with_season, &source).unwrap());
    assert!(p.is_ready());
    assert_eq!(p.from_asset(), Some("assets/spring.png"));
    assert_eq!(p.target_asset(), "Sprites/assets/spring.png");
}
