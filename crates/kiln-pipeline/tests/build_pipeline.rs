//! End-to-end builds over temporary project trees.

use std::fs;
use std::path::{Path, PathBuf};

use kiln_config::{BuildMode, KilnConfig, OptimizerRef, RuleConfig, TransformRef};
use kiln_pipeline::{
    BuildOutcome, Builder, CancelToken, Error, Optimizer, OptimizerContext, OptimizerRegistry,
    Transform, TransformContext, TransformOutput, TransformRegistry,
};
use serde_json::{Map, Value};
use tempfile::TempDir;

fn project(files: &[(&str, &str)]) -> TempDir {
    let dir = TempDir::new().unwrap();
    for (path, content) in files {
        let full = dir.path().join(path);
        fs::create_dir_all(full.parent().unwrap()).unwrap();
        fs::write(full, content).unwrap();
    }
    dir
}

struct FailingLoader;

impl Transform for FailingLoader {
    fn invoke(
        &self,
        _source: &[u8],
        _options: &Map<String, Value>,
        ctx: &TransformContext<'_>,
    ) -> anyhow::Result<TransformOutput> {
        anyhow::bail!("cannot compile {}", ctx.path.display())
    }
}

/// Prefixes content with the `banner` option.
struct BannerLoader;

impl Transform for BannerLoader {
    fn invoke(
        &self,
        source: &[u8],
        options: &Map<String, Value>,
        _ctx: &TransformContext<'_>,
    ) -> anyhow::Result<TransformOutput> {
        let banner = options.get("banner").and_then(Value::as_str).unwrap_or("");
        let mut out = banner.as_bytes().to_vec();
        out.extend_from_slice(source);
        Ok(TransformOutput::Content(out))
    }
}

struct Shout;

impl Optimizer for Shout {
    fn optimize(
        &self,
        asset: &[u8],
        _options: &Map<String, Value>,
        _ctx: &OptimizerContext<'_>,
    ) -> anyhow::Result<Vec<u8>> {
        Ok(asset.to_ascii_uppercase())
    }
}

struct Explode;

impl Optimizer for Explode {
    fn optimize(
        &self,
        _asset: &[u8],
        _options: &Map<String, Value>,
        _ctx: &OptimizerContext<'_>,
    ) -> anyhow::Result<Vec<u8>> {
        anyhow::bail!("minifier crashed")
    }
}

fn transforms() -> TransformRegistry {
    let mut registry = TransformRegistry::with_builtins();
    registry.register("fail", FailingLoader);
    registry.register("banner", BannerLoader);
    registry
}

fn optimizers() -> OptimizerRegistry {
    let mut registry = OptimizerRegistry::with_builtins();
    registry.register("shout", Shout);
    registry.register("explode", Explode);
    registry
}

fn builder(config: KilnConfig, root: &Path, mode: BuildMode) -> Builder {
    Builder::new(config, root, mode)
        .transforms(transforms())
        .optimizers(optimizers())
}

#[test]
fn glob_entries_precede_explicit_entries() {
    let dir = project(&[
        ("vendor/b.js", "b();"),
        ("vendor/a.js", "a();"),
        ("app.js", "app();"),
    ]);
    let config = KilnConfig {
        glob_patterns: vec!["vendor/*.js".into()],
        explicit_entries: vec![PathBuf::from("app.js")],
        ..KilnConfig::default()
    };

    let result = builder(config, dir.path(), BuildMode::Production).build().unwrap();

    assert_eq!(
        result.manifest.entries(),
        &[
            PathBuf::from("vendor/a.js"),
            PathBuf::from("vendor/b.js"),
            PathBuf::from("app.js"),
        ]
    );
    let bundle = result.asset("app.js").unwrap();
    assert_eq!(bundle.content, b"a();\nb();\napp();\n");
    assert_eq!(result.outcome, BuildOutcome::Success);
}

#[test]
fn production_css_is_extracted_out_of_the_bundle() {
    let dir = project(&[
        ("js/app.js", "start();"),
        ("css/app.css", "body { color: red }"),
    ]);
    let config = KilnConfig {
        explicit_entries: vec![PathBuf::from("js/app.js"), PathBuf::from("css/app.css")],
        rules: vec![
            RuleConfig::new(r"\.css$")
                .with(TransformRef::new("extract"))
                .with(TransformRef::new("css-loader")),
        ],
        ..KilnConfig::default()
    };

    let result = builder(config, dir.path(), BuildMode::Production).build().unwrap();

    let stylesheet = String::from_utf8(result.asset("css/app.css").unwrap().content.clone()).unwrap();
    assert!(stylesheet.contains("color: red"));

    let bundle = String::from_utf8(result.asset("app.js").unwrap().content.clone()).unwrap();
    assert_eq!(bundle, "start();\n");
    assert!(!bundle.contains("color"));
}

#[test]
fn development_skips_optimizers_without_override() {
    let dir = project(&[("js/app.js", "start();")]);
    let config = KilnConfig {
        explicit_entries: vec![PathBuf::from("js/app.js")],
        optimizers: vec![OptimizerRef::new("shout").test(r"\.js$")],
        ..KilnConfig::default()
    };

    let dev = builder(config.clone(), dir.path(), BuildMode::Development).build().unwrap();
    assert!(!dev.optimized);
    assert_eq!(dev.asset("js/app.js").unwrap().content, b"start();\n");

    let prod = builder(config.clone(), dir.path(), BuildMode::Production).build().unwrap();
    assert!(prod.optimized);
    assert_eq!(prod.asset("app.js").unwrap().content, b"START();\n");

    let forced_off = KilnConfig {
        optimize: Some(false),
        ..config
    };
    let prod = builder(forced_off, dir.path(), BuildMode::Production).build().unwrap();
    assert_eq!(prod.asset("app.js").unwrap().content, b"start();\n");
}

#[test]
fn failing_transform_leaves_siblings_intact() {
    let dir = project(&[
        ("js/a.js", "a();"),
        ("elm/Main.elm", "module Main exposing (..)"),
        ("js/b.js", "b();"),
    ]);
    let config = KilnConfig {
        explicit_entries: vec![
            PathBuf::from("js/a.js"),
            PathBuf::from("elm/Main.elm"),
            PathBuf::from("js/b.js"),
        ],
        rules: vec![RuleConfig::new(r"\.elm$").with(TransformRef::new("fail"))],
        ..KilnConfig::default()
    };

    let result = builder(config, dir.path(), BuildMode::Production).build().unwrap();

    assert_eq!(result.outcome, BuildOutcome::Partial);
    assert_eq!(result.errors.len(), 1);
    match &result.errors[0] {
        Error::Transform { path, stage, .. } => {
            assert_eq!(path, Path::new("elm/Main.elm"));
            assert_eq!(stage, "fail");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(result.asset("app.js").unwrap().content, b"a();\nb();\n");
}

#[test]
fn every_file_failing_is_a_failed_build() {
    let dir = project(&[("elm/Main.elm", "module Main")]);
    let config = KilnConfig {
        explicit_entries: vec![PathBuf::from("elm/Main.elm")],
        rules: vec![RuleConfig::new(r"\.elm$").with(TransformRef::new("fail"))],
        ..KilnConfig::default()
    };

    let result = builder(config, dir.path(), BuildMode::Production)
        .write_to_disk(true)
        .build()
        .unwrap();

    assert_eq!(result.outcome, BuildOutcome::Failed);
    assert!(result.assets.is_empty());
    assert!(!result.written);
}

#[test]
fn profile_options_reach_the_transform() {
    let dir = project(&[("js/app.js", "run();")]);
    let transform = TransformRef::new("banner")
        .option("banner", "/* prod */")
        .profile_option(BuildMode::Development, "banner", "/* dev */");
    let config = KilnConfig {
        explicit_entries: vec![PathBuf::from("js/app.js")],
        rules: vec![RuleConfig::new(r"\.js$").with(transform)],
        ..KilnConfig::default()
    };

    let dev = builder(config.clone(), dir.path(), BuildMode::Development).build().unwrap();
    assert_eq!(dev.asset("js/app.js").unwrap().content, b"/* dev */run();\n");

    let prod = builder(config, dir.path(), BuildMode::Production).build().unwrap();
    assert_eq!(prod.asset("app.js").unwrap().content, b"/* prod */run();\n");
}

#[test]
fn writes_assets_and_static_copies() {
    let dir = project(&[
        ("js/app.js", "run();"),
        ("static/robots.txt", "User-agent: *"),
    ]);
    let config = KilnConfig {
        explicit_entries: vec![PathBuf::from("js/app.js")],
        copy: vec![kiln_config::CopyPattern::new("static", ".")],
        ..KilnConfig::default()
    };

    let result = builder(config, dir.path(), BuildMode::Production)
        .write_to_disk(true)
        .build()
        .unwrap();

    assert!(result.written);
    let dist = dir.path().join("dist");
    assert_eq!(result.output_dir, dist);
    assert_eq!(fs::read_to_string(dist.join("app.js")).unwrap(), "run();\n");
    assert_eq!(fs::read_to_string(dist.join("robots.txt")).unwrap(), "User-agent: *");

    let temps: Vec<_> = walkdir(&dist)
        .into_iter()
        .filter(|p| p.file_name().unwrap().to_string_lossy().starts_with(".tmp"))
        .collect();
    assert!(temps.is_empty());
}

#[test]
fn optimizer_failure_writes_nothing() {
    let dir = project(&[("js/app.js", "run();")]);
    let config = KilnConfig {
        explicit_entries: vec![PathBuf::from("js/app.js")],
        optimizers: vec![OptimizerRef::new("explode").test(r"\.js$")],
        ..KilnConfig::default()
    };

    let result = builder(config, dir.path(), BuildMode::Production)
        .write_to_disk(true)
        .build()
        .unwrap();

    assert_eq!(result.outcome, BuildOutcome::Failed);
    assert!(matches!(&result.errors[0], Error::Optimizer { optimizer, .. } if optimizer == "explode"));
    assert!(!dir.path().join("dist").exists());
}

#[test]
fn unknown_loader_fails_before_reading() {
    let dir = project(&[("js/app.js", "run();")]);
    let config = KilnConfig {
        explicit_entries: vec![PathBuf::from("js/app.js")],
        rules: vec![RuleConfig::new(r"\.js$").with(TransformRef::new("babel-loader"))],
        ..KilnConfig::default()
    };

    let err = builder(config, dir.path(), BuildMode::Production).build().unwrap_err();
    assert!(matches!(err, Error::UnknownLoader(id) if id == "babel-loader"));
}

#[test]
fn no_entries_is_fatal() {
    let dir = project(&[]);
    let config = KilnConfig {
        glob_patterns: vec!["vendor/**/*.js".into()],
        ..KilnConfig::default()
    };

    let err = builder(config, dir.path(), BuildMode::Production).build().unwrap_err();
    assert!(matches!(err, Error::NoEntries));
}

#[test]
fn cancelled_build_returns_cancelled() {
    let dir = project(&[("js/app.js", "run();")]);
    let config = KilnConfig {
        explicit_entries: vec![PathBuf::from("js/app.js")],
        ..KilnConfig::default()
    };
    let token = CancelToken::new();
    token.cancel();

    let err = builder(config, dir.path(), BuildMode::Development)
        .cancel_token(token)
        .build()
        .unwrap_err();
    assert!(matches!(err, Error::Cancelled));
}

fn walkdir(dir: &Path) -> Vec<PathBuf> {
    let mut out = Vec::new();
    for entry in fs::read_dir(dir).unwrap() {
        let path = entry.unwrap().path();
        if path.is_dir() {
            out.extend(walkdir(&path));
        } else {
            out.push(path);
        }
    }
    out
}
