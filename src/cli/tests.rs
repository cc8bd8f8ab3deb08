//! Unit tests for CLI commands

use crate::cli::{Cli, Commands};
use clap::Parser;
use std::fs;

#[test]
fn test_serve_command_with_rules() {
    let cli = Cli::try_parse_from([
        "renderware",
        "serve",
        "--root",
        "tests/testdata",
        "--rule",
        "/photos .html",
        "--rule",
        "/",
        "--addr",
        "127.0.0.1:9000",
        "--watch",
    ])
    .unwrap();

    match cli.command {
        Commands::Serve { site, addr, watch } => {
            assert_eq!(site.root.unwrap().to_string_lossy(), "tests/testdata");
            assert_eq!(site.rules, vec!["/photos .html", "/"]);
            assert_eq!(addr, "127.0.0.1:9000");
            assert!(watch);
        }
        _ => panic!("Expected Serve command"),
    }
}

#[test]
fn test_root_or_config_is_required() {
    assert!(Cli::try_parse_from(["renderware", "check"]).is_err());
    assert!(Cli::try_parse_from(["renderware", "check", "--config", "site.yaml"]).is_ok());
}

#[test]
fn test_site_args_merge_config_root_and_rules() {
    let dir = tempfile::tempdir().unwrap();
    let site = dir.path().join("site");
    fs::create_dir_all(&site).unwrap();
    let config_path = dir.path().join("renderware.yaml");
    fs::write(
        &config_path,
        "site_root: site\nrules:\n  - path: /blog\n    ext: [.html]\n",
    )
    .unwrap();

    let cli = Cli::try_parse_from([
        "renderware",
        "check",
        "--config",
        config_path.to_str().unwrap(),
        "--rule",
        "/ .htm",
    ])
    .unwrap();
    let Commands::Check { site: args } = cli.command else {
        panic!("Expected Check command");
    };
    let config = args.load().unwrap();
    assert_eq!(config.site_root, site);
    let roots: Vec<_> = config
        .rules
        .unwrap()
        .iter()
        .map(|r| r.root().to_string())
        .collect();
    assert_eq!(roots, vec!["/blog", "/"]);
}

#[test]
fn test_bad_directive_is_reported() {
    let cli = Cli::try_parse_from([
        "renderware",
        "check",
        "--root",
        "tests/testdata",
        "--rule",
        "/docs html",
    ])
    .unwrap();
    let Commands::Check { site } = cli.command else {
        panic!("Expected Check command");
    };
    let err = site.load().unwrap_err();
    assert!(format!("{err:#}").contains("must start with '.'"));
}
