use crate::cli::{info, Cli, Command, InfoArgs, InfoFormat, Verbosity};
use crate::model::Summary;
use crate::server::ServerConfig;

use clap::Parser;
use color_eyre::eyre::{eyre, Report, Result};
use std::path::PathBuf;
use tempfile::TempDir;

/// A directory holding `example.trees`.
fn fixture() -> Result<(TempDir, PathBuf), Report> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("example.trees");
    std::fs::write(&path, tsqc_trees::examples::example_1().to_bytes())?;
    Ok((dir, path))
}

#[test]
fn serve_defaults() -> Result<(), Report> {
    let (_dir, path) = fixture()?;
    let path_str = path.to_string_lossy().to_string();
    let args = Cli::try_parse_from(["tsqc", "serve", &path_str])?;

    assert_eq!(args.verbosity, Verbosity::Info);
    let Command::Serve(serve) = args.command else { return Err(eyre!("expected serve")) };
    assert_eq!(serve.path, path);
    // environment overrides aside, the defaults listen locally on 8080
    if std::env::var("TSQC_PORT").is_err() && std::env::var("TSQC_HOST").is_err() {
        assert_eq!(ServerConfig::from(&serve), ServerConfig::default());
    }
    Ok(())
}

#[test]
fn serve_options() -> Result<(), Report> {
    let (_dir, path) = fixture()?;
    let path_str = path.to_string_lossy().to_string();
    let args = Cli::try_parse_from(["tsqc", "serve", &path_str, "--port", "9000", "--host", "0.0.0.0", "-v", "debug"])?;

    assert_eq!(args.verbosity.to_string(), "debug");
    let Command::Serve(serve) = args.command else { return Err(eyre!("expected serve")) };
    assert_eq!(ServerConfig::from(&serve).address(), "0.0.0.0:9000");
    Ok(())
}

#[test]
fn path_must_be_a_file() -> Result<(), Report> {
    let (dir, _path) = fixture()?;
    let dir_str = dir.path().to_string_lossy().to_string();
    assert!(Cli::try_parse_from(["tsqc", "serve", &dir_str]).is_err());

    let missing = dir.path().join("missing.trees").to_string_lossy().to_string();
    assert!(Cli::try_parse_from(["tsqc", "serve", &missing]).is_err());
    assert!(Cli::try_parse_from(["tsqc", "serve", "--port", "not-a-port", &missing]).is_err());
    Ok(())
}

#[test]
fn info_json() -> Result<(), Report> {
    let (_dir, path) = fixture()?;
    let path_str = path.to_string_lossy().to_string();
    let args = Cli::try_parse_from(["tsqc", "info", &path_str, "--format", "json"])?;
    let Command::Info(args) = args.command else { return Err(eyre!("expected info")) };
    assert_eq!(args.format, InfoFormat::Json);

    let summary: Summary = serde_json::from_str(&info(&args)?)?;
    assert_eq!(summary.name, "example.trees");
    assert_eq!(summary.num_mutations, 5);
    Ok(())
}

#[test]
fn info_unreadable() -> Result<(), Report> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("notes.txt");
    std::fs::write(&path, "not a tree sequence")?;
    let args = InfoArgs { path, format: InfoFormat::Markdown };
    assert!(info(&args).is_err());
    Ok(())
}
