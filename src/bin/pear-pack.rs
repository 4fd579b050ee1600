//! Command line front end: pack a directory and write the bundle, prebuilds and assets.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::Parser;

use pear_pack::{LocalDrive, PackConfig, PackOutput, TargetHost, pack};

/// Pack a directory into a bundle for one or more target hosts.
#[derive(Debug, Parser)]
#[command(name = "pear-pack", version, about)]
struct Args {
  /// Directory to pack.
  dir: PathBuf,
  /// Entry module, as an absolute path inside the directory.
  #[arg(long)]
  entry: Option<String>,
  /// Target host such as `linux-x64`. Repeat for several hosts.
  #[arg(long = "host")]
  hosts: Vec<String>,
  /// Configuration file. Defaults to `pack.config.json` in the packed directory.
  #[arg(long)]
  config: Option<PathBuf>,
  /// Output directory.
  #[arg(long, default_value = "dist")]
  out: PathBuf,
  /// Prefix for extracted asset paths.
  #[arg(long)]
  assets_prefix: Option<String>,
  /// Prefix for rewritten prebuild references.
  #[arg(long)]
  prebuild_prefix: Option<String>,
}

fn main() -> Result<()> {
  env_logger::init();
  let args = Args::parse();

  let config = match &args.config {
    Some(path) => PackConfig::from_path(path)?,
    None => PackConfig::discover(&args.dir),
  };
  let mut options = config.into_options();
  if let Some(entry) = args.entry {
    options.entry = entry;
  }
  if !args.hosts.is_empty() {
    options.hosts = args.hosts.into_iter().map(TargetHost::from).collect();
  }
  if let Some(prefix) = args.assets_prefix {
    options.assets_prefix = prefix;
  }
  if let Some(prefix) = args.prebuild_prefix {
    options.prebuild_prefix = prefix;
  }
  if options.hosts.is_empty() {
    bail!("no target hosts given; pass --host or list them in the configuration");
  }

  let drive = LocalDrive::new(&args.dir);
  let output = pack(&drive, options)
    .with_context(|| format!("failed to pack {}", args.dir.display()))?;
  write_output(&args.out, &output)?;

  log::info!(
    "wrote bundle with {} prebuilds and {} assets to {}",
    output.prebuilds.len(),
    output.assets.len(),
    args.out.display()
  );
  Ok(())
}

fn write_output(out: &Path, output: &PackOutput) -> Result<()> {
  fs::create_dir_all(out).with_context(|| format!("failed to create {}", out.display()))?;
  let bundle_path = out.join("app.bundle");
  fs::write(&bundle_path, &output.bundle)
    .with_context(|| format!("failed to write {}", bundle_path.display()))?;

  for (key, content) in output.prebuilds.iter().chain(output.assets.iter()) {
    let destination = out_path(out, key)?;
    if let Some(parent) = destination.parent() {
      fs::create_dir_all(parent)
        .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    fs::write(&destination, content)
      .with_context(|| format!("failed to write {}", destination.display()))?;
  }
  Ok(())
}

/// Place a bundle key under `out`, dropping `..` and empty segments.
fn out_path(out: &Path, key: &str) -> Result<PathBuf> {
  let segments: Vec<&str> = key
    .split('/')
    .filter(|segment| !segment.is_empty() && *segment != "." && *segment != "..")
    .collect();
  if segments.is_empty() {
    bail!("cannot write empty key '{key}'");
  }
  Ok(segments.iter().fold(out.to_path_buf(), |path, segment| path.join(segment)))
}
