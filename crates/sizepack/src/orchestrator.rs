//! Build orchestration
//!
//! Reads the document, resolves configuration and tools, runs the in-memory
//! pipeline and only then writes anything. The final document is the single
//! commit point: it is written to a temporary sibling and renamed into place,
//! so a failed build never leaves a partial output behind.

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use log::{debug, info};

use crate::{
    config::Config,
    document::SourceDocument,
    pipeline::{BuildOutput, Toolchain, run_pipeline},
};

/// What the user asked for on the command line
#[derive(Debug, Clone, Default)]
pub struct BuildRequest {
    pub input: PathBuf,
    pub config: Option<PathBuf>,
    pub output: Option<PathBuf>,
    pub work_dir: Option<PathBuf>,
}

/// Where a build writes its files
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildPaths {
    pub output: PathBuf,
    /// Selected minified script, kept for inspection
    pub minified_script: Option<PathBuf>,
}

impl BuildPaths {
    pub fn new(source: &SourceDocument, config: &Config, output: Option<&Path>) -> Self {
        let work_dir = config.work_dir_for(source.path());
        Self {
            output: output.map_or_else(|| source.output_path(), Path::to_path_buf),
            minified_script: config
                .keep_intermediates
                .then(|| work_dir.join(format!("{}-minified.js", source.stem()))),
        }
    }
}

/// Build with process-backed tools as configured
pub fn build(request: &BuildRequest) -> Result<BuildOutput> {
    let source = SourceDocument::read(&request.input)?;
    let mut config = Config::discover(request.config.as_deref(), &request.input)?;
    if let Some(work_dir) = &request.work_dir {
        config.work_dir = Some(work_dir.clone());
    }

    let work_dir = config.work_dir_for(source.path());
    fs::create_dir_all(&work_dir)
        .with_context(|| format!("Failed to create work directory {}", work_dir.display()))?;

    let tools = Toolchain::from_config(&config, &work_dir, &source.stem());
    debug!("Using {tools:?}");
    let paths = BuildPaths::new(&source, &config, request.output.as_deref());
    build_with(&source, &config, &tools, &paths)
}

/// Run the pipeline with the given tools and commit its output
pub fn build_with(
    source: &SourceDocument,
    config: &Config,
    tools: &Toolchain,
    paths: &BuildPaths,
) -> Result<BuildOutput> {
    info!("Building {}", source.stem());
    let output = run_pipeline(source, config, tools)?;
    commit(&output, paths)?;
    info!(
        "Build completed successfully: {} size: {}",
        paths.output.display(),
        output.document.len()
    );
    Ok(output)
}

fn commit(output: &BuildOutput, paths: &BuildPaths) -> Result<()> {
    if let Some(path) = &paths.minified_script {
        fs::write(path, &output.minified_script)
            .with_context(|| format!("Failed to write minified script {}", path.display()))?;
        debug!("Wrote minified script to {}", path.display());
    }

    let mut staging = paths.output.as_os_str().to_os_string();
    staging.push(".tmp");
    let staging = PathBuf::from(staging);
    fs::write(&staging, output.document.as_str())
        .with_context(|| format!("Failed to write {}", staging.display()))?;
    fs::rename(&staging, &paths.output)
        .with_context(|| format!("Failed to move build output to {}", paths.output.display()))?;
    Ok(())
}
