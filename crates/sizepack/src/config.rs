//! Build configuration
//!
//! Every field has a default reproducing the tuned intro build, so an empty
//! (or absent) `sizepack.toml` is a complete configuration. Lookup order:
//! an explicit `--config` path, `sizepack.toml` beside the input document,
//! then the user config directory.

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use indexmap::IndexMap;
use log::debug;
use rustc_hash::FxHashSet;
use serde::Deserialize;

use crate::{
    dirs::{CONFIG_FILE_NAME, user_config_file},
    error::BuildError,
    packer::{BRIDGE_ARG, PackerSettings},
    placeholders::{PlaceholderMap, default_placeholders},
    shrink::{Elision, ShrinkRules, default_elisions, default_renames},
    tools::{INPUT_ARG, ToolCommand},
};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Shader template symbol → numeric stand-in
    pub placeholders: IndexMap<String, String>,
    /// Long token → short token
    pub renames: IndexMap<String, String>,
    pub elisions: Vec<Elision>,
    /// Quoted literal the shader is reinserted at
    pub shader_placeholder: String,
    pub shader_minifier: ShaderMinifierConfig,
    /// Candidate minifiers, in tie-breaking priority order
    pub minifiers: Vec<MinifierConfig>,
    pub packer: PackerConfig,
    /// Directory for intermediate files, defaults to the input's directory
    pub work_dir: Option<PathBuf>,
    pub keep_intermediates: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ShaderMinifierConfig {
    pub program: String,
    pub args: Vec<String>,
    /// Appended to the shader file name by the minifier
    pub output_extension: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MinifierConfig {
    pub name: String,
    pub program: String,
    #[serde(default)]
    pub args: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PackerConfig {
    pub program: String,
    pub args: Vec<String>,
    #[serde(flatten)]
    pub settings: PackerSettings,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            placeholders: default_placeholders(),
            renames: default_renames(),
            elisions: default_elisions(),
            shader_placeholder: "`/`".to_owned(),
            shader_minifier: ShaderMinifierConfig::default(),
            minifiers: vec![
                MinifierConfig {
                    name: "uglify-js".to_owned(),
                    program: "npx".to_owned(),
                    args: strings(&["uglify-js", "--compress", "--mangle"]),
                },
                MinifierConfig {
                    name: "terser".to_owned(),
                    program: "npx".to_owned(),
                    args: strings(&[
                        "terser",
                        "--compress",
                        "drop_console=true,passes=25,ecma=2020,hoist_funs=true,unsafe=true",
                        "--mangle",
                    ]),
                },
            ],
            packer: PackerConfig::default(),
            work_dir: None,
            keep_intermediates: true,
        }
    }
}

impl Default for ShaderMinifierConfig {
    fn default() -> Self {
        Self {
            program: "npx".to_owned(),
            args: strings(&[
                "webpack-glsl-minify",
                INPUT_ARG,
                "--output",
                "sourceOnly",
                "--preserveUniforms",
                "--preserveVariables",
                "--preserveDefines",
                "-e",
                "min",
            ]),
            output_extension: "min".to_owned(),
        }
    }
}

impl Default for PackerConfig {
    fn default() -> Self {
        Self {
            program: "node".to_owned(),
            args: strings(&[BRIDGE_ARG]),
            settings: PackerSettings::default(),
        }
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|item| (*item).to_owned()).collect()
}

impl MinifierConfig {
    pub fn command(&self) -> ToolCommand {
        ToolCommand::new(self.program.clone(), self.args.clone())
    }
}

impl ShaderMinifierConfig {
    pub fn command(&self) -> ToolCommand {
        ToolCommand::new(self.program.clone(), self.args.clone())
    }
}

impl PackerConfig {
    pub fn command(&self) -> ToolCommand {
        ToolCommand::new(self.program.clone(), self.args.clone())
    }
}

impl Config {
    pub fn from_toml(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text).context("Failed to parse configuration")?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read configuration {}", path.display()))?;
        Self::from_toml(&text)
            .with_context(|| format!("Invalid configuration in {}", path.display()))
    }

    /// Find and load the configuration for building `input`
    pub fn discover(explicit: Option<&Path>, input: &Path) -> Result<Self> {
        if let Some(path) = explicit {
            debug!("Using configuration {}", path.display());
            return Self::from_file(path);
        }

        let beside_input = input.with_file_name(CONFIG_FILE_NAME);
        let candidates = std::iter::once(beside_input).chain(user_config_file());
        for path in candidates {
            if path.is_file() {
                debug!("Using configuration {}", path.display());
                return Self::from_file(&path);
            }
        }

        debug!("No configuration file found, using defaults");
        Ok(Self::default())
    }

    pub fn shrink_rules(&self) -> ShrinkRules {
        ShrinkRules {
            renames: self.renames.clone(),
            elisions: self.elisions.clone(),
        }
    }

    pub fn placeholder_map(&self) -> PlaceholderMap {
        PlaceholderMap::new(
            self.placeholders
                .iter()
                .map(|(symbol, stand_in)| (symbol.as_str(), stand_in.as_str())),
        )
    }

    /// Directory for intermediate artifacts when building `input`
    pub fn work_dir_for(&self, input: &Path) -> PathBuf {
        self.work_dir.clone().unwrap_or_else(|| {
            input
                .parent()
                .filter(|parent| !parent.as_os_str().is_empty())
                .map_or_else(|| PathBuf::from("."), Path::to_path_buf)
        })
    }

    pub fn validate(&self) -> Result<(), BuildError> {
        self.shrink_rules().validate()?;

        let mut stand_ins = FxHashSet::default();
        for (symbol, stand_in) in &self.placeholders {
            if symbol.is_empty() || stand_in.is_empty() {
                return invalid(format!("placeholder `{symbol}` -> `{stand_in}` has an empty side"));
            }
            if !stand_ins.insert(stand_in.as_str()) {
                return invalid(format!("stand-in `{stand_in}` is used by more than one placeholder"));
            }
        }

        if self.shader_placeholder.chars().count() < 2 {
            return invalid(format!(
                "shader placeholder `{}` needs an opening and a closing quote",
                self.shader_placeholder
            ));
        }

        if self.minifiers.len() < 2 {
            return invalid(format!(
                "at least two candidate minifiers are required, found {}",
                self.minifiers.len()
            ));
        }
        let mut names = FxHashSet::default();
        for minifier in &self.minifiers {
            if !names.insert(minifier.name.as_str()) {
                return invalid(format!("minifier `{}` is listed twice", minifier.name));
            }
        }
        Ok(())
    }
}

fn invalid(message: String) -> Result<(), BuildError> {
    Err(BuildError::InvalidConfig(message))
}
