//! Entropy-coding packer invocation
//!
//! The packer compresses the selected script and hands back a two-part
//! decoder bootstrap. Neither part is inspected here; they are spliced into
//! the output byte for byte.

use std::{fs, path::PathBuf};

use anyhow::{Context, Result};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::tools::ToolCommand;

/// Argument token replaced with the path of the bundled packer bridge
pub const BRIDGE_ARG: &str = "{bridge}";

/// Node script speaking the JSON protocol of [`CommandPacker`] on top of roadroller
pub const BRIDGE_SCRIPT: &str = include_str!("../tools/roadroller-pack.mjs");

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum InputType {
    Js,
}

/// What the decoder does with the decoded input
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum InputAction {
    Eval,
}

/// One `(data, type, action)` descriptor
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PackInput {
    pub data: String,
    #[serde(rename = "type")]
    pub kind: InputType,
    pub action: InputAction,
}

impl PackInput {
    pub fn eval_js(data: impl Into<String>) -> Self {
        Self {
            data: data.into(),
            kind: InputType::Js,
            action: InputAction::Eval,
        }
    }
}

/// Model parameters handed to the packer
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PackerSettings {
    pub max_memory_mb: u32,
    pub num_abbreviations: u32,
    pub dynamic_models: u32,
    pub recip_learning_rate: u32,
    pub model_max_count: u32,
    pub model_recip_base_count: u32,
    pub precision: u32,
    pub sparse_selectors: Vec<u32>,
}

impl Default for PackerSettings {
    fn default() -> Self {
        Self {
            max_memory_mb: 512,
            num_abbreviations: 0,
            dynamic_models: 0,
            recip_learning_rate: 930,
            model_max_count: 3,
            model_recip_base_count: 55,
            precision: 14,
            sparse_selectors: vec![0, 1, 2, 3, 6, 7, 13, 14, 25, 109, 217, 322],
        }
    }
}

impl PackerSettings {
    /// Options object in the packer's own naming
    pub fn to_options(&self) -> serde_json::Value {
        json!({
            "maxMemoryMB": self.max_memory_mb,
            "numAbbreviations": self.num_abbreviations,
            "dynamicModels": self.dynamic_models,
            "recipLearningRate": self.recip_learning_rate,
            "modelMaxCount": self.model_max_count,
            "modelRecipBaseCount": self.model_recip_base_count,
            "precision": self.precision,
            "sparseSelectors": self.sparse_selectors,
        })
    }

    /// The same settings as packer command-line flags, for reproducing a build by hand
    pub fn to_cli_flags(&self) -> String {
        let mut flags = format!(
            "-M{} -Zab{} -Zdy{} -Zlr{} -Zmc{} -Zmd{} -Zpr{}",
            self.max_memory_mb,
            self.num_abbreviations,
            self.dynamic_models,
            self.recip_learning_rate,
            self.model_max_count,
            self.model_recip_base_count,
            self.precision,
        );
        if !self.sparse_selectors.is_empty() {
            let selectors: Vec<String> = self.sparse_selectors.iter().map(u32::to_string).collect();
            flags.push_str(" -S");
            flags.push_str(&selectors.join(","));
        }
        flags
    }
}

/// The two decoder parts; executing `first_line + second_line` reproduces the input
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackedArtifact {
    pub first_line: String,
    pub second_line: String,
}

impl PackedArtifact {
    pub fn new(first_line: impl Into<String>, second_line: impl Into<String>) -> Self {
        Self {
            first_line: first_line.into(),
            second_line: second_line.into(),
        }
    }

    pub fn len(&self) -> usize {
        self.first_line.len() + self.second_line.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

pub trait Packer: Send + Sync {
    fn name(&self) -> &str;

    fn pack(&self, inputs: &[PackInput], settings: &PackerSettings) -> Result<PackedArtifact>;
}

/// Packer driven over a JSON protocol on stdin/stdout.
///
/// Request: `{"inputs": [{"data", "type", "action"}], "options": {...}}`.
/// Response: `{"firstLine": "...", "secondLine": "..."}`.
///
/// When the command mentions [`BRIDGE_ARG`], [`BRIDGE_SCRIPT`] is written to
/// `bridge_path` first so the build does not depend on the current directory.
#[derive(Debug, Clone)]
pub struct CommandPacker {
    pub command: ToolCommand,
    pub bridge_path: PathBuf,
    pub keep_files: bool,
}

impl CommandPacker {
    fn uses_bridge(&self) -> bool {
        self.command.args.iter().any(|arg| arg == BRIDGE_ARG)
    }
}

impl Packer for CommandPacker {
    fn name(&self) -> &str {
        "packer"
    }

    fn pack(&self, inputs: &[PackInput], settings: &PackerSettings) -> Result<PackedArtifact> {
        let request = json!({
            "inputs": inputs,
            "options": settings.to_options(),
        });
        let uses_bridge = self.uses_bridge();
        if uses_bridge {
            fs::write(&self.bridge_path, BRIDGE_SCRIPT).with_context(|| {
                format!("Failed to write packer bridge {}", self.bridge_path.display())
            })?;
        }

        let response = self.command.run(
            self.name(),
            &[(BRIDGE_ARG, self.bridge_path.as_path())],
            Some(&request.to_string()),
        );
        if uses_bridge && !self.keep_files {
            if let Err(err) = fs::remove_file(&self.bridge_path) {
                debug!("Could not remove {}: {err}", self.bridge_path.display());
            }
        }

        let response = response?;
        serde_json::from_str(&response).with_context(|| {
            format!("{} returned an unreadable decoder: {}", self.name(), response.trim())
        })
    }
}

/// Pack the minified script as a single evaluated JS input
pub fn pack_script(
    script: &str,
    packer: &dyn Packer,
    settings: &PackerSettings,
) -> Result<PackedArtifact> {
    debug!("Packer settings: {}", settings.to_cli_flags());
    let packed = packer.pack(&[PackInput::eval_js(script)], settings)?;
    info!(
        "Packed decoder: firstLine {} secondLine {} total: {}",
        packed.first_line.len(),
        packed.second_line.len(),
        packed.len()
    );
    Ok(packed)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_default_flags_match_tuned_build() {
        assert_eq!(
            PackerSettings::default().to_cli_flags(),
            "-M512 -Zab0 -Zdy0 -Zlr930 -Zmc3 -Zmd55 -Zpr14 -S0,1,2,3,6,7,13,14,25,109,217,322"
        );
    }

    #[test]
    fn test_request_uses_packer_field_names() {
        let input = serde_json::to_value(PackInput::eval_js("a()")).unwrap();
        assert_eq!(input, json!({"data": "a()", "type": "js", "action": "eval"}));

        let options = PackerSettings::default().to_options();
        assert_eq!(options["maxMemoryMB"], 512);
        assert_eq!(options["recipLearningRate"], 930);
        assert_eq!(options["sparseSelectors"][11], 322);
    }

    #[test]
    fn test_response_parses_both_parts() {
        let packed: PackedArtifact =
            serde_json::from_str(r#"{"firstLine":"eval(Function(","secondLine":"...)())"}"#).unwrap();
        assert_eq!(packed, PackedArtifact::new("eval(Function(", "...)())"));
        assert_eq!(packed.len(), 21);
    }

    #[test]
    fn test_partial_settings_fall_back_to_defaults() {
        let settings: PackerSettings = toml::from_str("precision = 12").unwrap();
        assert_eq!(settings.precision, 12);
        assert_eq!(settings.recip_learning_rate, 930);
    }

    #[cfg(unix)]
    #[test]
    fn test_command_packer_speaks_json() {
        let dir = tempfile::TempDir::new().unwrap();
        let packer = CommandPacker {
            command: ToolCommand::new(
                "sh",
                ["-c", r#"cat > /dev/null; printf '{"firstLine":"A","secondLine":"B"}'"#],
            ),
            bridge_path: dir.path().join("bridge.mjs"),
            keep_files: true,
        };
        let packed = pack_script("x()", &packer, &PackerSettings::default()).unwrap();
        assert_eq!(packed, PackedArtifact::new("A", "B"));
        assert!(!packer.bridge_path.exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_bridge_is_written_beside_intermediates() {
        let dir = tempfile::TempDir::new().unwrap();
        let script = r#"cat > /dev/null; grep -q "from 'roadroller'" "$0" && printf '{"firstLine":"R","secondLine":"()"}'"#;
        let packer = CommandPacker {
            command: ToolCommand::new("sh", ["-c", script, BRIDGE_ARG]),
            bridge_path: dir.path().join("demo-packer.mjs"),
            keep_files: false,
        };
        let packed = pack_script("x()", &packer, &PackerSettings::default()).unwrap();
        assert_eq!(packed, PackedArtifact::new("R", "()"));
        assert!(!packer.bridge_path.exists());
    }

    #[test]
    fn test_default_packer_uses_bundled_bridge() {
        let config = crate::config::PackerConfig::default();
        assert_eq!(config.program, "node");
        assert_eq!(config.args, vec![BRIDGE_ARG.to_owned()]);
        assert!(BRIDGE_SCRIPT.contains("makeDecoder"));
    }
}
