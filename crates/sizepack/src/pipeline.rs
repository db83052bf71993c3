//! The build pipeline
//!
//! Stages run strictly in order and each one takes the previous stage's value
//! and returns a new one:
//!
//! 1. region extraction → skeleton + code unit
//! 2. dev block stripping
//! 3. shader isolation
//! 4. placeholder normalization, external shader minification, denormalization
//! 5. shader reinsertion
//! 6. token shrinking
//! 7. candidate minification (parallel) and selection
//! 8. packing
//! 9. assembly
//!
//! Nothing here touches the output file. See [`crate::orchestrator`] for the
//! commit step.

use std::{fmt, path::Path};

use anyhow::{Result, anyhow};
use log::{debug, info};

use crate::{
    assembler::assemble,
    candidates::{Candidate, minify_candidates, select_smallest},
    config::Config,
    dev_blocks::strip_dev_blocks,
    document::SourceDocument,
    packer::{CommandPacker, PackedArtifact, Packer, pack_script},
    regions::extract_regions,
    shader::{IsolatedShader, isolate_shader, reinsert_shader},
    shrink::shrink,
    tools::{CodeMinifier, CommandCodeMinifier, CommandShaderMinifier, ShaderMinifier},
    types::{CodeUnit, FinalDocument},
};

/// The external collaborators of one build
pub struct Toolchain {
    pub shader_minifier: Box<dyn ShaderMinifier>,
    /// In tie-breaking priority order
    pub code_minifiers: Vec<Box<dyn CodeMinifier>>,
    pub packer: Box<dyn Packer>,
}

impl fmt::Debug for Toolchain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let minifiers: Vec<&str> = self.code_minifiers.iter().map(|m| m.name()).collect();
        f.debug_struct("Toolchain")
            .field("shader_minifier", &self.shader_minifier.name())
            .field("code_minifiers", &minifiers)
            .field("packer", &self.packer.name())
            .finish()
    }
}

impl Toolchain {
    /// Process-backed tools as configured; intermediate files go to `work_dir`
    pub fn from_config(config: &Config, work_dir: &Path, stem: &str) -> Self {
        let shader_minifier = CommandShaderMinifier {
            command: config.shader_minifier.command(),
            input_path: work_dir.join(format!("{stem}-shader.glsl")),
            output_extension: config.shader_minifier.output_extension.clone(),
            keep_files: config.keep_intermediates,
        };
        let code_minifiers = config
            .minifiers
            .iter()
            .map(|minifier| {
                Box::new(CommandCodeMinifier {
                    name: minifier.name.clone(),
                    command: minifier.command(),
                }) as Box<dyn CodeMinifier>
            })
            .collect();
        Self {
            shader_minifier: Box::new(shader_minifier),
            code_minifiers,
            packer: Box::new(CommandPacker {
                command: config.packer.command(),
                bridge_path: work_dir.join(format!("{stem}-packer.mjs")),
                keep_files: config.keep_intermediates,
            }),
        }
    }
}

/// Sizes observed along the way
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildStats {
    pub original_size: usize,
    pub dev_blocks_removed: usize,
    pub shader_size: Option<usize>,
    pub minified_shader_size: Option<usize>,
    pub script_size: usize,
    pub shrunk_size: usize,
    /// `(minifier, length)` per candidate, in priority order
    pub candidates: Vec<(String, usize)>,
    pub selected_minifier: Option<String>,
    pub minified_size: usize,
    pub packed_size: usize,
    pub final_size: usize,
}

/// Everything a successful build produces, still in memory
#[derive(Debug, Clone)]
pub struct BuildOutput {
    pub document: FinalDocument,
    /// The selected minified script, before packing
    pub minified_script: String,
    pub stats: BuildStats,
}

pub fn run_pipeline(
    source: &SourceDocument,
    config: &Config,
    tools: &Toolchain,
) -> Result<BuildOutput> {
    let mut stats = BuildStats {
        original_size: source.text().len(),
        ..BuildStats::default()
    };

    let extraction = extract_regions(source.text());
    let stripped = strip_dev_blocks(&extraction.code_unit());
    stats.dev_blocks_removed = stripped.removed.len();

    let isolated = isolate_shader(&stripped.code, &config.shader_placeholder)?;
    let script = restore_shader(isolated, config, tools, &mut stats)?;
    stats.script_size = script.len();
    info!("Original script size: {}", script.len());

    let shrunk = shrink(&script, &config.shrink_rules());
    stats.shrunk_size = shrunk.len();

    let (minified_script, packed) = if shrunk.is_empty() {
        info!("Script is empty, nothing to minify or pack");
        (String::new(), PackedArtifact::default())
    } else {
        let selected = minify_and_select(&shrunk, tools, &mut stats)?;
        let packed = pack_script(&selected.code, tools.packer.as_ref(), &config.packer.settings)?;
        (selected.code, packed)
    };
    stats.minified_size = minified_script.len();
    stats.packed_size = packed.len();

    let document = assemble(&extraction.skeleton, &packed);
    stats.final_size = document.len();
    debug!("Build stats: {stats:?}");

    Ok(BuildOutput {
        document,
        minified_script,
        stats,
    })
}

/// Minify the isolated shader and splice it back into the script
fn restore_shader(
    isolated: IsolatedShader,
    config: &Config,
    tools: &Toolchain,
    stats: &mut BuildStats,
) -> Result<CodeUnit> {
    let Some(shader) = isolated.shader else {
        return Ok(isolated.code);
    };
    stats.shader_size = Some(shader.len());

    let placeholders = config.placeholder_map();
    let normalized = placeholders.normalize(&shader);
    let minified = tools.shader_minifier.minify(&normalized)?;
    info!("Minified shader size: {}", minified.len());
    stats.minified_shader_size = Some(minified.len());

    let restored = placeholders.denormalize(&minified);
    reinsert_shader(&isolated.code, &config.shader_placeholder, &restored)
}

fn minify_and_select(
    code: &CodeUnit,
    tools: &Toolchain,
    stats: &mut BuildStats,
) -> Result<Candidate> {
    let candidates = minify_candidates(code, &tools.code_minifiers)?;
    stats.candidates = candidates
        .iter()
        .map(|candidate| (candidate.minifier.clone(), candidate.len()))
        .collect();

    let selected = select_smallest(candidates)
        .ok_or_else(|| anyhow!("No candidate minifiers are configured"))?;
    info!(
        "Minified script: {} (selected {})",
        selected.len(),
        selected.minifier
    );
    stats.selected_minifier = Some(selected.minifier.clone());
    Ok(selected)
}
