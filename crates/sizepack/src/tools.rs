//! External tool capabilities
//!
//! The pipeline never minifies or compresses anything itself. It talks to the
//! shader minifier, the code minifiers and the packer through the traits in
//! this module and [`crate::packer`], so tests can swap in in-process fakes.
//! The `Command*` adapters run the real tools as child processes.

use std::{
    fs,
    io::Write,
    path::{Path, PathBuf},
    process::{Command, Stdio},
    thread,
};

use anyhow::{Context, Result};
use log::{debug, trace};
use serde::Deserialize;

use crate::{error::BuildError, types::ShaderUnit};

/// Argument token replaced with the input file path
pub const INPUT_ARG: &str = "{input}";

pub trait ShaderMinifier: Send + Sync {
    fn name(&self) -> &str;

    fn minify(&self, shader: &ShaderUnit) -> Result<String>;
}

pub trait CodeMinifier: Send + Sync {
    fn name(&self) -> &str;

    fn minify(&self, code: &str) -> Result<String>;
}

/// Program and arguments of an external tool
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ToolCommand {
    pub program: String,
    #[serde(default)]
    pub args: Vec<String>,
}

impl ToolCommand {
    pub fn new<S: Into<String>>(
        program: impl Into<String>,
        args: impl IntoIterator<Item = S>,
    ) -> Self {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    fn command(&self, paths: &[(&str, &Path)]) -> Command {
        // `npx` and friends are batch scripts on Windows
        let mut command = if cfg!(windows) {
            let mut command = Command::new("cmd.exe");
            command.arg("/c").arg(&self.program);
            command
        } else {
            Command::new(&self.program)
        };
        for arg in &self.args {
            match paths.iter().find(|(token, _)| *token == arg.as_str()) {
                Some((_, path)) => command.arg(path),
                None => command.arg(arg),
            };
        }
        command
    }

    /// Run to completion, feeding `stdin` and returning stdout.
    ///
    /// Arguments equal to a token in `paths` (e.g. [`INPUT_ARG`]) are
    /// replaced with the matching path.
    ///
    /// Spawn failures, non-success exits and non-UTF-8 output are all
    /// reported as [`BuildError::ExternalTool`] with the tool's stderr.
    pub fn run(
        &self,
        tool: &str,
        paths: &[(&str, &Path)],
        stdin: Option<&str>,
    ) -> Result<String> {
        let mut command = self.command(paths);
        command
            .stdin(if stdin.is_some() { Stdio::piped() } else { Stdio::null() })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        debug!("Running {tool}: {command:?}");

        let mut child = command
            .spawn()
            .map_err(|err| {
                BuildError::external(tool, format!("failed to spawn `{}`: {err}", self.program))
            })?;

        let output = thread::scope(|scope| {
            if let (Some(text), Some(mut pipe)) = (stdin, child.stdin.take()) {
                scope.spawn(move || {
                    // A tool that exits early closes the pipe; its status tells the story
                    if let Err(err) = pipe.write_all(text.as_bytes()) {
                        trace!("stdin write to {tool} ended early: {err}");
                    }
                });
            }
            child.wait_with_output()
        })
        .map_err(|err| {
            BuildError::external(tool, format!("failed to wait for `{}`: {err}", self.program))
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(BuildError::external(
                tool,
                format!("{} exited with {}: {}", self.program, output.status, stderr.trim()),
            )
            .into());
        }

        String::from_utf8(output.stdout)
            .map_err(|_| BuildError::external(tool, "produced output that is not valid UTF-8").into())
    }
}

/// Shader minifier that works file to file, like `webpack-glsl-minify`
#[derive(Debug, Clone)]
pub struct CommandShaderMinifier {
    pub command: ToolCommand,
    /// Where the isolated shader is written
    pub input_path: PathBuf,
    /// Appended to the input file name to locate the result
    pub output_extension: String,
    pub keep_files: bool,
}

impl CommandShaderMinifier {
    pub fn output_path(&self) -> PathBuf {
        let mut name = self.input_path.as_os_str().to_os_string();
        name.push(&self.output_extension);
        PathBuf::from(name)
    }
}

impl ShaderMinifier for CommandShaderMinifier {
    fn name(&self) -> &str {
        "shader minifier"
    }

    fn minify(&self, shader: &ShaderUnit) -> Result<String> {
        fs::write(&self.input_path, shader.as_str())
            .with_context(|| format!("Failed to write shader to {}", self.input_path.display()))?;
        self.command
            .run(self.name(), &[(INPUT_ARG, self.input_path.as_path())], None)?;

        let output_path = self.output_path();
        let minified = fs::read_to_string(&output_path)
            .with_context(|| format!("Failed to read minified shader {}", output_path.display()))?;

        if !self.keep_files {
            for path in [&self.input_path, &output_path] {
                if let Err(err) = fs::remove_file(path) {
                    debug!("Could not remove {}: {err}", path.display());
                }
            }
        }
        Ok(minified.trim().to_owned())
    }
}

/// Code minifier that reads the script on stdin and prints the result
#[derive(Debug, Clone)]
pub struct CommandCodeMinifier {
    pub name: String,
    pub command: ToolCommand,
}

impl CodeMinifier for CommandCodeMinifier {
    fn name(&self) -> &str {
        &self.name
    }

    fn minify(&self, code: &str) -> Result<String> {
        let output = self.command.run(&self.name, &[], Some(code))?;
        Ok(output.trim_end().to_owned())
    }
}

#[cfg(all(test, unix))]
mod tests {
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    use super::*;

    fn sh(script: &str) -> ToolCommand {
        ToolCommand::new("sh", ["-c", script])
    }

    #[test]
    fn test_code_minifier_round_trips_stdin() {
        let minifier = CommandCodeMinifier {
            name: "cat".to_owned(),
            command: ToolCommand::new("cat", Vec::<String>::new()),
        };
        assert_eq!(minifier.minify("let a = 1;\n").unwrap(), "let a = 1;");
    }

    #[test]
    fn test_failure_carries_stderr_verbatim() {
        let err = sh("echo 'Unexpected token: punc (})' >&2; exit 3")
            .run("terser", &[], Some("}"))
            .unwrap_err();
        let build_err = err.downcast_ref::<BuildError>().expect("typed error");
        let BuildError::ExternalTool { tool, message } = build_err else {
            panic!("unexpected error {build_err:?}");
        };
        assert_eq!(tool, "terser");
        assert!(message.contains("Unexpected token: punc (})"), "{message}");
    }

    #[test]
    fn test_missing_program_is_external_error() {
        let err = ToolCommand::new("sizepack-no-such-tool", Vec::<String>::new())
            .run("packer", &[], None)
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<BuildError>(),
            Some(BuildError::ExternalTool { .. })
        ));
    }

    #[test]
    fn test_shader_minifier_reads_sibling_output() {
        let dir = TempDir::new().unwrap();
        let minifier = CommandShaderMinifier {
            command: sh("tr -d ' \\n' < \"$0\" > \"$0min\"").with_input_last(),
            input_path: dir.path().join("demo-shader.glsl"),
            output_extension: "min".to_owned(),
            keep_files: false,
        };
        let minified = minifier
            .minify(&ShaderUnit::new("void main() {\n  gl_FragColor = vec4(1);\n}"))
            .unwrap();
        assert_eq!(minified, "voidmain(){gl_FragColor=vec4(1);}");
        assert!(!minifier.input_path.exists());
        assert!(!minifier.output_path().exists());
    }

    impl ToolCommand {
        fn with_input_last(mut self) -> Self {
            self.args.push(INPUT_ARG.to_owned());
            self
        }
    }
}
