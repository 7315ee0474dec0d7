//! `html2fortitude` conversion command.

use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use clap::Args;
use h2f_config::{CliSettings, Config};
use h2f_renderer::{AssignsMode, BlockStyle, ConvertResult, HashStyle};
use rayon::prelude::*;

use crate::error::CliError;
use crate::naming::{self, OutputOption, OutputTarget};
use crate::output::Output;
use crate::scanner::{self, Input};

/// Arguments for a conversion run.
#[derive(Args)]
pub(crate) struct ConvertArgs {
    /// Templates to convert: files, directories, or `-` for standard input.
    #[arg(required = true, value_name = "FILE|DIRECTORY|-")]
    inputs: Vec<String>,

    /// Output file or directory.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Name of the output class (default: inferred from the path).
    #[arg(short = 'c', long)]
    class_name: Option<String>,

    /// Base directory class names are inferred relative to (e.g. `my_rails_app/app`).
    #[arg(short = 'b', long)]
    class_base: Option<PathBuf>,

    /// Class the output class inherits from (overrides config).
    #[arg(long)]
    superclass: Option<String>,

    /// Name of the method the content is written into (overrides config).
    #[arg(long)]
    method: Option<String>,

    /// How assigns are declared and referenced: needs_defaulted_to_nil,
    /// required_needs, instance_variables or no_needs.
    #[arg(long, value_name = "MODE")]
    assigns: Option<AssignsMode>,

    /// Use `do ... end` blocks instead of braces.
    #[arg(long)]
    do_end: bool,

    /// Use `key: value` hashes instead of `:key => value`.
    #[arg(long)]
    new_style_hashes: bool,

    /// Treat input as plain HTML without ERB directives.
    #[arg(long)]
    no_erb: bool,

    /// Path to configuration file (default: auto-discover html2fortitude.toml).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Enable verbose output.
    #[arg(short, long)]
    pub verbose: bool,
}

/// One planned conversion.
struct Job {
    input: Input,
    /// Standard input, read before conversion starts.
    source: Option<String>,
    class_name: String,
    target: OutputTarget,
}

impl ConvertArgs {
    /// Execute the conversion.
    ///
    /// # Errors
    ///
    /// Returns the first error in input order: configuration, a missing
    /// input, an underivable class name, a conversion or a write failure.
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let output = Output::new();

        let cli_settings = CliSettings {
            superclass: self.superclass.clone(),
            method: self.method.clone(),
            assigns: self.assigns,
            block_style: self.do_end.then_some(BlockStyle::DoEnd),
            hash_style: self.new_style_hashes.then_some(HashStyle::Modern),
            erb: self.no_erb.then_some(false),
            class_base: self.class_base.clone(),
        };
        let config = Config::load(self.config.as_deref(), Some(&cli_settings))?;
        if let Some(path) = &config.config_path {
            tracing::info!(path = %path.display(), "Loaded configuration");
        }

        let inputs = scanner::collect_inputs(&self.inputs)?;
        if inputs.is_empty() {
            output.info("No templates found");
            return Ok(());
        }

        let option = output_option(self.output.as_deref(), inputs.len())?;
        let jobs = inputs
            .into_iter()
            .map(|input| self.plan(input, option, &config))
            .collect::<Result<Vec<_>, _>>()?;

        let results: Vec<Result<ConvertResult, CliError>> =
            jobs.par_iter().map(|job| convert(job, &config)).collect();

        for (job, result) in jobs.iter().zip(results) {
            let result = result?;
            write_output(&job.target, &result.output)?;
            output.success(&format!(
                "{} -> {} ({} lines)",
                job.input.display_name(),
                job.target,
                result.line_count()
            ));
        }

        Ok(())
    }

    fn plan(&self, input: Input, option: OutputOption<'_>, config: &Config) -> Result<Job, CliError> {
        let class_name = naming::class_name(
            &input,
            self.class_name.as_deref(),
            config.output_resolved.class_base.as_deref(),
        )?;
        let target = naming::output_target(&input, option, &class_name);
        let source = match input {
            Input::Stdin => {
                let mut buf = String::new();
                io::stdin().lock().read_to_string(&mut buf)?;
                Some(buf)
            }
            Input::File(_) => None,
        };
        Ok(Job {
            input,
            source,
            class_name,
            target,
        })
    }
}

/// Interpret `-o`. With several inputs it always names a directory.
fn output_option(output: Option<&Path>, input_count: usize) -> Result<OutputOption<'_>, CliError> {
    let Some(path) = output else {
        return Ok(OutputOption::Beside);
    };
    if path.is_dir() {
        return Ok(OutputOption::Directory(path));
    }
    if input_count > 1 {
        if path.exists() {
            return Err(CliError::Validation(format!(
                "{} is not a directory, but several templates were given",
                path.display()
            )));
        }
        return Ok(OutputOption::Directory(path));
    }
    Ok(OutputOption::File(path))
}

fn convert(job: &Job, config: &Config) -> Result<ConvertResult, CliError> {
    let source = match (&job.source, &job.input) {
        (Some(source), _) => source.clone(),
        (None, Input::File(path)) => fs::read_to_string(path)?,
        (None, Input::Stdin) => String::new(),
    };
    let path = match &job.input {
        Input::File(path) => path.clone(),
        Input::Stdin => PathBuf::from(scanner::STDIN_ARG),
    };

    let converter = config
        .converter_builder()
        .class_name(job.class_name.clone())
        .build()
        .map_err(|source| CliError::Convert {
            path: path.clone(),
            source,
        })?;
    converter
        .convert(&source)
        .map_err(|source| CliError::Convert { path, source })
}

fn write_output(target: &OutputTarget, content: &str) -> Result<(), CliError> {
    match target {
        OutputTarget::Stdout => {
            let mut stdout = io::stdout().lock();
            stdout.write_all(content.as_bytes())?;
            stdout.flush()?;
        }
        OutputTarget::File(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent)?;
            }
            fs::write(path, content)?;
        }
    }
    Ok(())
}
