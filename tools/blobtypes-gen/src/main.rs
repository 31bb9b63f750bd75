// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! blobtypes-gen CLI
//!
//! Compiles JSON schemas into OpenCL C and converts between value trees and
//! blob bytes.
//!
//! # Usage
//!
//! ```bash
//! # Header and source for kernels
//! blobtypes-gen generate --schema scene.json --global Scene --constant Settings \
//!     --header blobs.h --source blobs.cl
//!
//! # Field table of a type
//! blobtypes-gen layout --schema scene.json --type Scene --param particles_capacity=64
//!
//! # Value tree to bytes and back
//! blobtypes-gen encode --schema scene.json --type Scene --input scene.json --output scene.bin
//! blobtypes-gen decode --schema scene.json --type Scene --input scene.bin --nested
//! ```

use anyhow::{bail, Context, Result};
use blobtypes::{
    AddressSpace, BlobView, Generator, GeneratorConfig, LayoutCompiler, LayoutConfig,
    NamingMode, Params, TypeRegistry, Value,
};
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Blob layout compiler and OpenCL C generator
#[derive(Parser, Debug)]
#[command(name = "blobtypes-gen")]
#[command(about = "Blob layout compiler and OpenCL C generator")]
#[command(version)]
struct Cli {
    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Debug, Clone)]
struct SchemaArgs {
    /// JSON schema file
    #[arg(short, long)]
    schema: PathBuf,

    /// Pack 3-component vectors without padding
    #[arg(long)]
    unaligned: bool,
}

impl SchemaArgs {
    fn load(&self) -> Result<(TypeRegistry, LayoutCompiler)> {
        let registry = blobtypes::load_registry(&self.schema)
            .with_context(|| format!("failed to load schema {}", self.schema.display()))?;
        tracing::info!(
            "loaded {} types from {}",
            registry.len(),
            self.schema.display()
        );
        let config = if self.unaligned {
            LayoutConfig::unaligned()
        } else {
            LayoutConfig::default()
        };
        Ok((registry, LayoutCompiler::new(config)))
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate an OpenCL C header and source
    Generate {
        #[command(flatten)]
        schema: SchemaArgs,

        /// Types to emit in __private (can repeat)
        #[arg(long)]
        private: Vec<String>,

        /// Types to emit in __local (can repeat)
        #[arg(long)]
        local: Vec<String>,

        /// Types to emit in __constant (can repeat)
        #[arg(long)]
        constant: Vec<String>,

        /// Types to emit in __global (can repeat)
        #[arg(long)]
        global: Vec<String>,

        /// Header output path
        #[arg(long)]
        header: PathBuf,

        /// Source output path
        #[arg(long)]
        source: PathBuf,

        /// File whose text opens the header
        #[arg(long)]
        prologue: Option<PathBuf>,

        /// File whose text closes the header
        #[arg(long)]
        epilogue: Option<PathBuf>,

        /// Identifier style (short, full)
        #[arg(long, default_value = "short")]
        naming: String,
    },

    /// Print the field table of a type
    Layout {
        #[command(flatten)]
        schema: SchemaArgs,

        /// Type name
        #[arg(short = 't', long = "type")]
        type_name: String,

        /// Capacity parameter (format: "name=value", can repeat)
        #[arg(short, long)]
        param: Vec<String>,
    },

    /// Encode a JSON value tree into blob bytes
    Encode {
        #[command(flatten)]
        schema: SchemaArgs,

        /// Type name
        #[arg(short = 't', long = "type")]
        type_name: String,

        /// JSON value tree
        #[arg(short, long)]
        input: PathBuf,

        /// Output blob file
        #[arg(short, long)]
        output: PathBuf,

        /// Capacity parameter (format: "name=value", can repeat)
        #[arg(short, long)]
        param: Vec<String>,
    },

    /// Decode blob bytes into a JSON value tree
    Decode {
        #[command(flatten)]
        schema: SchemaArgs,

        /// Type name
        #[arg(short = 't', long = "type")]
        type_name: String,

        /// Input blob file
        #[arg(short, long)]
        input: PathBuf,

        /// Re-nest record fields instead of printing flat names
        #[arg(long)]
        nested: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_new(&cli.log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    match cli.command {
        Commands::Generate {
            schema,
            private,
            local,
            constant,
            global,
            header,
            source,
            prologue,
            epilogue,
            naming,
        } => {
            let roots = [
                (AddressSpace::Private, private),
                (AddressSpace::Local, local),
                (AddressSpace::Constant, constant),
                (AddressSpace::Global, global),
            ];
            let config = GeneratorConfig::default()
                .with_naming(naming.parse::<NamingMode>()?)
                .with_prologue(read_optional(prologue.as_deref())?)
                .with_epilogue(read_optional(epilogue.as_deref())?);
            cmd_generate(&schema, &roots, config, &header, &source)
        }
        Commands::Layout {
            schema,
            type_name,
            param,
        } => {
            let text = cmd_layout(&schema, &type_name, &param)?;
            print!("{text}");
            Ok(())
        }
        Commands::Encode {
            schema,
            type_name,
            input,
            output,
            param,
        } => cmd_encode(&schema, &type_name, &input, &output, &param),
        Commands::Decode {
            schema,
            type_name,
            input,
            nested,
        } => {
            let json = cmd_decode(&schema, &type_name, &input, nested)?;
            println!("{}", serde_json::to_string_pretty(&json)?);
            Ok(())
        }
    }
}

fn cmd_generate(
    schema: &SchemaArgs,
    roots: &[(AddressSpace, Vec<String>)],
    config: GeneratorConfig,
    header: &Path,
    source: &Path,
) -> Result<()> {
    let (registry, compiler) = schema.load()?;
    if roots.iter().all(|(_, names)| names.is_empty()) {
        bail!("no types requested (use --private, --local, --constant or --global)");
    }

    let mut generator = Generator::new(config, compiler);
    for (space, names) in roots {
        for name in names {
            let ty = registry.resolve(name)?;
            generator
                .add(&ty, *space)
                .with_context(|| format!("failed to generate {name} for {space}"))?;
        }
    }
    let unit = generator.finish();

    std::fs::write(header, unit.header())
        .with_context(|| format!("failed to write {}", header.display()))?;
    std::fs::write(source, unit.source())
        .with_context(|| format!("failed to write {}", source.display()))?;
    tracing::info!(
        "wrote {} declarations and {} functions to {} and {}",
        unit.declarations().len(),
        unit.bodies().len(),
        header.display(),
        source.display()
    );
    Ok(())
}

fn cmd_layout(schema: &SchemaArgs, type_name: &str, params: &[String]) -> Result<String> {
    let (registry, compiler) = schema.load()?;
    let ty = registry.resolve(type_name)?;
    let layout = compiler.compute_layout(&ty, &parse_params(params)?)?;
    Ok(layout.to_string())
}

fn cmd_encode(
    schema: &SchemaArgs,
    type_name: &str,
    input: &Path,
    output: &Path,
    params: &[String],
) -> Result<()> {
    let (registry, compiler) = schema.load()?;
    let ty = registry.resolve(type_name)?;

    let text = std::fs::read_to_string(input)
        .with_context(|| format!("failed to read {}", input.display()))?;
    let json: serde_json::Value =
        serde_json::from_str(&text).context("failed to parse value tree")?;
    let tree = Value::try_from(json)?;

    let blob = BlobView::from_value_tree(&compiler, &ty, &tree, &parse_params(params)?)?;
    tracing::info!("encoded {} ({} bytes)", type_name, blob.bytes().len());
    std::fs::write(output, blob.into_bytes())
        .with_context(|| format!("failed to write {}", output.display()))?;
    Ok(())
}

fn cmd_decode(
    schema: &SchemaArgs,
    type_name: &str,
    input: &Path,
    nested: bool,
) -> Result<serde_json::Value> {
    let (registry, compiler) = schema.load()?;
    let ty = registry.resolve(type_name)?;

    let bytes =
        std::fs::read(input).with_context(|| format!("failed to read {}", input.display()))?;
    let view = BlobView::from_buffer(&compiler, &ty, bytes.as_slice(), None)?;
    if view.bytes().len() < bytes.len() {
        tracing::warn!(
            "ignoring {} trailing bytes",
            bytes.len() - view.bytes().len()
        );
    }

    let tree = if nested {
        view.to_nested_value_tree()
    } else {
        view.to_value_tree()
    };
    Ok(serde_json::Value::from(&tree))
}

/// Parse `name=value` capacity parameters; one entry may hold several
/// comma separated pairs.
fn parse_params(raw: &[String]) -> Result<Params> {
    let mut params = Params::new();
    for entry in raw {
        let parsed: Params = entry
            .parse()
            .with_context(|| format!("invalid parameter '{entry}'"))?;
        params.extend(parsed);
    }
    Ok(params)
}

fn read_optional(path: Option<&Path>) -> Result<String> {
    match path {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display())),
        None => Ok(String::new()),
    }
}
