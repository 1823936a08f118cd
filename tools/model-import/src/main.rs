//! model-import - model import pipeline tool
//!
//! Loads models from the asset tree, prints their hierarchy and exports them
//! to GPU-ready binary files (.ncmodel).

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use model_import::formats::{write_model, MODEL_EXT};
use model_import::{scene, GltfImporter, HeadlessDevice, LoaderConfig, Model, ModelLoader};

#[derive(Parser)]
#[command(name = "model-import")]
#[command(about = "Model import pipeline tool")]
#[command(version)]
struct Cli {
    /// Loader configuration (model-import.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Asset root directory (overrides config)
    #[arg(long, global = true)]
    asset_root: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load a model and print a summary
    Load {
        /// Model name (directory under the asset root)
        name: String,
    },

    /// Print a model's node hierarchy
    Tree {
        /// Model name (directory under the asset root)
        name: String,
    },

    /// Export a model to a binary model file
    Export {
        /// Model name (directory under the asset root)
        name: String,

        /// Output file (defaults to <name>.ncmodel)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// List the node names of a glTF file
    Nodes {
        /// Input glTF/GLB file
        input: PathBuf,
    },
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => LoaderConfig::from_toml_file(path)?,
        None => LoaderConfig::default(),
    };
    if let Some(asset_root) = cli.asset_root {
        config = config.with_asset_root(asset_root);
    }

    match cli.command {
        Commands::Load { name } => {
            let model = load(config, &name)?;
            println!("{}", model.name);
            println!("  nodes:     {}", model.nodes.len());
            println!("  vertices:  {}", model.vertex_count());
            println!("  faces:     {}", model.face_count());
            println!("  materials: {}", model.materials.len());
            println!("  textures:  {}", model.textures.len());
            println!("  clusters:  {}", model.skin_clusters.len());
            println!("  format:    {}", model_common::format_name(model.format));
            if !model.bounds.is_empty() {
                println!(
                    "  bounds:    {:?} .. {:?}",
                    model.bounds.min.to_array(),
                    model.bounds.max.to_array()
                );
            }
        }

        Commands::Tree { name } => {
            let model = load(config, &name)?;
            print_tree(&model);
        }

        Commands::Export { name, output } => {
            let model = load(config, &name)?;
            let output = output.unwrap_or_else(|| PathBuf::from(format!("{}.{}", name, MODEL_EXT)));
            tracing::info!("Exporting '{}' -> {:?}", name, output);

            let file = std::fs::File::create(&output)
                .with_context(|| format!("Failed to create {:?}", output))?;
            let mut writer = std::io::BufWriter::new(file);
            write_model(&mut writer, &model)?;
            tracing::info!("Done!");
        }

        Commands::Nodes { input } => {
            for name in scene::describe_nodes(&input)? {
                println!("{}", name);
            }
        }
    }

    Ok(())
}

fn load(config: LoaderConfig, name: &str) -> Result<Model> {
    let mut loader = ModelLoader::new(GltfImporter::new(), config);
    loader.initialize(HeadlessDevice::new());
    let model = loader
        .load_model(name)
        .with_context(|| format!("Failed to load model '{}'", name))?;
    loader.finalize();
    Ok(model)
}

fn print_tree(model: &Model) {
    for (id, depth) in model.traverse() {
        let Some(node) = model.node(id) else {
            continue;
        };
        let mut line = format!("{}{}", "  ".repeat(depth), node.name);
        if let Some(mesh) = &node.mesh {
            line.push_str(&format!(
                " [mesh: {} vertices, {} faces]",
                mesh.vertex_count, mesh.face_count
            ));
        }
        if let Some(material) = node.material.and_then(|m| model.material(m)) {
            line.push_str(&format!(" [material: {}]", material.name));
        }
        println!("{}", line);
    }
}
