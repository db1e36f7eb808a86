// Command-line entry point for traitface.

use std::path::Path;

use anyhow::Result;
use clap::{CommandFactory, Parser};

use traitface::application::GenerateUsecase;
use traitface::domain::package::{LoaderConfig, TargetSpec};
use traitface::infrastructure::{CargoPackageLoader, FileTraitSink};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Source struct type name
    #[arg(short = 's', long)]
    struct_name: String,

    /// Name of the generated trait
    #[arg(short = 'i', long)]
    trait_name: String,

    /// Input file or package path that contains the struct declaration
    #[arg(short = 'f', long)]
    input: String,

    /// Destination file for the generated trait
    #[arg(short = 'o', long)]
    output: String,

    /// Destination package name
    #[arg(short = 'p', long)]
    package: String,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    if !cli.output.ends_with(".rs") {
        Cli::command()
            .error(
                clap::error::ErrorKind::ValueValidation,
                "--output must end in .rs",
            )
            .exit();
    }

    let spec = TargetSpec {
        source_location: cli.input.clone(),
        type_name: cli.struct_name.clone(),
        trait_name: cli.trait_name.clone(),
        dest_package: cli.package.clone(),
    };

    let loader = CargoPackageLoader::new(LoaderConfig::default());
    let sink = FileTraitSink;
    let usecase = GenerateUsecase {
        loader: &loader,
        sink: &sink,
    };

    usecase.run(&spec, Path::new(&cli.output))?;

    println!(
        "Generated trait {} for {} at {}",
        cli.trait_name, cli.struct_name, cli.output
    );
    Ok(())
}
