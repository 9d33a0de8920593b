use clap::Parser;
use env_logger::Builder;
use log::LevelFilter;

use meshglue::{convert, write_vtk, GlueResult};

/// Glue a multi-block structured grid into an unstructured hex mesh.
#[derive(Parser, Debug)]
#[command(about = "Convert an NMF + PLOT3D block grid to an unstructured mesh", long_about = None)]
struct Args {
    #[arg(help = "Neutral Map File describing the block topology")]
    nmf: String,

    #[arg(help = "PLOT3D grid file (ASCII)")]
    grid: String,

    #[arg(help = "Output mesh file (legacy VTK)")]
    output: String,

    #[arg(short, long, help = "Verbose output", action = clap::ArgAction::Count)]
    verbose: u8,
}

fn run(args: &Args) -> GlueResult<()> {
    let mesh = convert(&args.nmf, &args.grid)?;
    let report = mesh.report();
    log::info!("{report}");
    write_vtk(&args.output, &mesh, "meshglue output")?;
    Ok(())
}

fn main() {
    let args = Args::parse();

    let log_level = match args.verbose {
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    Builder::new().filter_level(log_level).init();

    if let Err(e) = run(&args) {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
