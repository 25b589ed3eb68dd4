use std::env;
use std::path::PathBuf;

use matrix_mul::{PipelineConfig, generate, pipeline};

const DEFAULT_SIZE: usize = 1000;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let args: Vec<String> = env::args().collect();
    let program = args.first().map_or("matrix-mul", String::as_str);
    let mode = args.get(1).cloned().unwrap_or_else(|| "demo".to_string());

    match mode.as_str() {
        "generate" => {
            let path = PathBuf::from(args.get(2).ok_or("missing output path")?);
            let rows = parse_or(args.get(3), DEFAULT_SIZE)?;
            let cols = parse_or(args.get(4), rows)?;

            generate::generate_file(&path, rows, cols, &mut rand::thread_rng()).await?;
            println!("Wrote {}x{} matrix to {}", rows, cols, path.display());
        }
        "multiply" => {
            let (Some(a), Some(b), Some(out)) = (args.get(2), args.get(3), args.get(4)) else {
                usage(program);
            };
            let m = parse_or(args.get(5), DEFAULT_SIZE)?;
            let n = parse_or(args.get(6), m)?;
            let p = parse_or(args.get(7), n)?;

            let mut config = PipelineConfig::new(a, b, out, m, n, p);
            if let Some(threads) = args.get(8) {
                config = config.with_threads(threads.parse()?);
            }
            run(&config).await;
        }
        "demo" => {
            let dir = args.get(2).map_or_else(env::temp_dir, PathBuf::from);
            let n = parse_or(args.get(3), DEFAULT_SIZE)?;
            let config = PipelineConfig::new(
                dir.join("matrixA.txt"),
                dir.join("matrixB.txt"),
                dir.join("result.txt"),
                n,
                n,
                n,
            );

            let mut rng = rand::thread_rng();
            println!("Generating {}x{} inputs in {}", n, n, dir.display());
            generate::generate_file(&config.a.path, n, n, &mut rng).await?;
            generate::generate_file(&config.b.path, n, n, &mut rng).await?;
            run(&config).await;
        }
        _ => usage(program),
    }

    Ok(())
}

async fn run(config: &PipelineConfig) {
    match pipeline::run(config).await {
        Ok(report) => {
            println!(
                "Multiplied {}x{} result on {} threads in {} ms",
                report.rows,
                report.cols,
                report.threads,
                report.elapsed.as_millis()
            );
            println!("Result written to {}", config.output.display());
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}

fn parse_or(arg: Option<&String>, default: usize) -> Result<usize, std::num::ParseIntError> {
    arg.map_or(Ok(default), |s| s.parse())
}

fn usage(program: &str) -> ! {
    eprintln!("Usage: {} <mode> [args...]", program);
    eprintln!("Modes:");
    eprintln!("  generate <path> [rows] [cols]                - Write a random matrix");
    eprintln!("  multiply <a> <b> <out> [m] [n] [p] [threads] - Compute (m×n)·(n×p)");
    eprintln!("  demo [dir] [n]                               - Generate n×n inputs and multiply");
    std::process::exit(1);
}
