use std::env;
use std::fs;
use std::path::Path;
use std::process;

use anyhow::{Context, Result, bail};
use clove::Compiler;
use clove::codegen::{TargetSpec, exec};
use clove::error::print_error_with_context;
use tracing::info;

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    /// 发射并打印指令清单
    Emit,
    /// 直接解释执行第一个 form
    Eval,
    /// 发射后在栈机上执行
    Run,
}

struct CliOptions {
    mode: Mode,
    target: TargetSpec,
    output: Option<String>,      // -o <file>
    expr: Option<String>,        // -e <form>
    input: Option<String>,
    verbose: u8,                 // -v, -vv
    quiet: bool,                 // -q
}

impl Default for CliOptions {
    fn default() -> Self {
        CliOptions {
            mode: Mode::Emit,
            target: TargetSpec::default(),
            output: None,
            expr: None,
            input: None,
            verbose: 0,
            quiet: false,
        }
    }
}

fn print_usage() {
    println!("Clove Compiler v{}", VERSION);
    println!("Usage: clovec [options] <source_file.clj>");
    println!("       clovec [options] -e <form>");
    println!("");
    println!("Modes:");
    println!("  (default)             发射并打印指令清单");
    println!("  --eval                解释执行第一个 form");
    println!("  --run                 发射后执行");
    println!("");
    println!("Options:");
    println!("  --target=<name>       目标后端 (stack/compact/register，默认: stack)");
    println!("  -o <file>             把指令清单写到文件");
    println!("  -v, -vv               输出更多日志 (也可用 RUST_LOG)");
    println!("  -q                    只输出错误日志");
    println!("  --version             显示版本号");
    println!("  --help, -h            显示帮助信息");
}

fn parse_args(args: &[String]) -> Result<CliOptions> {
    let mut options = CliOptions::default();
    let mut i = 1;

    while i < args.len() {
        let arg = &args[i];

        match arg.as_str() {
            "--version" => {
                println!("Clove Compiler v{}", VERSION);
                process::exit(0);
            }
            "--help" | "-h" => {
                print_usage();
                process::exit(0);
            }
            "--eval" => options.mode = Mode::Eval,
            "--run" => options.mode = Mode::Run,
            "-v" => options.verbose = options.verbose.max(1),
            "-vv" => options.verbose = 2,
            "-q" => options.quiet = true,
            "-o" => {
                i += 1;
                let path = args.get(i).context("-o requires a file path")?;
                options.output = Some(path.clone());
            }
            "-e" => {
                i += 1;
                let form = args.get(i).context("-e requires a form")?;
                options.expr = Some(form.clone());
            }
            _ if arg.starts_with("--target=") => {
                let name = &arg["--target=".len()..];
                options.target = TargetSpec::named(name)
                    .with_context(|| format!("unknown target '{}'", name))?;
            }
            _ if arg.starts_with('-') => bail!("unknown option: {}", arg),
            _ => {
                if options.input.is_some() {
                    bail!("multiple input files given");
                }
                options.input = Some(arg.clone());
            }
        }
        i += 1;
    }

    if options.input.is_none() && options.expr.is_none() {
        bail!("no input file or -e form given");
    }

    Ok(options)
}

fn setup_logging(verbose: u8, quiet: bool) {
    use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

    let filter = if env::var_os("RUST_LOG").is_some() {
        EnvFilter::from_default_env()
    } else if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("warn"),
            1 => EnvFilter::new("debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    let formatter = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_level(true);

    tracing_subscriber::registry()
        .with(formatter)
        .with(filter)
        .init();
}

fn run(options: &CliOptions) -> Result<()> {
    let (name, source) = match (&options.expr, &options.input) {
        (Some(form), _) => ("repl".to_string(), form.clone()),
        (None, Some(path)) => {
            let source = fs::read_to_string(path)
                .with_context(|| format!("failed to read source file '{}'", path))?;
            let name = Path::new(path)
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or("main")
                .to_string();
            (name, source)
        }
        (None, None) => bail!("no input"),
    };
    let display_path = options.input.as_deref().unwrap_or("<expr>");

    let compiler = Compiler::with_target(options.target.clone());
    info!(unit = %name, target = %options.target.name, mode = ?options.mode, "clovec");

    let result = match options.mode {
        Mode::Eval => compiler.eval_string(&source).map(|v| println!("{}", v)),
        Mode::Emit | Mode::Run => compiler.compile_string(&name, &source).and_then(|compiled| {
            match &options.output {
                Some(out) => fs::write(out, compiled.to_string())
                    .map_err(|e| clove::error::CloveError::Io(format!("{}: {}", out, e)))?,
                None if options.mode == Mode::Emit => print!("{}", compiled),
                None => {}
            }
            if options.mode == Mode::Run {
                println!("{}", exec::run(&compiled)?);
            }
            Ok(())
        }),
    };

    if let Err(e) = result {
        print_error_with_context(&e, &source, display_path);
        process::exit(1);
    }
    Ok(())
}

fn main() {
    let args: Vec<String> = env::args().collect();

    let options = match parse_args(&args) {
        Ok(options) => options,
        Err(e) => {
            eprintln!("Error: {}", e);
            eprintln!("");
            print_usage();
            process::exit(1);
        }
    };

    setup_logging(options.verbose, options.quiet);

    if let Err(e) = run(&options) {
        eprintln!("Error: {:#}", e);
        process::exit(1);
    }
}
