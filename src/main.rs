use std::path::PathBuf;

#[derive(Debug, Default)]
struct CliArgs {
    add_folder: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    let args = parse_args(std::env::args().skip(1).collect())?;
    quaver::app::run_with_startup(quaver::app::AppStartupOptions {
        add_folder: args.add_folder,
    })
}

fn parse_args(args: Vec<String>) -> anyhow::Result<CliArgs> {
    let mut out = CliArgs::default();
    let mut index = 0;
    while index < args.len() {
        match args[index].as_str() {
            "--add" => {
                index += 1;
                let Some(value) = args.get(index) else {
                    anyhow::bail!("--add requires a folder path");
                };
                if value.trim().is_empty() {
                    anyhow::bail!("--add cannot be empty");
                }
                out.add_folder = Some(PathBuf::from(value.trim()));
            }
            "-h" | "--help" => {
                print_help();
                std::process::exit(0);
            }
            other => anyhow::bail!("unknown argument {other}"),
        }
        index += 1;
    }
    Ok(out)
}

fn print_help() {
    println!("Quaver");
    println!("  --add <path>    Add a music folder before starting");
}
