// build.rs

use clap::{Arg, ArgAction, Command};
use clap_mangen::Man;
use std::env;
use std::fs;
use std::path::PathBuf;

fn name_arg() -> Arg {
    Arg::new("name").required(true).help("Source package name")
}

fn build_cli() -> Command {
    Command::new("respin")
        .version(env!("CARGO_PKG_VERSION"))
        .author("Respin Contributors")
        .about("Tracks build dependency changes of distribution packages")
        .subcommand_required(false)
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("PATH")
                .global(true)
                .help("Configuration file (default: /etc/respin/respin.toml if present)"),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .action(ArgAction::SetTrue)
                .global(true)
                .help("Enable debug logging"),
        )
        .subcommand(Command::new("init").about("Initialize the respin database"))
        .subcommand(
            Command::new("run").about("Process pending builds and repo generation requests once"),
        )
        .subcommand(Command::new("daemon").about("Run periodically until interrupted"))
        .subcommand(
            Command::new("request-repo")
                .about("Request resolution of a repo snapshot")
                .arg(Arg::new("repo_id").required(true).help("Repo snapshot ID")),
        )
        .subcommand(
            Command::new("add-package")
                .about("Start tracking a package")
                .arg(name_arg())
                .arg(
                    Arg::new("priority")
                        .long("priority")
                        .default_value("0")
                        .help("Static priority"),
                ),
        )
        .subcommand(
            Command::new("add-build")
                .about("Record a finished build of a tracked package")
                .arg(name_arg())
                .arg(
                    Arg::new("repo_id")
                        .long("repo-id")
                        .required(true)
                        .help("Repo snapshot the build ran against"),
                )
                .arg(Arg::new("version").long("version").help("Version of the built source package"))
                .arg(Arg::new("release").long("release").help("Release of the built source package"))
                .arg(Arg::new("epoch").long("epoch"))
                .arg(
                    Arg::new("failed")
                        .long("failed")
                        .action(ArgAction::SetTrue)
                        .help("Build failed"),
                ),
        )
        .subcommand(
            Command::new("ignore")
                .about("Exclude a package from resolution")
                .arg(name_arg())
                .arg(
                    Arg::new("undo")
                        .long("undo")
                        .action(ArgAction::SetTrue)
                        .help("Include the package again"),
                ),
        )
        .subcommand(
            Command::new("status")
                .about("Show resolution state, problems and pending dependency changes")
                .arg(name_arg()),
        )
}

fn main() {
    println!("cargo:rerun-if-changed=build.rs");

    let manifest_dir = match env::var("CARGO_MANIFEST_DIR") {
        Ok(dir) => PathBuf::from(dir),
        Err(e) => {
            println!("cargo:warning=CARGO_MANIFEST_DIR not set: {}", e);
            return;
        }
    };
    let man_dir = manifest_dir.join("man");

    if let Err(e) = fs::create_dir_all(&man_dir) {
        println!("cargo:warning=Failed to create man directory: {}", e);
        return;
    }

    let man = Man::new(build_cli());
    let mut buffer = Vec::new();

    if let Err(e) = man.render(&mut buffer) {
        println!("cargo:warning=Failed to render man page: {}", e);
        return;
    }

    let man_path = man_dir.join("respin.1");
    if let Err(e) = fs::write(&man_path, buffer) {
        println!("cargo:warning=Failed to write man page: {}", e);
    }
}
