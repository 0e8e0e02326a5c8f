use anyhow::Result;
use clap::{Arg, ArgAction, ArgGroup, ArgMatches, Command, value_parser};
use log::LevelFilter;

mod cmd;
mod config;

use crate::config::StaticaConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    Serve,
    Build,
    Clean,
    Watch,
}

impl Action {
    fn from_args(args: &ArgMatches) -> Self {
        if args.get_flag("server") {
            Action::Serve
        } else if args.get_flag("build") {
            Action::Build
        } else if args.get_flag("clean") {
            Action::Clean
        } else {
            // Also the default when no action flag is given
            Action::Watch
        }
    }
}

pub(crate) fn cli() -> Command {
    Command::new("statica")
        .about("Build a sectioned static site from markdown, and rebuild it while you write")
        .version(env!("CARGO_PKG_VERSION"))
        .arg(
            Arg::new("domain")
                .short('d')
                .long("domain")
                .value_name("DIR")
                .help("Site directory holding .env / statica.toml, also the sitemap host"),
        )
        .arg(
            Arg::new("server")
                .short('s')
                .long("server")
                .help("Serve the output directory")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("build")
                .short('b')
                .long("build")
                .help("Build the site once")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("clean")
                .short('c')
                .long("clean")
                .help("Empty the output directory and copy assets")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("watch")
                .short('w')
                .long("watch")
                .help("Build, then rebuild on every change (default)")
                .action(ArgAction::SetTrue),
        )
        .group(
            ArgGroup::new("action")
                .args(["server", "build", "clean", "watch"])
                .multiple(false),
        )
        .arg(
            Arg::new("output")
                .short('o')
                .long("output")
                .value_name("DIR")
                .help("Output directory for generated site"),
        )
        .arg(
            Arg::new("host")
                .long("host")
                .value_name("HOST")
                .help("Host to bind the preview server to"),
        )
        .arg(
            Arg::new("port")
                .short('p')
                .long("port")
                .value_name("PORT")
                .help("Port to serve on")
                .value_parser(value_parser!(u16)),
        )
        .arg(
            Arg::new("open")
                .long("open")
                .help("Open browser automatically")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Log debug output")
                .action(ArgAction::SetTrue),
        )
}

fn init_logging(verbose: bool) {
    let level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();
}

fn main() -> Result<()> {
    let matches = cli().get_matches();
    init_logging(matches.get_flag("verbose"));

    let config = StaticaConfig::load(&matches)?;

    match Action::from_args(&matches) {
        Action::Serve => cmd::serve::execute(&config),
        Action::Build => cmd::build::execute(&config),
        Action::Clean => cmd::clean::execute(&config),
        Action::Watch => cmd::watch::execute(&config),
    }
}
