#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::struct_excessive_bools)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::doc_markdown)]

mod commands;
mod logging;

use clap::Parser;
use migrator_core::config::{DEFAULT_ADDON_LOCATION, DEFAULT_TEST_APP_NAME};
use migrator_core::{Config, Policy, TransformOptions};
use miette::Result;
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(name = "addon-migrator")]
#[command(author, version, about = "Extract an addon's tests into a companion test app", long_about = None)]
struct Cli {
    /// Increase logging verbosity (-v for DEBUG, -vv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Emit JSON formatted output (stable, machine-readable)
    #[arg(long, global = true)]
    json: bool,

    /// Override the working directory
    #[arg(long, global = true, value_name = "PATH")]
    cwd: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Print version information
    Version,

    /// Print the analysis of a package without changing anything
    Analyze {
        /// Package root (relative to --cwd)
        #[arg(short, long, value_name = "PATH")]
        directory: Option<PathBuf>,
    },

    /// Move an addon's tests into a separate test app
    ExtractTests {
        /// Package root (relative to --cwd)
        #[arg(short, long, value_name = "PATH")]
        directory: Option<PathBuf>,

        /// Move the library into --addon-location next to the test app (default)
        #[arg(long, overrides_with = "no_in_place")]
        in_place: bool,

        /// Leave the library where it is and put the test app beside it
        #[arg(long, overrides_with = "in_place")]
        no_in_place: bool,

        /// Where the library goes when converting in place
        #[arg(long, default_value = DEFAULT_ADDON_LOCATION, value_name = "PATH")]
        addon_location: PathBuf,

        /// Where the test app goes [default: test-app, or ../test-app with --no-in-place]
        #[arg(long, value_name = "PATH")]
        test_app_location: Option<PathBuf>,

        /// Package name of the test app
        #[arg(long, default_value = DEFAULT_TEST_APP_NAME)]
        test_app_name: String,

        /// Stop after analysis
        #[arg(long)]
        analysis_only: bool,

        /// Keep the addon's versions for dependencies both packages declare
        #[arg(long)]
        reuse_existing_versions: bool,

        /// Drop test-app dependencies the addon does not declare
        #[arg(long)]
        ignore_new_dependencies: bool,
    },

    /// Turn a standalone package into a workspace with it as the only member
    MakeMonorepo {
        /// Package root (relative to --cwd)
        #[arg(short, long, value_name = "PATH")]
        directory: Option<PathBuf>,

        /// Where the package goes inside the new workspace
        #[arg(long, default_value = DEFAULT_ADDON_LOCATION, value_name = "PATH")]
        addon_location: PathBuf,
    },

    /// Discard every change in the working tree (git clean + checkout)
    Reset {
        /// Repository directory (relative to --cwd)
        #[arg(short, long, value_name = "PATH")]
        directory: Option<PathBuf>,
    },
}

/// `--directory` resolved against the configured working directory.
fn target_dir(cwd: &Path, directory: Option<&PathBuf>) -> PathBuf {
    directory.map_or_else(|| cwd.to_path_buf(), |dir| cwd.join(dir))
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Determine working directory
    let cwd = cli
        .cwd
        .or_else(|| std::env::current_dir().ok())
        .unwrap_or_else(|| PathBuf::from("."));

    let config = Config::new(cwd)
        .with_verbosity(cli.verbose)
        .with_json_logs(cli.json);

    if matches!(cli.command, Some(Commands::Version) | None) {
        return commands::version::run();
    }

    logging::init(config.verbosity, config.json_logs);

    if let Some(Commands::Analyze { directory }) = &cli.command {
        return commands::analyze::run(&target_dir(&config.cwd, directory.as_ref()), cli.json);
    }

    if let Some(Commands::ExtractTests {
        directory,
        in_place: _,
        no_in_place,
        addon_location,
        test_app_location,
        test_app_name,
        analysis_only,
        reuse_existing_versions,
        ignore_new_dependencies,
    }) = &cli.command
    {
        let options = TransformOptions::new(target_dir(&config.cwd, directory.as_ref()))
            .with_in_place(!*no_in_place)
            .with_addon_location(addon_location.clone())
            .with_test_app_location(test_app_location.clone())
            .with_test_app_name(test_app_name.clone())
            .with_analysis_only(*analysis_only)
            .with_policy(Policy {
                reuse_existing_versions: *reuse_existing_versions,
                ignore_new_dependencies: *ignore_new_dependencies,
            });
        return commands::extract_tests::run(options, cli.json);
    }

    if let Some(Commands::MakeMonorepo {
        directory,
        addon_location,
    }) = &cli.command
    {
        let options = TransformOptions::new(target_dir(&config.cwd, directory.as_ref()))
            .with_addon_location(addon_location.clone());
        return commands::make_monorepo::run(options, cli.json);
    }

    if let Some(Commands::Reset { directory }) = &cli.command {
        return commands::reset::run(&target_dir(&config.cwd, directory.as_ref()), cli.json);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_extract_tests_defaults() {
        let cli = Cli::try_parse_from(["addon-migrator", "extract-tests"]).unwrap();
        match cli.command {
            Some(Commands::ExtractTests {
                no_in_place,
                addon_location,
                test_app_location,
                test_app_name,
                ..
            }) => {
                assert!(!no_in_place);
                assert_eq!(addon_location, PathBuf::from("package"));
                assert!(test_app_location.is_none());
                assert_eq!(test_app_name, "test-app");
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_last_in_place_flag_wins() {
        let cli =
            Cli::try_parse_from(["addon-migrator", "extract-tests", "--no-in-place", "--in-place"])
                .unwrap();
        assert!(matches!(
            cli.command,
            Some(Commands::ExtractTests { no_in_place: false, .. })
        ));
    }

    #[test]
    fn test_target_dir_is_relative_to_cwd() {
        let cwd = Path::new("/work");
        assert_eq!(target_dir(cwd, None), PathBuf::from("/work"));
        assert_eq!(
            target_dir(cwd, Some(&PathBuf::from("my-addon"))),
            PathBuf::from("/work/my-addon")
        );
        assert_eq!(
            target_dir(cwd, Some(&PathBuf::from("/elsewhere"))),
            PathBuf::from("/elsewhere")
        );
    }
}
