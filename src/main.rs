use anyhow::Result;
use clap::Parser;
use lpkg::application::{InstallOptions, MakeOptions, Selection};
use lpkg::commands::{self, config::ConfigOverrides};
use std::path::PathBuf;

/// lpkg - local Composer package manager
///
/// Create packages next to a Composer project, wire them in through path
/// repositories and keep `require` / `require-dev` in sync.
///
/// Examples:
///   lpkg make acme/widget --install   # Create and install a package
///   lpkg list                         # Show local packages
#[derive(Parser, Debug)]
#[command(author, version = env!("LPKG_VERSION"), about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Project directory containing composer.json (defaults to the nearest one)
    #[arg(long, env = "LPKG_PROJECT_ROOT", value_name = "PATH", global = true)]
    project_root: Option<PathBuf>,

    /// Packages directory relative to the project (defaults to "packages")
    #[arg(long, env = "LPKG_PACKAGES_PATH", value_name = "PATH", global = true)]
    packages_path: Option<String>,

    /// Default branch for new packages and constraints (defaults to "dev-main")
    #[arg(long, env = "LPKG_DEFAULT_BRANCH", value_name = "BRANCH", global = true)]
    default_branch: Option<String>,

    /// Composer executable
    #[arg(long, env = "LPKG_COMPOSER", value_name = "PROGRAM", global = true)]
    composer: Option<String>,

    /// Git executable
    #[arg(long, env = "LPKG_GIT", value_name = "PROGRAM", global = true)]
    git: Option<String>,
}

impl Cli {
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            project_root: self.project_root.clone(),
            packages_path: self.packages_path.clone(),
            default_branch: self.default_branch.clone(),
            composer: self.composer.clone(),
            git: self.git.clone(),
        }
    }
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Create a new local package
    Make(MakeArgs),

    /// Require local packages and link them into vendor
    Install(InstallArgs),

    /// Drop and re-add the requirement, link and repository entry
    Reinstall(InstallArgs),

    /// Drop the requirement and link; keep the package
    Uninstall(TargetArgs),

    /// Remove packages from the project and delete their directories
    #[command(alias = "delete")]
    Remove(RemoveArgs),

    /// Remove packages and create them again
    Remake(RemakeArgs),

    /// List local packages
    List,
}

#[derive(clap::Args, Debug)]
struct TargetArgs {
    /// Packages in the format "vendor/name"
    #[arg(value_name = "VENDOR/NAME", required_unless_present = "all")]
    packages: Vec<String>,

    /// Act on all local packages
    #[arg(long, conflicts_with = "packages")]
    all: bool,
}

impl TargetArgs {
    fn selection(&self) -> Selection {
        if self.all {
            Selection::All
        } else {
            Selection::Named(self.packages.clone())
        }
    }
}

#[derive(clap::Args, Debug)]
struct BranchArgs {
    /// Branch, with or without the "dev-" prefix
    #[arg(long, short = 'b')]
    branch: Option<String>,
}

#[derive(clap::Args, Debug)]
struct MakeArgs {
    /// The package in the format "vendor/name"
    #[arg(value_name = "VENDOR/NAME")]
    package: String,

    #[command(flatten)]
    branch: BranchArgs,

    /// Install the package after creating it
    #[arg(long, short = 'i')]
    install: bool,

    /// Require as a development dependency
    #[arg(long, short = 'D')]
    dev: bool,
}

#[derive(clap::Args, Debug)]
struct InstallArgs {
    #[command(flatten)]
    targets: TargetArgs,

    #[command(flatten)]
    branch: BranchArgs,

    /// Require as a development dependency
    #[arg(long, short = 'D')]
    dev: bool,
}

#[derive(clap::Args, Debug)]
struct RemoveArgs {
    #[command(flatten)]
    targets: TargetArgs,

    /// Keep the package directory
    #[arg(long)]
    keep_dir: bool,
}

#[derive(clap::Args, Debug)]
struct RemakeArgs {
    #[command(flatten)]
    targets: TargetArgs,

    #[command(flatten)]
    branch: BranchArgs,

    /// Install the packages after creating them
    #[arg(long, short = 'i')]
    install: bool,

    /// Require as a development dependency
    #[arg(long, short = 'D')]
    dev: bool,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();
    let runtime = lpkg::runtime::RealRuntime;
    let runner = lpkg::tool::ProcessRunner;
    let overrides = cli.overrides();

    match cli.command {
        Commands::Make(args) => commands::make(
            &runtime,
            &runner,
            overrides,
            &args.package,
            MakeOptions {
                branch: args.branch.branch,
                install: args.install,
                dev: args.dev,
            },
        )?,
        Commands::Install(args) => commands::install(
            &runtime,
            &runner,
            overrides,
            args.targets.selection(),
            InstallOptions {
                dev: args.dev,
                branch: args.branch.branch,
            },
        )?,
        Commands::Reinstall(args) => commands::reinstall(
            &runtime,
            &runner,
            overrides,
            args.targets.selection(),
            InstallOptions {
                dev: args.dev,
                branch: args.branch.branch,
            },
        )?,
        Commands::Uninstall(args) => {
            commands::uninstall(&runtime, &runner, overrides, args.selection())?
        }
        Commands::Remove(args) => commands::remove(
            &runtime,
            &runner,
            overrides,
            args.targets.selection(),
            args.keep_dir,
        )?,
        Commands::Remake(args) => commands::remake(
            &runtime,
            &runner,
            overrides,
            args.targets.selection(),
            MakeOptions {
                branch: args.branch.branch,
                install: args.install,
                dev: args.dev,
            },
        )?,
        Commands::List => commands::list(&runtime, &runner, overrides)?,
    }
    Ok(())
}
