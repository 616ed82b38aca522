use clap::{ArgAction, Parser, ValueHint};

#[derive(Parser)]
#[command(
    author,
    version,
    about,
    help_template = "{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}",
    arg_required_else_help = true
)]
pub struct Args {
    /// Packages to synchronise, optionally with version constraints (e.g. `foo>=1.0,<2`)
    pub specifiers: Vec<String>,

    /// Synchronise every package listed on the source repository
    #[arg(short, long)]
    pub all_packages: bool,

    /// Do not synchronise releases matching this specifier
    #[arg(short, long, action = ArgAction::Append)]
    pub exclude: Vec<String>,

    /// Read `name = version` pins from a buildout-style versions file (path or URL)
    #[arg(long, value_hint = ValueHint::AnyPath)]
    pub versions_file: Option<String>,

    /// Only synchronise the newest matching release of each package
    #[arg(long)]
    pub latest: bool,

    /// The source repository, where packages are fetched from
    #[arg(long, value_hint = ValueHint::Url)]
    pub source_url: Option<String>,

    /// Username for the source repository
    #[arg(long)]
    pub source_username: Option<String>,

    /// Password for the source repository. Prompted for when a username is given without one
    #[arg(long)]
    pub source_password: Option<String>,

    /// The destination repository, where packages are uploaded to
    #[arg(long, value_hint = ValueHint::Url)]
    pub destination_url: Option<String>,

    /// Username for the destination repository
    #[arg(long)]
    pub destination_username: Option<String>,

    /// Password for the destination repository. Prompted for when a username is given
    /// without one
    #[arg(long)]
    pub destination_password: Option<String>,

    /// Directory for downloaded distributions
    #[arg(long, value_hint = ValueHint::DirPath)]
    pub tmp_dir: Option<String>,

    /// Network timeout (e.g. `30s`, `2m`)
    #[arg(long)]
    pub timeout: Option<String>,

    /// Provide custom config file
    #[arg(short, long, value_hint = ValueHint::FilePath)]
    pub config: Option<String>,

    /// Set output verbosity
    #[arg(short = 'v', long, action = ArgAction::Count)]
    pub verbose: u8,

    /// Suppress outputs
    #[arg(short, long)]
    pub quiet: bool,

    /// Output logs as json
    #[arg(short, long)]
    pub json: bool,

    /// Disable colors in output
    #[arg(long)]
    pub no_color: bool,

    /// Set request headers
    #[arg(required = false, long, short = 'H')]
    pub header: Option<Vec<String>>,

    /// Set user agent
    #[arg(required = false, long, short = 'A')]
    pub user_agent: Option<String>,
}

impl Args {
    /// How many of the three package selection modes were asked for.
    pub fn selection_modes(&self) -> Vec<&'static str> {
        let mut modes = Vec::new();
        if !self.specifiers.is_empty() {
            modes.push("package specifiers");
        }
        if self.all_packages {
            modes.push("--all-packages");
        }
        if self.versions_file.is_some() {
            modes.push("--versions-file");
        }
        modes
    }
}
