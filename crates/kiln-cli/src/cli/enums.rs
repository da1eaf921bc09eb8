use clap::ValueEnum;
use kiln_config::BuildMode;

/// Build mode as accepted on the command line.
#[derive(Copy, Clone, PartialEq, Eq, Debug, ValueEnum)]
pub enum ModeArg {
    /// Unoptimized output served by the dev server
    #[value(name = "development", alias = "dev")]
    Development,

    /// Optimized output written to the production directory
    #[value(name = "production", alias = "prod")]
    Production,
}

impl From<ModeArg> for BuildMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Development => BuildMode::Development,
            ModeArg::Production => BuildMode::Production,
        }
    }
}
