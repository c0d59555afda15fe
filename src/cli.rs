use clap::Parser;

use crate::source::SourceMode;

#[derive(Parser, Debug)]
#[command(name = "respack")]
#[command(version)]
#[command(about = "Read files from directories, DAT archives, ZIP packs and asset bundles", long_about = None)]
#[command(after_help = "Examples:\n  \
  respack master.dat -l                 list files in master.dat\n  \
  respack data/critter -v --ext frm     list critter art, resolving critter.zip/.bos/.dat\n  \
  respack master.dat -p text/english/game/misc.msg   print one file\n  \
  respack patch.zip -d out -x '*.acm'   extract everything except sounds into out/")]
pub struct Cli {
    /// Directory, archive path, archive base name, or a magic name ($Embedded, $AndroidAssets)
    #[arg(value_name = "SOURCE")]
    pub source: String,

    /// Files to extract (default: all)
    #[arg(value_name = "FILES")]
    pub files: Vec<String>,

    /// List files (short format)
    #[arg(short = 'l')]
    pub list: bool,

    /// List verbosely with sizes and write times
    #[arg(short = 'v')]
    pub verbose: bool,

    /// Extract files to pipe, no messages
    #[arg(short = 'p')]
    pub pipe: bool,

    /// Extract files into exdir
    #[arg(short = 'd', value_name = "DIR")]
    pub extract_dir: Option<String>,

    /// Exclude files that follow
    #[arg(short = 'x', value_name = "FILE", num_args = 1..)]
    pub exclude: Vec<String>,

    /// Never overwrite existing files
    #[arg(short = 'n')]
    pub never_overwrite: bool,

    /// Overwrite files WITHOUT prompting
    #[arg(short = 'o')]
    pub overwrite: bool,

    /// Junk paths (do not make directories)
    #[arg(short = 'j')]
    pub junk_paths: bool,

    /// Only consider files under this directory prefix
    #[arg(long, value_name = "DIR", default_value = "")]
    pub prefix: String,

    /// Only consider files with this (lower-case) extension
    #[arg(long, value_name = "EXT", default_value = "")]
    pub ext: String,

    /// Skip files in subdirectories of the prefix
    #[arg(long)]
    pub no_subdirs: bool,

    /// Index only the top level of a directory source
    #[arg(long, conflicts_with = "live")]
    pub dir_root: bool,

    /// Read a directory source from disk on every access
    #[arg(long)]
    pub live: bool,

    /// Quiet mode (-qq => quieter)
    #[arg(short = 'q', action = clap::ArgAction::Count)]
    pub quiet: u8,
}

impl Cli {
    pub fn mode(&self) -> SourceMode {
        if self.dir_root {
            SourceMode::DirRoot
        } else if self.live {
            SourceMode::LiveDir
        } else {
            SourceMode::Default
        }
    }

    pub fn is_quiet(&self) -> bool {
        self.quiet > 0 || self.pipe
    }

    pub fn is_very_quiet(&self) -> bool {
        self.quiet > 1
    }

    /// Default log filter when `RUST_LOG` is not set.
    pub fn log_level(&self) -> log::LevelFilter {
        if self.is_very_quiet() {
            log::LevelFilter::Error
        } else if self.is_quiet() {
            log::LevelFilter::Warn
        } else {
            log::LevelFilter::Info
        }
    }
}
