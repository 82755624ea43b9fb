use std::path::PathBuf;

/// Grammar failure inside a target expression cell.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TargetParseError {
    #[error("empty target expression")]
    Empty,

    #[error("range target `{text}` must have exactly two bounds")]
    RangeArity { text: String },

    #[error("range target `{text}` has a non-integer bound `{bound}`")]
    RangeBoundNotInteger { text: String, bound: String },

    #[error("range target `{text}` has lower bound {lo} above upper bound {hi}")]
    RangeInverted { text: String, lo: i64, hi: i64 },
}

/// Grammar failure inside a dependency expression cell.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DependencyParseError {
    #[error("dependency term `{term}` is not of the form Type[=instance].parameter[.op]")]
    MalformedTerm { term: String },

    #[error("dependency term `{term}` uses unknown arithmetic operator `{op}`")]
    UnknownOperator { term: String, op: String },

    #[error("band dependency map `{text}` has no `term:[bands]` entries")]
    EmptyBandMap { text: String },
}

/// Fatal configuration problems. The run aborts and names the offending rule.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("reference file {path} is neither a CSV table nor a spreadsheet")]
    NotATable { path: PathBuf },

    #[error("failed to read spreadsheet {path}: {message}")]
    Spreadsheet { path: PathBuf, message: String },

    #[error("failed to parse CSV {path}: {message}")]
    Csv { path: PathBuf, message: String },

    #[error("reference is missing mandatory column(s): {columns}")]
    MissingColumns { columns: String },

    #[error("invalid configuration file {path}: {message}")]
    InvalidConfig { path: PathBuf, message: String },

    #[error("rule {subject}.{parameter}: {source}")]
    Target {
        subject: String,
        parameter: String,
        #[source]
        source: TargetParseError,
    },

    #[error("rule {subject}.{parameter}: {source}")]
    Dependency {
        subject: String,
        parameter: String,
        #[source]
        source: DependencyParseError,
    },

    #[error("rule {subject}.{parameter} declares more than one target for band {band}")]
    DuplicateRule {
        subject: String,
        parameter: String,
        band: String,
    },

    #[error("rule {subject}.{parameter}: target `{target}` needs a dependency to select from")]
    TargetWithoutDependency {
        subject: String,
        parameter: String,
        target: String,
    },
}

impl ConfigError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
