use polars::prelude::PolarsError;

#[derive(Debug, thiserror::Error)]
pub enum AuditError {
    #[error(
        "rule {subject}.{parameter}: cannot apply `{op}` to value `{value}` and dependency value `{dependency}`"
    )]
    NonNumericOperand {
        subject: String,
        parameter: String,
        op: String,
        value: String,
        dependency: String,
    },

    #[error(transparent)]
    Frame(#[from] PolarsError),
}
