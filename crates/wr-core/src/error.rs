use thiserror::Error;

pub type WrResult<T> = Result<T, WrError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum WrError {
    #[error("Invalid argument: {what}")]
    InvalidArg { what: &'static str },

    #[error("Invalid range for {what}: [{start}, {end}]")]
    InvalidRange {
        what: &'static str,
        start: f64,
        end: f64,
    },
}
