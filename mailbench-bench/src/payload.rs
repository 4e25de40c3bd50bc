use clap::ValueEnum;
use mailbench_common::MAX_BODY_SIZE;
use thiserror::Error;

/// How the `<body>` argument is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum BodyMode {
    /// The argument is a byte count; the body is that many zero bytes.
    #[default]
    Size,
    /// The argument is sent verbatim.
    Literal,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PayloadError {
    #[error("Body size must be a non-negative integer, got {0:?}")]
    InvalidSize(String),

    #[error("Body of {0} bytes exceeds maximum size of {1} bytes")]
    TooLarge(usize, usize),
}

/// Build the message body from the CLI argument.
pub fn build_body(arg: &str, mode: BodyMode) -> Result<Vec<u8>, PayloadError> {
    let body = match mode {
        BodyMode::Size => {
            let size: usize = arg
                .trim()
                .parse()
                .map_err(|_| PayloadError::InvalidSize(arg.to_string()))?;
            if size > MAX_BODY_SIZE {
                return Err(PayloadError::TooLarge(size, MAX_BODY_SIZE));
            }
            vec![0u8; size]
        }
        BodyMode::Literal => arg.as_bytes().to_vec(),
    };

    if body.len() > MAX_BODY_SIZE {
        return Err(PayloadError::TooLarge(body.len(), MAX_BODY_SIZE));
    }
    Ok(body)
}
