use thiserror::Error;

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("rewrite request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("rewrite service returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed rewrite response: {message}; body: {body}")]
    MalformedResponse { message: String, body: String },
}
