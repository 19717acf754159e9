use std::time::Duration;

use thiserror::Error;

use crate::shared::constants::{
    LOGIN_ENDPOINT, LOGIN_UPLOAD_TIMEOUT, REGISTER_ENDPOINT, REGISTER_UPLOAD_TIMEOUT,
};

/// Encoded bytes ready for a single upload.
#[derive(Clone, Debug, PartialEq)]
pub enum UploadPayload {
    /// One JPEG, sent to the login endpoint.
    Login { jpeg: Vec<u8> },
    /// A zip of face crops plus the account they belong to.
    Enrollment { username: String, archive: Vec<u8> },
}

impl UploadPayload {
    pub fn endpoint(&self) -> &'static str {
        match self {
            UploadPayload::Login { .. } => LOGIN_ENDPOINT,
            UploadPayload::Enrollment { .. } => REGISTER_ENDPOINT,
        }
    }

    pub fn timeout(&self) -> Duration {
        match self {
            UploadPayload::Login { .. } => LOGIN_UPLOAD_TIMEOUT,
            UploadPayload::Enrollment { .. } => REGISTER_UPLOAD_TIMEOUT,
        }
    }
}

/// What the server confirmed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ServerAck {
    /// Login matched this username.
    Identity(String),
    /// Enrollment accepted; carries the confirmation shown to the user.
    Enrolled(String),
}

#[derive(Error, Debug)]
pub enum UploadError {
    #[error("failed to encode upload: {0}")]
    Encode(String),
    /// Server answered but did not accept. Carries its message verbatim.
    #[error("{0}")]
    ServerRejection(String),
    /// `detail` carries the innermost cause, e.g. "Connection refused".
    #[error("Connection error: {detail}")]
    Transport {
        detail: String,
        #[source]
        source: reqwest::Error,
    },
}

impl UploadError {
    pub fn transport(source: reqwest::Error) -> Self {
        Self::Transport {
            detail: with_root_cause(&source),
            source,
        }
    }
}

/// `err` followed by the last error in its source chain, when they differ.
fn with_root_cause(err: &(dyn std::error::Error + 'static)) -> String {
    let top = err.to_string();
    let Some(mut root) = err.source() else {
        return top;
    };
    while let Some(next) = root.source() {
        root = next;
    }
    let cause = root.to_string();
    if top.contains(&cause) {
        top
    } else {
        format!("{top}: {cause}")
    }
}
