// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ControllerError {
    #[error("Kubernetes API error: {0}")]
    KubeError(#[from] kube::Error),

    #[error("Invalid annotation {annotation}: {reason}")]
    InvalidAnnotation { annotation: String, reason: String },

    #[error("wrong format for dns record [{0}]")]
    InvalidTargetReference(String),

    #[error("Failed to fetch endpoints for DNSRecord service [{name}] in namespace [{namespace}]: {source}")]
    EndpointLookup {
        namespace: String,
        name: String,
        #[source]
        source: Box<ControllerError>,
    },

    #[error("Failed to update endpoint for DNSRecord service [{name}]: {source}")]
    EndpointUpdate {
        name: String,
        #[source]
        source: Box<ControllerError>,
    },

    #[error("Read cache unavailable: {0}")]
    CacheUnavailable(String),

    #[error("Apply failed: {0}")]
    ApplyError(String),

    #[error("Handler failed: {0}")]
    Handler(String),
}

impl ControllerError {
    fn api_code(&self) -> Option<u16> {
        match self {
            ControllerError::KubeError(kube::Error::Api(err)) => Some(err.code),
            ControllerError::EndpointLookup { source, .. }
            | ControllerError::EndpointUpdate { source, .. } => source.api_code(),
            _ => None,
        }
    }

    /// True when the API server answered 404.
    pub fn is_not_found(&self) -> bool {
        self.api_code() == Some(404)
    }

    /// True when a write lost an optimistic-concurrency race (409).
    pub fn is_conflict(&self) -> bool {
        self.api_code() == Some(409)
    }
}

pub type Result<T> = std::result::Result<T, ControllerError>;
