//! Normalized generation requests and the work-item parameter bags they
//! are built from.
//!
//! A work item carries a kind tag (`text2image`, `image2image`,
//! `text2video`) and a free-form JSON parameter bag. [`GenerationRequest::from_params`]
//! deserializes and validates the bag for the given kind.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Kind
// ---------------------------------------------------------------------------

/// The kind of artifact a work item asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GenerationKind {
    #[serde(rename = "text2image")]
    TextToImage,
    #[serde(rename = "image2image")]
    ImageToImage,
    #[serde(rename = "text2video")]
    TextToVideo,
}

impl GenerationKind {
    /// Wire tag used by the coordination layer.
    pub fn as_str(self) -> &'static str {
        match self {
            GenerationKind::TextToImage => "text2image",
            GenerationKind::ImageToImage => "image2image",
            GenerationKind::TextToVideo => "text2video",
        }
    }

    /// Whether the kind produces a video artifact.
    pub fn is_video(self) -> bool {
        matches!(self, GenerationKind::TextToVideo)
    }
}

impl fmt::Display for GenerationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GenerationKind {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "text2image" => Ok(GenerationKind::TextToImage),
            "image2image" => Ok(GenerationKind::ImageToImage),
            "text2video" => Ok(GenerationKind::TextToVideo),
            other => Err(CoreError::UnknownKind(other.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// Parameter bags
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, Validate)]
struct TextToImageParams {
    #[validate(length(min = 1, message = "prompt must not be empty"))]
    prompt: String,
}

#[derive(Debug, Deserialize, Validate)]
struct ImageToImageParams {
    #[validate(url(message = "image_url must be a valid URL"))]
    image_url: String,
    #[validate(length(min = 1, message = "prompt must not be empty"))]
    prompt: String,
}

#[derive(Debug, Deserialize, Validate)]
struct TextToVideoParams {
    #[validate(length(min = 1, message = "at least one reference image is required"))]
    images: Vec<String>,
    #[validate(length(min = 1, message = "prompt must not be empty"))]
    prompt: String,
    #[serde(default)]
    duration: Option<u32>,
}

fn parse_params<T>(params: &serde_json::Value) -> Result<T, CoreError>
where
    T: serde::de::DeserializeOwned + Validate,
{
    let parsed: T = serde_json::from_value(params.clone())
        .map_err(|e| CoreError::Validation(format!("Malformed parameters: {e}")))?;
    parsed.validate()?;
    Ok(parsed)
}

// ---------------------------------------------------------------------------
// GenerationRequest
// ---------------------------------------------------------------------------

/// A provider-neutral description of the artifact to generate.
///
/// Immutable once constructed. The requested video duration is kept as
/// received; each video provider normalizes it to what its API accepts.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind")]
pub enum GenerationRequest {
    #[serde(rename = "text2image")]
    TextToImage { prompt: String },

    #[serde(rename = "image2image")]
    ImageToImage { source_url: String, prompt: String },

    #[serde(rename = "text2video")]
    TextToVideo {
        prompt: String,
        reference_images: Vec<String>,
        duration_secs: Option<u32>,
    },
}

impl GenerationRequest {
    pub fn text_to_image(prompt: impl Into<String>) -> Self {
        GenerationRequest::TextToImage {
            prompt: prompt.into(),
        }
    }

    pub fn image_to_image(source_url: impl Into<String>, prompt: impl Into<String>) -> Self {
        GenerationRequest::ImageToImage {
            source_url: source_url.into(),
            prompt: prompt.into(),
        }
    }

    pub fn text_to_video(
        prompt: impl Into<String>,
        reference_images: Vec<String>,
        duration_secs: Option<u32>,
    ) -> Self {
        GenerationRequest::TextToVideo {
            prompt: prompt.into(),
            reference_images,
            duration_secs,
        }
    }

    /// Build a request from a work item's kind tag and parameter bag.
    pub fn from_params(kind: GenerationKind, params: &serde_json::Value) -> Result<Self, CoreError> {
        match kind {
            GenerationKind::TextToImage => {
                let p: TextToImageParams = parse_params(params)?;
                Ok(Self::text_to_image(p.prompt))
            }
            GenerationKind::ImageToImage => {
                let p: ImageToImageParams = parse_params(params)?;
                Ok(Self::image_to_image(p.image_url, p.prompt))
            }
            GenerationKind::TextToVideo => {
                let p: TextToVideoParams = parse_params(params)?;
                Ok(Self::text_to_video(p.prompt, p.images, p.duration))
            }
        }
    }

    pub fn kind(&self) -> GenerationKind {
        match self {
            GenerationRequest::TextToImage { .. } => GenerationKind::TextToImage,
            GenerationRequest::ImageToImage { .. } => GenerationKind::ImageToImage,
            GenerationRequest::TextToVideo { .. } => GenerationKind::TextToVideo,
        }
    }

    pub fn prompt(&self) -> &str {
        match self {
            GenerationRequest::TextToImage { prompt }
            | GenerationRequest::ImageToImage { prompt, .. }
            | GenerationRequest::TextToVideo { prompt, .. } => prompt,
        }
    }
}

/// Per-call context that travels alongside a request but does not shape
/// the provider payload.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestContext {
    /// Identifier of the artifact slot the coordination layer wants filled,
    /// when it supplies one.
    pub artifact_id: Option<String>,
}

impl RequestContext {
    pub fn with_artifact_id(artifact_id: impl Into<String>) -> Self {
        Self {
            artifact_id: Some(artifact_id.into()),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
