use crate::format::{FormatResolver, PixelFormat};
use crate::foundation::error::{VcrtcError, VcrtcResult};

/// Options controlling how an [`Output`](crate::Output) composes.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ComposerOpts {
    /// Codec used for fourccs without one. `None` makes them an activation error.
    pub fallback_format: Option<PixelFormat>,
    /// Name of the composer worker thread.
    pub worker_name: String,
}

impl Default for ComposerOpts {
    fn default() -> Self {
        Self {
            fallback_format: Some(PixelFormat::Xrgb8888),
            worker_name: "vcrtc-composer".to_owned(),
        }
    }
}

impl ComposerOpts {
    /// Parse options from JSON; missing fields keep their defaults.
    pub fn from_json_str(s: &str) -> VcrtcResult<Self> {
        serde_json::from_str(s).map_err(|e| VcrtcError::serde(format!("composer options: {e}")))
    }

    /// Replace the fallback codec.
    pub fn with_fallback_format(mut self, fallback: Option<PixelFormat>) -> Self {
        self.fallback_format = fallback;
        self
    }

    /// Replace the worker thread name.
    pub fn with_worker_name(mut self, name: impl Into<String>) -> Self {
        self.worker_name = name.into();
        self
    }

    pub(crate) fn resolver(&self) -> FormatResolver {
        FormatResolver::new(self.fallback_format)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/schedule/opts.rs"]
mod tests;
