//! The bundled table of ComfyUI stock node classes, used to classify a
//! node's `type` as builtin vs. custom and, for builtin loaders, which
//! widget indices carry a model path and what category that path belongs to.

/// One model-bearing widget on a builtin loader node.
#[derive(Debug, Clone, Copy)]
pub struct LoaderWidget {
    pub widget_index: usize,
    pub category: &'static str,
}

/// `(node type, widgets carrying a model path)`.
const BUILTIN_LOADERS: &[(&str, &[LoaderWidget])] = &[
    ("CheckpointLoaderSimple", &[LoaderWidget { widget_index: 0, category: "checkpoints" }]),
    ("CheckpointLoader", &[LoaderWidget { widget_index: 1, category: "checkpoints" }]),
    ("ImageOnlyCheckpointLoader", &[LoaderWidget { widget_index: 0, category: "checkpoints" }]),
    ("LoraLoader", &[LoaderWidget { widget_index: 0, category: "loras" }]),
    ("LoraLoaderModelOnly", &[LoaderWidget { widget_index: 0, category: "loras" }]),
    ("VAELoader", &[LoaderWidget { widget_index: 0, category: "vae" }]),
    ("CLIPLoader", &[LoaderWidget { widget_index: 0, category: "clip" }]),
    (
        "DualCLIPLoader",
        &[
            LoaderWidget { widget_index: 0, category: "clip" },
            LoaderWidget { widget_index: 1, category: "clip" },
        ],
    ),
    ("CLIPVisionLoader", &[LoaderWidget { widget_index: 0, category: "clip_vision" }]),
    ("ControlNetLoader", &[LoaderWidget { widget_index: 0, category: "controlnet" }]),
    ("DiffControlNetLoader", &[LoaderWidget { widget_index: 0, category: "controlnet" }]),
    ("UpscaleModelLoader", &[LoaderWidget { widget_index: 0, category: "upscale_models" }]),
    ("UNETLoader", &[LoaderWidget { widget_index: 0, category: "diffusion_models" }]),
    ("StyleModelLoader", &[LoaderWidget { widget_index: 0, category: "style_models" }]),
    ("GLIGENLoader", &[LoaderWidget { widget_index: 0, category: "gligen" }]),
    ("HypernetworkLoader", &[LoaderWidget { widget_index: 0, category: "hypernetworks" }]),
    ("PhotoMakerLoader", &[LoaderWidget { widget_index: 0, category: "photomaker" }]),
    ("DiffusersLoader", &[LoaderWidget { widget_index: 0, category: "diffusers" }]),
];

/// Additional stock node classes that are builtin but carry no model path,
/// so they are still excluded from custom-node resolution.
const BUILTIN_NON_LOADERS: &[&str] = &[
    "KSampler",
    "KSamplerAdvanced",
    "CLIPTextEncode",
    "VAEDecode",
    "VAEEncode",
    "VAEEncodeForInpaint",
    "EmptyLatentImage",
    "LatentUpscale",
    "LatentUpscaleBy",
    "LatentFromBatch",
    "SaveImage",
    "PreviewImage",
    "LoadImage",
    "LoadImageMask",
    "ImageScale",
    "ImageInvert",
    "ConditioningCombine",
    "ConditioningConcat",
    "ConditioningSetArea",
    "ConditioningZeroOut",
    "ControlNetApply",
    "ControlNetApplyAdvanced",
    "Note",
    "Reroute",
    "PrimitiveNode",
];

pub fn loader_widgets(node_type: &str) -> Option<&'static [LoaderWidget]> {
    BUILTIN_LOADERS
        .iter()
        .find(|(name, _)| *name == node_type)
        .map(|(_, widgets)| *widgets)
}

pub fn is_builtin(node_type: &str) -> bool {
    loader_widgets(node_type).is_some() || BUILTIN_NON_LOADERS.contains(&node_type)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn checkpoint_loader_simple_maps_widget_zero() {
        let widgets = loader_widgets("CheckpointLoaderSimple").unwrap();
        assert_eq!(widgets.len(), 1);
        assert_eq!(widgets[0].category, "checkpoints");
    }

    #[test]
    fn unknown_type_is_custom() {
        assert!(!is_builtin("ComfyUI_IPAdapter_plus_IPAdapterApply"));
    }
}
