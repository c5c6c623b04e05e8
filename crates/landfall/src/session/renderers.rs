use tracing::debug;

/// Layer names known to the renderer.
pub mod layers {
    pub const GRID: &str = "grid";
    pub const SELECTION: &str = "selection";
    pub const DEBUG: &str = "debug";
}

#[derive(Debug, Clone)]
pub struct RendererLayer {
    name: &'static str,
    enabled: bool,
}

impl RendererLayer {
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }
}

/// Ordered named render layers with per-layer enabled flags. Lookups on
/// unknown names report absence instead of failing.
#[derive(Debug)]
pub struct RendererRegistry {
    layers: Vec<RendererLayer>,
}

impl Default for RendererRegistry {
    fn default() -> Self {
        Self {
            layers: vec![
                RendererLayer { name: layers::GRID, enabled: false },
                RendererLayer { name: layers::SELECTION, enabled: true },
                RendererLayer { name: layers::DEBUG, enabled: false },
            ],
        }
    }
}

impl RendererRegistry {
    pub fn layers(&self) -> &[RendererLayer] {
        &self.layers
    }

    fn find_mut(&mut self, name: &str) -> Option<&mut RendererLayer> {
        self.layers.iter_mut().find(|layer| layer.name == name)
    }

    pub fn is_enabled(&self, name: &str) -> bool {
        self.layers
            .iter()
            .find(|layer| layer.name == name)
            .is_some_and(|layer| layer.enabled)
    }

    pub fn set_enabled(&mut self, name: &str, enabled: bool) -> bool {
        match self.find_mut(name) {
            Some(layer) => {
                layer.enabled = enabled;
                true
            }
            None => false,
        }
    }

    /// Flips a layer and returns its new state, or `None` for unknown names.
    pub fn toggle(&mut self, name: &str) -> Option<bool> {
        let layer = self.find_mut(name)?;
        layer.enabled = !layer.enabled;
        let enabled = layer.enabled;
        debug!(layer = name, enabled, "render_layer_toggled");
        Some(enabled)
    }
}
