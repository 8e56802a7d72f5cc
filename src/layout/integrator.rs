use eframe::egui::Vec2;

use super::config::LayoutConfig;
use super::store::NodeState;

/// Simulation temperature. Alpha eases toward `target` every tick; the
/// layout is at rest once alpha drops below `min`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Temperature {
    pub alpha: f32,
    pub target: f32,
    pub min: f32,
    pub decay: f32,
}

impl Temperature {
    pub fn new(config: &LayoutConfig) -> Self {
        Self {
            alpha: config.alpha,
            target: 0.0,
            min: config.alpha_min,
            decay: config.alpha_decay,
        }
    }

    /// Advances alpha one step toward the target and returns it.
    pub fn cool(&mut self) -> f32 {
        self.alpha += (self.target - self.alpha) * self.decay;
        self.alpha
    }

    pub fn is_running(&self) -> bool {
        self.alpha >= self.min || self.target >= self.min
    }

    pub fn reheat(&mut self, alpha: f32) {
        self.alpha = self.alpha.max(alpha);
    }
}

/// Folds the accumulated velocity deltas into every node and moves it.
///
/// Pinned nodes jump to their pin and lose their velocity.
pub(super) fn integrate(nodes: &mut [NodeState], deltas: &[Vec2], config: &LayoutConfig) {
    let retain = 1.0 - config.velocity_decay;

    for (node, delta) in nodes.iter_mut().zip(deltas) {
        if let Some(pin) = node.pin {
            node.position = pin;
            node.velocity = Vec2::ZERO;
            continue;
        }

        node.velocity = (node.velocity + *delta) * retain;
        if !(node.velocity.x.is_finite() && node.velocity.y.is_finite()) {
            node.velocity = Vec2::ZERO;
        }
        node.position += node.velocity;
    }
}
