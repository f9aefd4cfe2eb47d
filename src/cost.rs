//! Intensity-to-cost mapping for graph construction.
//!
//! Node and edge weights are derived from pixel intensity through one of
//! three interchangeable functions. For CT data in the range [-1024, 1024],
//! the exponential defaults (coefficient 200, time constant -700) penalize
//! dark voxels heavily, which makes the bright tissue septum between merged
//! lungs the cheapest route. A positive time constant flips the preference
//! to dark paths. The sigmoid defaults (shift -800, steepness 0.05, scale
//! 5.0) favor dark pathways such as airways; a negative steepness favors
//! bright ones.
//!
//! Every mode clamps at zero: no finite intensity produces a negative
//! weight. The shortest-path solver's correctness depends on this.

/// Pure mapping from a pixel intensity to a non-negative traversal cost.
/// Assigning a new variant replaces the previous mode; the modes are
/// mutually exclusive by construction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CostFunction {
    /// `weight = coefficient * exp(intensity / time_constant)`.
    Exponential { coefficient: f64, time_constant: f64 },
    /// `weight = scale / (1 + exp(-steepness * (intensity - shift)))`.
    Sigmoid { shift: f64, steepness: f64, scale: f64 },
    /// `weight = scale * (intensity - offset)`, clamped at zero.
    Linear { scale: f64, offset: f64 },
}

impl Default for CostFunction {
    /// Exponential with the parameters that work well for splitting lungs
    /// on images ranging from -1024 to 1024.
    fn default() -> CostFunction {
        CostFunction::Exponential {
            coefficient: 200.0,
            time_constant: -700.0,
        }
    }
}

impl CostFunction {
    /// Sigmoid mode with its documented defaults (dark-path preference).
    pub fn default_sigmoid() -> CostFunction {
        CostFunction::Sigmoid {
            shift: -800.0,
            steepness: 0.05,
            scale: 5.0,
        }
    }

    /// Linear mode passing intensity straight through.
    pub fn default_linear() -> CostFunction {
        CostFunction::Linear {
            scale: 1.0,
            offset: 0.0,
        }
    }

    /// Weight assigned to a node with the given pixel intensity. Never
    /// negative for finite input.
    pub fn node_weight(&self, intensity: f64) -> f64 {
        let weight = match *self {
            CostFunction::Exponential {
                coefficient,
                time_constant,
            } => coefficient * (intensity / time_constant).exp(),
            CostFunction::Sigmoid {
                shift,
                steepness,
                scale,
            } => scale / (1.0 + (-steepness * (intensity - shift)).exp()),
            CostFunction::Linear { scale, offset } => scale * (intensity - offset),
        };
        weight.max(0.0)
    }

    /// Weight assigned to an edge between two adjacent pixels: the
    /// arithmetic mean of the endpoint node weights. Symmetric, so the
    /// reverse twin gets the same weight by construction.
    pub fn edge_weight(&self, intensity_a: f64, intensity_b: f64) -> f64 {
        0.5 * (self.node_weight(intensity_a) + self.node_weight(intensity_b))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exponential_favors_bright_with_negative_time_constant() {
        let cost = CostFunction::default();
        // Weight must strictly decrease as intensity increases.
        let mut previous = f64::INFINITY;
        let mut intensity = -1024.0;
        while intensity <= 1024.0 {
            let weight = cost.node_weight(intensity);
            assert!(
                weight < previous,
                "weight {} at intensity {} should be below {}",
                weight,
                intensity,
                previous
            );
            previous = weight;
            intensity += 64.0;
        }
    }

    #[test]
    fn test_exponential_favors_dark_with_positive_time_constant() {
        let cost = CostFunction::Exponential {
            coefficient: 200.0,
            time_constant: 700.0,
        };
        assert!(cost.node_weight(-900.0) < cost.node_weight(0.0));
        assert!(cost.node_weight(0.0) < cost.node_weight(900.0));
    }

    #[test]
    fn test_exponential_default_values() {
        let cost = CostFunction::default();
        // A * exp(i / tau) with A = 200, tau = -700 at i = 0 gives A.
        assert!((cost.node_weight(0.0) - 200.0).abs() < 1e-12);
        // At i = 700 the weight is A / e.
        let expected = 200.0 / std::f64::consts::E;
        assert!((cost.node_weight(700.0) - expected).abs() < 1e-9);
    }

    #[test]
    fn test_sigmoid_midpoint_and_direction() {
        let cost = CostFunction::default_sigmoid();
        // At the shift point the sigmoid sits at half scale.
        assert!((cost.node_weight(-800.0) - 2.5).abs() < 1e-12);
        // Positive steepness: dark voxels are cheap, bright expensive.
        assert!(cost.node_weight(-1024.0) < cost.node_weight(0.0));
        assert!(cost.node_weight(0.0) < cost.node_weight(1024.0));
    }

    #[test]
    fn test_sigmoid_negative_steepness_flips_preference() {
        let cost = CostFunction::Sigmoid {
            shift: -800.0,
            steepness: -0.05,
            scale: 5.0,
        };
        assert!(cost.node_weight(1024.0) < cost.node_weight(-1024.0));
    }

    #[test]
    fn test_no_mode_goes_negative() {
        let modes = [
            CostFunction::default(),
            CostFunction::Exponential {
                coefficient: -50.0,
                time_constant: -700.0,
            },
            CostFunction::default_sigmoid(),
            CostFunction::Sigmoid {
                shift: 0.0,
                steepness: -0.5,
                scale: -3.0,
            },
            CostFunction::default_linear(),
            CostFunction::Linear {
                scale: 2.0,
                offset: 100.0,
            },
        ];
        let intensities = [-1024.0, -800.0, -1.5, 0.0, 0.5, 512.0, 1024.0];
        for mode in &modes {
            for &intensity in &intensities {
                let weight = mode.node_weight(intensity);
                assert!(
                    weight >= 0.0,
                    "{:?} produced negative weight {} at intensity {}",
                    mode,
                    weight,
                    intensity
                );
            }
        }
    }

    #[test]
    fn test_linear_mode_is_scaled_intensity() {
        let cost = CostFunction::default_linear();
        assert_eq!(cost.node_weight(1.0), 1.0);
        assert_eq!(cost.node_weight(42.0), 42.0);
        assert_eq!(cost.node_weight(-10.0), 0.0, "clamped at zero");

        let shifted = CostFunction::Linear {
            scale: 0.5,
            offset: -100.0,
        };
        assert_eq!(shifted.node_weight(-100.0), 0.0);
        assert_eq!(shifted.node_weight(100.0), 100.0);
    }

    #[test]
    fn test_edge_weight_is_mean_of_endpoints() {
        let cost = CostFunction::default_linear();
        assert_eq!(cost.edge_weight(2.0, 4.0), 3.0);
        // Symmetry keeps the reverse-edge invariant free of special cases.
        assert_eq!(cost.edge_weight(4.0, 2.0), cost.edge_weight(2.0, 4.0));
        // Uniform intensity 1.0 gives unit edge weights.
        assert_eq!(cost.edge_weight(1.0, 1.0), 1.0);
    }
}
