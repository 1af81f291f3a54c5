use nalgebra::DVector;
use std::collections::HashMap;

pub trait Optimizer: Send + Sync {
    fn update(&mut self, key: &str, params: &mut DVector<f32>, gradients: &DVector<f32>);
    fn step(&mut self) {}
}

#[derive(Debug, Clone)]
pub struct Adam {
    learning_rate: f64,
    beta1: f64,
    beta2: f64,
    epsilon: f64,
    t: usize,
    m: HashMap<String, DVector<f32>>,
    v: HashMap<String, DVector<f32>>,
}

impl Adam {
    pub fn new(learning_rate: f64, beta1: f64, beta2: f64, epsilon: f64) -> Self {
        Self {
            learning_rate,
            beta1,
            beta2,
            epsilon,
            t: 0,
            m: HashMap::new(),
            v: HashMap::new(),
        }
    }

    pub fn with_learning_rate(learning_rate: f64) -> Self {
        Self::new(learning_rate, 0.9, 0.999, 1e-8)
    }
}

impl Default for Adam {
    fn default() -> Self {
        Self::with_learning_rate(0.001)
    }
}

impl Optimizer for Adam {
    fn update(&mut self, key: &str, params: &mut DVector<f32>, gradients: &DVector<f32>) {
        // bias correction uses the step count of the current batch
        let t = (self.t + 1) as i32;

        let m = self
            .m
            .entry(key.to_string())
            .or_insert_with(|| DVector::zeros(params.len()));
        let v = self
            .v
            .entry(key.to_string())
            .or_insert_with(|| DVector::zeros(params.len()));

        *m = m.scale(self.beta1 as f32) + gradients.scale(1.0 - self.beta1 as f32);
        *v = v.scale(self.beta2 as f32)
            + gradients.component_mul(gradients).scale(1.0 - self.beta2 as f32);

        let m_hat = m.scale(1.0 / (1.0 - (self.beta1 as f32).powi(t)));
        let v_hat = v.scale(1.0 / (1.0 - (self.beta2 as f32).powi(t)));

        let denominator = v_hat.map(|x| x.sqrt() + self.epsilon as f32);
        *params -= m_hat.component_div(&denominator).scale(self.learning_rate as f32);
    }

    fn step(&mut self) {
        self.t += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_adam_first_step_is_learning_rate_sized() {
        let mut adam = Adam::with_learning_rate(0.01);
        let mut params = DVector::from_vec(vec![1.0, 1.0]);
        adam.update("w", &mut params, &DVector::from_vec(vec![0.5, -2.0]));
        adam.step();

        assert!((params[0] - 0.99).abs() < 1e-4);
        assert!((params[1] - 1.01).abs() < 1e-4);
    }

    #[test]
    fn test_adam_keeps_moments_per_key() {
        let mut adam = Adam::default();
        let mut w = DVector::from_vec(vec![1.0]);
        let mut b = DVector::from_vec(vec![1.0, 1.0]);
        adam.update("w", &mut w, &DVector::from_vec(vec![1.0]));
        adam.update("b", &mut b, &DVector::from_vec(vec![1.0, 1.0]));
        adam.step();

        assert_eq!(adam.t, 1);
        assert_eq!(adam.m.len(), 2);
        assert_eq!(adam.v["b"].len(), 2);
    }
}
