// Scalar filters used by the measurement chain

/// Recursive moving average over roughly 2^shift samples
///
/// `acc += (x - acc) / 2^shift`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MovingAverage {
    acc: f32,
    shift: u16,
}

impl MovingAverage {
    pub const fn new(initial: f32, shift: u16) -> Self {
        Self {
            acc: initial,
            shift,
        }
    }

    /// Restart from `value`
    pub fn reset(&mut self, value: f32) {
        self.acc = value;
    }

    pub fn update(&mut self, x: f32) -> f32 {
        let window = (1u32 << self.shift) as f32;
        self.acc += (x - self.acc) / window;
        self.acc
    }

    pub fn value(&self) -> f32 {
        self.acc
    }
}

/// First-order IIR low-pass
///
/// `y[n] = b0 * x[n] + b1 * x[n-1] - a1 * y[n-1]`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FirstOrderIir {
    b0: f32,
    b1: f32,
    a1: f32,
    x1: f32,
    y1: f32,
}

impl FirstOrderIir {
    pub const fn new(b0: f32, b1: f32, a1: f32) -> Self {
        Self {
            b0,
            b1,
            a1,
            x1: 0.0,
            y1: 0.0,
        }
    }

    /// Clear the delay line
    pub fn reset(&mut self) {
        self.x1 = 0.0;
        self.y1 = 0.0;
    }

    pub fn update(&mut self, x: f32) -> f32 {
        let y = self.b0 * x + self.b1 * self.x1 - self.a1 * self.y1;
        self.x1 = x;
        self.y1 = y;
        y
    }

    pub fn value(&self) -> f32 {
        self.y1
    }

    /// Steady-state gain `(b0 + b1) / (1 + a1)`
    pub fn dc_gain(&self) -> f32 {
        (self.b0 + self.b1) / (1.0 + self.a1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq(a: f32, b: f32, tol: f32) -> bool {
        (a - b).abs() < tol
    }

    #[test]
    fn test_moving_average_step() {
        let mut ma = MovingAverage::new(0.0, 2);
        assert_eq!(ma.update(4.0), 1.0);
        assert_eq!(ma.update(4.0), 1.75);
        for _ in 0..100 {
            ma.update(4.0);
        }
        assert!(approx_eq(ma.value(), 4.0, 1e-5));
    }

    #[test]
    fn test_moving_average_shift_zero_tracks_input() {
        let mut ma = MovingAverage::new(10.0, 0);
        assert_eq!(ma.update(3.0), 3.0);
    }

    #[test]
    fn test_iir_unity_dc_gain() {
        let mut iir = FirstOrderIir::new(
            crate::config::bus_voltage_filter::B0,
            crate::config::bus_voltage_filter::B1,
            crate::config::bus_voltage_filter::A1,
        );
        assert!(approx_eq(iir.dc_gain(), 1.0, 1e-5));

        for _ in 0..500 {
            iir.update(24.0);
        }
        assert!(approx_eq(iir.value(), 24.0, 1e-3));
    }

    #[test]
    fn test_iir_first_sample() {
        let mut iir = FirstOrderIir::new(0.5, 0.25, -0.5);
        assert_eq!(iir.update(2.0), 1.0);
        // 0.5 * 2 + 0.25 * 2 + 0.5 * 1
        assert_eq!(iir.update(2.0), 2.0);
        iir.reset();
        assert_eq!(iir.value(), 0.0);
    }
}
