//! Per-latitude Fourier transforms along longitude.
//!
//! Conventions: `analyze_*` returns `F_k = Σ_j f_j e^{-2πijk/M}` and
//! `synthesize` evaluates `f_j = Σ_k F_k e^{+2πijk/M}`, both unnormalized.

use num_complex::Complex64;
use rustfft::{Fft, FftPlanner};
use std::sync::Arc;

pub struct LongitudeFft {
    len: usize,
    forward: Arc<dyn Fft<f64>>,
    inverse: Arc<dyn Fft<f64>>,
    buffer: Vec<Complex64>,
    scratch: Vec<Complex64>,
}

impl LongitudeFft {
    pub fn new(len: usize) -> Self {
        let mut planner = FftPlanner::<f64>::new();
        let forward = planner.plan_fft_forward(len);
        let inverse = planner.plan_fft_inverse(len);
        let scratch_len = forward
            .get_inplace_scratch_len()
            .max(inverse.get_inplace_scratch_len());
        Self {
            len,
            forward,
            inverse,
            buffer: vec![Complex64::new(0.0, 0.0); len],
            scratch: vec![Complex64::new(0.0, 0.0); scratch_len],
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Spectrum of a real latitude row.
    pub fn analyze_real(&mut self, row: &[f64]) -> &[Complex64] {
        debug_assert_eq!(row.len(), self.len);
        for (slot, &value) in self.buffer.iter_mut().zip(row) {
            *slot = Complex64::new(value, 0.0);
        }
        self.forward
            .process_with_scratch(&mut self.buffer, &mut self.scratch);
        &self.buffer
    }

    /// Spectrum of a complex latitude row.
    pub fn analyze_complex(&mut self, row: &[Complex64]) -> &[Complex64] {
        debug_assert_eq!(row.len(), self.len);
        self.buffer.copy_from_slice(row);
        self.forward
            .process_with_scratch(&mut self.buffer, &mut self.scratch);
        &self.buffer
    }

    /// Zeroed spectrum slot to be filled before [`synthesize`](Self::synthesize).
    pub fn spectrum_mut(&mut self) -> &mut [Complex64] {
        self.buffer.fill(Complex64::new(0.0, 0.0));
        &mut self.buffer
    }

    /// Evaluates the spectrum previously written through
    /// [`spectrum_mut`](Self::spectrum_mut) at the `len` longitudes.
    pub fn synthesize(&mut self) -> &[Complex64] {
        self.inverse
            .process_with_scratch(&mut self.buffer, &mut self.scratch);
        &self.buffer
    }
}

impl std::fmt::Debug for LongitudeFft {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LongitudeFft").field("len", &self.len).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::LongitudeFft;
    use num_complex::Complex64;
    use std::f64::consts::PI;

    #[test]
    fn real_row_spectrum_isolates_cosine_and_sine_orders() {
        let len = 8;
        let row: Vec<f64> = (0..len)
            .map(|j| {
                let phi = 2.0 * PI * j as f64 / len as f64;
                2.0 + 3.0 * (2.0 * phi).cos() - 0.5 * (3.0 * phi).sin()
            })
            .collect();

        let mut fft = LongitudeFft::new(len);
        let spectrum = fft.analyze_real(&row).to_vec();
        let scale = len as f64;

        assert!((spectrum[0].re / scale - 2.0).abs() < 1.0e-14);
        assert!((2.0 * spectrum[2].re / scale - 3.0).abs() < 1.0e-14);
        assert!((-2.0 * spectrum[3].im / scale + 0.5).abs() < 1.0e-14);
        assert!(spectrum[1].norm() < 1.0e-13);
    }

    #[test]
    fn synthesis_inverts_analysis_up_to_length() {
        let len = 7;
        let row: Vec<Complex64> = (0..len)
            .map(|j| Complex64::new(j as f64, -(j as f64).sqrt()))
            .collect();

        let mut fft = LongitudeFft::new(len);
        let spectrum = fft.analyze_complex(&row).to_vec();
        fft.spectrum_mut().copy_from_slice(&spectrum);
        let restored = fft.synthesize();

        for (original, value) in row.iter().zip(restored) {
            assert!((*original - *value / len as f64).norm() < 1.0e-12);
        }
    }
}
