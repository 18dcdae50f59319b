//! Reference workload: multiply two small matrices of random digits.
//!
//! The product is thrown away. The only point is to burn a measurable,
//! non-trivial number of cycles.

use core::hint::black_box;

use rand_core::RngCore;

/// Side length of the reference matrices.
pub const MATRIX_SIZE: usize = 3;

/// Operation counts of the last run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WorkloadStats {
    pub fills_a: usize,
    pub fills_b: usize,
    pub multiply_accumulates: usize,
}

pub struct MatrixMultiply<R: RngCore, const S: usize = MATRIX_SIZE> {
    rng: R,
    stats: WorkloadStats,
}

impl<R: RngCore, const S: usize> MatrixMultiply<R, S> {
    pub fn new(rng: R) -> Self {
        MatrixMultiply {
            rng,
            stats: WorkloadStats::default(),
        }
    }

    pub fn run(&mut self) {
        let mut stats = WorkloadStats::default();
        let mut a = [[0i32; S]; S];
        let mut b = [[0i32; S]; S];
        let mut result = [[0i32; S]; S];

        for row in a.iter_mut() {
            for cell in row.iter_mut() {
                *cell = self.digit();
                stats.fills_a += 1;
            }
        }

        for row in b.iter_mut() {
            for cell in row.iter_mut() {
                *cell = self.digit();
                stats.fills_b += 1;
            }
        }

        for i in 0..S {
            for j in 0..S {
                for k in 0..S {
                    result[i][j] += a[i][k] * b[k][j];
                    stats.multiply_accumulates += 1;
                }
            }
        }

        black_box(result);
        self.stats = stats;
    }

    pub fn stats(&self) -> WorkloadStats {
        self.stats
    }

    pub fn into_rng(self) -> R {
        self.rng
    }

    fn digit(&mut self) -> i32 {
        (self.rng.next_u32() % 10) as i32
    }
}
