#[cfg(target_arch = "x86_64")]
use std::arch::x86_64::{
    __m256i, _mm256_add_epi64, _mm256_add_pd, _mm256_loadu_pd, _mm256_loadu_si256,
    _mm256_setzero_pd, _mm256_setzero_si256, _mm256_storeu_pd, _mm256_storeu_si256,
};

/// Sum of an i64 column using AVX2 when available, scalar otherwise.
pub fn sum_i64(values: &[i64]) -> i64 {
    #[cfg(target_arch = "x86_64")]
    if is_x86_feature_detected!("avx2") {
        return unsafe { sum_i64_avx2(values) };
    }
    values.iter().copied().sum()
}

/// Sum of an f64 column using AVX2 when available, scalar otherwise.
pub fn sum_f64(values: &[f64]) -> f64 {
    #[cfg(target_arch = "x86_64")]
    if is_x86_feature_detected!("avx2") {
        return unsafe { sum_f64_avx2(values) };
    }
    values.iter().copied().sum()
}

#[cfg(target_arch = "x86_64")]
#[target_feature(enable = "avx2")]
unsafe fn sum_i64_avx2(values: &[i64]) -> i64 {
    const LANES: usize = 4; // __m256i holds 4 i64s
    let mut acc = _mm256_setzero_si256();

    let chunks = values.chunks_exact(LANES);
    let remainder = chunks.remainder();

    for chunk in chunks {
        let v = unsafe { _mm256_loadu_si256(chunk.as_ptr() as *const __m256i) };
        acc = _mm256_add_epi64(acc, v);
    }

    // horizontal reduction
    let mut lanes = [0i64; LANES];
    unsafe { _mm256_storeu_si256(lanes.as_mut_ptr() as *mut __m256i, acc) };

    lanes.iter().sum::<i64>() + remainder.iter().sum::<i64>()
}

#[cfg(target_arch = "x86_64")]
#[target_feature(enable = "avx2")]
unsafe fn sum_f64_avx2(values: &[f64]) -> f64 {
    const LANES: usize = 4; // __m256d holds 4 f64s
    let mut acc = _mm256_setzero_pd();

    let chunks = values.chunks_exact(LANES);
    let remainder = chunks.remainder();

    for chunk in chunks {
        let v = unsafe { _mm256_loadu_pd(chunk.as_ptr()) };
        acc = _mm256_add_pd(acc, v);
    }

    let mut lanes = [0f64; LANES];
    unsafe { _mm256_storeu_pd(lanes.as_mut_ptr(), acc) };

    lanes.iter().sum::<f64>() + remainder.iter().sum::<f64>()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sum_i64_matches_scalar() {
        let values: Vec<i64> = (1..=101).collect();
        assert_eq!(sum_i64(&values), 5151);
        assert_eq!(sum_i64(&[]), 0);
        assert_eq!(sum_i64(&[7, -7, 3]), 3);
    }

    #[test]
    fn sum_f64_matches_scalar() {
        let values: Vec<f64> = (1..=100).map(f64::from).collect();
        assert!((sum_f64(&values) - 5050.0).abs() < 1e-9);
        assert_eq!(sum_f64(&[]), 0.0);
    }
}
