//! Special functions used by the filter kernels.

/// Bessel function of the first kind, `J_n(x)`.
///
/// Evaluated with Miller's backward recurrence, restarting with a larger
/// starting order until two successive estimates agree to 1e-6.
pub fn besj(x: f64, n: i32) -> f64 {
    const TOLERANCE: f64 = 1e-6;

    if n < 0 {
        return 0.0;
    }
    let ax = x.abs();
    if ax <= TOLERANCE {
        return if n == 0 { 1.0 } else { 0.0 };
    }

    let guess = if ax > 5.0 {
        (1.4 * ax + 60.0 / ax) as i32
    } else {
        (ax + 6.0) as i32
    };
    let mut order = guess.max((n as f64 + 2.0 + ax / 4.0) as i32);
    let mut previous = 0.0;

    loop {
        let mut next = 0.0;
        let mut current = 1e-30;
        let mut norm = 0.0;
        let mut wanted = 0.0;
        let mut accumulate = order % 2 != 0;

        for k in (1..order - 1).rev() {
            let value = 2.0 * (k + 1) as f64 * current / x - next;
            next = current;
            current = value;
            if k == n {
                wanted = value;
            }
            accumulate = !accumulate;
            if accumulate {
                norm += 2.0 * value;
            }
        }
        let j0 = 2.0 * current / x - next;
        if n == 0 {
            wanted = j0;
        }
        norm += j0;

        let estimate = wanted / norm;
        if (estimate - previous).abs() < TOLERANCE {
            return estimate;
        }
        previous = estimate;
        order += 3;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_besj_order_zero() {
        assert!((besj(0.0, 0) - 1.0).abs() < 1e-5);
        assert!((besj(1.0, 0) - 0.765_197_686_6).abs() < 1e-4);
        // first zero of J0
        assert!(besj(2.4048, 0).abs() < 1e-3);
    }

    #[test]
    fn test_besj_order_one() {
        assert!(besj(0.0, 1).abs() < 1e-5);
        assert!((besj(1.0, 1) - 0.440_050_585_7).abs() < 1e-4);
        assert!(besj(3.8317, 1).abs() < 1e-3);
    }

    #[test]
    fn test_besj_negative_order() {
        assert_eq!(besj(1.0, -1), 0.0);
    }
}
