use ndarray::Array1;

pub(crate) fn normalize_vector(vec: &Array1<f64>) -> Array1<f64> {
    let norm: f64 = vec.iter().map(|&x| x * x).sum::<f64>().sqrt();
    if norm > 1e-10 {
        vec / norm
    } else {
        Array1::zeros(vec.len())
    }
}

pub(crate) fn average_vectors(vectors: &[Array1<f64>], dimension: usize) -> Array1<f64> {
    if vectors.is_empty() {
        return Array1::zeros(dimension);
    }
    let sum = vectors.iter().fold(Array1::zeros(vectors[0].len()), |acc, v| acc + v);
    sum / vectors.len() as f64
}

/// Numerically stable softmax over `scores / temperature`.
pub(crate) fn softmax(scores: &Array1<f64>, temperature: f64) -> Array1<f64> {
    if scores.is_empty() {
        return Array1::zeros(0);
    }
    let scaled = scores / temperature;
    let max = scaled.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let exp = scaled.mapv(|x| (x - max).exp());
    let total = exp.sum();
    exp / total
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_normalize_zero_vector() {
        let v = normalize_vector(&Array1::zeros(3));
        assert_eq!(v, array![0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_normalize_unit_length() {
        let v = normalize_vector(&array![3.0, 4.0]);
        assert!((v[0] - 0.6).abs() < 1e-12);
        assert!((v[1] - 0.8).abs() < 1e-12);
    }

    #[test]
    fn test_average_vectors() {
        let avg = average_vectors(&[array![1.0, 0.0], array![0.0, 1.0]], 2);
        assert_eq!(avg, array![0.5, 0.5]);
        assert_eq!(average_vectors(&[], 4).len(), 4);
    }

    #[test]
    fn test_softmax_sums_to_one_and_keeps_order() {
        let p = softmax(&array![0.2, 0.9, 0.5], 0.1);
        assert!((p.sum() - 1.0).abs() < 1e-9);
        assert!(p[1] > p[2] && p[2] > p[0]);
    }
}
