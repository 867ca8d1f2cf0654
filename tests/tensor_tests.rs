use arbor::tensors::{broadcast_shapes, left_pad_shape, Tensor};
use arbor::{tensor, ArborError};
use rand::Rng;

#[test]
fn test_tensor_creation() {
    let t = Tensor::new(vec![2, 2], vec![1.0, 2.0, 3.0, 4.0]);
    assert_eq!(t.shape, vec![2, 2]);
    assert_eq!(t.data, vec![1.0, 2.0, 3.0, 4.0]);
    assert_eq!(t.strides(), vec![2, 1]);
    assert_eq!(t.get(&[1, 0]), Some(&3.0));
    assert_eq!(t.get(&[2, 0]), None);
}

#[test]
fn test_tensor_shape_mismatch_panics() {
    let result = std::panic::catch_unwind(|| {
        Tensor::new(vec![2, 2], vec![1.0, 2.0, 3.0]);
    });
    assert!(result.is_err());
}

#[test]
fn test_try_new_reports_mismatch() {
    assert_eq!(
        Tensor::try_new(vec![2, 2], vec![1, 2, 3]),
        Err(ArborError::DataLength {
            shape: vec![2, 2],
            len: 3
        })
    );
    assert!(Tensor::try_new(vec![3], vec![1, 2, 3]).is_ok());
}

#[test]
fn test_tensor_macro() {
    let t = tensor!([[1.0, 2.0], [3.0, 4.0]]);
    assert_eq!(t.shape, vec![2, 2]);
    assert_eq!(t.data, vec![1.0, 2.0, 3.0, 4.0]);
    assert_eq!(tensor!(5).ndim(), 0);
}

#[test]
fn test_reshape_keeps_data() {
    let t = tensor!([1, 2, 3, 4, 5, 6]).reshape(&[2, 3]).unwrap();
    assert_eq!(t.shape, vec![2, 3]);
    assert!(matches!(
        t.reshape(&[4]),
        Err(ArborError::ReshapeMismatch { .. })
    ));
}

#[test]
fn test_broadcast_to_repeats_rows_and_columns() {
    let col = Tensor::new(vec![2, 1], vec![1, 2]);
    let out = col.broadcast_to(&[2, 3]).unwrap();
    assert_eq!(out.data, vec![1, 1, 1, 2, 2, 2]);

    let scalar = Tensor::scalar(9);
    assert_eq!(scalar.broadcast_to(&[2, 2]).unwrap().data, vec![9; 4]);
}

#[test]
fn test_broadcast_to_zero_sized() {
    let t = Tensor::new(vec![1, 3], vec![1, 2, 3]);
    let out = t.broadcast_to(&[0, 3]).unwrap();
    assert_eq!(out.shape, vec![0, 3]);
    assert!(out.is_empty());
}

#[test]
fn test_broadcast_shapes() {
    assert_eq!(broadcast_shapes(&[2, 1, 4], &[3, 1]).unwrap(), vec![2, 3, 4]);
    assert_eq!(broadcast_shapes(&[], &[5]).unwrap(), vec![5]);
    assert!(broadcast_shapes(&[2], &[3]).is_err());
}

#[test]
fn test_left_pad_shape() {
    assert_eq!(left_pad_shape(&[4], 3).unwrap(), vec![1, 1, 4]);
    assert_eq!(
        left_pad_shape(&[2, 2], 1),
        Err(ArborError::RankMismatch { from: 2, to: 1 })
    );
}

#[test]
fn test_left_broadcast_matches_indexing() {
    let mut rng = rand::rng();
    for _ in 0..20 {
        let cols = rng.random_range(1..5);
        let lead: Vec<usize> = (0..rng.random_range(0..3))
            .map(|_| rng.random_range(1..4))
            .collect();
        let data: Vec<i64> = (0..cols).map(|_| rng.random_range(-100..100)).collect();
        let arr = Tensor::new(vec![cols], data.clone());

        let mut shape = lead.clone();
        shape.push(cols);
        let out = arr.left_broadcast_to(&shape).unwrap();
        assert_eq!(out.shape, shape);
        for (i, x) in out.data.iter().enumerate() {
            assert_eq!(*x, data[i % cols]);
        }
    }
}

#[test]
fn test_add_scalar_converts() {
    let t = tensor!([1, 2, 3]);
    let out: Tensor<f32> = t.add_scalar(0.5);
    assert_eq!(out.data, vec![1.5, 2.5, 3.5]);
}

#[test]
fn test_large_map_runs_in_parallel_path() {
    let n = arbor::tensors::PARALLEL_THRESHOLD + 1;
    let t = Tensor::new(vec![n], vec![1.0f64; n]);
    let out = t.map(|x| x * 2.0);
    assert!(out.data.iter().all(|&x| x == 2.0));
}
