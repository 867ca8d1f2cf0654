use arbor::array::Value;
use arbor::config::{enable_x64, set_enable_x64, with_x64, X64Scope};
use arbor::dtype::DType;
use arbor::misc::*;
use arbor::tensors::Tensor;
use arbor::tracer::{eval_shape, trace, ShapeDtype, TraceGuard};
use arbor::tree::{map_leaves, Flatten, Tree};
use arbor::{tensor, ArborError};

#[test]
fn test_if_array_returns_value_on_arrays() {
    let f = if_array(7u8);
    assert_eq!(f.call(&tensor!([1.0, 2.0])), Some(7));
    assert_eq!(f.call(&Value::from(3i32)), Some(7));
    assert_eq!(f.call(&Tensor::<bool>::full(vec![0], true)), Some(7));
}

#[test]
fn test_if_array_accepts_traced_placeholders() {
    let guard = TraceGuard::new();
    let placeholder = guard.placeholder(vec![2, 2], DType::Float32);
    assert_eq!(if_array("yes").call(&placeholder), Some("yes"));
}

#[test]
fn test_if_array_none_on_non_arrays() {
    let f = if_array(1);
    assert_eq!(f.call(&true), None);
    assert_eq!(f.call(&3.5), None);
    assert_eq!(f.call(&42usize), None);
    assert_eq!(f.call("text"), None);
    assert_eq!(f.call(&String::from("text")), None);
    assert_eq!(f.call(&Option::<Value>::None), None);
    assert_eq!(f.call(&()), None);
}

#[test]
fn test_if_array_equality_is_structural() {
    assert_eq!(if_array(vec![1, 2]), if_array(vec![1, 2]));
    assert_ne!(if_array(1), if_array(2));
    assert_eq!(*if_array("a").value(), "a");
}

#[test]
fn test_if_array_is_an_opaque_leaf() {
    // An `IfArray` holding arrays is still one non-array leaf.
    let holder = if_array(vec![tensor!([1.0]), tensor!([2.0])]);
    assert_eq!(holder.num_leaves(), 1);
    assert_eq!(map_leaves(&holder, |l| l.is_array()), vec![false]);

    let nested = (tensor!([1.0]), holder);
    assert_eq!(nested.num_leaves(), 2);

    let tree = Tree::from_static(if_array(0));
    assert_eq!(tree.num_leaves(), 1);
}

#[test]
fn test_if_array_maps_over_trees() {
    let params = Tree::map_of([
        ("weight", Tree::Leaf(Value::from(tensor!([[1.0, 2.0], [3.0, 4.0]])))),
        ("bias", Tree::Leaf(Value::from(tensor!([0.0, 0.0])))),
    ]);
    let axes = params.map(if_array(0).as_fn());
    assert_eq!(axes.leaves(), vec![&Some(0), &Some(0)]);
}

#[test]
fn test_left_broadcast_rows() {
    let arr = Value::from(tensor!([1, 2, 3, 4]));
    let out = left_broadcast_to(&arr, &[3, 4]).unwrap();
    assert_eq!(out.shape(), &[3, 4]);
    let data = out.concrete().unwrap().as_tensor::<i32>().unwrap();
    for row in data.data.chunks(4) {
        assert_eq!(row, &[1, 2, 3, 4]);
    }
}

#[test]
fn test_left_broadcast_inserted_and_unit_axes() {
    let arr = Value::from(Tensor::new(vec![1, 4], vec![1.0f32, 2.0, 3.0, 4.0]));
    let out = left_broadcast_to(&arr, &[2, 3, 4]).unwrap();
    assert_eq!(out.shape(), &[2, 3, 4]);
    let data = out.concrete().unwrap().to_f64_vec();
    assert_eq!(data.len(), 24);
    for block in data.chunks(4) {
        assert_eq!(block, &[1.0, 2.0, 3.0, 4.0]);
    }
}

#[test]
fn test_left_broadcast_shape_mismatch() {
    let arr = Value::from(tensor!([1, 2, 3, 4, 5]));
    assert_eq!(
        left_broadcast_to(&arr, &[3, 4]),
        Err(ArborError::ShapeMismatch {
            from: vec![1, 5],
            to: vec![3, 4],
        })
    );
}

#[test]
fn test_left_broadcast_lower_rank_target() {
    let arr = Value::from(Tensor::new(vec![2, 2], vec![1, 2, 3, 4]));
    assert_eq!(
        left_broadcast_to(&arr, &[4]),
        Err(ArborError::RankMismatch { from: 2, to: 1 })
    );
}

#[test]
fn test_left_broadcast_traced() {
    let out = eval_shape(&[ShapeDtype::new(vec![4], DType::Float32)], |args| {
        left_broadcast_to(&args[0], &[2, 3, 4])
    })
    .unwrap();
    assert!(out.is_traced());
    assert_eq!(out.shape(), &[2, 3, 4]);

    let err = eval_shape(&[ShapeDtype::new(vec![5], DType::Float32)], |args| {
        left_broadcast_to(&args[0], &[3, 4])
    });
    assert!(matches!(err, Err(ArborError::ShapeMismatch { .. })));
}

#[test]
fn test_broadcast_leading_to_per_batch() {
    let per_batch = Value::from(tensor!([10, 20]));
    let out = broadcast_leading_to(&per_batch, &[2, 2, 3]).unwrap();
    assert_eq!(out.shape(), &[2, 2, 3]);
    let data = out.concrete().unwrap().to_f64_vec();
    assert!(data[..6].iter().all(|&x| x == 10.0));
    assert!(data[6..].iter().all(|&x| x == 20.0));
    assert!(broadcast_leading_to(&per_batch, &[3, 2]).is_err());
}

#[test]
fn test_currently_jitting_eager_and_traced() {
    assert!(!currently_jitting());
    assert!(trace(|_| currently_jitting()));
    let nested = trace(|_| trace(|_| currently_jitting()));
    assert!(nested);
    assert!(!currently_jitting());
}

#[test]
fn test_currently_jitting_inside_eval_shape() {
    let seen = eval_shape(&[], |_| currently_jitting());
    assert!(seen);
}

#[test]
fn test_default_floating_dtype_follows_flag() {
    {
        let _scope = X64Scope::new(true);
        assert_eq!(default_floating_dtype(), DType::Float64);
        assert_eq!(default_floating_dtype(), DType::Float64);
    }
    let _scope = X64Scope::new(false);
    assert_eq!(default_floating_dtype(), DType::Float32);
    assert_eq!(default_floating_dtype(), DType::Float32);
}

#[test]
fn test_global_flag_is_seen_by_fresh_threads() {
    // Other tests pin the flag with scopes, so the global can move here.
    let before = std::thread::spawn(enable_x64).join().unwrap();
    set_enable_x64(true);
    let seen = std::thread::spawn(default_floating_dtype).join().unwrap();
    set_enable_x64(before);
    assert_eq!(seen, DType::Float64);
    assert_eq!(with_x64(false, default_floating_dtype), DType::Float32);
}
