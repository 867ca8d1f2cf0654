use arbor::array::{ArrayData, Value};
use arbor::dtype::DType;
use arbor::filters::*;
use arbor::tensor;
use arbor::tracer::{eval_shape, ShapeDtype, Tracer};

#[test]
fn test_arrays_are_arrays() {
    assert!(is_array(&tensor!([1, 2])));
    assert!(is_array(&ArrayData::from(tensor!([true]))));
    assert!(is_array(&Value::from(1.0f32)));
    assert!(is_array(&Tracer::new(1, vec![3], DType::Int32)));
    assert!(is_array(&Some(tensor!([1.0]))));
}

#[test]
fn test_scalars_are_array_like_only() {
    for x in [&true as &dyn MaybeArray, &1i32, &2u64, &3.0f64] {
        assert!(!is_array(x));
        assert!(is_array_like(x));
    }
    assert!(!is_array_like("name"));
    assert!(!is_array_like(&()));
    assert!(!is_array_like(&Option::<f64>::None));
}

#[test]
fn test_inexact_filters() {
    assert!(is_inexact_array(&tensor!([1.0])));
    assert!(!is_inexact_array(&tensor!([1])));
    assert!(!is_inexact_array(&1.5f32));
    assert!(is_inexact_array_like(&1.5f32));
    assert!(!is_inexact_array_like(&7i64));
}

#[test]
fn test_traced_values_keep_metadata() {
    let specs = [
        ShapeDtype::new(vec![2, 3], DType::Int32),
        ShapeDtype::new(vec![3], DType::Float64),
    ];
    let (a, b) = eval_shape(&specs, |args| (&args[0] + 1.0, &args[1] + 1));
    assert_eq!(a.shape(), &[2, 3]);
    assert!(a.dtype().is_floating());
    assert_eq!(b.dtype(), DType::Float64);
    assert!(is_array(&a) && is_array(&b));
    assert_eq!(ShapeDtype::of(&b), ShapeDtype::new(vec![3], DType::Float64));
}
