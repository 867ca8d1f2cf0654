//! Trace contexts and abstract values.
//!
//! While a [`TraceGuard`] is alive on a thread, arithmetic on [`Value`]s
//! produces [`Tracer`]s instead of computing data. A tracer only knows its
//! shape, its dtype and the trace that created it. This is enough for shape
//! inference ([`eval_shape`]) and for code that needs to know whether it runs
//! staged or eagerly.
//!
//! Traces nest. Each thread keeps its own stack, so tracing on one thread
//! never changes how another thread evaluates.

use crate::array::Value;
use crate::dtype::DType;
use core::cell::RefCell;
use core::sync::atomic::{AtomicUsize, Ordering};

/// Identifies one trace context. Ids are unique for the process lifetime.
pub type TraceId = usize;

static TRACE_COUNTER: AtomicUsize = AtomicUsize::new(1);

thread_local! {
    static TRACE_STACK: RefCell<Vec<TraceId>> = const { RefCell::new(Vec::new()) };
}

/// An abstract array: shape and dtype, no data.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Tracer {
    trace: TraceId,
    shape: Vec<usize>,
    dtype: DType,
}

impl Tracer {
    pub fn new(trace: TraceId, shape: impl Into<Vec<usize>>, dtype: DType) -> Self {
        Self {
            trace,
            shape: shape.into(),
            dtype,
        }
    }

    /// The trace this value belongs to.
    pub const fn trace(&self) -> TraceId {
        self.trace
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub const fn dtype(&self) -> DType {
        self.dtype
    }

    pub fn ndim(&self) -> usize {
        self.shape.len()
    }

    /// The same abstract value under a different shape.
    pub fn with_shape(&self, shape: impl Into<Vec<usize>>) -> Self {
        Self::new(self.trace, shape, self.dtype)
    }

    /// The same abstract value with a different dtype.
    pub fn with_dtype(&self, dtype: DType) -> Self {
        Self::new(self.trace, self.shape.clone(), dtype)
    }
}

/// RAII guard: the current thread is tracing while it is alive.
#[must_use = "the trace ends when the guard is dropped"]
#[derive(Debug)]
pub struct TraceGuard {
    id: TraceId,
    _not_send: core::marker::PhantomData<*const ()>,
}

impl TraceGuard {
    /// Opens a fresh trace on top of the current thread's stack.
    pub fn new() -> Self {
        let id = TRACE_COUNTER.fetch_add(1, Ordering::Relaxed);
        TRACE_STACK.with(|stack| stack.borrow_mut().push(id));
        log::trace!("entered trace {id}");
        Self {
            id,
            _not_send: core::marker::PhantomData,
        }
    }

    pub const fn id(&self) -> TraceId {
        self.id
    }

    /// A traced input placeholder belonging to this trace.
    pub fn placeholder(&self, shape: impl Into<Vec<usize>>, dtype: DType) -> Value {
        Value::Traced(Tracer::new(self.id, shape, dtype))
    }
}

impl Default for TraceGuard {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for TraceGuard {
    fn drop(&mut self) {
        TRACE_STACK.with(|stack| {
            let mut stack = stack.borrow_mut();
            // Guards are dropped in reverse order of creation on their thread.
            if let Some(pos) = stack.iter().rposition(|&id| id == self.id) {
                stack.remove(pos);
            }
        });
        log::trace!("left trace {}", self.id);
    }
}

/// The innermost active trace on this thread, if any.
pub fn current_trace() -> Option<TraceId> {
    TRACE_STACK.with(|stack| stack.borrow().last().copied())
}

/// Returns `true` while some trace is active on this thread.
pub fn is_tracing() -> bool {
    current_trace().is_some()
}

/// Runs `f` inside a fresh trace.
///
/// # Example
/// ```
/// use arbor::tracer::{is_tracing, trace};
/// assert!(!is_tracing());
/// assert!(trace(|_| is_tracing()));
/// ```
pub fn trace<R>(f: impl FnOnce(&TraceGuard) -> R) -> R {
    let guard = TraceGuard::new();
    f(&guard)
}

/// Shape and dtype of an input to abstract evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ShapeDtype {
    pub shape: Vec<usize>,
    pub dtype: DType,
}

impl ShapeDtype {
    pub fn new(shape: impl Into<Vec<usize>>, dtype: DType) -> Self {
        Self {
            shape: shape.into(),
            dtype,
        }
    }

    /// The shape and dtype of an existing value.
    pub fn of(value: &Value) -> Self {
        Self::new(value.shape(), value.dtype())
    }
}

/// Evaluates `f` on traced placeholders built from `specs`.
///
/// No data is computed; the outputs carry the shapes and dtypes `f` would
/// produce on real inputs. Shape errors surface exactly as they would eagerly.
///
/// # Example
/// ```
/// use arbor::dtype::DType;
/// use arbor::tracer::{eval_shape, ShapeDtype};
///
/// let out = eval_shape(&[ShapeDtype::new(vec![4], DType::Int32)], |args| {
///     args[0].broadcast_to(&[3, 4])
/// })
/// .unwrap();
/// assert_eq!(out.shape(), &[3, 4]);
/// assert!(out.is_traced());
/// ```
pub fn eval_shape<R>(specs: &[ShapeDtype], f: impl FnOnce(&[Value]) -> R) -> R {
    trace(|guard| {
        let args: Vec<Value> = specs
            .iter()
            .map(|spec| guard.placeholder(spec.shape.clone(), spec.dtype))
            .collect();
        f(&args)
    })
}
