//! One intercepted call.

use std::fmt;

use crate::descriptor::MethodDescriptor;
use crate::inspect::Loggable;

/// Method descriptor plus the borrowed argument values of one call.
///
/// Arguments are paired with `method.params` by position. Arguments whose
/// [`role`](Loggable::role) is not `Data` are skipped by every logging path.
#[derive(Clone, Copy)]
pub struct InvocationContext<'a> {
    /// The observed method.
    pub method: &'a MethodDescriptor,
    /// Argument values in declaration order.
    pub args: &'a [&'a dyn Loggable],
}

impl<'a> InvocationContext<'a> {
    /// Creates a context.
    pub fn new(method: &'a MethodDescriptor, args: &'a [&'a dyn Loggable]) -> Self {
        Self { method, args }
    }

    /// Arguments that are logged, in order.
    pub fn logged_args(&self) -> impl Iterator<Item = &'a dyn Loggable> + use<'a> {
        self.args
            .iter()
            .copied()
            .filter(|arg| arg.role().is_logged())
    }

    /// Logged arguments keyed by their declared parameter name.
    pub fn named_args(&self) -> impl Iterator<Item = (String, &'a dyn Loggable)> + use<'a> {
        let method = self.method;
        self.args
            .iter()
            .copied()
            .enumerate()
            .filter(|(_, arg)| arg.role().is_logged())
            .map(move |(index, arg)| (method.param_name(index), arg))
    }
}

impl fmt::Debug for InvocationContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InvocationContext")
            .field("method", &self.method.to_string())
            .field("args", &self.args.len())
            .finish()
    }
}
