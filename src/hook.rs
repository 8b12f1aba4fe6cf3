//! Executor hooks.
//!
//! Every registered database carries one [`ExecutorHook`]. The query executor
//! calls `before_*` right before a SELECT is handed to the driver and `after_*`
//! once the driver returns, whether the query succeeded or not.

use crate::models::QueryArg;
use std::any::Any;
use tracing::debug;

/// Callbacks wrapped around every SELECT issued through a [`Db`](crate::Db).
///
/// Hooks are shared between concurrent queries, so implementations that keep
/// state need interior mutability.
pub trait ExecutorHook: Any + Send + Sync {
    fn before_select_one(&self, query: &str, args: &[QueryArg]);
    fn after_select_one(&self, query: &str, args: &[QueryArg]);
    fn before_select(&self, query: &str, args: &[QueryArg]);
    fn after_select(&self, query: &str, args: &[QueryArg]);

    /// Type name of the concrete hook, for logs.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

impl dyn ExecutorHook {
    /// Returns true if the hook is of type `T`.
    pub fn is<T: ExecutorHook>(&self) -> bool {
        let any: &dyn Any = self;
        any.is::<T>()
    }

    /// Returns the hook as `T` if it is of that type.
    pub fn downcast_ref<T: ExecutorHook>(&self) -> Option<&T> {
        let any: &dyn Any = self;
        any.downcast_ref::<T>()
    }
}

impl std::fmt::Debug for dyn ExecutorHook {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("ExecutorHook").field(&self.name()).finish()
    }
}

/// Hook used when a configuration supplies none. Does nothing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DefaultExecutorHook;

impl ExecutorHook for DefaultExecutorHook {
    fn before_select_one(&self, _query: &str, _args: &[QueryArg]) {}
    fn after_select_one(&self, _query: &str, _args: &[QueryArg]) {}
    fn before_select(&self, _query: &str, _args: &[QueryArg]) {}
    fn after_select(&self, _query: &str, _args: &[QueryArg]) {}
}

/// Hook that emits a `tracing` debug event for every callback.
#[derive(Debug, Clone, Default)]
pub struct TracingExecutorHook {
    database: String,
}

impl TracingExecutorHook {
    pub fn new(database: impl Into<String>) -> Self {
        Self {
            database: database.into(),
        }
    }

    pub fn database(&self) -> &str {
        &self.database
    }
}

impl ExecutorHook for TracingExecutorHook {
    fn before_select_one(&self, query: &str, args: &[QueryArg]) {
        debug!(database = %self.database, sql = %query, params = args.len(), "select_one starting");
    }

    fn after_select_one(&self, query: &str, args: &[QueryArg]) {
        debug!(database = %self.database, sql = %query, params = args.len(), "select_one finished");
    }

    fn before_select(&self, query: &str, args: &[QueryArg]) {
        debug!(database = %self.database, sql = %query, params = args.len(), "select starting");
    }

    fn after_select(&self, query: &str, args: &[QueryArg]) {
        debug!(database = %self.database, sql = %query, params = args.len(), "select finished");
    }
}
