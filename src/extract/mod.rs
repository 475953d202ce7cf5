//! Request-parameter extraction subsystem.
//!
//! Two phases, so request handling runs no reflection:
//!
//! 1. Registration: handler parameters are classified (path, query,
//!    header, body) and their validators compiled into a [`HandlerPlan`].
//! 2. Request: the plan pulls raw values from [`RequestParts`], validates
//!    them, and binds [`BoundArgs`] — or reports every failing parameter
//!    in one structured failure.

mod plan;
mod request;

pub use plan::{HandlerPlan, ParamSource, PlanBuilder};
pub use request::{BoundArgs, RequestParts};
