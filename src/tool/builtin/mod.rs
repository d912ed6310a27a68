//! In-process tools shipped with the crate.

mod calculator;
mod current_time;

pub use calculator::CalculatorTool;
pub use current_time::CurrentTimeTool;

use std::sync::Arc;

use super::DynTool;

/// Every builtin tool, in registration order.
pub fn builtin_tools() -> Vec<DynTool> {
    vec![Arc::new(CalculatorTool) as DynTool, Arc::new(CurrentTimeTool)]
}
