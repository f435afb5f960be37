//! Ready-made task handlers.

use std::sync::Arc;

use serde_json::Value;

use super::error::TaskResult;
use super::types::Task;
use crate::agents::DirectorAgent;
use crate::schedule::{
    OptimizeScheduleRequest, RoundRobinGenerator, ScheduleGenerator, ScheduleOptimizationService,
};

/// Runs `optimize_schedule` tasks directly against the service.
///
/// Task parameters follow [`OptimizeScheduleRequest`]; the result is the
/// serialized [`OptimizedSchedule`](crate::schedule::OptimizedSchedule).
pub fn optimize_schedule(
    service: ScheduleOptimizationService,
) -> impl Fn(&Task) -> TaskResult<Value> + Send + Sync + 'static {
    optimize_schedule_with_generator(service, Arc::new(RoundRobinGenerator))
}

pub fn optimize_schedule_with_generator(
    service: ScheduleOptimizationService,
    generator: Arc<dyn ScheduleGenerator>,
) -> impl Fn(&Task) -> TaskResult<Value> + Send + Sync + 'static {
    move |task| {
        let request: OptimizeScheduleRequest = serde_json::from_value(task.parameters.clone())?;
        let optimized = service.optimize_request(&request, generator.as_ref())?;
        Ok(serde_json::to_value(optimized)?)
    }
}

/// Routes tasks through the agent hierarchy as `task_type`.
///
/// An optional string `description` parameter is passed along.
pub fn delegate_to_director(
    director: Arc<DirectorAgent>,
    task_type: impl Into<String>,
) -> impl Fn(&Task) -> TaskResult<Value> + Send + Sync + 'static {
    let task_type = task_type.into();
    move |task| {
        let description = task.parameters.get("description").and_then(Value::as_str);
        Ok(director.assign(&task_type, description, task.parameters.clone())?)
    }
}
