//! Department router
//!
//! Holds one [`DecideUseCase`] per department and dispatches each request
//! to the pipeline registered for `request.department`.

use crate::use_cases::decide::{DecideError, DecideOutput, DecideUseCase};
use civic_domain::{Department, Request};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

#[derive(Default, Clone)]
pub struct DepartmentRouter {
    pipelines: BTreeMap<Department, Arc<DecideUseCase>>,
}

impl DepartmentRouter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `pipeline` under its own department, replacing any earlier one.
    pub fn register(mut self, pipeline: DecideUseCase) -> Self {
        self.pipelines
            .insert(pipeline.department(), Arc::new(pipeline));
        self
    }

    pub fn get(&self, department: Department) -> Option<&Arc<DecideUseCase>> {
        self.pipelines.get(&department)
    }

    pub fn departments(&self) -> Vec<Department> {
        self.pipelines.keys().copied().collect()
    }

    pub async fn decide(&self, request: Request) -> Result<DecideOutput, DecideError> {
        let pipeline = self
            .pipelines
            .get(&request.department)
            .ok_or(DecideError::UnknownDepartment(request.department))?;
        debug!(department = %request.department, "Routing request");
        pipeline.execute(request).await
    }
}
