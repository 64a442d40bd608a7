/// Work items (steps) are identified by the coordination layer with UUIDs.
pub type StepId = uuid::Uuid;

/// Cost units charged against a completed step.
pub type CostUnits = u32;
