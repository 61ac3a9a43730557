pub mod plan;
pub mod provisioner;

pub use provisioner::RunFailure;

pub use crate::domain::model::{
    CommandOutput, CommandSpec, ProvisionReport, Step, StepAction, StepKind, StepOutcome,
    StepStatus,
};
pub use crate::domain::ports::{CommandRunner, ConfigProvider};
pub use crate::utils::error::Result;
