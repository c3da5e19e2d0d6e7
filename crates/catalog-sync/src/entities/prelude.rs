pub use super::execution_responses::Entity as ExecutionResponses;
pub use super::executions::Entity as Executions;
pub use super::integrations::Entity as Integrations;
